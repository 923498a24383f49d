use std::collections::HashMap;

use crate::pool::ConstantPoolBuilder;

/// The instruction subset fixtures need. Labels and line markers emit no
/// bytes; they anchor exception tables and line number tables.
#[derive(Debug, Clone)]
pub enum Ins {
    Line(u16),
    Label(&'static str),
    Aload0,
    Aload1,
    Astore1,
    AconstNull,
    Iconst0,
    Dup,
    Pop,
    Return,
    Areturn,
    Ireturn,
    Athrow,
    GetField { owner: String, name: String, descriptor: String },
    PutField { owner: String, name: String, descriptor: String },
    GetStatic { owner: String, name: String, descriptor: String },
    PutStatic { owner: String, name: String, descriptor: String },
    InvokeVirtual { owner: String, name: String, descriptor: String },
    InvokeSpecial { owner: String, name: String, descriptor: String },
    InvokeStatic { owner: String, name: String, descriptor: String },
    InvokeInterface { owner: String, name: String, descriptor: String },
    InvokeDynamic { bootstrap: u16, name: String, descriptor: String },
    New { class: String },
    InstanceOf { class: String },
    Checkcast { class: String },
    LdcClass { class: String },
}

impl Ins {
    pub fn get_field(owner: &str, name: &str, descriptor: &str) -> Self {
        Ins::GetField {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn put_field(owner: &str, name: &str, descriptor: &str) -> Self {
        Ins::PutField {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn get_static(owner: &str, name: &str, descriptor: &str) -> Self {
        Ins::GetStatic {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn invoke_virtual(owner: &str, name: &str, descriptor: &str) -> Self {
        Ins::InvokeVirtual {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn invoke_special(owner: &str, name: &str, descriptor: &str) -> Self {
        Ins::InvokeSpecial {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn invoke_static(owner: &str, name: &str, descriptor: &str) -> Self {
        Ins::InvokeStatic {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn invoke_interface(owner: &str, name: &str, descriptor: &str) -> Self {
        Ins::InvokeInterface {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn instance_of(class: &str) -> Self {
        Ins::InstanceOf { class: class.into() }
    }

    pub fn ldc_class(class: &str) -> Self {
        Ins::LdcClass { class: class.into() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodeSpec {
    max_stack: u16,
    max_locals: u16,
    instructions: Vec<Ins>,
    try_catches: Vec<(&'static str, &'static str, &'static str, Option<String>)>,
}

impl CodeSpec {
    pub fn new() -> Self {
        Self { max_stack: 4, max_locals: 4, ..Self::default() }
    }

    pub fn stack(mut self, max_stack: u16) -> Self {
        self.max_stack = max_stack;
        self
    }

    pub fn locals(mut self, max_locals: u16) -> Self {
        self.max_locals = max_locals;
        self
    }

    pub fn ins(mut self, instruction: Ins) -> Self {
        self.instructions.push(instruction);
        self
    }

    /// Protect the region between two labels with a handler at a third;
    /// `catch_type` is an internal class name, or `None` for finally.
    pub fn try_catch(
        mut self,
        start: &'static str,
        end: &'static str,
        handler: &'static str,
        catch_type: Option<&str>,
    ) -> Self {
        self.try_catches.push((start, end, handler, catch_type.map(str::to_string)));
        self
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    descriptor: String,
    access: u16,
    signature: Option<String>,
    annotations: Vec<AnnotationSpec>,
}

impl FieldSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            access: crate::flags::ACC_PRIVATE,
            signature: None,
            annotations: Vec::new(),
        }
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodSpec {
    name: String,
    descriptor: String,
    access: u16,
    signature: Option<String>,
    exceptions: Vec<String>,
    annotations: Vec<AnnotationSpec>,
    code: Option<CodeSpec>,
}

impl MethodSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            access: crate::flags::ACC_PUBLIC,
            signature: None,
            exceptions: Vec::new(),
            annotations: Vec::new(),
            code: None,
        }
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn throws(mut self, exception: &str) -> Self {
        self.exceptions.push(exception.into());
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn code(mut self, code: CodeSpec) -> Self {
        self.code = Some(code);
        self
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationSpec {
    type_descriptor: String,
    elements: Vec<(String, AnnotationValueSpec)>,
}

impl AnnotationSpec {
    pub fn new(type_descriptor: &str) -> Self {
        Self { type_descriptor: type_descriptor.into(), elements: Vec::new() }
    }

    pub fn element(mut self, name: &str, value: AnnotationValueSpec) -> Self {
        self.elements.push((name.into(), value));
        self
    }
}

#[derive(Debug, Clone)]
pub enum AnnotationValueSpec {
    Int(i32),
    Boolean(bool),
    Str(String),
    Enum { type_descriptor: String, const_name: String },
    Class(String),
    Array(Vec<AnnotationValueSpec>),
    Nested(Box<AnnotationSpec>),
}

#[derive(Debug, Clone)]
struct BootstrapSpec {
    method: (u8, String, String, String),
    arguments: Vec<BootstrapArgSpec>,
}

#[derive(Debug, Clone)]
enum BootstrapArgSpec {
    MethodType(String),
    MethodHandle { kind: u8, owner: String, name: String, descriptor: String, interface: bool },
}

/// Assembles one valid class file.
#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    name: String,
    access: u16,
    super_class: Option<String>,
    interfaces: Vec<String>,
    signature: Option<String>,
    source_file: Option<String>,
    is_record: bool,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    inner_classes: Vec<(String, Option<String>, Option<String>, u16)>,
    enclosing_method: Option<(String, Option<(String, String)>)>,
    bootstrap_methods: Vec<BootstrapSpec>,
    annotations: Vec<AnnotationSpec>,
}

impl ClassFileBuilder {
    /// `name` is the internal binary name, e.g. `com/example/Foo`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            access: crate::flags::ACC_PUBLIC | crate::flags::ACC_SUPER,
            super_class: Some("java/lang/Object".into()),
            interfaces: Vec::new(),
            signature: None,
            source_file: None,
            is_record: false,
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
            enclosing_method: None,
            bootstrap_methods: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn interface_kind(mut self) -> Self {
        self.access = crate::flags::ACC_PUBLIC
            | crate::flags::ACC_INTERFACE
            | crate::flags::ACC_ABSTRACT;
        self
    }

    pub fn super_class(mut self, name: &str) -> Self {
        self.super_class = Some(name.into());
        self
    }

    pub fn no_super_class(mut self) -> Self {
        self.super_class = None;
        self
    }

    pub fn implements(mut self, name: &str) -> Self {
        self.interfaces.push(name.into());
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn source_file(mut self, name: &str) -> Self {
        self.source_file = Some(name.into());
        self
    }

    pub fn record(mut self) -> Self {
        self.is_record = true;
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn inner_class(
        mut self,
        inner: &str,
        outer: Option<&str>,
        inner_name: Option<&str>,
        access: u16,
    ) -> Self {
        self.inner_classes.push((
            inner.into(),
            outer.map(str::to_string),
            inner_name.map(str::to_string),
            access,
        ));
        self
    }

    pub fn enclosing_method(mut self, class: &str, method: Option<(&str, &str)>) -> Self {
        self.enclosing_method =
            Some((class.into(), method.map(|(n, d)| (n.to_string(), d.to_string()))));
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Register a `LambdaMetafactory.metafactory` bootstrap entry whose
    /// implementation handle points at the given method, returning the
    /// bootstrap index for an [`Ins::InvokeDynamic`].
    pub fn lambda_bootstrap(
        mut self,
        impl_kind: u8,
        impl_owner: &str,
        impl_name: &str,
        impl_descriptor: &str,
    ) -> (Self, u16) {
        let index = self.bootstrap_methods.len() as u16;
        self.bootstrap_methods.push(BootstrapSpec {
            method: (
                6, // REF_invokeStatic
                "java/lang/invoke/LambdaMetafactory".into(),
                "metafactory".into(),
                "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;".into(),
            ),
            arguments: vec![
                BootstrapArgSpec::MethodType("()V".into()),
                BootstrapArgSpec::MethodHandle {
                    kind: impl_kind,
                    owner: impl_owner.into(),
                    name: impl_name.into(),
                    descriptor: impl_descriptor.into(),
                    interface: false,
                },
                BootstrapArgSpec::MethodType("()V".into()),
            ],
        });
        (self, index)
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = ConstantPoolBuilder::new();
        let mut body = Vec::new();

        body.extend_from_slice(&self.access.to_be_bytes());
        let this_class = pool.class(&self.name);
        body.extend_from_slice(&this_class.to_be_bytes());
        let super_index = match &self.super_class {
            Some(name) => pool.class(name),
            None => 0,
        };
        body.extend_from_slice(&super_index.to_be_bytes());

        body.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            let index = pool.class(interface);
            body.extend_from_slice(&index.to_be_bytes());
        }

        body.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            body.extend_from_slice(&field.access.to_be_bytes());
            let name = pool.utf8(&field.name);
            body.extend_from_slice(&name.to_be_bytes());
            let descriptor = pool.utf8(&field.descriptor);
            body.extend_from_slice(&descriptor.to_be_bytes());

            let mut attributes = Vec::new();
            if let Some(signature) = &field.signature {
                attributes.push(signature_attribute(&mut pool, signature));
            }
            if !field.annotations.is_empty() {
                attributes.push(annotations_attribute(&mut pool, &field.annotations));
            }
            write_attributes(&attributes, &mut body);
        }

        body.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            body.extend_from_slice(&method.access.to_be_bytes());
            let name = pool.utf8(&method.name);
            body.extend_from_slice(&name.to_be_bytes());
            let descriptor = pool.utf8(&method.descriptor);
            body.extend_from_slice(&descriptor.to_be_bytes());

            let mut attributes = Vec::new();
            if let Some(code) = &method.code {
                attributes.push(code_attribute(&mut pool, code));
            }
            if !method.exceptions.is_empty() {
                let mut payload = Vec::new();
                payload.extend_from_slice(&(method.exceptions.len() as u16).to_be_bytes());
                for exception in &method.exceptions {
                    let index = pool.class(exception);
                    payload.extend_from_slice(&index.to_be_bytes());
                }
                attributes.push((pool.utf8("Exceptions"), payload));
            }
            if let Some(signature) = &method.signature {
                attributes.push(signature_attribute(&mut pool, signature));
            }
            if !method.annotations.is_empty() {
                attributes.push(annotations_attribute(&mut pool, &method.annotations));
            }
            write_attributes(&attributes, &mut body);
        }

        let mut attributes = Vec::new();
        if let Some(signature) = &self.signature {
            attributes.push(signature_attribute(&mut pool, signature));
        }
        if let Some(source_file) = &self.source_file {
            let index = pool.utf8(source_file);
            attributes.push((pool.utf8("SourceFile"), index.to_be_bytes().to_vec()));
        }
        if !self.annotations.is_empty() {
            attributes.push(annotations_attribute(&mut pool, &self.annotations));
        }
        if !self.inner_classes.is_empty() {
            let mut payload = Vec::new();
            payload.extend_from_slice(&(self.inner_classes.len() as u16).to_be_bytes());
            for (inner, outer, inner_name, access) in &self.inner_classes {
                let inner_index = pool.class(inner);
                payload.extend_from_slice(&inner_index.to_be_bytes());
                let outer_index = match outer {
                    Some(name) => pool.class(name),
                    None => 0,
                };
                payload.extend_from_slice(&outer_index.to_be_bytes());
                let name_index = match inner_name {
                    Some(name) => pool.utf8(name),
                    None => 0,
                };
                payload.extend_from_slice(&name_index.to_be_bytes());
                payload.extend_from_slice(&access.to_be_bytes());
            }
            attributes.push((pool.utf8("InnerClasses"), payload));
        }
        if let Some((class, method)) = &self.enclosing_method {
            let mut payload = Vec::new();
            let class_index = pool.class(class);
            payload.extend_from_slice(&class_index.to_be_bytes());
            let method_index = match method {
                Some((name, descriptor)) => pool.name_and_type(name, descriptor),
                None => 0,
            };
            payload.extend_from_slice(&method_index.to_be_bytes());
            attributes.push((pool.utf8("EnclosingMethod"), payload));
        }
        if self.is_record {
            attributes.push((pool.utf8("Record"), vec![0, 0]));
        }
        if !self.bootstrap_methods.is_empty() {
            let mut payload = Vec::new();
            payload.extend_from_slice(&(self.bootstrap_methods.len() as u16).to_be_bytes());
            for bootstrap in &self.bootstrap_methods {
                let (kind, owner, name, descriptor) = &bootstrap.method;
                let method_ref = pool.method_ref(owner, name, descriptor);
                let handle = pool.method_handle(*kind, method_ref);
                payload.extend_from_slice(&handle.to_be_bytes());
                payload.extend_from_slice(&(bootstrap.arguments.len() as u16).to_be_bytes());
                for argument in &bootstrap.arguments {
                    let index = match argument {
                        BootstrapArgSpec::MethodType(descriptor) => pool.method_type(descriptor),
                        BootstrapArgSpec::MethodHandle {
                            kind,
                            owner,
                            name,
                            descriptor,
                            interface,
                        } => {
                            let reference = if *interface {
                                pool.interface_method_ref(owner, name, descriptor)
                            } else {
                                pool.method_ref(owner, name, descriptor)
                            };
                            pool.method_handle(*kind, reference)
                        }
                    };
                    payload.extend_from_slice(&index.to_be_bytes());
                }
            }
            attributes.push((pool.utf8("BootstrapMethods"), payload));
        }
        write_attributes(&attributes, &mut body);

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // minor
        out.extend_from_slice(&61u16.to_be_bytes()); // major (Java 17)
        pool.write_to(&mut out);
        out.extend_from_slice(&body);
        out
    }
}

fn signature_attribute(pool: &mut ConstantPoolBuilder, signature: &str) -> (u16, Vec<u8>) {
    let index = pool.utf8(signature);
    (pool.utf8("Signature"), index.to_be_bytes().to_vec())
}

fn annotations_attribute(
    pool: &mut ConstantPoolBuilder,
    annotations: &[AnnotationSpec],
) -> (u16, Vec<u8>) {
    let mut payload = Vec::new();
    payload.extend_from_slice(&(annotations.len() as u16).to_be_bytes());
    for annotation in annotations {
        write_annotation(pool, annotation, &mut payload);
    }
    (pool.utf8("RuntimeVisibleAnnotations"), payload)
}

fn write_annotation(pool: &mut ConstantPoolBuilder, annotation: &AnnotationSpec, out: &mut Vec<u8>) {
    let type_index = pool.utf8(&annotation.type_descriptor);
    out.extend_from_slice(&type_index.to_be_bytes());
    out.extend_from_slice(&(annotation.elements.len() as u16).to_be_bytes());
    for (name, value) in &annotation.elements {
        let name_index = pool.utf8(name);
        out.extend_from_slice(&name_index.to_be_bytes());
        write_annotation_value(pool, value, out);
    }
}

fn write_annotation_value(
    pool: &mut ConstantPoolBuilder,
    value: &AnnotationValueSpec,
    out: &mut Vec<u8>,
) {
    match value {
        AnnotationValueSpec::Int(v) => {
            out.push(b'I');
            let index = pool.integer(*v);
            out.extend_from_slice(&index.to_be_bytes());
        }
        AnnotationValueSpec::Boolean(v) => {
            out.push(b'Z');
            let index = pool.integer(*v as i32);
            out.extend_from_slice(&index.to_be_bytes());
        }
        AnnotationValueSpec::Str(v) => {
            out.push(b's');
            let index = pool.utf8(v);
            out.extend_from_slice(&index.to_be_bytes());
        }
        AnnotationValueSpec::Enum { type_descriptor, const_name } => {
            out.push(b'e');
            let type_index = pool.utf8(type_descriptor);
            out.extend_from_slice(&type_index.to_be_bytes());
            let name_index = pool.utf8(const_name);
            out.extend_from_slice(&name_index.to_be_bytes());
        }
        AnnotationValueSpec::Class(descriptor) => {
            out.push(b'c');
            let index = pool.utf8(descriptor);
            out.extend_from_slice(&index.to_be_bytes());
        }
        AnnotationValueSpec::Array(values) => {
            out.push(b'[');
            out.extend_from_slice(&(values.len() as u16).to_be_bytes());
            for value in values {
                write_annotation_value(pool, value, out);
            }
        }
        AnnotationValueSpec::Nested(annotation) => {
            out.push(b'@');
            write_annotation(pool, annotation, out);
        }
    }
}

fn code_attribute(pool: &mut ConstantPoolBuilder, code: &CodeSpec) -> (u16, Vec<u8>) {
    let mut code_bytes = Vec::new();
    let mut labels: HashMap<&'static str, u16> = HashMap::new();
    let mut lines: Vec<(u16, u16)> = Vec::new();

    for instruction in &code.instructions {
        let pc = code_bytes.len() as u16;
        match instruction {
            Ins::Line(line) => lines.push((pc, *line)),
            Ins::Label(name) => {
                labels.insert(*name, pc);
            }
            Ins::Aload0 => code_bytes.push(0x2a),
            Ins::Aload1 => code_bytes.push(0x2b),
            Ins::Astore1 => code_bytes.push(0x4c),
            Ins::AconstNull => code_bytes.push(0x01),
            Ins::Iconst0 => code_bytes.push(0x03),
            Ins::Dup => code_bytes.push(0x59),
            Ins::Pop => code_bytes.push(0x57),
            Ins::Return => code_bytes.push(0xb1),
            Ins::Areturn => code_bytes.push(0xb0),
            Ins::Ireturn => code_bytes.push(0xac),
            Ins::Athrow => code_bytes.push(0xbf),
            Ins::GetField { owner, name, descriptor } => {
                code_bytes.push(0xb4);
                let index = pool.field_ref(owner, name, descriptor);
                code_bytes.extend_from_slice(&index.to_be_bytes());
            }
            Ins::PutField { owner, name, descriptor } => {
                code_bytes.push(0xb5);
                let index = pool.field_ref(owner, name, descriptor);
                code_bytes.extend_from_slice(&index.to_be_bytes());
            }
            Ins::GetStatic { owner, name, descriptor } => {
                code_bytes.push(0xb2);
                let index = pool.field_ref(owner, name, descriptor);
                code_bytes.extend_from_slice(&index.to_be_bytes());
            }
            Ins::PutStatic { owner, name, descriptor } => {
                code_bytes.push(0xb3);
                let index = pool.field_ref(owner, name, descriptor);
                code_bytes.extend_from_slice(&index.to_be_bytes());
            }
            Ins::InvokeVirtual { owner, name, descriptor } => {
                code_bytes.push(0xb6);
                let index = pool.method_ref(owner, name, descriptor);
                code_bytes.extend_from_slice(&index.to_be_bytes());
            }
            Ins::InvokeSpecial { owner, name, descriptor } => {
                code_bytes.push(0xb7);
                let index = pool.method_ref(owner, name, descriptor);
                code_bytes.extend_from_slice(&index.to_be_bytes());
            }
            Ins::InvokeStatic { owner, name, descriptor } => {
                code_bytes.push(0xb8);
                let index = pool.method_ref(owner, name, descriptor);
                code_bytes.extend_from_slice(&index.to_be_bytes());
            }
            Ins::InvokeInterface { owner, name, descriptor } => {
                code_bytes.push(0xb9);
                let index = pool.interface_method_ref(owner, name, descriptor);
                code_bytes.extend_from_slice(&index.to_be_bytes());
                code_bytes.push(1);
                code_bytes.push(0);
            }
            Ins::InvokeDynamic { bootstrap, name, descriptor } => {
                code_bytes.push(0xba);
                let index = pool.invoke_dynamic(*bootstrap, name, descriptor);
                code_bytes.extend_from_slice(&index.to_be_bytes());
                code_bytes.push(0);
                code_bytes.push(0);
            }
            Ins::New { class } => {
                code_bytes.push(0xbb);
                let index = pool.class(class);
                code_bytes.extend_from_slice(&index.to_be_bytes());
            }
            Ins::InstanceOf { class } => {
                code_bytes.push(0xc1);
                let index = pool.class(class);
                code_bytes.extend_from_slice(&index.to_be_bytes());
            }
            Ins::Checkcast { class } => {
                code_bytes.push(0xc0);
                let index = pool.class(class);
                code_bytes.extend_from_slice(&index.to_be_bytes());
            }
            Ins::LdcClass { class } => {
                code_bytes.push(0x13);
                let index = pool.class(class);
                code_bytes.extend_from_slice(&index.to_be_bytes());
            }
        }
    }

    let mut payload = Vec::new();
    payload.extend_from_slice(&code.max_stack.to_be_bytes());
    payload.extend_from_slice(&code.max_locals.to_be_bytes());
    payload.extend_from_slice(&(code_bytes.len() as u32).to_be_bytes());
    payload.extend_from_slice(&code_bytes);

    payload.extend_from_slice(&(code.try_catches.len() as u16).to_be_bytes());
    for (start, end, handler, catch_type) in &code.try_catches {
        let resolve =
            |label: &str| *labels.get(label).unwrap_or_else(|| panic!("unknown label {label}"));
        payload.extend_from_slice(&resolve(start).to_be_bytes());
        payload.extend_from_slice(&resolve(end).to_be_bytes());
        payload.extend_from_slice(&resolve(handler).to_be_bytes());
        let catch_index = match catch_type {
            Some(name) => pool.class(name),
            None => 0,
        };
        payload.extend_from_slice(&catch_index.to_be_bytes());
    }

    let mut code_attributes = Vec::new();
    if !lines.is_empty() {
        let mut table = Vec::new();
        table.extend_from_slice(&(lines.len() as u16).to_be_bytes());
        for (pc, line) in &lines {
            table.extend_from_slice(&pc.to_be_bytes());
            table.extend_from_slice(&line.to_be_bytes());
        }
        code_attributes.push((pool.utf8("LineNumberTable"), table));
    }
    write_attributes(&code_attributes, &mut payload);

    (pool.utf8("Code"), payload)
}

fn write_attributes(attributes: &[(u16, Vec<u8>)], out: &mut Vec<u8>) {
    out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
    for (name_index, payload) in attributes {
        out.extend_from_slice(&name_index.to_be_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
    }
}
