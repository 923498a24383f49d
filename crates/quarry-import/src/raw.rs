//! Phase-1 accumulators: everything one class file contributes, collected
//! into plain owned data before any cross-class resolution happens.

use std::collections::{BTreeMap, HashMap, HashSet};

use quarry_classfile::{
    access_flags, parse_field_descriptor, parse_method_descriptor, Annotation, BootstrapArgument,
    ClassFile, CodeEvent, FieldType, InvokeKind, MethodDescriptor, MethodHandleInfo, MethodInfo,
    ReferenceKind, Result as ClassFileResult,
};
use quarry_model::{Source, SourceChecksum, CONSTRUCTOR_NAME, STATIC_INITIALIZER_NAME};

const LAMBDA_METAFACTORY: &str = "java/lang/invoke/LambdaMetafactory";
const LAMBDA_METHOD_PREFIX: &str = "lambda$";
const ACCESSOR_METHOD_PREFIX: &str = "access$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RawAccessKind {
    FieldGet,
    FieldSet,
    MethodCall,
    ConstructorCall,
    MethodReference,
    ConstructorReference,
}

/// One access as compiled: syntactic owner, name, descriptor, line.
#[derive(Debug, Clone)]
pub(crate) struct RawAccessRecord {
    pub kind: RawAccessKind,
    /// Dotted name of the receiver class as it appears in the instruction.
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub line: u32,
    pub declared_in_lambda: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RawTryCatch {
    pub caught: Vec<String>,
    pub line: u32,
    pub declared_in_lambda: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RawField {
    pub name: String,
    pub descriptor: String,
    pub parsed_descriptor: FieldType,
    pub signature: Option<String>,
    pub access_flags: u16,
    pub annotations: Vec<Annotation>,
}

/// A method, constructor, or static initializer before resolution.
#[derive(Debug, Clone)]
pub(crate) struct RawCodeUnit {
    pub name: String,
    pub descriptor: String,
    pub parsed_descriptor: MethodDescriptor,
    pub signature: Option<String>,
    pub access_flags: u16,
    pub exceptions: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub line: u32,
    pub accesses: Vec<RawAccessRecord>,
    pub referenced_class_objects: Vec<(String, u32)>,
    pub instanceof_checks: Vec<(String, u32)>,
    pub try_catch_blocks: Vec<RawTryCatch>,
    /// Same-class lambda bodies this unit captures via invokedynamic,
    /// keyed by (name, descriptor).
    pub lambda_captures: Vec<(String, String)>,
}

impl RawCodeUnit {
    pub fn is_synthetic(&self) -> bool {
        self.access_flags & access_flags::ACC_SYNTHETIC != 0
    }

    pub fn is_lambda_body(&self) -> bool {
        self.is_synthetic() && self.name.starts_with(LAMBDA_METHOD_PREFIX)
    }

    /// A compiler-generated accessor that lets lambdas/inner classes reach a
    /// private member of this class.
    pub fn is_synthetic_accessor(&self) -> bool {
        self.is_synthetic() && self.name.starts_with(ACCESSOR_METHOD_PREFIX)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == STATIC_INITIALIZER_NAME
    }
}

/// Everything one class file contributes, in unresolved form.
#[derive(Debug, Clone)]
pub(crate) struct RawClass {
    pub name: String,
    pub access_flags: u16,
    pub is_record: bool,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<String>,
    pub enclosing_class: Option<String>,
    pub annotations: Vec<Annotation>,
    pub source: Source,
    pub fields: Vec<RawField>,
    pub code_units: Vec<RawCodeUnit>,
}

impl RawClass {
    /// Collect everything the class file contributes. Malformed descriptors
    /// fail the whole class; the caller skips the file.
    pub fn from_classfile(
        class: &ClassFile,
        uri: &str,
        checksum: Option<SourceChecksum>,
    ) -> ClassFileResult<Self> {
        let enclosing_class = class
            .enclosing_method
            .as_ref()
            .map(|enclosing| dotted(&enclosing.class_name))
            .or_else(|| {
                class
                    .inner_classes
                    .iter()
                    .find(|info| info.inner_class == class.this_class)
                    .and_then(|info| info.outer_class.as_deref())
                    .map(dotted)
            });

        let code_units = class
            .methods
            .iter()
            .map(|method| build_code_unit(class, method))
            .collect::<ClassFileResult<Vec<_>>>()?;

        let mut raw = Self {
            name: dotted(&class.this_class),
            access_flags: class.access_flags,
            is_record: class.is_record,
            superclass: class.super_class.as_deref().map(dotted),
            interfaces: class.interfaces.iter().map(|name| dotted(name)).collect(),
            signature: class.signature.clone(),
            enclosing_class,
            annotations: class.annotations.clone(),
            source: Source {
                uri: uri.to_string(),
                file_name: class.source_file.clone(),
                checksum,
            },
            fields: class
                .fields
                .iter()
                .map(|field| {
                    Ok(RawField {
                        name: field.name.clone(),
                        descriptor: field.descriptor.clone(),
                        parsed_descriptor: parse_field_descriptor(&field.descriptor)?,
                        signature: field.signature.clone(),
                        access_flags: field.access_flags,
                        annotations: field.annotations.clone(),
                    })
                })
                .collect::<ClassFileResult<Vec<_>>>()?,
            code_units,
        };
        raw.fold_lambda_bodies();
        Ok(raw)
    }

    /// Move each lambda body's contents into the code unit that captures it
    /// (transitively, for lambdas nested in lambdas), then drop the
    /// synthetic lambda methods. After this, `declared_in_lambda` marks the
    /// folded records and no `lambda$` unit remains.
    fn fold_lambda_bodies(&mut self) {
        let mut lambda_units: HashMap<(String, String), RawCodeUnit> = HashMap::new();
        let mut kept = Vec::with_capacity(self.code_units.len());
        for unit in self.code_units.drain(..) {
            if unit.is_lambda_body() {
                lambda_units.insert((unit.name.clone(), unit.descriptor.clone()), unit);
            } else {
                kept.push(unit);
            }
        }

        for unit in &mut kept {
            let captures = std::mem::take(&mut unit.lambda_captures);
            let mut visited = HashSet::new();
            for key in captures {
                fold_into(unit, &key, &lambda_units, &mut visited);
            }
        }
        self.code_units = kept;
    }
}

fn fold_into(
    target: &mut RawCodeUnit,
    key: &(String, String),
    lambda_units: &HashMap<(String, String), RawCodeUnit>,
    visited: &mut HashSet<(String, String)>,
) {
    if !visited.insert(key.clone()) {
        return;
    }
    let Some(lambda) = lambda_units.get(key) else {
        return;
    };
    for access in &lambda.accesses {
        let mut access = access.clone();
        access.declared_in_lambda = true;
        target.accesses.push(access);
    }
    target.referenced_class_objects.extend(lambda.referenced_class_objects.iter().cloned());
    target.instanceof_checks.extend(lambda.instanceof_checks.iter().cloned());
    for block in &lambda.try_catch_blocks {
        let mut block = block.clone();
        block.declared_in_lambda = true;
        target.try_catch_blocks.push(block);
    }
    for nested in &lambda.lambda_captures {
        fold_into(target, nested, lambda_units, visited);
    }
}

fn build_code_unit(class: &ClassFile, method: &MethodInfo) -> ClassFileResult<RawCodeUnit> {
    let mut unit = RawCodeUnit {
        name: method.name.clone(),
        descriptor: method.descriptor.clone(),
        parsed_descriptor: parse_method_descriptor(&method.descriptor)?,
        signature: method.signature.clone(),
        access_flags: method.access_flags,
        exceptions: method.exceptions.iter().map(|name| dotted(name)).collect(),
        annotations: method.annotations.clone(),
        line: 0,
        accesses: Vec::new(),
        referenced_class_objects: Vec::new(),
        instanceof_checks: Vec::new(),
        try_catch_blocks: Vec::new(),
        lambda_captures: Vec::new(),
    };

    let Some(code) = &method.code else {
        return Ok(unit);
    };
    unit.line = code.first_line();

    for event in &code.events {
        match event {
            CodeEvent::FieldGet { target, pc } => unit.accesses.push(RawAccessRecord {
                kind: RawAccessKind::FieldGet,
                owner: dotted(&target.class_name),
                name: target.name.clone(),
                descriptor: target.descriptor.clone(),
                line: code.line_at(*pc),
                declared_in_lambda: false,
            }),
            CodeEvent::FieldSet { target, pc } => unit.accesses.push(RawAccessRecord {
                kind: RawAccessKind::FieldSet,
                owner: dotted(&target.class_name),
                name: target.name.clone(),
                descriptor: target.descriptor.clone(),
                line: code.line_at(*pc),
                declared_in_lambda: false,
            }),
            CodeEvent::Invoke { kind, target, pc } => {
                let access_kind =
                    if *kind == InvokeKind::Special && target.name == CONSTRUCTOR_NAME {
                        RawAccessKind::ConstructorCall
                    } else {
                        RawAccessKind::MethodCall
                    };
                unit.accesses.push(RawAccessRecord {
                    kind: access_kind,
                    owner: class_reference_name(&target.class_name),
                    name: target.name.clone(),
                    descriptor: target.descriptor.clone(),
                    line: code.line_at(*pc),
                    declared_in_lambda: false,
                });
            }
            CodeEvent::InvokeDynamic { bootstrap_index, pc, .. } => {
                let Some(bootstrap) =
                    class.bootstrap_methods.get(*bootstrap_index as usize)
                else {
                    continue;
                };
                if !is_lambda_metafactory(&bootstrap.method) {
                    continue;
                }
                let Some(handle) = bootstrap.arguments.iter().find_map(|arg| match arg {
                    BootstrapArgument::MethodHandle(handle) => Some(handle),
                    _ => None,
                }) else {
                    continue;
                };

                if handle.class_name == class.this_class
                    && handle.name.starts_with(LAMBDA_METHOD_PREFIX)
                {
                    unit.lambda_captures
                        .push((handle.name.clone(), handle.descriptor.clone()));
                } else {
                    let kind = if handle.kind == ReferenceKind::NewInvokeSpecial {
                        RawAccessKind::ConstructorReference
                    } else {
                        RawAccessKind::MethodReference
                    };
                    unit.accesses.push(RawAccessRecord {
                        kind,
                        owner: class_reference_name(&handle.class_name),
                        name: handle.name.clone(),
                        descriptor: handle.descriptor.clone(),
                        line: code.line_at(*pc),
                        declared_in_lambda: false,
                    });
                }
            }
            CodeEvent::InstanceOf { class_name, pc } => {
                unit.instanceof_checks.push((class_reference_name(class_name), code.line_at(*pc)));
            }
            CodeEvent::ClassConstant { class_name, pc } => {
                unit.referenced_class_objects
                    .push((class_reference_name(class_name), code.line_at(*pc)));
            }
        }
    }

    // One try/catch block per protected region; multiple handlers for the
    // same region are its caught types.
    let mut regions: BTreeMap<(u16, u16), Vec<String>> = BTreeMap::new();
    for region in &code.try_regions {
        let caught = regions.entry((region.start_pc, region.end_pc)).or_default();
        if let Some(catch_type) = &region.catch_type {
            caught.push(dotted(catch_type));
        }
    }
    unit.try_catch_blocks = regions
        .into_iter()
        .map(|((start_pc, _), caught)| RawTryCatch {
            caught,
            line: code.line_at(start_pc),
            declared_in_lambda: false,
        })
        .collect();

    Ok(unit)
}

fn is_lambda_metafactory(handle: &MethodHandleInfo) -> bool {
    handle.class_name == LAMBDA_METAFACTORY
        && matches!(handle.name.as_str(), "metafactory" | "altMetafactory")
}

/// Internal binary name to dotted form.
pub(crate) fn dotted(internal: &str) -> String {
    internal.replace('/', ".")
}

/// A `Class` constant or invoke receiver may name an array by descriptor
/// (`[Ljava/lang/String;`); translate those to display form.
pub(crate) fn class_reference_name(internal: &str) -> String {
    if !internal.starts_with('[') {
        return dotted(internal);
    }
    match parse_field_descriptor(internal) {
        Ok(parsed) => field_type_name(&parsed),
        Err(_) => dotted(internal),
    }
}

pub(crate) fn field_type_name(ty: &FieldType) -> String {
    match ty {
        FieldType::Base(base) => base.name().to_string(),
        FieldType::Object(name) => dotted(name),
        FieldType::Array(component) => format!("{}[]", field_type_name(component)),
    }
}
