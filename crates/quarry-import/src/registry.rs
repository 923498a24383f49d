//! The process-scoped class registry: the single choke point every
//! cross-class reference goes through during finalization.

use std::collections::HashMap;

use tracing::{debug, warn};

use quarry_classfile::{
    parse_class_signature, parse_field_descriptor, parse_field_signature, parse_method_signature,
    Annotation, ClassFile, ConstValue, ElementValue, FieldType, ReturnType,
};
use quarry_model::{
    AnnotationValue, ClassGraph, ClassId, CodeUnitBody, CodeUnitId, CodeUnitKind, InstanceofCheck,
    JavaAccess, JavaAnnotation, JavaClassKind, JavaConstructor, JavaField, JavaMethod,
    JavaParameter, JavaStaticInitializer, JavaType, Modifiers, ReferencedClassObject,
    TryCatchBlock,
};

use crate::config::ImportConfig;
use crate::raw::{RawAccessRecord, RawClass, RawCodeUnit};
use crate::signatures::{self, TypeVarScope};
use crate::sources::ClasspathResolver;

const ACC_INTERFACE: u16 = 0x0200;
const ACC_ANNOTATION: u16 = 0x2000;
const ACC_ENUM: u16 = 0x4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolveState {
    Resolving,
    Resolved,
}

/// A code unit whose raw access records still need linking.
pub(crate) struct PendingUnit {
    pub unit: CodeUnitId,
    pub accesses: Vec<RawAccessRecord>,
}

/// Maps every fully-qualified name to exactly one [`ClassId`] and drives
/// finalization on demand.
///
/// Cycle safety comes from registering the empty class shell (and marking it
/// *resolving*) before anything of the class is populated: a recursive
/// lookup that arrives back at the same name gets the shell's id and the
/// shell is completed in place.
pub(crate) struct ClassRegistry<'r> {
    graph: ClassGraph,
    config: ImportConfig,
    resolver: &'r dyn ClasspathResolver,
    pending: HashMap<String, RawClass>,
    states: HashMap<ClassId, ResolveState>,
    /// Per class: synthetic accessor (name, descriptor) to the private
    /// member access inside the accessor's body.
    accessors: HashMap<String, HashMap<(String, String), RawAccessRecord>>,
    link_queue: Vec<PendingUnit>,
}

impl<'r> ClassRegistry<'r> {
    pub fn new(config: ImportConfig, resolver: &'r dyn ClasspathResolver) -> Self {
        Self {
            graph: ClassGraph::new(),
            config,
            resolver,
            pending: HashMap::new(),
            states: HashMap::new(),
            accessors: HashMap::new(),
            link_queue: Vec::new(),
        }
    }

    pub fn graph(&self) -> &ClassGraph {
        &self.graph
    }

    pub fn into_graph(self) -> ClassGraph {
        self.graph
    }

    pub fn register(&mut self, raw: RawClass) {
        for unit in &raw.code_units {
            if !unit.is_synthetic_accessor() {
                continue;
            }
            if let Some(interior) = unit.accesses.first() {
                self.accessors
                    .entry(raw.name.clone())
                    .or_default()
                    .insert((unit.name.clone(), unit.descriptor.clone()), interior.clone());
            }
        }
        self.pending.insert(raw.name.clone(), raw);
    }

    /// Finalize every registered class. Order is not observable from the
    /// outside; iteration is sorted only to keep runs reproducible.
    pub fn resolve_all(&mut self) {
        let mut names: Vec<String> = self.pending.keys().cloned().collect();
        names.sort_unstable();
        for name in names {
            self.resolve_class(&name);
        }
    }

    /// Resolve a name that may use array display form (`com.x.Foo[][]`).
    pub fn resolve_reference(&mut self, name: &str) -> ClassId {
        if let Some(component_name) = name.strip_suffix("[]") {
            let component = self.resolve_reference(component_name);
            return self.graph.ensure_array_class(component);
        }
        self.resolve_class(name)
    }

    /// `getOrResolve`: pending class gets finalized (recursively, cycle
    /// safe), known classes return their cached id, everything else becomes
    /// either a classpath-resolved class or a stub. Fallback is attempted at
    /// most once per name.
    fn resolve_class(&mut self, name: &str) -> ClassId {
        let id = self.graph.ensure_class(name);
        if self.states.contains_key(&id) || self.graph.class(id).is_primitive() {
            return id;
        }

        if let Some(raw) = self.pending.remove(name) {
            self.states.insert(id, ResolveState::Resolving);
            self.populate(id, raw);
            self.states.insert(id, ResolveState::Resolved);
            return id;
        }

        if self.config.classpath_fallback {
            // Mark before loading: a failed attempt is never retried.
            self.states.insert(id, ResolveState::Resolved);
            match self.resolver.find_class(name) {
                Ok(Some(bytes)) => match self.load_fallback(name, &bytes) {
                    Ok(raw) if raw.name == name => {
                        self.register(raw);
                        if let Some(raw) = self.pending.remove(name) {
                            self.states.insert(id, ResolveState::Resolving);
                            self.populate(id, raw);
                            self.states.insert(id, ResolveState::Resolved);
                        }
                    }
                    Ok(raw) => {
                        warn!(
                            requested = %name,
                            found = %raw.name,
                            "classpath fallback returned a differently named class"
                        );
                    }
                    Err(err) => {
                        warn!(class = %name, error = %err, "classpath fallback returned unreadable class file");
                    }
                },
                Ok(None) => {}
                Err(err) => {
                    warn!(class = %name, error = %err, "classpath fallback failed");
                }
            }
            return id;
        }

        // Confirmed stub.
        self.states.insert(id, ResolveState::Resolved);
        id
    }

    fn load_fallback(&self, name: &str, bytes: &[u8]) -> quarry_classfile::Result<RawClass> {
        let class_file = ClassFile::parse(bytes)?;
        RawClass::from_classfile(&class_file, &format!("classpath:{name}"), None)
    }

    fn populate(&mut self, id: ClassId, raw: RawClass) {
        let kind = if raw.access_flags & ACC_ANNOTATION != 0 {
            JavaClassKind::Annotation
        } else if raw.access_flags & ACC_INTERFACE != 0 {
            JavaClassKind::Interface
        } else if raw.access_flags & ACC_ENUM != 0 {
            JavaClassKind::Enum
        } else if raw.is_record {
            JavaClassKind::Record
        } else {
            JavaClassKind::Class
        };
        {
            let class = self.graph.class_mut(id);
            class.kind = kind;
            class.modifiers = Modifiers::new(raw.access_flags);
            class.is_fully_imported = true;
            class.source = Some(raw.source.clone());
        }

        // Enclosing classes resolve first so their type parameters are
        // visible when this class's signature binds variables.
        let enclosing = raw.enclosing_class.as_deref().map(|name| self.resolve_reference(name));
        self.graph.class_mut(id).enclosing_class = enclosing;

        let mut scope = TypeVarScope::new();
        self.extend_scope_with_enclosing(id, &mut scope);

        let parsed_signature = raw.signature.as_deref().and_then(|sig| {
            match parse_class_signature(sig) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    debug!(class = %raw.name, error = %err, "unparsable class signature, keeping raw types");
                    None
                }
            }
        });

        if let Some(parsed) = &parsed_signature {
            let type_parameters =
                signatures::declare_type_parameters(self, &mut scope, &parsed.type_parameters);
            self.graph.class_mut(id).type_parameters = type_parameters;
        }

        // The binary format encodes `Object` as every interface's superclass;
        // the model keeps interfaces (and `Object` itself) without one.
        let is_interface =
            matches!(kind, JavaClassKind::Interface | JavaClassKind::Annotation);
        let superclass = if is_interface {
            None
        } else {
            raw.superclass.as_deref().map(|name| self.resolve_reference(name))
        };
        let interfaces: Vec<ClassId> =
            raw.interfaces.iter().map(|name| self.resolve_reference(name)).collect();
        {
            let class = self.graph.class_mut(id);
            class.superclass = superclass;
            class.interfaces = interfaces;
        }

        if let Some(parsed) = &parsed_signature {
            let generic_superclass = if is_interface {
                None
            } else {
                Some(signatures::class_type_from_signature(self, &mut scope, &parsed.super_class))
            };
            let generic_interfaces: Vec<JavaType> = parsed
                .interfaces
                .iter()
                .map(|sig| signatures::class_type_from_signature(self, &mut scope, sig))
                .collect();
            let class = self.graph.class_mut(id);
            class.generic_superclass = generic_superclass;
            class.generic_interfaces = generic_interfaces;
        }

        let annotations = self.convert_annotations(&raw.annotations);
        self.graph.class_mut(id).annotations = annotations;

        let mut fields = Vec::with_capacity(raw.fields.len());
        for raw_field in &raw.fields {
            let raw_type = self.class_from_field_type(&raw_field.parsed_descriptor);
            let generic_type = raw_field.signature.as_deref().and_then(|sig| {
                match parse_field_signature(sig) {
                    Ok(parsed) => {
                        Some(signatures::java_type_from_field_signature(self, &mut scope, &parsed))
                    }
                    Err(err) => {
                        debug!(
                            class = %raw.name,
                            field = %raw_field.name,
                            error = %err,
                            "unparsable field signature, keeping raw type"
                        );
                        None
                    }
                }
            });
            let annotations = self.convert_annotations(&raw_field.annotations);
            fields.push(JavaField {
                owner: id,
                name: raw_field.name.clone(),
                raw_type,
                generic_type,
                modifiers: Modifiers::new(raw_field.access_flags),
                annotations,
            });
        }
        self.graph.class_mut(id).fields = fields;

        let mut methods = Vec::new();
        let mut constructors = Vec::new();
        let mut static_initializer = None;
        for unit in &raw.code_units {
            // Synthetic accessors are folded into their callers during
            // linking and never surface as members.
            if unit.is_synthetic_accessor() {
                continue;
            }
            if unit.is_static_initializer() {
                let body = self.build_body(unit);
                let unit_id =
                    CodeUnitId { class: id, kind: CodeUnitKind::StaticInitializer, index: 0 };
                static_initializer = Some(JavaStaticInitializer { owner: id, body });
                self.link_queue.push(PendingUnit { unit: unit_id, accesses: unit.accesses.clone() });
                continue;
            }

            let mut method_scope = scope.clone();
            let parsed_sig = unit.signature.as_deref().and_then(|sig| {
                match parse_method_signature(sig) {
                    Ok(parsed) => Some(parsed),
                    Err(err) => {
                        debug!(
                            class = %raw.name,
                            method = %unit.name,
                            error = %err,
                            "unparsable method signature, keeping raw types"
                        );
                        None
                    }
                }
            });
            let type_parameters = match &parsed_sig {
                Some(sig) => {
                    signatures::declare_type_parameters(self, &mut method_scope, &sig.type_parameters)
                }
                None => Vec::new(),
            };

            let raw_params: Vec<ClassId> = unit
                .parsed_descriptor
                .params
                .iter()
                .map(|ty| self.class_from_field_type(ty))
                .collect();
            let generic_params: Option<Vec<JavaType>> = parsed_sig.as_ref().map(|sig| {
                sig.parameters
                    .iter()
                    .map(|ty| signatures::java_type_from_type_signature(self, &mut method_scope, ty))
                    .collect()
            });
            let parameters = align_parameters(raw_params, generic_params);

            let throws: Vec<ClassId> =
                unit.exceptions.iter().map(|name| self.resolve_reference(name)).collect();
            let annotations = self.convert_annotations(&unit.annotations);
            let modifiers = Modifiers::new(unit.access_flags);
            let body = self.build_body(unit);

            if unit.is_constructor() {
                let unit_id = CodeUnitId {
                    class: id,
                    kind: CodeUnitKind::Constructor,
                    index: constructors.len() as u32,
                };
                constructors.push(JavaConstructor {
                    owner: id,
                    descriptor: unit.descriptor.clone(),
                    modifiers,
                    annotations,
                    type_parameters,
                    parameters,
                    throws,
                    body,
                });
                self.link_queue.push(PendingUnit { unit: unit_id, accesses: unit.accesses.clone() });
            } else {
                let raw_return_type = self.return_type_to_class(&unit.parsed_descriptor.return_type);
                let generic_return_type = parsed_sig.as_ref().and_then(|sig| {
                    sig.return_type.as_ref().map(|ty| {
                        signatures::java_type_from_type_signature(self, &mut method_scope, ty)
                    })
                });
                let unit_id = CodeUnitId {
                    class: id,
                    kind: CodeUnitKind::Method,
                    index: methods.len() as u32,
                };
                methods.push(JavaMethod {
                    owner: id,
                    name: unit.name.clone(),
                    descriptor: unit.descriptor.clone(),
                    modifiers,
                    annotations,
                    type_parameters,
                    parameters,
                    raw_return_type,
                    generic_return_type,
                    throws,
                    body,
                });
                self.link_queue.push(PendingUnit { unit: unit_id, accesses: unit.accesses.clone() });
            }
        }
        let class = self.graph.class_mut(id);
        class.methods = methods;
        class.constructors = constructors;
        class.static_initializer = static_initializer;
    }

    fn build_body(&mut self, unit: &RawCodeUnit) -> CodeUnitBody {
        CodeUnitBody {
            line: unit.line,
            accesses: Vec::new(),
            referenced_class_objects: unit
                .referenced_class_objects
                .iter()
                .map(|(name, line)| ReferencedClassObject {
                    class: self.resolve_reference(name),
                    line: *line,
                })
                .collect(),
            instanceof_checks: unit
                .instanceof_checks
                .iter()
                .map(|(name, line)| InstanceofCheck {
                    class: self.resolve_reference(name),
                    line: *line,
                })
                .collect(),
            try_catch_blocks: unit
                .try_catch_blocks
                .iter()
                .map(|block| TryCatchBlock {
                    caught: block.caught.iter().map(|name| self.resolve_reference(name)).collect(),
                    line: block.line,
                    declared_in_lambda: block.declared_in_lambda,
                })
                .collect(),
        }
    }

    /// Insert the type parameters of every enclosing class, outermost
    /// first, so nearer declarations shadow outer ones.
    fn extend_scope_with_enclosing(&mut self, id: ClassId, scope: &mut TypeVarScope) {
        let mut chain = Vec::new();
        let mut current = self.graph.class(id).enclosing_class;
        while let Some(enclosing) = current {
            if chain.contains(&enclosing) {
                break;
            }
            chain.push(enclosing);
            current = self.graph.class(enclosing).enclosing_class;
        }
        for enclosing in chain.iter().rev() {
            let type_parameters = self.graph.class(*enclosing).type_parameters.clone();
            for type_var in type_parameters {
                let name = self.graph.type_variable(type_var).name.clone();
                scope.insert(name, type_var);
            }
        }
    }

    pub fn class_from_field_type(&mut self, ty: &FieldType) -> ClassId {
        match ty {
            FieldType::Base(base) => self.graph.ensure_class(base.name()),
            FieldType::Object(name) => self.resolve_class(&crate::raw::dotted(name)),
            FieldType::Array(component) => {
                let component = self.class_from_field_type(component);
                self.graph.ensure_array_class(component)
            }
        }
    }

    fn return_type_to_class(&mut self, ty: &ReturnType) -> ClassId {
        match ty {
            ReturnType::Void => self.graph.ensure_class("void"),
            ReturnType::Type(ty) => self.class_from_field_type(ty),
        }
    }

    fn class_from_descriptor_str(&mut self, descriptor: &str) -> ClassId {
        if descriptor == "V" {
            return self.graph.ensure_class("void");
        }
        match parse_field_descriptor(descriptor) {
            Ok(ty) => self.class_from_field_type(&ty),
            Err(_) => self.resolve_reference(&crate::raw::dotted(descriptor)),
        }
    }

    fn convert_annotations(&mut self, annotations: &[Annotation]) -> Vec<JavaAnnotation> {
        annotations
            .iter()
            .filter_map(|annotation| {
                let type_name = crate::raw::dotted(annotation.type_internal_name()?);
                let annotation_type = self.resolve_reference(&type_name);
                let elements = annotation
                    .elements
                    .iter()
                    .map(|element| (element.name.clone(), self.convert_value(&element.value)))
                    .collect();
                Some(JavaAnnotation { annotation_type, elements })
            })
            .collect()
    }

    fn convert_value(&mut self, value: &ElementValue) -> AnnotationValue {
        match value {
            ElementValue::Const(value) => match value {
                ConstValue::Byte(v) => AnnotationValue::Byte(*v),
                ConstValue::Char(v) => AnnotationValue::Char(*v),
                ConstValue::Short(v) => AnnotationValue::Short(*v),
                ConstValue::Int(v) => AnnotationValue::Int(*v),
                ConstValue::Long(v) => AnnotationValue::Long(*v),
                ConstValue::Float(v) => AnnotationValue::Float(*v),
                ConstValue::Double(v) => AnnotationValue::Double(*v),
                ConstValue::Boolean(v) => AnnotationValue::Boolean(*v),
                ConstValue::String(v) => AnnotationValue::String(v.clone()),
            },
            ElementValue::Enum { type_descriptor, const_name } => AnnotationValue::EnumConstant {
                enum_type: self.class_from_descriptor_str(type_descriptor),
                const_name: const_name.clone(),
            },
            ElementValue::Class(descriptor) => {
                AnnotationValue::Class(self.class_from_descriptor_str(descriptor))
            }
            ElementValue::Annotation(inner) => {
                let converted = self
                    .convert_annotations(std::slice::from_ref(inner.as_ref()))
                    .into_iter()
                    .next();
                match converted {
                    Some(annotation) => AnnotationValue::Annotation(Box::new(annotation)),
                    // Non-object annotation type descriptor; keep the raw text.
                    None => AnnotationValue::String(inner.type_descriptor.clone()),
                }
            }
            ElementValue::Array(values) => AnnotationValue::Array(
                values.iter().map(|value| self.convert_value(value)).collect(),
            ),
        }
    }

    // ---------------------------------------------------------------
    // Type-variable and type helpers used by signature translation

    pub fn alloc_type_variable(&mut self, name: &str) -> quarry_model::TypeVarId {
        self.graph.alloc_type_variable(name)
    }

    pub fn set_type_variable_bounds(
        &mut self,
        id: quarry_model::TypeVarId,
        bounds: Vec<JavaType>,
    ) {
        self.graph.set_type_variable_bounds(id, bounds);
    }

    pub fn ensure_class_by_name(&mut self, name: &str) -> ClassId {
        self.graph.ensure_class(name)
    }

    pub fn ensure_array_of(&mut self, component: ClassId) -> ClassId {
        self.graph.ensure_array_class(component)
    }

    pub fn erasure_of(&self, ty: &JavaType) -> ClassId {
        self.graph.erasure_of(ty)
    }

    // ---------------------------------------------------------------
    // Linking support

    pub fn take_link_queue(&mut self) -> Vec<PendingUnit> {
        std::mem::take(&mut self.link_queue)
    }

    pub fn accessor_interior(
        &self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<&RawAccessRecord> {
        self.accessors.get(owner)?.get(&(name.to_string(), descriptor.to_string()))
    }

    pub fn set_unit_accesses(&mut self, unit: CodeUnitId, accesses: Vec<JavaAccess>) {
        let class = self.graph.class_mut(unit.class);
        match unit.kind {
            CodeUnitKind::Method => class.methods[unit.index as usize].body.accesses = accesses,
            CodeUnitKind::Constructor => {
                class.constructors[unit.index as usize].body.accesses = accesses
            }
            CodeUnitKind::StaticInitializer => {
                if let Some(init) = class.static_initializer.as_mut() {
                    init.body.accesses = accesses;
                }
            }
        }
    }
}

/// Pair raw parameter types with their generic forms. Compiled descriptors
/// may carry leading synthetic parameters (enclosing instances, enum
/// name/ordinal) that generic signatures omit; align from the tail.
fn align_parameters(
    raw_params: Vec<ClassId>,
    generic_params: Option<Vec<JavaType>>,
) -> Vec<JavaParameter> {
    let offset = match &generic_params {
        Some(generic) if generic.len() <= raw_params.len() => raw_params.len() - generic.len(),
        _ => usize::MAX,
    };
    raw_params
        .into_iter()
        .enumerate()
        .map(|(index, raw_type)| {
            let generic_type = match (&generic_params, index.checked_sub(offset)) {
                (Some(generic), Some(generic_index)) => generic.get(generic_index).cloned(),
                _ => None,
            };
            JavaParameter { raw_type, generic_type }
        })
        .collect()
}
