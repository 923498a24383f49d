use std::collections::{HashMap, HashSet, VecDeque};

use crate::access::{Dependency, JavaAccess};
use crate::annotation::JavaAnnotation;
use crate::class::{JavaClass, JavaClassKind};
use crate::ids::{ClassId, TypeVarId};
use crate::member::{CodeUnitId, CodeUnitKind, FieldId, JavaConstructor, JavaField, JavaMethod};
use crate::types::{JavaType, TypeVariableDef};

pub const PRIMITIVE_NAMES: [&str; 9] =
    ["boolean", "byte", "char", "short", "int", "long", "float", "double", "void"];

/// Classes every graph knows about from the start.
#[derive(Debug, Clone, Copy)]
pub struct WellKnown {
    pub object: ClassId,
}

/// Position of one access within its origin code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessLoc {
    pub origin: CodeUnitId,
    pub index: u32,
}

/// An element carrying an annotation, for the reverse annotation index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotatedElement {
    Class(ClassId),
    Field(FieldId),
    CodeUnit(CodeUnitId),
}

/// Reverse index: where a class appears as a type in declarations.
#[derive(Debug, Clone, Default)]
pub struct TypeUsage {
    pub as_field_type: Vec<FieldId>,
    pub as_parameter_type: Vec<CodeUnitId>,
    pub as_return_type: Vec<CodeUnitId>,
    pub as_throws_declaration: Vec<CodeUnitId>,
    pub as_instanceof_check: Vec<CodeUnitId>,
    pub as_annotation: Vec<AnnotatedElement>,
}

#[derive(Default)]
struct GraphIndexes {
    direct_subclasses: HashMap<ClassId, Vec<ClassId>>,
    direct_implementors: HashMap<ClassId, Vec<ClassId>>,
    accesses_to: HashMap<ClassId, Vec<AccessLoc>>,
    usage: HashMap<ClassId, TypeUsage>,
    dependencies: Vec<Dependency>,
    dependencies_from: HashMap<ClassId, Vec<u32>>,
    dependencies_to: HashMap<ClassId, Vec<u32>>,
}

/// The finished, immutable class graph.
///
/// During import the registry allocates shells and populates them in place;
/// after [`rebuild_indexes`](Self::rebuild_indexes) the graph is read-only
/// and all derived queries are index lookups.
pub struct ClassGraph {
    classes: Vec<JavaClass>,
    by_name: HashMap<String, ClassId>,
    type_variables: Vec<TypeVariableDef>,
    well_known: WellKnown,
    indexes: GraphIndexes,
}

impl Default for ClassGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassGraph {
    pub fn new() -> Self {
        let mut graph = Self {
            classes: Vec::new(),
            by_name: HashMap::new(),
            type_variables: Vec::new(),
            well_known: WellKnown { object: ClassId::from_raw(0) },
            indexes: GraphIndexes::default(),
        };
        let object = graph.ensure_class("java.lang.Object");
        graph.well_known = WellKnown { object };
        for name in PRIMITIVE_NAMES {
            let id = graph.ensure_class(name);
            graph.class_mut(id).kind = JavaClassKind::Primitive;
        }
        graph
    }

    pub fn well_known(&self) -> WellKnown {
        self.well_known
    }

    /// The id for `name`, allocating an empty shell when absent.
    pub fn ensure_class(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = ClassId::from_raw(self.classes.len() as u32);
        self.classes.push(JavaClass::shell(name));
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// The synthesized array class of `component`, allocating on demand.
    /// The display name is the component's name plus `[]`.
    pub fn ensure_array_class(&mut self, component: ClassId) -> ClassId {
        let name = format!("{}[]", self.class(component).name);
        let id = self.ensure_class(&name);
        let class = self.class_mut(id);
        if class.kind != JavaClassKind::Array {
            class.kind = JavaClassKind::Array;
            class.component = Some(component);
        }
        id
    }

    pub fn get(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn class(&self, id: ClassId) -> &JavaClass {
        &self.classes[id.idx()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut JavaClass {
        &mut self.classes[id.idx()]
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &JavaClass)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(idx, class)| (ClassId::from_raw(idx as u32), class))
    }

    pub fn classes_in_package<'a>(
        &'a self,
        package: &'a str,
    ) -> impl Iterator<Item = (ClassId, &'a JavaClass)> {
        self.classes().filter(move |(_, class)| class.package_name == package)
    }

    pub fn alloc_type_variable(&mut self, name: impl Into<String>) -> TypeVarId {
        let id = TypeVarId::from_raw(self.type_variables.len() as u32);
        self.type_variables.push(TypeVariableDef { name: name.into(), upper_bounds: Vec::new() });
        id
    }

    pub fn set_type_variable_bounds(&mut self, id: TypeVarId, bounds: Vec<JavaType>) {
        self.type_variables[id.idx()].upper_bounds = bounds;
    }

    pub fn type_variable(&self, id: TypeVarId) -> &TypeVariableDef {
        &self.type_variables[id.idx()]
    }

    // ---------------------------------------------------------------
    // Types

    /// The erasure class of a type expression.
    ///
    /// Type variables erase to their first bound; mutually recursive bounds
    /// terminate through the seen-set and fall back to `Object`.
    pub fn erasure_of(&self, ty: &JavaType) -> ClassId {
        self.erasure_inner(ty, &mut HashSet::new())
    }

    fn erasure_inner(&self, ty: &JavaType, seen: &mut HashSet<TypeVarId>) -> ClassId {
        match ty {
            JavaType::Class(id) => *id,
            JavaType::Parameterized { erasure, .. } => *erasure,
            JavaType::Array { erasure, .. } => *erasure,
            JavaType::TypeVariable(id) => {
                if !seen.insert(*id) {
                    return self.well_known.object;
                }
                let erased = self
                    .type_variable(*id)
                    .upper_bounds
                    .first()
                    .map(|bound| self.erasure_inner(bound, seen))
                    .unwrap_or(self.well_known.object);
                seen.remove(id);
                erased
            }
            JavaType::Wildcard { upper, .. } => upper
                .as_deref()
                .map(|bound| self.erasure_inner(bound, seen))
                .unwrap_or(self.well_known.object),
        }
    }

    /// Human-readable form of a type expression, e.g. `Map<K, List<?>>`.
    pub fn display_type(&self, ty: &JavaType) -> String {
        match ty {
            JavaType::Class(id) => self.class(*id).name.clone(),
            JavaType::Parameterized { erasure, arguments } => {
                let args: Vec<_> = arguments.iter().map(|a| self.display_type(a)).collect();
                format!("{}<{}>", self.class(*erasure).name, args.join(", "))
            }
            JavaType::TypeVariable(id) => self.type_variable(*id).name.clone(),
            JavaType::Wildcard { upper: None, lower: None } => "?".to_string(),
            JavaType::Wildcard { upper: Some(bound), lower: None } => {
                format!("? extends {}", self.display_type(bound))
            }
            JavaType::Wildcard { lower: Some(bound), .. } => {
                format!("? super {}", self.display_type(bound))
            }
            JavaType::Array { component, .. } => format!("{}[]", self.display_type(component)),
        }
    }

    // ---------------------------------------------------------------
    // Members

    pub fn field(&self, id: FieldId) -> &JavaField {
        &self.class(id.class).fields[id.index as usize]
    }

    pub fn method(&self, id: CodeUnitId) -> Option<&JavaMethod> {
        match id.kind {
            CodeUnitKind::Method => self.class(id.class).methods.get(id.index as usize),
            _ => None,
        }
    }

    pub fn constructor(&self, id: CodeUnitId) -> Option<&JavaConstructor> {
        match id.kind {
            CodeUnitKind::Constructor => self.class(id.class).constructors.get(id.index as usize),
            _ => None,
        }
    }

    pub fn code_unit_accesses(&self, id: CodeUnitId) -> &[JavaAccess] {
        let class = self.class(id.class);
        match id.kind {
            CodeUnitKind::Method => &class.methods[id.index as usize].body.accesses,
            CodeUnitKind::Constructor => &class.constructors[id.index as usize].body.accesses,
            CodeUnitKind::StaticInitializer => {
                match &class.static_initializer {
                    Some(init) => &init.body.accesses,
                    None => &[],
                }
            }
        }
    }

    pub fn access(&self, loc: AccessLoc) -> &JavaAccess {
        &self.code_unit_accesses(loc.origin)[loc.index as usize]
    }

    fn code_units_of(&self, id: ClassId) -> Vec<CodeUnitId> {
        let class = self.class(id);
        let mut units = Vec::new();
        for index in 0..class.methods.len() {
            units.push(CodeUnitId { class: id, kind: CodeUnitKind::Method, index: index as u32 });
        }
        for index in 0..class.constructors.len() {
            units.push(CodeUnitId {
                class: id,
                kind: CodeUnitKind::Constructor,
                index: index as u32,
            });
        }
        if class.static_initializer.is_some() {
            units.push(CodeUnitId { class: id, kind: CodeUnitKind::StaticInitializer, index: 0 });
        }
        units
    }

    // ---------------------------------------------------------------
    // Hierarchy

    /// All superclasses, nearest first, excluding `id` itself.
    pub fn superclasses_of(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut current = self.class(id).superclass;
        while let Some(superclass) = current {
            if out.contains(&superclass) {
                break;
            }
            out.push(superclass);
            current = self.class(superclass).superclass;
        }
        out
    }

    /// Direct and inherited interfaces, breadth-first from `id`.
    pub fn all_interfaces_of(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<ClassId> = VecDeque::new();
        queue.push_back(id);
        let mut current = self.class(id).superclass;
        while let Some(superclass) = current {
            if !queue.contains(&superclass) {
                queue.push_back(superclass);
                current = self.class(superclass).superclass;
            } else {
                break;
            }
        }
        while let Some(next) = queue.pop_front() {
            for interface in &self.class(next).interfaces {
                if seen.insert(*interface) {
                    out.push(*interface);
                    queue.push_back(*interface);
                }
            }
        }
        out
    }

    /// Classes whose direct superclass is `id`.
    pub fn direct_subclasses(&self, id: ClassId) -> &[ClassId] {
        self.indexes.direct_subclasses.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Classes and interfaces that directly list `id` among their interfaces.
    pub fn direct_implementors(&self, id: ClassId) -> &[ClassId] {
        self.indexes.direct_implementors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Transitive closure of subclasses and implementors.
    pub fn all_subtypes(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<ClassId> = VecDeque::new();
        queue.push_back(id);
        while let Some(next) = queue.pop_front() {
            for subtype in
                self.direct_subclasses(next).iter().chain(self.direct_implementors(next))
            {
                if seen.insert(*subtype) {
                    out.push(*subtype);
                    queue.push_back(*subtype);
                }
            }
        }
        out
    }

    // ---------------------------------------------------------------
    // Accesses and dependencies

    /// All accesses performed by `id`'s code units.
    pub fn accesses_from_class(&self, id: ClassId) -> Vec<&JavaAccess> {
        self.code_units_of(id)
            .into_iter()
            .flat_map(|unit| self.code_unit_accesses(unit).iter())
            .collect()
    }

    /// All accesses whose target owner is `id`.
    pub fn accesses_to_class(&self, id: ClassId) -> Vec<&JavaAccess> {
        self.indexes
            .accesses_to
            .get(&id)
            .map(|locs| locs.iter().map(|loc| self.access(*loc)).collect())
            .unwrap_or_default()
    }

    /// Where `id` is used as a declared type; empty for unknown classes.
    pub fn usage_of(&self, id: ClassId) -> TypeUsage {
        self.indexes.usage.get(&id).cloned().unwrap_or_default()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.indexes.dependencies
    }

    pub fn dependencies_from_class(&self, id: ClassId) -> Vec<&Dependency> {
        self.indexes
            .dependencies_from
            .get(&id)
            .map(|indices| {
                indices.iter().map(|i| &self.indexes.dependencies[*i as usize]).collect()
            })
            .unwrap_or_default()
    }

    pub fn dependencies_to_class(&self, id: ClassId) -> Vec<&Dependency> {
        self.indexes
            .dependencies_to
            .get(&id)
            .map(|indices| {
                indices.iter().map(|i| &self.indexes.dependencies[*i as usize]).collect()
            })
            .unwrap_or_default()
    }

    /// Display form of a code unit, e.g.
    /// `Method <com.example.Foo.bar(int, java.lang.String)>`.
    pub fn describe_code_unit(&self, id: CodeUnitId) -> String {
        let owner = &self.class(id.class).name;
        match id.kind {
            CodeUnitKind::Method => {
                let method = &self.class(id.class).methods[id.index as usize];
                let params: Vec<_> =
                    method.parameters.iter().map(|p| self.class(p.raw_type).name.clone()).collect();
                format!("Method <{owner}.{}({})>", method.name, params.join(", "))
            }
            CodeUnitKind::Constructor => {
                let ctor = &self.class(id.class).constructors[id.index as usize];
                let params: Vec<_> =
                    ctor.parameters.iter().map(|p| self.class(p.raw_type).name.clone()).collect();
                format!("Constructor <{owner}.<init>({})>", params.join(", "))
            }
            CodeUnitKind::StaticInitializer => format!("Static initializer <{owner}.<clinit>()>"),
        }
    }

    /// Rebuild every derived index. Called once, after all classes are
    /// resolved and accesses linked.
    pub fn rebuild_indexes(&mut self) {
        let mut indexes = GraphIndexes::default();
        let mut seen_dependencies: HashSet<(ClassId, ClassId, String)> = HashSet::new();

        for (id, class) in self.classes() {
            if let Some(superclass) = class.superclass {
                indexes.direct_subclasses.entry(superclass).or_default().push(id);
            }
            for interface in &class.interfaces {
                indexes.direct_implementors.entry(*interface).or_default().push(id);
            }
            for annotation in &class.annotations {
                indexes
                    .usage
                    .entry(annotation.annotation_type)
                    .or_default()
                    .as_annotation
                    .push(AnnotatedElement::Class(id));
            }
            for (index, field) in class.fields.iter().enumerate() {
                let field_id = FieldId { class: id, index: index as u32 };
                indexes.usage.entry(field.raw_type).or_default().as_field_type.push(field_id);
                for annotation in &field.annotations {
                    indexes
                        .usage
                        .entry(annotation.annotation_type)
                        .or_default()
                        .as_annotation
                        .push(AnnotatedElement::Field(field_id));
                }
            }
            for unit in self.code_units_of(id) {
                self.index_code_unit(unit, &mut indexes, &mut seen_dependencies);
            }
        }

        self.indexes = indexes;
    }

    fn index_code_unit(
        &self,
        unit: CodeUnitId,
        indexes: &mut GraphIndexes,
        seen_dependencies: &mut HashSet<(ClassId, ClassId, String)>,
    ) {
        let class = self.class(unit.class);
        let (parameters, throws, annotations, body) = match unit.kind {
            CodeUnitKind::Method => {
                let m = &class.methods[unit.index as usize];
                indexes.usage.entry(m.raw_return_type).or_default().as_return_type.push(unit);
                (&m.parameters, &m.throws, &m.annotations, &m.body)
            }
            CodeUnitKind::Constructor => {
                let c = &class.constructors[unit.index as usize];
                (&c.parameters, &c.throws, &c.annotations, &c.body)
            }
            CodeUnitKind::StaticInitializer => {
                let init = class.static_initializer.as_ref().expect("indexed code unit exists");
                (&EMPTY_PARAMS, &EMPTY_THROWS, &EMPTY_ANNOTATIONS, &init.body)
            }
        };

        for parameter in parameters.iter() {
            indexes.usage.entry(parameter.raw_type).or_default().as_parameter_type.push(unit);
        }
        for thrown in throws.iter() {
            indexes.usage.entry(*thrown).or_default().as_throws_declaration.push(unit);
        }
        for annotation in annotations.iter() {
            indexes
                .usage
                .entry(annotation.annotation_type)
                .or_default()
                .as_annotation
                .push(AnnotatedElement::CodeUnit(unit));
        }
        for check in &body.instanceof_checks {
            indexes.usage.entry(check.class).or_default().as_instanceof_check.push(unit);
        }

        for (index, access) in body.accesses.iter().enumerate() {
            let loc = AccessLoc { origin: unit, index: index as u32 };
            indexes.accesses_to.entry(access.target.owner).or_default().push(loc);

            let origin_class = unit.class;
            let target_class = access.target.owner;
            if origin_class == target_class || self.class(target_class).is_primitive() {
                continue;
            }
            let description = format!(
                "{} {} <{}.{}> in line {}",
                self.describe_code_unit(unit),
                access.kind.description(),
                self.class(target_class).name,
                access.target.name,
                access.line,
            );
            let key = (origin_class, target_class, description);
            if seen_dependencies.contains(&key) {
                continue;
            }
            let (origin_class, target_class, description) = key;
            seen_dependencies.insert((origin_class, target_class, description.clone()));
            let dep_index = indexes.dependencies.len() as u32;
            indexes.dependencies.push(Dependency {
                origin: origin_class,
                target: target_class,
                description,
            });
            indexes.dependencies_from.entry(origin_class).or_default().push(dep_index);
            indexes.dependencies_to.entry(target_class).or_default().push(dep_index);
        }
    }
}

static EMPTY_PARAMS: Vec<crate::member::JavaParameter> = Vec::new();
static EMPTY_THROWS: Vec<ClassId> = Vec::new();
static EMPTY_ANNOTATIONS: Vec<JavaAnnotation> = Vec::new();
