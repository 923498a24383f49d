use crate::access::JavaAccess;
use crate::annotation::JavaAnnotation;
use crate::flags::Modifiers;
use crate::ids::{ClassId, TypeVarId};
use crate::types::JavaType;

/// Identifies a field by owning class and declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub class: ClassId,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeUnitKind {
    Method,
    Constructor,
    StaticInitializer,
}

/// Identifies a method, constructor, or static initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeUnitId {
    pub class: ClassId,
    pub kind: CodeUnitKind,
    pub index: u32,
}

/// Any member reference, for queries that span fields and code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberId {
    Field(FieldId),
    CodeUnit(CodeUnitId),
}

#[derive(Debug, Clone)]
pub struct JavaField {
    pub owner: ClassId,
    pub name: String,
    pub raw_type: ClassId,
    /// Present only when the field declaration carried a generic signature.
    pub generic_type: Option<JavaType>,
    pub modifiers: Modifiers,
    pub annotations: Vec<JavaAnnotation>,
}

#[derive(Debug, Clone)]
pub struct JavaParameter {
    pub raw_type: ClassId,
    pub generic_type: Option<JavaType>,
}

#[derive(Debug, Clone)]
pub struct JavaMethod {
    pub owner: ClassId,
    pub name: String,
    pub descriptor: String,
    pub modifiers: Modifiers,
    pub annotations: Vec<JavaAnnotation>,
    pub type_parameters: Vec<TypeVarId>,
    pub parameters: Vec<JavaParameter>,
    pub raw_return_type: ClassId,
    pub generic_return_type: Option<JavaType>,
    pub throws: Vec<ClassId>,
    pub body: CodeUnitBody,
}

#[derive(Debug, Clone)]
pub struct JavaConstructor {
    pub owner: ClassId,
    pub descriptor: String,
    pub modifiers: Modifiers,
    pub annotations: Vec<JavaAnnotation>,
    pub type_parameters: Vec<TypeVarId>,
    pub parameters: Vec<JavaParameter>,
    pub throws: Vec<ClassId>,
    pub body: CodeUnitBody,
}

#[derive(Debug, Clone)]
pub struct JavaStaticInitializer {
    pub owner: ClassId,
    pub body: CodeUnitBody,
}

/// What a method/constructor/initializer body contains, beyond its
/// declaration: the accesses it performs and the structural checks it makes.
#[derive(Debug, Clone, Default)]
pub struct CodeUnitBody {
    /// First source line of the unit, `0` when unknown.
    pub line: u32,
    pub accesses: Vec<JavaAccess>,
    pub referenced_class_objects: Vec<ReferencedClassObject>,
    pub instanceof_checks: Vec<InstanceofCheck>,
    pub try_catch_blocks: Vec<TryCatchBlock>,
}

/// A class literal (`Foo.class`) mentioned by a code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencedClassObject {
    pub class: ClassId,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceofCheck {
    pub class: ClassId,
    pub line: u32,
}

/// One try/catch region. An empty `caught` list is a finally handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryCatchBlock {
    pub caught: Vec<ClassId>,
    pub line: u32,
    pub declared_in_lambda: bool,
}

impl JavaMethod {
    pub fn raw_parameter_types(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.parameters.iter().map(|p| p.raw_type)
    }
}

impl JavaConstructor {
    pub fn raw_parameter_types(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.parameters.iter().map(|p| p.raw_type)
    }
}

/// Name every constructor shares in the binary format.
pub const CONSTRUCTOR_NAME: &str = "<init>";
/// Name of the static initializer pseudo-member.
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";
