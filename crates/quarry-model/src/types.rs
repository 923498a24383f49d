use crate::ids::{ClassId, TypeVarId};

/// A possibly-generic type expression.
///
/// Every variant has a well-defined erasure; see
/// [`ClassGraph::erasure_of`](crate::ClassGraph::erasure_of), which also
/// terminates on mutually recursive type-variable bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaType {
    /// A concrete class, primitive, or array class, used raw.
    Class(ClassId),
    /// A parameterized use of a generic class, e.g. `List<String>`.
    Parameterized { erasure: ClassId, arguments: Vec<JavaType> },
    TypeVariable(TypeVarId),
    /// `?`, `? extends X`, `? super X`.
    Wildcard { upper: Option<Box<JavaType>>, lower: Option<Box<JavaType>> },
    /// An array with a generic component, e.g. `T[]` or `List<String>[]`.
    /// `erasure` is the synthesized array class of the component's erasure.
    Array { component: Box<JavaType>, erasure: ClassId },
}

impl JavaType {
    pub fn unbounded_wildcard() -> Self {
        JavaType::Wildcard { upper: None, lower: None }
    }

    pub fn wildcard_extends(bound: JavaType) -> Self {
        JavaType::Wildcard { upper: Some(Box::new(bound)), lower: None }
    }

    pub fn wildcard_super(bound: JavaType) -> Self {
        JavaType::Wildcard { upper: None, lower: Some(Box::new(bound)) }
    }
}

/// A type variable declaration.
///
/// Allocated with empty bounds first so self-referential declarations
/// (`T extends Comparable<T>`) can mention their own id; the importer fills
/// the bounds in afterwards. A declaration that stays without bounds is a
/// stub standing in for a variable declared outside the import set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVariableDef {
    pub name: String,
    pub upper_bounds: Vec<JavaType>,
}
