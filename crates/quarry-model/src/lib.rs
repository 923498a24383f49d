//! The domain model of an import: an immutable, queryable graph of classes,
//! members, types and accesses.
//!
//! Everything here is index-based. Classes live in one arena, referenced by
//! [`ClassId`]; type variable declarations live in another, referenced by
//! [`TypeVarId`]. Cross-references between classes are always ids, never
//! owned embeddings, which is what lets mutually referencing classes
//! coexist.

#![forbid(unsafe_code)]

mod access;
mod annotation;
mod class;
mod export;
mod flags;
mod graph;
mod ids;
mod member;
mod types;

pub use crate::access::{
    AccessKind, AccessTarget, Dependency, JavaAccess, ResolvedTarget, TargetResolution,
};
pub use crate::annotation::{AnnotationValue, JavaAnnotation};
pub use crate::class::{JavaClass, JavaClassKind, Source, SourceChecksum};
pub use crate::export::{ClassExport, DependencyExport, GraphExport};
pub use crate::flags::Modifiers;
pub use crate::graph::{
    AccessLoc, AnnotatedElement, ClassGraph, TypeUsage, WellKnown, PRIMITIVE_NAMES,
};
pub use crate::ids::{ClassId, TypeVarId};
pub use crate::member::{
    CodeUnitBody, CodeUnitId, CodeUnitKind, FieldId, InstanceofCheck, JavaConstructor, JavaField,
    JavaMethod, JavaParameter, JavaStaticInitializer, MemberId, ReferencedClassObject,
    TryCatchBlock, CONSTRUCTOR_NAME, STATIC_INITIALIZER_NAME,
};
pub use crate::types::{JavaType, TypeVariableDef};
