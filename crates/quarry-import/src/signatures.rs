//! Translation of signature ASTs into bound [`JavaType`] trees.
//!
//! A [`TypeVarScope`] carries every type-variable declaration visible at the
//! translation site, nearest declaration last so lookups walk outward from
//! the innermost scope. A declaration's own parameter ids are allocated
//! before any of its bounds resolve, which is what makes self-referential
//! (`T extends Comparable<T>`) and mutually recursive bounds terminate: the
//! name is already in scope when its bound mentions it.

use quarry_classfile::{
    ClassTypeSignature, FieldTypeSignature, TypeArgument, TypeParameter, TypeSignature,
};
use quarry_model::{JavaType, TypeVarId};

use crate::raw::dotted;
use crate::registry::ClassRegistry;

/// Visible type-variable declarations, innermost scope last.
#[derive(Debug, Clone, Default)]
pub(crate) struct TypeVarScope {
    entries: Vec<(String, TypeVarId)>,
}

impl TypeVarScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, id: TypeVarId) {
        self.entries.push((name.into(), id));
    }

    /// Nearest enclosing declaration of `name` wins.
    pub fn lookup(&self, name: &str) -> Option<TypeVarId> {
        self.entries.iter().rev().find(|(n, _)| n == name).map(|(_, id)| *id)
    }
}

/// Allocate ids for a declaration's formal type parameters, bring them into
/// scope, then resolve their bounds. Two passes, so `<T extends
/// Comparable<T>>` and mutually referencing parameters bind to the ids
/// allocated in the first pass.
pub(crate) fn declare_type_parameters(
    registry: &mut ClassRegistry<'_>,
    scope: &mut TypeVarScope,
    parameters: &[TypeParameter],
) -> Vec<TypeVarId> {
    let ids: Vec<TypeVarId> = parameters
        .iter()
        .map(|parameter| {
            let id = registry.alloc_type_variable(&parameter.name);
            scope.insert(parameter.name.clone(), id);
            id
        })
        .collect();

    for (parameter, id) in parameters.iter().zip(&ids) {
        let mut bounds = Vec::new();
        if let Some(class_bound) = &parameter.class_bound {
            bounds.push(java_type_from_field_signature(registry, scope, class_bound));
        }
        for interface_bound in &parameter.interface_bounds {
            bounds.push(java_type_from_field_signature(registry, scope, interface_bound));
        }
        registry.set_type_variable_bounds(*id, bounds);
    }
    ids
}

pub(crate) fn java_type_from_type_signature(
    registry: &mut ClassRegistry<'_>,
    scope: &mut TypeVarScope,
    signature: &TypeSignature,
) -> JavaType {
    match signature {
        TypeSignature::Base(base) => {
            let id = registry.ensure_class_by_name(base.name());
            JavaType::Class(id)
        }
        TypeSignature::Field(field) => java_type_from_field_signature(registry, scope, field),
    }
}

pub(crate) fn java_type_from_field_signature(
    registry: &mut ClassRegistry<'_>,
    scope: &mut TypeVarScope,
    signature: &FieldTypeSignature,
) -> JavaType {
    match signature {
        FieldTypeSignature::Class(class) => class_type_from_signature(registry, scope, class),
        FieldTypeSignature::TypeVariable(name) => {
            JavaType::TypeVariable(lookup_or_stub(registry, scope, name))
        }
        FieldTypeSignature::Array(component) => {
            let component = java_type_from_type_signature(registry, scope, component);
            let component_erasure = registry.erasure_of(&component);
            let erasure = registry.ensure_array_of(component_erasure);
            JavaType::Array { component: Box::new(component), erasure }
        }
    }
}

/// A parameterized reference becomes `Parameterized`; a raw reference to a
/// generic class stays a plain `Class` (callers distinguish raw use from
/// parameterized use).
pub(crate) fn class_type_from_signature(
    registry: &mut ClassRegistry<'_>,
    scope: &mut TypeVarScope,
    signature: &ClassTypeSignature,
) -> JavaType {
    let erasure = registry.resolve_reference(&dotted(&signature.binary_name()));
    let arguments: Vec<JavaType> = signature
        .all_type_arguments()
        .map(|argument| match argument {
            TypeArgument::Unbounded => JavaType::unbounded_wildcard(),
            TypeArgument::Extends(bound) => {
                JavaType::wildcard_extends(java_type_from_field_signature(registry, scope, bound))
            }
            TypeArgument::Super(bound) => {
                JavaType::wildcard_super(java_type_from_field_signature(registry, scope, bound))
            }
            TypeArgument::Exact(argument) => {
                java_type_from_field_signature(registry, scope, argument)
            }
        })
        .collect();
    if arguments.is_empty() {
        JavaType::Class(erasure)
    } else {
        JavaType::Parameterized { erasure, arguments }
    }
}

/// Resolve a type-variable reference, synthesizing a stub declaration (same
/// name, no bounds) when no enclosing declaration is in scope — typically an
/// inner class imported without its enclosing class. The stub goes into the
/// scope so repeated references share one id.
fn lookup_or_stub(
    registry: &mut ClassRegistry<'_>,
    scope: &mut TypeVarScope,
    name: &str,
) -> TypeVarId {
    if let Some(id) = scope.lookup(name) {
        return id;
    }
    let id = registry.alloc_type_variable(name);
    scope.insert(name.to_string(), id);
    id
}
