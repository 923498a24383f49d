//! Converts raw access records into resolved [`JavaAccess`]es.
//!
//! Field targets resolve by hierarchy walk, most specific declaration
//! first. Call targets resolve by name and raw parameter erasures; when only
//! unrelated super-interfaces declare a match (a diamond), the full set of
//! equally-specific candidates is kept rather than one picked arbitrarily.

use std::iter;

use quarry_classfile::parse_method_descriptor;
use quarry_model::{
    AccessKind, AccessTarget, ClassGraph, ClassId, CodeUnitId, CodeUnitKind, FieldId, JavaAccess,
    TargetResolution,
};

use crate::raw::{RawAccessKind, RawAccessRecord};
use crate::registry::ClassRegistry;

pub(crate) fn link_accesses(registry: &mut ClassRegistry<'_>) {
    // Linking can itself pull new classes in through the classpath fallback,
    // which enqueues further units; drain until the queue stays empty.
    loop {
        let queue = registry.take_link_queue();
        if queue.is_empty() {
            break;
        }
        for pending in queue {
            let accesses: Vec<JavaAccess> = pending
                .accesses
                .iter()
                .map(|record| link_one(registry, pending.unit, record))
                .collect();
            registry.set_unit_accesses(pending.unit, accesses);
        }
    }
}

fn link_one(
    registry: &mut ClassRegistry<'_>,
    origin: CodeUnitId,
    record: &RawAccessRecord,
) -> JavaAccess {
    let record = redirect_through_accessor(registry, record);
    let owner = registry.resolve_reference(&record.owner);
    let (kind, resolution) = match record.kind {
        RawAccessKind::FieldGet => (
            AccessKind::FieldGet,
            TargetResolution::Field(resolve_field(registry.graph(), owner, &record.name)),
        ),
        RawAccessKind::FieldSet => (
            AccessKind::FieldSet,
            TargetResolution::Field(resolve_field(registry.graph(), owner, &record.name)),
        ),
        RawAccessKind::ConstructorCall | RawAccessKind::ConstructorReference => {
            let params = parameter_ids(registry, &record.descriptor);
            let kind = if record.kind == RawAccessKind::ConstructorCall {
                AccessKind::ConstructorCall
            } else {
                AccessKind::ConstructorReference
            };
            (
                kind,
                TargetResolution::CodeUnits(resolve_constructor(
                    registry.graph(),
                    owner,
                    &params,
                )),
            )
        }
        RawAccessKind::MethodCall | RawAccessKind::MethodReference => {
            let params = parameter_ids(registry, &record.descriptor);
            let kind = if record.kind == RawAccessKind::MethodCall {
                AccessKind::MethodCall
            } else {
                AccessKind::MethodReference
            };
            (
                kind,
                TargetResolution::CodeUnits(resolve_method(
                    registry.graph(),
                    owner,
                    &record.name,
                    &record.descriptor,
                    &params,
                )),
            )
        }
    };

    JavaAccess {
        origin,
        kind,
        target: AccessTarget {
            owner,
            name: record.name.clone(),
            descriptor: record.descriptor.clone(),
            resolution,
        },
        line: record.line,
        declared_in_lambda: record.declared_in_lambda,
    }
}

/// A call whose target is a compiler-generated private accessor is reported
/// as a direct access to the private member inside the accessor, at the
/// caller's line. The accessor itself never became a member.
fn redirect_through_accessor(
    registry: &ClassRegistry<'_>,
    record: &RawAccessRecord,
) -> RawAccessRecord {
    if record.kind == RawAccessKind::MethodCall {
        if let Some(interior) =
            registry.accessor_interior(&record.owner, &record.name, &record.descriptor)
        {
            return RawAccessRecord {
                kind: interior.kind,
                owner: interior.owner.clone(),
                name: interior.name.clone(),
                descriptor: interior.descriptor.clone(),
                line: record.line,
                declared_in_lambda: record.declared_in_lambda,
            };
        }
    }
    record.clone()
}

fn parameter_ids(registry: &mut ClassRegistry<'_>, descriptor: &str) -> Vec<ClassId> {
    match parse_method_descriptor(descriptor) {
        Ok(parsed) => {
            parsed.params.iter().map(|ty| registry.class_from_field_type(ty)).collect()
        }
        Err(_) => Vec::new(),
    }
}

/// Walk the hierarchy from the receiver upward; the nearest declaration of
/// `name` wins, so fields shadowed at different levels stay distinct.
fn resolve_field(graph: &ClassGraph, owner: ClassId, name: &str) -> Option<FieldId> {
    let hierarchy = iter::once(owner)
        .chain(graph.superclasses_of(owner))
        .chain(graph.all_interfaces_of(owner));
    for class_id in hierarchy {
        if let Some(index) = graph.class(class_id).fields.iter().position(|f| f.name == name) {
            return Some(FieldId { class: class_id, index: index as u32 });
        }
    }
    None
}

fn resolve_method(
    graph: &ClassGraph,
    owner: ClassId,
    name: &str,
    descriptor: &str,
    params: &[ClassId],
) -> Vec<CodeUnitId> {
    let matches = |class_id: ClassId| {
        let methods = &graph.class(class_id).methods;
        let matching: Vec<usize> = methods
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                m.name == name
                    && m.parameters.len() == params.len()
                    && m.raw_parameter_types().eq(params.iter().copied())
            })
            .map(|(index, _)| index)
            .collect();
        // Covariant-return pairs (a bridge and its override) share name and
        // parameters; the compiled descriptor identifies which one is meant.
        let index = match matching.as_slice() {
            [] => return None,
            [index] => *index,
            many => many
                .iter()
                .copied()
                .find(|index| methods[*index].descriptor == descriptor)
                .unwrap_or(many[0]),
        };
        Some(CodeUnitId { class: class_id, kind: CodeUnitKind::Method, index: index as u32 })
    };

    // The receiver class and its superclass chain take precedence over any
    // interface declaration; the nearest declaration wins outright.
    for class_id in iter::once(owner).chain(graph.superclasses_of(owner)) {
        if let Some(found) = matches(class_id) {
            return vec![found];
        }
    }

    let candidates: Vec<CodeUnitId> =
        graph.all_interfaces_of(owner).into_iter().filter_map(matches).collect();

    // Keep only the most specific declarations: a candidate loses when
    // another candidate's owner extends its owner. Unrelated leftovers are
    // the diamond case and all survive.
    candidates
        .iter()
        .filter(|candidate| {
            !candidates.iter().any(|other| {
                other.class != candidate.class
                    && graph.all_interfaces_of(other.class).contains(&candidate.class)
            })
        })
        .copied()
        .collect()
}

/// Constructors are never inherited; only the receiver's own declarations
/// can match.
fn resolve_constructor(
    graph: &ClassGraph,
    owner: ClassId,
    params: &[ClassId],
) -> Vec<CodeUnitId> {
    graph
        .class(owner)
        .constructors
        .iter()
        .position(|c| {
            c.parameters.len() == params.len()
                && c.raw_parameter_types().eq(params.iter().copied())
        })
        .map(|index| {
            vec![CodeUnitId {
                class: owner,
                kind: CodeUnitKind::Constructor,
                index: index as u32,
            }]
        })
        .unwrap_or_default()
}
