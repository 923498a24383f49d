mod common;

use common::{class_id, import};
use pretty_assertions::assert_eq;

use quarry_test_utils::{ClassFileBuilder, FieldSpec, MethodSpec};

#[test]
fn mutually_referencing_classes_terminate_and_cross_link() {
    let a = ClassFileBuilder::new("com/example/A")
        .field(FieldSpec::new("other", "Lcom/example/B;"))
        .build();
    let b = ClassFileBuilder::new("com/example/B")
        .field(FieldSpec::new("other", "Lcom/example/A;"))
        .build();

    let graph = import(vec![a, b]);
    let a = class_id(&graph, "com.example.A");
    let b = class_id(&graph, "com.example.B");

    assert!(graph.class(a).is_fully_imported);
    assert!(graph.class(b).is_fully_imported);
    assert_eq!(graph.class(a).fields[0].raw_type, b);
    assert_eq!(graph.class(b).fields[0].raw_type, a);
}

#[test]
fn mutual_generic_bounds_terminate() {
    let a = ClassFileBuilder::new("com/example/A")
        .signature("<T:Lcom/example/B;>Ljava/lang/Object;")
        .build();
    let b = ClassFileBuilder::new("com/example/B")
        .signature("<T:Lcom/example/A;>Ljava/lang/Object;")
        .build();

    let graph = import(vec![a, b]);
    let a = class_id(&graph, "com.example.A");
    let b = class_id(&graph, "com.example.B");

    let a_param = graph.class(a).type_parameters[0];
    let b_param = graph.class(b).type_parameters[0];
    assert_eq!(
        graph.type_variable(a_param).upper_bounds,
        vec![quarry_model::JavaType::Class(b)]
    );
    assert_eq!(
        graph.type_variable(b_param).upper_bounds,
        vec![quarry_model::JavaType::Class(a)]
    );
}

#[test]
fn superclass_chain_also_references_classes_resolved_later() {
    // Registration order is alphabetical in the registry, so Leaf resolves
    // before Mid and Base only through recursive on-demand finalization.
    let base = ClassFileBuilder::new("com/example/Base").build();
    let mid = ClassFileBuilder::new("com/example/Mid").super_class("com/example/Base").build();
    let leaf = ClassFileBuilder::new("com/example/Leaf")
        .super_class("com/example/Mid")
        .implements("com/example/I1")
        .build();
    let i0 = ClassFileBuilder::new("com/example/I0").interface_kind().build();
    let i1 = ClassFileBuilder::new("com/example/I1")
        .interface_kind()
        .implements("com/example/I0")
        .build();

    let graph = import(vec![leaf, mid, base, i1, i0]);
    let base = class_id(&graph, "com.example.Base");
    let mid = class_id(&graph, "com.example.Mid");
    let leaf = class_id(&graph, "com.example.Leaf");
    let i0 = class_id(&graph, "com.example.I0");
    let i1 = class_id(&graph, "com.example.I1");
    let object = class_id(&graph, "java.lang.Object");

    assert_eq!(graph.superclasses_of(leaf), vec![mid, base, object]);
    assert_eq!(graph.all_interfaces_of(leaf), vec![i1, i0]);
    assert_eq!(graph.direct_subclasses(base), vec![mid]);
    assert_eq!(graph.all_subtypes(base), vec![mid, leaf]);
    assert_eq!(graph.direct_implementors(i1), vec![leaf]);
    assert_eq!(graph.all_subtypes(i1), vec![leaf]);
}

#[test]
fn interfaces_report_no_superclass() {
    let iface = ClassFileBuilder::new("com/example/Iface").interface_kind().build();
    let graph = import(vec![iface]);
    let id = class_id(&graph, "com.example.Iface");
    let class = graph.class(id);
    assert!(class.is_interface());
    assert_eq!(class.superclass, None);
}

#[test]
fn unimported_references_become_stubs_with_empty_queries() {
    let bytes = ClassFileBuilder::new("com/example/User")
        .field(FieldSpec::new("dep", "Lcom/example/Unknown;"))
        .method(MethodSpec::new("use", "(Lcom/example/Unknown;)Lcom/example/Unknown;"))
        .build();

    let graph = import(vec![bytes]);
    let unknown = class_id(&graph, "com.example.Unknown");
    let class = graph.class(unknown);

    assert!(!class.is_fully_imported);
    assert!(class.fields.is_empty());
    assert!(class.methods.is_empty());
    assert!(class.superclass.is_none());
    assert!(graph.direct_subclasses(unknown).is_empty());
    assert!(graph.accesses_from_class(unknown).is_empty());
    assert!(graph.dependencies_from_class(unknown).is_empty());

    // The stub is still indexed as a used type.
    let usage = graph.usage_of(unknown);
    assert_eq!(usage.as_field_type.len(), 1);
    assert_eq!(usage.as_parameter_type.len(), 1);
    assert_eq!(usage.as_return_type.len(), 1);
}

#[test]
fn every_name_resolves_to_exactly_one_class() {
    let a = ClassFileBuilder::new("com/example/A")
        .field(FieldSpec::new("one", "Lcom/example/Shared;"))
        .build();
    let b = ClassFileBuilder::new("com/example/B")
        .field(FieldSpec::new("two", "Lcom/example/Shared;"))
        .build();

    let graph = import(vec![a, b]);
    let a = class_id(&graph, "com.example.A");
    let b = class_id(&graph, "com.example.B");
    assert_eq!(graph.class(a).fields[0].raw_type, graph.class(b).fields[0].raw_type);
}
