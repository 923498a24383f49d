mod common;

use common::{class_id, import};
use pretty_assertions::assert_eq;

use quarry_model::{
    AccessKind, CodeUnitKind, MemberId, ResolvedTarget, TargetResolution,
};
use quarry_test_utils::{flags, ClassFileBuilder, CodeSpec, FieldSpec, Ins, MethodSpec};

#[test]
fn diamond_call_resolves_to_all_equally_specific_candidates() {
    let left = ClassFileBuilder::new("com/example/Left")
        .interface_kind()
        .method(MethodSpec::new("work", "()V").access(flags::ACC_PUBLIC | flags::ACC_ABSTRACT))
        .build();
    let right = ClassFileBuilder::new("com/example/Right")
        .interface_kind()
        .method(MethodSpec::new("work", "()V").access(flags::ACC_PUBLIC | flags::ACC_ABSTRACT))
        .build();
    let bottom = ClassFileBuilder::new("com/example/Bottom")
        .interface_kind()
        .implements("com/example/Left")
        .implements("com/example/Right")
        .build();
    let caller = ClassFileBuilder::new("com/example/Caller")
        .method(
            MethodSpec::new("run", "(Lcom/example/Bottom;)V").code(
                CodeSpec::new()
                    .ins(Ins::Line(4))
                    .ins(Ins::Aload1)
                    .ins(Ins::invoke_interface("com/example/Bottom", "work", "()V"))
                    .ins(Ins::Return),
            ),
        )
        .build();

    let graph = import(vec![left, right, bottom, caller]);
    let left = class_id(&graph, "com.example.Left");
    let right = class_id(&graph, "com.example.Right");
    let caller = class_id(&graph, "com.example.Caller");

    let accesses = graph.accesses_from_class(caller);
    assert_eq!(accesses.len(), 1);
    let access = accesses[0];
    assert_eq!(access.kind, AccessKind::MethodCall);
    match access.target.resolved_member() {
        ResolvedTarget::Ambiguous(candidates) => {
            let mut owners: Vec<_> = candidates.iter().map(|c| c.class).collect();
            owners.sort();
            let mut expected = vec![left, right];
            expected.sort();
            assert_eq!(owners, expected);
        }
        other => panic!("expected ambiguous diamond resolution, got {other:?}"),
    }
}

#[test]
fn most_specific_interface_override_wins_over_diamond() {
    let top = ClassFileBuilder::new("com/example/Top")
        .interface_kind()
        .method(MethodSpec::new("work", "()V").access(flags::ACC_PUBLIC | flags::ACC_ABSTRACT))
        .build();
    let refined = ClassFileBuilder::new("com/example/Refined")
        .interface_kind()
        .implements("com/example/Top")
        .method(MethodSpec::new("work", "()V").access(flags::ACC_PUBLIC | flags::ACC_ABSTRACT))
        .build();
    let bottom = ClassFileBuilder::new("com/example/Bottom")
        .interface_kind()
        .implements("com/example/Top")
        .implements("com/example/Refined")
        .build();
    let caller = ClassFileBuilder::new("com/example/Caller")
        .method(
            MethodSpec::new("run", "(Lcom/example/Bottom;)V").code(
                CodeSpec::new()
                    .ins(Ins::Aload1)
                    .ins(Ins::invoke_interface("com/example/Bottom", "work", "()V"))
                    .ins(Ins::Return),
            ),
        )
        .build();

    let graph = import(vec![top, refined, bottom, caller]);
    let refined = class_id(&graph, "com.example.Refined");
    let caller = class_id(&graph, "com.example.Caller");

    let accesses = graph.accesses_from_class(caller);
    match accesses[0].target.resolved_member() {
        ResolvedTarget::Unique(MemberId::CodeUnit(unit)) => assert_eq!(unit.class, refined),
        other => panic!("expected the refining interface to win, got {other:?}"),
    }
}

#[test]
fn shadowed_fields_stay_distinct_by_declaring_class() {
    let base = ClassFileBuilder::new("com/example/Base")
        .field(FieldSpec::new("value", "Ljava/lang/String;"))
        .method(
            MethodSpec::new("readOwn", "()Ljava/lang/String;").code(
                CodeSpec::new()
                    .ins(Ins::Line(7))
                    .ins(Ins::Aload0)
                    .ins(Ins::get_field("com/example/Base", "value", "Ljava/lang/String;"))
                    .ins(Ins::Areturn),
            ),
        )
        .build();
    let sub = ClassFileBuilder::new("com/example/Sub")
        .super_class("com/example/Base")
        .field(FieldSpec::new("value", "Ljava/lang/String;"))
        .build();
    let caller = ClassFileBuilder::new("com/example/Caller")
        .method(
            MethodSpec::new("readSub", "(Lcom/example/Sub;)Ljava/lang/String;").code(
                CodeSpec::new()
                    .ins(Ins::Line(12))
                    .ins(Ins::Aload1)
                    .ins(Ins::get_field("com/example/Sub", "value", "Ljava/lang/String;"))
                    .ins(Ins::Areturn),
            ),
        )
        .build();

    let graph = import(vec![base, sub, caller]);
    let base = class_id(&graph, "com.example.Base");
    let sub = class_id(&graph, "com.example.Sub");
    let caller = class_id(&graph, "com.example.Caller");

    let through_sub = &graph.accesses_from_class(caller)[0];
    match through_sub.target.resolved_member() {
        ResolvedTarget::Unique(MemberId::Field(field)) => assert_eq!(field.class, sub),
        other => panic!("expected the subclass field, got {other:?}"),
    }

    let own = &graph.accesses_from_class(base)[0];
    match own.target.resolved_member() {
        ResolvedTarget::Unique(MemberId::Field(field)) => assert_eq!(field.class, base),
        other => panic!("expected the superclass's own field, got {other:?}"),
    }
}

#[test]
fn inherited_field_access_resolves_up_the_hierarchy() {
    let base = ClassFileBuilder::new("com/example/Base")
        .field(FieldSpec::new("count", "I"))
        .build();
    let sub = ClassFileBuilder::new("com/example/Sub").super_class("com/example/Base").build();
    let caller = ClassFileBuilder::new("com/example/Caller")
        .method(
            MethodSpec::new("read", "(Lcom/example/Sub;)I").code(
                CodeSpec::new()
                    .ins(Ins::Aload1)
                    .ins(Ins::get_field("com/example/Sub", "count", "I"))
                    .ins(Ins::Ireturn),
            ),
        )
        .build();

    let graph = import(vec![base, sub, caller]);
    let base = class_id(&graph, "com.example.Base");
    let caller = class_id(&graph, "com.example.Caller");

    let access = &graph.accesses_from_class(caller)[0];
    match access.target.resolved_member() {
        ResolvedTarget::Unique(MemberId::Field(field)) => assert_eq!(field.class, base),
        other => panic!("expected the inherited field, got {other:?}"),
    }
}

#[test]
fn lambda_accesses_are_attributed_to_the_enclosing_method() {
    let (builder, bootstrap) = ClassFileBuilder::new("com/example/WithLambda").lambda_bootstrap(
        6,
        "com/example/WithLambda",
        "lambda$run$0",
        "()V",
    );
    let bytes = builder
        .method(
            MethodSpec::new("run", "()V").code(
                CodeSpec::new()
                    .ins(Ins::Line(10))
                    .ins(Ins::InvokeDynamic {
                        bootstrap,
                        name: "run".into(),
                        descriptor: "()Ljava/lang/Runnable;".into(),
                    })
                    .ins(Ins::Pop)
                    .ins(Ins::Return),
            ),
        )
        .method(
            MethodSpec::new("lambda$run$0", "()V")
                .access(flags::ACC_PRIVATE | flags::ACC_STATIC | flags::ACC_SYNTHETIC)
                .code(
                    CodeSpec::new()
                        .ins(Ins::Line(11))
                        .ins(Ins::get_static("com/example/Config", "FLAG", "Z"))
                        .ins(Ins::Pop)
                        .ins(Ins::Return),
                ),
        )
        .build();
    let config = ClassFileBuilder::new("com/example/Config")
        .field(FieldSpec::new("FLAG", "Z").access(flags::ACC_PUBLIC | flags::ACC_STATIC))
        .build();

    let graph = import(vec![bytes, config]);
    let with_lambda = class_id(&graph, "com.example.WithLambda");
    let class = graph.class(with_lambda);

    // The synthetic lambda method is not a member.
    assert!(class.methods.iter().all(|m| m.name == "run"));

    let run = class.methods.iter().find(|m| m.name == "run").unwrap();
    assert_eq!(run.body.accesses.len(), 1);
    let access = &run.body.accesses[0];
    assert!(access.declared_in_lambda);
    assert_eq!(access.kind, AccessKind::FieldGet);
    assert_eq!(access.origin.kind, CodeUnitKind::Method);
    assert_eq!(access.origin.class, with_lambda);
    assert_eq!(access.line, 11);
    assert_eq!(graph.class(access.target.owner).name, "com.example.Config");
}

#[test]
fn nested_lambdas_fold_transitively() {
    let (builder, outer_bootstrap) = ClassFileBuilder::new("com/example/Nested")
        .lambda_bootstrap(6, "com/example/Nested", "lambda$run$0", "()V");
    let (builder, inner_bootstrap) =
        builder.lambda_bootstrap(6, "com/example/Nested", "lambda$run$1", "()V");
    let bytes = builder
        .method(
            MethodSpec::new("run", "()V").code(
                CodeSpec::new()
                    .ins(Ins::InvokeDynamic {
                        bootstrap: outer_bootstrap,
                        name: "run".into(),
                        descriptor: "()Ljava/lang/Runnable;".into(),
                    })
                    .ins(Ins::Pop)
                    .ins(Ins::Return),
            ),
        )
        .method(
            MethodSpec::new("lambda$run$0", "()V")
                .access(flags::ACC_PRIVATE | flags::ACC_STATIC | flags::ACC_SYNTHETIC)
                .code(
                    CodeSpec::new()
                        .ins(Ins::InvokeDynamic {
                            bootstrap: inner_bootstrap,
                            name: "run".into(),
                            descriptor: "()Ljava/lang/Runnable;".into(),
                        })
                        .ins(Ins::Pop)
                        .ins(Ins::Return),
                ),
        )
        .method(
            MethodSpec::new("lambda$run$1", "()V")
                .access(flags::ACC_PRIVATE | flags::ACC_STATIC | flags::ACC_SYNTHETIC)
                .code(
                    CodeSpec::new()
                        .ins(Ins::Line(21))
                        .ins(Ins::get_static("com/example/Config", "FLAG", "Z"))
                        .ins(Ins::Pop)
                        .ins(Ins::Return),
                ),
        )
        .build();

    let graph = import(vec![bytes]);
    let nested = class_id(&graph, "com.example.Nested");
    let class = graph.class(nested);
    assert_eq!(class.methods.len(), 1);

    let run = &class.methods[0];
    assert_eq!(run.body.accesses.len(), 1);
    assert!(run.body.accesses[0].declared_in_lambda);
    assert_eq!(run.body.accesses[0].line, 21);
}

#[test]
fn synthetic_accessor_calls_become_direct_private_member_accesses() {
    let outer = ClassFileBuilder::new("com/example/Outer")
        .field(FieldSpec::new("secret", "I"))
        .method(
            MethodSpec::new("access$000", "(Lcom/example/Outer;)I")
                .access(flags::ACC_STATIC | flags::ACC_SYNTHETIC)
                .code(
                    CodeSpec::new()
                        .ins(Ins::Aload0)
                        .ins(Ins::get_field("com/example/Outer", "secret", "I"))
                        .ins(Ins::Ireturn),
                ),
        )
        .build();
    let inner = ClassFileBuilder::new("com/example/Outer$Inner")
        .inner_class("com/example/Outer$Inner", Some("com/example/Outer"), Some("Inner"), 0)
        .method(
            MethodSpec::new("peek", "(Lcom/example/Outer;)I").code(
                CodeSpec::new()
                    .ins(Ins::Line(30))
                    .ins(Ins::Aload1)
                    .ins(Ins::invoke_static(
                        "com/example/Outer",
                        "access$000",
                        "(Lcom/example/Outer;)I",
                    ))
                    .ins(Ins::Ireturn),
            ),
        )
        .build();

    let graph = import(vec![outer, inner]);
    let outer = class_id(&graph, "com.example.Outer");
    let inner = class_id(&graph, "com.example.Outer$Inner");

    // The accessor is suppressed from the member list.
    assert!(graph.class(outer).methods.is_empty());

    let access = &graph.accesses_from_class(inner)[0];
    assert_eq!(access.kind, AccessKind::FieldGet);
    assert_eq!(access.line, 30);
    assert_eq!(access.target.owner, outer);
    match access.target.resolved_member() {
        ResolvedTarget::Unique(MemberId::Field(field)) => {
            assert_eq!(graph.field(field).name, "secret");
            assert!(graph.field(field).modifiers.is_private());
        }
        other => panic!("expected the private field, got {other:?}"),
    }
}

#[test]
fn bridge_methods_are_kept_and_flagged() {
    let bytes = ClassFileBuilder::new("com/example/Covariant")
        .method(
            MethodSpec::new("get", "()Ljava/lang/String;").code(
                CodeSpec::new().ins(Ins::AconstNull).ins(Ins::Areturn),
            ),
        )
        .method(
            MethodSpec::new("get", "()Ljava/lang/Object;")
                .access(flags::ACC_PUBLIC | flags::ACC_BRIDGE | flags::ACC_SYNTHETIC)
                .code(
                    CodeSpec::new()
                        .ins(Ins::Aload0)
                        .ins(Ins::invoke_virtual(
                            "com/example/Covariant",
                            "get",
                            "()Ljava/lang/String;",
                        ))
                        .ins(Ins::Areturn),
                ),
        )
        .method(
            MethodSpec::new("callBridge", "()Ljava/lang/Object;").code(
                CodeSpec::new()
                    .ins(Ins::Aload0)
                    .ins(Ins::invoke_virtual(
                        "com/example/Covariant",
                        "get",
                        "()Ljava/lang/Object;",
                    ))
                    .ins(Ins::Areturn),
            ),
        )
        .build();

    let graph = import(vec![bytes]);
    let id = class_id(&graph, "com.example.Covariant");
    let class = graph.class(id);

    let bridge = class
        .methods
        .iter()
        .find(|m| m.name == "get" && m.descriptor == "()Ljava/lang/Object;")
        .unwrap();
    assert!(bridge.modifiers.is_bridge());
    assert!(bridge.modifiers.is_synthetic());

    let caller = class.methods.iter().find(|m| m.name == "callBridge").unwrap();
    match caller.body.accesses[0].target.resolved_member() {
        ResolvedTarget::Unique(MemberId::CodeUnit(unit)) => {
            let target = graph.method(unit).unwrap();
            assert!(target.modifiers.is_bridge());
        }
        other => panic!("expected the bridge itself, got {other:?}"),
    }
}

#[test]
fn method_and_constructor_references_are_captured() {
    let (builder, method_ref) = ClassFileBuilder::new("com/example/Refs").lambda_bootstrap(
        5, // REF_invokeVirtual
        "com/example/Target",
        "work",
        "()V",
    );
    let (builder, ctor_ref) =
        builder.lambda_bootstrap(8, "com/example/Target", "<init>", "()V");
    let bytes = builder
        .method(
            MethodSpec::new("capture", "()V").code(
                CodeSpec::new()
                    .ins(Ins::Line(15))
                    .ins(Ins::InvokeDynamic {
                        bootstrap: method_ref,
                        name: "run".into(),
                        descriptor: "()Ljava/lang/Runnable;".into(),
                    })
                    .ins(Ins::Pop)
                    .ins(Ins::Line(16))
                    .ins(Ins::InvokeDynamic {
                        bootstrap: ctor_ref,
                        name: "get".into(),
                        descriptor: "()Ljava/util/function/Supplier;".into(),
                    })
                    .ins(Ins::Pop)
                    .ins(Ins::Return),
            ),
        )
        .build();
    let target = ClassFileBuilder::new("com/example/Target")
        .method(MethodSpec::new("work", "()V").code(CodeSpec::new().ins(Ins::Return)))
        .method(
            MethodSpec::new("<init>", "()V").code(
                CodeSpec::new()
                    .ins(Ins::Aload0)
                    .ins(Ins::invoke_special("java/lang/Object", "<init>", "()V"))
                    .ins(Ins::Return),
            ),
        )
        .build();

    let graph = import(vec![bytes, target]);
    let refs = class_id(&graph, "com.example.Refs");
    let target = class_id(&graph, "com.example.Target");

    let accesses = graph.accesses_from_class(refs);
    assert_eq!(accesses.len(), 2);

    let method_reference = accesses.iter().find(|a| a.kind == AccessKind::MethodReference).unwrap();
    assert_eq!(method_reference.line, 15);
    assert_eq!(method_reference.target.owner, target);
    assert!(matches!(
        method_reference.target.resolved_member(),
        ResolvedTarget::Unique(MemberId::CodeUnit(unit)) if unit.kind == CodeUnitKind::Method
    ));

    let ctor_reference =
        accesses.iter().find(|a| a.kind == AccessKind::ConstructorReference).unwrap();
    assert_eq!(ctor_reference.line, 16);
    assert!(matches!(
        ctor_reference.target.resolved_member(),
        ResolvedTarget::Unique(MemberId::CodeUnit(unit)) if unit.kind == CodeUnitKind::Constructor
    ));
}

#[test]
fn constructor_calls_resolve_to_the_declared_constructor() {
    let target = ClassFileBuilder::new("com/example/Widget")
        .method(
            MethodSpec::new("<init>", "(I)V").code(
                CodeSpec::new()
                    .ins(Ins::Aload0)
                    .ins(Ins::invoke_special("java/lang/Object", "<init>", "()V"))
                    .ins(Ins::Return),
            ),
        )
        .build();
    let caller = ClassFileBuilder::new("com/example/Factory")
        .method(
            MethodSpec::new("make", "()Lcom/example/Widget;").code(
                CodeSpec::new()
                    .ins(Ins::Line(9))
                    .ins(Ins::New { class: "com/example/Widget".into() })
                    .ins(Ins::Dup)
                    .ins(Ins::Iconst0)
                    .ins(Ins::invoke_special("com/example/Widget", "<init>", "(I)V"))
                    .ins(Ins::Areturn),
            ),
        )
        .build();

    let graph = import(vec![target, caller]);
    let factory = class_id(&graph, "com.example.Factory");
    let widget = class_id(&graph, "com.example.Widget");

    let calls: Vec<_> = graph
        .accesses_from_class(factory)
        .into_iter()
        .filter(|a| a.kind == AccessKind::ConstructorCall)
        .collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].line, 9);
    assert_eq!(calls[0].target.owner, widget);
    match calls[0].target.resolved_member() {
        ResolvedTarget::Unique(MemberId::CodeUnit(unit)) => {
            assert_eq!(unit.kind, CodeUnitKind::Constructor);
            let ctor = graph.constructor(unit).unwrap();
            assert_eq!(graph.class(ctor.parameters[0].raw_type).name, "int");
        }
        other => panic!("expected the (int) constructor, got {other:?}"),
    }
}

#[test]
fn calls_into_stubs_resolve_to_nothing_but_do_not_fail() {
    let caller = ClassFileBuilder::new("com/example/Caller")
        .method(
            MethodSpec::new("run", "()V").code(
                CodeSpec::new()
                    .ins(Ins::Aload0)
                    .ins(Ins::invoke_virtual("com/example/Missing", "work", "()V"))
                    .ins(Ins::Return),
            ),
        )
        .build();

    let graph = import(vec![caller]);
    let caller = class_id(&graph, "com.example.Caller");
    let access = &graph.accesses_from_class(caller)[0];
    assert_eq!(access.target.resolution, TargetResolution::CodeUnits(vec![]));
    assert_eq!(access.target.resolved_member(), ResolvedTarget::None);
    assert!(!graph.class(access.target.owner).is_fully_imported);
}

#[test]
fn instanceof_class_literals_and_try_catch_are_recorded() {
    let bytes = ClassFileBuilder::new("com/example/Inspector")
        .method(
            MethodSpec::new("inspect", "(Ljava/lang/Object;)V").code(
                CodeSpec::new()
                    .ins(Ins::Line(40))
                    .ins(Ins::Aload1)
                    .ins(Ins::instance_of("com/example/Widget"))
                    .ins(Ins::Pop)
                    .ins(Ins::Line(41))
                    .ins(Ins::ldc_class("com/example/Widget"))
                    .ins(Ins::Pop)
                    .ins(Ins::Label("start"))
                    .ins(Ins::Line(43))
                    .ins(Ins::Aload0)
                    .ins(Ins::invoke_virtual("com/example/Risky", "run", "()V"))
                    .ins(Ins::Label("end"))
                    .ins(Ins::Return)
                    .ins(Ins::Label("handler"))
                    .ins(Ins::Astore1)
                    .ins(Ins::Return)
                    .try_catch("start", "end", "handler", Some("java/io/IOException"))
                    .try_catch("start", "end", "handler", Some("java/lang/IllegalStateException")),
            ),
        )
        .build();

    let graph = import(vec![bytes]);
    let id = class_id(&graph, "com.example.Inspector");
    let method = &graph.class(id).methods[0];
    let widget = class_id(&graph, "com.example.Widget");
    let io_exception = class_id(&graph, "java.io.IOException");
    let illegal_state = class_id(&graph, "java.lang.IllegalStateException");

    assert_eq!(method.body.instanceof_checks.len(), 1);
    assert_eq!(method.body.instanceof_checks[0].class, widget);
    assert_eq!(method.body.instanceof_checks[0].line, 40);

    assert_eq!(method.body.referenced_class_objects.len(), 1);
    assert_eq!(method.body.referenced_class_objects[0].class, widget);
    assert_eq!(method.body.referenced_class_objects[0].line, 41);

    assert_eq!(method.body.try_catch_blocks.len(), 1);
    let block = &method.body.try_catch_blocks[0];
    assert_eq!(block.caught, vec![io_exception, illegal_state]);
    assert_eq!(block.line, 43);
    assert!(!block.declared_in_lambda);

    // The instanceof target shows up in the reverse index.
    let usage = graph.usage_of(widget);
    assert_eq!(usage.as_instanceof_check.len(), 1);
}

#[test]
fn dependencies_collapse_identical_descriptions() {
    let target = ClassFileBuilder::new("com/example/Target")
        .method(MethodSpec::new("work", "()V").code(CodeSpec::new().ins(Ins::Return)))
        .build();
    let caller = ClassFileBuilder::new("com/example/Caller")
        .method(
            MethodSpec::new("run", "()V").code(
                CodeSpec::new()
                    .ins(Ins::Line(5))
                    .ins(Ins::Aload0)
                    .ins(Ins::invoke_virtual("com/example/Target", "work", "()V"))
                    .ins(Ins::Line(6))
                    .ins(Ins::Aload0)
                    .ins(Ins::invoke_virtual("com/example/Target", "work", "()V"))
                    .ins(Ins::Return),
            ),
        )
        .build();

    let graph = import(vec![target, caller]);
    let caller = class_id(&graph, "com.example.Caller");
    let target = class_id(&graph, "com.example.Target");

    let deps = graph.dependencies_from_class(caller);
    // Different lines are different access descriptions.
    assert_eq!(deps.len(), 2);
    for dep in &deps {
        assert_eq!(dep.origin, caller);
        assert_eq!(dep.target, target);
        assert!(dep.description.contains("calls method"));
        assert!(dep.description.contains("com.example.Target.work"));
    }
    assert_eq!(graph.dependencies_to_class(target).len(), 2);

    let to_object = graph.dependencies_to_class(class_id(&graph, "java.lang.Object"));
    assert!(to_object.is_empty());
}
