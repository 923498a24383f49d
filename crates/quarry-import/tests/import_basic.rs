mod common;

use common::{class_id, import};
use pretty_assertions::assert_eq;

use quarry_import::{ClassFileImporter, ClassFileSource, ImportConfig};
use quarry_model::{AccessKind, GraphExport, JavaClassKind, ResolvedTarget, MemberId};
use quarry_test_utils::{flags, ClassFileBuilder, CodeSpec, FieldSpec, Ins, MethodSpec};

fn own_field_access_bytes() -> Vec<u8> {
    ClassFileBuilder::new("com/example/OwnFieldAccess")
        .source_file("OwnFieldAccess.java")
        .field(FieldSpec::new("stringValue", "Ljava/lang/String;"))
        .method(
            MethodSpec::new("getStringValue", "()Ljava/lang/String;").code(
                CodeSpec::new()
                    .ins(Ins::Line(8))
                    .ins(Ins::Aload0)
                    .ins(Ins::get_field(
                        "com/example/OwnFieldAccess",
                        "stringValue",
                        "Ljava/lang/String;",
                    ))
                    .ins(Ins::Areturn),
            ),
        )
        .method(
            MethodSpec::new("setStringValue", "(Ljava/lang/String;)V").code(
                CodeSpec::new()
                    .ins(Ins::Line(12))
                    .ins(Ins::Aload0)
                    .ins(Ins::Aload1)
                    .ins(Ins::put_field(
                        "com/example/OwnFieldAccess",
                        "stringValue",
                        "Ljava/lang/String;",
                    ))
                    .ins(Ins::Line(13))
                    .ins(Ins::Return),
            ),
        )
        .build()
}

#[test]
fn field_get_and_set_are_line_accurate() {
    let graph = import(vec![own_field_access_bytes()]);
    let id = class_id(&graph, "com.example.OwnFieldAccess");
    let class = graph.class(id);
    assert!(class.is_fully_imported);

    let getter = class.methods.iter().find(|m| m.name == "getStringValue").unwrap();
    assert_eq!(getter.body.accesses.len(), 1);
    let get = &getter.body.accesses[0];
    assert_eq!(get.kind, AccessKind::FieldGet);
    assert_eq!(get.line, 8);
    assert_eq!(get.target.name, "stringValue");

    let setter = class.methods.iter().find(|m| m.name == "setStringValue").unwrap();
    assert_eq!(setter.body.accesses.len(), 1);
    let set = &setter.body.accesses[0];
    assert_eq!(set.kind, AccessKind::FieldSet);
    assert_eq!(set.line, 12);

    // Both resolve to the same declared field.
    let field_id = match get.target.resolved_member() {
        ResolvedTarget::Unique(MemberId::Field(field)) => field,
        other => panic!("expected unique field, got {other:?}"),
    };
    assert_eq!(graph.field(field_id).name, "stringValue");
    assert_eq!(set.target.resolved_member(), get.target.resolved_member());
}

#[test]
fn members_modifiers_and_source_are_reconstructed() {
    let graph = import(vec![own_field_access_bytes()]);
    let id = class_id(&graph, "com.example.OwnFieldAccess");
    let class = graph.class(id);

    assert_eq!(class.kind, JavaClassKind::Class);
    assert_eq!(class.package_name, "com.example");
    assert_eq!(class.simple_name(), "OwnFieldAccess");
    assert!(class.modifiers.is_public());
    assert_eq!(class.superclass, graph.get("java.lang.Object"));

    assert_eq!(class.fields.len(), 1);
    let field = &class.fields[0];
    assert!(field.modifiers.is_private());
    assert_eq!(graph.class(field.raw_type).name, "java.lang.String");
    assert!(field.generic_type.is_none());

    let source = class.source.as_ref().unwrap();
    assert_eq!(source.uri, "test:0.class");
    assert_eq!(source.file_name.as_deref(), Some("OwnFieldAccess.java"));
    assert!(source.checksum.is_none());

    let setter = class.methods.iter().find(|m| m.name == "setStringValue").unwrap();
    assert_eq!(setter.parameters.len(), 1);
    assert_eq!(graph.class(setter.parameters[0].raw_type).name, "java.lang.String");
    assert_eq!(graph.class(setter.raw_return_type).name, "void");
    assert_eq!(setter.body.line, 12);
}

#[test]
fn checksums_are_recorded_only_when_configured() {
    let bytes = own_field_access_bytes();
    let sources = vec![ClassFileSource::new("test:own.class", bytes)];

    let plain = ClassFileImporter::default().import(&sources);
    let id = class_id(&plain, "com.example.OwnFieldAccess");
    assert!(plain.class(id).source.as_ref().unwrap().checksum.is_none());

    let config = ImportConfig { record_source_checksums: true, ..ImportConfig::default() };
    let fingerprinted = ClassFileImporter::new(config).import(&sources);
    let id = class_id(&fingerprinted, "com.example.OwnFieldAccess");
    let checksum = fingerprinted.class(id).source.as_ref().unwrap().checksum.unwrap();
    assert_eq!(checksum.to_hex().len(), 16);

    // Same bytes, same fingerprint.
    let again = ClassFileImporter::new(config).import(&sources);
    let id = class_id(&again, "com.example.OwnFieldAccess");
    assert_eq!(again.class(id).source.as_ref().unwrap().checksum.unwrap(), checksum);
}

#[test]
fn unreadable_files_are_skipped_without_aborting_the_batch() {
    let graph = import(vec![
        vec![0xDE, 0xAD, 0xBE, 0xEF],
        own_field_access_bytes(),
        vec![],
    ]);
    let id = class_id(&graph, "com.example.OwnFieldAccess");
    assert!(graph.class(id).is_fully_imported);
}

#[test]
fn static_initializer_accesses_are_attributed() {
    let bytes = ClassFileBuilder::new("com/example/WithInit")
        .field(FieldSpec::new("COUNT", "I").access(flags::ACC_PRIVATE | flags::ACC_STATIC))
        .method(
            MethodSpec::new("<clinit>", "()V").access(flags::ACC_STATIC).code(
                CodeSpec::new()
                    .ins(Ins::Line(3))
                    .ins(Ins::Iconst0)
                    .ins(Ins::PutStatic {
                        owner: "com/example/WithInit".into(),
                        name: "COUNT".into(),
                        descriptor: "I".into(),
                    })
                    .ins(Ins::Return),
            ),
        )
        .build();

    let graph = import(vec![bytes]);
    let id = class_id(&graph, "com.example.WithInit");
    let class = graph.class(id);
    let initializer = class.static_initializer.as_ref().unwrap();
    assert_eq!(initializer.body.accesses.len(), 1);
    assert_eq!(initializer.body.accesses[0].kind, AccessKind::FieldSet);
    assert_eq!(initializer.body.accesses[0].line, 3);
    // <clinit> is not part of the ordinary method list.
    assert!(class.methods.iter().all(|m| m.name != "<clinit>"));
}

#[test]
fn graph_exports_to_json() -> anyhow::Result<()> {
    let graph = import(vec![own_field_access_bytes()]);
    let json = GraphExport::from_graph(&graph).to_json()?;
    assert!(json.contains("com.example.OwnFieldAccess"));
    let parsed: serde_json::Value = serde_json::from_str(&json)?;
    assert!(parsed["classes"].as_array().unwrap().len() >= 2);
    Ok(())
}
