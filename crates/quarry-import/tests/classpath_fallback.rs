mod common;

use std::cell::RefCell;
use std::collections::HashMap;

use common::{class_id, init_tracing};
use pretty_assertions::assert_eq;

use quarry_import::{ClassFileImporter, ClassFileSource, ClasspathResolver, ImportConfig};
use quarry_test_utils::{ClassFileBuilder, CodeSpec, FieldSpec, Ins, MethodSpec};

/// In-memory classpath for tests, counting lookups per name.
#[derive(Default)]
struct MapClasspath {
    classes: HashMap<String, Vec<u8>>,
    lookups: RefCell<HashMap<String, u32>>,
}

impl MapClasspath {
    fn with(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.classes.insert(name.to_string(), bytes);
        self
    }

    fn lookups_of(&self, name: &str) -> u32 {
        self.lookups.borrow().get(name).copied().unwrap_or(0)
    }
}

impl ClasspathResolver for MapClasspath {
    fn find_class(&self, name: &str) -> std::io::Result<Option<Vec<u8>>> {
        *self.lookups.borrow_mut().entry(name.to_string()).or_insert(0) += 1;
        Ok(self.classes.get(name).cloned())
    }
}

struct FailingClasspath;

impl ClasspathResolver for FailingClasspath {
    fn find_class(&self, _name: &str) -> std::io::Result<Option<Vec<u8>>> {
        Err(std::io::Error::other("classpath unavailable"))
    }
}

fn user_bytes() -> Vec<u8> {
    ClassFileBuilder::new("com/example/User")
        .field(FieldSpec::new("dep", "Lcom/example/Dep;"))
        .method(
            MethodSpec::new("use", "()V").code(
                CodeSpec::new()
                    .ins(Ins::Aload0)
                    .ins(Ins::get_field("com/example/User", "dep", "Lcom/example/Dep;"))
                    .ins(Ins::invoke_virtual("com/example/Dep", "work", "()V"))
                    .ins(Ins::Return),
            ),
        )
        .build()
}

fn dep_bytes() -> Vec<u8> {
    ClassFileBuilder::new("com/example/Dep")
        .method(MethodSpec::new("work", "()V").code(CodeSpec::new().ins(Ins::Return)))
        .build()
}

#[test]
fn disabled_fallback_leaves_stubs() {
    init_tracing();
    let classpath = MapClasspath::default().with("com.example.Dep", dep_bytes());
    let sources = vec![ClassFileSource::new("test:user.class", user_bytes())];

    let graph = ClassFileImporter::default().import_with_resolver(&sources, &classpath);
    let dep = class_id(&graph, "com.example.Dep");
    assert!(!graph.class(dep).is_fully_imported);
    assert!(graph.class(dep).methods.is_empty());
    // The resolver is not even consulted.
    assert_eq!(classpath.lookups_of("com.example.Dep"), 0);
}

#[test]
fn enabled_fallback_resolves_missing_classes() {
    let classpath = MapClasspath::default().with("com.example.Dep", dep_bytes());
    let sources = vec![ClassFileSource::new("test:user.class", user_bytes())];
    let config = ImportConfig { classpath_fallback: true, ..ImportConfig::default() };

    let graph = ClassFileImporter::new(config).import_with_resolver(&sources, &classpath);
    let dep = class_id(&graph, "com.example.Dep");
    let dep_class = graph.class(dep);
    assert!(dep_class.is_fully_imported);
    assert_eq!(dep_class.methods.len(), 1);
    assert_eq!(dep_class.source.as_ref().unwrap().uri, "classpath:com.example.Dep");

    // The call into the fallback-resolved class now has a concrete target.
    let user = class_id(&graph, "com.example.User");
    let call = graph
        .accesses_from_class(user)
        .into_iter()
        .find(|a| a.target.name == "work")
        .unwrap();
    assert!(matches!(
        call.target.resolved_member(),
        quarry_model::ResolvedTarget::Unique(_)
    ));
}

#[test]
fn fallback_lookups_are_cached_per_name() {
    let classpath = MapClasspath::default().with("com.example.Dep", dep_bytes());
    // Two classes both referencing the same missing dependency, plus one
    // reference to a class the classpath does not know either.
    let other = ClassFileBuilder::new("com/example/Other")
        .field(FieldSpec::new("dep", "Lcom/example/Dep;"))
        .field(FieldSpec::new("ghost", "Lcom/example/Ghost;"))
        .build();
    let sources = vec![
        ClassFileSource::new("test:user.class", user_bytes()),
        ClassFileSource::new("test:other.class", other),
    ];
    let config = ImportConfig { classpath_fallback: true, ..ImportConfig::default() };

    let graph = ClassFileImporter::new(config).import_with_resolver(&sources, &classpath);
    assert_eq!(classpath.lookups_of("com.example.Dep"), 1);
    assert_eq!(classpath.lookups_of("com.example.Ghost"), 1);
    let ghost = class_id(&graph, "com.example.Ghost");
    assert!(!graph.class(ghost).is_fully_imported);
}

#[test]
fn failing_classpath_degrades_to_stubs() {
    init_tracing();
    let sources = vec![ClassFileSource::new("test:user.class", user_bytes())];
    let config = ImportConfig { classpath_fallback: true, ..ImportConfig::default() };

    let graph = ClassFileImporter::new(config).import_with_resolver(&sources, &FailingClasspath);
    let user = class_id(&graph, "com.example.User");
    assert!(graph.class(user).is_fully_imported);
    let dep = class_id(&graph, "com.example.Dep");
    assert!(!graph.class(dep).is_fully_imported);
}
