use std::sync::Once;

use quarry_import::{ClassFileImporter, ClassFileSource};
use quarry_model::{ClassGraph, ClassId};

/// Route importer tracing through the test harness; `RUST_LOG` controls
/// verbosity when a test needs it.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn import(classes: Vec<Vec<u8>>) -> ClassGraph {
    init_tracing();
    let sources: Vec<ClassFileSource> = classes
        .into_iter()
        .enumerate()
        .map(|(index, bytes)| ClassFileSource::new(format!("test:{index}.class"), bytes))
        .collect();
    ClassFileImporter::default().import(&sources)
}

pub fn class_id(graph: &ClassGraph, name: &str) -> ClassId {
    graph.get(name).unwrap_or_else(|| panic!("class {name} not in graph"))
}
