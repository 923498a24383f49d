use rayon::prelude::*;
use tracing::{debug, warn};

use quarry_classfile::ClassFile;
use quarry_model::ClassGraph;

use crate::config::ImportConfig;
use crate::linker::link_accesses;
use crate::raw::RawClass;
use crate::registry::ClassRegistry;
use crate::sources::{fingerprint, ClassFileSource, ClasspathResolver, NoClasspath};

/// The two-phase batch importer.
///
/// Phase 1 parses every source into its unresolved form, in parallel; no
/// shared state is touched per file. Phase 2 runs single-threaded over one
/// registry: finalize every class (recursively, on demand), link all access
/// records once every member exists, then build the derived indexes.
#[derive(Debug, Clone, Default)]
pub struct ClassFileImporter {
    config: ImportConfig,
}

impl ClassFileImporter {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Import with stubs for everything outside the input set.
    pub fn import(&self, sources: &[ClassFileSource]) -> ClassGraph {
        self.import_with_resolver(sources, &NoClasspath)
    }

    /// Import, consulting `resolver` for classes missing from the input set
    /// when [`ImportConfig::classpath_fallback`] is enabled.
    pub fn import_with_resolver(
        &self,
        sources: &[ClassFileSource],
        resolver: &dyn ClasspathResolver,
    ) -> ClassGraph {
        let record_checksums = self.config.record_source_checksums;
        let raw_classes: Vec<RawClass> = sources
            .par_iter()
            .filter_map(|source| {
                let checksum = source
                    .descriptor
                    .checksum
                    .or_else(|| record_checksums.then(|| fingerprint(&source.bytes)));
                match parse_source(source, checksum) {
                    Ok(raw) => Some(raw),
                    Err(err) => {
                        warn!(uri = %source.descriptor.uri, error = %err, "skipping unreadable class file");
                        None
                    }
                }
            })
            .collect();
        debug!(classes = raw_classes.len(), sources = sources.len(), "parsed input set");

        let mut registry = ClassRegistry::new(self.config, resolver);
        for raw in raw_classes {
            registry.register(raw);
        }
        registry.resolve_all();
        link_accesses(&mut registry);

        let mut graph = registry.into_graph();
        graph.rebuild_indexes();
        graph
    }
}

fn parse_source(
    source: &ClassFileSource,
    checksum: Option<quarry_model::SourceChecksum>,
) -> crate::Result<RawClass> {
    let class_file = ClassFile::parse(&source.bytes)?;
    Ok(RawClass::from_classfile(&class_file, &source.descriptor.uri, checksum)?)
}
