/// Per-import configuration, threaded into the importer explicitly so runs
/// stay reproducible and independently testable.
#[derive(Debug, Clone, Copy)]
pub struct ImportConfig {
    /// When a referenced class was not part of the input set, ask the
    /// [`ClasspathResolver`](crate::ClasspathResolver) for its definition
    /// instead of leaving a stub.
    pub classpath_fallback: bool,
    /// Record a fingerprint of each input's bytes in the class's source.
    pub record_source_checksums: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { classpath_fallback: false, record_source_checksums: false }
    }
}
