use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

use quarry_model::SourceChecksum;

/// Origin metadata for one input, as supplied by the external enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Where the bytes came from, e.g. `file:///build/classes/com/x/Foo.class`
    /// or `jar:file:///lib/dep.jar!/com/x/Foo.class`.
    pub uri: String,
    /// Checksum supplied by the enumeration, if it computed one.
    pub checksum: Option<SourceChecksum>,
}

/// One class file to import: already-enumerated, already include-filtered
/// bytes plus their origin. The core never walks directories or archives.
#[derive(Debug, Clone)]
pub struct ClassFileSource {
    pub descriptor: SourceDescriptor,
    pub bytes: Vec<u8>,
}

impl ClassFileSource {
    pub fn new(uri: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { descriptor: SourceDescriptor { uri: uri.into(), checksum: None }, bytes }
    }
}

/// Deterministic fingerprint of a source's bytes.
pub(crate) fn fingerprint(bytes: &[u8]) -> SourceChecksum {
    let mut hasher = DefaultHasher::new();
    hasher.write(bytes);
    SourceChecksum(hasher.finish())
}

/// Narrow interface to the host classpath, consulted only when
/// [`ImportConfig::classpath_fallback`](crate::ImportConfig) is enabled and a
/// referenced class was not in the input set. Implementations live outside
/// the core (JDK images, jar scanners, test fixtures).
pub trait ClasspathResolver {
    /// The raw class file bytes for a fully-qualified dotted name, or `None`
    /// when the classpath does not know the class either.
    fn find_class(&self, name: &str) -> std::io::Result<Option<Vec<u8>>>;
}

/// The default resolver: knows nothing, every miss stays a stub.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClasspath;

impl ClasspathResolver for NoClasspath {
    fn find_class(&self, _name: &str) -> std::io::Result<Option<Vec<u8>>> {
        Ok(None)
    }
}
