use crate::ids::ClassId;
use crate::member::{CodeUnitId, FieldId, MemberId};

/// What an access does, not where it points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    FieldGet,
    FieldSet,
    MethodCall,
    ConstructorCall,
    MethodReference,
    ConstructorReference,
}

impl AccessKind {
    pub fn description(self) -> &'static str {
        match self {
            AccessKind::FieldGet => "gets field",
            AccessKind::FieldSet => "sets field",
            AccessKind::MethodCall => "calls method",
            AccessKind::ConstructorCall => "calls constructor",
            AccessKind::MethodReference => "references method",
            AccessKind::ConstructorReference => "references constructor",
        }
    }
}

/// A possibly-unresolved reference to a member: the syntactic owner, name
/// and descriptor from the instruction, plus the deferred resolution against
/// the imported hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTarget {
    /// The receiver class as compiled, before any hierarchy search.
    pub owner: ClassId,
    pub name: String,
    pub descriptor: String,
    pub resolution: TargetResolution,
}

/// Outcome of matching a target against the imported member set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetResolution {
    Field(Option<FieldId>),
    /// All equally-specific matching code units. More than one entry means
    /// a diamond scenario with no single most-specific override in the
    /// imported set.
    CodeUnits(Vec<CodeUnitId>),
}

/// Three-way answer for callers asking for "the" member behind a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTarget<'a> {
    /// Nothing in the imported set matches (e.g. the owner is a stub).
    None,
    Unique(MemberId),
    /// A diamond: several equally-specific candidates, none preferred.
    Ambiguous(&'a [CodeUnitId]),
}

impl AccessTarget {
    pub fn resolved_member(&self) -> ResolvedTarget<'_> {
        match &self.resolution {
            TargetResolution::Field(None) => ResolvedTarget::None,
            TargetResolution::Field(Some(field)) => ResolvedTarget::Unique(MemberId::Field(*field)),
            TargetResolution::CodeUnits(units) => match units.as_slice() {
                [] => ResolvedTarget::None,
                [unit] => ResolvedTarget::Unique(MemberId::CodeUnit(*unit)),
                many => ResolvedTarget::Ambiguous(many),
            },
        }
    }
}

/// One resolved access from a code unit to a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaAccess {
    pub origin: CodeUnitId,
    pub kind: AccessKind,
    pub target: AccessTarget,
    pub line: u32,
    /// The access was written inside a lambda body; its origin is the code
    /// unit the lambda appears in, not the compiler's synthetic method.
    pub declared_in_lambda: bool,
}

/// A class-level dependency derived from accesses. Several accesses with the
/// same description collapse into one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub origin: ClassId,
    pub target: ClassId,
    pub description: String,
}
