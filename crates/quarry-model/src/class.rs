use std::fmt;

use crate::annotation::JavaAnnotation;
use crate::flags::Modifiers;
use crate::ids::{ClassId, TypeVarId};
use crate::member::{JavaConstructor, JavaField, JavaMethod, JavaStaticInitializer};
use crate::types::JavaType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JavaClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
    Primitive,
    Array,
}

/// A deterministic 64-bit fingerprint of a source's bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceChecksum(pub u64);

impl SourceChecksum {
    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Debug for SourceChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceChecksum({})", self.to_hex())
    }
}

/// Where a class definition came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Origin URI as supplied by the input enumeration.
    pub uri: String,
    /// Simple file name from the `SourceFile` attribute, when compiled in.
    pub file_name: Option<String>,
    pub checksum: Option<SourceChecksum>,
}

/// One class in the graph.
///
/// Created as an empty shell when its name is first mentioned, populated in
/// place during finalization, immutable afterwards. A class that was never
/// backed by an imported class file stays a stub: `is_fully_imported` is
/// false and every collection is empty.
#[derive(Debug, Clone)]
pub struct JavaClass {
    /// Fully-qualified dotted name, e.g. `com.example.Outer$Inner`.
    /// Array classes use the component name plus `[]` per dimension.
    pub name: String,
    pub package_name: String,
    pub kind: JavaClassKind,
    pub modifiers: Modifiers,
    pub is_fully_imported: bool,
    pub superclass: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    /// Parameterized supertype forms, present only with a generic signature.
    pub generic_superclass: Option<JavaType>,
    pub generic_interfaces: Vec<JavaType>,
    pub type_parameters: Vec<TypeVarId>,
    pub enclosing_class: Option<ClassId>,
    pub fields: Vec<JavaField>,
    pub methods: Vec<JavaMethod>,
    pub constructors: Vec<JavaConstructor>,
    pub static_initializer: Option<JavaStaticInitializer>,
    pub annotations: Vec<JavaAnnotation>,
    pub source: Option<Source>,
    /// Component class for array entries.
    pub component: Option<ClassId>,
}

impl JavaClass {
    /// An unpopulated shell; the registry registers this before resolving
    /// anything that might refer back to it.
    pub fn shell(name: impl Into<String>) -> Self {
        let name = name.into();
        let package_name = package_of(&name);
        Self {
            name,
            package_name,
            kind: JavaClassKind::Class,
            modifiers: Modifiers::default(),
            is_fully_imported: false,
            superclass: None,
            interfaces: Vec::new(),
            generic_superclass: None,
            generic_interfaces: Vec::new(),
            type_parameters: Vec::new(),
            enclosing_class: None,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            static_initializer: None,
            annotations: Vec::new(),
            source: None,
            component: None,
        }
    }

    /// Last segment of the dotted name, keeping any `$` nesting marker.
    pub fn simple_name(&self) -> &str {
        let after_package = match self.name.rfind('.') {
            Some(dot) => &self.name[dot + 1..],
            None => &self.name,
        };
        match after_package.rfind('$') {
            Some(dollar) => &after_package[dollar + 1..],
            None => after_package,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == JavaClassKind::Interface
    }

    pub fn is_array(&self) -> bool {
        self.kind == JavaClassKind::Array
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == JavaClassKind::Primitive
    }
}

pub(crate) fn package_of(name: &str) -> String {
    match name.rfind('.') {
        Some(dot) => name[..dot].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_name_strips_package_and_nesting() {
        assert_eq!(JavaClass::shell("com.example.Outer$Inner").simple_name(), "Inner");
        assert_eq!(JavaClass::shell("com.example.Foo").simple_name(), "Foo");
        assert_eq!(JavaClass::shell("int").simple_name(), "int");
    }

    #[test]
    fn package_is_prefix_up_to_last_dot() {
        assert_eq!(JavaClass::shell("com.example.Foo").package_name, "com.example");
        assert_eq!(JavaClass::shell("Foo").package_name, "");
    }
}
