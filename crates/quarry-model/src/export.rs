//! Compact, serializable summary of a finished graph.

use serde::Serialize;

use crate::class::JavaClassKind;
use crate::graph::ClassGraph;

#[derive(Debug, Serialize)]
pub struct GraphExport {
    pub classes: Vec<ClassExport>,
    pub dependencies: Vec<DependencyExport>,
}

#[derive(Debug, Serialize)]
pub struct ClassExport {
    pub name: String,
    pub package: String,
    pub kind: &'static str,
    pub modifiers: Vec<&'static str>,
    pub fully_imported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    pub fields: usize,
    pub methods: usize,
    pub constructors: usize,
}

#[derive(Debug, Serialize)]
pub struct DependencyExport {
    pub origin: String,
    pub target: String,
    pub description: String,
}

fn kind_label(kind: JavaClassKind) -> &'static str {
    match kind {
        JavaClassKind::Class => "class",
        JavaClassKind::Interface => "interface",
        JavaClassKind::Enum => "enum",
        JavaClassKind::Annotation => "annotation",
        JavaClassKind::Record => "record",
        JavaClassKind::Primitive => "primitive",
        JavaClassKind::Array => "array",
    }
}

impl GraphExport {
    pub fn from_graph(graph: &ClassGraph) -> Self {
        let classes = graph
            .classes()
            .map(|(_, class)| ClassExport {
                name: class.name.clone(),
                package: class.package_name.clone(),
                kind: kind_label(class.kind),
                modifiers: class.modifiers.class_keywords(),
                fully_imported: class.is_fully_imported,
                superclass: class.superclass.map(|id| graph.class(id).name.clone()),
                interfaces: class
                    .interfaces
                    .iter()
                    .map(|id| graph.class(*id).name.clone())
                    .collect(),
                fields: class.fields.len(),
                methods: class.methods.len(),
                constructors: class.constructors.len(),
            })
            .collect();
        let dependencies = graph
            .dependencies()
            .iter()
            .map(|dep| DependencyExport {
                origin: graph.class(dep.origin).name.clone(),
                target: graph.class(dep.target).name.clone(),
                description: dep.description.clone(),
            })
            .collect();
        Self { classes, dependencies }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
