use serde::{Deserialize, Serialize};
use std::fmt;

/// Project identifier (workspace-unique project name)
pub type ProjectId = String;

/// Workspace-relative path of a file
pub type ResourcePath = String;

/// A line-anchored program element: a type, a member, a bean definition or a
/// declaration site inside a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Element {
    /// File holding the element
    pub resource: ResourcePath,
    /// Stable identity, unique across the workspace
    pub handle: String,
    /// Short human-readable name used in messages
    pub label: String,
    /// 1-based line; 0 means "the whole file"
    pub line: u32,
}

impl Element {
    pub fn new(
        resource: impl Into<ResourcePath>,
        handle: impl Into<String>,
        label: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            resource: resource.into(),
            handle: handle.into(),
            label: label.into(),
            line,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.label, self.resource, self.line)
    }
}

/// A class loaded through a project-scoped class context
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolvedClass {
    /// Fully qualified name
    pub name: String,
    pub project: ProjectId,
    pub resource: ResourcePath,
    pub line: u32,
}

impl ResolvedClass {
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn element(&self) -> Element {
        Element::new(
            self.resource.clone(),
            self.name.clone(),
            self.simple_name(),
            self.line,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Field,
}

/// A method or field of a resolved class
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolvedMember {
    pub kind: MemberKind,
    /// Fully qualified name of the declaring class
    pub declaring_class: String,
    pub name: String,
    /// Parameter type names; always empty for fields
    pub parameter_types: Vec<String>,
    pub resource: ResourcePath,
    pub line: u32,
}

impl ResolvedMember {
    pub fn handle(&self) -> String {
        match self.kind {
            MemberKind::Method => format!(
                "{}.{}({})",
                self.declaring_class,
                self.name,
                self.parameter_types.join(",")
            ),
            MemberKind::Field => format!("{}.{}", self.declaring_class, self.name),
        }
    }

    pub fn label(&self) -> String {
        let owner = simple_name(&self.declaring_class);
        match self.kind {
            MemberKind::Method => {
                let params: Vec<&str> = self.parameter_types.iter().map(|p| simple_name(p)).collect();
                format!("{}.{}({})", owner, self.name, params.join(", "))
            }
            MemberKind::Field => format!("{}.{}", owner, self.name),
        }
    }

    pub fn element(&self) -> Element {
        Element::new(self.resource.clone(), self.handle(), self.label(), self.line)
    }
}

/// `com.example.Foo` -> `Foo`
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
