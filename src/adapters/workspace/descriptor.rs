//! JSON description of a workspace: projects, configuration files, the beans
//! and aspects they declare, and the classes those beans refer to.

use crate::domain::advice::{AdviceKind, DeclarationStyle};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceDescriptor {
    #[serde(default)]
    pub projects: Vec<ProjectDescriptor>,
    #[serde(default)]
    pub configs: Vec<ConfigDescriptor>,
    /// Components referenced by configurations and by other components
    #[serde(default)]
    pub components: Vec<ComponentDescriptor>,
    #[serde(default)]
    pub config_sets: Vec<ConfigSetDescriptor>,
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub name: String,
    /// Projects whose classes are visible from this one
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDescriptor {
    pub resource: String,
    pub project: String,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub beans: Vec<BeanDescriptor>,
    /// Ids of top-level components
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub aspects: Vec<AspectDescriptor>,
    /// Set when the file cannot be read; extraction fails with this message
    #[serde(default)]
    pub parse_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeanDescriptor {
    /// Defaults to `<resource>#<name>` (`<parent id>/<name>` for inner beans)
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub line: u32,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default, rename = "factory")]
    pub is_factory: bool,
    #[serde(default, rename = "infrastructure")]
    pub is_infrastructure: bool,
    #[serde(default)]
    pub inner: Vec<BeanDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub id: String,
    /// Configuration declaring the component
    pub resource: String,
    #[serde(default)]
    pub beans: Vec<BeanDescriptor>,
    /// Ids of nested components
    #[serde(default)]
    pub nested: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectDescriptor {
    /// Name of the bean backing the aspect
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub style: DeclarationStyle,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub advice: Vec<AdviceDescriptor>,
    #[serde(default)]
    pub introductions: Vec<IntroductionDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceDescriptor {
    pub kind: AdviceKind,
    pub method: String,
    #[serde(default)]
    pub parameter_types: Vec<String>,
    pub pointcut: String,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroductionDescriptor {
    /// Type pattern selecting the targets
    pub types: String,
    pub interface: String,
    #[serde(default)]
    pub default_impl: Option<String>,
    /// Annotation style: aspect field carrying the introduction
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSetDescriptor {
    pub name: String,
    pub project: String,
    pub configs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    pub project: String,
    pub resource: String,
    #[serde(default)]
    pub line: u32,
    /// Direct supertypes (classes and interfaces), fully qualified
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub parameter_types: Vec<String>,
    #[serde(default)]
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub line: u32,
}
