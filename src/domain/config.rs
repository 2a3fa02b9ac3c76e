//! Plain data exchanged with the configuration model port.

use crate::domain::element::{Element, ProjectId, ResourcePath};
use serde::{Deserialize, Serialize};

/// Workspace-unique bean identity
pub type BeanId = String;

/// Workspace-unique component identity
pub type ComponentId = String;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeanDefinition {
    pub id: BeanId,
    pub name: String,
    /// Declared class; `None` when it cannot be determined statically
    pub class_name: Option<String>,
    /// Configuration file holding the definition
    pub resource: ResourcePath,
    pub line: u32,
    pub is_abstract: bool,
    pub is_factory: bool,
    pub is_infrastructure: bool,
}

impl BeanDefinition {
    pub fn element(&self) -> Element {
        Element::new(
            self.resource.clone(),
            self.id.clone(),
            self.name.clone(),
            self.line,
        )
    }
}

/// An explicit grouping of configurations matched together
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigSet {
    pub name: String,
    pub project: ProjectId,
    pub configs: Vec<ResourcePath>,
}
