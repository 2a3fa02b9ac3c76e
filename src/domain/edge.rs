use crate::domain::advice::{AdviceDeclaration, AdviceKind};
use crate::domain::element::{Element, ResourcePath};
use serde::{Deserialize, Serialize};

/// A recorded match between an advice declaration and an element it affects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub kind: AdviceKind,
    /// Declaring member (or declaration site)
    pub source: Element,
    /// Advised member or introduced-into type
    pub target: Element,
    pub declaration: AdviceDeclaration,
    /// File context in which the match was found
    pub file: ResourcePath,
    /// Name of the bean the declaration was matched against
    pub bean: String,
    /// Bean definition site, for introductions matched via a bean
    pub target_bean: Option<Element>,
}

impl Edge {
    pub fn is_introduction(&self) -> bool {
        self.kind == AdviceKind::Introduction
    }
}
