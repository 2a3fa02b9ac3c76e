//! Advice declarations: what an aspect contributes and where it was declared.
//!
//! Declarations are produced by a [`DefinitionExtractor`](crate::domain::ports::DefinitionExtractor)
//! once per file per build pass and never mutated afterwards.

use crate::domain::element::{Element, ResourcePath, simple_name};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Advice kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceKind {
    Before,
    After,
    AfterReturning,
    AfterThrowing,
    Around,
    /// Adds a type (and optionally a default implementation) to matched targets
    Introduction,
}

impl AdviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdviceKind::Before => "before",
            AdviceKind::After => "after",
            AdviceKind::AfterReturning => "after-returning",
            AdviceKind::AfterThrowing => "after-throwing",
            AdviceKind::Around => "around",
            AdviceKind::Introduction => "introduction",
        }
    }
}

impl fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the declaration was written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationStyle {
    /// Declared as elements of the configuration file
    #[default]
    Xml,
    /// Declared as annotations on the aspect class
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdviceBody {
    Advice {
        method_name: String,
        parameter_types: Vec<String>,
        pointcut: String,
    },
    Introduction {
        type_pattern: String,
        introduced_interface: String,
        default_impl: Option<String>,
        /// Field carrying the introduction (annotation style only)
        defining_field: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdviceDeclaration {
    pub kind: AdviceKind,
    pub style: DeclarationStyle,
    /// Name of the bean backing the aspect
    pub aspect_name: String,
    /// Fully qualified aspect type name
    pub aspect_class: String,
    pub body: AdviceBody,
    /// Declaring file
    pub resource: ResourcePath,
    /// Declaration start line
    pub line: u32,
}

impl AdviceDeclaration {
    /// Build a non-introduction advice declaration.
    ///
    /// Passing [`AdviceKind::Introduction`] here is a programming error; it is
    /// normalised to [`AdviceKind::Before`] in release builds.
    #[allow(clippy::too_many_arguments)]
    pub fn advice(
        kind: AdviceKind,
        style: DeclarationStyle,
        aspect_name: impl Into<String>,
        aspect_class: impl Into<String>,
        method_name: impl Into<String>,
        parameter_types: Vec<String>,
        pointcut: impl Into<String>,
        resource: impl Into<ResourcePath>,
        line: u32,
    ) -> Self {
        debug_assert!(kind != AdviceKind::Introduction);
        let kind = if kind == AdviceKind::Introduction {
            AdviceKind::Before
        } else {
            kind
        };
        Self {
            kind,
            style,
            aspect_name: aspect_name.into(),
            aspect_class: aspect_class.into(),
            body: AdviceBody::Advice {
                method_name: method_name.into(),
                parameter_types,
                pointcut: pointcut.into(),
            },
            resource: resource.into(),
            line,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn introduction(
        style: DeclarationStyle,
        aspect_name: impl Into<String>,
        aspect_class: impl Into<String>,
        type_pattern: impl Into<String>,
        introduced_interface: impl Into<String>,
        default_impl: Option<String>,
        defining_field: Option<String>,
        resource: impl Into<ResourcePath>,
        line: u32,
    ) -> Self {
        Self {
            kind: AdviceKind::Introduction,
            style,
            aspect_name: aspect_name.into(),
            aspect_class: aspect_class.into(),
            body: AdviceBody::Introduction {
                type_pattern: type_pattern.into(),
                introduced_interface: introduced_interface.into(),
                default_impl,
                defining_field,
            },
            resource: resource.into(),
            line,
        }
    }

    pub fn is_introduction(&self) -> bool {
        matches!(self.body, AdviceBody::Introduction { .. })
    }

    /// The declaration site inside the declaring file.
    pub fn site(&self, label: impl Into<String>) -> Element {
        Element::new(
            self.resource.clone(),
            format!("{}@{}:{}", self.aspect_name, self.resource, self.line),
            label,
            self.line,
        )
    }

    /// Short description used in log lines: `before myAspect.log`
    pub fn describe(&self) -> String {
        match &self.body {
            AdviceBody::Advice { method_name, .. } => {
                format!("{} {}.{}", self.kind, self.aspect_name, method_name)
            }
            AdviceBody::Introduction {
                introduced_interface,
                ..
            } => format!(
                "{} {} <- {}",
                self.kind,
                self.aspect_name,
                simple_name(introduced_interface)
            ),
        }
    }
}
