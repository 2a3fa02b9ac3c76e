//! Failures raised by collaborators while extracting or matching, and their
//! classification into benign noise vs. user-facing problems.

use crate::domain::advice::AdviceDeclaration;
use crate::domain::config::BeanDefinition;
use crate::domain::element::ResourcePath;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchFailure {
    #[error("class not found: {name}")]
    ClassNotFound { name: String },

    #[error("malformed pointcut `{expression}`: {reason}")]
    IllegalPointcut { expression: String, reason: String },

    /// A collaborator call failed; `cause` holds the wrapped failure if any.
    #[error("invocation failed: {message}")]
    Invocation {
        message: String,
        cause: Option<Box<MatchFailure>>,
        /// Raised while reading an annotation type (ignorable)
        annotation_type: bool,
    },

    #[error("{message}")]
    Other { message: String },
}

impl MatchFailure {
    pub fn class_not_found(name: impl Into<String>) -> Self {
        MatchFailure::ClassNotFound { name: name.into() }
    }

    pub fn illegal_pointcut(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        MatchFailure::IllegalPointcut {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    pub fn wrapped(message: impl Into<String>, cause: MatchFailure) -> Self {
        MatchFailure::Invocation {
            message: message.into(),
            cause: Some(Box::new(cause)),
            annotation_type: false,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        MatchFailure::Other {
            message: message.into(),
        }
    }
}

/// A failure captured at the per-triple boundary, deferred until reconciliation.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub failure: MatchFailure,
    /// File context of the failing step
    pub resource: ResourcePath,
    pub bean: Option<BeanDefinition>,
    pub declaration: Option<AdviceDeclaration>,
}

impl FailureRecord {
    pub fn new(
        failure: MatchFailure,
        resource: impl Into<ResourcePath>,
        bean: Option<BeanDefinition>,
        declaration: Option<AdviceDeclaration>,
    ) -> Self {
        Self {
            failure,
            resource: resource.into(),
            bean,
            declaration,
        }
    }
}

/// What reconciliation does with a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureClass {
    /// Environmental (missing class, ignorable annotation-type read): log only
    Benign,
    /// Warning at the declaration line
    MalformedPointcut { reason: String },
    /// Warning at the context resource
    Invocation { message: String },
    /// Generic warning at the declaration line
    Unexpected { message: String },
}

/// Classify a failure, unwrapping wrapped invocation failures by their cause.
pub fn classify(failure: &MatchFailure) -> FailureClass {
    match failure {
        MatchFailure::ClassNotFound { .. } => FailureClass::Benign,
        MatchFailure::IllegalPointcut { reason, .. } => FailureClass::MalformedPointcut {
            reason: reason.clone(),
        },
        MatchFailure::Invocation {
            cause: Some(cause), ..
        } => classify(cause),
        MatchFailure::Invocation {
            annotation_type: true,
            ..
        } => FailureClass::Benign,
        MatchFailure::Invocation { message, .. } => FailureClass::Invocation {
            message: message.clone(),
        },
        MatchFailure::Other { message } => FailureClass::Unexpected {
            message: message.clone(),
        },
    }
}
