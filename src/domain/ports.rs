use crate::domain::advice::AdviceDeclaration;
use crate::domain::config::{BeanDefinition, ComponentId, ConfigSet};
use crate::domain::element::{ProjectId, ResolvedClass, ResolvedMember, ResourcePath};
use crate::domain::failure::MatchFailure;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Configuration model port (implemented by Infrastructure)
pub trait ConfigurationModel: Send + Sync {
    /// Configuration owning `resource`; `None` if the file is not a configuration
    fn configuration_for(&self, resource: &str) -> Option<ResourcePath>;

    fn project_of(&self, resource: &str) -> Option<ProjectId>;

    /// Beans declared directly in a configuration
    fn beans(&self, config: &str) -> Vec<BeanDefinition>;

    /// Beans nested directly inside `bean`
    fn inner_beans(&self, bean: &BeanDefinition) -> Vec<BeanDefinition>;

    /// Top-level components of a configuration
    fn components(&self, config: &str) -> Vec<ComponentId>;

    fn component_beans(&self, component: &str) -> Vec<BeanDefinition>;

    fn nested_components(&self, component: &str) -> Vec<ComponentId>;

    /// Configurations imported directly by `config`
    fn imports(&self, config: &str) -> Vec<ResourcePath>;

    /// Configuration sets that contain `config`
    fn config_sets(&self, config: &str) -> Vec<ConfigSet>;
}

/// Type resolver port: hands out project-scoped class-loading contexts.
pub trait TypeResolver: Send + Sync {
    /// Enter the class-loading context of `project`. The context is left when
    /// the returned value is dropped.
    fn enter(&self, project: &str) -> Result<Box<dyn ClassContext + '_>, MatchFailure>;
}

/// Project-scoped class-loading context
pub trait ClassContext {
    fn project(&self) -> &str;

    fn load_class(&self, name: &str) -> Result<ResolvedClass, MatchFailure>;

    fn find_method(
        &self,
        class: &ResolvedClass,
        name: &str,
        parameter_types: &[String],
    ) -> Result<Option<ResolvedMember>, MatchFailure>;

    fn find_field(
        &self,
        class: &ResolvedClass,
        name: &str,
    ) -> Result<Option<ResolvedMember>, MatchFailure>;
}

/// Extracts advice declarations from a file
pub trait DefinitionExtractor: Send + Sync {
    fn extract(
        &self,
        ctx: &dyn ClassContext,
        resource: &str,
    ) -> Result<Vec<AdviceDeclaration>, MatchFailure>;
}

/// Pointcut / type matching capability
pub trait JoinPointMatcher: Send + Sync {
    /// Does an introduction's type pattern select `class`?
    fn type_matches(
        &self,
        ctx: &dyn ClassContext,
        declaration: &AdviceDeclaration,
        class: &ResolvedClass,
    ) -> Result<bool, MatchFailure>;

    /// Methods of `class` selected by an advice declaration's pointcut
    fn match_join_points(
        &self,
        ctx: &dyn ClassContext,
        class: &ResolvedClass,
        bean: &BeanDefinition,
        declaration: &AdviceDeclaration,
        project: &str,
    ) -> Result<BTreeSet<ResolvedMember>, MatchFailure>;
}

/// Emitted after every reconciliation
#[derive(Debug, Clone, Serialize)]
pub struct ModelChangedEvent {
    pub project: ProjectId,
    pub resources: Vec<ResourcePath>,
    pub edge_count: usize,
    pub annotation_count: usize,
    /// The build that produced these results was cancelled part-way
    pub partial: bool,
}

pub trait ModelChangeListener: Send + Sync {
    fn model_changed(&self, event: &ModelChangedEvent) -> Result<()>;
}

/// The consumed collaborators of a build pass
#[derive(Clone)]
pub struct Collaborators {
    pub config_model: Arc<dyn ConfigurationModel>,
    pub resolver: Arc<dyn TypeResolver>,
    pub extractor: Arc<dyn DefinitionExtractor>,
    pub matcher: Arc<dyn JoinPointMatcher>,
}

impl Collaborators {
    /// All four ports served by the same implementation.
    pub fn uniform<T>(workspace: Arc<T>) -> Self
    where
        T: ConfigurationModel + TypeResolver + DefinitionExtractor + JoinPointMatcher + 'static,
    {
        Self {
            config_model: workspace.clone(),
            resolver: workspace.clone(),
            extractor: workspace.clone(),
            matcher: workspace,
        }
    }
}
