//! Configuration graph walker: expands a changed file into the advice
//! declarations it can see and the beans each declaration must be matched
//! against.
//!
//! Imports, components and inner beans are traversed with explicit visited
//! sets, so cyclic configurations terminate.

use crate::domain::advice::AdviceDeclaration;
use crate::domain::config::{BeanDefinition, BeanId, ComponentId};
use crate::domain::definitions::AspectDefinitionCache;
use crate::domain::element::ResourcePath;
use crate::domain::failure::FailureRecord;
use crate::domain::ports::ConfigurationModel;
use std::collections::{BTreeSet, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One unit of matching work
#[derive(Debug, Clone)]
pub struct MatchTriple {
    pub bean: BeanDefinition,
    pub declaration: AdviceDeclaration,
    /// Declaring file of `declaration`; edges are recorded under it
    pub file: ResourcePath,
}

/// Declarations visible from a configuration through its import graph
#[derive(Debug, Default)]
pub struct DeclarationSet {
    pub declarations: Vec<AdviceDeclaration>,
    /// Every configuration reached, readable or not, plus every file owning
    /// a declaration. Edges recorded under these are stale once the set is
    /// rebuilt.
    pub visited: BTreeSet<ResourcePath>,
    pub failures: Vec<FailureRecord>,
}

pub struct ConfigGraphWalker<'a> {
    config_model: &'a dyn ConfigurationModel,
}

impl<'a> ConfigGraphWalker<'a> {
    pub fn new(config_model: &'a dyn ConfigurationModel) -> Self {
        Self { config_model }
    }

    pub fn owning_configuration(&self, file: &str) -> Option<ResourcePath> {
        self.config_model.configuration_for(file)
    }

    /// Declarations extracted from `config` and every configuration it
    /// transitively imports, in import (pre-)order.
    pub fn collect_declarations(
        &self,
        build_project: &str,
        config: &str,
        cache: &mut AspectDefinitionCache<'_>,
        token: &CancellationToken,
    ) -> DeclarationSet {
        let mut set = DeclarationSet::default();
        let mut visited: HashSet<ResourcePath> = HashSet::new();
        let mut stack: Vec<ResourcePath> = vec![config.to_string()];

        while let Some(current) = stack.pop() {
            if token.is_cancelled() {
                break;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            set.visited.insert(current.clone());

            let project = self
                .config_model
                .project_of(&current)
                .unwrap_or_else(|| build_project.to_string());
            match cache.definitions_for(&project, &current) {
                Ok(declarations) => {
                    for declaration in declarations.iter() {
                        set.visited.insert(declaration.resource.clone());
                        set.declarations.push(declaration.clone());
                    }
                }
                Err(failure) => {
                    debug!(config = %current, %failure, "advice extraction failed");
                    set.failures
                        .push(FailureRecord::new(failure, current.clone(), None, None));
                }
            }

            let imports = self.config_model.imports(&current);
            for import in imports.into_iter().rev() {
                if !visited.contains(&import) {
                    stack.push(import);
                }
            }
        }
        set
    }

    /// Candidate beans for a declaration: every bean of its owning
    /// configuration (inner beans and component beans included) plus the
    /// beans of every other configuration sharing a config-set with it.
    /// Infrastructure beans are never candidates; each bean appears once.
    pub fn candidate_beans(
        &self,
        declaration: &AdviceDeclaration,
        token: &CancellationToken,
    ) -> Vec<BeanDefinition> {
        let owner = self
            .config_model
            .configuration_for(&declaration.resource)
            .unwrap_or_else(|| declaration.resource.clone());

        let mut seen: HashSet<BeanId> = HashSet::new();
        let mut beans = Vec::new();
        self.collect_config_beans(&owner, &mut seen, &mut beans, token);

        let mut configs_done: HashSet<ResourcePath> = HashSet::from([owner.clone()]);
        for set in self.config_model.config_sets(&owner) {
            for sibling in set.configs {
                if token.is_cancelled() {
                    return beans;
                }
                if !configs_done.insert(sibling.clone()) {
                    continue;
                }
                debug!(config_set = %set.name, sibling = %sibling, "cross-configuration candidates");
                self.collect_config_beans(&sibling, &mut seen, &mut beans, token);
            }
        }
        beans
    }

    fn collect_config_beans(
        &self,
        config: &str,
        seen: &mut HashSet<BeanId>,
        out: &mut Vec<BeanDefinition>,
        token: &CancellationToken,
    ) {
        for bean in self.config_model.beans(config) {
            if token.is_cancelled() {
                return;
            }
            self.collect_bean_tree(bean, seen, out);
        }

        let mut visited: HashSet<ComponentId> = HashSet::new();
        let mut stack: Vec<ComponentId> = self.config_model.components(config);
        stack.reverse();
        while let Some(component) = stack.pop() {
            if token.is_cancelled() {
                return;
            }
            if !visited.insert(component.clone()) {
                continue;
            }
            for bean in self.config_model.component_beans(&component) {
                self.collect_bean_tree(bean, seen, out);
            }
            let nested = self.config_model.nested_components(&component);
            for child in nested.into_iter().rev() {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
        }
    }

    /// Push `root` and its inner beans, depth first. An infrastructure bean
    /// is dropped together with everything nested in it.
    fn collect_bean_tree(
        &self,
        root: BeanDefinition,
        seen: &mut HashSet<BeanId>,
        out: &mut Vec<BeanDefinition>,
    ) {
        let mut stack = vec![root];
        while let Some(bean) = stack.pop() {
            if bean.is_infrastructure || !seen.insert(bean.id.clone()) {
                continue;
            }
            let inner = self.config_model.inner_beans(&bean);
            out.push(bean);
            stack.extend(inner.into_iter().rev());
        }
    }
}
