//! One build pass: walk, match and record edges for a set of changed files.

use crate::domain::definitions::AspectDefinitionCache;
use crate::domain::edge::Edge;
use crate::domain::element::{ProjectId, ResourcePath};
use crate::domain::failure::FailureRecord;
use crate::domain::matcher::{MatchOrchestrator, MatchOutcome};
use crate::domain::model::ReferenceModelStore;
use crate::domain::ports::Collaborators;
use crate::domain::walker::{ConfigGraphWalker, MatchTriple};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Counters collected during a pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub files: usize,
    pub declarations: usize,
    pub triples: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Everything a pass hands to reconciliation
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub project: ProjectId,
    /// Resources whose model entries were cleared and recomputed
    pub rebuilt: BTreeSet<ResourcePath>,
    pub edges: Vec<Edge>,
    pub failures: Vec<FailureRecord>,
    pub stats: PassStats,
    /// Stopped at a cancellation checkpoint; results are partial
    pub cancelled: bool,
}

pub struct BuildPass<'a> {
    collaborators: &'a Collaborators,
    models: &'a ReferenceModelStore,
    trace_matching: bool,
}

impl<'a> BuildPass<'a> {
    pub fn new(
        collaborators: &'a Collaborators,
        models: &'a ReferenceModelStore,
        trace_matching: bool,
    ) -> Self {
        Self {
            collaborators,
            models,
            trace_matching,
        }
    }

    pub fn run(
        &self,
        project: &str,
        files: &BTreeSet<ResourcePath>,
        token: &CancellationToken,
    ) -> BuildOutcome {
        let walker = ConfigGraphWalker::new(self.collaborators.config_model.as_ref());
        let orchestrator = MatchOrchestrator::new(self.collaborators, self.trace_matching);
        let mut cache = AspectDefinitionCache::new(
            self.collaborators.extractor.as_ref(),
            self.collaborators.resolver.as_ref(),
        );
        let mut outcome = BuildOutcome {
            project: project.to_string(),
            ..BuildOutcome::default()
        };
        // Configurations already recomputed in this pass; a file imported
        // by several changed configurations is cleared and matched once.
        let mut recomputed: HashSet<ResourcePath> = HashSet::new();

        'files: for file in files {
            if token.is_cancelled() {
                break;
            }
            let Some(config) = walker.owning_configuration(file) else {
                debug!(file = %file, "not a configuration; skipping");
                continue;
            };
            outcome.stats.files += 1;

            let set = walker.collect_declarations(project, &config, &mut cache, token);
            outcome.failures.extend(set.failures);

            let mut to_clear: BTreeSet<&ResourcePath> = set.visited.iter().collect();
            to_clear.insert(file);
            for resource in to_clear {
                if recomputed.contains(resource) {
                    continue;
                }
                let dropped = self.models.clear(project, resource);
                if dropped > 0 {
                    debug!(resource = %resource, dropped, "cleared stale edges");
                }
                outcome.rebuilt.insert(resource.clone());
            }

            let declarations: Vec<_> = set
                .declarations
                .into_iter()
                .filter(|d| !recomputed.contains(&d.resource))
                .collect();
            recomputed.extend(set.visited);
            recomputed.insert(file.clone());

            for declaration in declarations {
                outcome.stats.declarations += 1;
                for bean in walker.candidate_beans(&declaration, token) {
                    if token.is_cancelled() {
                        break 'files;
                    }
                    let triple = MatchTriple {
                        bean,
                        declaration: declaration.clone(),
                        file: declaration.resource.clone(),
                    };
                    outcome.stats.triples += 1;
                    match orchestrator.match_bean(&triple, project, token) {
                        MatchOutcome::Matched(edges) => {
                            if edges.is_empty() {
                                continue;
                            }
                            if self.trace_matching {
                                debug!(
                                    bean = %triple.bean.name,
                                    declaration = %declaration.describe(),
                                    count = edges.len(),
                                    "matched"
                                );
                            }
                            self.models.add(project, &triple.file, edges.iter().cloned());
                            outcome.edges.extend(edges);
                        }
                        MatchOutcome::Skipped(reason) => {
                            outcome.stats.skipped += 1;
                            if self.trace_matching {
                                debug!(bean = %triple.bean.name, ?reason, "skipped");
                            }
                        }
                        MatchOutcome::Failed(failure) => {
                            outcome.stats.failed += 1;
                            debug!(bean = %triple.bean.name, %failure, "match failed");
                            outcome.failures.push(FailureRecord::new(
                                failure,
                                triple.file,
                                Some(triple.bean),
                                Some(triple.declaration),
                            ));
                        }
                        MatchOutcome::Cancelled => break 'files,
                    }
                }
            }
        }

        outcome.cancelled = token.is_cancelled();
        info!(
            project = %project,
            files = outcome.stats.files,
            edges = outcome.edges.len(),
            failures = outcome.failures.len(),
            cancelled = outcome.cancelled,
            "build pass finished"
        );
        outcome
    }
}
