//! Reference model: per-project mapping from resource to the edges recorded for it.

use crate::domain::edge::Edge;
use crate::domain::element::{ProjectId, ResourcePath};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Edges of one project, keyed by the resource they were recorded for.
///
/// After a pass touching resource `r`, `edges_for(r)` holds exactly the edges
/// recomputed in that pass: callers `clear` before they `add`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceModel {
    edges: BTreeMap<ResourcePath, Vec<Edge>>,
}

impl ReferenceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every edge attributed to `resource`; returns how many were dropped.
    pub fn clear(&mut self, resource: &str) -> usize {
        self.edges.remove(resource).map(|e| e.len()).unwrap_or(0)
    }

    pub fn add(&mut self, resource: &str, edges: impl IntoIterator<Item = Edge>) {
        let mut edges = edges.into_iter().peekable();
        if edges.peek().is_none() {
            return;
        }
        self.edges
            .entry(resource.to_string())
            .or_default()
            .extend(edges);
    }

    pub fn edges_for(&self, resource: &str) -> &[Edge] {
        self.edges.get(resource).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourcePath> {
        self.edges.keys()
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().flatten()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Live reference models of every project in the workspace.
///
/// Writers are serialized by the build scheduler; the lock only keeps readers
/// from observing a half-applied `clear` or `add`.
#[derive(Debug, Default)]
pub struct ReferenceModelStore {
    projects: RwLock<HashMap<ProjectId, ReferenceModel>>,
}

impl ReferenceModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self, project: &str, resource: &str) -> usize {
        let mut projects = self.projects.write();
        projects
            .get_mut(project)
            .map(|model| model.clear(resource))
            .unwrap_or(0)
    }

    pub fn add(&self, project: &str, resource: &str, edges: impl IntoIterator<Item = Edge>) {
        let mut projects = self.projects.write();
        projects
            .entry(project.to_string())
            .or_default()
            .add(resource, edges);
    }

    /// Point-in-time copy of one project's model
    pub fn snapshot(&self, project: &str) -> ReferenceModel {
        self.projects
            .read()
            .get(project)
            .cloned()
            .unwrap_or_default()
    }

    pub fn all_edges(&self, project: &str) -> Vec<Edge> {
        self.projects
            .read()
            .get(project)
            .map(|model| model.all_edges().cloned().collect())
            .unwrap_or_default()
    }

    pub fn projects(&self) -> Vec<ProjectId> {
        let mut ids: Vec<ProjectId> = self.projects.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn edge_count(&self) -> usize {
        self.projects.read().values().map(|m| m.edge_count()).sum()
    }
}
