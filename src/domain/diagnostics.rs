//! Diagnostic annotation store and the per-line deduplication rules.
//!
//! The store is a plain structured map manipulated through create / find /
//! update / delete; [`insert_deduplicated`] layers the aggregation rules on
//! top of it.

use crate::domain::advice::AdviceKind;
use crate::domain::element::ResourcePath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type AnnotationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "side", content = "kind", rename_all = "snake_case")]
pub enum MarkerCategory {
    /// On the advising element
    Source(AdviceKind),
    /// On the advised element
    Target(AdviceKind),
    /// Counter standing in for several markers on one line
    Multiple,
    Problem,
}

impl fmt::Display for MarkerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerCategory::Source(kind) => write!(f, "source:{kind}"),
            MarkerCategory::Target(kind) => write!(f, "target:{kind}"),
            MarkerCategory::Multiple => f.write_str("multiple"),
            MarkerCategory::Problem => f.write_str("problem"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A marker folded into a counter annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedMarker {
    pub category: MarkerCategory,
    pub message: String,
    pub severity: Severity,
    pub attribution: Option<ResourcePath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticAnnotation {
    pub id: AnnotationId,
    pub resource: ResourcePath,
    pub category: MarkerCategory,
    pub line: u32,
    pub message: String,
    pub severity: Severity,
    /// Resource whose rebuild invalidates this annotation
    pub attribution: Option<ResourcePath>,
    /// Number of distinct markers represented; 1 unless `category` is `Multiple`
    pub aggregate_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merged: Vec<MergedMarker>,
}

impl DiagnosticAnnotation {
    fn absorbs(&self, category: MarkerCategory, message: &str) -> bool {
        (self.category == category && self.message == message)
            || self
                .merged
                .iter()
                .any(|m| m.category == category && m.message == message)
    }

    fn as_merged(&self) -> MergedMarker {
        MergedMarker {
            category: self.category,
            message: self.message.clone(),
            severity: self.severity,
            attribution: self.attribution.clone(),
        }
    }
}

/// An annotation before it is given an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationDraft {
    pub resource: ResourcePath,
    pub category: MarkerCategory,
    pub line: u32,
    pub message: String,
    pub severity: Severity,
    pub attribution: Option<ResourcePath>,
}

impl AnnotationDraft {
    pub fn new(
        resource: impl Into<ResourcePath>,
        category: MarkerCategory,
        line: u32,
        message: impl Into<String>,
        severity: Severity,
        attribution: Option<ResourcePath>,
    ) -> Self {
        Self {
            resource: resource.into(),
            category,
            line,
            message: message.into(),
            severity,
            attribution,
        }
    }

    fn as_merged(&self) -> MergedMarker {
        MergedMarker {
            category: self.category,
            message: self.message.clone(),
            severity: self.severity,
            attribution: self.attribution.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DiagnosticStore {
    next_id: AnnotationId,
    annotations: BTreeMap<AnnotationId, DiagnosticAnnotation>,
}

impl DiagnosticStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, draft: AnnotationDraft) -> AnnotationId {
        self.next_id += 1;
        let id = self.next_id;
        self.annotations.insert(
            id,
            DiagnosticAnnotation {
                id,
                resource: draft.resource,
                category: draft.category,
                line: draft.line,
                message: draft.message,
                severity: draft.severity,
                attribution: draft.attribution,
                aggregate_count: 1,
                merged: Vec::new(),
            },
        );
        id
    }

    pub fn get(&self, id: AnnotationId) -> Option<&DiagnosticAnnotation> {
        self.annotations.get(&id)
    }

    /// Annotations anchored at one line of a resource
    pub fn find_at(&self, resource: &str, line: u32) -> Vec<&DiagnosticAnnotation> {
        self.annotations
            .values()
            .filter(|a| a.resource == resource && a.line == line)
            .collect()
    }

    pub fn find_on(&self, resource: &str) -> Vec<&DiagnosticAnnotation> {
        self.annotations
            .values()
            .filter(|a| a.resource == resource)
            .collect()
    }

    pub fn update(&mut self, id: AnnotationId, f: impl FnOnce(&mut DiagnosticAnnotation)) -> bool {
        match self.annotations.get_mut(&id) {
            Some(annotation) => {
                f(annotation);
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: AnnotationId) -> Option<DiagnosticAnnotation> {
        self.annotations.remove(&id)
    }

    /// Delete every annotation matching `pred`; returns how many went.
    pub fn delete_where(&mut self, mut pred: impl FnMut(&DiagnosticAnnotation) -> bool) -> usize {
        let before = self.annotations.len();
        self.annotations.retain(|_, a| !pred(a));
        before - self.annotations.len()
    }

    pub fn all(&self) -> impl Iterator<Item = &DiagnosticAnnotation> {
        self.annotations.values()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

pub fn counter_message(count: usize) -> String {
    format!("{count} markers at this line")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Created(AnnotationId),
    /// Folded into (or became) a counter annotation
    Aggregated(AnnotationId),
    Skipped,
}

/// Insert `draft` applying the per-line rules: identical markers collapse,
/// markers of different categories collapse into one counter annotation.
pub fn insert_deduplicated(store: &mut DiagnosticStore, draft: AnnotationDraft) -> Insertion {
    if draft.category == MarkerCategory::Problem {
        return insert_problem(store, draft);
    }

    let at_line: Vec<DiagnosticAnnotation> = store
        .find_at(&draft.resource, draft.line)
        .into_iter()
        .cloned()
        .collect();

    if draft.severity == Severity::Error
        && at_line
            .iter()
            .any(|a| a.category == MarkerCategory::Problem && a.message == draft.message)
    {
        return Insertion::Skipped;
    }

    let markers: Vec<&DiagnosticAnnotation> = at_line
        .iter()
        .filter(|a| a.category != MarkerCategory::Problem)
        .collect();

    if markers.iter().any(|a| a.absorbs(draft.category, &draft.message)) {
        return Insertion::Skipped;
    }

    if let Some(counter) = markers.iter().find(|a| a.category == MarkerCategory::Multiple) {
        let merged = draft.as_merged();
        store.update(counter.id, |c| {
            c.severity = c.severity.max(merged.severity);
            c.merged.push(merged);
            c.aggregate_count = c.merged.len();
            c.message = counter_message(c.aggregate_count);
        });
        return Insertion::Aggregated(counter.id);
    }

    if markers.iter().any(|a| a.category != draft.category) {
        let mut merged: Vec<MergedMarker> = markers.iter().map(|a| a.as_merged()).collect();
        for marker in &markers {
            store.delete(marker.id);
        }
        merged.push(draft.as_merged());
        let id = store.create(AnnotationDraft::new(
            draft.resource,
            MarkerCategory::Multiple,
            draft.line,
            counter_message(merged.len()),
            merged.iter().map(|m| m.severity).max().unwrap_or(Severity::Info),
            draft.attribution,
        ));
        store.update(id, |c| {
            c.aggregate_count = merged.len();
            c.merged = merged;
        });
        return Insertion::Aggregated(id);
    }

    Insertion::Created(store.create(draft))
}

/// Problems only collapse with an identical problem at the same line.
pub fn insert_problem(store: &mut DiagnosticStore, draft: AnnotationDraft) -> Insertion {
    let duplicate = store
        .find_at(&draft.resource, draft.line)
        .iter()
        .any(|a| a.category == MarkerCategory::Problem && a.message == draft.message);
    if duplicate {
        return Insertion::Skipped;
    }
    Insertion::Created(store.create(draft))
}

/// Remove every marker attributed to one of `resources`.
///
/// Counter annotations drop only the attributed members; a counter left with
/// a single member turns back into a plain annotation, one left with none is
/// deleted.
pub fn retract_attributed(
    store: &mut DiagnosticStore,
    resources: &std::collections::BTreeSet<ResourcePath>,
) -> usize {
    let attributed = |attribution: &Option<ResourcePath>| {
        attribution
            .as_ref()
            .is_some_and(|resource| resources.contains(resource))
    };

    let mut removed = store.delete_where(|a| a.category != MarkerCategory::Multiple && attributed(&a.attribution));

    let counters: Vec<AnnotationId> = store
        .all()
        .filter(|a| a.category == MarkerCategory::Multiple)
        .filter(|a| a.merged.iter().any(|m| attributed(&m.attribution)))
        .map(|a| a.id)
        .collect();

    for id in counters {
        let Some(counter) = store.get(id) else {
            continue;
        };
        let (gone, kept): (Vec<MergedMarker>, Vec<MergedMarker>) = counter
            .merged
            .iter()
            .cloned()
            .partition(|m| attributed(&m.attribution));
        removed += gone.len();

        match kept.len() {
            0 => {
                store.delete(id);
            }
            1 => {
                let last = &kept[0];
                store.update(id, |c| {
                    c.category = last.category;
                    c.message = last.message.clone();
                    c.severity = last.severity;
                    c.attribution = last.attribution.clone();
                    c.aggregate_count = 1;
                    c.merged.clear();
                });
            }
            n => {
                store.update(id, |c| {
                    c.severity = kept.iter().map(|m| m.severity).max().unwrap_or(Severity::Info);
                    c.attribution = kept.last().and_then(|m| m.attribution.clone());
                    c.merged = kept;
                    c.aggregate_count = n;
                    c.message = counter_message(n);
                });
            }
        }
    }
    removed
}
