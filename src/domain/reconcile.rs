use crate::domain::diagnostics::{
    AnnotationDraft, DiagnosticStore, Insertion, MarkerCategory, Severity, insert_deduplicated,
    insert_problem, retract_attributed,
};
use crate::domain::edge::Edge;
use crate::domain::element::{Element, ProjectId, ResourcePath};
use crate::domain::failure::{FailureClass, FailureRecord, classify};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Input of one reconciliation, detached from the build that produced it
#[derive(Debug, Clone, Default)]
pub struct ReconcileJob {
    pub project: ProjectId,
    pub rebuilt: BTreeSet<ResourcePath>,
    pub edges: Vec<Edge>,
    pub failures: Vec<FailureRecord>,
    pub partial: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub deleted: usize,
    pub created: usize,
    pub aggregated: usize,
    pub skipped: usize,
    pub problems: usize,
    /// Failures that were logged only
    pub benign: usize,
}

impl ReconcileReport {
    fn record(&mut self, insertion: Insertion) {
        match insertion {
            Insertion::Created(_) => self.created += 1,
            Insertion::Aggregated(_) => self.aggregated += 1,
            Insertion::Skipped => self.skipped += 1,
        }
    }
}

/// Turns a build's edges and failures into diagnostic annotations
pub struct Reconciler {
    problem_severity: Severity,
}

impl Reconciler {
    pub fn new(problem_severity: Severity) -> Self {
        Self { problem_severity }
    }

    pub fn reconcile(&self, store: &mut DiagnosticStore, job: &ReconcileJob) -> ReconcileReport {
        let mut report = ReconcileReport {
            deleted: self.delete_stale(store, &job.rebuilt),
            ..ReconcileReport::default()
        };

        for edge in &job.edges {
            for draft in edge_annotations(edge) {
                report.record(insert_deduplicated(store, draft));
            }
        }

        for record in &job.failures {
            match self.failure_annotation(record) {
                Some(draft) => {
                    let insertion = insert_problem(store, draft);
                    if matches!(insertion, Insertion::Created(_)) {
                        report.problems += 1;
                    }
                    report.record(insertion);
                }
                None => report.benign += 1,
            }
        }

        info!(
            project = %job.project,
            rebuilt = job.rebuilt.len(),
            deleted = report.deleted,
            created = report.created,
            aggregated = report.aggregated,
            problems = report.problems,
            partial = job.partial,
            "diagnostics reconciled"
        );
        report
    }

    /// Problems on rebuilt resources, plus every marker anywhere that is
    /// attributed to a rebuilt resource.
    fn delete_stale(&self, store: &mut DiagnosticStore, rebuilt: &BTreeSet<ResourcePath>) -> usize {
        let problems = store.delete_where(|a| {
            a.category == MarkerCategory::Problem && rebuilt.contains(&a.resource)
        });
        problems + retract_attributed(store, rebuilt)
    }

    fn failure_annotation(&self, record: &FailureRecord) -> Option<AnnotationDraft> {
        let declaration = record.declaration.as_ref();
        let (resource, line, message) = match classify(&record.failure) {
            FailureClass::Benign => {
                debug!(resource = %record.resource, failure = %record.failure, "ignoring environmental failure");
                return None;
            }
            FailureClass::MalformedPointcut { reason } => {
                let (resource, line) = declaration
                    .map(|d| (d.resource.clone(), d.line))
                    .unwrap_or_else(|| (record.resource.clone(), 0));
                (resource, line, format!("Pointcut is malformed: {reason}"))
            }
            FailureClass::Invocation { message } => {
                warn!(resource = %record.resource, %message, "invocation failed while matching");
                let line = declaration
                    .filter(|d| d.resource == record.resource)
                    .map(|d| d.line)
                    .unwrap_or(0);
                let message = match &record.bean {
                    Some(bean) => format!("Error matching bean '{}': {message}", bean.name),
                    None => format!("Error processing {}: {message}", record.resource),
                };
                (record.resource.clone(), line, message)
            }
            FailureClass::Unexpected { message } => {
                warn!(resource = %record.resource, %message, "unexpected failure while matching");
                match declaration {
                    Some(d) => (
                        d.resource.clone(),
                        d.line,
                        format!("Error occurred processing '{}': {message}", d.describe()),
                    ),
                    None => (
                        record.resource.clone(),
                        0,
                        format!("Error occurred processing {}: {message}", record.resource),
                    ),
                }
            }
        };
        Some(AnnotationDraft::new(
            resource,
            MarkerCategory::Problem,
            line,
            message,
            self.problem_severity,
            Some(record.resource.clone()),
        ))
    }
}

/// Source and target side annotations for one edge.
pub fn edge_annotations(edge: &Edge) -> Vec<AnnotationDraft> {
    let attribution = Some(edge.file.clone());
    let (source_message, target_message) = if edge.is_introduction() {
        (
            format!("declared on {}", edge.target.label),
            format!("aspect declarations {}", edge.declaration.aspect_name),
        )
    } else {
        (
            format!("advises {}", edge.target.label),
            format!("advised by {}", edge.source.label),
        )
    };

    let at = |element: &Element, category: MarkerCategory, message: &str| {
        AnnotationDraft::new(
            element.resource.clone(),
            category,
            element.line,
            message,
            Severity::Info,
            attribution.clone(),
        )
    };

    let mut drafts = vec![
        at(&edge.source, MarkerCategory::Source(edge.kind), &source_message),
        at(&edge.target, MarkerCategory::Target(edge.kind), &target_message),
    ];
    if let Some(bean) = &edge.target_bean {
        drafts.push(at(bean, MarkerCategory::Target(edge.kind), &target_message));
    }
    drafts
}
