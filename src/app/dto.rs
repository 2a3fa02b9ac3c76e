use crate::app::scheduler::{BuildReport, BuildStatus};
use crate::domain::diagnostics::DiagnosticAnnotation;
use crate::domain::edge::Edge;
use crate::domain::element::Element;
use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub workspace: Option<String>,
    pub projects: Vec<String>,
    pub edge_count: usize,
    pub annotation_count: usize,
    pub pending_builds: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubmitChangesRequest {
    pub project: String,
    /// Changed files; every configuration of the project when empty
    #[serde(default)]
    pub files: Vec<String>,
    /// Wait for the build and its diagnostics before answering
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubmitChangesResponse {
    pub request_id: u64,
    pub report: Option<BuildReportDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BuildReportDto {
    pub id: u64,
    pub project: String,
    /// completed | cancelled | superseded | failed
    pub status: String,
    pub reason: Option<String>,
    pub edges: usize,
    pub failures: usize,
    pub rebuilt: Vec<String>,
}

impl From<BuildReport> for BuildReportDto {
    fn from(report: BuildReport) -> Self {
        let (status, reason) = match report.status {
            BuildStatus::Completed => ("completed", None),
            BuildStatus::Cancelled => ("cancelled", None),
            BuildStatus::Superseded => ("superseded", None),
            BuildStatus::Failed(reason) => ("failed", Some(reason)),
        };
        Self {
            id: report.id,
            project: report.project,
            status: status.to_string(),
            reason,
            edges: report.edges,
            failures: report.failures,
            rebuilt: report.rebuilt,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ElementDto {
    pub handle: String,
    pub label: String,
    pub resource: String,
    /// 1-based; 0 for file-level
    pub line: u32,
}

impl From<&Element> for ElementDto {
    fn from(element: &Element) -> Self {
        Self {
            handle: element.handle.clone(),
            label: element.label.clone(),
            resource: element.resource.clone(),
            line: element.line,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EdgeDto {
    pub kind: String,
    pub source: ElementDto,
    pub target: ElementDto,
    pub aspect: String,
    pub declaration: String,
    pub file: String,
    pub bean: String,
    pub target_bean: Option<ElementDto>,
}

impl From<&Edge> for EdgeDto {
    fn from(edge: &Edge) -> Self {
        Self {
            kind: edge.kind.to_string(),
            source: (&edge.source).into(),
            target: (&edge.target).into(),
            aspect: edge.declaration.aspect_name.clone(),
            declaration: edge.declaration.describe(),
            file: edge.file.clone(),
            bean: edge.bean.clone(),
            target_bean: edge.target_bean.as_ref().map(ElementDto::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModelRequest {
    pub project: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModelResponse {
    pub project: String,
    pub edge_count: usize,
    pub resources: Vec<ResourceEdges>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceEdges {
    pub resource: String,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosticsRequest {
    /// Only annotations on this resource
    #[serde(default)]
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnnotationDto {
    pub id: u64,
    pub resource: String,
    pub category: String,
    pub line: u32,
    pub message: String,
    pub severity: String,
    pub attribution: Option<String>,
    pub aggregate_count: usize,
}

impl From<&DiagnosticAnnotation> for AnnotationDto {
    fn from(annotation: &DiagnosticAnnotation) -> Self {
        Self {
            id: annotation.id,
            resource: annotation.resource.clone(),
            category: annotation.category.to_string(),
            line: annotation.line,
            message: annotation.message.clone(),
            severity: annotation.severity.as_str().to_string(),
            attribution: annotation.attribution.clone(),
            aggregate_count: annotation.aggregate_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosticsResponse {
    pub annotations: Vec<AnnotationDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct XrefRequest {
    pub project: String,
    /// Element handle, e.g. `com.example.OrderService.place(java.lang.String)`
    pub element: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct XrefItem {
    pub element: ElementDto,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct XrefResponse {
    pub element: String,
    pub advises: Vec<XrefItem>,
    pub advised_by: Vec<XrefItem>,
}
