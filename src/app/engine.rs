use crate::adapters::fs::reader::WorkspaceReader;
use crate::adapters::workspace::StaticWorkspace;
use crate::app::config::EngineConfig;
use crate::app::dto::*;
use crate::app::scheduler::{BuildReport, BuildScheduler, BuildTicket, WorkspaceLock};
use crate::domain::advice::AdviceKind;
use crate::domain::diagnostics::DiagnosticStore;
use crate::domain::element::{Element, ResourcePath};
use crate::domain::model::{ReferenceModel, ReferenceModelStore};
use crate::domain::ports::{Collaborators, ModelChangeListener};
use crate::domain::xref_graph::XrefGraph;
use anyhow::{Result, anyhow, bail};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Facade over the scheduler, the live reference models and the diagnostics
/// store. Cheap to clone.
#[derive(Clone)]
pub struct XrefEngine {
    inner: Arc<EngineData>,
}

struct EngineData {
    workspace_path: Option<PathBuf>,
    workspace: Option<Arc<StaticWorkspace>>,
    models: Arc<ReferenceModelStore>,
    diagnostics: Arc<RwLock<DiagnosticStore>>,
    workspace_lock: WorkspaceLock,
    scheduler: BuildScheduler,
}

impl XrefEngine {
    /// Engine over arbitrary collaborators. Must be called inside a tokio runtime.
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Self {
        Self::assemble(collaborators, None, None, config)
    }

    pub fn with_workspace(
        workspace: StaticWorkspace,
        workspace_path: Option<PathBuf>,
        config: EngineConfig,
    ) -> Self {
        let workspace = Arc::new(workspace);
        Self::assemble(
            Collaborators::uniform(workspace.clone()),
            Some(workspace),
            workspace_path,
            config,
        )
    }

    pub fn load_from_json(path: &Path, config: EngineConfig) -> Result<Self> {
        let workspace = WorkspaceReader::new().load(path)?;
        info!(path = %path.display(), "workspace loaded");
        Ok(Self::with_workspace(
            workspace,
            Some(path.to_path_buf()),
            config,
        ))
    }

    fn assemble(
        collaborators: Collaborators,
        workspace: Option<Arc<StaticWorkspace>>,
        workspace_path: Option<PathBuf>,
        config: EngineConfig,
    ) -> Self {
        let models = Arc::new(ReferenceModelStore::new());
        let diagnostics = Arc::new(RwLock::new(DiagnosticStore::new()));
        let workspace_lock: WorkspaceLock = Arc::new(tokio::sync::Mutex::new(()));
        let scheduler = BuildScheduler::new(
            collaborators,
            models.clone(),
            diagnostics.clone(),
            workspace_lock.clone(),
            config,
        );
        Self {
            inner: Arc::new(EngineData {
                workspace_path,
                workspace,
                models,
                diagnostics,
                workspace_lock,
                scheduler,
            }),
        }
    }

    pub fn scheduler(&self) -> &BuildScheduler {
        &self.inner.scheduler
    }

    /// The coarse lock reconciliation runs under; hold it to mutate
    /// workspace state without racing diagnostics.
    pub fn workspace_lock(&self) -> WorkspaceLock {
        self.inner.workspace_lock.clone()
    }

    pub fn add_listener(&self, listener: Arc<dyn ModelChangeListener>) {
        self.inner.scheduler.add_listener(listener);
    }

    pub fn submit(&self, project: &str, files: Vec<ResourcePath>) -> BuildTicket {
        self.inner.scheduler.submit(project, files)
    }

    /// Files to rebuild for a request: the given ones, or every configuration
    /// of the project when none are given.
    pub fn resolve_files(&self, project: &str, files: Vec<ResourcePath>) -> Result<Vec<ResourcePath>> {
        if !files.is_empty() {
            return Ok(files);
        }
        let workspace = self
            .inner
            .workspace
            .as_ref()
            .ok_or_else(|| anyhow!("No workspace loaded; files must be listed explicitly"))?;
        if !workspace.projects().any(|p| p == project) {
            bail!("Unknown project: {}", project);
        }
        Ok(workspace.configs_of(project))
    }

    /// Submit, wait for the pass and for its diagnostics.
    pub async fn build(&self, project: &str, files: Vec<ResourcePath>) -> Result<BuildReport> {
        let files = self.resolve_files(project, files)?;
        let report = self.submit(project, files).wait().await;
        self.wait_idle().await;
        Ok(report)
    }

    pub async fn submit_changes(&self, req: SubmitChangesRequest) -> Result<SubmitChangesResponse> {
        if req.wait {
            let report = self.build(&req.project, req.files).await?;
            return Ok(SubmitChangesResponse {
                request_id: report.id,
                report: Some(report.into()),
            });
        }
        let files = self.resolve_files(&req.project, req.files)?;
        let ticket = self.submit(&req.project, files);
        Ok(SubmitChangesResponse {
            request_id: ticket.id,
            report: None,
        })
    }

    pub async fn wait_idle(&self) {
        self.inner.scheduler.wait_idle().await;
    }

    pub fn model_snapshot(&self, project: &str) -> ReferenceModel {
        self.inner.models.snapshot(project)
    }

    pub fn model(&self, project: &str) -> ModelResponse {
        let snapshot = self.model_snapshot(project);
        let resources = snapshot
            .resources()
            .map(|resource| ResourceEdges {
                resource: resource.clone(),
                edges: snapshot.edges_for(resource).iter().map(EdgeDto::from).collect(),
            })
            .collect();
        ModelResponse {
            project: project.to_string(),
            edge_count: snapshot.edge_count(),
            resources,
        }
    }

    pub fn diagnostics(&self, resource: Option<&str>) -> DiagnosticsResponse {
        let store = self.inner.diagnostics.read();
        let annotations = match resource {
            Some(resource) => store.find_on(resource).into_iter().map(AnnotationDto::from).collect(),
            None => store.all().map(AnnotationDto::from).collect(),
        };
        DiagnosticsResponse { annotations }
    }

    pub fn xref(&self, req: XrefRequest) -> Result<XrefResponse> {
        let graph = XrefGraph::from_model(&self.model_snapshot(&req.project));
        if graph.get_node_by_handle(&req.element).is_none() {
            bail!("Element not found in {} model: {}", req.project, req.element);
        }
        let items = |related: Vec<(&Element, AdviceKind)>| {
            related
                .into_iter()
                .map(|(element, kind)| XrefItem {
                    element: element.into(),
                    kind: kind.to_string(),
                })
                .collect::<Vec<_>>()
        };
        Ok(XrefResponse {
            advises: items(graph.advises(&req.element)),
            advised_by: items(graph.advised_by(&req.element)),
            element: req.element,
        })
    }

    pub fn graph_dot(&self, project: &str) -> String {
        XrefGraph::from_model(&self.model_snapshot(project)).to_dot()
    }

    pub fn health(&self) -> HealthResponse {
        let projects = match &self.inner.workspace {
            Some(workspace) => workspace.projects().cloned().collect(),
            None => self.inner.models.projects(),
        };
        HealthResponse {
            workspace: self
                .inner
                .workspace_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            projects,
            edge_count: self.inner.models.edge_count(),
            annotation_count: self.inner.diagnostics.read().len(),
            pending_builds: self.inner.scheduler.pending().len(),
        }
    }
}
