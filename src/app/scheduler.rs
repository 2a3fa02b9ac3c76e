//! Build task scheduler.
//!
//! Requests are registered on submit and executed one at a time by a single
//! worker task. When a request starts, every other registered request of the
//! same project whose files it covers is cancelled. Each finished pass, even a
//! cancelled one, schedules a reconciliation task that runs under the coarser
//! workspace lock.

use crate::app::config::EngineConfig;
use crate::domain::diagnostics::DiagnosticStore;
use crate::domain::element::{ProjectId, ResourcePath};
use crate::domain::model::ReferenceModelStore;
use crate::domain::pass::{BuildOutcome, BuildPass, PassStats};
use crate::domain::ports::{Collaborators, ModelChangeListener, ModelChangedEvent};
use crate::domain::reconcile::{ReconcileJob, Reconciler};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{Notify, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub type RequestId = u64;

/// Workspace-wide lock shared with anything else that mutates workspace
/// state. Reconciliation holds it; builds never do.
pub type WorkspaceLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub id: RequestId,
    pub project: ProjectId,
    pub files: BTreeSet<ResourcePath>,
    pub token: CancellationToken,
}

impl BuildRequest {
    /// Every file of `self` is also a file of `other`. Coalescing in
    /// `cancel_covered` additionally requires both requests to target the
    /// same project; files of different projects are never compared.
    pub fn covered_by(&self, other: &BuildRequest) -> bool {
        self.files.is_subset(&other.files)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum BuildStatus {
    Completed,
    /// Stopped mid-pass; partial results were still reconciled
    Cancelled,
    /// Cancelled before it started; nothing ran
    Superseded,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub id: RequestId,
    pub project: ProjectId,
    #[serde(flatten)]
    pub status: BuildStatus,
    pub edges: usize,
    pub failures: usize,
    pub rebuilt: Vec<ResourcePath>,
    pub stats: PassStats,
}

impl BuildReport {
    fn without_pass(request: &BuildRequest, status: BuildStatus) -> Self {
        Self {
            id: request.id,
            project: request.project.clone(),
            status,
            edges: 0,
            failures: 0,
            rebuilt: Vec::new(),
            stats: PassStats::default(),
        }
    }
}

/// Handle on a submitted request
pub struct BuildTicket {
    pub id: RequestId,
    project: ProjectId,
    token: CancellationToken,
    done: oneshot::Receiver<BuildReport>,
}

impl BuildTicket {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Resolves once the pass has finished; reconciliation may still be running.
    pub async fn wait(self) -> BuildReport {
        match self.done.await {
            Ok(report) => report,
            Err(_) => BuildReport {
                id: self.id,
                project: self.project,
                status: BuildStatus::Failed("build worker stopped".to_string()),
                edges: 0,
                failures: 0,
                rebuilt: Vec::new(),
                stats: PassStats::default(),
            },
        }
    }
}

struct Job {
    request: BuildRequest,
    done: oneshot::Sender<BuildReport>,
}

#[derive(Clone)]
pub struct BuildScheduler {
    inner: Arc<Inner>,
    queue: mpsc::UnboundedSender<Job>,
}

struct Inner {
    collaborators: Collaborators,
    models: Arc<ReferenceModelStore>,
    diagnostics: Arc<RwLock<DiagnosticStore>>,
    workspace_lock: WorkspaceLock,
    listeners: RwLock<Vec<Arc<dyn ModelChangeListener>>>,
    registry: Mutex<BTreeMap<RequestId, BuildRequest>>,
    config: EngineConfig,
    next_id: AtomicU64,
    /// Builds and reconciliations not yet finished
    pending: AtomicUsize,
    idle: Notify,
}

impl BuildScheduler {
    /// Must be called inside a tokio runtime: spawns the build worker.
    pub fn new(
        collaborators: Collaborators,
        models: Arc<ReferenceModelStore>,
        diagnostics: Arc<RwLock<DiagnosticStore>>,
        workspace_lock: WorkspaceLock,
        config: EngineConfig,
    ) -> Self {
        let (queue, jobs) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            collaborators,
            models,
            diagnostics,
            workspace_lock,
            listeners: RwLock::new(Vec::new()),
            registry: Mutex::new(BTreeMap::new()),
            config,
            next_id: AtomicU64::new(1),
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
        });
        tokio::spawn(run_worker(inner.clone(), jobs));
        Self { inner, queue }
    }

    pub fn add_listener(&self, listener: Arc<dyn ModelChangeListener>) {
        self.inner.listeners.write().push(listener);
    }

    pub fn submit(
        &self,
        project: impl Into<ProjectId>,
        files: impl IntoIterator<Item = ResourcePath>,
    ) -> BuildTicket {
        let request = BuildRequest {
            id: self.inner.next_id.fetch_add(1, Ordering::SeqCst),
            project: project.into(),
            files: files.into_iter().collect(),
            token: CancellationToken::new(),
        };
        debug!(id = request.id, project = %request.project, files = request.files.len(), "build request submitted");

        let (done, receiver) = oneshot::channel();
        let ticket = BuildTicket {
            id: request.id,
            project: request.project.clone(),
            token: request.token.clone(),
            done: receiver,
        };

        self.inner
            .registry
            .lock()
            .insert(request.id, request.clone());
        self.inner.begin();
        if let Err(mpsc::error::SendError(job)) = self.queue.send(Job { request, done }) {
            error!(id = job.request.id, "build worker is gone; dropping request");
            self.inner.registry.lock().remove(&job.request.id);
            self.inner.finish();
        }
        ticket
    }

    /// Cancel a registered request; false if it is unknown or already done.
    pub fn cancel(&self, id: RequestId) -> bool {
        match self.inner.registry.lock().get(&id) {
            Some(request) => {
                request.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Requests registered and not yet finished, in submission order
    pub fn pending(&self) -> Vec<BuildRequest> {
        self.inner.registry.lock().values().cloned().collect()
    }

    /// Wait until every submitted build and every reconciliation has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

async fn run_worker(inner: Arc<Inner>, mut jobs: mpsc::UnboundedReceiver<Job>) {
    while let Some(Job { request, done }) = jobs.recv().await {
        let report = inner.clone().execute(request).await;
        if done.send(report).is_err() {
            debug!("build ticket dropped before completion");
        }
        inner.finish();
    }
    debug!("build worker stopped");
}

impl Inner {
    fn begin(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    async fn execute(self: Arc<Self>, request: BuildRequest) -> BuildReport {
        if request.token.is_cancelled() {
            self.registry.lock().remove(&request.id);
            info!(id = request.id, project = %request.project, "build request superseded");
            return BuildReport::without_pass(&request, BuildStatus::Superseded);
        }
        if self.config.coalesce_requests {
            self.cancel_covered(&request);
        }

        info!(id = request.id, project = %request.project, files = request.files.len(), "build started");
        let pass_inner = self.clone();
        let pass_request = request.clone();
        let result = tokio::task::spawn_blocking(move || {
            BuildPass::new(
                &pass_inner.collaborators,
                &pass_inner.models,
                pass_inner.config.trace_matching,
            )
            .run(&pass_request.project, &pass_request.files, &pass_request.token)
        })
        .await;
        self.registry.lock().remove(&request.id);

        match result {
            Ok(outcome) => {
                let status = if outcome.cancelled {
                    BuildStatus::Cancelled
                } else {
                    BuildStatus::Completed
                };
                let report = BuildReport {
                    id: request.id,
                    project: request.project.clone(),
                    status,
                    edges: outcome.edges.len(),
                    failures: outcome.failures.len(),
                    rebuilt: outcome.rebuilt.iter().cloned().collect(),
                    stats: outcome.stats.clone(),
                };
                self.schedule_reconcile(outcome);
                report
            }
            Err(err) => {
                error!(id = request.id, error = %err, "build pass panicked");
                BuildReport::without_pass(&request, BuildStatus::Failed(err.to_string()))
            }
        }
    }

    fn cancel_covered(&self, starting: &BuildRequest) {
        let registry = self.registry.lock();
        for other in registry.values() {
            if other.id != starting.id
                && other.project == starting.project
                && other.covered_by(starting)
                && !other.token.is_cancelled()
            {
                info!(cancelled = other.id, by = starting.id, "coalescing covered build request");
                other.token.cancel();
            }
        }
    }

    fn schedule_reconcile(self: &Arc<Self>, outcome: BuildOutcome) {
        let job = ReconcileJob {
            project: outcome.project,
            rebuilt: outcome.rebuilt,
            edges: outcome.edges,
            failures: outcome.failures,
            partial: outcome.cancelled,
        };
        self.begin();
        let inner = self.clone();
        tokio::spawn(async move {
            inner.reconcile(job).await;
            inner.finish();
        });
    }

    async fn reconcile(&self, job: ReconcileJob) {
        let _guard = self.workspace_lock.lock().await;
        let reconciler = Reconciler::new(self.config.problem_severity);
        let annotation_count = {
            let mut store = self.diagnostics.write();
            reconciler.reconcile(&mut store, &job);
            store.len()
        };

        let event = ModelChangedEvent {
            project: job.project.clone(),
            resources: job.rebuilt.iter().cloned().collect(),
            edge_count: self.models.snapshot(&job.project).edge_count(),
            annotation_count,
            partial: job.partial,
        };
        let listeners: Vec<Arc<dyn ModelChangeListener>> = self.listeners.read().clone();
        for listener in listeners {
            if let Err(err) = listener.model_changed(&event) {
                warn!(project = %event.project, error = %err, "model change listener failed");
            }
        }
    }
}
