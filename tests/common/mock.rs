//! Mock collaborators and listeners for integration tests.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::{Arc, Condvar, Mutex};

use anyhow::{Result, bail};
use aspect_xref::adapters::workspace::StaticWorkspace;
use aspect_xref::domain::advice::AdviceDeclaration;
use aspect_xref::domain::config::BeanDefinition;
use aspect_xref::domain::element::{ResolvedClass, ResolvedMember};
use aspect_xref::domain::failure::MatchFailure;
use aspect_xref::domain::ports::{
    ClassContext, Collaborators, DefinitionExtractor, JoinPointMatcher, ModelChangeListener,
    ModelChangedEvent,
};
use tokio::sync::mpsc;

/// A gate matching threads block on until the test opens it. Stays open.
pub struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    pub fn closed() -> Arc<Self> {
        Arc::new(Self {
            open: Mutex::new(false),
            opened: Condvar::new(),
        })
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
    }
}

/// Delegates to the workspace matcher, but every join-point match first
/// reports the bean name and then waits on the gate.
pub struct GatedMatcher {
    inner: Arc<StaticWorkspace>,
    gate: Arc<Gate>,
    entered: mpsc::UnboundedSender<String>,
}

impl JoinPointMatcher for GatedMatcher {
    fn type_matches(
        &self,
        ctx: &dyn ClassContext,
        declaration: &AdviceDeclaration,
        class: &ResolvedClass,
    ) -> Result<bool, MatchFailure> {
        self.inner.type_matches(ctx, declaration, class)
    }

    fn match_join_points(
        &self,
        ctx: &dyn ClassContext,
        class: &ResolvedClass,
        bean: &BeanDefinition,
        declaration: &AdviceDeclaration,
        project: &str,
    ) -> Result<BTreeSet<ResolvedMember>, MatchFailure> {
        let _ = self.entered.send(bean.name.clone());
        self.gate.wait();
        self.inner
            .match_join_points(ctx, class, bean, declaration, project)
    }
}

/// Collaborators over `workspace` whose matching blocks on the returned gate.
/// The receiver yields the bean name of every match that reached the gate.
pub fn gated(
    workspace: StaticWorkspace,
) -> (Collaborators, Arc<Gate>, mpsc::UnboundedReceiver<String>) {
    let workspace = Arc::new(workspace);
    let gate = Gate::closed();
    let (entered, receiver) = mpsc::unbounded_channel();
    let matcher = GatedMatcher {
        inner: workspace.clone(),
        gate: gate.clone(),
        entered,
    };
    let collaborators = Collaborators {
        config_model: workspace.clone(),
        resolver: workspace.clone(),
        extractor: workspace,
        matcher: Arc::new(matcher),
    };
    (collaborators, gate, receiver)
}

/// Delegates extraction to the workspace until a file is broken; broken
/// files fail with an unreadable-file error from then on.
pub struct BreakableExtractor {
    inner: Arc<StaticWorkspace>,
    broken: Mutex<BTreeSet<String>>,
}

impl BreakableExtractor {
    pub fn break_file(&self, resource: &str) {
        self.broken.lock().unwrap().insert(resource.to_string());
    }
}

impl DefinitionExtractor for BreakableExtractor {
    fn extract(
        &self,
        ctx: &dyn ClassContext,
        resource: &str,
    ) -> Result<Vec<AdviceDeclaration>, MatchFailure> {
        if self.broken.lock().unwrap().contains(resource) {
            return Err(MatchFailure::other(format!("cannot read {resource}")));
        }
        self.inner.extract(ctx, resource)
    }
}

/// Collaborators over `workspace` whose extraction can be broken per file.
pub fn breakable(workspace: StaticWorkspace) -> (Collaborators, Arc<BreakableExtractor>) {
    let workspace = Arc::new(workspace);
    let extractor = Arc::new(BreakableExtractor {
        inner: workspace.clone(),
        broken: Mutex::new(BTreeSet::new()),
    });
    let collaborators = Collaborators {
        config_model: workspace.clone(),
        resolver: workspace.clone(),
        extractor: extractor.clone(),
        matcher: workspace,
    };
    (collaborators, extractor)
}

/// Records every event it is handed.
#[derive(Default)]
pub struct RecordingListener {
    pub events: Mutex<Vec<ModelChangedEvent>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<ModelChangedEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ModelChangeListener for RecordingListener {
    fn model_changed(&self, event: &ModelChangedEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Always fails.
pub struct FailingListener;

impl ModelChangeListener for FailingListener {
    fn model_changed(&self, event: &ModelChangedEvent) -> Result<()> {
        bail!("listener rejected change of {}", event.project)
    }
}
