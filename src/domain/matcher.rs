use crate::domain::advice::{AdviceBody, AdviceKind, DeclarationStyle};
use crate::domain::edge::Edge;
use crate::domain::element::{Element, ProjectId, ResolvedClass, simple_name};
use crate::domain::failure::MatchFailure;
use crate::domain::ports::{ClassContext, Collaborators};
use crate::domain::walker::MatchTriple;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why a bean was not matched at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AbstractBean,
    /// The bean backing the declaration's own aspect
    AspectBean,
    UnresolvableClass,
    /// Produced type unknown statically
    FactoryBean,
}

#[derive(Debug)]
pub enum MatchOutcome {
    Skipped(SkipReason),
    /// Possibly empty
    Matched(Vec<Edge>),
    Failed(MatchFailure),
    Cancelled,
}

/// Resolves target classes, runs the matching capability and turns matches
/// into edges. Never raises: failures come back as [`MatchOutcome::Failed`].
pub struct MatchOrchestrator<'a> {
    collaborators: &'a Collaborators,
    trace: bool,
}

impl<'a> MatchOrchestrator<'a> {
    pub fn new(collaborators: &'a Collaborators, trace: bool) -> Self {
        Self {
            collaborators,
            trace,
        }
    }

    pub fn match_bean(
        &self,
        triple: &MatchTriple,
        build_project: &str,
        token: &CancellationToken,
    ) -> MatchOutcome {
        let bean = &triple.bean;
        let declaration = &triple.declaration;

        if bean.is_abstract {
            return MatchOutcome::Skipped(SkipReason::AbstractBean);
        }
        if bean.name == declaration.aspect_name && bean.resource == declaration.resource {
            return MatchOutcome::Skipped(SkipReason::AspectBean);
        }
        let Some(class_name) = bean.class_name.as_deref() else {
            return MatchOutcome::Skipped(SkipReason::UnresolvableClass);
        };
        if bean.is_factory {
            return MatchOutcome::Skipped(SkipReason::FactoryBean);
        }
        if token.is_cancelled() {
            return MatchOutcome::Cancelled;
        }

        let project = self.class_project(&triple.file, build_project);
        if self.trace {
            debug!(
                bean = %bean.name,
                class = class_name,
                declaration = %declaration.describe(),
                project = %project,
                "matching"
            );
        }
        match self.match_in_context(&project, class_name, triple, token) {
            Ok(Some(edges)) => MatchOutcome::Matched(edges),
            Ok(None) => MatchOutcome::Cancelled,
            Err(failure) => MatchOutcome::Failed(failure),
        }
    }

    /// Class-loading project for a triple: the file's own project when it
    /// lives outside the project under build, otherwise the build project.
    fn class_project(&self, file: &str, build_project: &str) -> ProjectId {
        match self.collaborators.config_model.project_of(file) {
            Some(project) if project != build_project => project,
            _ => build_project.to_string(),
        }
    }

    fn match_in_context(
        &self,
        project: &str,
        class_name: &str,
        triple: &MatchTriple,
        token: &CancellationToken,
    ) -> Result<Option<Vec<Edge>>, MatchFailure> {
        let ctx = self.collaborators.resolver.enter(project)?;
        let target = ctx.load_class(class_name)?;
        if token.is_cancelled() {
            return Ok(None);
        }

        match &triple.declaration.body {
            AdviceBody::Introduction {
                defining_field,
                introduced_interface,
                ..
            } => self
                .match_introduction(
                    ctx.as_ref(),
                    &target,
                    triple,
                    defining_field.as_deref(),
                    introduced_interface,
                )
                .map(Some),
            AdviceBody::Advice {
                method_name,
                parameter_types,
                ..
            } => self.match_advice(
                ctx.as_ref(),
                project,
                &target,
                triple,
                method_name,
                parameter_types,
                token,
            ),
        }
    }

    fn match_introduction(
        &self,
        ctx: &dyn ClassContext,
        target: &ResolvedClass,
        triple: &MatchTriple,
        defining_field: Option<&str>,
        introduced_interface: &str,
    ) -> Result<Vec<Edge>, MatchFailure> {
        let declaration = &triple.declaration;
        if !self
            .collaborators
            .matcher
            .type_matches(ctx, declaration, target)?
        {
            return Ok(Vec::new());
        }

        let source = match declaration.style {
            DeclarationStyle::Xml => declaration.site(simple_name(introduced_interface)),
            DeclarationStyle::Annotation => {
                let aspect = ctx.load_class(&declaration.aspect_class)?;
                match defining_field {
                    Some(field) => ctx
                        .find_field(&aspect, field)?
                        .map(|f| f.element())
                        .unwrap_or_else(|| aspect.element()),
                    None => aspect.element(),
                }
            }
        };

        Ok(vec![Edge {
            kind: AdviceKind::Introduction,
            source,
            target: target.element(),
            declaration: declaration.clone(),
            file: triple.file.clone(),
            bean: triple.bean.name.clone(),
            target_bean: Some(triple.bean.element()),
        }])
    }

    #[allow(clippy::too_many_arguments)]
    fn match_advice(
        &self,
        ctx: &dyn ClassContext,
        project: &str,
        target: &ResolvedClass,
        triple: &MatchTriple,
        method_name: &str,
        parameter_types: &[String],
        token: &CancellationToken,
    ) -> Result<Option<Vec<Edge>>, MatchFailure> {
        let declaration = &triple.declaration;
        let aspect = ctx.load_class(&declaration.aspect_class)?;
        let Some(advice_method) = ctx.find_method(&aspect, method_name, parameter_types)? else {
            debug!(
                aspect = %declaration.aspect_class,
                method = method_name,
                "advice method not resolvable"
            );
            return Ok(Some(Vec::new()));
        };
        if token.is_cancelled() {
            return Ok(None);
        }

        let matched = self.collaborators.matcher.match_join_points(
            ctx,
            target,
            &triple.bean,
            declaration,
            project,
        )?;

        let source: Element = match declaration.style {
            DeclarationStyle::Annotation => advice_method.element(),
            DeclarationStyle::Xml => declaration.site(advice_method.label()),
        };
        let edges = matched
            .into_iter()
            .map(|method| Edge {
                kind: declaration.kind,
                source: source.clone(),
                target: method.element(),
                declaration: declaration.clone(),
                file: triple.file.clone(),
                bean: triple.bean.name.clone(),
                target_bean: None,
            })
            .collect();
        Ok(Some(edges))
    }
}
