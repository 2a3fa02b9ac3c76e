use crate::adapters::workspace::descriptor::{
    AspectDescriptor, BeanDescriptor, ClassDescriptor, ComponentDescriptor, ConfigDescriptor,
    WorkspaceDescriptor,
};
use crate::adapters::workspace::pointcut::{JoinPoint, Pointcut, TypePattern};
use crate::domain::advice::{AdviceBody, AdviceDeclaration, DeclarationStyle};
use crate::domain::config::{BeanDefinition, BeanId, ComponentId, ConfigSet};
use crate::domain::element::{MemberKind, ProjectId, ResolvedClass, ResolvedMember, ResourcePath};
use crate::domain::failure::MatchFailure;
use crate::domain::ports::{
    ClassContext, ConfigurationModel, DefinitionExtractor, JoinPointMatcher, TypeResolver,
};
use anyhow::{Result, bail};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// In-memory workspace built from a [`WorkspaceDescriptor`]; serves every
/// consumed port.
pub struct StaticWorkspace {
    projects: BTreeSet<ProjectId>,
    /// Project -> projects whose classes it can load (itself included)
    visibility: HashMap<ProjectId, BTreeSet<ProjectId>>,
    configs: HashMap<ResourcePath, ConfigDescriptor>,
    config_beans: HashMap<ResourcePath, Vec<BeanDefinition>>,
    inner_beans: HashMap<BeanId, Vec<BeanDefinition>>,
    components: HashMap<ComponentId, ComponentDescriptor>,
    component_beans: HashMap<ComponentId, Vec<BeanDefinition>>,
    config_sets: Vec<ConfigSet>,
    /// Class name -> one descriptor per declaring project
    classes: HashMap<String, Vec<ClassDescriptor>>,
    resource_projects: HashMap<ResourcePath, ProjectId>,
    pointcuts: Mutex<HashMap<String, Arc<Pointcut>>>,
}

impl StaticWorkspace {
    pub fn new(descriptor: WorkspaceDescriptor) -> Result<Self> {
        let mut projects = BTreeSet::new();
        let mut depends_on: HashMap<ProjectId, Vec<ProjectId>> = HashMap::new();
        for project in &descriptor.projects {
            if !projects.insert(project.name.clone()) {
                bail!("Duplicate project: {}", project.name);
            }
            depends_on.insert(project.name.clone(), project.depends_on.clone());
        }
        for (project, deps) in &depends_on {
            if let Some(unknown) = deps.iter().find(|d| !projects.contains(*d)) {
                bail!("Project {} depends on unknown project {}", project, unknown);
            }
        }
        let visibility = projects
            .iter()
            .map(|p| (p.clone(), transitive_dependencies(p, &depends_on)))
            .collect();

        let mut resource_projects = HashMap::new();
        let mut configs = HashMap::new();
        let mut config_beans = HashMap::new();
        let mut inner_beans = HashMap::new();
        let mut seen_ids = BTreeSet::new();
        for config in descriptor.configs {
            if !projects.contains(&config.project) {
                bail!("Configuration {} belongs to unknown project {}", config.resource, config.project);
            }
            if configs.contains_key(&config.resource) {
                bail!("Duplicate configuration: {}", config.resource);
            }
            let beans = index_beans(&config.resource, None, &config.beans, &mut inner_beans, &mut seen_ids)?;
            config_beans.insert(config.resource.clone(), beans);
            resource_projects.insert(config.resource.clone(), config.project.clone());
            configs.insert(config.resource.clone(), config);
        }

        let mut components = HashMap::new();
        let mut component_beans = HashMap::new();
        for component in descriptor.components {
            if !configs.contains_key(&component.resource) {
                bail!("Component {} declared in unknown configuration {}", component.id, component.resource);
            }
            if components.contains_key(&component.id) {
                bail!("Duplicate component: {}", component.id);
            }
            let beans = index_beans(&component.resource, None, &component.beans, &mut inner_beans, &mut seen_ids)?;
            component_beans.insert(component.id.clone(), beans);
            components.insert(component.id.clone(), component);
        }

        let config_sets = descriptor
            .config_sets
            .into_iter()
            .map(|set| ConfigSet {
                name: set.name,
                project: set.project,
                configs: set.configs,
            })
            .collect();

        let mut classes: HashMap<String, Vec<ClassDescriptor>> = HashMap::new();
        for class in descriptor.classes {
            if !projects.contains(&class.project) {
                bail!("Class {} belongs to unknown project {}", class.name, class.project);
            }
            resource_projects.insert(class.resource.clone(), class.project.clone());
            classes.entry(class.name.clone()).or_default().push(class);
        }

        debug!(
            projects = projects.len(),
            configs = configs.len(),
            classes = classes.len(),
            "workspace indexed"
        );

        Ok(Self {
            projects,
            visibility,
            configs,
            config_beans,
            inner_beans,
            components,
            component_beans,
            config_sets,
            classes,
            resource_projects,
            pointcuts: Mutex::new(HashMap::new()),
        })
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectId> {
        self.projects.iter()
    }

    /// Configuration files of a project, sorted
    pub fn configs_of(&self, project: &str) -> Vec<ResourcePath> {
        let mut resources: Vec<ResourcePath> = self
            .configs
            .values()
            .filter(|c| c.project == project)
            .map(|c| c.resource.clone())
            .collect();
        resources.sort();
        resources
    }

    fn class_in(&self, name: &str, visible: &BTreeSet<ProjectId>, preferred: &str) -> Option<&ClassDescriptor> {
        let candidates = self.classes.get(name)?;
        candidates
            .iter()
            .find(|c| c.project == preferred)
            .or_else(|| candidates.iter().find(|c| visible.contains(&c.project)))
    }

    fn descriptor_of(&self, class: &ResolvedClass) -> Option<&ClassDescriptor> {
        self.classes
            .get(&class.name)?
            .iter()
            .find(|c| c.project == class.project)
    }

    /// `class` followed by every supertype reachable from it inside `project`
    fn type_hierarchy(&self, class: &ResolvedClass, project: &str) -> Vec<String> {
        let visible = self.visibility.get(project).cloned().unwrap_or_default();
        let mut names = vec![class.name.clone()];
        let mut seen: BTreeSet<String> = BTreeSet::from([class.name.clone()]);
        let mut index = 0;
        while index < names.len() {
            let current = names[index].clone();
            index += 1;
            let supertypes = self
                .class_in(&current, &visible, &class.project)
                .map(|c| c.supertypes.clone())
                .unwrap_or_default();
            for supertype in supertypes {
                if seen.insert(supertype.clone()) {
                    names.push(supertype);
                }
            }
        }
        names
    }

    fn pointcut(&self, expression: &str) -> Result<Arc<Pointcut>, MatchFailure> {
        if let Some(cached) = self.pointcuts.lock().get(expression) {
            return Ok(cached.clone());
        }
        let parsed = Arc::new(Pointcut::parse(expression)?);
        self.pointcuts
            .lock()
            .insert(expression.to_string(), parsed.clone());
        Ok(parsed)
    }

    fn aspect_declarations(
        &self,
        ctx: &dyn ClassContext,
        resource: &str,
        aspect: &AspectDescriptor,
    ) -> Result<Vec<AdviceDeclaration>, MatchFailure> {
        if aspect.style == DeclarationStyle::Annotation {
            ctx.load_class(&aspect.class).map_err(|e| {
                MatchFailure::wrapped(format!("reading annotations of aspect '{}'", aspect.name), e)
            })?;
        }

        let mut declarations = Vec::with_capacity(aspect.advice.len() + aspect.introductions.len());
        for advice in &aspect.advice {
            declarations.push(AdviceDeclaration::advice(
                advice.kind,
                aspect.style,
                aspect.name.clone(),
                aspect.class.clone(),
                advice.method.clone(),
                advice.parameter_types.clone(),
                advice.pointcut.clone(),
                resource,
                advice.line.unwrap_or(aspect.line),
            ));
        }
        for intro in &aspect.introductions {
            declarations.push(AdviceDeclaration::introduction(
                aspect.style,
                aspect.name.clone(),
                aspect.class.clone(),
                intro.types.clone(),
                intro.interface.clone(),
                intro.default_impl.clone(),
                intro.field.clone(),
                resource,
                intro.line.unwrap_or(aspect.line),
            ));
        }
        Ok(declarations)
    }
}

fn transitive_dependencies(
    project: &str,
    depends_on: &HashMap<ProjectId, Vec<ProjectId>>,
) -> BTreeSet<ProjectId> {
    let mut visible = BTreeSet::new();
    let mut stack = vec![project.to_string()];
    while let Some(current) = stack.pop() {
        if !visible.insert(current.clone()) {
            continue;
        }
        if let Some(deps) = depends_on.get(&current) {
            stack.extend(deps.iter().cloned());
        }
    }
    visible
}

fn index_beans(
    resource: &str,
    parent: Option<&str>,
    beans: &[BeanDescriptor],
    inner_beans: &mut HashMap<BeanId, Vec<BeanDefinition>>,
    seen_ids: &mut BTreeSet<BeanId>,
) -> Result<Vec<BeanDefinition>> {
    let mut defs = Vec::with_capacity(beans.len());
    for bean in beans {
        let id = bean.id.clone().unwrap_or_else(|| match parent {
            Some(parent) => format!("{}/{}", parent, bean.name),
            None => format!("{}#{}", resource, bean.name),
        });
        if !seen_ids.insert(id.clone()) {
            bail!("Duplicate bean id: {}", id);
        }
        let children = index_beans(resource, Some(&id), &bean.inner, inner_beans, seen_ids)?;
        if !children.is_empty() {
            inner_beans.insert(id.clone(), children);
        }
        defs.push(BeanDefinition {
            id,
            name: bean.name.clone(),
            class_name: bean.class.clone(),
            resource: resource.to_string(),
            line: bean.line,
            is_abstract: bean.is_abstract,
            is_factory: bean.is_factory,
            is_infrastructure: bean.is_infrastructure,
        });
    }
    Ok(defs)
}

impl ConfigurationModel for StaticWorkspace {
    fn configuration_for(&self, resource: &str) -> Option<ResourcePath> {
        self.configs.get(resource).map(|c| c.resource.clone())
    }

    fn project_of(&self, resource: &str) -> Option<ProjectId> {
        self.resource_projects.get(resource).cloned()
    }

    fn beans(&self, config: &str) -> Vec<BeanDefinition> {
        self.config_beans.get(config).cloned().unwrap_or_default()
    }

    fn inner_beans(&self, bean: &BeanDefinition) -> Vec<BeanDefinition> {
        self.inner_beans.get(&bean.id).cloned().unwrap_or_default()
    }

    fn components(&self, config: &str) -> Vec<ComponentId> {
        self.configs
            .get(config)
            .map(|c| c.components.clone())
            .unwrap_or_default()
    }

    fn component_beans(&self, component: &str) -> Vec<BeanDefinition> {
        self.component_beans.get(component).cloned().unwrap_or_default()
    }

    fn nested_components(&self, component: &str) -> Vec<ComponentId> {
        self.components
            .get(component)
            .map(|c| c.nested.clone())
            .unwrap_or_default()
    }

    fn imports(&self, config: &str) -> Vec<ResourcePath> {
        self.configs
            .get(config)
            .map(|c| c.imports.clone())
            .unwrap_or_default()
    }

    fn config_sets(&self, config: &str) -> Vec<ConfigSet> {
        self.config_sets
            .iter()
            .filter(|set| set.configs.iter().any(|c| c == config))
            .cloned()
            .collect()
    }
}

/// Class-loading context of one project
struct WorkspaceClassContext<'w> {
    workspace: &'w StaticWorkspace,
    project: ProjectId,
    visible: &'w BTreeSet<ProjectId>,
}

impl TypeResolver for StaticWorkspace {
    fn enter(&self, project: &str) -> Result<Box<dyn ClassContext + '_>, MatchFailure> {
        let visible = self
            .visibility
            .get(project)
            .ok_or_else(|| MatchFailure::other(format!("unknown project '{project}'")))?;
        Ok(Box::new(WorkspaceClassContext {
            workspace: self,
            project: project.to_string(),
            visible,
        }))
    }
}

impl ClassContext for WorkspaceClassContext<'_> {
    fn project(&self) -> &str {
        &self.project
    }

    fn load_class(&self, name: &str) -> Result<ResolvedClass, MatchFailure> {
        let class = self
            .workspace
            .class_in(name, self.visible, &self.project)
            .ok_or_else(|| MatchFailure::class_not_found(name))?;
        Ok(ResolvedClass {
            name: class.name.clone(),
            project: class.project.clone(),
            resource: class.resource.clone(),
            line: class.line,
        })
    }

    fn find_method(
        &self,
        class: &ResolvedClass,
        name: &str,
        parameter_types: &[String],
    ) -> Result<Option<ResolvedMember>, MatchFailure> {
        let descriptor = self
            .workspace
            .descriptor_of(class)
            .ok_or_else(|| MatchFailure::class_not_found(&class.name))?;
        Ok(descriptor
            .methods
            .iter()
            .find(|m| m.name == name && m.parameter_types == parameter_types)
            .map(|m| ResolvedMember {
                kind: MemberKind::Method,
                declaring_class: class.name.clone(),
                name: m.name.clone(),
                parameter_types: m.parameter_types.clone(),
                resource: class.resource.clone(),
                line: m.line,
            }))
    }

    fn find_field(
        &self,
        class: &ResolvedClass,
        name: &str,
    ) -> Result<Option<ResolvedMember>, MatchFailure> {
        let descriptor = self
            .workspace
            .descriptor_of(class)
            .ok_or_else(|| MatchFailure::class_not_found(&class.name))?;
        Ok(descriptor
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| ResolvedMember {
                kind: MemberKind::Field,
                declaring_class: class.name.clone(),
                name: f.name.clone(),
                parameter_types: Vec::new(),
                resource: class.resource.clone(),
                line: f.line,
            }))
    }
}

impl DefinitionExtractor for StaticWorkspace {
    fn extract(
        &self,
        ctx: &dyn ClassContext,
        resource: &str,
    ) -> Result<Vec<AdviceDeclaration>, MatchFailure> {
        let Some(config) = self.configs.get(resource) else {
            return Ok(Vec::new());
        };
        if let Some(reason) = &config.parse_error {
            return Err(MatchFailure::other(format!("cannot read {resource}: {reason}")));
        }
        let mut declarations = Vec::new();
        for aspect in &config.aspects {
            declarations.extend(self.aspect_declarations(ctx, resource, aspect)?);
        }
        debug!(resource, project = ctx.project(), count = declarations.len(), "extracted advice");
        Ok(declarations)
    }
}

impl JoinPointMatcher for StaticWorkspace {
    fn type_matches(
        &self,
        ctx: &dyn ClassContext,
        declaration: &AdviceDeclaration,
        class: &ResolvedClass,
    ) -> Result<bool, MatchFailure> {
        let AdviceBody::Introduction { type_pattern, .. } = &declaration.body else {
            return Ok(false);
        };
        let pattern = TypePattern::parse(type_pattern, type_pattern)?;
        Ok(pattern.matches(&self.type_hierarchy(class, ctx.project())))
    }

    fn match_join_points(
        &self,
        _ctx: &dyn ClassContext,
        class: &ResolvedClass,
        bean: &BeanDefinition,
        declaration: &AdviceDeclaration,
        project: &str,
    ) -> Result<BTreeSet<ResolvedMember>, MatchFailure> {
        let AdviceBody::Advice { pointcut, .. } = &declaration.body else {
            return Ok(BTreeSet::new());
        };
        let pointcut = self.pointcut(pointcut)?;
        let descriptor = self
            .descriptor_of(class)
            .ok_or_else(|| MatchFailure::class_not_found(&class.name))?;
        let type_names = self.type_hierarchy(class, project);

        Ok(descriptor
            .methods
            .iter()
            .filter(|m| {
                pointcut.matches(&JoinPoint {
                    type_names: &type_names,
                    bean: &bean.name,
                    method: &m.name,
                    parameter_types: &m.parameter_types,
                })
            })
            .map(|m| ResolvedMember {
                kind: MemberKind::Method,
                declaring_class: class.name.clone(),
                name: m.name.clone(),
                parameter_types: m.parameter_types.clone(),
                resource: class.resource.clone(),
                line: m.line,
            })
            .collect())
    }
}
