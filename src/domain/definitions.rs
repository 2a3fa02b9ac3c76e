use crate::domain::advice::AdviceDeclaration;
use crate::domain::element::ResourcePath;
use crate::domain::failure::MatchFailure;
use crate::domain::ports::{DefinitionExtractor, TypeResolver};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-pass memo of advice declarations by file.
///
/// A new cache is created for every build request, so edits between passes
/// are always picked up. Extraction failures are not cached and propagate to
/// the caller.
pub struct AspectDefinitionCache<'a> {
    extractor: &'a dyn DefinitionExtractor,
    resolver: &'a dyn TypeResolver,
    entries: HashMap<ResourcePath, Arc<[AdviceDeclaration]>>,
}

impl<'a> AspectDefinitionCache<'a> {
    pub fn new(extractor: &'a dyn DefinitionExtractor, resolver: &'a dyn TypeResolver) -> Self {
        Self {
            extractor,
            resolver,
            entries: HashMap::new(),
        }
    }

    /// Declarations of `resource`, extracted under `project`'s class context on first use.
    pub fn definitions_for(
        &mut self,
        project: &str,
        resource: &str,
    ) -> Result<Arc<[AdviceDeclaration]>, MatchFailure> {
        if let Some(cached) = self.entries.get(resource) {
            return Ok(cached.clone());
        }
        let ctx = self.resolver.enter(project)?;
        let declarations: Arc<[AdviceDeclaration]> =
            self.extractor.extract(ctx.as_ref(), resource)?.into();
        self.entries
            .insert(resource.to_string(), declarations.clone());
        Ok(declarations)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
