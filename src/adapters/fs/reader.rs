use crate::adapters::workspace::{StaticWorkspace, WorkspaceDescriptor};
use anyhow::{Context, Result};
use std::path::Path;

/// Reads workspace descriptions from disk
pub struct WorkspaceReader;

impl WorkspaceReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, path: &Path) -> Result<WorkspaceDescriptor> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workspace file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse workspace file: {}", path.display()))
    }

    pub fn load(&self, path: &Path) -> Result<StaticWorkspace> {
        let descriptor = self.read(path)?;
        StaticWorkspace::new(descriptor)
            .with_context(|| format!("Invalid workspace: {}", path.display()))
    }
}

impl Default for WorkspaceReader {
    fn default() -> Self {
        Self::new()
    }
}
