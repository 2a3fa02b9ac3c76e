//! Static workspace adapter
//!
//! Serves the configuration model, type resolver, definition extractor and
//! matching ports from a JSON workspace description.

mod adapter;
pub mod descriptor;
pub mod pointcut;

pub use adapter::StaticWorkspace;
pub use descriptor::WorkspaceDescriptor;
