//! aspect-xref: incremental aspect cross-reference model and diagnostics.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod server;
