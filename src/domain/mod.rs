pub mod element;
pub mod advice;
pub mod edge;
pub mod config;
pub mod failure;
pub mod ports;
pub mod definitions;
pub mod walker;
pub mod matcher;
pub mod model;
pub mod pass;
pub mod xref_graph;
pub mod diagnostics;
pub mod reconcile;
