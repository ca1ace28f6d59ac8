//! Multi-provider translation of captured text.
//!
//! A submission fans out to every enabled provider at once; results are shown
//! in a fixed provider order as they arrive, stale submissions are fenced out
//! by generation, and each completed request lands in a bounded history.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod presentation;
pub mod state;

pub use application::orchestrator::{OrchestratorDeps, OrchestratorEvent, RequestOrchestrator, ViewState};
pub use domain::error::MtError;
