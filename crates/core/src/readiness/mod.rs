//! Readiness module gating job acceptance on engine health.
//!
//! The gate moves `Starting -> Probing{attempt} -> Ready`, or ends in
//! `Failed` once the attempt budget is spent. A failed gate is fatal for the
//! process: the caller must not start serving and must stop an engine it owns.
//! State changes are broadcast through a `watch` channel.

mod config;
mod gate;
mod types;

pub use config::ReadinessConfig;
pub use gate::ReadinessGate;
pub use types::{ReadinessError, ReadinessState};
