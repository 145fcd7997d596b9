//! Model sync module.
//!
//! Best-effort, one-shot mirroring of a remote model prefix into the local
//! model directory at process start, before the engine is launched. Failure
//! is never fatal: the engine starts with whatever models are already on
//! disk.

mod config;
mod sync;

pub use config::ModelSyncConfig;
pub use sync::{ModelSync, SyncOutcome};
