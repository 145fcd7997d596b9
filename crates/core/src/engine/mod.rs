//! Engine module for talking to the generation engine.
//!
//! This module provides the `Engine` trait and a client for ComfyUI-style
//! engines: graphs are submitted to `POST /prompt`, progress is read from
//! `GET /history/{id}` (with `GET /queue` to tell pending from unknown), and
//! health is probed with `GET /system_stats`.
//!
//! [`EngineProcess`] optionally owns the engine as a child process.

mod comfy;
mod config;
mod error;
mod process;
mod traits;
mod types;

pub use comfy::ComfyClient;
pub use config::{EngineConfig, LaunchConfig};
pub use error::EngineError;
pub use process::EngineProcess;
pub use traits::Engine;
pub use types::{
    EngineJobHandle, EngineResult, EngineStatus, OutputArtifact, OutputKind,
};
