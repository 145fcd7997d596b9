//! Job execution.
//!
//! A job takes three input artifacts and a destination, runs one
//! parameterized graph on the engine, and publishes the engine's outputs:
//!
//! 1. Resolve inputs to local paths ([`ArtifactStore`](crate::artifact::ArtifactStore))
//! 2. Parameterize the selected template
//! 3. Submit ([`JobSubmitter`]) and poll ([`CompletionPoller`]) while holding
//!    the engine slot
//! 4. Publish outputs ([`OutputResolver`])
//!
//! [`JobRunner`] ties the steps together and always produces a [`JobResult`].

mod config;
mod error;
mod outputs;
mod poller;
mod runner;
mod submitter;
mod types;

pub use config::JobsConfig;
pub use error::{JobError, JobErrorKind};
pub use outputs::OutputResolver;
pub use poller::{CompletionPoller, PollOutcome};
pub use runner::JobRunner;
pub use submitter::JobSubmitter;
pub use types::{JobInputs, JobRequest, JobResult, JobStatus};
