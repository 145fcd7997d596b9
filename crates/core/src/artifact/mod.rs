//! Artifact module for resolving inputs and republishing outputs.
//!
//! Artifacts are addressed by [`ArtifactRef`]: either a local filesystem path
//! or an object in a remote bucket. [`ArtifactStore`] gives a uniform
//! get/put over both, with a local cache for remote inputs.
//!
//! # Features
//!
//! - Local references are validated and returned unchanged
//! - Remote references are downloaded once into `<cache_dir>/<bucket>/<key>`
//! - Bounded retries with exponential backoff for transfers
//! - Outputs published remotely come back as presigned URLs
//! - Outputs published locally are moved (with copy fallback across devices)
//!
//! # Example
//!
//! ```ignore
//! use graphrelay_core::artifact::{ArtifactRef, ArtifactStore, AwsCliStore, StorageConfig};
//!
//! let remote = Arc::new(AwsCliStore::with_defaults());
//! let store = ArtifactStore::new(StorageConfig::default(), Some(remote));
//!
//! let audio = store.resolve(&"s3://inputs/t1/audio.wav".parse()?).await?;
//! let url = store.publish(&output_path, &"s3://results/t1".parse()?).await?;
//! ```

mod aws_cli;
mod config;
mod error;
mod store;
mod traits;
mod types;

pub use aws_cli::AwsCliStore;
pub use config::{AwsCliConfig, StorageConfig};
pub use error::ArtifactError;
pub use store::ArtifactStore;
pub use traits::ObjectStore;
pub use types::{ArtifactRef, SyncReport};
