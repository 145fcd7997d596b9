pub mod artifact;
pub mod config;
pub mod engine;
pub mod graph;
pub mod job;
pub mod metrics;
pub mod model_sync;
pub mod readiness;
pub mod retry;
pub mod testing;

pub use artifact::{
    ArtifactError, ArtifactRef, ArtifactStore, AwsCliConfig, AwsCliStore, ObjectStore,
    StorageConfig, SyncReport,
};
pub use config::{
    config_path, load_config, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig, ServerConfig,
};
pub use engine::{
    ComfyClient, Engine, EngineConfig, EngineError, EngineJobHandle, EngineProcess, EngineResult,
    EngineStatus, LaunchConfig, OutputArtifact, OutputKind,
};
pub use graph::{
    parameterize, GraphConfig, GraphError, GraphInstance, GraphNode, GraphTemplate, InputSlot,
    ResolvedInputs, SlotInputs, TemplateLibrary,
};
pub use job::{
    CompletionPoller, JobError, JobErrorKind, JobInputs, JobRequest, JobResult, JobRunner,
    JobStatus, JobSubmitter, JobsConfig, OutputResolver, PollOutcome,
};
pub use model_sync::{ModelSync, ModelSyncConfig, SyncOutcome};
pub use readiness::{ReadinessConfig, ReadinessError, ReadinessGate, ReadinessState};
pub use retry::{retry_async, RetryConfig, Retryable};
