//! Job runner: drives one request from inputs to published outputs.
//!
//! Requests run concurrently except for the submit + poll phase, which holds
//! the single engine slot:
//! - Input resolution: concurrent (per request and across requests)
//! - Submit + poll: sequential, in arrival order
//! - Output publishing: concurrent

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, Semaphore};
use tracing::{error, info, warn};

use crate::artifact::{ArtifactRef, ArtifactStore};
use crate::engine::{Engine, EngineJobHandle};
use crate::graph::{parameterize, ResolvedInputs, TemplateLibrary};
use crate::metrics::{ENGINE_SLOT_WAIT, JOBS_IN_FLIGHT, JOBS_TOTAL, JOB_DURATION};

use super::config::JobsConfig;
use super::error::JobError;
use super::outputs::OutputResolver;
use super::poller::{CompletionPoller, PollOutcome};
use super::submitter::JobSubmitter;
use super::types::{JobRequest, JobResult};

/// Counts an admitted job until dropped.
struct Admission<'a> {
    pending: &'a AtomicUsize,
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        JOBS_IN_FLIGHT.dec();
    }
}

/// Runs jobs against a single engine.
pub struct JobRunner {
    config: JobsConfig,
    store: Arc<ArtifactStore>,
    templates: Arc<TemplateLibrary>,
    submitter: JobSubmitter,
    poller: CompletionPoller,
    outputs: OutputResolver,

    // Runtime state
    engine_slot: Semaphore,
    pending: AtomicUsize,
    shutting_down: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

impl JobRunner {
    /// Create a runner. `output_root` is the engine's output directory.
    pub fn new(
        config: JobsConfig,
        engine: Arc<dyn Engine>,
        store: Arc<ArtifactStore>,
        templates: Arc<TemplateLibrary>,
        output_root: PathBuf,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            submitter: JobSubmitter::new(Arc::clone(&engine), config.submit_retry.clone()),
            poller: CompletionPoller::new(engine, config.poll_interval())
                .with_max_consecutive_errors(config.max_consecutive_poll_errors)
                .with_lost_job_polls(config.lost_job_polls),
            outputs: OutputResolver::new(
                Arc::clone(&store),
                output_root,
                config.publish_kinds.clone(),
            ),
            config,
            store,
            templates,
            engine_slot: Semaphore::new(1),
            pending: AtomicUsize::new(0),
            shutting_down: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &JobsConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    /// Jobs currently admitted.
    pub fn pending_jobs(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stops accepting jobs and cancels polling of in-flight ones.
    pub fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Job runner shutting down, {} job(s) in flight", self.pending_jobs());
        self.engine_slot.close();
        let _ = self.shutdown_tx.send(());
    }

    /// Runs a job to a terminal result. Never panics or returns an error:
    /// failures become a failed (or timed out) result for this caller.
    pub async fn run(&self, request: JobRequest) -> JobResult {
        let started = Instant::now();
        let mut engine_job_id = None;

        let result = match self.execute(&request, &mut engine_job_id).await {
            Ok((handle, outputs)) => {
                info!("Job {} completed with {} output(s)", request.job_id, outputs.len());
                JobResult::completed(&request.job_id, handle, outputs)
            }
            Err(e) => {
                match &e {
                    JobError::TimedOut { .. } | JobError::Busy { .. } | JobError::Cancelled => {
                        warn!("Job {} ended: {}", request.job_id, e)
                    }
                    _ => error!("Job {} failed: {}", request.job_id, e),
                }
                JobResult::from_error(&request.job_id, engine_job_id, &e)
            }
        };

        let status = result.status.as_str();
        JOBS_TOTAL.with_label_values(&[status]).inc();
        JOB_DURATION
            .with_label_values(&[status])
            .observe(started.elapsed().as_secs_f64());
        result
    }

    async fn execute(
        &self,
        request: &JobRequest,
        engine_job_id: &mut Option<EngineJobHandle>,
    ) -> Result<(EngineJobHandle, Vec<String>), JobError> {
        let _admission = self.admit()?;
        let mut cancel = self.shutdown_tx.subscribe();
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(JobError::Cancelled);
        }

        info!("Job {} admitted", request.job_id);
        let template = self.templates.select(request.template.as_deref())?;
        let inputs = self.resolve_inputs(request).await?;
        let graph = parameterize(&template, &inputs);

        let waiting = Instant::now();
        let permit = self
            .engine_slot
            .acquire()
            .await
            .map_err(|_| JobError::Cancelled)?;
        ENGINE_SLOT_WAIT.observe(waiting.elapsed().as_secs_f64());

        let handle = self.submitter.submit(&graph).await?;
        *engine_job_id = Some(handle.clone());
        info!(
            "Job {} running on engine as {} (template '{}')",
            request.job_id,
            handle,
            template.name()
        );

        let outcome = self
            .poller
            .await_completion(&handle, self.config.timeout(), &mut cancel)
            .await;
        drop(permit);

        match outcome {
            PollOutcome::Completed(result) => {
                let outputs = self
                    .outputs
                    .publish_all(&result, &request.destination)
                    .await?;
                Ok((handle, outputs))
            }
            PollOutcome::Failed(message) => Err(JobError::EngineFailed(message)),
            PollOutcome::TimedOut { .. } => Err(JobError::TimedOut {
                timeout_secs: self.config.timeout_secs,
            }),
            PollOutcome::Cancelled => Err(JobError::Cancelled),
        }
    }

    fn admit(&self) -> Result<Admission<'_>, JobError> {
        let limit = self.config.max_pending_jobs;
        let previous = self.pending.fetch_add(1, Ordering::SeqCst);
        if limit > 0 && previous >= limit {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(JobError::Busy { limit });
        }
        JOBS_IN_FLIGHT.inc();
        Ok(Admission {
            pending: &self.pending,
        })
    }

    async fn resolve_inputs(&self, request: &JobRequest) -> Result<ResolvedInputs, JobError> {
        let inputs = &request.inputs;
        let (audio, transcript, image) = tokio::try_join!(
            self.resolve_input("audio", &inputs.audio),
            self.resolve_input("transcript", &inputs.transcript),
            self.resolve_input("image", &inputs.image),
        )?;
        Ok(ResolvedInputs {
            audio,
            transcript,
            image,
        })
    }

    async fn resolve_input(&self, slot: &str, reference: &ArtifactRef) -> Result<PathBuf, JobError> {
        self.store
            .resolve(reference)
            .await
            .map_err(|e| JobError::from_input(slot, &reference.to_string(), e))
    }
}
