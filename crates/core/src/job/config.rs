//! Configuration for job execution.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::engine::OutputKind;
use crate::retry::RetryConfig;

/// Job execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Spacing between status polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Time allowed from submission to a terminal status, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Consecutive failed status requests tolerated before the job fails.
    #[serde(default = "default_max_poll_errors")]
    pub max_consecutive_poll_errors: u32,

    /// Consecutive polls that find the job neither queued nor finished
    /// before it is declared lost.
    #[serde(default = "default_lost_job_polls")]
    pub lost_job_polls: u32,

    /// Retry policy for submissions while the engine is unavailable.
    #[serde(default)]
    pub submit_retry: RetryConfig,

    /// Jobs admitted at once (waiting or running). 0 means unlimited.
    #[serde(default)]
    pub max_pending_jobs: usize,

    /// Output kinds republished to the destination.
    #[serde(default = "default_publish_kinds")]
    pub publish_kinds: Vec<OutputKind>,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_poll_errors() -> u32 {
    5
}

fn default_lost_job_polls() -> u32 {
    5
}

fn default_publish_kinds() -> Vec<OutputKind> {
    vec![OutputKind::Image, OutputKind::Video]
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
            max_consecutive_poll_errors: default_max_poll_errors(),
            lost_job_polls: default_lost_job_polls(),
            submit_retry: RetryConfig::default(),
            max_pending_jobs: 0,
            publish_kinds: default_publish_kinds(),
        }
    }
}

impl JobsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Sets the job timeout. The config counts whole seconds, so partial
    /// seconds round up and the timeout is never zero.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self.timeout_secs = secs.max(1);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_max_pending_jobs(mut self, limit: usize) -> Self {
        self.max_pending_jobs = limit;
        self
    }

    pub fn with_submit_retry(mut self, retry: RetryConfig) -> Self {
        self.submit_retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JobsConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert_eq!(config.lost_job_polls, 5);
        assert_eq!(config.max_pending_jobs, 0);
        assert_eq!(
            config.publish_kinds,
            vec![OutputKind::Image, OutputKind::Video]
        );
    }

    #[test]
    fn test_sub_second_timeout_rounds_up() {
        let config = JobsConfig::default().with_timeout(Duration::from_millis(100));
        assert_eq!(config.timeout(), Duration::from_secs(1));

        let config = JobsConfig::default().with_timeout(Duration::from_millis(2500));
        assert_eq!(config.timeout_secs, 3);

        let config = JobsConfig::default().with_timeout(Duration::ZERO);
        assert_eq!(config.timeout_secs, 1);

        let config = JobsConfig::default().with_timeout(Duration::from_secs(30));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_publish_audio_when_configured() {
        let config: JobsConfig =
            toml::from_str(r#"publish_kinds = ["image", "video", "audio"]"#).unwrap();
        assert!(config.publish_kinds.contains(&OutputKind::Audio));
    }
}
