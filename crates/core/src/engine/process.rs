//! Engine child process owned by this service.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{info, warn};

use super::config::LaunchConfig;
use super::error::EngineError;

/// A running engine process.
///
/// The process is killed when this value is dropped.
pub struct EngineProcess {
    child: Child,
    stop_timeout: Duration,
}

impl EngineProcess {
    /// Starts the engine. Its stdout and stderr are inherited.
    pub fn spawn(config: &LaunchConfig) -> Result<Self, EngineError> {
        let mut command = Command::new(&config.program);
        command
            .args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(ref dir) = config.working_dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::Launch(format!("program not found: {}", config.program.display()))
            } else {
                EngineError::Launch(e.to_string())
            }
        })?;

        info!(
            "Started engine process {:?} (pid {:?})",
            config.program,
            child.id()
        );

        Ok(Self {
            child,
            stop_timeout: Duration::from_secs(config.stop_timeout_secs),
        })
    }

    /// OS process id, if the process has not been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Returns the exit code if the process has already exited.
    pub fn try_exit_code(&mut self) -> Option<Option<i32>> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(status.code()),
            _ => None,
        }
    }

    /// Kills the process and waits for it to exit.
    pub async fn stop(mut self) {
        if let Ok(Some(status)) = self.child.try_wait() {
            info!("Engine process already exited with {}", status);
            return;
        }

        if let Err(e) = self.child.start_kill() {
            warn!("Failed to kill engine process: {}", e);
            return;
        }

        match tokio::time::timeout(self.stop_timeout, self.child.wait()).await {
            Ok(Ok(status)) => info!("Engine process stopped ({})", status),
            Ok(Err(e)) => warn!("Failed to reap engine process: {}", e),
            Err(_) => warn!(
                "Engine process did not exit within {:?} after kill",
                self.stop_timeout
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program() {
        let err = EngineProcess::spawn(&LaunchConfig::new("/nonexistent/engine-binary"))
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Launch(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_and_stop() {
        let mut process = EngineProcess::spawn(&LaunchConfig::new("sleep").with_args(["30"]))
            .unwrap();
        assert!(process.id().is_some());
        assert_eq!(process.try_exit_code(), None);
        process.stop().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_of_finished_process() {
        let mut process =
            EngineProcess::spawn(&LaunchConfig::new("sh").with_args(["-c", "exit 3"])).unwrap();
        let mut code = None;
        for _ in 0..100 {
            code = process.try_exit_code();
            if code.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(code, Some(Some(3)));
    }
}
