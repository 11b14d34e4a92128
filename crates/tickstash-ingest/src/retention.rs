//! Scheduled invocation of the index retention tool.
//!
//! The tool (Elasticsearch Curator by default) is run as
//! `<command> --config <config_path> <action_path>` once per interval,
//! starting one interval after startup. At startup the job only asks the
//! tool for its version. Output goes to the log: stdout at `info`, stderr
//! at `error`. Nothing the tool does can stop the bridge.

use std::process::ExitStatus;

use tickstash_core::config::RetentionConfig;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::error::RetentionError;

/// Captured result of one tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    /// Exit status.
    pub status: ExitStatus,
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

/// The retention schedule and how to invoke the tool.
#[derive(Debug, Clone)]
pub struct RetentionJob {
    config: RetentionConfig,
}

impl RetentionJob {
    /// Create a job from its settings.
    pub const fn new(config: RetentionConfig) -> Self {
        Self { config }
    }

    fn command_name(&self) -> String {
        self.config.command.display().to_string()
    }

    /// Run the tool with `--version`.
    pub async fn version(&self) -> Result<ToolOutput, RetentionError> {
        let mut command = Command::new(&self.config.command);
        command.arg("--version");
        self.execute(command).await
    }

    /// Run the tool once against the configured files.
    pub async fn run_once(&self) -> Result<ToolOutput, RetentionError> {
        let mut command = Command::new(&self.config.command);
        command
            .arg("--config")
            .arg(&self.config.config_path)
            .arg(&self.config.action_path);
        self.execute(command).await
    }

    async fn execute(&self, mut command: Command) -> Result<ToolOutput, RetentionError> {
        let output = command
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RetentionError::Spawn {
                command: self.command_name(),
                source,
            })?;
        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Start the background schedule.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            log_result("retention tool version", self.version().await);

            let period = self.config.interval();
            let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                command = self.command_name(),
                interval_secs = self.config.interval_secs,
                "retention schedule started"
            );

            loop {
                ticker.tick().await;
                info!("running retention tool");
                log_result("retention run", self.run_once().await);
            }
        })
    }
}

fn log_result(what: &str, result: Result<ToolOutput, RetentionError>) {
    let output = match result {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, "{what} failed to start");
            return;
        }
    };

    let stdout = output.stdout.trim();
    if !stdout.is_empty() {
        info!("{what}: {stdout}");
    }
    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        error!("{what}: {stderr}");
    }
    if !output.status.success() {
        warn!(status = %output.status, "{what} exited unsuccessfully");
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn job(command: &str) -> RetentionJob {
        RetentionJob::new(RetentionConfig {
            command: PathBuf::from(command),
            ..RetentionConfig::default()
        })
    }

    #[tokio::test]
    async fn run_passes_config_then_action_file() {
        let output = job("echo").run_once().await.unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout.trim(), "--config ./curator.yml ./curator-action.yml");
        assert!(output.stderr.is_empty());
    }

    #[tokio::test]
    async fn version_query_runs_the_tool() {
        let output = job("echo").version().await.unwrap();
        assert!(output.status.success());
        assert!(!output.stdout.trim().is_empty());
    }

    #[tokio::test]
    async fn failing_tool_is_reported_not_raised() {
        let output = job("false").run_once().await.unwrap();
        assert!(!output.status.success());
        log_result("retention run", Ok(output));
    }

    #[tokio::test]
    async fn missing_tool_is_a_spawn_error() {
        let result = job("/nonexistent/curator").run_once().await;
        assert!(matches!(result, Err(RetentionError::Spawn { .. })));
        log_result("retention run", result);
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_survives_tool_failures() {
        let mut retention = job("/nonexistent/curator");
        retention.config.interval_secs = 1;
        let handle = retention.spawn();
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }
}
