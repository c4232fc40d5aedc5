//! Runtime helper subprocess manager
//!
//! Launches the device runtime helper that publishes bridge frames, as a
//! child process with automatic cleanup on drop. Restarts are scheduled
//! rather than slept on so the tick loop never stalls.

use std::time::{Duration, Instant};
use tokio::process::{Child, Command};

use crate::config::DeviceConfig;
use crate::error::DeviceError;

/// Manages the runtime helper process
pub struct BridgeSubprocess {
    child: Option<Child>,
    config: DeviceConfig,
    restart_at: Option<Instant>,
}

impl BridgeSubprocess {
    /// Create a new subprocess manager (does not start the process)
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            child: None,
            config: config.clone(),
            restart_at: None,
        }
    }

    /// Launch the helper.
    ///
    /// Runs: `<bridge_command...> --ip <listen_address> --port <port>`
    pub fn start(&mut self) -> Result<(), DeviceError> {
        if self.is_running() {
            return Ok(());
        }

        let (program, args) = self.config.bridge_command.split_first().ok_or_else(|| {
            DeviceError::BridgeSubprocess("No bridge command configured".to_string())
        })?;

        let child = Command::new(program)
            .args(args)
            .args(["--ip", &self.config.listen_address])
            .args(["--port", &self.config.port.to_string()])
            .kill_on_drop(true)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| {
                DeviceError::BridgeSubprocess(format!(
                    "Failed to launch runtime helper '{}': {}",
                    program, e
                ))
            })?;

        tracing::info!(
            "Runtime helper started (pid: {:?}, port: {})",
            child.id(),
            self.config.port,
        );

        self.child = Some(child);
        self.restart_at = None;
        Ok(())
    }

    /// Check if the subprocess is still running (non-blocking)
    pub fn is_running(&mut self) -> bool {
        match &mut self.child {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    tracing::warn!("Runtime helper exited with: {}", status);
                    self.child = None;
                    false
                }
                Err(e) => {
                    tracing::error!("Failed to check runtime helper status: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    /// Restart an exited helper once its restart delay has elapsed
    pub fn supervise(&mut self, now: Instant) {
        if !self.config.auto_restart || self.is_running() {
            return;
        }

        match self.restart_at {
            None => {
                tracing::info!(
                    "Runtime helper not running, restarting in {}s",
                    self.config.restart_delay_secs
                );
                self.restart_at = Some(now + Duration::from_secs(self.config.restart_delay_secs));
            }
            Some(at) if now >= at => {
                if let Err(e) = self.start() {
                    tracing::error!("Failed to restart runtime helper: {}", e);
                    self.restart_at = None;
                }
            }
            Some(_) => {}
        }
    }

    /// Stop the subprocess by killing it
    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::info!("Stopping runtime helper (pid: {:?})", child.id());
            let _ = child.start_kill();
        }
    }
}

impl Drop for BridgeSubprocess {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(command: &[&str]) -> DeviceConfig {
        DeviceConfig {
            auto_launch: true,
            bridge_command: command.iter().map(|s| s.to_string()).collect(),
            restart_delay_secs: 0,
            ..DeviceConfig::default()
        }
    }

    #[test]
    fn test_not_running_before_start() {
        let mut sp = BridgeSubprocess::new(&config(&["helper"]));
        assert!(!sp.is_running());
    }

    #[test]
    fn test_empty_command_fails() {
        let mut sp = BridgeSubprocess::new(&config(&[]));
        assert!(matches!(sp.start(), Err(DeviceError::BridgeSubprocess(_))));
    }

    #[tokio::test]
    async fn test_missing_program_fails() {
        let mut sp = BridgeSubprocess::new(&config(&["/nonexistent/gazecast-runtime-helper"]));
        assert!(sp.start().is_err());
        assert!(!sp.is_running());
    }

    #[tokio::test]
    async fn test_supervise_schedules_then_retries() {
        let mut sp = BridgeSubprocess::new(&config(&["/nonexistent/gazecast-runtime-helper"]));
        let now = Instant::now();

        sp.supervise(now);
        assert!(sp.restart_at.is_some());

        // Delay is zero, so the next pass attempts (and fails) the relaunch
        sp.supervise(now);
        assert!(sp.restart_at.is_none());
        assert!(!sp.is_running());
    }
}
