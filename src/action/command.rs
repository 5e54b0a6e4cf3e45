//! Shell command action
//!
//! Runs a command through `sh -c` for every accepted press, e.g. a script
//! that fetches a sensor reading and speaks it.
//!
//! # Example Configuration
//!
//! ```toml
//! [button.action]
//! type = "command"
//! command = "puffer speak --language en"
//! timeout_ms = 30000
//! ```
//!
//! The press is exported to the child as `DASHWATCH_BUTTON`,
//! `DASHWATCH_MAC` and `DASHWATCH_PRESSED_AT` (RFC 3339).

use super::PressHandler;
use crate::capture::PressEvent;
use crate::error::ActionError;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Action that runs an external command
pub struct CommandAction {
    command: String,
    timeout: Duration,
}

impl CommandAction {
    pub fn new(command: &str, timeout_ms: u64) -> Self {
        Self {
            command: command.to_string(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Run the command and return its trimmed stdout
    async fn execute(&self, event: &PressEvent) -> Result<String, ActionError> {
        // Spawn command via shell for proper parsing of complex commands
        let child = Command::new("sh")
            .args(["-c", &self.command])
            .env("DASHWATCH_BUTTON", &*event.device.name)
            .env("DASHWATCH_MAC", event.device.mac.to_string())
            .env("DASHWATCH_PRESSED_AT", event.timestamp.to_rfc3339())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ActionError::SpawnFailed(e.to_string()))?;

        // Wait for completion with timeout; the child is killed if we give up
        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ActionError::Timeout(self.timeout.as_millis() as u64))?
            .map_err(|e| ActionError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ActionError::NonZeroExit {
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait::async_trait]
impl PressHandler for CommandAction {
    async fn on_press(&self, event: &PressEvent) -> Result<(), ActionError> {
        let stdout = self.execute(event).await?;
        if !stdout.is_empty() {
            tracing::debug!("{}: {}", event.device.name, stdout);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RegisteredDevice;
    use pnet::datalink::MacAddr;
    use std::sync::Arc;

    fn event() -> PressEvent {
        PressEvent::now(&RegisteredDevice {
            name: Arc::from("puffer-button"),
            mac: MacAddr::new(0xac, 0x63, 0xbe, 0xfb, 0x13, 0x9d),
        })
    }

    #[tokio::test]
    async fn test_success() {
        let action = CommandAction::new("true", 5000);
        assert!(action.on_press(&event()).await.is_ok());
    }

    #[tokio::test]
    async fn test_press_exported_to_environment() {
        let action = CommandAction::new("echo \"$DASHWATCH_BUTTON $DASHWATCH_MAC\"", 5000);
        let stdout = action.execute(&event()).await.unwrap();
        assert_eq!(stdout, "puffer-button ac:63:be:fb:13:9d");
    }

    #[tokio::test]
    async fn test_pressed_at_is_rfc3339() {
        let action = CommandAction::new("echo \"$DASHWATCH_PRESSED_AT\"", 5000);
        let stdout = action.execute(&event()).await.unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&stdout).is_ok());
    }

    #[tokio::test]
    async fn test_timeout() {
        let action = CommandAction::new("sleep 10", 100);
        let err = action.on_press(&event()).await.unwrap_err();
        assert!(matches!(err, ActionError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let action = CommandAction::new("echo oops >&2; exit 3", 5000);
        let err = action.on_press(&event()).await.unwrap_err();
        match err {
            ActionError::NonZeroExit { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_command_not_found() {
        // sh reports 127 for a missing command
        let action = CommandAction::new("nonexistent_command_xyz_12345", 5000);
        let err = action.on_press(&event()).await.unwrap_err();
        assert!(matches!(err, ActionError::NonZeroExit { code: Some(127), .. }));
    }
}
