//! Desktop notification action
//!
//! - Linux: notify-send (libnotify)
//! - macOS: osascript (AppleScript)
//!
//! Title and body accept `{button}`, `{mac}` and `{time}` placeholders.

use super::{expand_template, PressHandler};
use crate::capture::PressEvent;
use crate::error::ActionError;
use std::process::Stdio;
use tokio::process::Command;

const DEFAULT_TITLE: &str = "Dashwatch";
const DEFAULT_BODY: &str = "{button} pressed at {time}";

/// Action that pops up a desktop notification
pub struct NotifyAction {
    title: String,
    body: String,
}

impl NotifyAction {
    pub fn new(title: Option<&str>, body: Option<&str>) -> Self {
        Self {
            title: title.unwrap_or(DEFAULT_TITLE).to_string(),
            body: body.unwrap_or(DEFAULT_BODY).to_string(),
        }
    }

    fn render(&self, event: &PressEvent) -> (String, String) {
        (
            expand_template(&self.title, event),
            expand_template(&self.body, event),
        )
    }
}

#[async_trait::async_trait]
impl PressHandler for NotifyAction {
    async fn on_press(&self, event: &PressEvent) -> Result<(), ActionError> {
        let (title, body) = self.render(event);
        send(&title, &body).await
    }

    fn name(&self) -> &'static str {
        "notify"
    }
}

/// Send a notification on Linux using notify-send
#[cfg(not(target_os = "macos"))]
async fn send(title: &str, body: &str) -> Result<(), ActionError> {
    let status = Command::new("notify-send")
        .args(["--app-name=Dashwatch", "--expire-time=4000", title, body])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| ActionError::SpawnFailed(format!("notify-send: {}", e)))?;

    if status.success() {
        Ok(())
    } else {
        Err(ActionError::NonZeroExit {
            code: status.code(),
            stderr: String::new(),
        })
    }
}

/// Send a notification on macOS using osascript
#[cfg(target_os = "macos")]
async fn send(title: &str, body: &str) -> Result<(), ActionError> {
    let escaped_title = title.replace('"', "\\\"");
    let escaped_body = body.replace('"', "\\\"");

    let script = format!(
        r#"display notification "{}" with title "{}""#,
        escaped_body, escaped_title
    );

    let status = Command::new("osascript")
        .args(["-e", &script])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| ActionError::SpawnFailed(format!("osascript: {}", e)))?;

    if status.success() {
        Ok(())
    } else {
        Err(ActionError::NonZeroExit {
            code: status.code(),
            stderr: String::new(),
        })
    }
}
