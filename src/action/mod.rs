//! Press actions
//!
//! Each registered button has one action, run once per accepted press:
//! - log: record the press in the daemon log
//! - command: run a shell command with the press in its environment
//! - notify: desktop notification via notify-send
//! - webhook: POST the press as JSON
//!
//! Actions own their failures. The dispatch worker logs an error returned
//! from an action and moves on; nothing is retried.

pub mod command;
pub mod log;
pub mod notify;
pub mod webhook;

use crate::capture::PressEvent;
use crate::config::ActionConfig;
use crate::error::ActionError;
use std::sync::Arc;

/// Trait for press action implementations
#[async_trait::async_trait]
pub trait PressHandler: Send + Sync {
    /// Run the action for one press
    async fn on_press(&self, event: &PressEvent) -> Result<(), ActionError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Factory function that builds the handler for a button's action
pub fn create_handler(config: &ActionConfig) -> Arc<dyn PressHandler> {
    match config {
        ActionConfig::Log => Arc::new(log::LogAction),
        ActionConfig::Command {
            command,
            timeout_ms,
        } => Arc::new(command::CommandAction::new(command, *timeout_ms)),
        ActionConfig::Notify { title, body } => {
            Arc::new(notify::NotifyAction::new(title.as_deref(), body.as_deref()))
        }
        ActionConfig::Webhook {
            url,
            timeout_ms,
            bearer_token,
        } => Arc::new(webhook::WebhookAction::new(
            url,
            *timeout_ms,
            bearer_token.clone(),
        )),
    }
}

/// Expand `{button}`, `{mac}` and `{time}` placeholders
pub fn expand_template(template: &str, event: &PressEvent) -> String {
    template
        .replace("{button}", &event.device.name)
        .replace("{mac}", &event.device.mac.to_string())
        .replace("{time}", &event.timestamp.format("%H:%M:%S").to_string())
}
