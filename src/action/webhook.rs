//! Webhook action
//!
//! POSTs each press as JSON to a URL, for handing presses to a home
//! automation server or a voice-assistant bridge:
//!
//! ```json
//! {"button": "puffer-button", "mac": "ac:63:be:fb:13:9d", "pressed_at": "2016-11-02T07:31:12+01:00"}
//! ```
//!
//! ureq is blocking, so the request runs on the blocking pool.

use super::PressHandler;
use crate::capture::PressEvent;
use crate::error::ActionError;
use std::time::Duration;

/// Action that POSTs the press to an HTTP endpoint
#[derive(Debug)]
pub struct WebhookAction {
    url: String,
    timeout: Duration,
    /// Optional bearer token for authentication
    bearer_token: Option<String>,
}

impl WebhookAction {
    pub fn new(url: &str, timeout_ms: u64, bearer_token: Option<String>) -> Self {
        Self {
            url: url.to_string(),
            timeout: Duration::from_millis(timeout_ms),
            bearer_token,
        }
    }
}

/// JSON body sent for a press
pub fn payload(event: &PressEvent) -> serde_json::Value {
    serde_json::json!({
        "button": &*event.device.name,
        "mac": event.device.mac.to_string(),
        "pressed_at": event.timestamp.to_rfc3339(),
    })
}

#[async_trait::async_trait]
impl PressHandler for WebhookAction {
    async fn on_press(&self, event: &PressEvent) -> Result<(), ActionError> {
        let body = payload(event);
        let url = self.url.clone();
        let timeout = self.timeout;
        let bearer_token = self.bearer_token.clone();

        let status = tokio::task::spawn_blocking(move || {
            let mut request = ureq::post(&url).timeout(timeout);

            // Add authorization if a token is configured
            if let Some(ref token) = bearer_token {
                request = request.set("Authorization", &format!("Bearer {}", token));
            }

            request.send_json(body).map(|resp| resp.status()).map_err(|e| match e {
                ureq::Error::Status(code, resp) => {
                    let body = resp.into_string().unwrap_or_default();
                    ActionError::Http(format!("server returned {}: {}", code, body.trim()))
                }
                ureq::Error::Transport(t) => ActionError::Http(t.to_string()),
            })
        })
        .await
        .map_err(|e| ActionError::Http(format!("request task failed: {}", e)))??;

        tracing::debug!("Webhook for {} returned {}", event.device.name, status);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
