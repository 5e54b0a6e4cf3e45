//! Log-only action, the default when a button has no action configured

use super::PressHandler;
use crate::capture::PressEvent;
use crate::error::ActionError;

pub struct LogAction;

#[async_trait::async_trait]
impl PressHandler for LogAction {
    async fn on_press(&self, event: &PressEvent) -> Result<(), ActionError> {
        tracing::info!(
            "{} pressed at {}",
            event.device,
            event.timestamp.format("%H:%M:%S")
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
