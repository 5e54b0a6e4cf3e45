//! Daemon module - main event loop orchestration
//!
//! Resolves the interface, opens the capture, binds each button to its
//! action and routes presses until SIGINT/SIGTERM or a capture failure.

use crate::action;
use crate::capture::{self, PressEvent};
use crate::config::Config;
use crate::device::DeviceRegistry;
use crate::error::{CaptureError, DashwatchError, Result};
use crate::interface;
use crate::router::{RouteOutcome, Router};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};

/// Warn when raw capture is likely to be refused
fn check_privileges() {
    // SAFETY: geteuid has no preconditions and cannot fail
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        tracing::warn!(
            "Not running as root (euid={}). Capture needs CAP_NET_RAW unless granted via setcap.",
            euid
        );
    }
}

/// Main daemon that orchestrates all components
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a new daemon with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build the registry, refusing to watch for nothing
    fn registry(&self) -> Result<DeviceRegistry> {
        let registry = DeviceRegistry::from_config(&self.config.buttons)?;
        if registry.is_empty() {
            return Err(DashwatchError::NoButtons);
        }
        Ok(registry)
    }

    /// Run one button's action once, as if it had been pressed
    pub async fn trigger(&self, button: &str) -> Result<()> {
        let registry = DeviceRegistry::from_config(&self.config.buttons)?;
        let device = registry
            .by_name(button)
            .ok_or_else(|| DashwatchError::UnknownButton(button.to_string()))?;
        let action_config = self
            .config
            .buttons
            .iter()
            .find(|b| b.name == button)
            .map(|b| b.action.clone())
            .unwrap_or_default();

        let handler = action::create_handler(&action_config);
        tracing::info!("Running {} action for {}", handler.name(), device);
        handler.on_press(&PressEvent::now(device)).await?;
        Ok(())
    }

    /// Run the daemon main loop
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Starting dashwatch daemon");
        check_privileges();

        let registry = self.registry()?;

        // Startup-fatal: interface missing or misconfigured
        let (iface, subnet) = interface::resolve(
            &self.config.capture.interface,
            self.config.capture.subnet_policy(),
        )?;
        tracing::info!(
            "Using network range {} for interface {}",
            subnet,
            iface.name
        );

        // Set up signal handlers
        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
            DashwatchError::Config(format!("Failed to set up SIGTERM handler: {}", e))
        })?;

        // Bind each button to its action
        let mut router = Router::new(self.config.debounce.cooldown());
        for button in &self.config.buttons {
            let Some(device) = registry.by_name(&button.name) else {
                continue;
            };
            router.register(
                Arc::clone(&device.name),
                action::create_handler(&button.action),
            );
            tracing::info!("Watching {} -> {} action", device, button.action.kind());
        }
        tracing::info!(
            "Cool-down window: {:.1}s",
            router.cooldown().as_secs_f32()
        );

        // Startup-fatal: capture handle cannot be opened
        let mut listener = capture::create_listener(&iface, &self.config.capture, registry)?;
        let mut presses = listener.start().await?;

        // Main event loop
        loop {
            tokio::select! {
                event = presses.recv() => {
                    let Some(event) = event else {
                        // Capture loop ended on its own: the handle is dead
                        let result = listener.stop().await;
                        drop(router.shutdown());
                        return Err(match result {
                            Err(e) => e.into(),
                            Ok(()) => CaptureError::TaskFailed(
                                "capture loop exited unexpectedly".to_string(),
                            )
                            .into(),
                        });
                    };
                    log_outcome(&event, router.route(event.clone()));
                }

                // Handle graceful shutdown (SIGINT from Ctrl+C)
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT, shutting down...");
                    break;
                }

                // Handle graceful shutdown (SIGTERM from systemctl stop)
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down...");
                    break;
                }
            }
        }

        // Cleanup: release the capture handle; running actions finish on their own.
        // Closing the receiver first unblocks a capture thread stuck on a full channel.
        drop(presses);
        listener.stop().await?;
        drop(router.shutdown());

        tracing::info!("Daemon stopped");

        Ok(())
    }
}

fn log_outcome(event: &PressEvent, outcome: RouteOutcome) {
    match outcome {
        RouteOutcome::Dispatched => {
            tracing::info!("Button pressed: {}", event.device);
        }
        RouteOutcome::Suppressed { since_last } => {
            tracing::debug!(
                "Suppressed repeat from {} ({:.2}s after last press)",
                event.device.name,
                since_last.as_secs_f32()
            );
        }
        RouteOutcome::HandlerBusy => {
            tracing::warn!(
                "Dropped press of {}: previous action still running",
                event.device.name
            );
        }
        RouteOutcome::Unhandled => {
            tracing::warn!("No action bound for {}", event.device.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActionConfig, ButtonConfig};

    fn config_with(buttons: Vec<ButtonConfig>) -> Config {
        Config {
            buttons,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_run_refuses_without_buttons() {
        let mut daemon = Daemon::new(Config::default());
        let err = daemon.run().await.unwrap_err();
        assert!(matches!(err, DashwatchError::NoButtons));
    }

    #[tokio::test]
    async fn test_run_fails_fast_on_missing_interface() {
        let mut config = config_with(vec![ButtonConfig {
            name: "puffer-button".to_string(),
            mac: "ac:63:be:fb:13:9d".to_string(),
            action: ActionConfig::Log,
        }]);
        config.capture.interface = "definitely-not-an-interface0".to_string();
        let mut daemon = Daemon::new(config);
        let err = daemon.run().await.unwrap_err();
        assert!(matches!(
            err,
            DashwatchError::Interface(crate::error::InterfaceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_trigger_runs_action() {
        let daemon = Daemon::new(config_with(vec![ButtonConfig {
            name: "puffer-button".to_string(),
            mac: "ac:63:be:fb:13:9d".to_string(),
            action: ActionConfig::Command {
                command: "test \"$DASHWATCH_BUTTON\" = puffer-button".to_string(),
                timeout_ms: 5000,
            },
        }]));
        daemon.trigger("puffer-button").await.unwrap();
    }

    #[tokio::test]
    async fn test_trigger_unknown_button() {
        let daemon = Daemon::new(Config::default());
        let err = daemon.trigger("nope").await.unwrap_err();
        assert!(matches!(err, DashwatchError::UnknownButton(ref n) if n == "nope"));
    }

    #[tokio::test]
    async fn test_trigger_surfaces_action_failure() {
        let daemon = Daemon::new(config_with(vec![ButtonConfig {
            name: "broken".to_string(),
            mac: "00:11:22:33:44:55".to_string(),
            action: ActionConfig::Command {
                command: "exit 1".to_string(),
                timeout_ms: 5000,
            },
        }]));
        let err = daemon.trigger("broken").await.unwrap_err();
        assert!(matches!(err, DashwatchError::Action(_)));
    }
}
