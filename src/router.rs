//! Debounce and dispatch
//!
//! The router takes every press the capture loop reports, drops the ones
//! inside a button's cool-down window and hands the rest to that button's
//! dispatch worker.
//!
//! Each button has exactly one worker task fed by a single-slot channel, so
//! at most one action runs per button at a time and a flood of forged probes
//! cannot pile up work. The router only ever `try_send`s, which keeps the
//! capture path free of handler latency.

use crate::action::PressHandler;
use crate::capture::PressEvent;
use crate::debounce::{Debouncer, Decision};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What the router did with a press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Handed to the button's worker
    Dispatched,
    /// Dropped inside the cool-down window
    Suppressed { since_last: Duration },
    /// Accepted, but the previous action for this button is still running
    /// and one more is already queued
    HandlerBusy,
    /// No handler is registered for this button
    Unhandled,
}

struct DispatchSlot {
    handler_name: &'static str,
    tx: mpsc::Sender<PressEvent>,
    worker: JoinHandle<()>,
}

/// Routes presses to per-button workers
pub struct Router {
    debouncer: Debouncer,
    slots: HashMap<Arc<str>, DispatchSlot>,
}

impl Router {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(cooldown),
            slots: HashMap::new(),
        }
    }

    /// Bind a handler to a button and start its worker
    ///
    /// Must be called from within a tokio runtime. Registering the same
    /// button twice replaces the earlier handler.
    pub fn register(&mut self, device: Arc<str>, handler: Arc<dyn PressHandler>) {
        let (tx, rx) = mpsc::channel(1);
        let handler_name = handler.name();
        let worker = tokio::spawn(dispatch_worker(Arc::clone(&device), handler, rx));
        // Dropping a replaced slot closes its channel and ends its worker
        self.slots.insert(
            device,
            DispatchSlot {
                handler_name,
                tx,
                worker,
            },
        );
    }

    pub fn cooldown(&self) -> Duration {
        self.debouncer.cooldown()
    }

    /// Name of the action bound to `device`
    pub fn handler_name(&self, device: &str) -> Option<&'static str> {
        self.slots.get(device).map(|slot| slot.handler_name)
    }

    /// Debounce one press and dispatch it if accepted
    pub fn route(&mut self, event: PressEvent) -> RouteOutcome {
        let Some(slot) = self.slots.get(&event.device.name) else {
            return RouteOutcome::Unhandled;
        };

        match self.debouncer.offer(&event.device.name, event.detected_at) {
            Decision::Suppress { since_last } => RouteOutcome::Suppressed { since_last },
            Decision::Accept => match slot.tx.try_send(event) {
                Ok(()) => RouteOutcome::Dispatched,
                Err(mpsc::error::TrySendError::Full(_)) => RouteOutcome::HandlerBusy,
                // Worker gone (panicked action); nothing left to run it
                Err(mpsc::error::TrySendError::Closed(_)) => RouteOutcome::Unhandled,
            },
        }
    }

    /// Stop accepting presses
    ///
    /// Workers finish the action they are running and whatever is already
    /// queued, then exit. They are not awaited.
    pub fn shutdown(self) -> Vec<JoinHandle<()>> {
        self.slots
            .into_values()
            .map(|slot| {
                drop(slot.tx);
                slot.worker
            })
            .collect()
    }
}

/// Runs one button's actions, one at a time, in detection order
async fn dispatch_worker(
    device: Arc<str>,
    handler: Arc<dyn PressHandler>,
    mut rx: mpsc::Receiver<PressEvent>,
) {
    while let Some(event) = rx.recv().await {
        tracing::debug!("Running {} action for {}", handler.name(), device);
        if let Err(e) = handler.on_press(&event).await {
            tracing::warn!("{} action for {} failed: {}", handler.name(), device, e);
        }
    }
    tracing::trace!("Dispatch worker for {} exiting", device);
}
