//! Button detection module
//!
//! Reads raw frames from the watched interface, classifies each one and
//! emits a [`PressEvent`] for every ARP probe from a registered button.
//! Presses are not deduplicated here; that is the router's job.
//!
//! The read loop runs on a dedicated blocking thread. It wakes up at least
//! every `poll_interval_ms` to check its stop signal, so shutdown never
//! depends on traffic arriving.
//!
//! Requires root or CAP_NET_RAW.

pub mod pnet_listener;

use crate::config::CaptureConfig;
use crate::device::{DeviceRegistry, RegisteredDevice};
use crate::error::CaptureError;
use crate::filter::{self, Verdict};
use chrono::{DateTime, Local};
use pnet::datalink::NetworkInterface;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// A detected button press
#[derive(Debug, Clone)]
pub struct PressEvent {
    pub device: RegisteredDevice,
    /// Monotonic detection time, used for debouncing
    pub detected_at: Instant,
    /// Wall-clock detection time, for logs and actions
    pub timestamp: DateTime<Local>,
}

impl PressEvent {
    /// A press of `device` detected just now
    pub fn now(device: &RegisteredDevice) -> Self {
        Self::at(device, Instant::now())
    }

    /// A press of `device` detected at `detected_at`
    pub fn at(device: &RegisteredDevice, detected_at: Instant) -> Self {
        Self {
            device: device.clone(),
            detected_at,
            timestamp: Local::now(),
        }
    }
}

/// Trait for button listener implementations
#[async_trait::async_trait]
pub trait ButtonListener: Send {
    /// Start the capture loop
    /// Returns a channel receiver for detected presses. The channel closes
    /// when the loop ends, either after `stop` or on a capture error.
    async fn start(&mut self) -> Result<mpsc::Receiver<PressEvent>, CaptureError>;

    /// Stop the capture loop and release the capture handle
    /// Returns the error that ended the loop, if it ended on its own.
    async fn stop(&mut self) -> Result<(), CaptureError>;
}

/// A blocking source of raw link-layer frames
pub trait FrameSource: Send {
    /// Wait for the next frame
    ///
    /// `Ok(None)` means the read timed out without a frame and the caller
    /// should check for cancellation before reading again.
    fn next_frame(&mut self) -> Result<Option<&[u8]>, CaptureError>;
}

/// Factory function to create the capture-backed listener
///
/// Opens the capture handle immediately so permission problems surface at
/// startup rather than inside the read loop.
pub fn create_listener(
    interface: &NetworkInterface,
    config: &CaptureConfig,
    registry: DeviceRegistry,
) -> Result<Box<dyn ButtonListener>, CaptureError> {
    Ok(Box::new(pnet_listener::PnetListener::open(
        interface, config, registry,
    )?))
}

/// Main capture loop
///
/// Never blocks on the press channel: when the router falls behind, extra
/// presses are dropped so the stop signal is always seen within one read.
/// Runs until `stop_rx` fires (or its sender is dropped), the receiving end
/// of `tx` goes away, or the source fails. Only a source failure is an error.
pub fn capture_loop<S: FrameSource + ?Sized>(
    source: &mut S,
    registry: &DeviceRegistry,
    tx: &mpsc::Sender<PressEvent>,
    stop_rx: &mut oneshot::Receiver<()>,
) -> Result<(), CaptureError> {
    loop {
        // Check for stop signal (non-blocking)
        match stop_rx.try_recv() {
            Ok(_) | Err(oneshot::error::TryRecvError::Closed) => {
                tracing::debug!("Capture loop stopping");
                return Ok(());
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
        }

        let Some(frame) = source.next_frame()? else {
            continue;
        };

        match filter::classify(frame, registry) {
            Verdict::Press(device) => {
                tracing::trace!("ARP probe from {}", device);
                match tx.try_send(PressEvent::now(device)) {
                    Ok(()) => {}
                    // Router is behind: drop, never block
                    Err(mpsc::error::TrySendError::Full(event)) => {
                        tracing::debug!(
                            "Press channel full, dropping probe from {}",
                            event.device
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::debug!("Press receiver dropped, capture loop stopping");
                        return Ok(());
                    }
                }
            }
            Verdict::Unregistered(mac) => {
                tracing::trace!("Ignoring ARP probe from unregistered {}", mac);
            }
            _ => {}
        }
    }
}
