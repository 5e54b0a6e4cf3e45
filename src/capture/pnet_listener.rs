//! pnet-based button listener
//!
//! Opens a promiscuous AF_PACKET channel on the watched interface and runs
//! the capture loop on a blocking thread. pnet's read timeout turns the
//! otherwise unbounded blocking read into one that periodically returns,
//! which is what lets the loop notice its stop signal.

use super::{capture_loop, ButtonListener, FrameSource, PressEvent};
use crate::config::CaptureConfig;
use crate::device::DeviceRegistry;
use crate::error::CaptureError;
use pnet::datalink::{self, Channel, DataLinkReceiver, NetworkInterface};
use std::io::ErrorKind;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Capacity of the press channel between the capture thread and the router
const PRESS_CHANNEL_CAPACITY: usize = 64;

/// Frame source backed by a pnet datalink receiver
pub struct PnetSource {
    rx: Box<dyn DataLinkReceiver>,
}

impl FrameSource for PnetSource {
    fn next_frame(&mut self) -> Result<Option<&[u8]>, CaptureError> {
        match self.rx.next() {
            Ok(frame) => Ok(Some(frame)),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(CaptureError::Read(e)),
        }
    }
}

/// pnet-based button listener
pub struct PnetListener {
    interface_name: String,
    registry: DeviceRegistry,
    /// Open capture handle, until the loop takes ownership of it
    source: Option<PnetSource>,
    /// Signal to stop the capture task
    stop_signal: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), CaptureError>>>,
}

impl PnetListener {
    /// Open a capture handle on `interface`
    pub fn open(
        interface: &NetworkInterface,
        config: &CaptureConfig,
        registry: DeviceRegistry,
    ) -> Result<Self, CaptureError> {
        let channel_config = datalink::Config {
            read_buffer_size: config.snaplen,
            read_timeout: Some(config.poll_interval()),
            promiscuous: config.promiscuous,
            ..Default::default()
        };

        let rx = match datalink::channel(interface, channel_config) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => return Err(CaptureError::UnsupportedChannel(interface.name.clone())),
            Err(source) => {
                return Err(CaptureError::Open {
                    interface: interface.name.clone(),
                    source,
                })
            }
        };

        tracing::debug!(
            "Opened capture on {} (snaplen={}, promiscuous={}, poll={}ms)",
            interface.name,
            config.snaplen,
            config.promiscuous,
            config.poll_interval_ms
        );

        Ok(Self {
            interface_name: interface.name.clone(),
            registry,
            source: Some(PnetSource { rx }),
            stop_signal: None,
            task: None,
        })
    }
}

#[async_trait::async_trait]
impl ButtonListener for PnetListener {
    async fn start(&mut self) -> Result<mpsc::Receiver<PressEvent>, CaptureError> {
        // A capture handle is good for one run; open a new listener to watch again
        let mut source = self.source.take().ok_or_else(|| {
            CaptureError::TaskFailed(format!(
                "capture on {} was already started",
                self.interface_name
            ))
        })?;

        let (tx, rx) = mpsc::channel(PRESS_CHANNEL_CAPACITY);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        self.stop_signal = Some(stop_tx);

        let registry = self.registry.clone();
        let interface_name = self.interface_name.clone();

        // Spawn the capture task
        self.task = Some(tokio::task::spawn_blocking(move || {
            tracing::info!(
                "Listening for {} button(s) on {}",
                registry.len(),
                interface_name
            );
            let result = capture_loop(&mut source, &registry, &tx, &mut stop_rx);
            if let Err(ref e) = result {
                tracing::error!("Capture on {} failed: {}", interface_name, e);
            }
            // Dropping the source closes the capture handle
            result
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(stop) = self.stop_signal.take() {
            let _ = stop.send(());
        }
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| CaptureError::TaskFailed(e.to_string()))?,
            None => Ok(()),
        }
    }
}
