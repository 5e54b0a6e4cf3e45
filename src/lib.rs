//! Dashwatch: turn ARP broadcasts from Wi-Fi buttons into actions
//!
//! This library provides the core functionality for:
//! - Validating the watched interface and its network range
//! - Capturing raw frames in promiscuous mode via pnet
//! - Recognising the ARP probe a button sends when pressed
//! - Debouncing the burst of probes one press produces
//! - Running a per-button action (command, notification, webhook)
//!
//! # Architecture
//!
//! ```text
//!                            ┌─────────────────────────────────────┐
//!                            │              Daemon                 │
//!                            └─────────────────────────────────────┘
//!                                            │
//!                   ┌────────────────────────┼────────────────────────┐
//!                   │                        │                        │
//!                   ▼                        ▼                        ▼
//!          ┌──────────────┐         ┌──────────────┐         ┌──────────────┐
//!          │  Interface   │         │   Capture    │         │    Device    │
//!          │   Resolver   │         │    (pnet)    │         │   Registry   │
//!          └──────────────┘         └──────────────┘         └──────────────┘
//!                                            │
//!                                            │ raw frames
//!                                            ▼
//!                                   ┌──────────────┐
//!                                   │    Filter    │ ARP request, zero target,
//!                                   │              │ registered sender
//!                                   └──────────────┘
//!                                            │
//!                                            ▼ press events
//!                                   ┌──────────────┐
//!                                   │    Router    │ per-button cool-down
//!                                   │  (debounce)  │
//!                                   └──────────────┘
//!                                            │
//!                     ┌──────────────────────┼──────────────────────┐
//!                     ▼                      ▼                      ▼
//!              ┌────────────┐         ┌────────────┐         ┌────────────┐
//!              │  worker A  │         │  worker B  │   ...   │  worker N  │
//!              │  (action)  │         │  (action)  │         │  (action)  │
//!              └────────────┘         └────────────┘         └────────────┘
//! ```

pub mod action;
pub mod capture;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod debounce;
pub mod device;
pub mod error;
pub mod filter;
pub mod interface;
pub mod router;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{DashwatchError, Result};
