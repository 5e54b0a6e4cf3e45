//! Per-button debounce state
//!
//! One physical press makes a button send several ARP probes in quick
//! succession. Each button moves between two states:
//! Idle → (probe, cool-down elapsed) → Triggered → (dispatched) → Idle.
//! A probe inside the cool-down leaves the button Idle and is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of offering a press to the debouncer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// First press after the cool-down; the caller should dispatch it
    Accept,
    /// Inside the cool-down of the last accepted press
    Suppress {
        /// Time since the last accepted press
        since_last: Duration,
    },
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

/// Time of the last accepted press, per button
///
/// Owned by the router and only touched from its single loop, so no locking.
#[derive(Debug)]
pub struct Debouncer {
    cooldown: Duration,
    last_triggered: HashMap<Arc<str>, Instant>,
}

impl Debouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_triggered: HashMap::new(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Decide whether a press of `device` at `now` should be dispatched
    ///
    /// A press is accepted only when strictly more than the cool-down has
    /// passed since the last accepted one. Accepting records `now`.
    pub fn offer(&mut self, device: &Arc<str>, now: Instant) -> Decision {
        match self.last_triggered.get_mut(device) {
            Some(last) => {
                let since_last = now.saturating_duration_since(*last);
                if since_last > self.cooldown {
                    *last = now;
                    Decision::Accept
                } else {
                    Decision::Suppress { since_last }
                }
            }
            None => {
                self.last_triggered.insert(Arc::clone(device), now);
                Decision::Accept
            }
        }
    }

    /// When `device` last fired, if ever
    pub fn last_triggered(&self, device: &str) -> Option<Instant> {
        self.last_triggered.get(device).copied()
    }
}
