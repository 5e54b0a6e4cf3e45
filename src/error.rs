//! Error types for dashwatch
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.
//!
//! Irrelevant or malformed frames are never errors; see [`crate::filter::Verdict`].

use thiserror::Error;

/// Top-level error type for the dashwatch application
#[derive(Error, Debug)]
pub enum DashwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid MAC address for button '{button}': '{mac}'")]
    InvalidMac { button: String, mac: String },

    #[error("Button '{0}' is configured more than once (names and MACs must be unique)")]
    DuplicateButton(String),

    #[error("No buttons configured. Add a [[button]] section to the config file.")]
    NoButtons,

    #[error("Unknown button: '{0}'")]
    UnknownButton(String),

    #[error("Interface error: {0}")]
    Interface(#[from] InterfaceError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while resolving the watched interface
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("Interface '{0}' not found. List interfaces with: dashwatch interfaces")]
    NotFound(String),

    #[error("Interface '{0}' has no usable IPv4 address")]
    NoUsableAddress(String),

    #[error("Interface '{0}' only has a loopback address")]
    LoopbackRejected(String),

    #[error("Network on '{name}' is too large (/{prefix}, minimum /{min}). Lower capture.min_prefix_len to allow it.")]
    SubnetTooLarge { name: String, prefix: u8, min: u8 },
}

/// Errors related to the capture handle
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Cannot open capture on '{interface}': {source}\n  Raw capture needs root or CAP_NET_RAW:\n  sudo setcap cap_net_raw,cap_net_admin=eip $(which dashwatch)")]
    Open {
        interface: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Interface '{0}' does not provide an Ethernet channel")]
    UnsupportedChannel(String),

    #[error("Capture read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("Capture task failed: {0}")]
    TaskFailed(String),
}

/// Errors raised by press actions
///
/// These are reported by the dispatch worker and never reach the router.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("failed to spawn command: {0}")]
    SpawnFailed(String),

    #[error("command timed out after {0}ms")]
    Timeout(u64),

    #[error("command exited with code {code:?}{}", fmt_stderr(.stderr))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("webhook request failed: {0}")]
    Http(String),
}

fn fmt_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// Result type alias using DashwatchError
pub type Result<T> = std::result::Result<T, DashwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_message() {
        let err = ActionError::NonZeroExit {
            code: Some(2),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "command exited with code Some(2)");

        let err = ActionError::NonZeroExit {
            code: Some(1),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "command exited with code Some(1): boom");
    }

    #[test]
    fn test_interface_error_converts() {
        let err: DashwatchError = InterfaceError::NotFound("en3".to_string()).into();
        assert!(err.to_string().contains("en3"));
    }
}
