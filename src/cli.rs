// Command-line interface definitions for dashwatch
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dashwatch")]
#[command(author, version, about = "Turn ARP broadcasts from Wi-Fi buttons into actions")]
#[command(long_about = "
Dashwatch watches a network interface for the ARP probe a cheap Wi-Fi
button (such as an Amazon Dash button) broadcasts when pressed, and runs
the action configured for that button.

SETUP:
  1. Find the button's MAC address (your router's client list, or run
     dashwatch -vv and press the button)
  2. Add a [[button]] section to ~/.config/dashwatch/config.toml
  3. Grant capture rights: sudo setcap cap_net_raw,cap_net_admin=eip $(which dashwatch)
  4. Run: dashwatch (to start watching)

USAGE:
  Press the button. Repeated probes from one press are merged; a button
  fires at most once per cool-down window (5s by default).
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Override the interface to watch (e.g., eth0, wlan0)
    #[arg(short, long, value_name = "IFACE")]
    pub interface: Option<String>,

    /// Override the cool-down window in seconds
    #[arg(long, value_name = "SECS")]
    pub cooldown: Option<f64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch for button presses (default if no command specified)
    Watch,

    /// Run a button's action once without waiting for a press
    Trigger {
        /// Button name as configured
        button: String,
    },

    /// List network interfaces and whether they can be watched
    Interfaces,

    /// Show current configuration
    Config,
}
