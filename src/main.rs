//! Dashwatch - turn ARP broadcasts from Wi-Fi buttons into actions
//!
//! Run with `dashwatch` or `dashwatch watch` to start the daemon.
//! Use `dashwatch interfaces` to pick an interface to watch.
//! Use `dashwatch trigger <button>` to test a button's action.

use clap::Parser;
use dashwatch::cli::{Cli, Commands};
use dashwatch::config::{self, Config};
use dashwatch::{interface, Daemon};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("dashwatch={},warn", log_level))),
        )
        .with_target(false)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(interface) = cli.interface {
        config.capture.interface = interface;
    }
    if let Some(cooldown) = cli.cooldown {
        config.debounce.cooldown_secs = cooldown;
        config.validate()?;
    }

    // Run the appropriate command
    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => {
            let mut daemon = Daemon::new(config);
            daemon.run().await?;
        }

        Commands::Trigger { button } => {
            Daemon::new(config).trigger(&button).await?;
        }

        Commands::Interfaces => {
            list_interfaces(&config);
        }

        Commands::Config => {
            show_config(&config, Config::resolve_path(cli.config.as_deref()));
        }
    }

    Ok(())
}

/// Print every interface and its resolution result
fn list_interfaces(config: &Config) {
    let policy = config.capture.subnet_policy();
    println!("Network Interfaces\n");
    println!("==================\n");

    for iface in pnet::datalink::interfaces() {
        let mac = iface
            .mac
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = if iface.name == config.capture.interface {
            "*"
        } else {
            " "
        };
        match interface::effective_subnet(&iface.name, &iface.ips, policy) {
            Ok(subnet) => println!(
                "{} {:<12} {:<18} ✓ {} (host {})",
                marker, iface.name, mac, subnet, subnet.address
            ),
            Err(e) => println!("{} {:<12} {:<18} ✗ {}", marker, iface.name, mac, e),
        }
    }

    println!("\n* = configured interface ({:?})", config.capture.interface);
}

/// Show current configuration and the file it was loaded from
fn show_config(config: &Config, path: Option<PathBuf>) {
    println!("Current Configuration\n");
    println!("=====================\n");

    println!("[capture]");
    println!("  interface = {:?}", config.capture.interface);
    println!("  snaplen = {}", config.capture.snaplen);
    println!("  promiscuous = {}", config.capture.promiscuous);
    println!("  poll_interval_ms = {}", config.capture.poll_interval_ms);
    println!("  min_prefix_len = {}", config.capture.min_prefix_len);

    println!("\n[debounce]");
    println!("  cooldown_secs = {}", config.debounce.cooldown_secs);

    if config.buttons.is_empty() {
        println!("\n(no buttons configured)");
    }
    for button in &config.buttons {
        println!("\n[[button]]");
        println!("  name = {:?}", button.name);
        println!("  mac = {:?}", button.mac);
        println!("  action = {:?}", button.action.kind());
    }

    println!("\n---");
    let loaded = path.as_deref().is_some_and(|p| p.exists());
    match &path {
        Some(p) if loaded => println!("Config file: {:?}", p),
        Some(p) => println!("Config file: {:?} (not found, using defaults)", p),
        None => println!("Config file: (no config directory)"),
    }
    if !loaded {
        println!("\nDefault config file contents:\n");
        println!("{}", config::DEFAULT_CONFIG);
    }
}
