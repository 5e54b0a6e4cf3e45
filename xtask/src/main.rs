//! Development tasks for dashwatch
//!
//! Usage:
//!   cargo xtask install      Install release binary to /usr/local/bin and grant capture rights
//!   cargo xtask uninstall    Remove binary from /usr/local/bin
//!   cargo xtask dist         Build release binary for distribution

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

const INSTALL_PATH: &str = "/usr/local/bin/dashwatch";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let Some(command) = args.first() else {
        print_help();
        return ExitCode::SUCCESS;
    };

    let result = match command.as_str() {
        "install" => install(),
        "uninstall" => uninstall(),
        "dist" => dist().map(|_| ()),
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_help();
            Err(anyhow::anyhow!("Unknown command"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    eprintln!(
        r#"
dashwatch development tasks

Usage: cargo xtask <COMMAND>

Commands:
  install    Build release binary, install to /usr/local/bin and setcap (requires sudo)
  uninstall  Remove dashwatch from /usr/local/bin (requires sudo)
  dist       Build optimized release binary for distribution
"#
    );
}

/// Get the project root directory
fn project_root() -> PathBuf {
    let dir = env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .or_else(|_| env::current_dir())
        .unwrap_or_else(|_| PathBuf::from("."));

    // xtask is in a subdirectory, go up one level
    dir.parent().unwrap_or(&dir).to_path_buf()
}

/// Build the release binary and return its path
fn build_release(root: &Path) -> anyhow::Result<PathBuf> {
    let status = Command::new("cargo")
        .args(["build", "--release"])
        .current_dir(root)
        .status()?;

    if !status.success() {
        anyhow::bail!("Build failed");
    }

    let binary = root.join("target/release/dashwatch");
    if !binary.exists() {
        anyhow::bail!("Binary not found at {:?}", binary);
    }
    Ok(binary)
}

fn sudo(args: &[&str], what: &str) -> anyhow::Result<()> {
    let status = Command::new("sudo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{} failed (sudo required)", what);
    }
    Ok(())
}

/// Build release binary, install it and grant raw capture capabilities
fn install() -> anyhow::Result<()> {
    println!("==> Building release binary...");
    let binary = build_release(&project_root())?;
    let binary = binary.to_string_lossy();

    println!("==> Installing to {}...", INSTALL_PATH);
    sudo(&["install", "-Dm755", &binary, INSTALL_PATH], "Install")?;

    // Raw capture without running the daemon as root
    println!("==> Granting CAP_NET_RAW and CAP_NET_ADMIN...");
    sudo(
        &["setcap", "cap_net_raw,cap_net_admin=eip", INSTALL_PATH],
        "setcap",
    )?;

    println!("==> Installed successfully!");
    println!();
    println!("Installed: {}", INSTALL_PATH);

    // Show version
    let _ = Command::new(INSTALL_PATH).arg("--version").status();

    Ok(())
}

/// Remove dashwatch from /usr/local/bin
fn uninstall() -> anyhow::Result<()> {
    println!("==> Removing {}...", INSTALL_PATH);
    sudo(&["rm", "-f", INSTALL_PATH], "Uninstall")?;
    println!("==> Uninstalled successfully!");
    Ok(())
}

/// Build optimized release binary for distribution
fn dist() -> anyhow::Result<PathBuf> {
    println!("==> Building distribution binary...");
    let binary = build_release(&project_root())?;
    println!("==> Built: {:?}", binary);

    // Show binary info
    let _ = Command::new("ls").arg("-lh").arg(&binary).status();
    let _ = Command::new(&binary).arg("--version").status();

    Ok(binary)
}
