//! Pre-flight sanity checks for runtime environment
//!
//! This module verifies the system environment before any prompt is shown:
//! - Required binaries for the phase are present
//! - Running with root privileges (EUID 0)
//!
//! If any check fails, the program exits with a clear error message before
//! the operator is asked anything.

use std::env;
use std::ffi::OsStr;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::logic::Phase;

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl SanityCheckResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root
    }
}

/// Binaries the bootstrap phase calls, from the live install medium.
const BOOTSTRAP_BINARIES: &[&str] = &[
    "fdisk",
    "free",
    "systemctl",
    "timedatectl",
    "wipefs",
    "parted",
    "mkfs.fat",
    "mkfs.ext4",
    "mount",
    "fallocate",
    "mkswap",
    "swapon",
    "reflector",
    "pacman-key",
    "pacstrap",
    "genfstab",
];

/// Binaries the post-install phase calls, inside the new system.
const CONFIGURE_BINARIES: &[&str] = &["id", "useradd", "passwd", "hwclock", "locale-gen"];

/// Present when the machine was booted through UEFI.
const EFI_FIRMWARE_DIR: &str = "/sys/firmware/efi";

pub fn required_binaries(phase: Phase) -> &'static [&'static str] {
    match phase {
        Phase::Bootstrap => BOOTSTRAP_BINARIES,
        Phase::Configure => CONFIGURE_BINARIES,
    }
}

/// Binaries of `binaries` not found as executables in `search_path`.
fn missing_in(binaries: &[&str], search_path: &OsStr) -> Vec<String> {
    binaries
        .iter()
        .filter(|binary| which::which_in(binary, Some(search_path), "/").is_err())
        .map(|binary| binary.to_string())
        .collect()
}

/// Check if running as root (EUID 0)
fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Perform all sanity checks for `phase` and return the result
pub fn verify_environment(phase: Phase) -> SanityCheckResult {
    let search_path = env::var_os("PATH").unwrap_or_default();
    let missing_binaries = missing_in(required_binaries(phase), &search_path);

    SanityCheckResult {
        missing_binaries,
        is_root: is_running_as_root(),
    }
}

/// Print a pretty error message to stderr and exit
pub fn print_error_and_exit(result: &SanityCheckResult) -> ! {
    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║                archstrap - Pre-flight Check Failed               ║");
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();

    if !result.is_root {
        eprintln!("❌ ERROR: Root privileges required");
        eprintln!("   The installer partitions disks and edits system files.");
        eprintln!();
        eprintln!("   Solution: Run with sudo or as root user:");
        eprintln!("     sudo archstrap <phase>");
        eprintln!();
    }

    if !result.missing_binaries.is_empty() {
        eprintln!("❌ ERROR: Missing required binaries");
        eprintln!();
        for binary in &result.missing_binaries {
            eprintln!("   • {} (install: pacman -S {})", binary, package_for_binary(binary));
        }
        eprintln!();
        eprintln!("   Solution: Install missing packages:");
        eprintln!("     pacman -S {}", packages_for(&result.missing_binaries).join(" "));
        eprintln!();
    }

    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║  Fix the above issues and try again.                             ║");
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();

    std::process::exit(1);
}

/// Distinct packages providing `binaries`, sorted
fn packages_for(binaries: &[String]) -> Vec<&'static str> {
    let mut packages: Vec<&str> = binaries.iter().map(|b| package_for_binary(b)).collect();
    packages.sort_unstable();
    packages.dedup();
    packages
}

/// Map binary names to their Arch Linux package names
fn package_for_binary(binary: &str) -> &'static str {
    match binary {
        "systemctl" | "timedatectl" => "systemd",
        "parted" => "parted",
        "mkfs.fat" => "dosfstools",
        "mkfs.ext4" => "e2fsprogs",
        "reflector" => "reflector",
        "pacman-key" => "pacman",
        "pacstrap" | "genfstab" => "arch-install-scripts",
        "free" => "procps-ng",
        "useradd" | "passwd" => "shadow",
        "id" => "coreutils",
        "locale-gen" => "glibc",
        _ => "util-linux",
    }
}

/// Verify the environment for `phase` and exit if checks fail.
pub fn run_preflight_checks(phase: Phase) {
    debug!(%phase, "running pre-flight sanity checks");

    let result = verify_environment(phase);
    if !result.is_ok() {
        print_error_and_exit(&result);
    }

    if phase == Phase::Bootstrap && !Path::new(EFI_FIRMWARE_DIR).exists() {
        warn!("{} not found: this machine does not look UEFI-booted", EFI_FIRMWARE_DIR);
    }

    info!(%phase, "pre-flight checks passed");
}
