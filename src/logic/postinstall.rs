//! Post-install phase
//!
//! Runs inside the freshly installed system (from `arch-chroot`) and
//! configures accounts, locale, time, keyboard and name resolution.
//!
//! # Idempotence
//!
//! Only account creation checks for prior state: an existing account with the
//! admin UID skips creation and password setup. Every other step is an
//! unconditional edit whose result is the same when repeated.
//!
//! # Gaps
//!
//! Network interface and bootloader setup are reported as not implemented
//! rather than silently left out, so the operator knows what remains.

use std::io::{BufRead, Write};
use std::os::unix::fs::symlink;

use regex::Regex;
use strum::{Display, EnumIter};
use tracing::info;

use super::{PhaseReport, SkipReason, StepOutcome, progress};
use crate::command_executor::CommandRunner;
use crate::config::InstallerConfig;
use crate::engine::commands;
use crate::error::Result;
use crate::files;
use crate::prompt::{self, Console};
use crate::types::{Hostname, InstallParameters, Username};

const SUDOERS_WHEEL: &str = r"^# *(%wheel ALL=\(ALL\) ALL)$";
const PACMAN_COLOR: &str = r"^#(Color)$";

/// Steps of the post-install phase, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum PostInstallStep {
    #[strum(serialize = "create admin user")]
    CreateAdminUser,
    #[strum(serialize = "activate sudoers")]
    ActivateSudoers,
    #[strum(serialize = "enable pacman colors")]
    EnablePacmanColors,
    #[strum(serialize = "configure timezone")]
    ConfigureTimezone,
    #[strum(serialize = "sync hardware clock")]
    SyncHardwareClock,
    #[strum(serialize = "configure locales")]
    ConfigureLocales,
    #[strum(serialize = "configure keyboard")]
    ConfigureKeyboard,
    #[strum(serialize = "configure hosts")]
    ConfigureHosts,
    #[strum(serialize = "configure network interfaces")]
    ConfigureNetworkInterfaces,
    #[strum(serialize = "configure bootloader")]
    ConfigureBootloader,
    #[strum(serialize = "install bootloader")]
    InstallBootloader,
    #[strum(serialize = "cleanup")]
    Cleanup,
}

// ============================================================================
// Steps
// ============================================================================

/// Create the admin account unless one with the configured UID exists.
pub fn create_admin_user<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    runner: &mut dyn CommandRunner,
    config: &InstallerConfig,
    username: &Username,
) -> Result<StepOutcome> {
    let uid = config.admin_uid;
    if runner.succeeds(&commands::lookup_user(uid))? {
        info!(uid, "admin account already present");
        return Ok(StepOutcome::Skipped(SkipReason::AccountExists { uid }));
    }

    progress(&format!("Creating admin user {}...", username));
    runner.run(&commands::create_user(uid, &config.admin_groups, username))?;

    console.say(prompt::ADMIN_PASSWORD)?;
    runner.run(&commands::set_password(username))?;

    Ok(StepOutcome::Completed)
}

pub fn activate_sudoers(config: &InstallerConfig) -> Result<()> {
    progress("Activating sudo for the wheel group...");
    files::replace_in_file(&config.system.sudoers, &Regex::new(SUDOERS_WHEEL)?, "$1")
}

pub fn enable_pacman_colors(config: &InstallerConfig) -> Result<()> {
    progress("Enabling pacman colors...");
    files::replace_in_file(&config.system.pacman_conf, &Regex::new(PACMAN_COLOR)?, "$1")
}

/// Point the localtime link at the configured zone, replacing any prior link.
pub fn configure_timezone(config: &InstallerConfig) -> Result<()> {
    progress(&format!("Setting timezone to {}...", config.timezone));

    let zone = config.system.zoneinfo_dir.join(&config.timezone);
    files::delete_file(&config.system.localtime)?;
    symlink(&zone, &config.system.localtime)?;
    Ok(())
}

pub fn sync_hardware_clock(runner: &mut dyn CommandRunner) -> Result<()> {
    progress("Syncing hardware clock...");
    runner.run(&commands::sync_hardware_clock())
}

/// Pattern matching the commented-out UTF-8 line of `locale` in `locale.gen`.
pub fn locale_pattern(locale: &str) -> Result<Regex> {
    Ok(Regex::new(&format!(
        r"^#({}\.UTF-8 UTF-8 *)$",
        regex::escape(locale)
    ))?)
}

pub fn configure_locales(runner: &mut dyn CommandRunner, config: &InstallerConfig) -> Result<()> {
    progress("Generating locales...");

    for locale in &config.locales {
        files::replace_in_file(&config.system.locale_gen, &locale_pattern(locale)?, "$1")?;
    }
    runner.run(&commands::generate_locales())?;
    files::write_to_file(&config.system.locale_conf, &config.locale_conf)
}

pub fn configure_keyboard(config: &InstallerConfig) -> Result<()> {
    progress("Setting console keymap...");
    files::write_to_file(
        &config.system.vconsole_conf,
        &format!("KEYMAP={}", config.keymap),
    )
}

/// Loopback entries plus the machine's own name on 127.0.1.1.
pub fn hosts_file(hostname: &Hostname) -> String {
    format!(
        "127.0.0.1 localhost\n::1 localhost\n127.0.1.1 {0}.localdomain {0}",
        hostname
    )
}

pub fn configure_hosts(config: &InstallerConfig, hostname: &Hostname) -> Result<()> {
    progress("Writing hostname and hosts...");
    files::write_to_file(&config.system.hostname, hostname.as_str())?;
    files::write_to_file(&config.system.hosts, &hosts_file(hostname))
}

pub fn cleanup(config: &InstallerConfig) -> Result<()> {
    progress("Cleaning up...");
    files::delete_file(&config.system.skel_bash_logout)
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Apply every post-install step for already collected parameters.
pub fn configure<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    runner: &mut dyn CommandRunner,
    config: &InstallerConfig,
    params: &InstallParameters,
) -> Result<PhaseReport<PostInstallStep>> {
    use PostInstallStep::*;

    let mut report = PhaseReport::new();

    let outcome = create_admin_user(console, runner, config, &params.admin_username)?;
    report.record(CreateAdminUser, outcome);
    activate_sudoers(config)?;
    report.record(ActivateSudoers, StepOutcome::Completed);
    enable_pacman_colors(config)?;
    report.record(EnablePacmanColors, StepOutcome::Completed);

    configure_timezone(config)?;
    report.record(ConfigureTimezone, StepOutcome::Completed);
    sync_hardware_clock(runner)?;
    report.record(SyncHardwareClock, StepOutcome::Completed);
    configure_locales(runner, config)?;
    report.record(ConfigureLocales, StepOutcome::Completed);
    configure_keyboard(config)?;
    report.record(ConfigureKeyboard, StepOutcome::Completed);
    configure_hosts(config, &params.hostname)?;
    report.record(ConfigureHosts, StepOutcome::Completed);

    report.record(
        ConfigureNetworkInterfaces,
        StepOutcome::NotImplemented("configure the network interfaces manually"),
    );
    report.record(
        ConfigureBootloader,
        StepOutcome::NotImplemented("write the bootloader configuration manually"),
    );
    report.record(
        InstallBootloader,
        StepOutcome::NotImplemented("install the bootloader to the ESP manually"),
    );

    cleanup(config)?;
    report.record(Cleanup, StepOutcome::Completed);

    Ok(report)
}

/// The whole post-install phase: parameters, then configuration.
pub fn run<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    runner: &mut dyn CommandRunner,
    config: &InstallerConfig,
) -> Result<PhaseReport<PostInstallStep>> {
    let params = prompt::gather_install_parameters(console)?;
    info!(
        hostname = %params.hostname,
        admin = %params.admin_username,
        "install parameters collected"
    );

    configure(console, runner, config, &params)
}

// ============================================================================
// Tests
// ============================================================================
