//! Bootstrap phase
//!
//! Runs from the install medium and turns a blank disk into a mounted system
//! with the base packages installed:
//!
//! confirm → collect parameters → stop reflector → NTP → wipe → partition →
//! format → mount → swapfile → swapon → mirror list → keyring → pacstrap → fstab
//!
//! # Failure Policy
//!
//! Every step is fatal on failure and nothing is rolled back. The operator's
//! confirmation is the only safeguard; it comes before any mutation.

use std::fs::{self, DirBuilder, Permissions};
use std::io::{BufRead, Write};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

use strum::{Display, EnumIter};
use tracing::info;

use super::{PhaseReport, StepOutcome, progress};
use crate::command_executor::CommandRunner;
use crate::config::InstallerConfig;
use crate::engine::commands;
use crate::error::{InstallerError, Result};
use crate::files;
use crate::prompt::{self, Confirmation, Console};
use crate::types::{BootstrapParameters, ByteCount, Disk, PartitionMap, ProcessorBrand};

/// Steps of the bootstrap phase, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum BootstrapStep {
    #[strum(serialize = "stop reflector")]
    StopReflector,
    #[strum(serialize = "enable NTP")]
    EnableNtp,
    #[strum(serialize = "wipe disk")]
    WipeDisk,
    #[strum(serialize = "partition disk")]
    PartitionDisk,
    #[strum(serialize = "format partitions")]
    FormatPartitions,
    #[strum(serialize = "mount partitions")]
    MountPartitions,
    #[strum(serialize = "create swapfile")]
    CreateSwapfile,
    #[strum(serialize = "enable swap")]
    EnableSwap,
    #[strum(serialize = "update mirror list")]
    UpdateMirrorList,
    #[strum(serialize = "initialize keyring")]
    InitKeyring,
    #[strum(serialize = "install base system")]
    InstallBaseSystem,
    #[strum(serialize = "generate fstab")]
    GenerateFstab,
}

// ============================================================================
// Steps
// ============================================================================

pub fn stop_reflector(runner: &mut dyn CommandRunner) -> Result<()> {
    progress("Stopping Reflector service...");
    runner.run(&commands::stop_reflector())
}

pub fn enable_ntp(runner: &mut dyn CommandRunner) -> Result<()> {
    progress("Activating NTP time synchronization...");
    runner.run(&commands::enable_ntp())
}

pub fn wipe_disk(runner: &mut dyn CommandRunner, disk: &Disk) -> Result<()> {
    progress(&format!("Wiping disk {}...", disk));
    runner.run(&commands::wipe_signatures(disk))
}

/// Lay out the GPT table and return the boot (1) and root (2) partitions.
pub fn partition_disk(runner: &mut dyn CommandRunner, disk: &Disk) -> Result<PartitionMap> {
    progress(&format!("Partitioning disk {}...", disk));

    for command in commands::partition_disk(disk) {
        runner.run(&command)?;
    }

    Ok(PartitionMap {
        boot: disk.partition(1)?,
        root: disk.partition(2)?,
    })
}

pub fn format_partitions(runner: &mut dyn CommandRunner, partitions: &PartitionMap) -> Result<()> {
    progress("Formatting partitions...");
    runner.run(&commands::format_fat32(&partitions.boot))?;
    runner.run(&commands::format_ext4(&partitions.root))
}

/// Mount root at the chroot path, then the ESP at the boot directory beneath it.
pub fn mount_partitions(
    runner: &mut dyn CommandRunner,
    config: &InstallerConfig,
    partitions: &PartitionMap,
) -> Result<()> {
    progress("Mounting partitions...");

    runner.run(&commands::mount(&partitions.root, &config.chroot_path))?;
    DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(&config.boot_dir)?;
    runner.run(&commands::mount(&partitions.boot, &config.boot_dir))
}

/// Allocate a swapfile of exactly `size` bytes, owner-only, formatted as swap.
pub fn create_swapfile(
    runner: &mut dyn CommandRunner,
    config: &InstallerConfig,
    size: ByteCount,
) -> Result<()> {
    progress("Creating swapfile...");

    runner.run(&commands::allocate_file(&config.swapfile_path, size))?;
    fs::set_permissions(&config.swapfile_path, Permissions::from_mode(0o600))?;
    runner.run(&commands::make_swap(&config.swapfile_path))
}

pub fn enable_swap(runner: &mut dyn CommandRunner, config: &InstallerConfig) -> Result<()> {
    progress("Enabling swap...");
    runner.run(&commands::enable_swap(&config.swapfile_path))
}

pub fn update_mirror_list(runner: &mut dyn CommandRunner, config: &InstallerConfig) -> Result<()> {
    progress("Updating mirror list...");
    runner.run(&commands::rank_mirrors(&config.mirrors))
}

pub fn init_pacman_keyring(runner: &mut dyn CommandRunner, config: &InstallerConfig) -> Result<()> {
    progress("Initializing pacman keyring...");
    runner.run(&commands::init_keyring())?;
    runner.run(&commands::populate_keyring(&config.keyring))
}

pub fn install_base_system(
    runner: &mut dyn CommandRunner,
    config: &InstallerConfig,
    processor_brand: Option<ProcessorBrand>,
) -> Result<()> {
    progress("Installing base system...");

    let packages = commands::base_package_set(config, processor_brand);
    info!(?packages, "installing base package set");
    runner.run(&commands::pacstrap(&config.chroot_path, &packages))
}

/// Write the target's fstab from the live mounts, one space between fields.
pub fn generate_fstab(runner: &mut dyn CommandRunner, config: &InstallerConfig) -> Result<()> {
    progress("Generating fstab...");

    let fstab = runner.capture(&commands::generate_fstab(&config.chroot_path))?;
    files::write_to_file(&config.fstab_path(), &files::normalize_whitespace(&fstab))
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Run every mutating step, in order, for already collected parameters.
pub fn install(
    runner: &mut dyn CommandRunner,
    config: &InstallerConfig,
    params: &BootstrapParameters,
) -> Result<PhaseReport<BootstrapStep>> {
    use BootstrapStep::*;

    let mut report = PhaseReport::new();
    let disk = &params.install_disk;

    stop_reflector(runner)?;
    report.record(StopReflector, StepOutcome::Completed);
    enable_ntp(runner)?;
    report.record(EnableNtp, StepOutcome::Completed);

    wipe_disk(runner, disk)?;
    report.record(WipeDisk, StepOutcome::Completed);
    let partitions = partition_disk(runner, disk)?;
    report.record(PartitionDisk, StepOutcome::Completed);
    format_partitions(runner, &partitions)?;
    report.record(FormatPartitions, StepOutcome::Completed);
    mount_partitions(runner, config, &partitions)?;
    report.record(MountPartitions, StepOutcome::Completed);
    create_swapfile(runner, config, params.total_memory)?;
    report.record(CreateSwapfile, StepOutcome::Completed);
    enable_swap(runner, config)?;
    report.record(EnableSwap, StepOutcome::Completed);

    update_mirror_list(runner, config)?;
    report.record(UpdateMirrorList, StepOutcome::Completed);
    init_pacman_keyring(runner, config)?;
    report.record(InitKeyring, StepOutcome::Completed);
    install_base_system(runner, config, params.processor_brand)?;
    report.record(InstallBaseSystem, StepOutcome::Completed);

    generate_fstab(runner, config)?;
    report.record(GenerateFstab, StepOutcome::Completed);

    Ok(report)
}

/// The whole bootstrap phase: confirmation, parameters, installation.
///
/// A declined confirmation returns `InstallerError::Cancelled` before any
/// command has been issued.
pub fn run<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    runner: &mut dyn CommandRunner,
    config: &InstallerConfig,
) -> Result<PhaseReport<BootstrapStep>> {
    if prompt::confirm_installation(console)? == Confirmation::Declined {
        return Err(InstallerError::Cancelled);
    }

    let params = prompt::gather_bootstrap_parameters(console, runner)?;
    info!(
        disk = %params.install_disk,
        brand = ?params.processor_brand,
        memory = params.total_memory.get(),
        "bootstrap parameters collected"
    );

    install(runner, config, &params)
}

// ============================================================================
// Tests
// ============================================================================
