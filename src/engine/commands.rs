//! Command builders
//!
//! Every external program the installer calls is described here, once, with
//! its exact argument vector. Nothing in this module runs anything: the
//! functions are pure and the `logic` layer decides when each one executes.

use std::path::Path;

use crate::command_executor::SystemCommand;
use crate::config::{InstallerConfig, MirrorConfig};
use crate::types::{ByteCount, Disk, Partition, ProcessorBrand, Username};

/// Start of the EFI system partition.
pub const BOOT_START: &str = "1MiB";
/// End of the EFI system partition and start of the root partition.
pub const BOOT_END: &str = "321MiB";

// ============================================================================
// Probes
// ============================================================================

pub fn list_disks() -> SystemCommand {
    SystemCommand::new("fdisk").arg("--list")
}

pub fn report_memory() -> SystemCommand {
    SystemCommand::new("free").arg("--bytes")
}

// ============================================================================
// Live environment
// ============================================================================

pub fn stop_reflector() -> SystemCommand {
    SystemCommand::new("systemctl").args(["stop", "reflector"])
}

pub fn enable_ntp() -> SystemCommand {
    SystemCommand::new("timedatectl").args(["set-ntp", "1"])
}

// ============================================================================
// Disk preparation
// ============================================================================

pub fn wipe_signatures(disk: &Disk) -> SystemCommand {
    SystemCommand::new("wipefs").arg("--all").arg(disk)
}

/// GPT label, ESP 1MiB-321MiB, root 321MiB-100%, ESP flag on partition 1.
pub fn partition_disk(disk: &Disk) -> Vec<SystemCommand> {
    let parted = || SystemCommand::new("parted").arg(disk);
    vec![
        parted().args(["mklabel", "gpt"]),
        parted().args(["mkpart", "uefi_boot", "fat32", BOOT_START, BOOT_END]),
        parted().args(["mkpart", "root", "ext4", BOOT_END, "100%"]),
        parted().args(["set", "1", "esp", "on"]),
    ]
}

pub fn format_fat32(partition: &Partition) -> SystemCommand {
    SystemCommand::new("mkfs.fat").args(["-F", "32"]).arg(partition)
}

pub fn format_ext4(partition: &Partition) -> SystemCommand {
    SystemCommand::new("mkfs.ext4").arg(partition)
}

pub fn mount(partition: &Partition, target: &Path) -> SystemCommand {
    SystemCommand::new("mount")
        .args(["--options", "noatime"])
        .arg(partition)
        .arg(target.display())
}

// ============================================================================
// Swap
// ============================================================================

pub fn allocate_file(path: &Path, size: ByteCount) -> SystemCommand {
    SystemCommand::new("fallocate")
        .arg("--length")
        .arg(size)
        .arg(path.display())
}

pub fn make_swap(path: &Path) -> SystemCommand {
    SystemCommand::new("mkswap").arg(path.display())
}

pub fn enable_swap(path: &Path) -> SystemCommand {
    SystemCommand::new("swapon").arg(path.display())
}

// ============================================================================
// Packages
// ============================================================================

pub fn rank_mirrors(mirrors: &MirrorConfig) -> SystemCommand {
    SystemCommand::new("reflector")
        .arg("--verbose")
        .args(["--protocol", mirrors.protocol.as_str()])
        .args(["--country", mirrors.country.as_str()])
        .arg("--latest")
        .arg(mirrors.latest)
        .arg("--sort")
        .arg(mirrors.sort)
        .arg("--save")
        .arg(mirrors.mirrorlist_path.display())
}

pub fn init_keyring() -> SystemCommand {
    SystemCommand::new("pacman-key").arg("--init")
}

pub fn populate_keyring(keyring: &str) -> SystemCommand {
    SystemCommand::new("pacman-key").args(["--populate", keyring])
}

/// Base packages in configured order, plus the vendor microcode if known.
pub fn base_package_set(config: &InstallerConfig, brand: Option<ProcessorBrand>) -> Vec<String> {
    let mut packages = config.base_packages.clone();
    if let Some(brand) = brand {
        let microcode = brand.microcode_package();
        if !packages.contains(&microcode) {
            packages.push(microcode);
        }
    }
    packages
}

pub fn pacstrap(root: &Path, packages: &[String]) -> SystemCommand {
    SystemCommand::new("pacstrap").arg(root.display()).args(packages)
}

pub fn generate_fstab(root: &Path) -> SystemCommand {
    SystemCommand::new("genfstab").arg("-U").arg(root.display())
}

// ============================================================================
// Post-install
// ============================================================================

pub fn lookup_user(uid: u32) -> SystemCommand {
    SystemCommand::new("id").arg(uid)
}

pub fn create_user(uid: u32, groups: &[String], name: &Username) -> SystemCommand {
    SystemCommand::new("useradd")
        .arg("--uid")
        .arg(uid)
        .arg("--groups")
        .arg(groups.join(","))
        .arg("--create-home")
        .arg(name)
}

pub fn set_password(name: &Username) -> SystemCommand {
    SystemCommand::new("passwd").arg(name)
}

pub fn sync_hardware_clock() -> SystemCommand {
    SystemCommand::new("hwclock").arg("--systohc")
}

pub fn generate_locales() -> SystemCommand {
    SystemCommand::new("locale-gen")
}

// ============================================================================
// Tests
// ============================================================================
