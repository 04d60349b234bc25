//! Bootstrap phase scenarios, driven end to end with a scripted runner.

mod common;

use std::fs;

use archstrap::logic::bootstrap::{self, BootstrapStep};
use archstrap::InstallerError;
use strum::IntoEnumIterator;
use tempfile::TempDir;

use common::{ScriptedRunner, bootstrap_config, console, transcript};

const FDISK: &str = "\
Disk /dev/sda: 20 GiB, 21474836480 bytes, 41943040 sectors
Disk model: QEMU HARDDISK
Units: sectors of 1 * 512 = 512 bytes

Disk /dev/loop0: 795.3 MiB, 833949696 bytes, 1628808 sectors
Units: sectors of 1 * 512 = 512 bytes
";

const FREE: &str = "\
               total        used        free      shared  buff/cache   available
Mem:      8589934592   612345856  7123456000     1234567   854132736  7977588736
Swap:              0           0           0
";

const GENFSTAB: &str = "\
# /dev/sda2
UUID=abc\t\t/\text4\tdefaults\t0\t1

# /dev/sda1
UUID=1234-ABCD      \t/boot     \tvfat      \trw,relatime\t0 2
";

fn scripted() -> ScriptedRunner {
    ScriptedRunner::new()
        .with_output("fdisk --list", FDISK)
        .with_output("free --bytes", FREE)
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_full_bootstrap_command_sequence() {
    let dir = TempDir::new().unwrap();
    let config = bootstrap_config(dir.path());
    let chroot = config.chroot_path.display().to_string();
    let boot = config.boot_dir.display().to_string();
    let swap = config.swapfile_path.display().to_string();
    let genfstab = format!("genfstab -U {}", chroot);

    let mut runner = scripted().with_output(&genfstab, GENFSTAB);
    let mut c = console(&["y", "/dev/sda", "amd"]);

    let report = bootstrap::run(&mut c, &mut runner, &config).unwrap();

    let mut pacstrap = format!("pacstrap {}", chroot);
    for pkg in &config.base_packages {
        pacstrap.push(' ');
        pacstrap.push_str(pkg);
    }
    pacstrap.push_str(" amd-ucode");

    let expected = vec![
        "fdisk --list".to_string(),
        "free --bytes".to_string(),
        "systemctl stop reflector".to_string(),
        "timedatectl set-ntp 1".to_string(),
        "wipefs --all /dev/sda".to_string(),
        "parted /dev/sda mklabel gpt".to_string(),
        "parted /dev/sda mkpart uefi_boot fat32 1MiB 321MiB".to_string(),
        "parted /dev/sda mkpart root ext4 321MiB 100%".to_string(),
        "parted /dev/sda set 1 esp on".to_string(),
        "mkfs.fat -F 32 /dev/sda1".to_string(),
        "mkfs.ext4 /dev/sda2".to_string(),
        format!("mount --options noatime /dev/sda2 {}", chroot),
        format!("mount --options noatime /dev/sda1 {}", boot),
        format!("fallocate --length 8589934592 {}", swap),
        format!("mkswap {}", swap),
        format!("swapon {}", swap),
        "reflector --verbose --protocol https --country France --latest 10 --sort rate --save /etc/pacman.d/mirrorlist".to_string(),
        "pacman-key --init".to_string(),
        "pacman-key --populate archlinux".to_string(),
        pacstrap,
        genfstab,
    ];
    assert_eq!(runner.lines, expected);
    assert_eq!(report.order(), BootstrapStep::iter().collect::<Vec<_>>());
    assert!(config.boot_dir.is_dir());
}

#[test]
fn test_loop_devices_are_not_offered() {
    let dir = TempDir::new().unwrap();
    let config = bootstrap_config(dir.path());
    let mut runner = scripted();
    let mut c = console(&["y", "/dev/loop0", "/dev/sda", "other"]);

    bootstrap::run(&mut c, &mut runner, &config).unwrap();

    let output = transcript(c);
    assert!(output.contains(" -> /dev/sda\n"));
    assert!(!output.contains("/dev/loop0"));
    assert_eq!(output.matches("Which disk should Arch be installed to?").count(), 2);
}

#[test]
fn test_other_brand_installs_no_microcode() {
    let dir = TempDir::new().unwrap();
    let config = bootstrap_config(dir.path());
    let mut runner = scripted();
    let mut c = console(&["y", "/dev/sda", "other"]);

    bootstrap::run(&mut c, &mut runner, &config).unwrap();

    let pacstrap = runner
        .lines
        .iter()
        .find(|line| line.starts_with("pacstrap "))
        .unwrap();
    assert!(!pacstrap.contains("-ucode"));
}

#[test]
fn test_fstab_is_normalized() {
    let dir = TempDir::new().unwrap();
    let config = bootstrap_config(dir.path());
    let genfstab = format!("genfstab -U {}", config.chroot_path.display());
    let mut runner = scripted().with_output(&genfstab, GENFSTAB);
    let mut c = console(&["y", "/dev/sda", "intel"]);

    bootstrap::run(&mut c, &mut runner, &config).unwrap();

    assert_eq!(
        fs::read_to_string(config.fstab_path()).unwrap(),
        "# /dev/sda2\nUUID=abc / ext4 defaults 0 1\n\n# /dev/sda1\nUUID=1234-ABCD /boot vfat rw,relatime 0 2\n"
    );
}

// ============================================================================
// Aborts
// ============================================================================

#[test]
fn test_declined_confirmation_runs_nothing() {
    let dir = TempDir::new().unwrap();
    let config = bootstrap_config(dir.path());
    let mut runner = scripted();
    let mut c = console(&["sure", "N"]);

    let err = bootstrap::run(&mut c, &mut runner, &config).unwrap_err();

    assert!(matches!(err, InstallerError::Cancelled));
    assert_eq!(err.exit_code(), 1);
    assert!(runner.lines.is_empty());
    assert!(!config.boot_dir.exists());
}

#[test]
fn test_command_failure_aborts_phase() {
    let dir = TempDir::new().unwrap();
    let config = bootstrap_config(dir.path());
    let mut runner = scripted().failing("mkfs.ext4 /dev/sda2");
    let mut c = console(&["y", "/dev/sda", "amd"]);

    let err = bootstrap::run(&mut c, &mut runner, &config).unwrap_err();

    assert_eq!(err.exit_code(), 32);
    assert_eq!(runner.lines.last().unwrap(), "mkfs.ext4 /dev/sda2");
    assert!(!runner.lines.iter().any(|line| line.starts_with("mount ")));
    assert!(!config.fstab_path().exists());
}

#[test]
fn test_closed_input_cancels() {
    let dir = TempDir::new().unwrap();
    let config = bootstrap_config(dir.path());
    let mut runner = scripted();
    let mut c = console(&["y", "/dev/sdz"]);

    let err = bootstrap::run(&mut c, &mut runner, &config).unwrap_err();

    assert!(matches!(err, InstallerError::Cancelled));
    assert_eq!(runner.lines, vec!["fdisk --list"]);
}
