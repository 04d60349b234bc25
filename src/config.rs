//! Installer configuration
//!
//! All fixed constants of the installation (paths, package set, locales, mirror
//! filter, admin account shape) live in one immutable `InstallerConfig` that is
//! built once in `main` and handed by reference to every step. The defaults
//! describe the supported installation; a JSON file may override any field.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{InstallerError, Result};

/// Reflector `--sort` criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MirrorSortMethod {
    /// Sort by measured download rate (fastest first).
    #[default]
    Rate,
    /// Sort by last synchronization time.
    Age,
    /// Sort by country.
    Country,
    /// Sort by mirror score.
    Score,
}

/// Mirror list regeneration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub country: String,
    pub protocol: String,
    /// Keep only the N most recently synchronized mirrors.
    pub latest: u32,
    pub sort: MirrorSortMethod,
    pub mirrorlist_path: PathBuf,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            country: "France".to_string(),
            protocol: "https".to_string(),
            latest: 10,
            sort: MirrorSortMethod::Rate,
            mirrorlist_path: PathBuf::from("/etc/pacman.d/mirrorlist"),
        }
    }
}

/// Files edited by the post-install phase, as seen from inside the new system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemPaths {
    pub sudoers: PathBuf,
    pub pacman_conf: PathBuf,
    pub localtime: PathBuf,
    pub zoneinfo_dir: PathBuf,
    pub locale_gen: PathBuf,
    pub locale_conf: PathBuf,
    pub vconsole_conf: PathBuf,
    pub hostname: PathBuf,
    pub hosts: PathBuf,
    /// Template copied into new home directories by `useradd`.
    pub skel_bash_logout: PathBuf,
}

impl SystemPaths {
    /// The standard layout rooted at `root` (`/` on a running system).
    pub fn under(root: &Path) -> Self {
        Self {
            sudoers: root.join("etc/sudoers"),
            pacman_conf: root.join("etc/pacman.conf"),
            localtime: root.join("etc/localtime"),
            zoneinfo_dir: root.join("usr/share/zoneinfo"),
            locale_gen: root.join("etc/locale.gen"),
            locale_conf: root.join("etc/locale.conf"),
            vconsole_conf: root.join("etc/vconsole.conf"),
            hostname: root.join("etc/hostname"),
            hosts: root.join("etc/hosts"),
            skel_bash_logout: root.join("etc/skel/.bash_logout"),
        }
    }

    fn all(&self) -> [(&'static str, &Path); 10] {
        [
            ("sudoers", self.sudoers.as_path()),
            ("pacman_conf", self.pacman_conf.as_path()),
            ("localtime", self.localtime.as_path()),
            ("zoneinfo_dir", self.zoneinfo_dir.as_path()),
            ("locale_gen", self.locale_gen.as_path()),
            ("locale_conf", self.locale_conf.as_path()),
            ("vconsole_conf", self.vconsole_conf.as_path()),
            ("hostname", self.hostname.as_path()),
            ("hosts", self.hosts.as_path()),
            ("skel_bash_logout", self.skel_bash_logout.as_path()),
        ]
    }
}

impl Default for SystemPaths {
    fn default() -> Self {
        Self::under(Path::new("/"))
    }
}

/// Every constant the two installation phases rely on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Mount point the target root filesystem is assembled under.
    pub chroot_path: PathBuf,
    /// Mount point of the EFI system partition, beneath `chroot_path`.
    pub boot_dir: PathBuf,
    pub swapfile_path: PathBuf,
    pub mirrors: MirrorConfig,
    /// Keyring populated after `pacman-key --init`.
    pub keyring: String,
    pub base_packages: Vec<String>,
    /// Locale names without encoding suffix, e.g. `en_US`.
    pub locales: Vec<String>,
    /// Contents of `/etc/locale.conf`.
    pub locale_conf: String,
    /// Zone name relative to the zoneinfo directory.
    pub timezone: String,
    pub keymap: String,
    pub admin_uid: u32,
    pub admin_groups: Vec<String>,
    pub system: SystemPaths,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            chroot_path: PathBuf::from("/mnt"),
            boot_dir: PathBuf::from("/mnt/boot"),
            swapfile_path: PathBuf::from("/mnt/swapfile"),
            mirrors: MirrorConfig::default(),
            keyring: "archlinux".to_string(),
            base_packages: [
                "base",
                "base-devel",
                "linux",
                "linux-firmware",
                "e2fsprogs",
                "dosfstools",
                "grub",
                "efibootmgr",
                "sudo",
                "vim",
                "man-db",
            ]
            .iter()
            .map(|pkg| pkg.to_string())
            .collect(),
            locales: vec!["en_US".to_string(), "fr_FR".to_string()],
            locale_conf: "LANG=en_US.UTF-8\nLANGUAGE=en_US:en".to_string(),
            timezone: "Europe/Paris".to_string(),
            keymap: "fr-latin9".to_string(),
            admin_uid: 1000,
            admin_groups: vec!["wheel".to_string(), "sys".to_string()],
            system: SystemPaths::default(),
        }
    }
}

impl InstallerConfig {
    /// Load a JSON configuration file; absent fields keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            InstallerError::config(format!("Failed to read configuration from {:?}: {}", path, e))
        })?;

        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Render the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("chroot_path", self.chroot_path.as_path()),
            ("boot_dir", self.boot_dir.as_path()),
            ("swapfile_path", self.swapfile_path.as_path()),
            ("mirrors.mirrorlist_path", self.mirrors.mirrorlist_path.as_path()),
        ] {
            require_absolute(name, path)?;
        }
        for (name, path) in self.system.all() {
            require_absolute(&format!("system.{}", name), path)?;
        }

        if !self.boot_dir.starts_with(&self.chroot_path) || self.boot_dir == self.chroot_path {
            return Err(InstallerError::config(format!(
                "boot_dir {:?} must be beneath chroot_path {:?}",
                self.boot_dir, self.chroot_path
            )));
        }

        if self.base_packages.is_empty() {
            return Err(InstallerError::config("base_packages cannot be empty"));
        }
        if let Some(pkg) = self
            .base_packages
            .iter()
            .find(|p| p.is_empty() || p.contains(char::is_whitespace))
        {
            return Err(InstallerError::config(format!("Invalid package name {:?}", pkg)));
        }

        if self.locales.is_empty() {
            return Err(InstallerError::config("locales cannot be empty"));
        }

        if self.mirrors.latest == 0 {
            return Err(InstallerError::config("mirrors.latest must be at least 1"));
        }
        if self.mirrors.country.trim().is_empty() {
            return Err(InstallerError::config("mirrors.country cannot be empty"));
        }

        if self.admin_uid == 0 {
            return Err(InstallerError::config("admin_uid cannot be 0 (root)"));
        }
        if self.admin_groups.is_empty() {
            return Err(InstallerError::config("admin_groups cannot be empty"));
        }

        if self.timezone.is_empty() || Path::new(&self.timezone).is_absolute() {
            return Err(InstallerError::config(
                "timezone must be a zone name such as Europe/Paris",
            ));
        }
        if self.keymap.trim().is_empty() {
            return Err(InstallerError::config("keymap cannot be empty"));
        }

        Ok(())
    }

    /// Where the generated filesystem table is written.
    pub fn fstab_path(&self) -> PathBuf {
        self.chroot_path.join("etc/fstab")
    }
}

fn require_absolute(name: &str, path: &Path) -> Result<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(InstallerError::config(format!(
            "{} must be an absolute path, got {:?}",
            name, path
        )))
    }
}
