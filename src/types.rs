//! Validated value types for archstrap
//!
//! Every value here is checked once at construction and immutable afterwards,
//! so the installation steps never have to re-validate what they are handed.

use std::fmt;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::{InstallerError, Result};

/// Prefix shared by every block device path.
const DEV_PREFIX: &str = "/dev/";

/// A whole block device, e.g. `/dev/sda`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Disk(String);

impl Disk {
    /// Build a disk from a path matching `^/dev/[a-z]+$`.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if Self::is_valid_path(&path) {
            Ok(Self(path))
        } else {
            Err(InstallerError::InvalidDisk(path))
        }
    }

    /// Returns true if `path` names a whole disk.
    pub fn is_valid_path(path: &str) -> bool {
        path.strip_prefix(DEV_PREFIX)
            .is_some_and(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_lowercase()))
    }

    /// The numbered partition on this disk (`/dev/sda` + 2 = `/dev/sda2`).
    pub fn partition(&self, number: u32) -> Result<Partition> {
        Partition::new(format!("{}{}", self.0, number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Disk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A numbered partition of a disk, e.g. `/dev/sda1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition(String);

impl Partition {
    /// Build a partition from a path matching `^/dev/[a-z]+\d+$`.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if Self::is_valid_path(&path) {
            Ok(Self(path))
        } else {
            Err(InstallerError::InvalidPartition(path))
        }
    }

    /// Returns true if `path` names a partition.
    pub fn is_valid_path(path: &str) -> bool {
        let Some(name) = path.strip_prefix(DEV_PREFIX) else {
            return false;
        };
        let digits_at = name.find(|c: char| c.is_ascii_digit()).unwrap_or(name.len());
        let (letters, digits) = name.split_at(digits_at);

        !letters.is_empty()
            && letters.bytes().all(|b| b.is_ascii_lowercase())
            && !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two partitions created on the install disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionMap {
    /// FAT32 EFI system partition
    pub boot: Partition,
    /// ext4 root filesystem
    pub root: Partition,
}

/// A strictly positive amount of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteCount(u64);

impl ByteCount {
    pub fn new(amount: i64) -> Result<Self> {
        if amount > 0 {
            Ok(Self(amount.unsigned_abs()))
        } else {
            Err(InstallerError::InvalidByteCount(amount))
        }
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ByteCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// CPU vendor, used to pick a microcode package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ProcessorBrand {
    Amd,
    Intel,
}

impl ProcessorBrand {
    /// Token accepted at the processor prompt for any other vendor.
    pub const OTHER: &'static str = "other";

    /// Vendor microcode package (`amd-ucode`, `intel-ucode`).
    pub fn microcode_package(self) -> String {
        format!("{}-ucode", self)
    }

    /// Every token the processor prompt accepts, brands first.
    pub fn choices() -> Vec<String> {
        Self::iter()
            .map(|brand| brand.to_string())
            .chain(std::iter::once(Self::OTHER.to_string()))
            .collect()
    }

    /// Map a prompt answer to a brand.
    ///
    /// `Some(None)` means "other vendor"; `None` means the token is not a choice.
    /// Matching is exact: `AMD` is not accepted.
    pub fn from_choice(token: &str) -> Option<Option<Self>> {
        if token == Self::OTHER {
            return Some(None);
        }
        Self::iter()
            .find(|brand| brand.to_string() == token)
            .map(Some)
    }
}

/// Machine hostname, limited to `[a-z0-9-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hostname(String);

impl Hostname {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if Self::is_valid(&name) {
            Ok(Self(name))
        } else {
            Err(InstallerError::InvalidHostname(name))
        }
    }

    pub fn is_valid(name: &str) -> bool {
        !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Admin account name, limited to ASCII word characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if Self::is_valid(&name) {
            Ok(Self(name))
        } else {
            Err(InstallerError::InvalidUsername(name))
        }
    }

    pub fn is_valid(name: &str) -> bool {
        !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the bootstrap phase asks for or probes, collected up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapParameters {
    pub install_disk: Disk,
    pub processor_brand: Option<ProcessorBrand>,
    pub total_memory: ByteCount,
}

/// Everything the post-install phase asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallParameters {
    pub hostname: Hostname,
    pub admin_username: Username,
}
