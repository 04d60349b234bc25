//! System probes: available disks and total memory.
//!
//! Both probes shell out through the `CommandRunner` and parse the text the
//! tools print. Parsing is split from execution so it can be tested on
//! captured output.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::{debug, info};

use crate::command_executor::CommandRunner;
use crate::engine::commands;
use crate::error::{InstallerError, Result};
use crate::types::{ByteCount, Disk};

/// Disk paths announced by `fdisk --list`, loop devices excluded.
pub fn parse_disk_listing(fdisk_output: &str) -> Result<BTreeSet<String>> {
    let disk_line = Regex::new(r"(?m)^Disk (/dev/[a-z]+):")?;
    let loop_device = Regex::new(r"^/dev/loop\d+$")?;

    Ok(disk_line
        .captures_iter(fdisk_output)
        .map(|caps| caps[1].to_string())
        .filter(|path| !loop_device.is_match(path))
        .collect())
}

/// Total physical memory from the `Mem:` row of `free --bytes`.
pub fn parse_total_memory(free_output: &str) -> Result<ByteCount> {
    let mem_line = Regex::new(r"(?m)^Mem: +(?P<bytes>\d+) ")?;

    let caps = mem_line
        .captures(free_output)
        .ok_or_else(|| InstallerError::probe("no `Mem:` row in memory report"))?;
    let amount: i64 = caps["bytes"]
        .parse()
        .map_err(|e| InstallerError::probe(format!("unreadable memory size: {}", e)))?;

    ByteCount::new(amount)
}

/// Disks the operator may install to.
pub fn available_disks(runner: &mut dyn CommandRunner) -> Result<Vec<Disk>> {
    let output = runner.capture(&commands::list_disks())?;
    let disks = parse_disk_listing(&output)?
        .into_iter()
        .map(Disk::new)
        .collect::<Result<Vec<_>>>()?;

    debug!(?disks, "probed disks");
    Ok(disks)
}

/// Installed physical memory.
pub fn total_memory(runner: &mut dyn CommandRunner) -> Result<ByteCount> {
    let output = runner.capture(&commands::report_memory())?;
    let total = parse_total_memory(&output)?;

    info!(bytes = total.get(), "probed total memory");
    Ok(total)
}
