//! Interactive parameter collection.
//!
//! Every question is a read-validate-retry loop: the prompt is repeated until
//! the answer is acceptable. There is no retry limit. Closing standard input
//! ends the loop with `InstallerError::Cancelled`, since no further answer can
//! ever arrive.

use std::io::{self, BufRead, Write};

use tracing::{debug, info};

use crate::command_executor::CommandRunner;
use crate::error::{InstallerError, Result};
use crate::probe;
use crate::types::{
    BootstrapParameters, Disk, Hostname, InstallParameters, ProcessorBrand, Username,
};

pub const INSTALL_CONFIRM: &str = "
This install script assumes this computer boots with UEFI and is connected to the Internet through DHCP.
Any other type of configuration is not supported.
Confirm installation? (y/n)
=> ";

pub const INSTALL_DISK: &str = "
Available disks:

{choices}

Which disk should Arch be installed to? (CAUTION: the disk will be completely erased!)
=> ";

pub const PROCESSOR_BRAND: &str = "
What is the brand of your CPU? ({choices})
=> ";

pub const HOSTNAME: &str = "
What is the hostname of this computer?
=> ";

pub const ADMIN_USERNAME: &str = "
What is the name of the admin user?
=> ";

pub const ADMIN_PASSWORD: &str = "
Please now input the password for the admin user:
";

/// Operator's answer to the installation warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Proceed,
    Declined,
}

/// Line-oriented question/answer channel, normally stdin/stdout.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `prompt` and read one answer line (without its line ending).
    ///
    /// Returns `None` when the line is not valid UTF-8.
    pub fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;

        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Err(InstallerError::Cancelled);
        }
        if line.ends_with(b"\n") {
            line.pop();
            if line.ends_with(b"\r") {
                line.pop();
            }
        }
        Ok(String::from_utf8(line).ok())
    }

    /// Repeat `prompt` until `accept` maps the answer to a value.
    pub fn ask_until<T>(
        &mut self,
        prompt: &str,
        mut accept: impl FnMut(&str) -> Option<T>,
    ) -> Result<T> {
        loop {
            match self.ask(prompt)? {
                Some(answer) => {
                    if let Some(value) = accept(&answer) {
                        return Ok(value);
                    }
                    debug!(answer, "rejected answer, asking again");
                }
                None => debug!("answer is not valid UTF-8, asking again"),
            }
        }
    }

    /// Print a message followed by a newline.
    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        self.output.flush()?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// Block until the operator answers exactly one of `Y`, `y`, `N`, `n`.
pub fn confirm_installation<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
) -> Result<Confirmation> {
    let confirmation = console.ask_until(INSTALL_CONFIRM, |answer| match answer {
        "Y" | "y" => Some(Confirmation::Proceed),
        "N" | "n" => Some(Confirmation::Declined),
        _ => None,
    })?;

    info!(?confirmation, "installation confirmation");
    Ok(confirmation)
}

/// Ask for one of `choices`; anything else is asked again.
pub fn select_install_disk<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    choices: &[Disk],
) -> Result<Disk> {
    if choices.is_empty() {
        return Err(InstallerError::probe("no installable disk was found"));
    }

    let listing = choices
        .iter()
        .map(|disk| format!(" -> {}", disk))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = INSTALL_DISK.replace("{choices}", &listing);

    console.ask_until(&prompt, |answer| {
        choices.iter().find(|disk| disk.as_str() == answer).cloned()
    })
}

/// Ask for the CPU vendor; `other` means no microcode package.
pub fn select_processor_brand<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
) -> Result<Option<ProcessorBrand>> {
    let prompt = PROCESSOR_BRAND.replace("{choices}", &ProcessorBrand::choices().join(", "));
    console.ask_until(&prompt, ProcessorBrand::from_choice)
}

pub fn select_hostname<R: BufRead, W: Write>(console: &mut Console<R, W>) -> Result<Hostname> {
    console.ask_until(HOSTNAME, |answer| Hostname::new(answer).ok())
}

pub fn select_admin_username<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
) -> Result<Username> {
    console.ask_until(ADMIN_USERNAME, |answer| Username::new(answer).ok())
}

/// Collect the bootstrap parameters: disk and CPU vendor from the operator,
/// memory size from the system.
pub fn gather_bootstrap_parameters<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    runner: &mut dyn CommandRunner,
) -> Result<BootstrapParameters> {
    let disks = probe::available_disks(runner)?;
    let install_disk = select_install_disk(console, &disks)?;
    let processor_brand = select_processor_brand(console)?;
    let total_memory = probe::total_memory(runner)?;

    Ok(BootstrapParameters {
        install_disk,
        processor_brand,
        total_memory,
    })
}

/// Collect the post-install parameters.
pub fn gather_install_parameters<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
) -> Result<InstallParameters> {
    Ok(InstallParameters {
        hostname: select_hostname(console)?,
        admin_username: select_admin_username(console)?,
    })
}
