//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;

use archstrap::config::SystemPaths;
use archstrap::prompt::Console;
use archstrap::{CommandRunner, InstallerConfig, InstallerError, Result, SystemCommand};

/// Records every command line and answers from a script instead of spawning.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    pub lines: Vec<String>,
    outputs: HashMap<String, String>,
    failing: HashSet<String>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, command_line: &str, output: &str) -> Self {
        self.outputs.insert(command_line.to_string(), output.to_string());
        self
    }

    pub fn failing(mut self, command_line: &str) -> Self {
        self.failing.insert(command_line.to_string());
        self
    }

    fn answer(&mut self, command: &SystemCommand) -> Result<String> {
        let line = command.to_string();
        self.lines.push(line.clone());
        if self.failing.contains(&line) {
            return Err(InstallerError::CommandFailed {
                command: line,
                code: Some(32),
            });
        }
        Ok(self.outputs.get(&line).cloned().unwrap_or_default())
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&mut self, command: &SystemCommand) -> Result<()> {
        self.answer(command).map(|_| ())
    }

    fn capture(&mut self, command: &SystemCommand) -> Result<String> {
        self.answer(command)
    }

    fn succeeds(&mut self, command: &SystemCommand) -> Result<bool> {
        match self.answer(command) {
            Ok(_) => Ok(true),
            Err(InstallerError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

pub type TestConsole = Console<Cursor<Vec<u8>>, Vec<u8>>;

/// Console whose operator types `answers`, one per line.
pub fn console(answers: &[&str]) -> TestConsole {
    let mut input = answers.join("\n");
    input.push('\n');
    Console::new(Cursor::new(input.into_bytes()), Vec::new())
}

pub fn transcript(console: TestConsole) -> String {
    String::from_utf8(console.into_output()).unwrap()
}

/// Configuration with every mount point and file under `root`.
pub fn bootstrap_config(root: &Path) -> InstallerConfig {
    let chroot = root.join("mnt");
    std::fs::create_dir_all(chroot.join("etc")).unwrap();
    let config = InstallerConfig {
        boot_dir: chroot.join("boot"),
        swapfile_path: chroot.join("swapfile"),
        chroot_path: chroot,
        ..InstallerConfig::default()
    };
    // fallocate is scripted, so the swapfile has to exist beforehand
    std::fs::write(&config.swapfile_path, b"").unwrap();
    config
}

/// A minimal target system under `root` with stock Arch configuration files.
pub fn target_system(root: &Path) -> InstallerConfig {
    let system = SystemPaths::under(root);
    std::fs::create_dir_all(root.join("etc/skel")).unwrap();
    std::fs::create_dir_all(root.join("usr/share/zoneinfo/Europe")).unwrap();
    std::fs::write(root.join("usr/share/zoneinfo/Europe/Paris"), b"TZif").unwrap();

    std::fs::write(
        &system.sudoers,
        "root ALL=(ALL) ALL\n\n## Uncomment to allow members of group wheel to execute any command\n# %wheel ALL=(ALL) ALL\n\n# %wheel ALL=(ALL) NOPASSWD: ALL\n",
    )
    .unwrap();
    std::fs::write(
        &system.pacman_conf,
        "[options]\n#UseSyslog\n#Color\n#NoProgressBar\n",
    )
    .unwrap();
    std::fs::write(
        &system.locale_gen,
        "#en_GB.UTF-8 UTF-8\n#en_US.UTF-8 UTF-8  \n#en_US ISO-8859-1\n#fr_FR.UTF-8 UTF-8  \n#fr_FR ISO-8859-1\n",
    )
    .unwrap();
    std::fs::write(&system.skel_bash_logout, "# ~/.bash_logout\n").unwrap();
    std::os::unix::fs::symlink("/usr/share/zoneinfo/UTC", &system.localtime).unwrap();

    InstallerConfig {
        system,
        ..InstallerConfig::default()
    }
}
