//! archstrap library
//!
//! Interactive Arch Linux installation in two phases. `logic::bootstrap` runs
//! from the install medium and leaves a mounted system with the base packages
//! installed; `logic::postinstall` runs inside it and configures accounts,
//! locale, time and hostname.

pub mod command_executor;
pub mod config;
pub mod engine;
pub mod error;
pub mod files;
pub mod logic;
pub mod probe;
pub mod prompt;
pub mod sanity;
pub mod signals;
pub mod types;

pub use command_executor::{CommandRunner, SystemCommand, SystemRunner};
pub use config::InstallerConfig;
pub use error::{InstallerError, Result};
pub use logic::{PhaseReport, SkipReason, StepOutcome};
