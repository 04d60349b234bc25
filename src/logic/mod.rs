//! The two installation phases.
//!
//! Each phase is a fixed, linear sequence of steps. A step either completes,
//! is skipped for a recorded reason, or is a known gap reported as not
//! implemented. Any failure aborts the phase with the error; there is no
//! rollback of earlier steps.
//!
//! # Modules
//!
//! - `bootstrap`: runs from the install medium: disk, swap, packages, fstab
//! - `postinstall`: runs inside the new system: accounts, locale, hosts

pub mod bootstrap;
pub mod postinstall;

use std::fmt;

use strum::Display;
use tracing::{info, warn};

/// The two halves of an installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    /// From the install medium, before the new system exists.
    Bootstrap,
    /// Inside the new system.
    Configure,
}

// ============================================================================
// Step Outcomes
// ============================================================================

/// What happened when a step ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step did its work.
    Completed,
    /// The step had nothing to do.
    Skipped(SkipReason),
    /// The step is a deliberate gap; the operator has to do it by hand.
    NotImplemented(&'static str),
}

/// Reason a step was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// An account with the admin UID is already present.
    AccountExists { uid: u32 },
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Skipped(reason) => write!(f, "skipped: {}", reason),
            Self::NotImplemented(note) => write!(f, "not implemented: {}", note),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountExists { uid } => write!(f, "account with UID {} already exists", uid),
        }
    }
}

// ============================================================================
// Phase Report
// ============================================================================

/// Outcome of one step of a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport<S> {
    pub step: S,
    pub outcome: StepOutcome,
}

/// Ordered outcomes of every step a phase ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport<S> {
    steps: Vec<StepReport<S>>,
}

impl<S> Default for PhaseReport<S> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<S: Copy + PartialEq + fmt::Display> PhaseReport<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, step: S, outcome: StepOutcome) {
        match &outcome {
            StepOutcome::Completed => info!(%step, "step completed"),
            StepOutcome::Skipped(reason) => info!(%step, %reason, "step skipped"),
            StepOutcome::NotImplemented(note) => {
                warn!(%step, note, "step not implemented");
                progress(&format!("{} is not performed by this installer: {}", step, note));
            }
        }
        self.steps.push(StepReport { step, outcome });
    }

    pub fn steps(&self) -> &[StepReport<S>] {
        &self.steps
    }

    /// Steps in the order they ran.
    pub fn order(&self) -> Vec<S> {
        self.steps.iter().map(|r| r.step).collect()
    }

    pub fn outcome_of(&self, step: S) -> Option<&StepOutcome> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.outcome)
    }

    /// Steps that were left to the operator.
    pub fn not_implemented(&self) -> Vec<S> {
        self.steps
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::NotImplemented(_)))
            .map(|r| r.step)
            .collect()
    }
}

/// Operator-facing progress line on stdout, preceded by a blank line.
pub(crate) fn progress(message: &str) {
    println!("\n{}", message);
}
