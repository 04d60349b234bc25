//! Operator interrupt handling.
//!
//! SIGINT ends the installer immediately with status 1, whatever step is in
//! progress. Nothing is rolled back. The foreground child receives the same
//! SIGINT from the terminal and stops on its own.

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::thread;

use tracing::warn;

/// Exit status used for an interrupted run.
pub const INTERRUPTED_EXIT_CODE: i32 = 1;

/// Install the interrupt handler. Call once at program start.
pub fn init_signal_handlers() -> Result<(), std::io::Error> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;

    thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            let signal_name = match sig {
                SIGINT => "SIGINT",
                SIGTERM => "SIGTERM",
                _ => "UNKNOWN",
            };
            warn!("Received {}, aborting installation", signal_name);
            println!("\nInstallation interrupted.");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });

    Ok(())
}
