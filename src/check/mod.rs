//! Validation of circuit definition files.
//!
//! [`check_main`] parses a definition without simulating it and prints every diagnostic,
//! each rendered with the offending line and a caret under the failing token:
//!
//! ```text
//! Error - InvalidNumber: Invalid input count 20 for 'G1', AND gates have 1 to 16 inputs
//! Line 2 Char 1:
//! G1 = AND(20);
//! ^
//! Description: The number is out of range for this device.
//! ```

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::*;
use clap::Parser;
use log::info;

use crate::{AppError, Diagnostic, Limits, LoadError, Session, load_with_limits};

/// Command-line arguments for the check command.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Circuit definition file
    pub input: PathBuf,

    /// Maximum number of declarations in one section
    #[clap(long)]
    pub max_lines: Option<usize>,
}

/// Writes each diagnostic followed by a blank line.
pub fn write_diagnostics(writer: &mut dyn Write, diagnostics: &[Diagnostic]) -> Result<()> {
    for diagnostic in diagnostics {
        writeln!(writer, "{}\n", diagnostic)?;
    }
    Ok(())
}

/// Loads a circuit, printing its diagnostics to stderr if it has any.
pub fn load_circuit(input: &Path, limits: Limits) -> Result<Session> {
    match load_with_limits(input, limits) {
        std::result::Result::Ok(session) => Ok(session),
        Err(LoadError::Diagnostics(diagnostics)) => {
            write_diagnostics(&mut io::stderr(), &diagnostics)?;
            Err(AppError::InvalidCircuit(diagnostics.len()).into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Parse a circuit definition and report whether it is valid.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use logsim::check::{CheckArgs, check_main};
///
/// let args = CheckArgs {
///     input: "circuits/counter.def".into(),
///     max_lines: None,
/// };
///
/// check_main(args)?;
/// # Ok(())
/// # }
/// ```
pub fn check_main(args: CheckArgs) -> Result<()> {
    let CheckArgs { input, max_lines } = args;

    let defaults = Limits::default();
    let limits = Limits {
        max_block_lines: max_lines.unwrap_or(defaults.max_block_lines),
        ..defaults
    };

    let session = load_circuit(&input, limits)?;
    let (monitored, unmonitored) = session.signal_names();
    info!("{} has no errors", input.display());
    println!(
        "{}: {} devices, {} of {} outputs monitored",
        input.display(),
        session.devices().len(),
        monitored.len(),
        monitored.len() + unmonitored.len()
    );

    Ok(())
}
