//! Logic circuit definition compiler and cycle based simulator
//!
//! This library reads a small hardware description language describing a digital circuit
//! built from gates, switches, clocks and D-type flip-flops, compiles it into an in-memory
//! device network and simulates that network cycle by cycle, recording the traces of the
//! monitored signals.
//!
//! # Definition files
//!
//! A definition has three sections, always in this order:
//!
//! ```text
//! # A two input AND gate
//! [devices]
//! SW1, SW2 = SWITCH(1);
//! G1 = AND(2);
//!
//! [conns]
//! G1.I1 = SW1;
//! G1.I2 = SW2;
//!
//! [monit]
//! G1;
//! ```
//!
//! Parsing is error tolerant: every problem in the file is reported as a [`Diagnostic`]
//! with its position, and the parser carries on with the next line.
//!
//! # Main Workflows
//!
//! 1. **Check** ([`check`]): Parse a definition and print every diagnostic
//! 2. **Simulate** ([`simulate`]): Run a valid circuit and report its traces, optionally as
//!    VCD waveforms and a DOT graph of the circuit
//!
//! # Usage Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use logsim::load;
//! use std::path::Path;
//!
//! let mut session = load(Path::new("circuits/counter.def"))?;
//! session.run(8)?;
//!
//! let (monitored, _) = session.signal_names();
//! for name in monitored {
//!     println!("{}: {:?}", name, session.trace(&name));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - **[`names`]**: Symbol table interning every identifier
//! - **[`scanner`]**: Lexical analysis of definition files
//! - **[`parser`]**: Error tolerant recursive descent parser building the circuit
//! - **[`devices`]**: Device kinds, pins and the device registry
//! - **[`network`]**: Connections and the simulation engine
//! - **[`monitors`]**: Signal probes, traces and their report and VCD writers
//! - **[`session`]**: One loaded circuit and the driver entry points

use clap::Parser;
use std::{error::Error, fmt};

pub mod check;
pub mod devices;
pub mod errors;
pub mod monitors;
pub mod names;
pub mod network;
pub mod parser;
pub mod scanner;
pub mod session;
pub mod simulate;

pub use check::{CheckArgs, check_main};
pub use errors::{Diagnostic, ErrorKind};
pub use session::{LoadError, Session, load, load_with_limits};
pub use simulate::{SimulateArgs, simulate_main};

/// Resource bounds that keep the parser and the simulator from running away on bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Most declarations accepted in one section.
    pub max_block_lines: usize,
    /// Most relaxation passes allowed for the network to settle in one cycle. The
    /// network raises it to one more than its device count, so only feedback loops
    /// can hit it.
    pub max_settle_passes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_block_lines: 500,
            max_settle_passes: 20,
        }
    }
}

/// Application-level errors of the command-line tools.
#[derive(Debug, PartialEq, Eq)]
pub enum AppError {
    /// The definition file has errors; holds how many.
    InvalidCircuit(usize),
    /// A `--set` option names something that is not a switch.
    UnknownSwitch(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidCircuit(1) => write!(f, "Circuit definition has 1 error"),
            AppError::InvalidCircuit(count) => {
                write!(f, "Circuit definition has {} errors", count)
            }
            AppError::UnknownSwitch(name) => write!(f, "'{}' is not a switch", name),
        }
    }
}

impl Error for AppError {}

/// Command-line interface arguments for the logic simulator.
///
/// This enum defines the main commands available:
/// - `Check`: Validate a circuit definition
/// - `Simulate`: Run a circuit and report its monitored signals
#[derive(Debug, Parser)]
#[clap(
    name = "logsim",
    about = "Logic circuit definition checker and cycle based simulator"
)]
pub enum CLIArguments {
    /// Parse a circuit definition and print every error found.
    Check(CheckArgs),
    /// Simulate a circuit for a number of cycles and report the monitored signals.
    Simulate(SimulateArgs),
}
