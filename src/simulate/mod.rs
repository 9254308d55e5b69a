//! Simulation runs from the command line.
//!
//! [`simulate_main`] loads a circuit, applies the requested switch settings and monitor
//! changes, runs it for a number of cycles and writes the traces:
//!
//! - **Report** (stdout or file): one row per monitored signal, `#` high and `-` low
//! - **VCD** (optional): waveforms for a viewer such as GTKWave
//! - **DOT** (optional): the circuit as a Graphviz graph
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use logsim::simulate::{SimulateArgs, simulate_main};
//!
//! let args = SimulateArgs {
//!     input: "circuits/and_gate.def".into(),
//!     cycles: 4,
//!     switches: vec![("SW2".to_owned(), false)],
//!     toggles: vec!["SW1".to_owned()],
//!     report: None,
//!     vcd: Some("and_gate.vcd".into()),
//!     dot: None,
//!     max_passes: None,
//!     max_lines: None,
//! };
//!
//! simulate_main(args)?;
//! # Ok(())
//! # }
//! ```

use std::{fs, io::Write, path::PathBuf};

use anyhow::*;
use clap::Parser;
use log::info;
use petgraph::dot::Dot;

use crate::{
    AppError, Limits,
    check::load_circuit,
    monitors::{report::write_report, vcd::write_vcd},
};

/// Command-line arguments for the simulate command.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Circuit definition file
    pub input: PathBuf,

    /// Number of cycles to simulate
    #[clap(short('n'), long, default_value_t = 10)]
    pub cycles: usize,

    /// Set a switch before the run, e.g. --set SW1=0
    #[clap(long = "set", value_name = "NAME=0|1", value_parser = parse_switch_setting)]
    pub switches: Vec<(String, bool)>,

    /// Start or stop monitoring a signal before the run, e.g. --toggle FF1.QBAR
    #[clap(long = "toggle", value_name = "SIGNAL")]
    pub toggles: Vec<String>,

    /// Report file for the traces (default: stdout)
    #[clap(long, short)]
    pub report: Option<PathBuf>,

    /// VCD waveform file with the monitored traces
    #[clap(long)]
    pub vcd: Option<PathBuf>,

    /// DOT file displaying the circuit
    #[clap(long)]
    pub dot: Option<PathBuf>,

    /// Maximum number of passes for the network to settle in one cycle
    #[clap(long)]
    pub max_passes: Option<usize>,

    /// Maximum number of declarations in one section
    #[clap(long)]
    pub max_lines: Option<usize>,
}

/// Parses a `NAME=0` or `NAME=1` switch setting.
pub fn parse_switch_setting(setting: &str) -> std::result::Result<(String, bool), String> {
    let (name, value) = setting
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=0 or NAME=1, found '{}'", setting))?;
    let value = match value.trim() {
        "0" => false,
        "1" => true,
        other => return Err(format!("switch value must be 0 or 1, found '{}'", other)),
    };
    std::result::Result::Ok((name.trim().to_owned(), value))
}

/// Simulate a circuit and write its monitored traces.
pub fn simulate_main(args: SimulateArgs) -> Result<()> {
    let SimulateArgs {
        input,
        cycles,
        switches,
        toggles,
        report,
        vcd,
        dot,
        max_passes,
        max_lines,
    } = args;

    let defaults = Limits::default();
    let limits = Limits {
        max_block_lines: max_lines.unwrap_or(defaults.max_block_lines),
        max_settle_passes: max_passes.unwrap_or(defaults.max_settle_passes),
    };

    // Create writer for output (file or stdout)
    let mut writer: Box<dyn Write> = match report {
        Some(path) => Box::new(fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };

    let mut session = load_circuit(&input, limits)?;

    for (name, value) in switches {
        let id = session
            .device_id(&name)
            .ok_or_else(|| AppError::UnknownSwitch(name.clone()))?;
        session
            .set_switch(id, value)
            .map_err(|_| AppError::UnknownSwitch(name.clone()))?;
        info!("Switch {} set to {}", name, u8::from(value));
    }

    for name in toggles {
        let monitored = session.toggle_monitor(&name)?;
        info!(
            "{} {}",
            if monitored { "Monitoring" } else { "Stopped monitoring" },
            name
        );
    }

    if let Some(filename) = dot {
        let graph = session.network().graph(session.names());
        fs::write(filename, format!("{}", Dot::new(&graph)))?;
    }

    let run = session.run(cycles).with_context(|| {
        format!(
            "Simulation stopped after {} of {} cycles",
            session.cycles_completed(),
            cycles
        )
    });

    write_report(
        &mut writer,
        session.names(),
        session.devices(),
        session.monitors(),
        session.cycles_completed(),
    )?;

    if let Some(filename) = vcd {
        let mut file = std::io::BufWriter::new(fs::File::create(filename)?);
        write_vcd(
            session.names(),
            session.devices(),
            session.monitors(),
            &mut file,
        )?;
    }

    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkError;
    use tempfile::TempDir;

    const AND_GATE: &str = "[devices]
SW1, SW2 = SWITCH(1);
G1 = AND(2);
[conns]
G1 = SW1, SW2;
[monit]
G1;
";

    fn args(dir: &TempDir, source: &str) -> SimulateArgs {
        let input = dir.path().join("circuit.def");
        fs::write(&input, source).expect("Failed to write test file");
        SimulateArgs {
            input,
            cycles: 4,
            switches: Vec::new(),
            toggles: Vec::new(),
            report: Some(dir.path().join("report.txt")),
            vcd: None,
            dot: None,
            max_passes: None,
            max_lines: None,
        }
    }

    #[test]
    fn test_parse_switch_setting() {
        assert_eq!(
            parse_switch_setting("SW1=0").unwrap(),
            ("SW1".to_owned(), false)
        );
        assert_eq!(
            parse_switch_setting("SW2=1").unwrap(),
            ("SW2".to_owned(), true)
        );
        assert!(parse_switch_setting("SW1").is_err());
        assert!(parse_switch_setting("SW1=2").is_err());
    }

    #[test]
    fn test_simulate_writes_outputs() {
        let dir = TempDir::new().unwrap();
        let mut args = args(&dir, AND_GATE);
        args.switches = vec![("SW2".to_owned(), false)];
        args.toggles = vec!["SW1".to_owned()];
        args.vcd = Some(dir.path().join("waves.vcd"));
        args.dot = Some(dir.path().join("circuit.dot"));

        simulate_main(args).expect("Simulation should succeed");

        let report = fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert!(report.starts_with("Simulated 4 cycles:"));
        assert!(report.contains("SW1"));
        assert!(report.contains("####"));
        assert!(report.contains("----"));

        let vcd = fs::read_to_string(dir.path().join("waves.vcd")).unwrap();
        assert!(vcd.contains("$var wire 1"));
        assert!(vcd.contains("G1"));

        let dot = fs::read_to_string(dir.path().join("circuit.dot")).unwrap();
        assert!(dot.contains("digraph"));
        assert!(dot.contains("G1 (AND)"));
        assert!(dot.contains("SW2 (SWITCH)"));
    }

    #[test]
    fn test_simulate_unknown_switch() {
        let dir = TempDir::new().unwrap();
        let mut args = args(&dir, AND_GATE);
        args.switches = vec![("G1".to_owned(), true)];

        let err = simulate_main(args).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AppError>(),
            Some(&AppError::UnknownSwitch("G1".to_owned()))
        );
    }

    #[test]
    fn test_simulate_unstable_circuit_still_reports() {
        let dir = TempDir::new().unwrap();
        let mut args = args(
            &dir,
            "[devices] SW = SWITCH(1); N = NAND(2); [conns] N = SW, N; [monit] SW;",
        );
        args.max_passes = Some(5);

        let err = simulate_main(args).unwrap_err();
        assert_eq!(
            err.downcast_ref::<NetworkError>(),
            Some(&NetworkError::Unstable { passes: 5 })
        );
        let report = fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert!(report.starts_with("Simulated 0 cycles:"));
    }
}
