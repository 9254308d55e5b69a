//! A loaded circuit and the driver entry points used by the front end.
//!
//! A [`Session`] owns the symbol table, the network (and with it the device registry) and
//! the monitor set of one definition file. Loading a different file builds a new session.
//!
//! # Example
//!
//! ```
//! use logsim::{Session, monitors::Signal};
//!
//! let source = "
//!     [devices] SW1, SW2 = SWITCH(1); G1 = AND(2);
//!     [conns]   G1.I1 = SW1; G1.I2 = SW2;
//!     [monit]   G1;
//! ";
//! let mut session = Session::from_source(source).unwrap();
//!
//! session.run(1).unwrap();
//! let sw2 = session.device_id("SW2").unwrap();
//! session.set_switch(sw2, false).unwrap();
//! session.run(1).unwrap();
//!
//! assert_eq!(session.trace("G1"), Some(&[Signal::High, Signal::Low][..]));
//! ```

use std::{
    error::Error,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    Limits,
    devices::{DeviceError, Devices},
    errors::Diagnostic,
    monitors::{MonitorError, Monitors, Signal},
    names::{NameId, Names},
    network::{Network, NetworkError},
    parser::parse_source,
};

/// Why a circuit could not be loaded.
#[derive(Debug)]
pub enum LoadError {
    Io(PathBuf, io::Error),
    /// The definition has errors. Holds every diagnostic, lexical ones first.
    Diagnostics(Vec<Diagnostic>),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(path, err) => write!(f, "Could not read {}: {}", path.display(), err),
            LoadError::Diagnostics(diagnostics) => write!(
                f,
                "Circuit definition has {} error{}",
                diagnostics.len(),
                if diagnostics.len() == 1 { "" } else { "s" }
            ),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Io(_, err) => Some(err),
            LoadError::Diagnostics(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    names: Names,
    network: Network,
    monitors: Monitors,
    cycles_completed: usize,
}

impl Session {
    pub fn from_source(source: &str) -> Result<Session, LoadError> {
        Self::from_source_with_limits(source, Limits::default())
    }

    /// Scans and parses `source`. Fails with every diagnostic if the circuit is invalid.
    pub fn from_source_with_limits(source: &str, limits: Limits) -> Result<Session, LoadError> {
        let mut names = Names::new();
        let mut network = Network::new(limits.max_settle_passes);
        let mut monitors = Monitors::new();

        let (ok, diagnostics) =
            parse_source(source, &mut names, &mut network, &mut monitors, limits);
        if !ok {
            return Err(LoadError::Diagnostics(diagnostics));
        }

        info!(
            "Loaded {} devices with {} monitors",
            network.devices().len(),
            monitors.len()
        );
        Ok(Session {
            names,
            network,
            monitors,
            cycles_completed: 0,
        })
    }

    pub fn names(&self) -> &Names {
        &self.names
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn devices(&self) -> &Devices {
        self.network.devices()
    }

    pub fn monitors(&self) -> &Monitors {
        &self.monitors
    }

    /// Number of cycles recorded since loading or the last reset.
    pub fn cycles_completed(&self) -> usize {
        self.cycles_completed
    }

    pub fn device_id(&self, name: &str) -> Option<NameId> {
        self.names
            .query(name)
            .filter(|&id| self.network.devices().contains(id))
    }

    pub fn execute_network(&mut self) -> Result<(), NetworkError> {
        self.network.execute_network()
    }

    /// Appends the current value of every monitored signal to its trace.
    pub fn record_signals(&mut self) {
        self.monitors.record_signals(self.network.devices());
        self.cycles_completed += 1;
    }

    /// Executes and records `cycles` cycles, stopping at the first unstable one.
    pub fn run(&mut self, cycles: usize) -> Result<(), NetworkError> {
        for _ in 0..cycles {
            self.execute_network()?;
            self.record_signals();
        }
        info!(
            "Ran {} cycles, {} completed in total",
            cycles, self.cycles_completed
        );
        Ok(())
    }

    /// Clears traces and signal history. Devices, connections, monitors and switch
    /// positions are kept.
    pub fn reset(&mut self) {
        self.network.reset();
        self.monitors.reset();
        self.cycles_completed = 0;
        debug!("Session reset");
    }

    pub fn set_switch(&mut self, id: NameId, value: bool) -> Result<(), DeviceError> {
        self.network.devices_mut().set_switch(id, value)
    }

    /// Starts or stops monitoring a signal such as `G1` or `FF1.QBAR`. Returns whether it
    /// is monitored afterwards.
    pub fn toggle_monitor(&mut self, name: &str) -> Result<bool, MonitorError> {
        self.monitors.toggle_monitor(
            &self.names,
            self.network.devices(),
            name,
            self.cycles_completed,
        )
    }

    /// Monitored and unmonitored signal names, in declaration order.
    pub fn signal_names(&self) -> (Vec<String>, Vec<String>) {
        self.monitors
            .signal_names(&self.names, self.network.devices())
    }

    pub fn trace(&self, name: &str) -> Option<&[Signal]> {
        self.monitors.trace(&self.names, name)
    }
}

/// Reads and loads a circuit definition file with the default [`Limits`].
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use logsim::load;
/// use std::path::Path;
///
/// let mut session = load(Path::new("circuits/and_gate.def"))?;
/// session.run(4)?;
/// # Ok(())
/// # }
/// ```
pub fn load(path: &Path) -> Result<Session, LoadError> {
    load_with_limits(path, Limits::default())
}

pub fn load_with_limits(path: &Path, limits: Limits) -> Result<Session, LoadError> {
    let source =
        fs::read_to_string(path).map_err(|err| LoadError::Io(path.to_path_buf(), err))?;
    debug!("Read {} bytes from {}", source.len(), path.display());
    Session::from_source_with_limits(&source, limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{devices::OutputPin, errors::ErrorKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const AND_GATE: &str = "[devices]
SW1, SW2 = SWITCH(1);
G1 = AND(2);
[conns]
G1.I1 = SW1;
G1.I2 = SW2;
[monit]
G1;
";

    const COUNTER: &str = "[devices]
CK = CLOCK(1);
FF1, FF2 = DTYPE;
X = XOR;
[conns]
FF1.CLK = CK;
FF2.CLK = CK;
FF1.DATA = FF1.QBAR;
X = FF1.Q, FF2.Q;
FF2.DATA = X;
[monit]
CK, FF1.Q, FF2.Q;
";

    fn signals(pattern: &str) -> Vec<Signal> {
        pattern
            .chars()
            .map(|c| match c {
                '#' => Signal::High,
                '-' => Signal::Low,
                _ => Signal::Blank,
            })
            .collect()
    }

    #[test]
    fn test_and_gate_end_to_end() {
        let mut session = Session::from_source(AND_GATE).expect("Circuit should load");
        assert_eq!(session.devices().len(), 3);

        session.execute_network().unwrap();
        session.record_signals();
        assert_eq!(session.trace("G1"), Some(&[Signal::High][..]));

        let sw2 = session.device_id("SW2").unwrap();
        session.set_switch(sw2, false).unwrap();
        session.execute_network().unwrap();
        session.record_signals();
        assert_eq!(session.trace("G1"), Some(&[Signal::High, Signal::Low][..]));
        assert_eq!(session.cycles_completed(), 2);
    }

    #[test]
    fn test_counter_traces() {
        let mut session = Session::from_source(COUNTER).unwrap();
        session.run(8).unwrap();

        assert_eq!(session.trace("CK"), Some(&signals("#-#-#-#-")[..]));
        assert_eq!(session.trace("FF1.Q"), Some(&signals("##--##--")[..]));
        assert_eq!(session.trace("FF2.Q"), Some(&signals("--####--")[..]));
    }

    #[test]
    fn test_identical_runs_are_deterministic() {
        let traces = || {
            let mut session = Session::from_source(COUNTER).unwrap();
            session.run(32).unwrap();
            ["CK", "FF1.Q", "FF2.Q"].map(|name| session.trace(name).unwrap().to_vec())
        };
        assert_eq!(traces(), traces());
    }

    #[test]
    fn test_q_and_qbar_are_complements() {
        let mut session = Session::from_source(COUNTER).unwrap();
        let ids = [
            session.device_id("FF1").unwrap(),
            session.device_id("FF2").unwrap(),
        ];
        for _ in 0..16 {
            session.run(1).unwrap();
            for id in ids {
                let q = session.devices().output(id, OutputPin::Q);
                let qbar = session.devices().output(id, OutputPin::QBar);
                assert_eq!(q.map(|q| !q), qbar);
            }
        }
    }

    #[test]
    fn test_toggle_monitor_mid_run() {
        let mut session = Session::from_source(AND_GATE).unwrap();
        session.run(2).unwrap();

        assert_eq!(session.toggle_monitor("SW1"), Ok(true));
        session.run(1).unwrap();
        assert_eq!(session.trace("SW1"), Some(&signals("  #")[..]));

        let before = session.signal_names();
        assert_eq!(session.toggle_monitor("SW2"), Ok(true));
        assert_eq!(session.toggle_monitor("SW2"), Ok(false));
        assert_eq!(session.signal_names(), before);
        assert_eq!(
            before,
            (
                vec!["SW1".to_owned(), "G1".to_owned()],
                vec!["SW2".to_owned()]
            )
        );
        assert!(session.toggle_monitor("G2").is_err());
    }

    #[test]
    fn test_reset_keeps_monitors_and_switches() {
        let mut session = Session::from_source(AND_GATE).unwrap();
        let sw1 = session.device_id("SW1").unwrap();
        session.set_switch(sw1, false).unwrap();
        session.run(3).unwrap();

        session.reset();
        assert_eq!(session.cycles_completed(), 0);
        assert_eq!(session.trace("G1"), Some(&[][..]));
        assert_eq!(session.devices().output(sw1, OutputPin::Out), Some(false));

        session.run(1).unwrap();
        assert_eq!(session.trace("G1"), Some(&[Signal::Low][..]));
    }

    #[test]
    fn test_deep_reverse_chain_is_stable() {
        let mut source = String::from("[devices]\nSW = SWITCH(1);\n");
        for i in (0..30).rev() {
            source.push_str(&format!("N{} = NAND(1);\n", i));
        }
        source.push_str("[conns]\nN0 = SW;\n");
        for i in 1..30 {
            source.push_str(&format!("N{} = N{};\n", i, i - 1));
        }
        source.push_str("[monit]\nN29;\n");

        let mut session = Session::from_source(&source).unwrap();
        session.run(2).unwrap();
        assert_eq!(session.trace("N29"), Some(&signals("##")[..]));
    }

    #[test]
    fn test_unstable_circuit() {
        let source = "[devices] SW = SWITCH(1); N = NAND(2); [conns] N = SW, N; [monit] N;";
        let mut session = Session::from_source(source).unwrap();

        assert_eq!(
            session.run(1),
            Err(NetworkError::Unstable {
                passes: Limits::default().max_settle_passes
            })
        );
        assert_eq!(session.cycles_completed(), 0);
    }

    #[test]
    fn test_invalid_source() {
        match Session::from_source("[devices] G1 = AND(20); [conns] [monit]") {
            Err(LoadError::Diagnostics(diagnostics)) => {
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(diagnostics[0].kind, ErrorKind::InvalidNumber);
            }
            other => panic!("Expected diagnostics, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().expect("Should create temp file");
        file.write_all(AND_GATE.as_bytes()).unwrap();

        let session = load(file.path()).expect("Should load circuit");
        assert_eq!(session.devices().len(), 3);

        let missing = file.path().with_extension("missing");
        assert!(matches!(load(&missing), Err(LoadError::Io(path, _)) if path == missing));
    }
}
