//! VCD (Value Change Dump) export of monitored traces.
//!
//! The generated file can be opened in any waveform viewer (GTKWave, Surfer, ...). Each
//! simulated cycle is one nanosecond and each monitor one 1-bit wire in module `logsim`.
//! Cycles recorded before a monitor was added are dumped as `x`.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use logsim::{load, monitors::vcd::write_vcd};
//! use std::{fs::File, io::BufWriter, path::Path};
//!
//! let mut session = load(Path::new("circuits/counter.def"))?;
//! session.run(16)?;
//!
//! let mut file = BufWriter::new(File::create("counter.vcd")?);
//! write_vcd(session.names(), session.devices(), session.monitors(), &mut file)?;
//! # Ok(())
//! # }
//! ```

use std::io;

use anyhow::Result;
use lazy_static::*;
use regex::Regex;

use crate::{
    devices::Devices,
    monitors::{Monitors, Signal, signal_name},
    names::Names,
};

fn wire_name(name: &str) -> String {
    lazy_static! {
        static ref INVALID_RE: Regex = Regex::new(r"[^a-zA-Z0-9_]").unwrap();
    }

    INVALID_RE.replace_all(name, "_").into_owned()
}

fn vcd_value(signal: Signal) -> ::vcd::Value {
    match signal {
        Signal::Low => ::vcd::Value::V0,
        Signal::High => ::vcd::Value::V1,
        Signal::Blank => ::vcd::Value::X,
    }
}

/// Writes every monitored trace to `w` in VCD format.
pub fn write_vcd(
    names: &Names,
    devices: &Devices,
    monitors: &Monitors,
    w: &mut dyn io::Write,
) -> Result<()> {
    let mut writer = ::vcd::Writer::new(w);

    writer.timescale(1, ::vcd::TimescaleUnit::NS)?;
    writer.add_module("logsim")?;

    let wires = monitors
        .traces(devices)
        .map(|(device, pin, trace)| {
            let id = writer.add_wire(1, &wire_name(&signal_name(names, device, pin)))?;
            Ok((id, trace))
        })
        .collect::<Result<Vec<_>>>()?;

    writer.upscope()?;
    writer.enddefinitions()?;

    let cycles = wires.iter().map(|(_, trace)| trace.len()).max().unwrap_or(0);
    for cycle in 0..cycles {
        writer.timestamp(cycle as u64)?;
        for (id, trace) in wires.iter() {
            // Shorter traces read as blank past their end.
            let at = |cycle: usize| trace.get(cycle).copied().unwrap_or(Signal::Blank);
            let value = at(cycle);
            if cycle == 0 || at(cycle - 1) != value {
                writer.change_scalar(*id, vcd_value(value))?;
            }
        }
    }
    writer.timestamp(cycles as u64)?;

    Ok(())
}
