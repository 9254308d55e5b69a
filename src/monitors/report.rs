use std::io::Write;

use anyhow::*;
use itertools::Itertools;
use prettytable::*;

use crate::{
    devices::Devices,
    monitors::{Monitors, signal_name},
    names::Names,
};

/// Writes the monitored traces as a table, one row per signal.
///
/// Each cycle is one character: `#` high, `-` low, blank before the signal was monitored.
///
/// ```text
/// Simulated 4 cycles:
///  Signal | Trace
/// --------+-------
///  SW1    | ####
///  G1     | ##--
/// ```
pub fn write_report(
    writer: &mut dyn Write,
    names: &Names,
    devices: &Devices,
    monitors: &Monitors,
    cycles: usize,
) -> Result<()> {
    let mut table = Table::new();
    table.set_titles(row!["Signal", "Trace"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    for (device, pin, trace) in monitors.traces(devices) {
        table.add_row(row![
            signal_name(names, device, pin),
            trace.iter().join("")
        ]);
    }

    writeln!(
        writer,
        "Simulated {} {}:",
        cycles,
        if cycles == 1 { "cycle" } else { "cycles" }
    )?;
    table.print(writer)?;

    Ok(())
}
