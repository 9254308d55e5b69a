//! Signal monitors and their recorded traces.
//!
//! A monitor is a probe on one device output. After every simulated cycle the driver calls
//! [`Monitors::record_signals`], which appends the probed value to each trace, so a trace
//! always holds one [`Signal`] per cycle. Monitors added after the simulation started are
//! back-filled with [`Signal::Blank`] for the cycles they missed.
//!
//! Signals are named after their device, with the pin appended for D-type outputs:
//! `G1`, `SW3`, `FF1.Q`, `FF1.QBAR`.

pub mod report;
pub mod vcd;

use std::{collections::HashMap, error::Error, fmt};

use log::debug;

use crate::{
    devices::{Devices, OutputPin},
    names::{NameId, Names},
};

/// Value of a signal in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Low,
    High,
    /// The signal was not monitored in this cycle.
    Blank,
}

impl From<bool> for Signal {
    fn from(value: bool) -> Self {
        if value { Signal::High } else { Signal::Low }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Signal::Low => '-',
            Signal::High => '#',
            Signal::Blank => ' ',
        };
        write!(f, "{}", c)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    DeviceAbsent(NameId),
    /// The device has no such output.
    NotOutput(NameId, OutputPin),
    MonitorPresent(NameId, OutputPin),
    /// The signal name does not denote an output of a known device.
    UnknownSignal(String),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::DeviceAbsent(id) => write!(f, "Device {} does not exist", id),
            MonitorError::NotOutput(id, pin) => {
                write!(f, "{:?} is not an output of device {}", pin, id)
            }
            MonitorError::MonitorPresent(id, pin) => {
                write!(f, "Output {:?} of device {} is already monitored", pin, id)
            }
            MonitorError::UnknownSignal(name) => write!(f, "Unknown signal '{}'", name),
        }
    }
}

impl Error for MonitorError {}

/// Display name of a device output: the device name, plus `.PIN` for named outputs.
pub fn signal_name(names: &Names, device: NameId, pin: OutputPin) -> String {
    let device = names.display_name(device);
    match pin.name() {
        Some(pin) => format!("{}.{}", device, pin),
        None => device,
    }
}

/// Splits `DEV` or `DEV.PIN` into a device id and output pin.
fn parse_signal(names: &Names, name: &str) -> Option<(NameId, OutputPin)> {
    let (device, pin) = match name.split_once('.') {
        Some((device, pin)) => (device, OutputPin::from_name(pin)?),
        None => (name, OutputPin::Out),
    };
    Some((names.query(device)?, pin))
}

#[derive(Debug, Default, Clone)]
pub struct Monitors {
    traces: HashMap<(NameId, OutputPin), Vec<Signal>>,
}

impl Monitors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_monitor(
        &mut self,
        devices: &Devices,
        device: NameId,
        pin: OutputPin,
    ) -> Result<(), MonitorError> {
        self.add_monitor(devices, device, pin, 0)
    }

    fn add_monitor(
        &mut self,
        devices: &Devices,
        device: NameId,
        pin: OutputPin,
        cycles_completed: usize,
    ) -> Result<(), MonitorError> {
        let found = devices
            .get(device)
            .ok_or(MonitorError::DeviceAbsent(device))?;
        if !found.has_output(pin) {
            return Err(MonitorError::NotOutput(device, pin));
        }
        if self.traces.contains_key(&(device, pin)) {
            return Err(MonitorError::MonitorPresent(device, pin));
        }

        debug!("Monitoring {} {:?}", device, pin);
        self.traces
            .insert((device, pin), vec![Signal::Blank; cycles_completed]);
        Ok(())
    }

    /// Removes a monitor. Returns whether it existed.
    pub fn remove_monitor(&mut self, device: NameId, pin: OutputPin) -> bool {
        self.traces.remove(&(device, pin)).is_some()
    }

    pub fn is_monitored(&self, device: NameId, pin: OutputPin) -> bool {
        self.traces.contains_key(&(device, pin))
    }

    /// Appends the current value of every monitored output to its trace.
    pub fn record_signals(&mut self, devices: &Devices) {
        for ((device, pin), trace) in self.traces.iter_mut() {
            let value = devices
                .output(*device, *pin)
                .map(Signal::from)
                .unwrap_or(Signal::Blank);
            trace.push(value);
        }
    }

    /// Adds the named signal if it is not monitored, removes it otherwise.
    ///
    /// A new monitor starts with `cycles_completed` blank entries so its trace lines up
    /// with the others. Returns whether the signal is monitored afterwards.
    pub fn toggle_monitor(
        &mut self,
        names: &Names,
        devices: &Devices,
        name: &str,
        cycles_completed: usize,
    ) -> Result<bool, MonitorError> {
        let (device, pin) = parse_signal(names, name)
            .filter(|(device, pin)| {
                devices
                    .get(*device)
                    .is_some_and(|found| found.has_output(*pin))
            })
            .ok_or_else(|| MonitorError::UnknownSignal(name.to_owned()))?;

        if self.remove_monitor(device, pin) {
            debug!("Stopped monitoring {}", name);
            Ok(false)
        } else {
            self.add_monitor(devices, device, pin, cycles_completed)?;
            Ok(true)
        }
    }

    /// Names of monitored and unmonitored outputs, both in device declaration order.
    pub fn signal_names(&self, names: &Names, devices: &Devices) -> (Vec<String>, Vec<String>) {
        let mut monitored = Vec::new();
        let mut unmonitored = Vec::new();
        for device in devices.iter() {
            for &pin in device.output_pins() {
                let name = signal_name(names, device.id, pin);
                if self.is_monitored(device.id, pin) {
                    monitored.push(name);
                } else {
                    unmonitored.push(name);
                }
            }
        }
        (monitored, unmonitored)
    }

    /// Monitored outputs with their traces, in device declaration order.
    pub fn traces<'a>(
        &'a self,
        devices: &'a Devices,
    ) -> impl Iterator<Item = (NameId, OutputPin, &'a [Signal])> + 'a {
        devices.iter().flat_map(move |device| {
            device.output_pins().iter().filter_map(move |&pin| {
                self.traces
                    .get(&(device.id, pin))
                    .map(|trace| (device.id, pin, trace.as_slice()))
            })
        })
    }

    /// Trace of a signal given by name, `None` if it is not monitored.
    pub fn trace(&self, names: &Names, name: &str) -> Option<&[Signal]> {
        let key = parse_signal(names, name)?;
        self.traces.get(&key).map(Vec::as_slice)
    }

    /// Clears every trace, keeping the monitors.
    pub fn reset(&mut self) {
        self.traces.values_mut().for_each(Vec::clear);
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}
