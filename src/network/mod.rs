//! Connections between devices and the cycle based simulation engine.
//!
//! The [`Network`] owns the device registry. Connections are stored on the inputs of the
//! driven device, so fan-out is free and fan-in is rejected when the connection is made.
//!
//! # Simulation
//!
//! [`Network::execute_network`] advances the circuit by one cycle:
//!
//! 1. Every clock counts the cycle and toggles when its half-period is reached.
//! 2. Combinational outputs are re-evaluated in declaration order, in place, until a full
//!    pass changes nothing. Feedback loops are allowed, so there is no static evaluation
//!    order. A circuit that has not settled after [`Network::settle_bound`] passes is
//!    [`NetworkError::Unstable`]. The bound is `max_settle_passes`, raised to one more
//!    than the device count so that deep acyclic logic always settles.
//! 3. D-types whose `CLK` went from low when last sampled to high now latch `DATA`,
//!    unless `SET` or `CLEAR` is high. The network is then settled again so the new
//!    `Q`/`QBAR` values propagate. A D-type clocked by another one sees that edge and
//!    latches in the same cycle, so ripple counters work.
//!
//! Undriven inputs read as low. `SET` and `CLEAR` act asynchronously, `SET` winning when
//! both are high.
//!
//! # Example
//!
//! ```
//! use logsim::devices::{DeviceKind, InputPin, OutputPin};
//! use logsim::names::Names;
//! use logsim::network::Network;
//!
//! let mut names = Names::new();
//! let ids = names.lookup(&["SW", "INV"]);
//!
//! let mut network = Network::new(20);
//! network.devices_mut().make_device(ids[0], DeviceKind::Switch, Some(0)).unwrap();
//! network.devices_mut().make_device(ids[1], DeviceKind::Nand, Some(1)).unwrap();
//! network.make_connection(ids[0], OutputPin::Out, ids[1], InputPin::I(1)).unwrap();
//!
//! network.execute_network().unwrap();
//! assert_eq!(network.devices().output(ids[1], OutputPin::Out), Some(true));
//! ```

use std::{collections::HashMap, error::Error, fmt};

use log::{debug, trace, warn};
use petgraph::graph::{Graph, NodeIndex};

use crate::{
    devices::{Device, Devices, Driver, InputPin, Logic, OutputPin},
    names::{NameId, Names},
};

/// Devices as nodes, connections as edges labelled with the pins they join.
pub type CircuitGraph = Graph<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    DeviceAbsent(NameId),
    OutputAbsent(NameId, OutputPin),
    InputAbsent(NameId, InputPin),
    /// The input already has a driver.
    InputConnected(NameId, InputPin),
    /// The combinational logic did not settle within the allowed passes.
    Unstable { passes: usize },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::DeviceAbsent(id) => write!(f, "Device {} does not exist", id),
            NetworkError::OutputAbsent(id, pin) => {
                write!(f, "Device {} has no output {:?}", id, pin)
            }
            NetworkError::InputAbsent(id, pin) => write!(f, "Device {} has no input {}", id, pin),
            NetworkError::InputConnected(id, pin) => {
                write!(f, "Input {} of device {} is already connected", pin, id)
            }
            NetworkError::Unstable { passes } => {
                write!(f, "Network did not settle after {} passes", passes)
            }
        }
    }
}

impl Error for NetworkError {}

#[derive(Debug, Clone)]
pub struct Network {
    devices: Devices,
    max_settle_passes: usize,
}

impl Network {
    pub fn new(max_settle_passes: usize) -> Self {
        Network {
            devices: Devices::new(),
            max_settle_passes,
        }
    }

    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut Devices {
        &mut self.devices
    }

    /// Drives `target_pin` of `target` from `source_pin` of `source`.
    pub fn make_connection(
        &mut self,
        source: NameId,
        source_pin: OutputPin,
        target: NameId,
        target_pin: InputPin,
    ) -> Result<(), NetworkError> {
        let source_device = self
            .devices
            .get(source)
            .ok_or(NetworkError::DeviceAbsent(source))?;
        if !source_device.has_output(source_pin) {
            return Err(NetworkError::OutputAbsent(source, source_pin));
        }

        let slot = self
            .devices
            .get_mut(target)
            .ok_or(NetworkError::DeviceAbsent(target))?
            .input_mut(target_pin)
            .ok_or(NetworkError::InputAbsent(target, target_pin))?;
        if slot.is_some() {
            return Err(NetworkError::InputConnected(target, target_pin));
        }

        *slot = Some(Driver {
            device: source,
            pin: source_pin,
        });
        debug!(
            "Connected {} {:?} to {} {}",
            source, source_pin, target, target_pin
        );
        Ok(())
    }

    /// Inputs without a driver, in declaration order. They read as low.
    pub fn undriven_inputs(&self) -> Vec<(NameId, InputPin)> {
        self.devices
            .iter()
            .flat_map(|device| {
                device
                    .inputs()
                    .into_iter()
                    .filter(|(_, driver)| driver.is_none())
                    .map(move |(pin, _)| (device.id, pin))
            })
            .collect()
    }

    /// Advances the circuit by one cycle.
    pub fn execute_network(&mut self) -> Result<(), NetworkError> {
        self.tick_clocks();
        self.settle()?;

        // A latch can raise the CLK of another D-type, which then latches in the same
        // cycle.
        let bound = self.settle_bound();
        for round in 1..=bound {
            if !self.latch_flip_flops() {
                return Ok(());
            }
            trace!("Latch round {} changed stored bits", round);
            self.settle()?;
        }

        warn!("Flip-flops did not settle after {} rounds", bound);
        Err(NetworkError::Unstable { passes: bound })
    }

    /// Passes allowed before the network is declared unstable. An acyclic circuit
    /// declared in reverse order needs one pass per device plus a clean pass, so the
    /// configured limit is raised to that.
    pub fn settle_bound(&self) -> usize {
        self.max_settle_passes.max(self.devices.len() + 1)
    }

    /// Returns every device to its power-on state. Topology and switches are kept.
    pub fn reset(&mut self) {
        self.devices.reset();
    }

    fn tick_clocks(&mut self) {
        for device in self.devices.iter_mut() {
            if let Logic::Clock {
                half_period,
                counter,
                output,
            } = &mut device.logic
            {
                *counter += 1;
                if *counter >= *half_period {
                    *counter = 0;
                    *output = !*output;
                }
            }
        }
    }

    fn settle(&mut self) -> Result<(), NetworkError> {
        let bound = self.settle_bound();
        for pass in 1..=bound {
            let mut changed = 0;
            for position in 0..self.devices.len() {
                if self.evaluate(position) {
                    changed += 1;
                }
            }
            trace!("Settle pass {}: {} outputs changed", pass, changed);
            if changed == 0 {
                return Ok(());
            }
        }

        warn!("Network did not settle after {} passes", bound);
        Err(NetworkError::Unstable { passes: bound })
    }

    /// Recomputes the combinational output of one device. Returns whether it changed.
    fn evaluate(&mut self, position: usize) -> bool {
        let devices = &self.devices;
        let next = match &devices.by_position(position).logic {
            Logic::Gate { gate, inputs, .. } => Some(
                gate.evaluate(inputs.iter().map(|driver| devices.input_value(*driver))),
            ),
            Logic::DType(ff) => {
                if devices.input_value(ff.set) {
                    Some(true)
                } else if devices.input_value(ff.clear) {
                    Some(false)
                } else {
                    None
                }
            }
            Logic::Switch { .. } | Logic::Clock { .. } => None,
        };

        let Some(value) = next else {
            return false;
        };
        let slot = match &mut self.devices.by_position_mut(position).logic {
            Logic::Gate { output, .. } => output,
            Logic::DType(ff) => &mut ff.memory,
            Logic::Switch { .. } | Logic::Clock { .. } => return false,
        };
        std::mem::replace(slot, value) != value
    }

    /// Latches `DATA` into every D-type whose `CLK` rose since it was last sampled, then
    /// records the sampled `CLK`. Returns whether any stored bit changed.
    fn latch_flip_flops(&mut self) -> bool {
        let sampled: Vec<(usize, bool, Option<bool>)> = self
            .devices
            .iter()
            .enumerate()
            .filter_map(|(position, device)| match &device.logic {
                Logic::DType(ff) => {
                    let clk = self.devices.input_value(ff.clk);
                    let overridden =
                        self.devices.input_value(ff.set) || self.devices.input_value(ff.clear);
                    let data = (clk && !ff.last_clk && !overridden)
                        .then(|| self.devices.input_value(ff.data));
                    Some((position, clk, data))
                }
                _ => None,
            })
            .collect();

        let mut changed = false;
        for (position, clk, data) in sampled {
            if let Logic::DType(ff) = &mut self.devices.by_position_mut(position).logic {
                ff.last_clk = clk;
                if let Some(data) = data {
                    changed |= ff.memory != data;
                    ff.memory = data;
                }
            }
        }
        changed
    }

    /// Builds a graph of the circuit for DOT export.
    pub fn graph(&self, names: &Names) -> CircuitGraph {
        let mut graph = CircuitGraph::new();
        let nodes: HashMap<NameId, NodeIndex> = self
            .devices
            .iter()
            .map(|device: &Device| {
                let label = format!("{} ({})", names.display_name(device.id), device.kind());
                (device.id, graph.add_node(label))
            })
            .collect();

        for device in self.devices.iter() {
            for (pin, driver) in device.inputs() {
                if let Some(Driver {
                    device: source,
                    pin: source_pin,
                }) = driver
                {
                    let label = match source_pin.name() {
                        Some(output) => format!("{} -> {}", output, pin),
                        None => pin.to_string(),
                    };
                    graph.add_edge(nodes[&source], nodes[&device.id], label);
                }
            }
        }

        graph
    }
}
