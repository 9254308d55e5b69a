//! Device model and registry.
//!
//! Every device is a [`Device`] whose [`Logic`] variant carries the state specific to its
//! kind: gates own an ordered list of inputs, clocks their half-period and phase counter,
//! D-types their stored bit and the last sampled clock level. The [`Devices`] registry is
//! the validating factory the parser goes through and the store the network engine
//! evaluates.
//!
//! # Parameters
//!
//! The optional number in brackets after a device type means:
//!
//! | Kind                    | Parameter                  | Default  |
//! |-------------------------|----------------------------|----------|
//! | `AND OR NAND NOR`       | input count, `1..=16`      | 2        |
//! | `XOR`                   | input count, must be 2     | 2        |
//! | `SWITCH`                | initial state, 0 or 1      | 0        |
//! | `CLOCK`                 | half-period in cycles, ≥ 1 | required |
//! | `DTYPE`                 | ignored                    |          |
//!
//! # Example
//!
//! ```
//! use logsim::devices::{DeviceKind, Devices, OutputPin};
//! use logsim::names::Names;
//!
//! let mut names = Names::new();
//! let [sw, clk] = [names.intern("SW"), names.intern("CLK")];
//!
//! let mut devices = Devices::new();
//! devices.make_device(sw, DeviceKind::Switch, Some(1)).unwrap();
//! assert!(devices.make_device(clk, DeviceKind::Clock, None).is_err());
//!
//! assert_eq!(devices.output(sw, OutputPin::Out), Some(true));
//! ```

mod pins;

pub use pins::{Driver, InputPin, MAX_GATE_INPUTS, OutputPin};

use std::{collections::HashMap, error::Error, fmt};

use log::debug;

use crate::names::NameId;

const DEFAULT_GATE_INPUTS: u8 = 2;

/// Device types that can be declared in the `[devices]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Switch,
    Clock,
    DType,
}

impl DeviceKind {
    pub fn from_keyword(keyword: &str) -> Option<DeviceKind> {
        match keyword {
            "AND" => Some(DeviceKind::And),
            "OR" => Some(DeviceKind::Or),
            "NAND" => Some(DeviceKind::Nand),
            "NOR" => Some(DeviceKind::Nor),
            "XOR" => Some(DeviceKind::Xor),
            "SWITCH" => Some(DeviceKind::Switch),
            "CLOCK" => Some(DeviceKind::Clock),
            "DTYPE" => Some(DeviceKind::DType),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            DeviceKind::And => "AND",
            DeviceKind::Or => "OR",
            DeviceKind::Nand => "NAND",
            DeviceKind::Nor => "NOR",
            DeviceKind::Xor => "XOR",
            DeviceKind::Switch => "SWITCH",
            DeviceKind::Clock => "CLOCK",
            DeviceKind::DType => "DTYPE",
        }
    }

    fn gate(self) -> Option<GateKind> {
        match self {
            DeviceKind::And => Some(GateKind::And),
            DeviceKind::Or => Some(GateKind::Or),
            DeviceKind::Nand => Some(GateKind::Nand),
            DeviceKind::Nor => Some(GateKind::Nor),
            DeviceKind::Xor => Some(GateKind::Xor),
            DeviceKind::Switch | DeviceKind::Clock | DeviceKind::DType => None,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Boolean function computed by a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    And,
    Or,
    Nand,
    Nor,
    Xor,
}

impl GateKind {
    pub fn evaluate(self, inputs: impl IntoIterator<Item = bool>) -> bool {
        let mut inputs = inputs.into_iter();
        match self {
            GateKind::And => inputs.all(|x| x),
            GateKind::Or => inputs.any(|x| x),
            GateKind::Nand => !inputs.all(|x| x),
            GateKind::Nor => !inputs.any(|x| x),
            GateKind::Xor => inputs.fold(false, |acc, x| acc ^ x),
        }
    }

    pub fn kind(self) -> DeviceKind {
        match self {
            GateKind::And => DeviceKind::And,
            GateKind::Or => DeviceKind::Or,
            GateKind::Nand => DeviceKind::Nand,
            GateKind::Nor => DeviceKind::Nor,
            GateKind::Xor => DeviceKind::Xor,
        }
    }
}

/// Stored state of a D-type flip-flop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlipFlop {
    pub clk: Option<Driver>,
    pub data: Option<Driver>,
    pub set: Option<Driver>,
    pub clear: Option<Driver>,
    /// Value of `Q`; `QBAR` is always its complement.
    pub memory: bool,
    /// `CLK` level sampled at the end of the previous cycle.
    pub last_clk: bool,
}

/// Kind specific payload of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Logic {
    Gate {
        gate: GateKind,
        inputs: Vec<Option<Driver>>,
        output: bool,
    },
    Switch {
        state: bool,
    },
    Clock {
        half_period: u32,
        counter: u32,
        output: bool,
    },
    DType(FlipFlop),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: NameId,
    pub logic: Logic,
}

impl Device {
    pub fn kind(&self) -> DeviceKind {
        match &self.logic {
            Logic::Gate { gate, .. } => gate.kind(),
            Logic::Switch { .. } => DeviceKind::Switch,
            Logic::Clock { .. } => DeviceKind::Clock,
            Logic::DType(_) => DeviceKind::DType,
        }
    }

    pub fn output_pins(&self) -> &'static [OutputPin] {
        match self.logic {
            Logic::DType(_) => &[OutputPin::Q, OutputPin::QBar],
            _ => &[OutputPin::Out],
        }
    }

    pub fn has_output(&self, pin: OutputPin) -> bool {
        self.output_pins().contains(&pin)
    }

    /// Current value of an output, `None` when the device has no such pin.
    pub fn output(&self, pin: OutputPin) -> Option<bool> {
        match (&self.logic, pin) {
            (Logic::Gate { output, .. }, OutputPin::Out) => Some(*output),
            (Logic::Switch { state }, OutputPin::Out) => Some(*state),
            (Logic::Clock { output, .. }, OutputPin::Out) => Some(*output),
            (Logic::DType(ff), OutputPin::Q) => Some(ff.memory),
            (Logic::DType(ff), OutputPin::QBar) => Some(!ff.memory),
            _ => None,
        }
    }

    /// Input pins of the device in their natural order.
    pub fn input_pins(&self) -> Vec<InputPin> {
        match &self.logic {
            Logic::Gate { inputs, .. } => (1..=inputs.len() as u8).map(InputPin::I).collect(),
            Logic::DType(_) => vec![
                InputPin::Clk,
                InputPin::Data,
                InputPin::Set,
                InputPin::Clear,
            ],
            Logic::Switch { .. } | Logic::Clock { .. } => Vec::new(),
        }
    }

    /// Number of gate inputs, zero for other kinds.
    pub fn gate_inputs(&self) -> usize {
        match &self.logic {
            Logic::Gate { inputs, .. } => inputs.len(),
            _ => 0,
        }
    }

    /// Driver slot of an input, `None` when the device has no such pin.
    pub fn input(&self, pin: InputPin) -> Option<&Option<Driver>> {
        match (&self.logic, pin) {
            (Logic::Gate { inputs, .. }, InputPin::I(index)) => {
                inputs.get(usize::from(index).checked_sub(1)?)
            }
            (Logic::DType(ff), InputPin::Clk) => Some(&ff.clk),
            (Logic::DType(ff), InputPin::Data) => Some(&ff.data),
            (Logic::DType(ff), InputPin::Set) => Some(&ff.set),
            (Logic::DType(ff), InputPin::Clear) => Some(&ff.clear),
            _ => None,
        }
    }

    pub fn input_mut(&mut self, pin: InputPin) -> Option<&mut Option<Driver>> {
        match (&mut self.logic, pin) {
            (Logic::Gate { inputs, .. }, InputPin::I(index)) => {
                inputs.get_mut(usize::from(index).checked_sub(1)?)
            }
            (Logic::DType(ff), InputPin::Clk) => Some(&mut ff.clk),
            (Logic::DType(ff), InputPin::Data) => Some(&mut ff.data),
            (Logic::DType(ff), InputPin::Set) => Some(&mut ff.set),
            (Logic::DType(ff), InputPin::Clear) => Some(&mut ff.clear),
            _ => None,
        }
    }

    /// Every input pin paired with its driver, if any.
    pub fn inputs(&self) -> Vec<(InputPin, Option<Driver>)> {
        self.input_pins()
            .into_iter()
            .filter_map(|pin| self.input(pin).map(|driver| (pin, *driver)))
            .collect()
    }

    /// Restores the power-on signal state, keeping connections and switch positions.
    fn reset(&mut self) {
        match &mut self.logic {
            Logic::Gate { output, .. } => *output = false,
            Logic::Switch { .. } => {}
            Logic::Clock {
                counter, output, ..
            } => {
                *counter = 0;
                *output = false;
            }
            Logic::DType(ff) => {
                ff.memory = false;
                ff.last_clk = false;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// A device with this id already exists.
    DevicePresent(NameId),
    DeviceAbsent(NameId),
    /// The parameter is outside the range accepted by the device kind.
    InvalidParameter { kind: DeviceKind, value: u32 },
    /// The device kind cannot be built without a parameter.
    MissingParameter(DeviceKind),
    NotSwitch(NameId),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::DevicePresent(id) => write!(f, "Device {} already exists", id),
            DeviceError::DeviceAbsent(id) => write!(f, "Device {} does not exist", id),
            DeviceError::InvalidParameter { kind, value } => {
                write!(f, "{} is not a valid parameter for {}", value, kind)
            }
            DeviceError::MissingParameter(kind) => write!(f, "{} requires a parameter", kind),
            DeviceError::NotSwitch(id) => write!(f, "Device {} is not a switch", id),
        }
    }
}

impl Error for DeviceError {}

/// Registry of every device in a circuit, in declaration order.
#[derive(Debug, Default, Clone)]
pub struct Devices {
    devices: Vec<Device>,
    index: HashMap<NameId, usize>,
}

impl Devices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `parameter` for `kind` and adds a new device with its power-on state.
    pub fn make_device(
        &mut self,
        id: NameId,
        kind: DeviceKind,
        parameter: Option<u32>,
    ) -> Result<(), DeviceError> {
        if self.index.contains_key(&id) {
            return Err(DeviceError::DevicePresent(id));
        }

        let invalid = |value| DeviceError::InvalidParameter { kind, value };

        let logic = match (kind.gate(), kind) {
            (Some(gate), _) => {
                let count = match (gate, parameter) {
                    (_, None) => DEFAULT_GATE_INPUTS,
                    (GateKind::Xor, Some(2)) => DEFAULT_GATE_INPUTS,
                    (GateKind::Xor, Some(n)) => return Err(invalid(n)),
                    (_, Some(n)) if (1..=u32::from(MAX_GATE_INPUTS)).contains(&n) => n as u8,
                    (_, Some(n)) => return Err(invalid(n)),
                };
                Logic::Gate {
                    gate,
                    inputs: vec![None; usize::from(count)],
                    output: false,
                }
            }
            (None, DeviceKind::Switch) => match parameter {
                None | Some(0) => Logic::Switch { state: false },
                Some(1) => Logic::Switch { state: true },
                Some(n) => return Err(invalid(n)),
            },
            (None, DeviceKind::Clock) => match parameter {
                None => return Err(DeviceError::MissingParameter(kind)),
                Some(0) => return Err(invalid(0)),
                Some(half_period) => Logic::Clock {
                    half_period,
                    counter: 0,
                    output: false,
                },
            },
            (None, _) => Logic::DType(FlipFlop::default()),
        };

        debug!("Created {} device {} ({:?})", kind, id, parameter);
        self.index.insert(id, self.devices.len());
        self.devices.push(Device { id, logic });
        Ok(())
    }

    pub fn get(&self, id: NameId) -> Option<&Device> {
        self.index.get(&id).map(|&i| &self.devices[i])
    }

    pub fn get_mut(&mut self, id: NameId) -> Option<&mut Device> {
        self.index.get(&id).map(|&i| &mut self.devices[i])
    }

    pub fn contains(&self, id: NameId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Device> {
        self.devices.iter_mut()
    }

    pub(crate) fn by_position(&self, position: usize) -> &Device {
        &self.devices[position]
    }

    pub(crate) fn by_position_mut(&mut self, position: usize) -> &mut Device {
        &mut self.devices[position]
    }

    /// Ids of every device of `kind`, in declaration order.
    pub fn find_devices(&self, kind: DeviceKind) -> Vec<NameId> {
        self.devices
            .iter()
            .filter(|device| device.kind() == kind)
            .map(|device| device.id)
            .collect()
    }

    pub fn output(&self, id: NameId, pin: OutputPin) -> Option<bool> {
        self.get(id)?.output(pin)
    }

    /// Value currently seen by an input: its driver's output, or low when undriven.
    pub fn input_value(&self, driver: Option<Driver>) -> bool {
        driver
            .and_then(|Driver { device, pin }| self.output(device, pin))
            .unwrap_or(false)
    }

    pub fn set_switch(&mut self, id: NameId, value: bool) -> Result<(), DeviceError> {
        let device = self.get_mut(id).ok_or(DeviceError::DeviceAbsent(id))?;
        match &mut device.logic {
            Logic::Switch { state } => {
                *state = value;
                Ok(())
            }
            _ => Err(DeviceError::NotSwitch(id)),
        }
    }

    /// Puts every device back in its power-on signal state.
    pub fn reset(&mut self) {
        self.devices.iter_mut().for_each(Device::reset);
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
