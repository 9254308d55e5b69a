use std::fmt;

use crate::names::NameId;

/// Largest number of inputs a gate may declare.
pub const MAX_GATE_INPUTS: u8 = 16;

/// An input terminal of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputPin {
    /// Gate input `I1` to `I16`, one based.
    I(u8),
    Clk,
    Data,
    Set,
    Clear,
}

impl InputPin {
    /// Parses an input pin name as written after the `.` in a connection.
    pub fn from_name(name: &str) -> Option<InputPin> {
        match name {
            "CLK" => Some(InputPin::Clk),
            "DATA" => Some(InputPin::Data),
            "SET" => Some(InputPin::Set),
            "CLEAR" => Some(InputPin::Clear),
            _ => {
                let digits = name.strip_prefix('I')?;
                if digits.starts_with('0') || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                let index: u8 = digits.parse().ok()?;
                (1..=MAX_GATE_INPUTS)
                    .contains(&index)
                    .then_some(InputPin::I(index))
            }
        }
    }
}

impl fmt::Display for InputPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputPin::I(index) => write!(f, "I{}", index),
            InputPin::Clk => write!(f, "CLK"),
            InputPin::Data => write!(f, "DATA"),
            InputPin::Set => write!(f, "SET"),
            InputPin::Clear => write!(f, "CLEAR"),
        }
    }
}

/// An output terminal of a device.
///
/// Gates, switches and clocks have a single unnamed output. D-types have `Q` and `QBAR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputPin {
    Out,
    Q,
    QBar,
}

impl OutputPin {
    pub fn from_name(name: &str) -> Option<OutputPin> {
        match name {
            "Q" => Some(OutputPin::Q),
            "QBAR" => Some(OutputPin::QBar),
            _ => None,
        }
    }

    /// Name written after the `.`, `None` for the unnamed output.
    pub fn name(self) -> Option<&'static str> {
        match self {
            OutputPin::Out => None,
            OutputPin::Q => Some("Q"),
            OutputPin::QBar => Some("QBAR"),
        }
    }
}

/// The output that drives an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Driver {
    pub device: NameId,
    pub pin: OutputPin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_input_names() {
        assert_eq!(InputPin::from_name("I1"), Some(InputPin::I(1)));
        assert_eq!(InputPin::from_name("I16"), Some(InputPin::I(16)));
        assert_eq!(InputPin::from_name("I17"), None);
        assert_eq!(InputPin::from_name("I0"), None);
        assert_eq!(InputPin::from_name("I01"), None);
        assert_eq!(InputPin::from_name("I"), None);
        assert_eq!(InputPin::from_name("IX"), None);
    }

    #[test]
    fn test_dtype_pin_names() {
        assert_eq!(InputPin::from_name("CLK"), Some(InputPin::Clk));
        assert_eq!(InputPin::from_name("CLEAR"), Some(InputPin::Clear));
        assert_eq!(InputPin::from_name("clk"), None);
        assert_eq!(OutputPin::from_name("QBAR"), Some(OutputPin::QBar));
        assert_eq!(OutputPin::from_name("Q"), Some(OutputPin::Q));
        assert_eq!(OutputPin::from_name("DATA"), None);
    }

    #[test]
    fn test_display_round_trips_names() {
        for name in ["I1", "I9", "I16", "CLK", "DATA", "SET", "CLEAR"] {
            assert_eq!(InputPin::from_name(name).unwrap().to_string(), name);
        }
    }
}
