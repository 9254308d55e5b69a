//! Diagnostics reported while reading a circuit definition file.
//!
//! Every problem found by the scanner or the parser becomes one [`Diagnostic`]. A
//! diagnostic carries an [`ErrorKind`], a message specific to the problem and the
//! position it refers to. Its `Display` form is the layout every consumer prints:
//!
//! ```text
//! Error - InvalidNumber: Invalid input count 20 for device 'G1'
//! Line 2 Char 1:
//! G1=AND(20);
//! ^
//! Description: The number is out of range for this device.
//! ```

use std::fmt;

/// Closed set of problems the front end can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    InvalidCharacter,
    InvalidName,
    InvalidNumber,
    InvalidHeader,
    MissingHeader,
    InvalidPin,
    MissingDot,
    MissingI,
    MissingPort,
    MissingRequiredParameter,
    NameDefined,
    SyntaxError,
    InvalidLogicGate,
    InvalidDevice,
    OverflowError,
    DeviceError,
    InvalidInputs,
    InternalError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 18] = [
        ErrorKind::InvalidCharacter,
        ErrorKind::InvalidName,
        ErrorKind::InvalidNumber,
        ErrorKind::InvalidHeader,
        ErrorKind::MissingHeader,
        ErrorKind::InvalidPin,
        ErrorKind::MissingDot,
        ErrorKind::MissingI,
        ErrorKind::MissingPort,
        ErrorKind::MissingRequiredParameter,
        ErrorKind::NameDefined,
        ErrorKind::SyntaxError,
        ErrorKind::InvalidLogicGate,
        ErrorKind::InvalidDevice,
        ErrorKind::OverflowError,
        ErrorKind::DeviceError,
        ErrorKind::InvalidInputs,
        ErrorKind::InternalError,
    ];

    // Indexed by discriminant, keep in the same order as the enum.
    const DESCRIPTIONS: [&'static str; 18] = [
        "This character is not allowed in the definition file.",
        "Names must start with a letter and contain only letters and digits. \
         Device types and section headings are reserved words.",
        "The number is out of range for this device.",
        "Section headers are written [devices], [conns] or [monit].",
        "The file must contain the [devices], [conns] and [monit] sections, in this order.",
        "The pin does not exist on this device.",
        "Device and pin names are separated by a '.', as in G1.I1 or D1.Q.",
        "Gate inputs are named I1 to I16.",
        "D-type flip-flops must be connected through a named port: \
         CLK, DATA, SET or CLEAR for inputs, Q or QBAR for outputs.",
        "This device type needs a parameter in brackets, e.g. CLOCK(2).",
        "Device names must be unique across the whole circuit.",
        "The line does not follow the grammar of its section.",
        "Device types are AND, OR, NAND, NOR, XOR, SWITCH, CLOCK and DTYPE.",
        "The device was not declared in the [devices] section.",
        "The section is too long or malformed, the parser gave up on it.",
        "The operation is not valid for this device.",
        "Inputs are I1 to I16 for gates and CLK, DATA, SET or CLEAR for D-type flip-flops.",
        "The simulator hit an unexpected internal failure while reading the file.",
    ];

    /// Fixed human readable explanation of this kind of error.
    pub fn description(self) -> &'static str {
        Self::DESCRIPTIONS[self as usize]
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One problem found in a definition file.
///
/// `line` and `column` are zero based, the rendered form shows them one based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub line_text: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        line: usize,
        column: usize,
        line_text: impl Into<String>,
    ) -> Self {
        Diagnostic {
            line,
            column,
            line_text: line_text.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error - {}: {}", self.kind, self.message)?;
        writeln!(f, "Line {} Char {}:", self.line + 1, self.column + 1)?;
        writeln!(f, "{}", self.line_text)?;
        writeln!(f, "{}^", " ".repeat(self.column))?;
        write!(f, "Description: {}", self.description())
    }
}
