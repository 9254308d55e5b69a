use anyhow::{Result, anyhow, bail};

use super::{Parser, ParserState, Reference};
use crate::{
    devices::{Device, DeviceKind, InputPin, OutputPin},
    errors::ErrorKind,
    network::NetworkError,
    scanner::TokenKind,
};

impl Parser<'_> {
    /// `target[.pin] "=" source[.pin] { "," source[.pin] } ";"`
    ///
    /// Several sources drive consecutive gate inputs starting from the named one, `I1` by
    /// default.
    pub(super) fn parse_connection_line(&mut self, st: &mut ParserState) -> Result<()> {
        let Some(target) = self.read_reference(st)? else {
            self.skip_line();
            return Ok(());
        };
        let Some(first_pin) = self.resolve_input(st, &target)? else {
            self.skip_line();
            return Ok(());
        };

        if !self.at(TokenKind::Equal) {
            self.error(
                st,
                ErrorKind::SyntaxError,
                format!("Expected '=' after '{}', found {}", target, self.current),
            );
            self.skip_line();
            return Ok(());
        }
        self.advance();

        let gate_inputs = self.device(&target)?.gate_inputs();
        let mut index = 0;
        loop {
            let Some(source) = self.read_reference(st)? else {
                self.skip_line();
                return Ok(());
            };
            let Some(source_pin) = self.resolve_output(st, &source)? else {
                self.skip_line();
                return Ok(());
            };

            let target_pin = match first_pin {
                InputPin::I(first) => {
                    let n = usize::from(first) + index;
                    if n > gate_inputs {
                        self.error_at(
                            st,
                            ErrorKind::InvalidPin,
                            format!(
                                "Too many sources for '{}', which has {} inputs",
                                target.name.text, gate_inputs
                            ),
                            &self.previous,
                        );
                        self.skip_line();
                        return Ok(());
                    }
                    InputPin::I(n as u8)
                }
                pin if index == 0 => pin,
                pin => {
                    self.error_at(
                        st,
                        ErrorKind::InvalidPin,
                        format!("Input '{}.{}' takes a single source", target.name.text, pin),
                        &source.name,
                    );
                    self.skip_line();
                    return Ok(());
                }
            };

            match self.network.make_connection(
                source.device,
                source_pin,
                target.device,
                target_pin,
            ) {
                Ok(()) => {}
                Err(NetworkError::InputConnected(_, pin)) => {
                    self.error_at(
                        st,
                        ErrorKind::DeviceError,
                        format!("Input '{}.{}' is already connected", target.name.text, pin),
                        &source.name,
                    );
                }
                Err(err) => bail!("connecting '{}' to '{}': {}", source, target, err),
            }

            index += 1;
            if self.at(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        self.expect_semicolon(st);
        Ok(())
    }

    /// Output selected by a source or monitor reference.
    ///
    /// D-types must name `Q` or `QBAR`; every other device has one unnamed output.
    pub(super) fn resolve_output(
        &self,
        st: &mut ParserState,
        reference: &Reference,
    ) -> Result<Option<OutputPin>> {
        let kind = self.device(reference)?.kind();

        let pin = match (&reference.pin, kind) {
            (None, DeviceKind::DType) => {
                self.error_at(
                    st,
                    ErrorKind::MissingPort,
                    format!(
                        "D-type '{}' has two outputs, select one with .Q or .QBAR",
                        reference.name.text
                    ),
                    &reference.name,
                );
                None
            }
            (None, _) => Some(OutputPin::Out),
            (Some(pin), DeviceKind::DType) => {
                let output = OutputPin::from_name(&pin.text);
                if output.is_none() {
                    self.error_at(
                        st,
                        ErrorKind::InvalidPin,
                        format!(
                            "'{}' is not an output of D-type '{}', expected Q or QBAR",
                            pin.text, reference.name.text
                        ),
                        pin,
                    );
                }
                output
            }
            (Some(pin), _) => {
                self.error_at(
                    st,
                    ErrorKind::InvalidPin,
                    format!(
                        "{} '{}' has a single output and takes no pin name",
                        kind, reference.name.text
                    ),
                    pin,
                );
                None
            }
        };
        Ok(pin)
    }

    /// First input driven by a connection line.
    fn resolve_input(
        &self,
        st: &mut ParserState,
        reference: &Reference,
    ) -> Result<Option<InputPin>> {
        let device = self.device(reference)?;
        let kind = device.kind();

        let Some(pin_token) = &reference.pin else {
            return Ok(match kind {
                DeviceKind::DType => {
                    self.error_at(
                        st,
                        ErrorKind::MissingPort,
                        format!(
                            "D-type inputs must be named, e.g. '{}.DATA'",
                            reference.name.text
                        ),
                        &reference.name,
                    );
                    None
                }
                DeviceKind::Switch | DeviceKind::Clock => {
                    self.error_at(
                        st,
                        ErrorKind::InvalidPin,
                        format!("{} '{}' has no inputs", kind, reference.name.text),
                        &reference.name,
                    );
                    None
                }
                _ => Some(InputPin::I(1)),
            });
        };

        let Some(pin) = InputPin::from_name(&pin_token.text) else {
            if OutputPin::from_name(&pin_token.text).is_some() {
                self.error_at(
                    st,
                    ErrorKind::InvalidPin,
                    format!("'{}' is an output and cannot be driven", reference),
                    pin_token,
                );
            } else {
                self.error_at(
                    st,
                    ErrorKind::InvalidInputs,
                    format!(
                        "'{}' is not an input name, expected I1 to I16, CLK, DATA, SET or CLEAR",
                        pin_token.text
                    ),
                    pin_token,
                );
            }
            return Ok(None);
        };

        if device.input(pin).is_none() {
            let message = match kind {
                DeviceKind::Switch | DeviceKind::Clock => {
                    format!("{} '{}' has no inputs", kind, reference.name.text)
                }
                _ => format!("{} '{}' has no input {}", kind, reference.name.text, pin),
            };
            self.error_at(st, ErrorKind::InvalidPin, message, pin_token);
            return Ok(None);
        }

        Ok(Some(pin))
    }

    fn device(&self, reference: &Reference) -> Result<&Device> {
        self.network
            .devices()
            .get(reference.device)
            .ok_or_else(|| anyhow!("declared device '{}' is missing", reference.name.text))
    }
}
