use anyhow::{Result, bail};

use super::{Parser, ParserState, symbol_id};
use crate::{
    devices::{DeviceError, DeviceKind, MAX_GATE_INPUTS},
    errors::ErrorKind,
    scanner::{Token, TokenKind},
};

impl Parser<'_> {
    /// `name { "," name } "=" LOGIC [ "(" number ")" ] ";"`
    pub(super) fn parse_device_line(&mut self, st: &mut ParserState) -> Result<()> {
        let mut declared: Vec<Token> = Vec::new();

        loop {
            match self.current.kind {
                TokenKind::Name => {
                    let token = self.current.clone();
                    let id = symbol_id(&token)?;
                    if st.declared.contains(&id) || declared.iter().any(|t| t.id == Some(id)) {
                        self.error(
                            st,
                            ErrorKind::NameDefined,
                            format!("Device '{}' is already defined", token.text),
                        );
                    } else {
                        declared.push(token);
                    }
                    self.advance();
                }
                TokenKind::Logic => {
                    self.error(
                        st,
                        ErrorKind::InvalidName,
                        format!("{} is a reserved word, not a device name", self.current),
                    );
                    self.advance();
                }
                _ => {
                    self.error(
                        st,
                        ErrorKind::InvalidName,
                        format!("Expected a device name, found {}", self.current),
                    );
                    self.skip_line();
                    return Ok(());
                }
            }

            if self.at(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        if !self.at(TokenKind::Equal) {
            self.error(
                st,
                ErrorKind::SyntaxError,
                format!("Expected ',' or '=' after a device name, found {}", self.current),
            );
            self.skip_line();
            return Ok(());
        }
        self.advance();

        let kind = match self.current.kind {
            TokenKind::Logic => match DeviceKind::from_keyword(&self.current.text) {
                Some(kind) => kind,
                None => bail!("keyword '{}' has no device kind", self.current.text),
            },
            _ => {
                self.error(
                    st,
                    ErrorKind::InvalidLogicGate,
                    format!(
                        "Expected a device type (AND, OR, NAND, NOR, XOR, SWITCH, CLOCK or DTYPE), found {}",
                        self.current
                    ),
                );
                self.skip_line();
                return Ok(());
            }
        };
        self.advance();

        let parameter = if self.at(TokenKind::OpenBracket) {
            self.advance();
            if !self.at(TokenKind::Number) {
                self.error(
                    st,
                    ErrorKind::SyntaxError,
                    format!("Expected a number after '(', found {}", self.current),
                );
                self.skip_line();
                return Ok(());
            }
            let Some(value) = self.current.number() else {
                self.error(
                    st,
                    ErrorKind::InvalidNumber,
                    format!("Number {} is too large", self.current),
                );
                self.skip_line();
                return Ok(());
            };
            self.advance();
            if !self.at(TokenKind::CloseBracket) {
                self.error(
                    st,
                    ErrorKind::SyntaxError,
                    format!("Expected ')' after the parameter, found {}", self.current),
                );
                self.skip_line();
                return Ok(());
            }
            self.advance();
            Some(value)
        } else {
            None
        };

        for token in &declared {
            self.create_device(st, token, kind, parameter)?;
        }

        self.expect_semicolon(st);
        Ok(())
    }

    fn create_device(
        &mut self,
        st: &mut ParserState,
        token: &Token,
        kind: DeviceKind,
        parameter: Option<u32>,
    ) -> Result<()> {
        let id = symbol_id(token)?;
        let name = &token.text;

        match self.network.devices_mut().make_device(id, kind, parameter) {
            Ok(()) => {
                st.declared.insert(id);
            }
            Err(DeviceError::InvalidParameter { kind, value }) => {
                let message = match kind {
                    DeviceKind::Xor => format!(
                        "Invalid input count {} for '{}', XOR gates have exactly 2 inputs",
                        value, name
                    ),
                    DeviceKind::Switch => format!(
                        "Invalid initial state {} for switch '{}', expected 0 or 1",
                        value, name
                    ),
                    DeviceKind::Clock => format!(
                        "Invalid half-period {} for clock '{}', expected at least 1",
                        value, name
                    ),
                    _ => format!(
                        "Invalid input count {} for '{}', {} gates have 1 to {} inputs",
                        value, name, kind, MAX_GATE_INPUTS
                    ),
                };
                self.error_at(st, ErrorKind::InvalidNumber, message, token);
            }
            Err(DeviceError::MissingParameter(kind)) => {
                self.error_at(
                    st,
                    ErrorKind::MissingRequiredParameter,
                    format!("{} '{}' needs a parameter, e.g. {}(1)", kind, name, kind),
                    token,
                );
            }
            Err(DeviceError::DevicePresent(_)) => {
                self.error_at(
                    st,
                    ErrorKind::NameDefined,
                    format!("Device '{}' is already defined", name),
                    token,
                );
            }
            Err(err) => bail!("creating '{}': {}", name, err),
        }
        Ok(())
    }
}
