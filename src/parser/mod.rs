//! Error tolerant recursive descent parser for circuit definition files.
//!
//! The parser pulls tokens from the [`Scanner`] one at a time and builds the circuit as it
//! goes: device lines go to the registry factory, connection lines to
//! [`Network::make_connection`] and monitor lines to [`Monitors::make_monitor`].
//!
//! # Grammar
//!
//! ```text
//! file    = "[" "devices" "]" { device } "[" "conns" "]" { conn } "[" "monit" "]" { monit }
//! device  = name { "," name } "=" LOGIC [ "(" number ")" ] ";"
//! conn    = signal "=" signal { "," signal } ";"
//! monit   = signal { "," signal } ";"
//! signal  = name [ "." pin ]
//! ```
//!
//! # Error recovery
//!
//! Parsing never stops at the first problem. Each problem is recorded as one
//! [`Diagnostic`] and the parser resynchronises: after a bad line it skips past the next
//! `;`, after a bad header it skips to the next `[`. Every section is bounded by
//! [`Limits::max_block_lines`] declarations so malformed input cannot keep the parser
//! looping. A failure that is not the input's fault is reported once as an
//! `InternalError` diagnostic.
//!
//! # Example
//!
//! ```
//! use logsim::{Limits, monitors::Monitors, names::Names, network::Network, parser::parse_source};
//!
//! let source = "[devices] SW = SWITCH(1); G = NAND(1); [conns] G = SW; [monit] G;";
//!
//! let mut names = Names::new();
//! let mut network = Network::new(Limits::default().max_settle_passes);
//! let mut monitors = Monitors::new();
//! let (ok, diagnostics) =
//!     parse_source(source, &mut names, &mut network, &mut monitors, Limits::default());
//!
//! assert!(ok, "{:?}", diagnostics);
//! assert_eq!(network.devices().len(), 2);
//! assert_eq!(monitors.len(), 1);
//! ```

mod conns;
mod devices;
mod monit;

use std::{collections::HashSet, fmt};

use anyhow::{Result, anyhow};
use log::{debug, warn};

use crate::{
    Limits,
    devices::InputPin,
    errors::{Diagnostic, ErrorKind},
    monitors::Monitors,
    names::{NameId, Names},
    network::Network,
    scanner::{Scanner, Token, TokenKind},
};

/// The three sections of a definition file, in the order they must appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Devices,
    Conns,
    Monit,
}

impl Section {
    const ALL: [Section; 3] = [Section::Devices, Section::Conns, Section::Monit];

    fn from_heading(heading: &str) -> Option<Section> {
        match heading {
            "devices" => Some(Section::Devices),
            "conns" => Some(Section::Conns),
            "monit" => Some(Section::Monit),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heading = match self {
            Section::Devices => "devices",
            Section::Conns => "conns",
            Section::Monit => "monit",
        };
        write!(f, "{}", heading)
    }
}

/// State threaded through the section parsers.
#[derive(Debug, Default)]
pub struct ParserState {
    /// Devices successfully created so far.
    pub declared: HashSet<NameId>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A `name[.pin]` reference to a declared device.
#[derive(Debug, Clone)]
struct Reference {
    device: NameId,
    name: Token,
    pin: Option<Token>,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pin {
            Some(pin) => write!(f, "{}.{}", self.name.text, pin.text),
            None => write!(f, "{}", self.name.text),
        }
    }
}

pub struct Parser<'a> {
    scanner: Scanner<'a>,
    network: &'a mut Network,
    monitors: &'a mut Monitors,
    limits: Limits,
    current: Token,
    previous: Token,
    /// A header already consumed that belongs to a later section.
    pending: Option<(Section, Token)>,
}

impl<'a> Parser<'a> {
    pub fn new(
        mut scanner: Scanner<'a>,
        network: &'a mut Network,
        monitors: &'a mut Monitors,
        limits: Limits,
    ) -> Self {
        let current = scanner.next_token();
        Parser {
            scanner,
            network,
            monitors,
            limits,
            previous: current.clone(),
            current,
            pending: None,
        }
    }

    /// Parses the whole file.
    ///
    /// Returns whether the circuit is valid, with every diagnostic found. Lexical
    /// diagnostics come first, followed by the parser's in source order.
    pub fn parse(mut self) -> (bool, Vec<Diagnostic>) {
        let mut state = ParserState::default();

        if let Err(err) = self.parse_sections(&mut state) {
            self.error(
                &mut state,
                ErrorKind::InternalError,
                format!("Internal error: {}", err),
            );
        }

        let undriven = match state.diagnostics.is_empty() {
            true => self.network.undriven_inputs(),
            false => Vec::new(),
        };
        for (device, pin) in undriven {
            let name = self.scanner.names().display_name(device);
            match pin {
                InputPin::Set | InputPin::Clear => {
                    debug!("Input {}.{} is not connected", name, pin)
                }
                _ => warn!("Input {}.{} is not connected and reads as low", name, pin),
            }
        }

        let mut diagnostics = self.scanner.take_diagnostics();
        diagnostics.append(&mut state.diagnostics);
        debug!("Parsing finished with {} diagnostics", diagnostics.len());
        (diagnostics.is_empty(), diagnostics)
    }

    fn parse_sections(&mut self, st: &mut ParserState) -> Result<()> {
        for section in Section::ALL {
            self.parse_section(st, section)?;
        }

        if let Some((section, token)) = self.pending.take() {
            return Err(anyhow!(
                "header '[{}]' at line {} was never handled",
                section,
                token.line + 1
            ));
        }

        // Sections after [monit] are all out of order.
        while let Some((found, token)) = self.read_header(st) {
            self.error_at(
                st,
                ErrorKind::InvalidHeader,
                format!("Section '[{}]' is repeated or out of order", found),
                &token,
            );
            self.skip_to_section();
        }
        Ok(())
    }

    fn parse_section(&mut self, st: &mut ParserState, section: Section) -> Result<()> {
        let mut reported = false;

        loop {
            let found = match self.pending.take() {
                Some(found) => Some(found),
                None => {
                    if !self.at(TokenKind::OpenSquare) && !self.at(TokenKind::Eof) {
                        self.error(
                            st,
                            ErrorKind::MissingHeader,
                            format!("Expected '[{}]', found {}", section, self.current),
                        );
                        reported = true;
                        self.skip_to_section();
                    }
                    self.read_header(st)
                }
            };

            match found {
                Some((found, _)) if found == section => {
                    return self.parse_body(st, section);
                }
                Some((found, token)) if found > section => {
                    if !reported {
                        self.error_at(
                            st,
                            ErrorKind::MissingHeader,
                            format!("Missing '[{}]' section before '[{}]'", section, found),
                            &token,
                        );
                    }
                    self.pending = Some((found, token));
                    return Ok(());
                }
                Some((found, token)) => {
                    self.error_at(
                        st,
                        ErrorKind::InvalidHeader,
                        format!("Section '[{}]' is repeated or out of order", found),
                        &token,
                    );
                    self.skip_to_section();
                }
                None => {
                    if !reported {
                        self.error(
                            st,
                            ErrorKind::MissingHeader,
                            format!("Missing '[{}]' section", section),
                        );
                    }
                    return Ok(());
                }
            }
        }
    }

    /// Reads `[ heading ]` starting at a `[`. Returns `None` at the end of the file.
    fn read_header(&mut self, st: &mut ParserState) -> Option<(Section, Token)> {
        while self.at(TokenKind::OpenSquare) {
            self.advance();

            let section = match self.current.kind {
                TokenKind::Heading => Section::from_heading(&self.current.text),
                _ => None,
            };
            let Some(section) = section else {
                self.error(
                    st,
                    ErrorKind::InvalidHeader,
                    format!(
                        "Expected 'devices', 'conns' or 'monit' after '[', found {}",
                        self.current
                    ),
                );
                self.skip_to_section();
                continue;
            };

            let token = self.current.clone();
            self.advance();
            if self.at(TokenKind::CloseSquare) {
                self.advance();
            } else {
                self.error(
                    st,
                    ErrorKind::InvalidHeader,
                    format!("Expected ']' after '[{}', found {}", section, self.current),
                );
            }
            return Some((section, token));
        }
        None
    }

    fn parse_body(&mut self, st: &mut ParserState, section: Section) -> Result<()> {
        let mut lines = 0;

        while !self.at(TokenKind::OpenSquare) && !self.at(TokenKind::Eof) {
            if lines == self.limits.max_block_lines {
                self.error(
                    st,
                    ErrorKind::OverflowError,
                    format!(
                        "More than {} declarations in section '[{}]'",
                        self.limits.max_block_lines, section
                    ),
                );
                self.skip_to_section();
                break;
            }
            lines += 1;

            match section {
                Section::Devices => self.parse_device_line(st)?,
                Section::Conns => self.parse_connection_line(st)?,
                Section::Monit => self.parse_monitor_line(st)?,
            }
        }

        debug!("Parsed {} declarations in [{}]", lines, section);
        Ok(())
    }

    /// Reads a `name[.pin]` reference to a declared device.
    ///
    /// On failure a diagnostic is recorded and `None` returned; the caller skips the line.
    fn read_reference(&mut self, st: &mut ParserState) -> Result<Option<Reference>> {
        match self.current.kind {
            TokenKind::Name => {}
            TokenKind::Logic => {
                self.error(
                    st,
                    ErrorKind::InvalidName,
                    format!("{} is a reserved word, not a device name", self.current),
                );
                return Ok(None);
            }
            _ => {
                self.error(
                    st,
                    ErrorKind::InvalidName,
                    format!("Expected a device name, found {}", self.current),
                );
                return Ok(None);
            }
        }

        let name = self.current.clone();
        let device = symbol_id(&name)?;
        if !st.declared.contains(&device) {
            self.error(
                st,
                ErrorKind::InvalidDevice,
                format!("Device '{}' is not declared in '[devices]'", name.text),
            );
            return Ok(None);
        }
        self.advance();

        let pin = match self.current.kind {
            TokenKind::Dot => {
                self.advance();
                match self.current.kind {
                    TokenKind::Name => {
                        let pin = self.current.clone();
                        self.advance();
                        Some(pin)
                    }
                    TokenKind::Number => {
                        self.error(
                            st,
                            ErrorKind::MissingI,
                            format!(
                                "Expected a pin name, found number {}; gate inputs are written I{}",
                                self.current, self.current.text
                            ),
                        );
                        return Ok(None);
                    }
                    _ => {
                        self.error(
                            st,
                            ErrorKind::InvalidPin,
                            format!("Expected a pin name after '.', found {}", self.current),
                        );
                        return Ok(None);
                    }
                }
            }
            TokenKind::Name => {
                self.error(
                    st,
                    ErrorKind::MissingDot,
                    format!(
                        "Expected '.' between '{}' and '{}'",
                        name.text, self.current.text
                    ),
                );
                return Ok(None);
            }
            _ => None,
        };

        Ok(Some(Reference { device, name, pin }))
    }

    fn advance(&mut self) {
        let next = self.scanner.next_token();
        self.previous = std::mem::replace(&mut self.current, next);
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.is(kind)
    }

    /// Skips the rest of a malformed line, consuming its `;`. Stops before a header.
    fn skip_line(&mut self) {
        loop {
            match self.current.kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::OpenSquare | TokenKind::Eof => return,
                _ => self.advance(),
            }
        }
    }

    fn skip_to_section(&mut self) {
        while !self.at(TokenKind::OpenSquare) && !self.at(TokenKind::Eof) {
            self.advance();
        }
    }

    /// Consumes the `;` ending a line, reporting and skipping to it if something else
    /// is found. A `;` missing at the end of a source line is reported after the last
    /// token and parsing resumes on the next line.
    fn expect_semicolon(&mut self, st: &mut ParserState) {
        if self.at(TokenKind::Semicolon) {
            self.advance();
        } else if self.current.line > self.previous.line {
            self.error_at(
                st,
                ErrorKind::SyntaxError,
                format!("Expected ';' after {}", self.previous),
                &self.previous,
            );
        } else {
            self.error(
                st,
                ErrorKind::SyntaxError,
                format!("Expected ';', found {}", self.current),
            );
            self.skip_line();
        }
    }

    fn error(&self, st: &mut ParserState, kind: ErrorKind, message: impl Into<String>) {
        self.error_at(st, kind, message, &self.current);
    }

    fn error_at(
        &self,
        st: &mut ParserState,
        kind: ErrorKind,
        message: impl Into<String>,
        token: &Token,
    ) {
        let diagnostic = Diagnostic::new(
            kind,
            message,
            token.line,
            token.column,
            self.scanner.line_text(token.line),
        );
        debug!("{:?} at {}:{}", kind, token.line + 1, token.column + 1);
        st.diagnostics.push(diagnostic);
    }
}

fn symbol_id(token: &Token) -> Result<NameId> {
    token
        .id
        .ok_or_else(|| anyhow!("{:?} token '{}' has no symbol id", token.kind, token.text))
}

/// Scans and parses `source`, building the circuit into `network` and `monitors`.
pub fn parse_source(
    source: &str,
    names: &mut Names,
    network: &mut Network,
    monitors: &mut Monitors,
    limits: Limits,
) -> (bool, Vec<Diagnostic>) {
    let scanner = Scanner::new(source, names);
    Parser::new(scanner, network, monitors, limits).parse()
}

#[cfg(test)]
mod tests;
