use anyhow::{Result, bail};

use super::{Parser, ParserState};
use crate::{errors::ErrorKind, monitors::MonitorError, scanner::TokenKind};

impl Parser<'_> {
    /// `signal { "," signal } ";"`
    pub(super) fn parse_monitor_line(&mut self, st: &mut ParserState) -> Result<()> {
        loop {
            let Some(reference) = self.read_reference(st)? else {
                self.skip_line();
                return Ok(());
            };

            if let Some(pin) = self.resolve_output(st, &reference)? {
                match self
                    .monitors
                    .make_monitor(self.network.devices(), reference.device, pin)
                {
                    Ok(()) => {}
                    Err(MonitorError::MonitorPresent(..)) => {
                        self.error_at(
                            st,
                            ErrorKind::DeviceError,
                            format!("Signal '{}' is already monitored", reference),
                            &reference.name,
                        );
                    }
                    Err(err) => bail!("monitoring '{}': {}", reference, err),
                }
            }

            if self.at(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        self.expect_semicolon(st);
        Ok(())
    }
}
