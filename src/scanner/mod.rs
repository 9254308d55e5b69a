//! Lexical scanner for circuit definition files.
//!
//! The scanner walks the source one character at a time, skipping whitespace and `#`
//! comments, and hands out [`Token`]s on demand. Every alphanumeric run is interned in
//! the shared [`Names`] table so the parser can compare names by id.
//!
//! Lexical errors never stop the scanner: an unexpected character is recorded as an
//! `InvalidCharacter` diagnostic and scanning resumes with the next character. Once the
//! input is exhausted every call returns an `Eof` token.
//!
//! # Example
//!
//! ```
//! use logsim::names::Names;
//! use logsim::scanner::{Scanner, TokenKind};
//!
//! let mut names = Names::new();
//! let mut scanner = Scanner::new("[devices] SW1 = SWITCH(1);", &mut names);
//!
//! let kinds: Vec<TokenKind> = std::iter::from_fn(|| {
//!     let token = scanner.next_token();
//!     (token.kind != TokenKind::Eof).then_some(token.kind)
//! })
//! .collect();
//!
//! assert_eq!(kinds.len(), 10);
//! assert!(scanner.diagnostics().is_empty());
//! ```

mod token;

pub use token::{HEADINGS, LOGIC_KEYWORDS, Token, TokenKind};

use crate::{
    errors::{Diagnostic, ErrorKind},
    names::Names,
};

pub struct Scanner<'a> {
    source: String,
    chars: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    after_open_square: bool,
    names: &'a mut Names,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &str, names: &'a mut Names) -> Self {
        Scanner {
            source: source.to_owned(),
            chars: source.chars().collect(),
            position: 0,
            line: 0,
            column: 0,
            after_open_square: false,
            names,
            diagnostics: Vec::new(),
        }
    }

    pub fn names(&self) -> &Names {
        &*self.names
    }

    /// Lexical errors recorded so far, in source order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn line(&self) -> usize {
        self.line
    }

    fn current_character(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current_character() {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn skip_spaces_and_comments(&mut self) {
        while let Some(c) = self.current_character() {
            if c.is_whitespace() {
                self.advance();
            } else if c == '#' {
                while !matches!(self.current_character(), None | Some('\n')) {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut run = String::new();
        while let Some(c) = self.current_character().filter(|c| predicate(*c)) {
            run.push(c);
            self.advance();
        }
        run
    }

    /// Reads the next token, recording any invalid characters skipped on the way.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_spaces_and_comments();
            let (line, column) = (self.line, self.column);

            let Some(c) = self.current_character() else {
                return self.token(TokenKind::Eof, String::new(), line, column);
            };

            if c.is_alphabetic() {
                let text = self.take_while(char::is_alphanumeric);
                let kind = if self.after_open_square && HEADINGS.contains(&text.as_str()) {
                    TokenKind::Heading
                } else if LOGIC_KEYWORDS.contains(&text.as_str()) {
                    TokenKind::Logic
                } else {
                    TokenKind::Name
                };
                let id = self.names.intern(&text);
                let mut token = self.token(kind, text, line, column);
                token.id = Some(id);
                return token;
            }

            if c.is_ascii_digit() {
                let text = self.take_while(|c| c.is_ascii_digit());
                return self.token(TokenKind::Number, text, line, column);
            }

            if let Some(kind) = TokenKind::punctuation(c) {
                self.advance();
                return self.token(kind, c.to_string(), line, column);
            }

            self.diagnostics.push(Diagnostic::new(
                ErrorKind::InvalidCharacter,
                format!("Unexpected character '{}'", c),
                line,
                column,
                self.line_text(line),
            ));
            self.advance();
        }
    }

    fn token(&mut self, kind: TokenKind, text: String, line: usize, column: usize) -> Token {
        self.after_open_square = kind == TokenKind::OpenSquare;
        Token {
            kind,
            text,
            id: None,
            line,
            column,
        }
    }

    /// Full text of a zero based source line, empty past the end of the file.
    pub fn line_text(&self, line: usize) -> String {
        self.source
            .split('\n')
            .nth(line)
            .map(|text| text.trim_end_matches('\r').to_owned())
            .unwrap_or_default()
    }

    pub fn current_line_text(&self) -> String {
        self.line_text(self.line)
    }

    pub fn previous_line_text(&self) -> String {
        match self.line {
            0 => String::new(),
            line => self.line_text(line - 1),
        }
    }
}
