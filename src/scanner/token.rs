use std::fmt;

use crate::names::NameId;

/// Section headings, in the order they must appear in a file.
pub const HEADINGS: [&str; 3] = ["devices", "conns", "monit"];

/// Reserved device type keywords.
pub const LOGIC_KEYWORDS: [&str; 8] = [
    "AND", "OR", "NAND", "NOR", "XOR", "SWITCH", "CLOCK", "DTYPE",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Heading,
    Logic,
    Number,
    Name,
    Equal,
    Dot,
    Comma,
    Semicolon,
    OpenBracket,
    CloseBracket,
    OpenSquare,
    CloseSquare,
    Eof,
}

impl TokenKind {
    pub(crate) fn punctuation(c: char) -> Option<TokenKind> {
        match c {
            '=' => Some(TokenKind::Equal),
            '.' => Some(TokenKind::Dot),
            ',' => Some(TokenKind::Comma),
            ';' => Some(TokenKind::Semicolon),
            '(' => Some(TokenKind::OpenBracket),
            ')' => Some(TokenKind::CloseBracket),
            '[' => Some(TokenKind::OpenSquare),
            ']' => Some(TokenKind::CloseSquare),
            _ => None,
        }
    }
}

/// A token read by the [`Scanner`](super::Scanner).
///
/// `id` is set for every alphanumeric run (headings, keywords and names) and is the
/// symbol table id of `text`. Positions are zero based and point at the first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub id: Option<NameId>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Value of a `Number` token, `None` for other kinds or when it does not fit.
    pub fn number(&self) -> Option<u32> {
        match self.kind {
            TokenKind::Number => self.text.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of file"),
            _ => write!(f, "'{}'", self.text),
        }
    }
}
