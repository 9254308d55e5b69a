//! Symbol table shared by every stage of the simulator.
//!
//! Identifier strings are interned once and referred to by a [`NameId`] from then on.
//! The scanner interns every alphanumeric run it reads, the parser and device registry
//! key devices by the id of their name, and the monitor set turns ids back into strings
//! when reporting signal names.
//!
//! # Example
//!
//! ```
//! use logsim::names::Names;
//!
//! let mut names = Names::new();
//! let ids = names.lookup(&["G1", "G2", "G1"]);
//! assert_eq!(ids[0], ids[2]);
//! assert_eq!(names.query("G2"), Some(ids[1]));
//! assert_eq!(names.name_of(ids[1]).unwrap().as_ref(), "G2");
//! ```

use std::{collections::HashMap, error::Error, fmt};

use string_cache::DefaultAtom;

pub type Symbol = DefaultAtom;

/// Stable identifier of an interned name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(usize);

impl NameId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum NamesError {
    /// The id was never handed out by this table.
    OutOfRange(NameId),
}

impl fmt::Display for NamesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamesError::OutOfRange(id) => write!(f, "Name id {} is out of range", id),
        }
    }
}

impl Error for NamesError {}

/// Interning table mapping names to ids and back.
///
/// Ids are handed out in order of first appearance and never reused.
#[derive(Debug, Default, Clone)]
pub struct Names {
    symbols: Vec<Symbol>,
    ids: HashMap<Symbol, NameId>,
}

impl Names {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of every name, interning the ones not seen before.
    ///
    /// The output has the same order as the input.
    pub fn lookup<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<NameId> {
        names.iter().map(|name| self.intern(name.as_ref())).collect()
    }

    /// Interns a single name.
    pub fn intern(&mut self, name: &str) -> NameId {
        let symbol = Symbol::from(name);
        if let Some(id) = self.ids.get(&symbol) {
            return *id;
        }

        let id = NameId(self.symbols.len());
        self.symbols.push(symbol.clone());
        self.ids.insert(symbol, id);
        id
    }

    /// Looks a name up without interning it.
    pub fn query(&self, name: &str) -> Option<NameId> {
        self.ids.get(&Symbol::from(name)).copied()
    }

    pub fn name_of(&self, id: NameId) -> Result<&Symbol, NamesError> {
        self.symbols.get(id.0).ok_or(NamesError::OutOfRange(id))
    }

    /// Like [`Names::name_of`] but falls back to the id's display form.
    ///
    /// Used when building messages, where a missing name is not worth failing over.
    pub fn display_name(&self, id: NameId) -> String {
        match self.name_of(id) {
            Ok(symbol) => symbol.to_string(),
            Err(_) => id.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_g1_g2() -> Names {
        let mut names = Names::new();
        names.lookup(&["G1", "G2"]);
        names
    }

    #[test]
    fn test_query() {
        let names = table_with_g1_g2();
        assert_eq!(names.query("G1"), Some(NameId(0)));
        assert_eq!(names.query("G2"), Some(NameId(1)));
        assert_eq!(names.query("test"), None);
    }

    #[test]
    fn test_lookup_preserves_order() {
        let mut names = table_with_g1_g2();
        assert_eq!(names.lookup(&["G1", "G2"]), vec![NameId(0), NameId(1)]);
        assert_eq!(names.lookup(&["G3", "G4"]), vec![NameId(2), NameId(3)]);
        assert_eq!(names.lookup(&["G4", "G1"]), vec![NameId(3), NameId(0)]);
        assert_eq!(names.lookup(&["G5", "G3"]), vec![NameId(4), NameId(2)]);
    }

    #[test]
    fn test_lookup_adds_names() {
        let mut names = table_with_g1_g2();
        assert_eq!(names.query("G3"), None);
        assert_eq!(names.lookup(&["G3"]), vec![NameId(2)]);
        assert_eq!(names.query("G3"), Some(NameId(2)));
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_ids_are_stable() {
        let mut names = Names::new();
        let first = names.intern("CLK1");
        for _ in 0..10 {
            names.intern("other");
            assert_eq!(names.intern("CLK1"), first);
        }
    }

    #[test]
    fn test_name_of() {
        let names = table_with_g1_g2();
        assert_eq!(names.name_of(NameId(0)).unwrap().as_ref(), "G1");
        assert_eq!(names.name_of(NameId(1)).unwrap().as_ref(), "G2");
        assert_eq!(
            names.name_of(NameId(20)),
            Err(NamesError::OutOfRange(NameId(20)))
        );
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut names = Names::new();
        let upper = names.intern("And");
        let lower = names.intern("and");
        assert_ne!(upper, lower);
    }
}
