//! Identifier and literal interning
//!
//! Every identifier and literal spelling the lexer produces is stored once.
//! Tokens carry a [`Symbol`] handle, so comparing two identifiers is a
//! `u32` comparison and tokens stay `Copy`.

use fxhash::FxHashMap;
use std::fmt;
use std::rc::Rc;

/// An interned string represented as a unique ID
///
/// Two symbols from the same [`Interner`] are equal if and only if they
/// represent the same string content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Get the raw ID of this symbol
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Deduplicating string table
#[derive(Default)]
pub struct Interner {
    map: FxHashMap<Rc<str>, Symbol>,
    strings: Vec<Rc<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its unique ID
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&existing) = self.map.get(s) {
            return existing;
        }
        let symbol = Symbol(self.strings.len() as u32);
        let shared: Rc<str> = Rc::from(s);
        self.strings.push(shared.clone());
        self.map.insert(shared, symbol);
        symbol
    }

    /// Get the ID of an already-interned string without interning it
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).copied()
    }

    /// String content of a symbol.
    ///
    /// Symbols are only ever created by this interner, so an unknown id is a
    /// programming error and panics.
    pub fn resolve(&self, symbol: Symbol) -> &str {
        &self.strings[symbol.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner")
            .field("unique_strings", &self.strings.len())
            .finish()
    }
}
