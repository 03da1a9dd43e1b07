//! Macro definitions and the macro table

use crate::intern::Symbol;
use crate::token::{Token, TokenKind};
use fxhash::FxHashMap;
use smallvec::SmallVec;
use source_map::SourceLocation;

pub type ParamList = SmallVec<[Symbol; 4]>;

/// One live macro definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    pub name: Symbol,
    pub params: ParamList,
    pub body: Vec<Token>,
    pub function_like: bool,
    /// The last parameter absorbs every remaining argument
    pub variadic: bool,
    pub location: SourceLocation,
}

impl MacroDefinition {
    pub fn object_like(name: Symbol, body: Vec<Token>, location: SourceLocation) -> Self {
        Self {
            name,
            params: ParamList::new(),
            body,
            function_like: false,
            variadic: false,
            location,
        }
    }

    pub fn function_like(
        name: Symbol,
        params: impl IntoIterator<Item = Symbol>,
        body: Vec<Token>,
        variadic: bool,
        location: SourceLocation,
    ) -> Self {
        Self {
            name,
            params: params.into_iter().collect(),
            body,
            function_like: true,
            variadic,
            location,
        }
    }

    pub fn param_index(&self, symbol: Symbol) -> Option<usize> {
        self.params.iter().position(|&p| p == symbol)
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether `found` actual arguments satisfy this definition
    pub fn accepts(&self, found: usize) -> bool {
        if self.variadic {
            found + 1 >= self.params.len()
        } else {
            found == self.params.len()
        }
    }
}

/// Actual arguments of one invocation, each terminated by an `Eof` token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroArgs {
    args: Vec<Vec<Token>>,
}

impl MacroArgs {
    pub fn new(args: Vec<Vec<Token>>) -> Self {
        debug_assert!(args
            .iter()
            .all(|a| a.last().is_some_and(|t| t.is(TokenKind::Eof))));
        Self { args }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Raw tokens of one argument, including the trailing `Eof`
    pub fn get(&self, index: usize) -> Option<&[Token]> {
        self.args.get(index).map(|a| a.as_slice())
    }

    /// Raw tokens of one argument without the trailing `Eof`
    pub fn unterminated(&self, index: usize) -> &[Token] {
        match self.args.get(index) {
            Some(arg) => &arg[..arg.len().saturating_sub(1)],
            None => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Token]> {
        self.args.iter().map(|a| a.as_slice())
    }
}

/// Name to definition map with a change counter per name
#[derive(Debug, Default)]
pub struct MacroTable {
    definitions: FxHashMap<Symbol, MacroDefinition>,
    generations: FxHashMap<Symbol, u64>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a definition, returning the one it replaces
    pub fn define(&mut self, definition: MacroDefinition) -> Option<MacroDefinition> {
        let name = definition.name;
        *self.generations.entry(name).or_insert(0) += 1;
        self.definitions.insert(name, definition)
    }

    pub fn undefine(&mut self, name: Symbol) -> Option<MacroDefinition> {
        *self.generations.entry(name).or_insert(0) += 1;
        self.definitions.remove(&name)
    }

    pub fn get(&self, name: Symbol) -> Option<&MacroDefinition> {
        self.definitions.get(&name)
    }

    pub fn is_defined(&self, name: Symbol) -> bool {
        self.definitions.contains_key(&name)
    }

    /// Counter bumped by every define/undefine of `name`
    pub fn generation(&self, name: Symbol) -> u64 {
        self.generations.get(&name).copied().unwrap_or(0)
    }

    /// Remove a definition without counting it as a change
    pub(crate) fn take(&mut self, name: Symbol) -> Option<MacroDefinition> {
        self.definitions.remove(&name)
    }

    /// Put a definition back without counting it as a change
    pub(crate) fn restore(&mut self, definition: MacroDefinition) {
        self.definitions.insert(definition.name, definition);
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MacroDefinition> {
        self.definitions.values()
    }
}
