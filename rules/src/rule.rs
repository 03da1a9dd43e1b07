//! Parsed representation of one rule definition

use crate::token_buffer::TokenBuffer;
use preprocessor::{Symbol, Token, TokenKind};
use serde::Serialize;
use source_map::{SourceLocation, SourceRange};
use std::fmt;

/// Kind of a rule parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Expression,
    Identifier,
    Statement,
    Block,
}

impl ParamKind {
    /// Map a type tag such as `$expr` to its kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "$expr" => Some(ParamKind::Expression),
            "$ident" => Some(ParamKind::Identifier),
            "$stmt" => Some(ParamKind::Statement),
            "$block" => Some(ParamKind::Block),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ParamKind::Expression => "$expr",
            ParamKind::Identifier => "$ident",
            ParamKind::Statement => "$stmt",
            ParamKind::Block => "$block",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Shape of the tokens a rule expands to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratedKind {
    Expression,
    Statement,
    #[default]
    Block,
}

impl GeneratedKind {
    pub fn from_param_kind(kind: ParamKind) -> Option<Self> {
        match kind {
            ParamKind::Expression => Some(GeneratedKind::Expression),
            ParamKind::Statement => Some(GeneratedKind::Statement),
            ParamKind::Block => Some(GeneratedKind::Block),
            ParamKind::Identifier => None,
        }
    }
}

impl fmt::Display for GeneratedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratedKind::Expression => f.write_str("$expr"),
            GeneratedKind::Statement => f.write_str("$stmt"),
            GeneratedKind::Block => f.write_str("$block"),
        }
    }
}

/// A typed formal slot of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub symbol: Symbol,
    pub kind: ParamKind,
    pub variadic: bool,
    pub location: SourceLocation,
}

/// A `$loop` body: body indices of its two boundary markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopRegion {
    pub start: usize,
    pub end: usize,
    pub induction_var: Symbol,
    pub iteration_source: Symbol,
    pub location: SourceLocation,
}

impl LoopRegion {
    /// Body indices strictly between the markers
    pub fn body_range(&self) -> std::ops::Range<usize> {
        self.start + 1..self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }
}

#[derive(Debug, Clone, Default)]
pub struct Rule {
    /// Absent for anonymous rules, which are never registered
    pub name: Option<Symbol>,
    pub generated_kind: GeneratedKind,
    /// From the `(` of the parameter list to the end of the closing brace
    pub range: SourceRange,
    params: Vec<Parameter>,
    body: TokenBuffer,
    /// Ordered by start index
    loops: Vec<LoopRegion>,
}

impl Rule {
    pub fn new(name: Option<Symbol>) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn parameter(&self, symbol: Symbol) -> Option<&Parameter> {
        self.params.iter().find(|p| p.symbol == symbol)
    }

    pub fn add_parameter(&mut self, parameter: Parameter) {
        debug_assert!(self.parameter(parameter.symbol).is_none());
        self.params.push(parameter);
    }

    /// The trailing variadic parameter, if any
    pub fn variadic_parameter(&self) -> Option<&Parameter> {
        self.params.last().filter(|p| p.variadic)
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic_parameter().is_some()
    }

    pub fn param_symbols(&self) -> Vec<Symbol> {
        self.params.iter().map(|p| p.symbol).collect()
    }

    pub fn body(&self) -> &TokenBuffer {
        &self.body
    }

    pub fn add_token(&mut self, token: Token) -> usize {
        self.body.push(token);
        self.body.len() - 1
    }

    /// Insert at `index`, keeping loop regions attached to their markers
    pub fn insert_token(&mut self, index: usize, token: Token) {
        self.body.insert(index, token);
        for region in self.loops.iter_mut() {
            if region.start >= index {
                region.start += 1;
            }
            if region.end >= index {
                region.end += 1;
            }
        }
    }

    /// Erase the token at `index`. Loop markers cannot be erased.
    pub fn erase_token(&mut self, index: usize) -> Token {
        assert!(
            !self.body[index].is(TokenKind::LoopMarker),
            "erasing loop marker at body index {}",
            index
        );
        let token = self.body.erase(index);
        for region in self.loops.iter_mut() {
            if region.start > index {
                region.start -= 1;
            }
            if region.end > index {
                region.end -= 1;
            }
        }
        token
    }

    pub fn replace_token(&mut self, index: usize, token: Token) -> Token {
        self.body.replace(index, token)
    }

    pub fn loops(&self) -> &[LoopRegion] {
        &self.loops
    }

    pub fn has_loops(&self) -> bool {
        !self.loops.is_empty()
    }

    /// Record a region; regions must be added in body order
    pub fn add_loop(&mut self, region: LoopRegion) {
        debug_assert!(self.loops.last().map_or(true, |last| last.end < region.start));
        self.loops.push(region);
    }

    /// Region whose opening marker sits at body index `start`
    pub fn loop_starting_at(&self, start: usize) -> Option<&LoopRegion> {
        self.loops
            .binary_search_by_key(&start, |r| r.start)
            .ok()
            .map(|i| &self.loops[i])
    }

    /// Region containing body index `index`, markers included
    pub fn loop_containing(&self, index: usize) -> Option<&LoopRegion> {
        let candidate = match self.loops.binary_search_by_key(&index, |r| r.start) {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        self.loops.get(candidate).filter(|r| r.contains(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preprocessor::Interner;

    fn tok(kind: TokenKind) -> Token {
        Token::new(kind, SourceLocation::unknown())
    }

    fn rule_with_loop() -> (Rule, Symbol) {
        let mut interner = Interner::new();
        let i = interner.intern("i");
        let list = interner.intern("list");
        let mut rule = Rule::new(None);
        rule.add_token(tok(TokenKind::LBrace));
        let start = rule.add_token(tok(TokenKind::LoopMarker));
        rule.add_token(Token::identifier(i, SourceLocation::unknown(), 1));
        rule.add_token(tok(TokenKind::Semi));
        let end = rule.add_token(tok(TokenKind::LoopMarker));
        rule.add_token(tok(TokenKind::RBrace));
        rule.add_loop(LoopRegion {
            start,
            end,
            induction_var: i,
            iteration_source: list,
            location: SourceLocation::unknown(),
        });
        (rule, i)
    }

    #[test]
    fn test_param_kind_tags() {
        assert_eq!(ParamKind::from_tag("$expr"), Some(ParamKind::Expression));
        assert_eq!(ParamKind::from_tag("$block"), Some(ParamKind::Block));
        assert_eq!(ParamKind::from_tag("$foo"), None);
        assert_eq!(GeneratedKind::from_param_kind(ParamKind::Identifier), None);
        assert_eq!(GeneratedKind::default(), GeneratedKind::Block);
    }

    #[test]
    fn test_insert_shifts_regions() {
        let (mut rule, _) = rule_with_loop();
        rule.insert_token(0, tok(TokenKind::Comma));
        assert_eq!((rule.loops()[0].start, rule.loops()[0].end), (2, 5));

        // inside the loop body: only the end marker moves
        rule.insert_token(3, tok(TokenKind::LParen));
        assert_eq!((rule.loops()[0].start, rule.loops()[0].end), (2, 6));

        // after the loop: nothing moves
        rule.insert_token(7, tok(TokenKind::Semi));
        assert_eq!((rule.loops()[0].start, rule.loops()[0].end), (2, 6));
        assert!(rule.body()[2].is(TokenKind::LoopMarker));
        assert!(rule.body()[6].is(TokenKind::LoopMarker));
    }

    #[test]
    fn test_erase_shifts_regions() {
        let (mut rule, _) = rule_with_loop();
        rule.erase_token(0);
        assert_eq!((rule.loops()[0].start, rule.loops()[0].end), (0, 3));
        rule.erase_token(2);
        assert_eq!((rule.loops()[0].start, rule.loops()[0].end), (0, 2));
    }

    #[test]
    #[should_panic(expected = "erasing loop marker")]
    fn test_erase_marker_panics() {
        let (mut rule, _) = rule_with_loop();
        rule.erase_token(1);
    }

    #[test]
    fn test_region_lookup() {
        let (rule, i) = rule_with_loop();
        assert!(rule.loop_starting_at(1).is_some_and(|r| r.induction_var == i));
        assert!(rule.loop_starting_at(2).is_none());
        assert!(rule.loop_containing(3).is_some());
        assert!(rule.loop_containing(0).is_none());
        assert!(rule.loop_containing(5).is_none());
    }
}
