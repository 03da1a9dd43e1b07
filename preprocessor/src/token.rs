//! Preprocessing tokens
//!
//! A [`Token`] is a small `Copy` value. Identifier and literal spellings live
//! in the [`Interner`]; punctuators are spelled from their kind.

use crate::intern::{Interner, Symbol};
use source_map::SourceLocation;
use std::fmt;

/// Closed set of token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    NumericLiteral,
    StringLiteral,
    CharLiteral,
    /// A character the lexer does not recognise, kept so it round-trips
    Unknown,

    // Punctuators
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Period,
    Arrow,
    PlusPlus,
    MinusMinus,
    Amp,
    Star,
    Plus,
    Minus,
    Tilde,
    Exclaim,
    Slash,
    Percent,
    LessLess,
    GreaterGreater,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    EqualEqual,
    ExclaimEqual,
    Caret,
    Pipe,
    AmpAmp,
    PipePipe,
    Question,
    Colon,
    Semi,
    Ellipsis,
    Equal,
    StarEqual,
    SlashEqual,
    PercentEqual,
    PlusEqual,
    MinusEqual,
    LessLessEqual,
    GreaterGreaterEqual,
    AmpEqual,
    CaretEqual,
    PipeEqual,
    Comma,
    Hash,
    HashHash,

    /// End of a directive line
    Eod,
    /// End of input, also used to terminate macro arguments
    Eof,

    /// Synthetic boundary of a `$loop` body
    LoopMarker,
    /// Synthetic marker asking for the next token to be stringified
    StringifyMarker,
}

/// Punctuator spellings, longest first so a prefix scan picks the longest match.
pub const PUNCTUATORS: &[(&str, TokenKind)] = &[
    ("<<=", TokenKind::LessLessEqual),
    (">>=", TokenKind::GreaterGreaterEqual),
    ("...", TokenKind::Ellipsis),
    ("->", TokenKind::Arrow),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("<<", TokenKind::LessLess),
    (">>", TokenKind::GreaterGreater),
    ("<=", TokenKind::LessEqual),
    (">=", TokenKind::GreaterEqual),
    ("==", TokenKind::EqualEqual),
    ("!=", TokenKind::ExclaimEqual),
    ("&&", TokenKind::AmpAmp),
    ("||", TokenKind::PipePipe),
    ("*=", TokenKind::StarEqual),
    ("/=", TokenKind::SlashEqual),
    ("%=", TokenKind::PercentEqual),
    ("+=", TokenKind::PlusEqual),
    ("-=", TokenKind::MinusEqual),
    ("&=", TokenKind::AmpEqual),
    ("^=", TokenKind::CaretEqual),
    ("|=", TokenKind::PipeEqual),
    ("##", TokenKind::HashHash),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    (".", TokenKind::Period),
    ("&", TokenKind::Amp),
    ("*", TokenKind::Star),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("~", TokenKind::Tilde),
    ("!", TokenKind::Exclaim),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
    ("^", TokenKind::Caret),
    ("|", TokenKind::Pipe),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    (";", TokenKind::Semi),
    ("=", TokenKind::Equal),
    (",", TokenKind::Comma),
    ("#", TokenKind::Hash),
];

impl TokenKind {
    /// Fixed spelling of punctuators; `None` for kinds spelled by their data
    /// and for the synthetic kinds.
    pub fn spelling(self) -> Option<&'static str> {
        PUNCTUATORS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(text, _)| *text)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::NumericLiteral | TokenKind::StringLiteral | TokenKind::CharLiteral
        )
    }

    pub fn is_synthetic(self) -> bool {
        matches!(self, TokenKind::LoopMarker | TokenKind::StringifyMarker)
    }

    pub fn is_end(self) -> bool {
        matches!(self, TokenKind::Eof | TokenKind::Eod)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.spelling() {
            Some(text) => write!(f, "'{}'", text),
            None => match self {
                TokenKind::Identifier => write!(f, "identifier"),
                TokenKind::NumericLiteral => write!(f, "numeric literal"),
                TokenKind::StringLiteral => write!(f, "string literal"),
                TokenKind::CharLiteral => write!(f, "character literal"),
                TokenKind::Eod => write!(f, "end of directive"),
                TokenKind::Eof => write!(f, "end of input"),
                TokenKind::LoopMarker => write!(f, "loop marker"),
                TokenKind::StringifyMarker => write!(f, "stringify marker"),
                _ => write!(f, "unknown token"),
            },
        }
    }
}

/// Per-token flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TokenFlags {
    /// First token on its line
    pub at_line_start: bool,
    /// Whitespace or a comment precedes the token
    pub leading_space: bool,
    /// Names a macro that must not be expanded here
    pub no_expand: bool,
    /// Came from an actual argument; never treated as a parameter reference
    pub substituted: bool,
    /// Produced by stringification
    pub stringified: bool,
}

/// A lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
    /// Length in bytes of the spelling in the source
    pub length: u32,
    /// Interned spelling for identifiers, literals and unknown characters
    pub data: Option<Symbol>,
    pub flags: TokenFlags,
}

impl Token {
    pub fn new(kind: TokenKind, location: SourceLocation) -> Self {
        let length = kind.spelling().map(|s| s.len() as u32).unwrap_or(0);
        Self {
            kind,
            location,
            length,
            data: None,
            flags: TokenFlags::default(),
        }
    }

    pub fn identifier(symbol: Symbol, location: SourceLocation, length: u32) -> Self {
        Self {
            kind: TokenKind::Identifier,
            location,
            length,
            data: Some(symbol),
            flags: TokenFlags::default(),
        }
    }

    pub fn with_data(kind: TokenKind, symbol: Symbol, location: SourceLocation, length: u32) -> Self {
        Self {
            kind,
            location,
            length,
            data: Some(symbol),
            flags: TokenFlags::default(),
        }
    }

    pub fn eof(location: SourceLocation) -> Self {
        Self::new(TokenKind::Eof, location)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_not(&self, kind: TokenKind) -> bool {
        self.kind != kind
    }

    /// Interned identifier, if this is an identifier token
    pub fn identifier_symbol(&self) -> Option<Symbol> {
        match self.kind {
            TokenKind::Identifier => self.data,
            _ => None,
        }
    }

    pub fn is_identifier(&self, symbol: Symbol) -> bool {
        self.identifier_symbol() == Some(symbol)
    }

    /// Text of the token as it would appear in source
    pub fn spelling<'a>(&self, interner: &'a Interner) -> &'a str {
        if let Some(symbol) = self.data {
            return interner.resolve(symbol);
        }
        match self.kind {
            TokenKind::LoopMarker | TokenKind::StringifyMarker | TokenKind::Eod | TokenKind::Eof => "",
            kind => kind.spelling().unwrap_or(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuators_longest_first() {
        for (i, (text, _)) in PUNCTUATORS.iter().enumerate() {
            for (later, _) in &PUNCTUATORS[i + 1..] {
                assert!(
                    !(later.len() > text.len() && later.starts_with(text)),
                    "'{}' shadows '{}'",
                    text,
                    later
                );
            }
        }
    }

    #[test]
    fn test_spelling() {
        let mut interner = Interner::new();
        let sym = interner.intern("puts");
        let ident = Token::identifier(sym, SourceLocation::unknown(), 4);
        let arrow = Token::new(TokenKind::Arrow, SourceLocation::unknown());

        assert_eq!(ident.spelling(&interner), "puts");
        assert_eq!(arrow.spelling(&interner), "->");
        assert_eq!(arrow.length, 2);
        assert_eq!(Token::eof(SourceLocation::unknown()).spelling(&interner), "");
    }

    #[test]
    fn test_identifier_symbol_only_for_identifiers() {
        let mut interner = Interner::new();
        let sym = interner.intern("\"a\"");
        let literal = Token::with_data(TokenKind::StringLiteral, sym, SourceLocation::unknown(), 3);
        assert_eq!(literal.identifier_symbol(), None);
        assert!(!literal.is_identifier(sym));
    }
}
