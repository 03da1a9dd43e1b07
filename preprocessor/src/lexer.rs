//! Raw tokenizer over one source file
//!
//! The scanner is built from nom combinators and works on `&str` slices of the
//! file; byte offsets are recovered as `full.len() - rest.len()`. `$` is an
//! identifier character, so rule keywords such as `$expr` and `$loop` lex as
//! ordinary identifiers.

use crate::intern::Interner;
use crate::token::{Token, TokenFlags, TokenKind, PUNCTUATORS};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{anychar, char, digit1, line_ending, satisfy},
    combinator::{map, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::many0,
    IResult, Parser,
};
use source_map::{FileId, SourceLocation};
use std::rc::Rc;

type LexResult<'a, T> = IResult<&'a str, T>;

/// Whitespace-like input between tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trivia {
    Newline,
    Space,
    Continuation,
    Comment { spans_lines: bool },
}

fn is_horizontal_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\x0b' | '\x0c')
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn trivia(input: &str) -> LexResult<'_, Trivia> {
    alt((
        value(Trivia::Continuation, (char('\\'), line_ending)),
        value(Trivia::Newline, line_ending),
        value(Trivia::Space, take_while1(is_horizontal_space)),
        value(
            Trivia::Comment { spans_lines: false },
            (tag("//"), take_while(|c: char| c != '\n')),
        ),
        map(
            recognize((tag("/*"), take_until("*/"), tag("*/"))),
            |text: &str| Trivia::Comment {
                spans_lines: text.contains('\n'),
            },
        ),
    ))
    .parse(input)
}

fn identifier(input: &str) -> LexResult<'_, &str> {
    recognize((satisfy(is_ident_start), take_while(is_ident_continue))).parse(input)
}

/// C pp-number: digits with trailing identifier characters, dots and signed exponents
fn pp_number(input: &str) -> LexResult<'_, &str> {
    recognize((
        opt(char('.')),
        digit1,
        many0(alt((
            tag("e+"),
            tag("e-"),
            tag("E+"),
            tag("E-"),
            tag("p+"),
            tag("p-"),
            tag("P+"),
            tag("P-"),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
        ))),
    ))
    .parse(input)
}

/// String or character literal; escapes are kept verbatim
fn quoted(input: &str, delimiter: char) -> LexResult<'_, &str> {
    recognize((
        char(delimiter),
        many0(alt((
            recognize((char('\\'), anychar)),
            recognize(satisfy(move |c| c != delimiter && c != '\\' && c != '\n')),
        ))),
        char(delimiter),
    ))
    .parse(input)
}

fn punctuator(input: &str) -> LexResult<'_, TokenKind> {
    PUNCTUATORS
        .iter()
        .find(|(text, _)| input.starts_with(text))
        .map(|(text, kind)| (&input[text.len()..], *kind))
        .ok_or_else(|| nom::Err::Error(Error::new(input, ErrorKind::Tag)))
}

fn token_kind(input: &str) -> LexResult<'_, TokenKind> {
    alt((
        value(TokenKind::Identifier, identifier),
        value(TokenKind::NumericLiteral, pp_number),
        value(TokenKind::StringLiteral, |i| quoted(i, '"')),
        value(TokenKind::CharLiteral, |i| quoted(i, '\'')),
        punctuator,
        value(TokenKind::Unknown, anychar),
    ))
    .parse(input)
}

/// Produces raw tokens from one file, without any macro processing
#[derive(Debug, Clone)]
pub struct Lexer {
    file_id: FileId,
    text: Rc<str>,
    pos: usize,
    at_line_start: bool,
    in_directive: bool,
}

impl Lexer {
    pub fn new(file_id: FileId, text: impl Into<Rc<str>>) -> Self {
        Self {
            file_id,
            text: text.into(),
            pos: 0,
            at_line_start: true,
            in_directive: false,
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Treat the next newline as the end of a directive
    pub fn enter_directive(&mut self) {
        self.in_directive = true;
    }

    pub fn in_directive(&self) -> bool {
        self.in_directive
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn location(&self, offset: usize) -> SourceLocation {
        SourceLocation::new(self.file_id, offset as u32)
    }

    /// Next token of the file. Returns `Eof` forever once the input is
    /// exhausted; in directive mode the line end yields a single `Eod` first.
    pub fn next_raw(&mut self, interner: &mut Interner) -> Token {
        let text = Rc::clone(&self.text);
        let mut leading_space = false;

        loop {
            let rest = &text[self.pos..];
            if rest.is_empty() {
                let kind = if self.in_directive {
                    self.in_directive = false;
                    TokenKind::Eod
                } else {
                    TokenKind::Eof
                };
                let mut token = Token::new(kind, self.location(self.pos));
                token.flags.at_line_start = self.at_line_start;
                return token;
            }

            let Ok((remaining, piece)) = trivia(rest) else {
                break;
            };
            let consumed = rest.len() - remaining.len();
            match piece {
                Trivia::Newline if self.in_directive => {
                    let token = Token::new(TokenKind::Eod, self.location(self.pos));
                    self.pos += consumed;
                    self.in_directive = false;
                    self.at_line_start = true;
                    return token;
                }
                Trivia::Newline => self.at_line_start = true,
                Trivia::Space => leading_space = true,
                Trivia::Continuation => {}
                Trivia::Comment { spans_lines } => {
                    leading_space = true;
                    if spans_lines && !self.in_directive {
                        self.at_line_start = true;
                    }
                }
            }
            self.pos += consumed;
        }

        let start = self.pos;
        let rest = &text[start..];
        let (kind, length) = match token_kind(rest) {
            Ok((remaining, kind)) => (kind, rest.len() - remaining.len()),
            // anychar only fails on empty input, which was handled above
            Err(_) => (TokenKind::Unknown, rest.chars().next().map_or(1, char::len_utf8)),
        };
        self.pos += length;

        let mut token = match kind {
            TokenKind::Identifier
            | TokenKind::NumericLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::Unknown => {
                let symbol = interner.intern(&rest[..length]);
                Token::with_data(kind, symbol, self.location(start), length as u32)
            }
            _ => Token::new(kind, self.location(start)),
        };
        token.flags = TokenFlags {
            at_line_start: self.at_line_start,
            leading_space,
            ..TokenFlags::default()
        };
        self.at_line_start = false;
        token
    }
}

/// Lex a whole string into raw tokens, ending with `Eof`
pub fn tokenize(file_id: FileId, text: &str, interner: &mut Interner) -> Vec<Token> {
    let mut lexer = Lexer::new(file_id, text);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_raw(interner);
        tokens.push(token);
        if token.is(TokenKind::Eof) {
            return tokens;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        let mut interner = Interner::new();
        tokenize(FileId::new(0), text, &mut interner)
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    fn spellings(text: &str) -> Vec<String> {
        let mut interner = Interner::new();
        tokenize(FileId::new(0), text, &mut interner)
            .iter()
            .map(|t| t.spelling(&interner).to_string())
            .collect()
    }

    #[test]
    fn test_rule_keywords_are_identifiers() {
        assert_eq!(
            kinds("(a:$expr*) -> $stmt"),
            vec![
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::Star,
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        assert_eq!(spellings("$loop($i in $iter)")[0], "$loop");
    }

    #[test]
    fn test_literals_and_longest_punctuators() {
        assert_eq!(
            spellings(r#"x <<= 0x1Fu; "a\"b" 'c' 1e+5 ..."#),
            vec!["x", "<<=", "0x1Fu", ";", r#""a\"b""#, "'c'", "1e+5", "...", ""]
        );
    }

    #[test]
    fn test_comments_and_flags() {
        let mut interner = Interner::new();
        let tokens = tokenize(
            FileId::new(0),
            "a /* c */ b // tail\n  c",
            &mut interner,
        );
        assert_eq!(tokens.len(), 4);
        assert!(tokens[0].flags.at_line_start);
        assert!(tokens[1].flags.leading_space);
        assert!(!tokens[1].flags.at_line_start);
        assert!(tokens[2].flags.at_line_start);
        assert_eq!(tokens[2].location.offset, 22);
    }

    #[test]
    fn test_directive_mode_ends_at_newline() {
        let mut interner = Interner::new();
        let mut lexer = Lexer::new(FileId::new(0), "x y \\\n z\nw");
        lexer.enter_directive();
        let mut seen = Vec::new();
        loop {
            let token = lexer.next_raw(&mut interner);
            if token.is(TokenKind::Eod) {
                break;
            }
            seen.push(token.spelling(&interner).to_string());
        }
        assert_eq!(seen, vec!["x", "y", "z"]);
        let next = lexer.next_raw(&mut interner);
        assert_eq!(next.spelling(&interner), "w");
        assert!(next.flags.at_line_start);
    }

    #[test]
    fn test_directive_at_end_of_input() {
        let mut interner = Interner::new();
        let mut lexer = Lexer::new(FileId::new(0), "x");
        lexer.enter_directive();
        lexer.next_raw(&mut interner);
        assert!(lexer.next_raw(&mut interner).is(TokenKind::Eod));
        assert!(lexer.next_raw(&mut interner).is(TokenKind::Eof));
    }
}
