//! Replacement protection
//!
//! Wraps each occurrence of an expression parameter in parentheses and
//! terminates each occurrence of a statement parameter, so that textual
//! substitution cannot change precedence or statement boundaries.
//! Occurrences right after a stringify marker are left bare.

use crate::rule::{ParamKind, Rule};
use fxhash::FxHashMap;
use log::trace;
use preprocessor::{Symbol, Token, TokenKind};

/// Protect every eligible parameter occurrence in `rule`; returns the number
/// of tokens inserted
pub fn protect(rule: &mut Rule) -> usize {
    let eligible: FxHashMap<Symbol, ParamKind> = rule
        .params()
        .iter()
        .filter(|p| !p.variadic && matches!(p.kind, ParamKind::Expression | ParamKind::Statement))
        .map(|p| (p.symbol, p.kind))
        .collect();
    if eligible.is_empty() {
        return 0;
    }

    let mut inserted = 0;
    let mut i = 0;
    while i < rule.body().len() {
        let token = rule.body()[i];
        let kind = token.identifier_symbol().and_then(|s| eligible.get(&s).copied());
        let stringified = i > 0 && rule.body()[i - 1].is(TokenKind::StringifyMarker);

        match kind {
            Some(ParamKind::Expression) if !stringified => {
                let mut open = Token::new(TokenKind::LParen, token.location.with_offset(-1));
                open.flags.leading_space = token.flags.leading_space;
                open.flags.at_line_start = token.flags.at_line_start;
                let mut occurrence = token;
                occurrence.flags.leading_space = false;
                occurrence.flags.at_line_start = false;
                rule.replace_token(i, occurrence);
                rule.insert_token(i, open);
                rule.insert_token(i + 2, Token::new(TokenKind::RParen, token.location.with_offset(1)));
                inserted += 2;
                i += 3;
            }
            Some(ParamKind::Statement) if !stringified => {
                rule.insert_token(i + 1, Token::new(TokenKind::Semi, token.location.with_offset(1)));
                inserted += 1;
                i += 2;
            }
            _ => i += 1,
        }
    }

    trace!("protection inserted {} token(s)", inserted);
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Parameter;
    use preprocessor::Interner;
    use source_map::{FileId, SourceLocation};

    fn loc(offset: u32) -> SourceLocation {
        SourceLocation::new(FileId::new(0), offset)
    }

    #[test]
    fn test_expression_occurrence_gets_parens() {
        let mut interner = Interner::new();
        let a = interner.intern("a");
        let mut rule = Rule::new(None);
        rule.add_parameter(Parameter {
            symbol: a,
            kind: ParamKind::Expression,
            variadic: false,
            location: loc(1),
        });
        rule.add_token(Token::new(TokenKind::Star, loc(10)));
        rule.add_token(Token::identifier(a, loc(12), 1));

        assert_eq!(protect(&mut rule), 2);
        let body = rule.body();
        assert!(body[1].is(TokenKind::LParen));
        assert_eq!(body[1].location.offset, 11);
        assert!(body[2].is_identifier(a));
        assert!(body[3].is(TokenKind::RParen));
        assert_eq!(body[3].location.offset, 13);
    }

    #[test]
    fn test_stringified_and_variadic_occurrences_untouched() {
        let mut interner = Interner::new();
        let a = interner.intern("a");
        let rest = interner.intern("rest");
        let mut rule = Rule::new(None);
        rule.add_parameter(Parameter {
            symbol: a,
            kind: ParamKind::Statement,
            variadic: false,
            location: loc(1),
        });
        rule.add_parameter(Parameter {
            symbol: rest,
            kind: ParamKind::Expression,
            variadic: true,
            location: loc(4),
        });
        rule.add_token(Token::new(TokenKind::StringifyMarker, loc(10)));
        rule.add_token(Token::identifier(a, loc(11), 1));
        rule.add_token(Token::identifier(rest, loc(13), 4));
        rule.add_token(Token::identifier(a, loc(18), 1));

        assert_eq!(protect(&mut rule), 1);
        assert_eq!(rule.body().len(), 5);
        assert!(rule.body()[4].is(TokenKind::Semi));
    }
}
