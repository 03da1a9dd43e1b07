//! Rule definition parser
//!
//! ```text
//! rule      := '(' param (',' param)* ')' ('->' kind?)? body
//! param     := IDENT ':' kind '*'?
//! kind      := '$expr' | '$ident' | '$stmt' | '$block'
//! body      := '{' item* '}'
//! item      := '$loop' '(' IDENT 'in' IDENT ')' body
//!            | '$str' '(' TOKEN ')'
//!            | body
//!            | TOKEN
//! ```
//!
//! Tokens are read raw from the host, so the definition may span any number
//! of lines after the pragma that introduced it.

use crate::errors::RuleError;
use crate::host::RuleHost;
use crate::rule::{GeneratedKind, LoopRegion, ParamKind, Parameter, Rule};
use log::trace;
use preprocessor::{Symbol, Token, TokenKind};
use source_map::SourceLocation;

/// Identifiers with a meaning inside rule definitions
struct Keywords {
    loop_: Symbol,
    str_: Symbol,
    in_: Symbol,
}

impl Keywords {
    fn new<H: RuleHost + ?Sized>(host: &mut H) -> Self {
        Self {
            loop_: host.intern("$loop"),
            str_: host.intern("$str"),
            in_: host.intern("in"),
        }
    }
}

struct RuleParser<'h, H: RuleHost + ?Sized> {
    host: &'h mut H,
    keywords: Keywords,
    rule: Rule,
}

/// Parse one rule definition.
///
/// `pragma_params` are the tokens after `rule` on the pragma line; the first
/// one names the rule, and an empty list yields an anonymous rule.
pub fn parse_rule<H: RuleHost + ?Sized>(host: &mut H, pragma_params: &[Token]) -> Result<Rule, RuleError> {
    let name = match pragma_params.first() {
        None => None,
        Some(token) => match token.identifier_symbol() {
            Some(symbol) => Some(symbol),
            None => {
                return Err(RuleError::MissingRuleName {
                    found: host.spelling(token),
                    location: token.location,
                    length: token.length,
                })
            }
        },
    };

    let keywords = Keywords::new(host);
    let mut parser = RuleParser {
        host,
        keywords,
        rule: Rule::new(name),
    };
    parser.parse()?;
    Ok(parser.rule)
}

impl<'h, H: RuleHost + ?Sized> RuleParser<'h, H> {
    /// Next token of the definition; the end of the pragma line is not significant
    fn next(&mut self) -> Token {
        loop {
            let token = self.host.lex();
            if token.is_not(TokenKind::Eod) {
                return token;
            }
        }
    }

    fn expected(&self, expected: &str, found: &Token) -> RuleError {
        RuleError::Expected {
            expected: expected.to_string(),
            found: self.host.spelling(found),
            location: found.location,
            length: found.length,
        }
    }

    fn malformed_header(&self, expected: &str, found: &Token) -> RuleError {
        RuleError::MalformedLoopHeader {
            expected: expected.to_string(),
            found: self.host.spelling(found),
            location: found.location,
            length: found.length,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, RuleError> {
        let token = self.next();
        if token.is(kind) {
            Ok(token)
        } else {
            Err(self.expected(&kind.to_string(), &token))
        }
    }

    fn parse(&mut self) -> Result<(), RuleError> {
        let open = self.expect(TokenKind::LParen)?;
        self.rule.range.begin = open.location;
        self.parse_params()?;

        let lbrace = self.parse_generated_kind()?;
        self.rule.add_token(lbrace);
        let rbrace = self.parse_block(lbrace, None)?;
        self.rule.add_token(rbrace);
        self.rule.range.end = rbrace.location.with_offset(rbrace.length as i32);

        self.apply_generated_kind();
        trace!(
            "parsed rule: {} parameter(s), {} body token(s), {} loop(s)",
            self.rule.params().len(),
            self.rule.body().len(),
            self.rule.loops().len()
        );
        Ok(())
    }

    fn parse_params(&mut self) -> Result<(), RuleError> {
        loop {
            let name = self.next();
            let Some(symbol) = name.identifier_symbol() else {
                return Err(self.expected("parameter name", &name));
            };
            if let Some(first) = self.rule.parameter(symbol) {
                return Err(RuleError::DuplicateParameter {
                    name: self.host.resolve(symbol).to_string(),
                    location: name.location,
                    first: first.location,
                    length: name.length,
                });
            }
            self.expect(TokenKind::Colon)?;
            let kind = self.parse_type_tag()?;

            let mut separator = self.next();
            let variadic = separator.is(TokenKind::Star);
            if variadic {
                separator = self.next();
            }
            self.rule.add_parameter(Parameter {
                symbol,
                kind,
                variadic,
                location: name.location,
            });

            match separator.kind {
                TokenKind::Comma => continue,
                TokenKind::RParen => return Ok(()),
                _ => return Err(self.expected("',' or ')'", &separator)),
            }
        }
    }

    fn parse_type_tag(&mut self) -> Result<ParamKind, RuleError> {
        let tag = self.next();
        let Some(symbol) = tag.identifier_symbol() else {
            return Err(self.expected("parameter type", &tag));
        };
        let text = self.host.resolve(symbol);
        ParamKind::from_tag(text).ok_or_else(|| RuleError::UnknownType {
            name: text.to_string(),
            location: tag.location,
            length: tag.length,
        })
    }

    /// Optional `-> kind`; returns the opening brace of the body
    fn parse_generated_kind(&mut self) -> Result<Token, RuleError> {
        let token = self.next();
        if token.is(TokenKind::LBrace) {
            return Ok(token);
        }
        if token.is_not(TokenKind::Arrow) {
            return Err(self.expected("'->'", &token));
        }

        let next = self.next();
        if next.is(TokenKind::LBrace) {
            return Ok(next);
        }
        let Some(symbol) = next.identifier_symbol() else {
            return Err(self.expected("generated kind", &next));
        };
        let text = self.host.resolve(symbol);
        let Some(kind) = ParamKind::from_tag(text) else {
            return Err(RuleError::UnknownType {
                name: text.to_string(),
                location: next.location,
                length: next.length,
            });
        };
        let Some(generated) = GeneratedKind::from_param_kind(kind) else {
            return Err(RuleError::InvalidGeneratedKind {
                name: text.to_string(),
                location: next.location,
                length: next.length,
            });
        };
        self.rule.generated_kind = generated;
        self.expect(TokenKind::LBrace)
    }

    /// Tokens up to the brace matching `open`, which has already been consumed.
    /// `enclosing_loop` is the `$loop` whose body this is, if any.
    fn parse_block(&mut self, open: Token, enclosing_loop: Option<SourceLocation>) -> Result<Token, RuleError> {
        loop {
            let token = self.next();
            match token.kind {
                TokenKind::Eof => {
                    return Err(RuleError::MissingClosingBrace {
                        location: token.location,
                        opening: open.location,
                    })
                }
                TokenKind::RBrace => return Ok(token),
                TokenKind::LBrace => {
                    self.rule.add_token(token);
                    let close = self.parse_block(token, enclosing_loop)?;
                    self.rule.add_token(close);
                }
                _ if token.is_identifier(self.keywords.loop_) => self.parse_loop(token, enclosing_loop)?,
                _ if token.is_identifier(self.keywords.str_) => self.parse_str(token)?,
                _ => {
                    self.rule.add_token(token);
                }
            }
        }
    }

    fn parse_loop(&mut self, keyword: Token, enclosing_loop: Option<SourceLocation>) -> Result<(), RuleError> {
        if let Some(outer) = enclosing_loop {
            return Err(RuleError::NestedLoop {
                location: keyword.location,
                outer,
            });
        }

        let open = self.next();
        if open.is_not(TokenKind::LParen) {
            return Err(self.malformed_header("'('", &open));
        }
        let var = self.next();
        let Some(induction_var) = var.identifier_symbol() else {
            return Err(self.malformed_header("induction variable", &var));
        };
        let in_ = self.next();
        if !in_.is_identifier(self.keywords.in_) {
            return Err(self.malformed_header("'in'", &in_));
        }
        let source = self.next();
        let Some(iteration_source) = source.identifier_symbol() else {
            return Err(self.malformed_header("iteration source", &source));
        };
        let close = self.next();
        if close.is_not(TokenKind::RParen) {
            return Err(self.malformed_header("')'", &close));
        }
        let lbrace = self.next();
        if lbrace.is_not(TokenKind::LBrace) {
            return Err(self.malformed_header("'{'", &lbrace));
        }

        let mut marker = Token::new(TokenKind::LoopMarker, keyword.location);
        marker.flags = keyword.flags;
        let start = self.rule.add_token(marker);
        let rbrace = self.parse_block(lbrace, Some(keyword.location))?;
        let end = self.rule.add_token(Token::new(TokenKind::LoopMarker, rbrace.location));

        self.rule.add_loop(LoopRegion {
            start,
            end,
            induction_var,
            iteration_source,
            location: keyword.location,
        });
        Ok(())
    }

    fn parse_str(&mut self, keyword: Token) -> Result<(), RuleError> {
        let open = self.expect(TokenKind::LParen)?;
        let target = self.next();
        if target.kind.is_end() || target.is(TokenKind::RParen) {
            return Err(self.expected("token to stringify", &target));
        }
        self.expect(TokenKind::RParen)?;

        let mut marker = Token::new(TokenKind::StringifyMarker, open.location);
        marker.flags.leading_space = keyword.flags.leading_space;
        marker.flags.at_line_start = keyword.flags.at_line_start;
        self.rule.add_token(marker);
        self.rule.add_token(target);
        Ok(())
    }

    /// Rewrite the outer braces of the body for the declared generated kind
    fn apply_generated_kind(&mut self) {
        let last = self.rule.body().len() - 1;
        match self.rule.generated_kind {
            GeneratedKind::Block => {}
            GeneratedKind::Expression => {
                let first = self.rule.body()[0];
                let close = self.rule.body()[last];
                let mut lparen = Token::new(TokenKind::LParen, first.location);
                lparen.flags = first.flags;
                let mut rparen = Token::new(TokenKind::RParen, close.location);
                rparen.flags = close.flags;
                self.rule.replace_token(0, lparen);
                self.rule.replace_token(last, rparen);
            }
            GeneratedKind::Statement => {
                let first = self.rule.erase_token(0);
                let last = last - 1;
                // a `;` inside a loop template does not terminate a loop that unrolls zero times
                let terminated = self.rule.body().as_slice()[..last]
                    .iter()
                    .rposition(|t| t.is_not(TokenKind::LoopMarker))
                    .is_some_and(|i| {
                        self.rule.body()[i].is(TokenKind::Semi) && self.rule.loop_containing(i).is_none()
                    });
                if terminated {
                    self.rule.erase_token(last);
                } else {
                    let close = self.rule.body()[last];
                    let mut semi = Token::new(TokenKind::Semi, close.location);
                    semi.flags.leading_space = false;
                    self.rule.replace_token(last, semi);
                }
                if let Some(head) = self.rule.body().first().copied() {
                    if head.is_not(TokenKind::LoopMarker) {
                        let mut head = head;
                        head.flags.at_line_start |= first.flags.at_line_start;
                        head.flags.leading_space |= first.flags.leading_space;
                        self.rule.replace_token(0, head);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preprocessor::Preprocessor;

    /// Parse a definition that follows `#pragma macrule rule <name>`
    fn parse(pp: &mut Preprocessor, name: Option<&str>, text: &str) -> Result<Rule, RuleError> {
        pp.enter_source("rule.c", text);
        let params: Vec<Token> = name
            .map(|n| {
                let symbol = pp.intern(n);
                vec![Token::identifier(symbol, SourceLocation::unknown(), n.len() as u32)]
            })
            .unwrap_or_default();
        parse_rule(pp, &params)
    }

    fn kinds(rule: &Rule) -> Vec<TokenKind> {
        rule.body().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_parameter_list() {
        let mut pp = Preprocessor::default();
        let rule = parse(&mut pp, Some("r"), "(a:$expr, b:$stmt, c:$expr*) { a; }").unwrap();
        let params: Vec<_> = rule.params().iter().map(|p| (p.kind, p.variadic)).collect();
        assert_eq!(
            params,
            vec![
                (ParamKind::Expression, false),
                (ParamKind::Statement, false),
                (ParamKind::Expression, true)
            ]
        );
        assert!(rule.is_variadic());
        assert_eq!(rule.generated_kind, GeneratedKind::Block);
        assert_eq!(pp.resolve(rule.name.unwrap()), "r");
    }

    #[test]
    fn test_source_range_covers_definition() {
        let mut pp = Preprocessor::default();
        let rule = parse(&mut pp, None, "  (x:$ident) { x }\nafter").unwrap();
        assert!(rule.name.is_none());
        assert_eq!(rule.range.begin.offset, 2);
        assert_eq!(rule.range.end.offset, 18);
    }

    #[test]
    fn test_loop_region() {
        let mut pp = Preprocessor::default();
        let rule = parse(&mut pp, Some("r"), "($iter:$expr*) { $loop($i in $iter){ puts($i); } }").unwrap();
        assert_eq!(rule.loops().len(), 1);
        let region = rule.loops()[0];
        assert_eq!(pp.resolve(region.induction_var), "$i");
        assert_eq!(pp.resolve(region.iteration_source), "$iter");
        assert!(rule.body()[region.start].is(TokenKind::LoopMarker));
        assert!(rule.body()[region.end].is(TokenKind::LoopMarker));
        // the loop's own braces are not part of the body
        assert_eq!(region.body_range().len(), 5);
    }

    #[test]
    fn test_str_emits_marker() {
        let mut pp = Preprocessor::default();
        let rule = parse(&mut pp, Some("r"), "(x:$ident) { $str(x) }").unwrap();
        assert_eq!(
            kinds(&rule),
            vec![
                TokenKind::LBrace,
                TokenKind::StringifyMarker,
                TokenKind::Identifier,
                TokenKind::RBrace
            ]
        );
    }

    #[test]
    fn test_expression_kind_wraps_body() {
        let mut pp = Preprocessor::default();
        let rule = parse(&mut pp, Some("r"), "(a:$expr) -> $expr { a + { 1 } }").unwrap();
        let body = rule.body();
        assert!(body.first().unwrap().is(TokenKind::LParen));
        assert!(body.last().unwrap().is(TokenKind::RParen));
        // nested braces survive, only the outer pair is rewritten
        assert_eq!(body.iter().filter(|t| t.is(TokenKind::LBrace)).count(), 1);
    }

    #[test]
    fn test_statement_kind_single_terminator() {
        let mut pp = Preprocessor::default();
        let rule = parse(&mut pp, Some("r"), "(a:$expr) -> $stmt { f(a); }").unwrap();
        assert_eq!(
            kinds(&rule),
            vec![
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Semi
            ]
        );

        let rule = parse(&mut pp, Some("r"), "(a:$expr) -> $stmt { f(a) }").unwrap();
        assert_eq!(kinds(&rule).last(), Some(&TokenKind::Semi));
        assert_eq!(kinds(&rule).iter().filter(|k| **k == TokenKind::Semi).count(), 1);
    }

    #[test]
    fn test_statement_kind_terminates_outside_loop() {
        let mut pp = Preprocessor::default();
        let rule = parse(&mut pp, Some("r"), "(l:$expr*) -> $stmt { $loop(i in l) { f(i); } }").unwrap();
        let kinds = kinds(&rule);
        assert_eq!(kinds.last(), Some(&TokenKind::Semi));
        assert_eq!(kinds[kinds.len() - 2], TokenKind::LoopMarker);
        assert!(rule.loop_containing(kinds.len() - 1).is_none());
    }

    #[test]
    fn test_arrow_without_kind_is_block() {
        let mut pp = Preprocessor::default();
        let rule = parse(&mut pp, Some("r"), "(a:$expr) -> { a }").unwrap();
        assert_eq!(rule.generated_kind, GeneratedKind::Block);
    }

    #[test]
    fn test_errors() {
        let cases = [
            ("(a:$foo) { }", "E7102"),
            ("(a:$expr) { a", "E7103"),
            ("(l:$expr*) { $loop(i of l) { } }", "E7104"),
            ("(l:$expr*) { $loop(i in l) { $loop(j in l) { } } }", "E7105"),
            ("(a:$expr, a:$stmt) { }", "E7107"),
            ("(a:$expr) -> $ident { }", "E7108"),
            ("(a:$expr) => { }", "E7101"),
            ("a:$expr) { }", "E7101"),
        ];
        for (text, code) in cases {
            let mut pp = Preprocessor::default();
            let err = parse(&mut pp, Some("r"), text).unwrap_err();
            assert_eq!(err.error_code(), code, "{}", text);
        }
    }

    #[test]
    fn test_rule_name_must_be_identifier() {
        let mut pp = Preprocessor::default();
        pp.enter_source("rule.c", "(a:$expr) { }");
        let number = pp.intern("3");
        let params = [Token::with_data(
            TokenKind::NumericLiteral,
            number,
            SourceLocation::unknown(),
            1,
        )];
        let err = parse_rule(&mut pp, &params).unwrap_err();
        assert_eq!(err.error_code(), "E7106");
    }
}
