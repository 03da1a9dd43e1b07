//! Per-invocation loop unrolling
//!
//! A rule with `$loop` regions is registered as an empty variadic
//! placeholder. Every time the host is about to expand an invocation, the
//! expander reads that invocation's variadic actuals, writes the unrolled
//! body into the definition used for this one expansion, and registers the
//! empty placeholder again so the next invocation starts from scratch.

use crate::host::RuleHost;
use crate::rule::{GeneratedKind, Rule};
use log::{debug, trace};
use preprocessor::{ExpansionHook, Invocation, Preprocessor, Symbol, Token, TokenKind};

/// Expansion hook owning the canonical form of one loop rule
#[derive(Debug, Clone)]
pub struct LoopExpander {
    rule: Rule,
}

impl LoopExpander {
    pub fn new(rule: Rule) -> Self {
        Self { rule }
    }
}

impl ExpansionHook for LoopExpander {
    fn macro_expands(&mut self, invocation: &mut Invocation<'_>, pp: &mut Preprocessor) {
        expand_invocation(&self.rule, invocation, pp);
    }
}

/// Populate `invocation`'s definition with `rule`'s body unrolled over the
/// invocation's variadic actuals, then re-arm the placeholder.
///
/// # Panics
///
/// If the invocation's argument count differs from the rule's parameter
/// count, if the last parameter is not variadic, or if a loop iterates over
/// anything but the variadic parameter.
pub fn expand_invocation<H: RuleHost + ?Sized>(rule: &Rule, invocation: &mut Invocation<'_>, host: &mut H) {
    let params = rule.params();
    assert_eq!(
        invocation.args.len(),
        params.len(),
        "invocation passes {} argument(s) to a rule with {} parameter(s)",
        invocation.args.len(),
        params.len()
    );
    let Some(variadic) = rule.variadic_parameter() else {
        panic!("loop rule without a trailing variadic parameter");
    };

    let actuals = host.pre_expand_argument(invocation.args, params.len() - 1);
    let groups = split_groups(&actuals);
    debug!(
        "unrolling {} over {} argument group(s)",
        host.resolve(invocation.definition.name),
        groups.len()
    );

    let body = unroll(rule, variadic.symbol, &groups, host);
    invocation.definition.body.extend(body);

    let name = invocation.definition.name;
    let location = invocation.definition.location;
    host.register_macro(name, &rule.param_symbols(), Vec::new(), true, location);
}

/// Split pre-expanded variadic actuals at top-level commas. Each group ends
/// with an `Eof`; no actuals at all yield no groups.
pub fn split_groups(actuals: &[Token]) -> Vec<Vec<Token>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;
    let mut end = None;

    for token in actuals {
        match token.kind {
            TokenKind::Eof => {
                end = Some(token.location);
                break;
            }
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                depth += 1;
                current.push(*token);
            }
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                depth = depth.saturating_sub(1);
                current.push(*token);
            }
            TokenKind::Comma if depth == 0 => {
                current.push(Token::eof(token.location));
                groups.push(std::mem::take(&mut current));
            }
            _ => current.push(*token),
        }
    }

    if !current.is_empty() || !groups.is_empty() {
        let location = end
            .or_else(|| current.last().map(|t| t.location))
            .unwrap_or_default();
        current.push(Token::eof(location));
        groups.push(current);
    }
    groups
}

/// Rule body with every loop region replaced by one copy of its template per group
fn unroll<H: RuleHost + ?Sized>(rule: &Rule, variadic: Symbol, groups: &[Vec<Token>], host: &mut H) -> Vec<Token> {
    let body = rule.body().as_slice();
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let token = body[i];
        if token.is_not(TokenKind::LoopMarker) {
            out.push(token);
            i += 1;
            continue;
        }

        let Some(region) = rule.loop_starting_at(i) else {
            panic!("loop marker at body index {} opens no loop region", i);
        };
        assert!(
            region.iteration_source == variadic,
            "$loop iterates over '{}', not the variadic parameter '{}'",
            host.resolve(region.iteration_source),
            host.resolve(variadic)
        );

        let template = &body[region.body_range()];
        for group in groups {
            emit_iteration(template, region.induction_var, group, host, &mut out);
        }
        trace!(
            "loop at body index {} unrolled {} time(s)",
            region.start,
            groups.len()
        );
        i = region.end + 1;
    }

    // the terminator after a trailing loop only stands in for zero iterations
    if rule.generated_kind == GeneratedKind::Statement {
        if let [.., before, last] = out.as_slice() {
            if before.is(TokenKind::Semi) && last.is(TokenKind::Semi) {
                out.pop();
            }
        }
    }
    out
}

fn emit_iteration<H: RuleHost + ?Sized>(
    template: &[Token],
    induction_var: Symbol,
    group: &[Token],
    host: &mut H,
    out: &mut Vec<Token>,
) {
    let mut k = 0;
    while k < template.len() {
        let token = template[k];

        if token.is(TokenKind::StringifyMarker) {
            if let Some(target) = template.get(k + 1).filter(|t| t.is_identifier(induction_var)) {
                let mut literal = host.stringify(group, target.location);
                literal.flags.leading_space = token.flags.leading_space;
                out.push(literal);
                k += 2;
                continue;
            }
        }

        if token.is_identifier(induction_var) {
            let spliced = group.iter().filter(|t| t.is_not(TokenKind::Eof));
            for (n, actual) in spliced.enumerate() {
                let mut actual = *actual;
                actual.location = token.location;
                actual.flags.substituted = true;
                if n == 0 {
                    actual.flags.leading_space = token.flags.leading_space;
                    actual.flags.at_line_start = token.flags.at_line_start;
                }
                out.push(actual);
            }
        } else {
            out.push(token);
        }
        k += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preprocessor::Interner;
    use source_map::SourceLocation;

    fn tokens(interner: &mut Interner, words: &[&str]) -> Vec<Token> {
        let loc = SourceLocation::unknown();
        let mut out: Vec<Token> = words
            .iter()
            .map(|s| match *s {
                "," => Token::new(TokenKind::Comma, loc),
                "(" => Token::new(TokenKind::LParen, loc),
                ")" => Token::new(TokenKind::RParen, loc),
                "[" => Token::new(TokenKind::LBracket, loc),
                "]" => Token::new(TokenKind::RBracket, loc),
                word => Token::identifier(interner.intern(word), loc, word.len() as u32),
            })
            .collect();
        out.push(Token::eof(loc));
        out
    }

    #[test]
    fn test_split_groups_at_top_level_commas() {
        let mut interner = Interner::new();
        let actuals = tokens(&mut interner, &["a", ",", "f", "(", "b", ",", "c", ")", ",", "[", "d", ",", "e", "]"]);
        let groups = split_groups(&actuals);
        let lengths: Vec<_> = groups.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![2, 7, 6]);
        assert!(groups.iter().all(|g| g.last().is_some_and(|t| t.is(TokenKind::Eof))));
    }

    #[test]
    fn test_split_groups_empty() {
        let mut interner = Interner::new();
        assert!(split_groups(&tokens(&mut interner, &[])).is_empty());
        // a lone comma separates two empty groups
        assert_eq!(split_groups(&tokens(&mut interner, &[","])).len(), 2);
    }
}
