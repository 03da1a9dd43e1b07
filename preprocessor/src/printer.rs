//! Renders a token stream back to source text, like `cc -E`

use crate::intern::Interner;
use crate::token::{Token, TokenKind, PUNCTUATORS};

fn is_word(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier | TokenKind::NumericLiteral | TokenKind::CharLiteral | TokenKind::StringLiteral
    )
}

/// Whether printing `current` right after `previous` would lex differently
fn would_paste(previous: &Token, previous_text: &str, current: &Token, current_text: &str) -> bool {
    if is_word(previous.kind) && is_word(current.kind) {
        return true;
    }
    if previous.is(TokenKind::NumericLiteral) && current.is(TokenKind::Period) {
        return true;
    }
    let Some(next_char) = current_text.chars().next() else {
        return false;
    };
    if previous.is(TokenKind::Slash) && (next_char == '/' || next_char == '*') {
        return true;
    }
    if previous.kind.spelling().is_none() {
        return false;
    }
    let mut joined = previous_text.to_string();
    joined.push(next_char);
    PUNCTUATORS.iter().any(|(text, _)| text.starts_with(joined.as_str()))
}

/// Print tokens, starting a new line at every line-start token
pub fn print_tokens(tokens: &[Token], interner: &Interner) -> String {
    let mut out = String::new();
    let mut previous: Option<(Token, &str)> = None;

    for token in tokens {
        if token.kind.is_end() || token.kind.is_synthetic() {
            continue;
        }
        let text = token.spelling(interner);
        if let Some((prev, prev_text)) = previous {
            if token.flags.at_line_start {
                out.push('\n');
            } else if token.flags.leading_space || would_paste(&prev, prev_text, token, text) {
                out.push(' ');
            }
        }
        out.push_str(text);
        previous = Some((*token, text));
    }

    if !out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use source_map::FileId;

    fn round_trip(text: &str) -> String {
        let mut interner = Interner::new();
        let tokens = tokenize(FileId::new(0), text, &mut interner);
        print_tokens(&tokens, &interner)
    }

    #[test]
    fn test_lines_and_spacing() {
        assert_eq!(round_trip("int  x=1;\n   foo( a );"), "int x=1;\nfoo( a );\n");
    }

    #[test]
    fn test_adjacent_tokens_do_not_paste() {
        let mut interner = Interner::new();
        let loc = source_map::SourceLocation::unknown();
        let a = interner.intern("a");
        let b = interner.intern("b");
        let tokens = vec![
            Token::identifier(a, loc, 1),
            Token::identifier(b, loc, 1),
            Token::new(TokenKind::Minus, loc),
            Token::new(TokenKind::Minus, loc),
            Token::new(TokenKind::Plus, loc),
            Token::new(TokenKind::Semi, loc),
        ];
        assert_eq!(print_tokens(&tokens, &interner), "a b- -+;\n");
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(round_trip(""), "");
    }
}
