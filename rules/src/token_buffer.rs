//! Ordered, positionally editable token storage for rule bodies

use preprocessor::Token;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Insert before position `index`; `index == len()` appends
    pub fn insert(&mut self, index: usize, token: Token) {
        self.tokens.insert(index, token);
    }

    pub fn erase(&mut self, index: usize) -> Token {
        self.tokens.remove(index)
    }

    pub fn replace(&mut self, index: usize, token: Token) -> Token {
        std::mem::replace(&mut self.tokens[index], token)
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn first(&self) -> Option<&Token> {
        self.tokens.first()
    }

    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn to_vec(&self) -> Vec<Token> {
        self.tokens.clone()
    }

    pub fn into_vec(self) -> Vec<Token> {
        self.tokens
    }
}

impl Index<usize> for TokenBuffer {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl IndexMut<usize> for TokenBuffer {
    fn index_mut(&mut self, index: usize) -> &mut Token {
        &mut self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a TokenBuffer {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl From<Vec<Token>> for TokenBuffer {
    fn from(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preprocessor::TokenKind;
    use source_map::SourceLocation;

    fn tok(kind: TokenKind) -> Token {
        Token::new(kind, SourceLocation::unknown())
    }

    #[test]
    fn test_positional_edits() {
        let mut buffer = TokenBuffer::from(vec![tok(TokenKind::LBrace), tok(TokenKind::RBrace)]);
        buffer.insert(1, tok(TokenKind::Semi));
        buffer.insert(buffer.len(), tok(TokenKind::Comma));
        let kinds: Vec<_> = buffer.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::LBrace, TokenKind::Semi, TokenKind::RBrace, TokenKind::Comma]
        );

        let erased = buffer.erase(0);
        assert!(erased.is(TokenKind::LBrace));
        let old = buffer.replace(0, tok(TokenKind::LParen));
        assert!(old.is(TokenKind::Semi));
        assert!(buffer[0].is(TokenKind::LParen));
        assert_eq!(buffer.len(), 3);
    }
}
