//! Expansion driver
//!
//! Tokens are read from, in order: pushed-back lookahead, the stack of active
//! macro expansion frames, and finally the file lexer. Only a `#` at the start
//! of a line that came straight from the file introduces a directive.

use crate::config::PreprocessorConfig;
use crate::hooks::{ExpansionHook, Invocation, PragmaHandler};
use crate::intern::{Interner, Symbol};
use crate::lexer::Lexer;
use crate::macros::{MacroArgs, MacroDefinition, MacroTable, ParamList};
use crate::token::{Token, TokenFlags, TokenKind};
use diagnostics::rules::RuleDiagnostics;
use diagnostics::{Diagnostic, Diagnostics};
use fxhash::FxHashMap;
use log::{debug, trace, warn};
use source_map::{FileId, SourceLocation, SourceMap, SourceSpan};

/// Tokens of one macro expansion, or of one argument being pre-expanded
#[derive(Debug)]
struct TokenFrame {
    tokens: Vec<Token>,
    pos: usize,
    /// Macro disabled while this frame is being read
    macro_name: Option<Symbol>,
    /// Argument pre-expansion stops here instead of falling through
    sentinel: bool,
}

/// What argument collection needs to know about a macro
#[derive(Debug, Clone, Copy)]
struct MacroShape {
    function_like: bool,
    arity: usize,
    variadic: bool,
}

impl MacroShape {
    fn of(definition: &MacroDefinition) -> Self {
        Self {
            function_like: definition.function_like,
            arity: definition.arity(),
            variadic: definition.variadic,
        }
    }
}

impl TokenFrame {
    fn expansion(macro_name: Symbol, tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            macro_name: Some(macro_name),
            sentinel: false,
        }
    }

    fn sentinel(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            macro_name: None,
            sentinel: true,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

pub struct Preprocessor {
    config: PreprocessorConfig,
    source_map: SourceMap,
    interner: Interner,
    lexer: Option<Lexer>,
    frames: Vec<TokenFrame>,
    /// Pushed-back tokens with their from-file bit, popped last-in first-out
    lookahead: Vec<(Token, bool)>,
    /// Line-start and spacing of an invocation that expanded to nothing
    pending_flags: Option<TokenFlags>,
    macros: MacroTable,
    hooks: FxHashMap<Symbol, Vec<Box<dyn ExpansionHook>>>,
    /// Macros whose hooks are running, with their definition taken out of the table
    running_hooks: FxHashMap<Symbol, MacroShape>,
    pragma_handlers: FxHashMap<String, Box<dyn PragmaHandler>>,
    diagnostics: Diagnostics,
}

impl Preprocessor {
    pub fn new(config: PreprocessorConfig) -> Self {
        let mut pp = Self {
            config,
            source_map: SourceMap::new(),
            interner: Interner::new(),
            lexer: None,
            frames: Vec::new(),
            lookahead: Vec::new(),
            pending_flags: None,
            macros: MacroTable::new(),
            hooks: FxHashMap::default(),
            running_hooks: FxHashMap::default(),
            pragma_handlers: FxHashMap::default(),
            diagnostics: Diagnostics::new(),
        };
        pp.install_predefines();
        pp
    }

    fn install_predefines(&mut self) {
        if self.config.defines.is_empty() {
            return;
        }
        let text: String = self
            .config
            .defines
            .iter()
            .map(|(name, value)| format!("#define {} {}\n", name, value))
            .collect();
        self.enter_source("<built-in>", text);
        while self.lex().is_not(TokenKind::Eof) {}
        self.lexer = None;
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn intern(&mut self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.interner.resolve(symbol)
    }

    pub fn spelling(&self, token: &Token) -> &str {
        token.spelling(&self.interner)
    }

    /// Register a file and make it the current input
    pub fn enter_source(&mut self, name: impl Into<String>, text: impl Into<String>) -> FileId {
        let text = text.into();
        let file_id = self.source_map.add_file(name, text.clone());
        self.lexer = Some(Lexer::new(file_id, text));
        self.frames.clear();
        self.lookahead.clear();
        self.pending_flags = None;
        file_id
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Install a definition, replacing any previous one for the name
    pub fn define_macro(&mut self, definition: MacroDefinition) -> Option<MacroDefinition> {
        trace!(
            "define {} ({} body tokens)",
            self.interner.resolve(definition.name),
            definition.body.len()
        );
        self.macros.define(definition)
    }

    pub fn undefine(&mut self, name: Symbol) -> Option<MacroDefinition> {
        self.macros.undefine(name)
    }

    pub fn add_expansion_hook(&mut self, name: Symbol, hook: Box<dyn ExpansionHook>) {
        self.hooks.entry(name).or_default().push(hook);
    }

    /// Drop every hook registered for `name`; returns how many were removed
    pub fn remove_expansion_hooks(&mut self, name: Symbol) -> usize {
        self.hooks.remove(&name).map_or(0, |hooks| hooks.len())
    }

    pub fn has_expansion_hook(&self, name: Symbol) -> bool {
        self.hooks.get(&name).is_some_and(|h| !h.is_empty()) || self.running_hooks.contains_key(&name)
    }

    pub fn add_pragma_handler(&mut self, namespace: impl Into<String>, handler: Box<dyn PragmaHandler>) {
        self.pragma_handlers.insert(namespace.into(), handler);
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn span_of(&self, token: &Token) -> SourceSpan {
        self.source_map.span_for(token.location, token.length)
    }

    pub fn span_at(&self, location: SourceLocation, length: u32) -> SourceSpan {
        self.source_map.span_for(location, length)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        self.diagnostics.take()
    }

    // ---------------------------------------------------------------------
    // Raw token sources
    // ---------------------------------------------------------------------

    fn next_token_raw(&mut self) -> (Token, bool) {
        if let Some(entry) = self.lookahead.pop() {
            return entry;
        }
        while let Some(frame) = self.frames.last_mut() {
            if !frame.is_exhausted() {
                let token = frame.tokens[frame.pos];
                frame.pos += 1;
                return (token, false);
            }
            if frame.sentinel {
                let location = frame.tokens.last().map(|t| t.location).unwrap_or_default();
                return (Token::eof(location), false);
            }
            self.frames.pop();
        }
        match self.lexer.as_mut() {
            Some(lexer) => (lexer.next_raw(&mut self.interner), true),
            None => (Token::eof(SourceLocation::unknown()), false),
        }
    }

    /// Directive tokens always come from the file lexer
    fn next_directive_token(&mut self) -> Token {
        match self.lexer.as_mut() {
            Some(lexer) => lexer.next_raw(&mut self.interner),
            None => Token::new(TokenKind::Eod, SourceLocation::unknown()),
        }
    }

    fn skip_line(&mut self) {
        loop {
            let token = self.next_directive_token();
            if token.kind.is_end() {
                return;
            }
        }
    }

    fn in_directive(&self) -> bool {
        self.lexer.as_ref().is_some_and(Lexer::in_directive)
    }

    /// Next token without macro expansion or directive processing.
    ///
    /// While a pragma handler runs this yields the rest of the directive line,
    /// then `Eod`, then the following lines of the file.
    pub fn lex_unexpanded(&mut self) -> Token {
        self.next_token_raw().0
    }

    /// Next fully macro-expanded token
    pub fn lex(&mut self) -> Token {
        loop {
            let (mut token, from_file) = self.next_token_raw();

            if from_file && token.is(TokenKind::Hash) && token.flags.at_line_start {
                self.handle_directive(token);
                continue;
            }

            if let Some(name) = token.identifier_symbol() {
                if !token.flags.no_expand && self.shape_of(name).is_some() {
                    if self.is_disabled(name) {
                        token.flags.no_expand = true;
                    } else if self.expand_macro(token, name) {
                        continue;
                    }
                }
            }

            if let Some(flags) = self.pending_flags.take() {
                if token.is_not(TokenKind::Eof) {
                    token.flags.at_line_start |= flags.at_line_start;
                    token.flags.leading_space |= flags.leading_space;
                }
            }
            return token;
        }
    }

    /// Every expanded token of the current input, ending with `Eof`
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.lex();
            tokens.push(token);
            if token.is(TokenKind::Eof) {
                return tokens;
            }
        }
    }

    fn shape_of(&self, name: Symbol) -> Option<MacroShape> {
        self.macros
            .get(name)
            .map(MacroShape::of)
            .or_else(|| self.running_hooks.get(&name).copied())
    }

    fn is_disabled(&self, name: Symbol) -> bool {
        self.frames.iter().any(|f| f.macro_name == Some(name))
    }

    // ---------------------------------------------------------------------
    // Macro expansion
    // ---------------------------------------------------------------------

    /// Expand the macro named by `name_token`. Returns false when a
    /// function-like macro is not followed by `(` and the name stays a plain
    /// identifier.
    fn expand_macro(&mut self, name_token: Token, name: Symbol) -> bool {
        let Some(shape) = self.shape_of(name) else {
            return false;
        };

        let args = if shape.function_like {
            let (next, from_file) = self.next_token_raw();
            if next.is_not(TokenKind::LParen) {
                self.lookahead.push((next, from_file));
                return false;
            }
            match self.collect_args(name_token, name, shape) {
                Some(args) => args,
                None => return true,
            }
        } else {
            MacroArgs::default()
        };

        if self.running_hooks.contains_key(&name) {
            let span = self.span_of(&name_token);
            let text = self.interner.resolve(name).to_string();
            self.report(RuleDiagnostics::reentrant_invocation(span, &text));
            return true;
        }

        let definition = if self.hooks.contains_key(&name) {
            self.run_hooks(name_token, name, &args)
        } else {
            self.macros.get(name).cloned()
        };
        let Some(definition) = definition else {
            return true;
        };

        let tokens = self.substitute(&definition, &args, name_token);
        trace!(
            "expanded {} into {} token(s)",
            self.interner.resolve(name),
            tokens.len()
        );
        if tokens.is_empty() {
            let pending = self.pending_flags.get_or_insert_with(TokenFlags::default);
            pending.at_line_start |= name_token.flags.at_line_start;
            pending.leading_space |= name_token.flags.leading_space;
        } else {
            self.frames.push(TokenFrame::expansion(name, tokens));
        }
        true
    }

    /// Take the live definition out of the table, let every hook see it, and
    /// put it back unless a hook installed a new definition meanwhile.
    fn run_hooks(&mut self, name_token: Token, name: Symbol, args: &MacroArgs) -> Option<MacroDefinition> {
        let mut definition = self.macros.take(name)?;
        let generation = self.macros.generation(name);
        let mut hooks = self.hooks.remove(&name).unwrap_or_default();
        self.running_hooks.insert(name, MacroShape::of(&definition));

        debug!(
            "running {} hook(s) for {} with {} argument(s)",
            hooks.len(),
            self.interner.resolve(name),
            args.len()
        );
        for hook in hooks.iter_mut() {
            let mut invocation = Invocation {
                name_token,
                args,
                definition: &mut definition,
            };
            hook.macro_expands(&mut invocation, self);
        }

        self.running_hooks.remove(&name);
        if let Some(added) = self.hooks.remove(&name) {
            hooks.extend(added);
        }
        self.hooks.insert(name, hooks);

        if self.macros.generation(name) == generation {
            self.macros.restore(definition.clone());
        }
        Some(definition)
    }

    /// Read the actual arguments after the opening parenthesis
    fn collect_args(&mut self, name_token: Token, name: Symbol, shape: MacroShape) -> Option<MacroArgs> {
        let MacroShape { arity, variadic, .. } = shape;

        let mut args: Vec<Vec<Token>> = Vec::new();
        let mut current = Vec::new();
        let mut depth = 0usize;
        loop {
            let (token, from_file) = self.next_token_raw();
            match token.kind {
                TokenKind::Eof => {
                    let span = self.span_of(&name_token);
                    let text = self.interner.resolve(name).to_string();
                    self.report(RuleDiagnostics::unterminated_invocation(span, &text));
                    self.lookahead.push((token, from_file));
                    return None;
                }
                TokenKind::LParen => {
                    depth += 1;
                    current.push(token);
                }
                TokenKind::RParen if depth == 0 => {
                    current.push(Token::eof(token.location));
                    args.push(current);
                    break;
                }
                TokenKind::RParen => {
                    depth -= 1;
                    current.push(token);
                }
                TokenKind::Comma if depth == 0 && !(variadic && args.len() + 1 >= arity) => {
                    current.push(Token::eof(token.location));
                    args.push(std::mem::take(&mut current));
                }
                _ => current.push(token),
            }
        }

        // `f()` passes no arguments to a macro without parameters
        if arity == 0 && args.len() == 1 && args[0].len() == 1 {
            args.clear();
        }
        // an omitted variadic argument is empty
        if variadic && args.len() + 1 == arity {
            let location = args
                .last()
                .and_then(|a| a.last())
                .map(|t| t.location)
                .unwrap_or(name_token.location);
            args.push(vec![Token::eof(location)]);
        }

        if args.len() != arity {
            let span = self.span_of(&name_token);
            let text = self.interner.resolve(name).to_string();
            let expected = if variadic { arity - 1 } else { arity };
            self.report(RuleDiagnostics::argument_count(
                span,
                &text,
                expected,
                args.len(),
                variadic,
            ));
            return None;
        }
        Some(MacroArgs::new(args))
    }

    fn param_of(definition: &MacroDefinition, token: &Token) -> Option<usize> {
        if !definition.function_like || token.flags.substituted {
            return None;
        }
        token
            .identifier_symbol()
            .and_then(|symbol| definition.param_index(symbol))
    }

    /// Replacement list of one invocation with parameters substituted
    fn substitute(&mut self, definition: &MacroDefinition, args: &MacroArgs, name_token: Token) -> Vec<Token> {
        let body = &definition.body;
        let mut out = Vec::with_capacity(body.len());
        let mut i = 0;
        while i < body.len() {
            let token = body[i];
            let next = body.get(i + 1);

            let stringifies = token.is(TokenKind::StringifyMarker)
                || (token.is(TokenKind::Hash) && definition.function_like);
            if stringifies {
                if let Some(index) = next.and_then(|n| Self::param_of(definition, n)) {
                    let target = body[i + 1];
                    let mut literal = self.stringify(args.unterminated(index), target.location);
                    literal.flags.leading_space = token.flags.leading_space;
                    out.push(literal);
                    i += 2;
                    continue;
                }
                if token.is(TokenKind::StringifyMarker) {
                    if let Some(&target) = next.filter(|n| !n.kind.is_end()) {
                        let mut literal = self.stringify(&[target], target.location);
                        literal.flags.leading_space = token.flags.leading_space;
                        out.push(literal);
                        i += 2;
                    } else {
                        i += 1;
                    }
                    continue;
                }
            }

            if let Some(index) = Self::param_of(definition, &token) {
                let expanded = self.pre_expand_argument(args, index);
                let count = expanded.len().saturating_sub(1);
                for (k, mut replacement) in expanded.into_iter().take(count).enumerate() {
                    replacement.flags.substituted = true;
                    if k == 0 {
                        replacement.flags.leading_space = token.flags.leading_space;
                    }
                    out.push(replacement);
                }
                i += 1;
                continue;
            }

            if token.is_not(TokenKind::LoopMarker) {
                out.push(token);
            }
            i += 1;
        }

        for token in out.iter_mut() {
            token.flags.at_line_start = false;
        }
        if let Some(first) = out.first_mut() {
            first.flags.at_line_start = name_token.flags.at_line_start;
            first.flags.leading_space = name_token.flags.leading_space;
        }
        out
    }

    /// Fully macro-expand actual argument `index`, returning it with a trailing `Eof`
    pub fn pre_expand_argument(&mut self, args: &MacroArgs, index: usize) -> Vec<Token> {
        match args.get(index) {
            Some(raw) => self.pre_expand(raw.to_vec()),
            None => vec![Token::eof(SourceLocation::unknown())],
        }
    }

    fn pre_expand(&mut self, tokens: Vec<Token>) -> Vec<Token> {
        let saved_lookahead = std::mem::take(&mut self.lookahead);
        let saved_pending = self.pending_flags.take();
        let depth = self.frames.len();
        self.frames.push(TokenFrame::sentinel(tokens));

        let mut out = Vec::new();
        loop {
            let token = self.lex();
            out.push(token);
            if token.is(TokenKind::Eof) {
                break;
            }
        }

        self.frames.truncate(depth);
        self.lookahead = saved_lookahead;
        self.pending_flags = saved_pending;
        out
    }

    /// Build one string literal from `tokens`, located at `location`
    pub fn stringify(&mut self, tokens: &[Token], location: SourceLocation) -> Token {
        let mut text = String::from("\"");
        let mut first = true;
        for token in tokens {
            if token.kind.is_end() || token.kind.is_synthetic() {
                continue;
            }
            if !first && token.flags.leading_space {
                text.push(' ');
            }
            first = false;
            let spelling = token.spelling(&self.interner);
            if matches!(token.kind, TokenKind::StringLiteral | TokenKind::CharLiteral) {
                for c in spelling.chars() {
                    if c == '"' || c == '\\' {
                        text.push('\\');
                    }
                    text.push(c);
                }
            } else {
                text.push_str(spelling);
            }
        }
        text.push('"');

        let length = text.len() as u32;
        let symbol = self.interner.intern(&text);
        let mut token = Token::with_data(TokenKind::StringLiteral, symbol, location, length);
        token.flags.stringified = true;
        token
    }

    // ---------------------------------------------------------------------
    // Directives
    // ---------------------------------------------------------------------

    fn handle_directive(&mut self, hash: Token) {
        if let Some(lexer) = self.lexer.as_mut() {
            lexer.enter_directive();
        }
        let directive = self.next_directive_token();
        if directive.kind.is_end() {
            return;
        }
        if directive.is_not(TokenKind::Identifier) {
            let span = self.span_of(&directive);
            self.report(RuleDiagnostics::invalid_directive(span, "invalid preprocessing directive"));
            self.skip_line();
            return;
        }

        match self.spelling(&directive) {
            "define" => self.handle_define(hash),
            "undef" => self.handle_undef(),
            "pragma" => self.handle_pragma(),
            other => {
                let other = other.to_string();
                let span = self.span_of(&directive);
                warn!("skipping unknown directive #{}", other);
                self.report(RuleDiagnostics::unknown_directive(span, &other));
                self.skip_line();
            }
        }
    }

    fn directive_error(&mut self, token: Token, message: &str) {
        let span = self.span_of(&token);
        self.report(RuleDiagnostics::invalid_directive(span, message));
        if !token.kind.is_end() {
            self.skip_line();
        }
    }

    fn handle_define(&mut self, hash: Token) {
        let name_token = self.next_directive_token();
        let Some(name) = name_token.identifier_symbol() else {
            self.directive_error(name_token, "macro name must be an identifier");
            return;
        };

        let mut next = self.next_directive_token();
        let mut params = ParamList::new();
        let mut variadic = false;
        let function_like = next.is(TokenKind::LParen) && !next.flags.leading_space;

        if function_like {
            loop {
                let token = self.next_directive_token();
                match token.kind {
                    TokenKind::RParen if params.is_empty() => break,
                    TokenKind::Ellipsis => {
                        params.push(self.interner.intern("__VA_ARGS__"));
                        variadic = true;
                        let close = self.next_directive_token();
                        if close.is_not(TokenKind::RParen) {
                            self.directive_error(close, "expected ')' after '...'");
                            return;
                        }
                        break;
                    }
                    TokenKind::Identifier => {
                        let Some(param) = token.data else { return };
                        if params.contains(&param) {
                            self.directive_error(token, "duplicate macro parameter name");
                            return;
                        }
                        params.push(param);
                        let mut separator = self.next_directive_token();
                        if separator.is(TokenKind::Ellipsis) {
                            variadic = true;
                            separator = self.next_directive_token();
                            if separator.is_not(TokenKind::RParen) {
                                self.directive_error(separator, "expected ')' after '...'");
                                return;
                            }
                        }
                        match separator.kind {
                            TokenKind::RParen => break,
                            TokenKind::Comma => continue,
                            _ => {
                                self.directive_error(separator, "expected ',' or ')' in macro parameter list");
                                return;
                            }
                        }
                    }
                    _ => {
                        self.directive_error(token, "expected macro parameter name");
                        return;
                    }
                }
            }
            next = self.next_directive_token();
        }

        let mut body = Vec::new();
        while !next.kind.is_end() {
            body.push(next);
            next = self.next_directive_token();
        }

        let definition = if function_like {
            MacroDefinition::function_like(name, params, body, variadic, name_token.location)
        } else {
            MacroDefinition::object_like(name, body, name_token.location)
        };

        if let Some(previous) = self.macros.get(name) {
            if !self.same_definition(previous, &definition) {
                let span = self.span_of(&name_token);
                let previous_span = self.span_at(previous.location, name_token.length);
                let text = self.interner.resolve(name).to_string();
                self.report(RuleDiagnostics::macro_redefined(span, previous_span, &text));
            }
        }
        debug!(
            "#define {} at {}",
            self.interner.resolve(name),
            self.source_map.describe(hash.location)
        );
        self.macros.define(definition);
    }

    fn same_definition(&self, a: &MacroDefinition, b: &MacroDefinition) -> bool {
        a.function_like == b.function_like
            && a.variadic == b.variadic
            && a.params == b.params
            && a.body.len() == b.body.len()
            && a.body
                .iter()
                .zip(&b.body)
                .all(|(x, y)| x.kind == y.kind && x.data == y.data)
    }

    fn handle_undef(&mut self) {
        let name_token = self.next_directive_token();
        let Some(name) = name_token.identifier_symbol() else {
            self.directive_error(name_token, "macro name must be an identifier");
            return;
        };
        self.macros.undefine(name);
        self.skip_line();
    }

    fn handle_pragma(&mut self) {
        let namespace = self.next_directive_token();
        if namespace.is(TokenKind::Identifier) {
            let key = self.spelling(&namespace).to_string();
            if let Some(mut handler) = self.pragma_handlers.remove(&key) {
                handler.handle_pragma(self, namespace);
                self.pragma_handlers.entry(key).or_insert(handler);
                if self.in_directive() {
                    self.skip_line();
                }
                return;
            }
            debug!("ignoring #pragma {}", key);
        }
        if !namespace.kind.is_end() {
            self.skip_line();
        }
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(PreprocessorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_tokens;

    fn expand(text: &str) -> (String, Diagnostics) {
        let mut pp = Preprocessor::default();
        pp.enter_source("test.c", text);
        let tokens = pp.tokenize();
        let output = print_tokens(&tokens, pp.interner());
        (output, pp.take_diagnostics())
    }

    #[test]
    fn test_object_like_macro() {
        let (out, diags) = expand("#define N 42\nint x = N;\n");
        assert_eq!(out, "int x = 42;\n");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_function_like_macro_with_rescanning() {
        let (out, _) = expand("#define SQ(x) ((x)*(x))\n#define TWO 2\nSQ(TWO + 1)\n");
        assert_eq!(out, "((2 + 1)*(2 + 1))\n");
    }

    #[test]
    fn test_function_like_name_without_parens() {
        let (out, _) = expand("#define f(x) x\nint f;\n");
        assert_eq!(out, "int f;\n");
    }

    #[test]
    fn test_self_reference_is_not_expanded() {
        let (out, _) = expand("#define foo foo + 1\nfoo\n");
        assert_eq!(out, "foo + 1\n");
    }

    #[test]
    fn test_stringify_argument() {
        let (out, _) = expand("#define S(x) #x\nS(a  +  \"q\")\n");
        assert_eq!(out, "\"a + \\\"q\\\"\"\n");
    }

    #[test]
    fn test_variadic_macros() {
        let (out, diags) = expand("#define V(fmt, ...) p(fmt, __VA_ARGS__)\nV(1, 2, 3)\n");
        assert_eq!(out, "p(1, 2, 3)\n");
        assert!(diags.is_empty());

        let (out, _) = expand("#define N(head, rest...) rest\nN(1) a\nN(1, 2, 3)\n");
        assert_eq!(out, "a\n2, 3\n");
    }

    #[test]
    fn test_argument_count_mismatch_drops_invocation() {
        let (out, diags) = expand("#define F(a, b) a b\nF(1) x\n");
        assert_eq!(out, "x\n");
        assert_eq!(diags.errors().next().and_then(|d| d.code.as_deref()), Some("E0102"));
    }

    #[test]
    fn test_unterminated_invocation() {
        let (_, diags) = expand("#define F(a) a\nF(1, \n");
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("E0101")));
    }

    #[test]
    fn test_unknown_directive_warns_and_skips() {
        let (out, diags) = expand("#frobnicate all the things\nok\n");
        assert_eq!(out, "ok\n");
        assert_eq!(diags.warnings().count(), 1);
        assert!(!diags.has_errors());
    }

    #[test]
    fn test_undef() {
        let (out, _) = expand("#define A 1\n#undef A\nA\n");
        assert_eq!(out, "A\n");
    }

    #[test]
    fn test_unknown_pragma_is_ignored() {
        let (out, diags) = expand("#pragma once\n#pragma other stuff here\nx\n");
        assert_eq!(out, "x\n");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_predefines() {
        let mut pp = Preprocessor::new(PreprocessorConfig::default().define("LEVEL", "3"));
        pp.enter_source("test.c", "LEVEL __MACRULE__\n");
        let tokens = pp.tokenize();
        assert_eq!(print_tokens(&tokens, pp.interner()), "3 1\n");
    }

    #[test]
    fn test_hook_sees_arguments_and_populates_body() {
        let mut pp = Preprocessor::default();
        let name = pp.intern("twice");
        let list = pp.intern("list");
        pp.define_macro(MacroDefinition::function_like(
            name,
            [list],
            vec![],
            true,
            SourceLocation::unknown(),
        ));
        pp.add_expansion_hook(
            name,
            Box::new(|invocation: &mut Invocation<'_>, pp: &mut Preprocessor| {
                let expanded = pp.pre_expand_argument(invocation.args, 0);
                let body = &expanded[..expanded.len() - 1];
                invocation.definition.body.extend_from_slice(body);
                invocation.definition.body.extend_from_slice(body);
                let placeholder = MacroDefinition::function_like(
                    invocation.definition.name,
                    invocation.definition.params.clone(),
                    vec![],
                    true,
                    invocation.definition.location,
                );
                pp.define_macro(placeholder);
            }),
        );

        pp.enter_source("test.c", "twice(x)\ntwice(y z)\n");
        let tokens = pp.tokenize();
        assert_eq!(print_tokens(&tokens, pp.interner()), "x x\ny z y z\n");
        assert!(pp.macros().get(name).is_some_and(|d| d.body.is_empty()));
    }

    #[test]
    fn test_removed_hooks_no_longer_run() {
        let mut pp = Preprocessor::default();
        let name = pp.intern("h");
        pp.define_macro(MacroDefinition::object_like(name, vec![], SourceLocation::unknown()));
        pp.add_expansion_hook(
            name,
            Box::new(|invocation: &mut Invocation<'_>, _pp: &mut Preprocessor| {
                let token = invocation.name_token;
                invocation.definition.body.push(Token::new(TokenKind::Plus, token.location));
            }),
        );
        assert_eq!(pp.remove_expansion_hooks(name), 1);
        assert!(!pp.has_expansion_hook(name));
        pp.enter_source("test.c", "h x\n");
        let tokens = pp.tokenize();
        assert_eq!(print_tokens(&tokens, pp.interner()), "x\n");
    }

    #[test]
    fn test_hook_mutation_persists_without_redefinition() {
        let mut pp = Preprocessor::default();
        let name = pp.intern("grow");
        pp.define_macro(MacroDefinition::object_like(name, vec![], SourceLocation::unknown()));
        pp.add_expansion_hook(
            name,
            Box::new(|invocation: &mut Invocation<'_>, _pp: &mut Preprocessor| {
                let token = invocation.name_token;
                let mut semi = Token::new(TokenKind::Semi, token.location);
                semi.flags.leading_space = false;
                invocation.definition.body.push(semi);
            }),
        );
        pp.enter_source("test.c", "grow grow\n");
        let tokens = pp.tokenize();
        assert_eq!(print_tokens(&tokens, pp.interner()), "; ;;\n");
        assert_eq!(pp.macros().get(name).map(|d| d.body.len()), Some(2));
    }
}
