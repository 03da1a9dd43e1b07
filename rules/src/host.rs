//! What the rule compiler needs from the preprocessor hosting it

use crate::errors::RuleError;
use crate::loop_expander::LoopExpander;
use preprocessor::{MacroArgs, MacroDefinition, Preprocessor, Symbol, Token};
use source_map::SourceLocation;

pub trait RuleHost {
    /// Next raw token; rule bodies are captured unexpanded
    fn lex(&mut self) -> Token;

    fn intern(&mut self, text: &str) -> Symbol;

    fn resolve(&self, symbol: Symbol) -> &str;

    /// Source text of `token`, for diagnostics
    fn spelling(&self, token: &Token) -> String;

    /// Install `name` as a function-like macro, replacing any previous definition
    fn register_macro(&mut self, name: Symbol, params: &[Symbol], body: Vec<Token>, variadic: bool, location: SourceLocation);

    /// Actual argument `index`, macro-expanded, with a trailing `Eof`
    fn pre_expand_argument(&mut self, args: &MacroArgs, index: usize) -> Vec<Token>;

    /// One string literal spelling `tokens`, located at `location`
    fn stringify(&mut self, tokens: &[Token], location: SourceLocation) -> Token;

    /// Run `expander` each time an invocation of `name` is about to expand
    fn install_invocation_hook(&mut self, name: Symbol, expander: LoopExpander);

    /// Forget hooks installed for an earlier definition of `name`
    fn remove_invocation_hooks(&mut self, name: Symbol);

    fn report(&mut self, error: &RuleError);
}

impl RuleHost for Preprocessor {
    fn lex(&mut self) -> Token {
        self.lex_unexpanded()
    }

    fn intern(&mut self, text: &str) -> Symbol {
        Preprocessor::intern(self, text)
    }

    fn resolve(&self, symbol: Symbol) -> &str {
        Preprocessor::resolve(self, symbol)
    }

    fn spelling(&self, token: &Token) -> String {
        if token.kind.is_end() {
            return token.kind.to_string();
        }
        Preprocessor::spelling(self, token).to_string()
    }

    fn register_macro(&mut self, name: Symbol, params: &[Symbol], body: Vec<Token>, variadic: bool, location: SourceLocation) {
        let definition = MacroDefinition::function_like(name, params.iter().copied(), body, variadic, location);
        self.define_macro(definition);
    }

    fn pre_expand_argument(&mut self, args: &MacroArgs, index: usize) -> Vec<Token> {
        Preprocessor::pre_expand_argument(self, args, index)
    }

    fn stringify(&mut self, tokens: &[Token], location: SourceLocation) -> Token {
        Preprocessor::stringify(self, tokens, location)
    }

    fn install_invocation_hook(&mut self, name: Symbol, expander: LoopExpander) {
        self.add_expansion_hook(name, Box::new(expander));
    }

    fn remove_invocation_hooks(&mut self, name: Symbol) {
        self.remove_expansion_hooks(name);
    }

    fn report(&mut self, error: &RuleError) {
        let diagnostic = error.to_diagnostic(self.source_map());
        Preprocessor::report(self, diagnostic);
    }
}
