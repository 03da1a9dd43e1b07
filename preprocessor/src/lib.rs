//! Token-level C-like preprocessor
//!
//! Hosts the macrule rule system: it lexes source files, runs `#define`,
//! `#undef` and `#pragma` directives, expands object-like and function-like
//! macros, and exposes the extension points the rule compiler needs
//! (per-macro expansion hooks, pragma handlers, argument pre-expansion and
//! stringification).

pub mod config;
pub mod hooks;
pub mod intern;
pub mod lexer;
pub mod macros;
pub mod preprocessor;
pub mod printer;
pub mod token;

pub use config::PreprocessorConfig;
pub use hooks::{ExpansionHook, Invocation, PragmaHandler};
pub use intern::{Interner, Symbol};
pub use lexer::{tokenize, Lexer};
pub use macros::{MacroArgs, MacroDefinition, MacroTable, ParamList};
pub use preprocessor::Preprocessor;
pub use printer::print_tokens;
pub use token::{Token, TokenFlags, TokenKind};

/// Expand a whole source text and print the result
pub fn preprocess(pp: &mut Preprocessor, name: &str, text: &str) -> String {
    pp.enter_source(name, text);
    let tokens = pp.tokenize();
    print_tokens(&tokens, pp.interner())
}
