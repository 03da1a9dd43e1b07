//! Extension points of the expansion driver
//!
//! Expansion hooks observe every invocation of one macro name right before its
//! body is substituted and may rewrite the definition used for that expansion.
//! Pragma handlers own one `#pragma <namespace>` and read the rest of the
//! directive themselves.

use crate::macros::{MacroArgs, MacroDefinition};
use crate::token::Token;
use crate::Preprocessor;

/// One invocation about to be expanded
pub struct Invocation<'a> {
    /// The macro name token at the call site
    pub name_token: Token,
    /// Raw actual arguments, each ending with `Eof`
    pub args: &'a MacroArgs,
    /// Definition used for this expansion. Changes affect only this
    /// expansion unless the hook defines the macro anew.
    pub definition: &'a mut MacroDefinition,
}

pub trait ExpansionHook {
    fn macro_expands(&mut self, invocation: &mut Invocation<'_>, pp: &mut Preprocessor);
}

impl<F> ExpansionHook for F
where
    F: FnMut(&mut Invocation<'_>, &mut Preprocessor),
{
    fn macro_expands(&mut self, invocation: &mut Invocation<'_>, pp: &mut Preprocessor) {
        self(invocation, pp)
    }
}

pub trait PragmaHandler {
    /// Called with the namespace token; the lexer is still in directive mode.
    fn handle_pragma(&mut self, pp: &mut Preprocessor, introducer: Token);
}
