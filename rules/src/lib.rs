//! macrule rule compiler
//!
//! A rule is introduced by `#pragma macrule rule <name>` and followed by its
//! definition:
//!
//! ```text
//! #pragma macrule rule print_all
//! (fmt:$expr, args:$expr*) {
//!     $loop(a in args) { printf(fmt, $str(a), a); }
//! }
//! ```
//!
//! The definition is parsed into a [`Rule`], protected against precedence
//! and statement-boundary surprises, and registered with the host
//! preprocessor as a function-like macro. Rules containing `$loop` are
//! unrolled afresh for each invocation by a [`LoopExpander`] hook.

pub mod errors;
pub mod export;
pub mod host;
pub mod locator;
pub mod logging;
pub mod loop_expander;
pub mod manifest;
pub mod parser;
pub mod pragma;
pub mod protect;
pub mod rule;
pub mod token_buffer;

pub use errors::RuleError;
pub use export::{register_rule, Registration};
pub use host::RuleHost;
pub use locator::{ParameterSummary, RuleLocator, RuleSummary};
pub use loop_expander::{expand_invocation, split_groups, LoopExpander};
pub use manifest::{parse_manifest, Manifest};
pub use parser::parse_rule;
pub use pragma::RulePragmaHandler;
pub use protect::protect;
pub use rule::{GeneratedKind, LoopRegion, ParamKind, Parameter, Rule};
pub use token_buffer::TokenBuffer;

use preprocessor::Preprocessor;
use std::cell::RefCell;
use std::rc::Rc;

/// Handle `#pragma <namespace> rule` in `pp`, using the namespace from its
/// configuration. Returns the locator that collects every registered rule.
pub fn install(pp: &mut Preprocessor) -> Rc<RefCell<RuleLocator>> {
    let locator = Rc::new(RefCell::new(RuleLocator::new()));
    let namespace = pp.config().pragma_namespace.clone();
    pp.add_pragma_handler(namespace, Box::new(RulePragmaHandler::new(Rc::clone(&locator))));
    locator
}
