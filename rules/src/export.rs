//! Registration of parsed rules as host macros

use crate::host::RuleHost;
use crate::loop_expander::LoopExpander;
use crate::rule::Rule;
use log::debug;

/// How a rule ended up in the host's macro table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Anonymous rules are never registered
    Skipped,
    /// Static function-like macro with the protected body
    Static,
    /// Empty variadic placeholder plus a loop expansion hook
    Looping,
}

/// Register `rule` under its name. The rule must already be protected.
pub fn register_rule<H: RuleHost + ?Sized>(host: &mut H, rule: Rule) -> Registration {
    let Some(name) = rule.name else {
        debug!("anonymous rule not registered");
        return Registration::Skipped;
    };
    let params = rule.param_symbols();
    let location = rule.range.begin;
    host.remove_invocation_hooks(name);

    if rule.has_loops() {
        debug!(
            "registering loop rule {} ({} loop region(s))",
            host.resolve(name),
            rule.loops().len()
        );
        host.register_macro(name, &params, Vec::new(), true, location);
        host.install_invocation_hook(name, LoopExpander::new(rule));
        Registration::Looping
    } else {
        debug!(
            "registering rule {} with {} body token(s)",
            host.resolve(name),
            rule.body().len()
        );
        let variadic = rule.is_variadic();
        host.register_macro(name, &params, rule.body().to_vec(), variadic, location);
        Registration::Static
    }
}
