//! `#pragma <namespace> rule <name>` dispatch

use crate::errors::RuleError;
use crate::export::{register_rule, Registration};
use crate::host::RuleHost;
use crate::locator::{RuleLocator, RuleSummary};
use crate::parser::parse_rule;
use crate::protect::protect;
use log::{debug, warn};
use preprocessor::{PragmaHandler, Preprocessor, Token, TokenKind};
use std::cell::RefCell;
use std::rc::Rc;

pub const RULE_CATEGORY: &str = "rule";

/// Pragma handler defining a rule from the tokens that follow the pragma
pub struct RulePragmaHandler {
    locator: Rc<RefCell<RuleLocator>>,
}

impl RulePragmaHandler {
    pub fn new(locator: Rc<RefCell<RuleLocator>>) -> Self {
        Self { locator }
    }

    /// Handle one pragma whose namespace token has been consumed
    pub fn define_rule<H: RuleHost + ?Sized>(&mut self, host: &mut H) -> Result<Registration, RuleError> {
        let category = host.lex();
        if !category
            .identifier_symbol()
            .is_some_and(|s| host.resolve(s) == RULE_CATEGORY)
        {
            return Err(RuleError::UnrecognizedCategory {
                category: host.spelling(&category),
                location: category.location,
                length: category.length,
            });
        }

        let mut params: Vec<Token> = Vec::new();
        loop {
            let token = host.lex();
            if token.kind.is_end() {
                break;
            }
            params.push(token);
        }

        let mut rule = parse_rule(host, &params)?;
        let inserted = protect(&mut rule);
        debug!("rule protected with {} inserted token(s)", inserted);

        let summary = RuleSummary::from_rule(&rule, host);
        let registration = register_rule(host, rule);
        if registration != Registration::Skipped {
            self.locator.borrow_mut().record(summary);
        }
        Ok(registration)
    }
}

impl PragmaHandler for RulePragmaHandler {
    fn handle_pragma(&mut self, pp: &mut Preprocessor, introducer: Token) {
        debug_assert!(introducer.is(TokenKind::Identifier));
        if let Err(err) = self.define_rule(pp) {
            warn!("rule definition dropped: {}", err);
            RuleHost::report(pp, &err);
        }
    }
}
