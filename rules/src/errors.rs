//! Errors raised while defining rules
//!
//! Every error stops the current rule; the rule is not registered and
//! processing continues after it.

use diagnostics::rules::RuleDiagnostics;
use diagnostics::Diagnostic;
use source_map::{SourceLocation, SourceMap};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A specific token was required
    Expected {
        expected: String,
        found: String,
        location: SourceLocation,
        length: u32,
    },

    /// Parameter type tag not in the fixed table
    UnknownType {
        name: String,
        location: SourceLocation,
        length: u32,
    },

    /// Input ended inside the rule body
    MissingClosingBrace {
        location: SourceLocation,
        opening: SourceLocation,
    },

    /// `$loop(<ident> in <ident>)` header is malformed
    MalformedLoopHeader {
        expected: String,
        found: String,
        location: SourceLocation,
        length: u32,
    },

    /// `$loop` inside another `$loop` body
    NestedLoop {
        location: SourceLocation,
        outer: SourceLocation,
    },

    /// First pragma parameter is not an identifier
    MissingRuleName {
        found: String,
        location: SourceLocation,
        length: u32,
    },

    DuplicateParameter {
        name: String,
        location: SourceLocation,
        first: SourceLocation,
        length: u32,
    },

    /// `-> $ident` or another tag that cannot describe generated code
    InvalidGeneratedKind {
        name: String,
        location: SourceLocation,
        length: u32,
    },

    /// `#pragma <namespace> <category>` with a category other than `rule`
    UnrecognizedCategory {
        category: String,
        location: SourceLocation,
        length: u32,
    },
}

impl RuleError {
    pub fn location(&self) -> SourceLocation {
        match self {
            RuleError::Expected { location, .. } => *location,
            RuleError::UnknownType { location, .. } => *location,
            RuleError::MissingClosingBrace { location, .. } => *location,
            RuleError::MalformedLoopHeader { location, .. } => *location,
            RuleError::NestedLoop { location, .. } => *location,
            RuleError::MissingRuleName { location, .. } => *location,
            RuleError::DuplicateParameter { location, .. } => *location,
            RuleError::InvalidGeneratedKind { location, .. } => *location,
            RuleError::UnrecognizedCategory { location, .. } => *location,
        }
    }

    fn length(&self) -> u32 {
        match self {
            RuleError::Expected { length, .. }
            | RuleError::UnknownType { length, .. }
            | RuleError::MalformedLoopHeader { length, .. }
            | RuleError::MissingRuleName { length, .. }
            | RuleError::DuplicateParameter { length, .. }
            | RuleError::InvalidGeneratedKind { length, .. }
            | RuleError::UnrecognizedCategory { length, .. } => *length,
            RuleError::MissingClosingBrace { .. } => 1,
            RuleError::NestedLoop { .. } => "$loop".len() as u32,
        }
    }

    /// Error codes E7101-E7199 are reserved for rule definition errors:
    /// - E7101: Expected token
    /// - E7102: Unknown parameter type
    /// - E7103: Missing closing brace
    /// - E7104: Malformed loop header
    /// - E7105: Nested loop
    /// - E7106: Missing rule name
    /// - E7107: Duplicate parameter
    /// - E7108: Invalid generated kind
    /// - E7109: Unrecognized pragma category
    pub fn error_code(&self) -> &'static str {
        match self {
            RuleError::Expected { .. } => "E7101",
            RuleError::UnknownType { .. } => "E7102",
            RuleError::MissingClosingBrace { .. } => "E7103",
            RuleError::MalformedLoopHeader { .. } => "E7104",
            RuleError::NestedLoop { .. } => "E7105",
            RuleError::MissingRuleName { .. } => "E7106",
            RuleError::DuplicateParameter { .. } => "E7107",
            RuleError::InvalidGeneratedKind { .. } => "E7108",
            RuleError::UnrecognizedCategory { .. } => "E7109",
        }
    }

    /// Follow-up hint attached to the diagnostic
    pub fn help(&self) -> Option<String> {
        match self {
            RuleError::MissingRuleName { .. } => {
                Some("name the rule: `#pragma macrule rule <name>`".to_string())
            }
            RuleError::DuplicateParameter { name, .. } => {
                Some(format!("rename one of the '{}' parameters", name))
            }
            RuleError::NestedLoop { .. } => {
                Some("move the inner loop into a separate rule and invoke it".to_string())
            }
            _ => None,
        }
    }

    /// Render this error as a diagnostic against `source_map`
    pub fn to_diagnostic(&self, source_map: &SourceMap) -> Diagnostic {
        let span = source_map.span_for(self.location(), self.length());
        let mut diagnostic = match self {
            RuleError::Expected {
                expected, found, ..
            } => RuleDiagnostics::expected(span, expected, found),
            RuleError::UnknownType { name, .. } => RuleDiagnostics::unknown_type(span, name),
            RuleError::MissingClosingBrace { opening, .. } => {
                RuleDiagnostics::missing_closing_brace(span, source_map.span_for(*opening, 1))
            }
            RuleError::MalformedLoopHeader {
                expected, found, ..
            } => RuleDiagnostics::malformed_loop_header(span, expected, found),
            RuleError::NestedLoop { outer, .. } => {
                RuleDiagnostics::nested_loop(span, source_map.span_for(*outer, self.length()))
            }
            RuleError::MissingRuleName { found, .. } => RuleDiagnostics::missing_rule_name(span, found),
            RuleError::DuplicateParameter {
                name,
                first,
                length,
                ..
            } => RuleDiagnostics::duplicate_parameter(span, source_map.span_for(*first, *length), name),
            RuleError::InvalidGeneratedKind { name, .. } => {
                RuleDiagnostics::invalid_generated_kind(span, name)
            }
            RuleError::UnrecognizedCategory { category, .. } => {
                RuleDiagnostics::unrecognized_category(span, category)
            }
        };
        if let Some(help) = self.help() {
            diagnostic.help.push(help);
        }
        diagnostic
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::Expected {
                expected, found, ..
            } => write!(f, "expected {}, found '{}'", expected, found),
            RuleError::UnknownType { name, .. } => write!(f, "unknown type name '{}'", name),
            RuleError::MissingClosingBrace { .. } => write!(f, "expected '}}'"),
            RuleError::MalformedLoopHeader {
                expected, found, ..
            } => write!(f, "expected {} in $loop header, found '{}'", expected, found),
            RuleError::NestedLoop { .. } => write!(f, "nested $loop is not supported"),
            RuleError::MissingRuleName { found, .. } => {
                write!(f, "expected a rule name, found '{}'", found)
            }
            RuleError::DuplicateParameter { name, .. } => {
                write!(f, "duplicate parameter '{}'", name)
            }
            RuleError::InvalidGeneratedKind { name, .. } => {
                write!(f, "'{}' is not a generated kind", name)
            }
            RuleError::UnrecognizedCategory { category, .. } => {
                write!(f, "unrecognized rule pragma category '{}'", category)
            }
        }
    }
}

impl std::error::Error for RuleError {}
