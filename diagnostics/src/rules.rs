//! Diagnostic builders for the rule language and its host preprocessor
//!
//! Codes follow the compiler-wide ranges: E01xx for preprocessing errors,
//! E71xx for rule definition errors, W01xx for preprocessing warnings.

use crate::{Diagnostic, DiagnosticBuilder, SourceSpan};

/// Common diagnostics used while defining and expanding rules
pub struct RuleDiagnostics;

impl RuleDiagnostics {
    /// `expected X` at the offending token
    pub fn expected(span: SourceSpan, expected: &str, found: &str) -> Diagnostic {
        DiagnosticBuilder::error(format!("expected {}", expected), span.clone())
            .code("E7101")
            .label(span, format!("found '{}'", found))
            .build()
    }

    pub fn unknown_type(span: SourceSpan, name: &str) -> Diagnostic {
        DiagnosticBuilder::error(format!("unknown type name '{}'", name), span.clone())
            .code("E7102")
            .label(span, "not a rule parameter type")
            .help("parameter types are $expr, $ident, $stmt and $block")
            .build()
    }

    pub fn missing_closing_brace(span: SourceSpan, opening_span: SourceSpan) -> Diagnostic {
        DiagnosticBuilder::error("expected '}'", span.clone())
            .code("E7103")
            .label(span, "rule body ends here")
            .secondary_label(opening_span, "to match this '{'")
            .build()
    }

    pub fn malformed_loop_header(span: SourceSpan, expected: &str, found: &str) -> Diagnostic {
        DiagnosticBuilder::error(format!("expected {} in $loop header", expected), span.clone())
            .code("E7104")
            .label(span, format!("found '{}'", found))
            .help("loops are written `$loop(<ident> in <variadic parameter>) { ... }`")
            .build()
    }

    pub fn nested_loop(span: SourceSpan, outer_span: SourceSpan) -> Diagnostic {
        DiagnosticBuilder::error("nested $loop is not supported", span.clone())
            .code("E7105")
            .label(span, "inner loop")
            .secondary_label(outer_span, "enclosing loop starts here")
            .build()
    }

    pub fn missing_rule_name(span: SourceSpan, found: &str) -> Diagnostic {
        DiagnosticBuilder::error("expected a rule name", span.clone())
            .code("E7106")
            .label(span, format!("found '{}'", found))
            .build()
    }

    pub fn duplicate_parameter(span: SourceSpan, first_span: SourceSpan, name: &str) -> Diagnostic {
        DiagnosticBuilder::error(format!("duplicate parameter '{}'", name), span.clone())
            .code("E7107")
            .label(span, "redeclared here")
            .secondary_label(first_span, "first declared here")
            .build()
    }

    pub fn invalid_generated_kind(span: SourceSpan, name: &str) -> Diagnostic {
        DiagnosticBuilder::error(format!("'{}' is not a generated kind", name), span.clone())
            .code("E7108")
            .label(span, "expected $expr, $stmt or $block")
            .build()
    }

    pub fn unrecognized_category(span: SourceSpan, category: &str) -> Diagnostic {
        DiagnosticBuilder::error(
            format!("unrecognized rule pragma category '{}'", category),
            span.clone(),
        )
        .code("E7109")
        .label(span, "only 'rule' is supported")
        .build()
    }

    pub fn unterminated_invocation(span: SourceSpan, macro_name: &str) -> Diagnostic {
        DiagnosticBuilder::error(
            format!("unterminated argument list invoking macro '{}'", macro_name),
            span.clone(),
        )
        .code("E0101")
        .label(span, "invocation starts here")
        .build()
    }

    pub fn argument_count(
        span: SourceSpan,
        macro_name: &str,
        expected: usize,
        found: usize,
        variadic: bool,
    ) -> Diagnostic {
        let expected_text = if variadic {
            format!("at least {}", expected)
        } else {
            expected.to_string()
        };
        DiagnosticBuilder::error(
            format!(
                "macro '{}' requires {} argument(s), but {} given",
                macro_name, expected_text, found
            ),
            span.clone(),
        )
        .code("E0102")
        .label(span, "invoked here")
        .build()
    }

    pub fn reentrant_invocation(span: SourceSpan, macro_name: &str) -> Diagnostic {
        DiagnosticBuilder::error(
            format!("macro '{}' invoked while its own expansion hook is running", macro_name),
            span.clone(),
        )
        .code("E0104")
        .label(span, "nested invocation dropped")
        .help("move the inner invocation out of the argument list")
        .build()
    }

    pub fn invalid_directive(span: SourceSpan, message: &str) -> Diagnostic {
        DiagnosticBuilder::error(message.to_string(), span.clone())
            .code("E0103")
            .label(span, "in this directive")
            .build()
    }

    pub fn unknown_directive(span: SourceSpan, name: &str) -> Diagnostic {
        DiagnosticBuilder::warning(format!("unknown directive '#{}' ignored", name), span.clone())
            .code("W0101")
            .label(span, "skipped to end of line")
            .build()
    }

    pub fn macro_redefined(span: SourceSpan, previous: SourceSpan, name: &str) -> Diagnostic {
        DiagnosticBuilder::warning(format!("'{}' macro redefined", name), span.clone())
            .code("W0102")
            .label(span, "redefined here")
            .secondary_label(previous, "previous definition")
            .build()
    }
}
