//! Source ranges of registered rules
//!
//! Lets a verifier ask whether a location lies inside some rule definition.

use crate::host::RuleHost;
use crate::rule::{GeneratedKind, ParamKind, Rule};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use source_map::{SourceLocation, SourceRange};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSummary {
    pub name: String,
    pub kind: ParamKind,
    pub variadic: bool,
}

/// What a verifier may read about one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    pub name: Option<String>,
    pub parameters: Vec<ParameterSummary>,
    pub generated_kind: GeneratedKind,
    #[serde(serialize_with = "serialize_range")]
    pub range: SourceRange,
    pub has_loops: bool,
}

impl RuleSummary {
    pub fn from_rule<H: RuleHost + ?Sized>(rule: &Rule, host: &H) -> Self {
        Self {
            name: rule.name.map(|n| host.resolve(n).to_string()),
            parameters: rule
                .params()
                .iter()
                .map(|p| ParameterSummary {
                    name: host.resolve(p.symbol).to_string(),
                    kind: p.kind,
                    variadic: p.variadic,
                })
                .collect(),
            generated_kind: rule.generated_kind,
            range: rule.range,
            has_loops: rule.has_loops(),
        }
    }
}

fn serialize_range<S: Serializer>(range: &SourceRange, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("SourceRange", 3)?;
    state.serialize_field("file", &range.begin.file_id.as_u32())?;
    state.serialize_field("begin", &range.begin.offset)?;
    state.serialize_field("end", &range.end.offset)?;
    state.end()
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct RuleLocator {
    rules: Vec<RuleSummary>,
}

impl RuleLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, summary: RuleSummary) {
        self.rules.push(summary);
    }

    pub fn is_in_rule(&self, location: SourceLocation) -> bool {
        self.rule_containing(location).is_some()
    }

    pub fn rule_containing(&self, location: SourceLocation) -> Option<&RuleSummary> {
        self.rules.iter().find(|r| r.range.contains(location))
    }

    /// Most recent definition with this name
    pub fn by_name(&self, name: &str) -> Option<&RuleSummary> {
        self.rules.iter().rev().find(|r| r.name.as_deref() == Some(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleSummary> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source_map::FileId;

    fn summary(name: &str, begin: u32, end: u32) -> RuleSummary {
        let file = FileId::new(0);
        RuleSummary {
            name: Some(name.to_string()),
            parameters: vec![ParameterSummary {
                name: "x".to_string(),
                kind: ParamKind::Expression,
                variadic: false,
            }],
            generated_kind: GeneratedKind::Block,
            range: SourceRange::new(SourceLocation::new(file, begin), SourceLocation::new(file, end)),
            has_loops: false,
        }
    }

    #[test]
    fn test_containment() {
        let mut locator = RuleLocator::new();
        locator.record(summary("first", 10, 20));
        locator.record(summary("second", 40, 60));

        let file = FileId::new(0);
        assert!(locator.is_in_rule(SourceLocation::new(file, 10)));
        assert!(!locator.is_in_rule(SourceLocation::new(file, 20)));
        assert_eq!(
            locator
                .rule_containing(SourceLocation::new(file, 45))
                .and_then(|r| r.name.as_deref()),
            Some("second")
        );
        assert!(!locator.is_in_rule(SourceLocation::new(FileId::new(1), 45)));
        assert!(locator.by_name("first").is_some());
    }

    #[test]
    fn test_serialized_form() {
        let mut locator = RuleLocator::new();
        locator.record(summary("first", 10, 20));
        let json = serde_json::to_value(&locator).unwrap();
        assert_eq!(json[0]["name"], "first");
        assert_eq!(json[0]["range"]["begin"], 10);
        assert_eq!(json[0]["generated_kind"], "block");
        assert_eq!(json[0]["parameters"][0]["kind"], "expression");
    }
}
