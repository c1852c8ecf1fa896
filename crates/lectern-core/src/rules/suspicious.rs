//! Suspicious-attribute rule
//!
//! **Question**: does the snippet lean on removed library accessors?
//!
//! Flags any attribute access whose name is in a fixed denylist of
//! deprecated data-library accessors, wherever it appears in the tree.

use rustpython_parser::ast::{Expr, Stmt};
use serde_json::{Map, Value};

use crate::python;
use crate::types::RuleOutcome;

use super::{Rule, SUSPICIOUS_ATTRS};

pub struct SuspiciousAttributeRule;

impl Rule for SuspiciousAttributeRule {
    fn code(&self) -> &'static str {
        "suspicious_attribute"
    }

    fn apply(&self, suite: &[Stmt], source: &str) -> Vec<RuleOutcome> {
        let mut outcomes = Vec::new();

        python::walk_exprs(suite, &mut |expr| {
            let Expr::Attribute(attr) = expr else {
                return;
            };
            if !SUSPICIOUS_ATTRS.contains(&attr.attr.as_str()) {
                return;
            }

            let mut context = Map::new();
            context.insert("attribute".to_string(), Value::from(attr.attr.as_str()));

            let (line, col) = python::location(source, expr);
            outcomes.push(RuleOutcome::new(self.code(), context).at(line, col));
        });

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(source: &str) -> Vec<RuleOutcome> {
        let suite = python::parse(source).unwrap();
        SuspiciousAttributeRule.apply(&suite, source)
    }

    #[test]
    fn flags_denylisted_attribute() {
        let outcomes = apply("df.ix[0]\n");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].context["attribute"], "ix");
    }

    #[test]
    fn flags_nested_usage() {
        let outcomes = apply("for k, v in frame.iteritems():\n    print(k)\n");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].context["attribute"], "iteritems");
    }

    #[test]
    fn ignores_ordinary_attributes() {
        assert!(apply("print(df.shape)\n").is_empty());
    }
}
