//! No-output rule
//!
//! **Question**: does the snippet ever show anything?
//!
//! Emits one position-less summary outcome when no call anywhere in
//! the snippet invokes a recognized output function.

use rustpython_parser::ast::{Expr, Stmt};
use serde_json::{Map, Value};

use crate::python;
use crate::types::RuleOutcome;

use super::{Rule, INTENT_ADD_VISIBLE_OUTPUT, OUTPUT_CALLS};

pub struct NoOutputRule;

impl Rule for NoOutputRule {
    fn code(&self) -> &'static str {
        "no_output"
    }

    fn apply(&self, suite: &[Stmt], _source: &str) -> Vec<RuleOutcome> {
        if has_output_call(suite) {
            return Vec::new();
        }

        let mut context = Map::new();
        context.insert(
            "correction_intent".to_string(),
            Value::from(INTENT_ADD_VISIBLE_OUTPUT),
        );
        vec![RuleOutcome::new(self.code(), context)]
    }
}

/// True when any call anywhere in the tree targets an output function.
pub(crate) fn has_output_call(suite: &[Stmt]) -> bool {
    let mut found = false;
    python::walk_exprs(suite, &mut |expr| {
        if let Expr::Call(call) = expr {
            if let Some(name) = python::call_func_name(&call.func) {
                if OUTPUT_CALLS.contains(&name) {
                    found = true;
                }
            }
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(source: &str) -> Vec<RuleOutcome> {
        let suite = python::parse(source).unwrap();
        NoOutputRule.apply(&suite, source)
    }

    #[test]
    fn flags_snippet_without_output() {
        let outcomes = apply("x = 1\ny = x + 1\n");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].line, None);
        assert_eq!(outcomes[0].col, None);
    }

    #[test]
    fn print_call_satisfies_output() {
        assert!(apply("x = 1\nprint(x)\n").is_empty());
    }

    #[test]
    fn attribute_show_satisfies_output() {
        assert!(apply("df.show()\n").is_empty());
    }

    #[test]
    fn nested_output_call_counts() {
        assert!(apply("def report(x):\n    print(x)\nreport(3)\n").is_empty());
    }
}
