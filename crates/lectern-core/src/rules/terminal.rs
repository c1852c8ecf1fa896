//! Missing-terminal-operation rule
//!
//! **Question**: does a transformation chain ever execute?
//!
//! Flags top-level expression statements built from attribute/call
//! chains that contain a transform method (`groupby`, `select`, ...)
//! but no terminal method (`collect`, `show`, `sum`, ...) anywhere in
//! the chain. Method names are compared case-insensitively.

use rustpython_parser::ast::Stmt;
use serde_json::{Map, Value};

use crate::python;
use crate::types::RuleOutcome;

use super::{is_output_call, Rule, INTENT_ADD_EXECUTION_STEP, TERMINAL_METHODS, TRANSFORM_METHODS};

pub struct MissingTerminalOperationRule;

impl Rule for MissingTerminalOperationRule {
    fn code(&self) -> &'static str {
        "missing_terminal_operation"
    }

    fn apply(&self, suite: &[Stmt], source: &str) -> Vec<RuleOutcome> {
        let mut outcomes = Vec::new();

        for stmt in suite {
            let Stmt::Expr(expr_stmt) = stmt else {
                continue;
            };
            if is_output_call(&expr_stmt.value) {
                continue;
            }

            let methods = python::attribute_chain(&expr_stmt.value);
            if methods.is_empty() {
                continue;
            }

            let lowered: Vec<String> = methods.iter().map(|m| m.to_lowercase()).collect();
            let has_transform = lowered
                .iter()
                .any(|m| TRANSFORM_METHODS.contains(&m.as_str()));
            let has_terminal = lowered
                .iter()
                .any(|m| TERMINAL_METHODS.contains(&m.as_str()));

            if has_transform && !has_terminal {
                let mut context = Map::new();
                context.insert("chain".to_string(), Value::from(methods.join(" -> ")));
                context.insert(
                    "correction_intent".to_string(),
                    Value::from(INTENT_ADD_EXECUTION_STEP),
                );

                let (line, col) = python::location(source, &*expr_stmt.value);
                outcomes.push(RuleOutcome::new(self.code(), context).at(line, col));
            }
        }

        outcomes
    }
}
