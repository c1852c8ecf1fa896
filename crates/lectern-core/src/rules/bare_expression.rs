//! Bare-expression rule
//!
//! **Question**: is an expression's result silently discarded?
//!
//! Flags top-level expression statements whose value is neither used
//! nor shown: not the module docstring and not a call to a recognized
//! output function.

use rustpython_parser::ast::Stmt;
use serde_json::{Map, Value};

use crate::python;
use crate::types::RuleOutcome;

use super::{is_output_call, Rule, INTENT_ADD_VISIBLE_OUTPUT};

pub struct BareExpressionRule;

impl Rule for BareExpressionRule {
    fn code(&self) -> &'static str {
        "expression_result_unused"
    }

    fn apply(&self, suite: &[Stmt], source: &str) -> Vec<RuleOutcome> {
        let mut outcomes = Vec::new();

        for (index, stmt) in suite.iter().enumerate() {
            let Stmt::Expr(expr_stmt) = stmt else {
                continue;
            };
            if python::is_docstring(stmt, index) {
                continue;
            }
            if is_output_call(&expr_stmt.value) {
                continue;
            }

            let expression_source = python::segment(source, &*expr_stmt.value)
                .unwrap_or("")
                .trim()
                .to_string();

            let mut context = Map::new();
            context.insert(
                "node_type".to_string(),
                Value::from(node_type_name(&expr_stmt.value)),
            );
            context.insert(
                "expression_source".to_string(),
                Value::from(expression_source),
            );
            context.insert(
                "correction_intent".to_string(),
                Value::from(INTENT_ADD_VISIBLE_OUTPUT),
            );

            let (line, col) = python::location(source, &*expr_stmt.value);
            outcomes.push(RuleOutcome::new(self.code(), context).at(line, col));
        }

        outcomes
    }
}

/// Stable node-kind name for the outcome context.
fn node_type_name(expr: &rustpython_parser::ast::Expr) -> &'static str {
    use rustpython_parser::ast::Expr;
    match expr {
        Expr::BoolOp(_) => "BoolOp",
        Expr::NamedExpr(_) => "NamedExpr",
        Expr::BinOp(_) => "BinOp",
        Expr::UnaryOp(_) => "UnaryOp",
        Expr::Lambda(_) => "Lambda",
        Expr::IfExp(_) => "IfExp",
        Expr::Dict(_) => "Dict",
        Expr::Set(_) => "Set",
        Expr::ListComp(_) => "ListComp",
        Expr::SetComp(_) => "SetComp",
        Expr::DictComp(_) => "DictComp",
        Expr::GeneratorExp(_) => "GeneratorExp",
        Expr::Await(_) => "Await",
        Expr::Yield(_) => "Yield",
        Expr::YieldFrom(_) => "YieldFrom",
        Expr::Compare(_) => "Compare",
        Expr::Call(_) => "Call",
        Expr::FormattedValue(_) => "FormattedValue",
        Expr::JoinedStr(_) => "JoinedStr",
        Expr::Constant(_) => "Constant",
        Expr::Attribute(_) => "Attribute",
        Expr::Subscript(_) => "Subscript",
        Expr::Starred(_) => "Starred",
        Expr::Name(_) => "Name",
        Expr::List(_) => "List",
        Expr::Tuple(_) => "Tuple",
        Expr::Slice(_) => "Slice",
        #[allow(unreachable_patterns)]
        _ => "Expr",
    }
}
