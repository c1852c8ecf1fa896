//! Advisory rule engine for embedded Python snippets.
//!
//! All rules are advisory: they never raise, never block validation,
//! and never execute code. A snippet that fails to parse produces an
//! empty outcome list; the syntax error is a hard validation concern
//! owned by the caller, not this engine.

mod bare_expression;
pub(crate) mod no_output;
mod suspicious;
mod terminal;

pub use bare_expression::BareExpressionRule;
pub use no_output::NoOutputRule;
pub use suspicious::SuspiciousAttributeRule;
pub use terminal::MissingTerminalOperationRule;

use std::collections::HashSet;

use rustpython_parser::ast::{Expr, Stmt};
use serde_json::Value;

use crate::python;
use crate::types::RuleOutcome;

/// Functions that produce visible output in the execution environment.
pub const OUTPUT_CALLS: &[&str] = &["print", "display", "show"];

/// Deprecated / suspicious attributes seen across common data libraries.
pub(crate) const SUSPICIOUS_ATTRS: &[&str] =
    &["ix", "as_matrix", "get_value", "set_value", "iteritems"];

/// Methods typically used to transform data but not execute it.
pub(crate) const TRANSFORM_METHODS: &[&str] = &[
    "groupby",
    "select",
    "filter",
    "where",
    "join",
    "withcolumn",
    "map",
    "apply",
];

/// Methods that trigger execution or materialization, including
/// aggregations that end a chain.
pub(crate) const TERMINAL_METHODS: &[&str] = &[
    "collect",
    "execute",
    "fetchall",
    "fetchone",
    "show",
    "to_pandas",
    "topandas",
    "to_csv",
    "to_parquet",
    "agg",
    "aggregate",
    "count",
    "fit",
    "mean",
    "predict",
    "sum",
];

pub(crate) const INTENT_ADD_VISIBLE_OUTPUT: &str = "add_visible_output";
pub(crate) const INTENT_ADD_EXECUTION_STEP: &str = "add_execution_step";

/// One advisory rule with a stable outcome code.
pub trait Rule: Send + Sync {
    fn code(&self) -> &'static str;

    /// Inspect the parsed tree and the original source, returning any
    /// findings. Must not panic on any syntactically valid input.
    fn apply(&self, suite: &[Stmt], source: &str) -> Vec<RuleOutcome>;
}

/// Applies an ordered set of advisory rules to Python source code.
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    /// Engine with the default rule set.
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Engine with a caller-supplied rule set, applied in order.
    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Run every rule over the snippet.
    ///
    /// Returns an empty list when the snippet does not parse; never
    /// returns an error and never executes the snippet.
    pub fn run(&self, code: &str) -> Vec<RuleOutcome> {
        let suite = match python::parse(code) {
            Ok(suite) => suite,
            Err(issue) => {
                // Hard validation already failed upstream.
                tracing::debug!(error = %issue, "snippet failed to parse, skipping rules");
                return Vec::new();
            }
        };

        let mut outcomes: Vec<RuleOutcome> = Vec::new();
        for rule in &self.rules {
            outcomes.extend(rule.apply(&suite, code));
        }

        let outcomes = attach_correction_suggestions(outcomes);
        let outcomes = apply_precedence(outcomes);
        dedupe_outcomes(outcomes)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(BareExpressionRule),
        Box::new(MissingTerminalOperationRule),
        Box::new(NoOutputRule),
        Box::new(SuspiciousAttributeRule),
    ]
}

/// True when the expression is a call to a recognized output function,
/// either as a bare name (`print(x)`) or an attribute (`obj.show()`).
pub(crate) fn is_output_call(expr: &Expr) -> bool {
    let Expr::Call(call) = expr else {
        return false;
    };
    match python::call_func_name(&call.func) {
        Some(name) => OUTPUT_CALLS.contains(&name),
        None => false,
    }
}

/// Purely additive enrichment: outcomes that ask for visible output and
/// carry an extractable expression gain a ready-made `print(...)`
/// suggestion.
fn attach_correction_suggestions(outcomes: Vec<RuleOutcome>) -> Vec<RuleOutcome> {
    outcomes
        .into_iter()
        .map(|mut outcome| {
            let intent = outcome
                .context
                .get("correction_intent")
                .and_then(Value::as_str);
            if intent != Some(INTENT_ADD_VISIBLE_OUTPUT) {
                return outcome;
            }
            let expression = outcome
                .context
                .get("expression_source")
                .and_then(Value::as_str)
                .unwrap_or("");
            if expression.is_empty() {
                return outcome;
            }
            let suggestion = serde_json::json!([{
                "intent": INTENT_ADD_VISIBLE_OUTPUT,
                "suggested_code": format!("print({expression})"),
            }]);
            outcome
                .context
                .insert("correction_suggestions".to_string(), suggestion);
            outcome
        })
        .collect()
}

/// Suppress lower-value hints when higher-value ones fire on the same
/// line: the terminal-operation hint is strictly more actionable than
/// the generic unused-expression hint.
fn apply_precedence(outcomes: Vec<RuleOutcome>) -> Vec<RuleOutcome> {
    let suppress_lines: HashSet<u32> = outcomes
        .iter()
        .filter(|o| o.code == MissingTerminalOperationRule.code())
        .filter_map(|o| o.line)
        .collect();

    if suppress_lines.is_empty() {
        return outcomes;
    }

    outcomes
        .into_iter()
        .filter(|o| {
            !(o.code == BareExpressionRule.code()
                && o.line.is_some_and(|line| suppress_lines.contains(&line)))
        })
        .collect()
}

/// Collapse outcomes with identical `(code, line, col, context)`. The
/// context map is key-ordered, so its JSON form is canonical.
fn dedupe_outcomes(outcomes: Vec<RuleOutcome>) -> Vec<RuleOutcome> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut deduped = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        let key = serde_json::to_string(&outcome).unwrap_or_default();
        if seen.insert(key) {
            deduped.push(outcome);
        }
    }

    deduped
}
