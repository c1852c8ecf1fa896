//! Advisory hint translation.
//!
//! Turns raw rule outcomes into human-readable hints and runs a small
//! pre-validation inspection over python blocks. Pure template
//! substitution: no new analysis happens here and nothing in this
//! module can fail a lesson.

use std::collections::HashSet;

use rustpython_parser::ast::Expr;
use thiserror::Error;
use tracing::warn;

use crate::python;
use crate::rules::no_output::has_output_call;
use crate::types::{BlockHints, BlockType, Hint, HintSummary, RuleOutcome, Section};

/// Modules the sandboxed runtime does not support.
const UNSAFE_MODULES: &[&str] = &["os", "sys", "subprocess", "socket", "shutil", "pathlib"];

/// Builtins that are discouraged in lesson snippets.
const UNSAFE_CALLS: &[&str] = &["eval", "exec", "compile", "open", "__import__"];

/// Python standard-library modules lessons are allowed to import.
/// Anything else counts as a third-party library for documentation
/// lookups.
const STDLIB_MODULES: &[&str] = &[
    "collections",
    "math",
    "random",
    "statistics",
    "time",
    "timeit",
];

/// Failure reported by a documentation snippet fetcher.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct FetchError(pub String);

/// External documentation collaborator. Implementations live outside
/// this crate; only the seam is defined here.
pub trait SnippetFetcher {
    /// Short documentation references for a library and topic.
    fn fetch_snippets(&self, library: &str, topic: &str) -> Result<Vec<String>, FetchError>;
}

/// Translate rule outcomes into human-readable hints, one per outcome,
/// preserving order.
pub fn translate_outcomes(outcomes: &[RuleOutcome]) -> Vec<Hint> {
    outcomes.iter().map(translate_outcome).collect()
}

fn translate_outcome(outcome: &RuleOutcome) -> Hint {
    let context_str = |key: &str| {
        outcome
            .context
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or("")
    };

    let message = match outcome.code.as_str() {
        "expression_result_unused" => {
            let source = context_str("expression_source");
            if source.is_empty() {
                "An expression result is computed but never shown; wrap it in print(...)."
                    .to_string()
            } else {
                format!(
                    "The result of '{}' is computed but never shown; wrap it in print(...).",
                    source
                )
            }
        }
        "missing_terminal_operation" => format!(
            "Transformation chain '{}' is never executed; finish it with a terminal \
             operation such as .collect() or .show().",
            context_str("chain")
        ),
        "suspicious_attribute" => format!(
            "Attribute '{}' is removed in current data libraries; use a supported accessor.",
            context_str("attribute")
        ),
        "no_output" => {
            "The snippet produces no visible output; add a print(...) call.".to_string()
        }
        "runtime_error" => format!(
            "The snippet raised {} at runtime: {}",
            context_str("error"),
            context_str("message")
        ),
        other => {
            warn!(code = other, "no hint template for outcome code");
            format!("Rule '{}' reported a finding.", other)
        }
    };

    Hint {
        code: outcome.code.clone(),
        message,
    }
}

/// Advisory static inspection for syntax and safety issues, usable on
/// code that has not passed hard validation yet. Hints are
/// deduplicated by `(code, message)`.
pub fn inspect_python_code(code: &str) -> Vec<Hint> {
    let mut hints: Vec<Hint> = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut add = |hints: &mut Vec<Hint>, code_id: &str, message: String| {
        if seen.insert((code_id.to_string(), message.clone())) {
            hints.push(Hint {
                code: code_id.to_string(),
                message,
            });
        }
    };

    let suite = match python::parse(code) {
        Ok(suite) => suite,
        Err(issue) => {
            let location = match (issue.line, issue.col) {
                (Some(line), Some(col)) => format!("line {}, column {}", line, col),
                _ => "unknown location".to_string(),
            };
            add(
                &mut hints,
                "syntax_error",
                format!("SyntaxError: {} ({}).", issue.message, location),
            );
            return hints;
        }
    };

    for root in python::imported_roots(&suite) {
        if UNSAFE_MODULES.contains(&root.as_str()) {
            add(
                &mut hints,
                "unsafe_import",
                format!(
                    "Import of '{}' may not be supported in the sandboxed runtime.",
                    root
                ),
            );
        }
    }

    let mut call_names: Vec<String> = Vec::new();
    python::walk_exprs(&suite, &mut |expr| {
        if let Expr::Call(call) = expr {
            if let Some(name) = python::dotted_name(&call.func) {
                call_names.push(name);
            }
        }
    });
    for name in call_names {
        if UNSAFE_CALLS.contains(&name.as_str()) {
            add(
                &mut hints,
                "unsafe_call",
                format!("Use of '{}' is discouraged in lesson snippets.", name),
            );
        }
        let root = name.split('.').next().unwrap_or(&name);
        if UNSAFE_MODULES.contains(&root) {
            add(
                &mut hints,
                "unsafe_call",
                format!(
                    "Call to '{}' may not be supported in the sandboxed runtime.",
                    name
                ),
            );
        }
    }

    if !has_output_call(&suite) {
        add(
            &mut hints,
            "no_output",
            "The snippet produces no visible output; add a print(...) call.".to_string(),
        );
    }

    hints
}

/// Inspect every python block in a lesson and group hints per
/// `(section_id, block_index)`. The summary is `None` when the lesson
/// has no python blocks at all.
pub fn collect_hints_from_sections(
    sections: &[Section],
) -> (Vec<BlockHints>, Option<HintSummary>) {
    let mut groups: Vec<BlockHints> = Vec::new();
    let mut python_blocks = 0usize;

    for section in sections {
        for (index, block) in section.blocks.iter().enumerate() {
            if block.block_type != BlockType::Python {
                continue;
            }
            python_blocks += 1;
            let hints = inspect_python_code(&block.content);
            if hints.is_empty() {
                continue;
            }
            groups.push(BlockHints {
                section_id: Some(section.id.clone()),
                block_index: Some(index),
                hints,
            });
        }
    }

    let summary = build_summary(python_blocks, &groups);
    (groups, summary)
}

/// Lesson-level documentation references for third-party imports.
///
/// Collects third-party root modules across all python blocks and asks
/// the fetcher for references on each. Failures are swallowed into a
/// `doc_lookup_error` hint. Returns `None` when the lesson imports no
/// third-party libraries or no hints were produced.
pub fn doc_reference_hints(
    sections: &[Section],
    topic: &str,
    fetcher: &dyn SnippetFetcher,
) -> Option<BlockHints> {
    let mut libraries: Vec<String> = Vec::new();
    for section in sections {
        for block in &section.blocks {
            if block.block_type != BlockType::Python {
                continue;
            }
            let Ok(suite) = python::parse(&block.content) else {
                continue;
            };
            for root in python::imported_roots(&suite) {
                if STDLIB_MODULES.contains(&root.as_str()) || libraries.contains(&root) {
                    continue;
                }
                libraries.push(root);
            }
        }
    }

    let mut hints: Vec<Hint> = Vec::new();
    for library in &libraries {
        match fetcher.fetch_snippets(library, topic) {
            Ok(snippets) => {
                for snippet in snippets {
                    hints.push(Hint {
                        code: "doc_reference".to_string(),
                        message: format!("{}: {}", library, snippet),
                    });
                }
            }
            Err(err) => {
                warn!(library = library.as_str(), error = %err, "doc lookup failed");
                hints.push(Hint {
                    code: "doc_lookup_error".to_string(),
                    message: format!("Documentation lookup for '{}' failed: {}", library, err),
                });
            }
        }
    }

    if hints.is_empty() {
        return None;
    }
    Some(BlockHints {
        section_id: None,
        block_index: None,
        hints,
    })
}

fn build_summary(python_blocks: usize, groups: &[BlockHints]) -> Option<HintSummary> {
    if python_blocks == 0 {
        return None;
    }
    Some(HintSummary {
        python_blocks,
        blocks_with_hints: groups.len(),
        total_hints: groups.iter().map(|g| g.hints.len()).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleEngine;
    use crate::types::ContentBlock;

    #[test]
    fn translates_every_engine_outcome() {
        let outcomes = RuleEngine::new().run("df.groupby('a')\n2 + 2\n");
        let hints = translate_outcomes(&outcomes);
        assert_eq!(hints.len(), outcomes.len());
        for (hint, outcome) in hints.iter().zip(&outcomes) {
            assert_eq!(hint.code, outcome.code);
            assert!(!hint.message.is_empty());
        }
    }

    #[test]
    fn terminal_hint_quotes_the_chain() {
        let outcomes = RuleEngine::new().run("df.groupby('a').select('b')\nprint('x')\n");
        let hints = translate_outcomes(&outcomes);
        let terminal = hints
            .iter()
            .find(|h| h.code == "missing_terminal_operation")
            .unwrap();
        assert!(terminal.message.contains("groupby -> select"));
    }

    #[test]
    fn unknown_code_gets_generic_message() {
        let outcome = RuleOutcome::new("brand_new_rule", serde_json::Map::new());
        let hints = translate_outcomes(&[outcome]);
        assert!(hints[0].message.contains("brand_new_rule"));
    }

    #[test]
    fn inspect_reports_syntax_error_with_location() {
        let hints = inspect_python_code("def broken(:\n  pass");
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].code, "syntax_error");
        assert!(hints[0].message.contains("line"));
    }

    #[test]
    fn inspect_flags_unsafe_import_and_call() {
        let hints = inspect_python_code("import os\nos.remove('x')\nprint('done')\n");
        let codes: Vec<&str> = hints.iter().map(|h| h.code.as_str()).collect();
        assert!(codes.contains(&"unsafe_import"));
        assert!(codes.contains(&"unsafe_call"));
    }

    #[test]
    fn inspect_flags_discouraged_builtins() {
        let hints = inspect_python_code("eval('2 + 2')\nprint('x')\n");
        assert!(hints.iter().any(|h| h.code == "unsafe_call"
            && h.message.contains("'eval'")));
    }

    #[test]
    fn inspect_deduplicates_repeated_findings() {
        let hints = inspect_python_code("eval('1')\neval('2')\nprint('x')\n");
        let unsafe_calls = hints.iter().filter(|h| h.code == "unsafe_call").count();
        assert_eq!(unsafe_calls, 1);
    }

    #[test]
    fn inspect_flags_missing_output() {
        let hints = inspect_python_code("x = 1\n");
        assert!(hints.iter().any(|h| h.code == "no_output"));
        assert!(inspect_python_code("print(1)\n").is_empty());
    }

    fn sections_with_python(contents: &[&str]) -> Vec<Section> {
        vec![Section {
            id: "example".to_string(),
            title: "Worked example".to_string(),
            minutes: 6,
            blocks: contents
                .iter()
                .map(|c| ContentBlock::python(*c))
                .collect(),
        }]
    }

    #[test]
    fn collect_groups_by_block_and_summarizes() {
        let sections = sections_with_python(&["x = 1\n", "print(1)\n"]);
        let (groups, summary) = collect_hints_from_sections(&sections);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].section_id.as_deref(), Some("example"));
        assert_eq!(groups[0].block_index, Some(0));

        let summary = summary.unwrap();
        assert_eq!(summary.python_blocks, 2);
        assert_eq!(summary.blocks_with_hints, 1);
        assert_eq!(summary.total_hints, 1);
    }

    #[test]
    fn collect_without_python_blocks_has_no_summary() {
        let sections = vec![Section {
            id: "concept".to_string(),
            title: "Core concept".to_string(),
            minutes: 5,
            blocks: vec![ContentBlock::text("A paragraph.\n\n- item")],
        }];
        let (groups, summary) = collect_hints_from_sections(&sections);
        assert!(groups.is_empty());
        assert!(summary.is_none());
    }

    struct FakeFetcher {
        fail: bool,
    }

    impl SnippetFetcher for FakeFetcher {
        fn fetch_snippets(&self, library: &str, _topic: &str) -> Result<Vec<String>, FetchError> {
            if self.fail {
                Err(FetchError("connection refused".to_string()))
            } else {
                Ok(vec![format!("{} quickstart", library)])
            }
        }
    }

    #[test]
    fn doc_references_are_lesson_level() {
        let sections =
            sections_with_python(&["import pandas as pd\nprint(pd.DataFrame({'a': [1]}))\n"]);
        let group = doc_reference_hints(&sections, "dataframes", &FakeFetcher { fail: false })
            .unwrap();
        assert_eq!(group.section_id, None);
        assert_eq!(group.block_index, None);
        assert_eq!(group.hints[0].code, "doc_reference");
        assert!(group.hints[0].message.starts_with("pandas:"));
    }

    #[test]
    fn doc_lookup_failure_becomes_a_hint() {
        let sections =
            sections_with_python(&["import numpy as np\nprint(np.zeros(3))\n"]);
        let group =
            doc_reference_hints(&sections, "arrays", &FakeFetcher { fail: true }).unwrap();
        assert_eq!(group.hints.len(), 1);
        assert_eq!(group.hints[0].code, "doc_lookup_error");
    }

    #[test]
    fn stdlib_imports_trigger_no_doc_lookup() {
        let sections = sections_with_python(&["import math\nprint(math.pi)\n"]);
        assert!(doc_reference_hints(&sections, "math", &FakeFetcher { fail: false }).is_none());
    }
}
