//! # lectern-core
//!
//! Deterministic validation and advisory analysis for generated
//! micro-lessons.
//!
//! A lesson is three typed sections (concept, example, exercise) whose
//! content blocks embed short Python snippets. This crate answers:
//! - Is this lesson structurally sound and renderable?
//! - Do its minutes add up to a 15-minute session?
//! - What should a maintainer be told about its code quality?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same lesson always validates the same way
//! 2. **No execution**: all analysis in this crate is static
//! 3. **Advisory is separate**: rule outcomes and hints never block or
//!    mutate a lesson
//! 4. **Fail-fast validation**: the first hard violation is reported
//!    with a descriptive, repair-ready message
//!
//! ## Example
//!
//! ```rust,ignore
//! use lectern_core::{ContentAgent, PlannerAgent, ValidatorAgent};
//!
//! let plan = PlannerAgent.plan("list slicing", "beginner");
//! let sections = ContentAgent.generate("list slicing", &plan);
//!
//! let validator = ValidatorAgent::new();
//! let lesson = validator.validate(&sections, false)?;
//! let findings = validator.collect_rule_outcomes(&lesson);
//! ```

pub mod agents;
pub mod draft;
pub mod hints;
pub mod python;
pub mod rules;
pub mod schema;
pub mod types;
pub mod validator;

// Re-export main types at crate root
pub use agents::{ContentAgent, PlannerAgent};
pub use draft::{DraftError, LessonDraft};
pub use hints::{
    collect_hints_from_sections, doc_reference_hints, inspect_python_code, translate_outcomes,
    FetchError, SnippetFetcher,
};
pub use rules::{
    BareExpressionRule, MissingTerminalOperationRule, NoOutputRule, Rule, RuleEngine,
    SuspiciousAttributeRule,
};
pub use schema::{validate_json_only_response, SchemaError};
pub use types::{
    BlockHints, BlockOutcomes, BlockType, ContentBlock, Hint, HintSummary, PlannedSection,
    RuleOutcome, Section,
};
pub use validator::{
    ErrorCategory, ValidationError, ValidatorAgent, MAX_PYTHON_LINES, MIN_SECTION_MINUTES,
    TARGET_TOTAL_MINUTES,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_lesson_validates_end_to_end() {
        let plan = PlannerAgent.plan("dictionaries", "beginner");
        let sections = ContentAgent.generate("dictionaries", &plan);

        let validator = ValidatorAgent::new();
        let lesson = validator.validate(&sections, true).unwrap();
        assert_eq!(
            lesson.iter().map(|s| s.minutes).sum::<u32>(),
            TARGET_TOTAL_MINUTES
        );
    }

    #[test]
    fn test_advisory_path_never_blocks() {
        // A lesson that passes hard validation can still carry
        // advisory findings.
        let plan = PlannerAgent.plan("dataframes", "beginner");
        let mut sections = ContentAgent.generate("dataframes", &plan);
        sections[1].blocks[1] =
            ContentBlock::python("df.groupby('kind')\nprint('grouped')");

        let validator = ValidatorAgent::new();
        assert!(validator.validate(&sections, true).is_ok());

        let entries = validator.collect_rule_outcomes(&sections);
        assert_eq!(entries.len(), 1);
        let hints = translate_outcomes(&entries[0].outcomes);
        assert!(!hints.is_empty());
    }
}
