//! Shared data model for lessons, advisory outcomes, and hints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Closed enumeration of block types. Extending it requires a matching
/// validator and rule update, so unknown types are rejected at the
/// deserialization boundary rather than coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Python,
    Exercise,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Python => "python",
            BlockType::Exercise => "exercise",
        }
    }
}

/// Atomic unit of lesson content. Created by the content generator and
/// read-only from then on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: String,
}

impl ContentBlock {
    pub fn new(block_type: BlockType, content: impl Into<String>) -> Self {
        Self {
            block_type,
            content: content.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(BlockType::Text, content)
    }

    pub fn python(content: impl Into<String>) -> Self {
        Self::new(BlockType::Python, content)
    }

    pub fn exercise(content: impl Into<String>) -> Self {
        Self::new(BlockType::Exercise, content)
    }
}

/// Planned section outline from the planner agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSection {
    pub id: String,
    pub title: String,
    pub minutes: u32,
}

/// Generated section with structured content blocks.
///
/// Sections are never mutated after construction; rebalancing produces
/// new `Section` values with recomputed minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub minutes: u32,
    pub blocks: Vec<ContentBlock>,
}

impl Section {
    /// Copy of this section with different minutes (same id/title/blocks).
    pub fn with_minutes(&self, minutes: u32) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            minutes,
            blocks: self.blocks.clone(),
        }
    }
}

/// One advisory finding from the rule engine or the smoke tester.
///
/// Identity for deduplication is `(code, line, col, context)` with the
/// context compared in canonical sorted-key JSON form. `serde_json`'s
/// default map is ordered by key, so equality here is already
/// order-independent for mappings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub code: String,
    pub context: Map<String, Value>,
    pub line: Option<u32>,
    pub col: Option<u32>,
}

impl RuleOutcome {
    pub fn new(code: impl Into<String>, context: Map<String, Value>) -> Self {
        Self {
            code: code.into(),
            context,
            line: None,
            col: None,
        }
    }

    pub fn at(mut self, line: Option<u32>, col: Option<u32>) -> Self {
        self.line = line;
        self.col = col;
        self
    }
}

/// Advisory outcomes for one python block, keyed by its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockOutcomes {
    pub section_id: String,
    pub block_index: usize,
    pub outcomes: Vec<RuleOutcome>,
}

/// Human-readable advisory hint. Strictly observational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub code: String,
    pub message: String,
}

impl Hint {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Hints grouped per block. `section_id = None` marks a lesson-level
/// group that is not scoped to any block (e.g. documentation
/// references for third-party imports).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHints {
    pub section_id: Option<String>,
    pub block_index: Option<usize>,
    pub hints: Vec<Hint>,
}

/// Aggregate hint counts for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintSummary {
    pub python_blocks: usize,
    pub blocks_with_hints: usize,
    pub total_hints: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_type_serializes_lowercase() {
        let block = ContentBlock::python("print(1)");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "python");
        assert_eq!(json["content"], "print(1)");
    }

    #[test]
    fn unknown_block_type_is_rejected() {
        let raw = r#"{"type": "video", "content": "clip.mp4"}"#;
        let parsed: Result<ContentBlock, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn section_with_minutes_preserves_identity() {
        let section = Section {
            id: "concept".to_string(),
            title: "Core concept".to_string(),
            minutes: 5,
            blocks: vec![ContentBlock::text("Intro")],
        };
        let adjusted = section.with_minutes(7);
        assert_eq!(adjusted.id, section.id);
        assert_eq!(adjusted.blocks, section.blocks);
        assert_eq!(adjusted.minutes, 7);
    }

    #[test]
    fn rule_outcome_roundtrips_through_json() {
        let mut context = Map::new();
        context.insert("attribute".to_string(), Value::from("ix"));
        let outcome = RuleOutcome::new("suspicious_attribute", context).at(Some(2), Some(0));
        let json = serde_json::to_string(&outcome).unwrap();
        let back: RuleOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome);
    }
}
