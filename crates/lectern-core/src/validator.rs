//! Validator agent for lesson structure and content rules.
//!
//! This is the single gate a candidate lesson must pass before being
//! returned to a caller. All checks are fail-fast: the first violation
//! is reported and nothing else runs. The advisory path
//! ([`ValidatorAgent::collect_rule_outcomes`]) is separate and never
//! blocks or mutates the lesson.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::python;
use crate::rules::RuleEngine;
use crate::types::{BlockOutcomes, BlockType, ContentBlock, Section};

/// Fixed lesson duration in minutes.
pub const TARGET_TOTAL_MINUTES: u32 = 15;
/// Per-section duration floor.
pub const MIN_SECTION_MINUTES: u32 = 3;
pub const MIN_SECTION_COUNT: usize = 1;
pub const MAX_SECTION_COUNT: usize = 3;
/// Python blocks longer than this are rejected outright.
pub const MAX_PYTHON_LINES: usize = 30;
/// Textual token every python block must contain to produce output.
pub const OUTPUT_CALL_TOKEN: &str = "print(";
/// Rendering delimiter that must never leak into source content.
pub const EXERCISE_DELIMITER: &str = ":::exercise:::";
const CODE_FENCE: &str = "```";
/// Every lesson must provide exactly these section ids.
pub const REQUIRED_SECTION_IDS: [&str; 3] = ["concept", "example", "exercise"];

/// Self-containment table: if the usage substring appears in a python
/// block, one of the accepted import forms must appear too.
const IMPORT_RULES: &[(&str, &[&str])] = &[
    ("pd.", &["import pandas as pd", "from pandas import"]),
    ("np.", &["import numpy as np", "from numpy import"]),
    ("plt.", &["import matplotlib.pyplot as plt", "from matplotlib import"]),
    ("timeit.", &["import timeit", "from timeit import"]),
    ("time.", &["import time", "from time import"]),
    ("math.", &["import math", "from math import"]),
    ("statistics.", &["import statistics", "from statistics import"]),
    ("random.", &["import random", "from random import"]),
    ("Counter(", &["from collections import", "import collections"]),
    ("defaultdict(", &["from collections import", "import collections"]),
];

lazy_static! {
    /// Blank-line-separated paragraph boundary.
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n[ \t]*\n").unwrap();
    /// Bullet list marker at the start of a line.
    static ref BULLET_ITEM: Regex = Regex::new(r"(?m)^\s*[-*]\s+\S").unwrap();
    /// Numbered list marker at the start of a line.
    static ref NUMBERED_ITEM: Regex = Regex::new(r"(?m)^\s*\d+\.\s+\S").unwrap();
}

/// Broad failure class, used by retry policies to pick a remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Lesson shape is wrong: regenerate the whole lesson.
    Structural,
    /// One block is wrong: ask the generator to fix that block.
    Content,
}

/// Hard validation failures. Messages are specific enough to drive an
/// automated repair loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Lesson must include at least one section.")]
    EmptyLesson,

    #[error("Lesson must have between {min} and {max} sections (found {found}).")]
    SectionCount { found: usize, min: usize, max: usize },

    #[error("Section IDs must be unique (duplicate '{id}').")]
    DuplicateSectionId { id: String },

    #[error("Unknown section id '{id}'; allowed ids are concept, example, exercise.")]
    UnknownSectionId { id: String },

    #[error("Lesson must contain exactly the sections {{concept, example, exercise}}; missing '{missing}'.")]
    MissingRequiredSection { missing: String },

    #[error("Section '{id}' minutes must be at least {min} (found {minutes}).")]
    SectionTooShort { id: String, minutes: u32, min: u32 },

    #[error("Section '{id}' must include at least one content block.")]
    EmptySection { id: String },

    #[error("Lesson must include at least one python block.")]
    NoPythonBlock,

    #[error("Lesson minutes must total exactly {target} (found {total}).")]
    StrictMinutes { total: u32, target: u32 },

    #[error("Minimum section length exceeds total lesson time.")]
    InfeasibleRebalance,

    #[error("Block content must be non-empty (section '{section}', block {index}).")]
    EmptyBlock { section: String, index: usize },

    #[error("Block content must not contain the exercise delimiter (section '{section}', block {index}).")]
    ForbiddenDelimiter { section: String, index: usize },

    #[error("Python block has invalid syntax (section '{section}', block {index}): {message}")]
    PythonSyntax {
        section: String,
        index: usize,
        message: String,
    },

    #[error("Python block exceeds {max} non-blank lines (section '{section}', block {index}, found {lines}).")]
    PythonTooLong {
        section: String,
        index: usize,
        lines: usize,
        max: usize,
    },

    #[error("Python block must produce visible output via print(...) (section '{section}', block {index}).")]
    NoVisibleOutput { section: String, index: usize },

    #[error("Python block uses '{symbol}' without a matching import (section '{section}', block {index}).")]
    MissingImport {
        section: String,
        index: usize,
        symbol: String,
    },

    #[error("Exercise block must be plain prose without code fences or delimiters (section '{section}', block {index}).")]
    ExerciseNotProse { section: String, index: usize },

    #[error("Text block must contain a blank-line-separated paragraph and a bullet or numbered list (section '{section}', block {index}).")]
    TextMissingList { section: String, index: usize },
}

impl ValidationError {
    /// Structural errors call for regenerating the lesson; content
    /// errors point at one block.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ValidationError::EmptyLesson
            | ValidationError::SectionCount { .. }
            | ValidationError::DuplicateSectionId { .. }
            | ValidationError::UnknownSectionId { .. }
            | ValidationError::MissingRequiredSection { .. }
            | ValidationError::SectionTooShort { .. }
            | ValidationError::EmptySection { .. }
            | ValidationError::NoPythonBlock
            | ValidationError::StrictMinutes { .. }
            | ValidationError::InfeasibleRebalance => ErrorCategory::Structural,
            _ => ErrorCategory::Content,
        }
    }
}

/// Validates a generated lesson before it is returned.
pub struct ValidatorAgent {
    engine: RuleEngine,
}

impl ValidatorAgent {
    pub fn new() -> Self {
        Self {
            engine: RuleEngine::new(),
        }
    }

    /// Validate sections and normalize minutes to the target total.
    ///
    /// With `strict_minutes` set, a total that is not exactly the
    /// target fails instead of being rebalanced.
    pub fn validate(
        &self,
        sections: &[Section],
        strict_minutes: bool,
    ) -> Result<Vec<Section>, ValidationError> {
        if sections.is_empty() {
            return Err(ValidationError::EmptyLesson);
        }

        if sections.len() < MIN_SECTION_COUNT || sections.len() > MAX_SECTION_COUNT {
            return Err(ValidationError::SectionCount {
                found: sections.len(),
                min: MIN_SECTION_COUNT,
                max: MAX_SECTION_COUNT,
            });
        }

        let mut seen_ids: Vec<&str> = Vec::new();
        for section in sections {
            if seen_ids.contains(&section.id.as_str()) {
                return Err(ValidationError::DuplicateSectionId {
                    id: section.id.clone(),
                });
            }
            seen_ids.push(&section.id);
        }

        for section in sections {
            if !REQUIRED_SECTION_IDS.contains(&section.id.as_str()) {
                return Err(ValidationError::UnknownSectionId {
                    id: section.id.clone(),
                });
            }
        }

        // Exact match: all three required ids, no more, no duplicates.
        for required in REQUIRED_SECTION_IDS {
            if !seen_ids.contains(&required) {
                return Err(ValidationError::MissingRequiredSection {
                    missing: required.to_string(),
                });
            }
        }

        let mut has_python_block = false;
        for section in sections {
            if section.minutes < MIN_SECTION_MINUTES {
                return Err(ValidationError::SectionTooShort {
                    id: section.id.clone(),
                    minutes: section.minutes,
                    min: MIN_SECTION_MINUTES,
                });
            }
            if section.blocks.is_empty() {
                return Err(ValidationError::EmptySection {
                    id: section.id.clone(),
                });
            }
            for (index, block) in section.blocks.iter().enumerate() {
                validate_block(&section.id, index, block)?;
                if block.block_type == BlockType::Python {
                    has_python_block = true;
                }
            }
        }

        if !has_python_block {
            return Err(ValidationError::NoPythonBlock);
        }

        let total: u32 = sections.iter().map(|s| s.minutes).sum();
        if strict_minutes && total != TARGET_TOTAL_MINUTES {
            return Err(ValidationError::StrictMinutes {
                total,
                target: TARGET_TOTAL_MINUTES,
            });
        }
        if total == TARGET_TOTAL_MINUTES {
            return Ok(sections.to_vec());
        }

        // Ensure the minimum minutes constraint is feasible before scaling.
        if MIN_SECTION_MINUTES as usize * sections.len() > TARGET_TOTAL_MINUTES as usize {
            return Err(ValidationError::InfeasibleRebalance);
        }

        rebalance(sections, total)
    }

    /// Run the static rule engine over every python block, in
    /// section-then-block order. Advisory only: never errors, never
    /// alters the lesson. Blocks with no findings are skipped.
    pub fn collect_rule_outcomes(&self, sections: &[Section]) -> Vec<BlockOutcomes> {
        let mut entries = Vec::new();

        for section in sections {
            for (index, block) in section.blocks.iter().enumerate() {
                if block.block_type != BlockType::Python {
                    continue;
                }
                let outcomes = self.engine.run(&block.content);
                if outcomes.is_empty() {
                    continue;
                }
                entries.push(BlockOutcomes {
                    section_id: section.id.clone(),
                    block_index: index,
                    outcomes,
                });
            }
        }

        entries
    }
}

impl Default for ValidatorAgent {
    fn default() -> Self {
        Self::new()
    }
}

/// Proportional redistribution of minutes to hit the target total.
/// Every section except the last is scaled and floored; the last one
/// absorbs all rounding drift to force an exact total.
fn rebalance(sections: &[Section], total: u32) -> Result<Vec<Section>, ValidationError> {
    let factor = TARGET_TOTAL_MINUTES as f64 / total as f64;

    let mut adjusted = Vec::with_capacity(sections.len());
    let mut accumulated: u32 = 0;

    for (i, section) in sections.iter().enumerate() {
        let minutes = if i == sections.len() - 1 {
            let remaining = TARGET_TOTAL_MINUTES as i64 - accumulated as i64;
            if remaining < MIN_SECTION_MINUTES as i64 {
                return Err(ValidationError::InfeasibleRebalance);
            }
            remaining as u32
        } else {
            let scaled = (section.minutes as f64 * factor).round() as u32;
            let scaled = scaled.max(MIN_SECTION_MINUTES);
            accumulated += scaled;
            scaled
        };
        adjusted.push(section.with_minutes(minutes));
    }

    Ok(adjusted)
}

fn validate_block(
    section_id: &str,
    index: usize,
    block: &ContentBlock,
) -> Result<(), ValidationError> {
    let section = section_id.to_string();

    if block.content.trim().is_empty() {
        return Err(ValidationError::EmptyBlock { section, index });
    }

    // Rendering syntax must never leak into source content.
    if block.content.contains(EXERCISE_DELIMITER) {
        return Err(ValidationError::ForbiddenDelimiter { section, index });
    }

    match block.block_type {
        BlockType::Python => validate_python_block(section, index, &block.content),
        BlockType::Exercise => {
            if block.content.contains(CODE_FENCE) {
                return Err(ValidationError::ExerciseNotProse { section, index });
            }
            Ok(())
        }
        BlockType::Text => {
            let has_paragraph = PARAGRAPH_BREAK.is_match(&block.content);
            let has_list =
                BULLET_ITEM.is_match(&block.content) || NUMBERED_ITEM.is_match(&block.content);
            if !has_paragraph || !has_list {
                return Err(ValidationError::TextMissingList { section, index });
            }
            Ok(())
        }
    }
}

fn validate_python_block(
    section: String,
    index: usize,
    content: &str,
) -> Result<(), ValidationError> {
    if let Err(issue) = python::parse(content) {
        return Err(ValidationError::PythonSyntax {
            section,
            index,
            message: issue.to_string(),
        });
    }

    let lines = content.lines().filter(|l| !l.trim().is_empty()).count();
    if lines > MAX_PYTHON_LINES {
        return Err(ValidationError::PythonTooLong {
            section,
            index,
            lines,
            max: MAX_PYTHON_LINES,
        });
    }

    if !content.contains(OUTPUT_CALL_TOKEN) {
        return Err(ValidationError::NoVisibleOutput { section, index });
    }

    // Self-containment: each python block must be independently
    // runnable without assuming imports from other blocks.
    for (usage, import_forms) in IMPORT_RULES {
        if !content.contains(usage) {
            continue;
        }
        if !import_forms.iter().any(|form| content.contains(form)) {
            return Err(ValidationError::MissingImport {
                section,
                index,
                symbol: (*usage).to_string(),
            });
        }
    }

    Ok(())
}
