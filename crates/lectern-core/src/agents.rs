//! Deterministic planner and content agents.
//!
//! This is the non-LLM generation path: a fixed outline per level and
//! template content per section. The output always satisfies hard
//! validation, so it doubles as the demo/static lesson source.

use crate::types::{ContentBlock, PlannedSection, Section};

/// Produces a deterministic lesson outline.
pub struct PlannerAgent;

impl PlannerAgent {
    /// Three-section outline for the topic at the given level.
    /// Intermediate lessons spend more time on the worked example.
    pub fn plan(&self, _topic: &str, level: &str) -> Vec<PlannedSection> {
        let (concept, example, exercise) = if level == "intermediate" {
            (4, 7, 4)
        } else {
            (5, 6, 4)
        };

        vec![
            PlannedSection {
                id: "concept".to_string(),
                title: "Core concept".to_string(),
                minutes: concept,
            },
            PlannedSection {
                id: "example".to_string(),
                title: "Worked example".to_string(),
                minutes: example,
            },
            PlannedSection {
                id: "exercise".to_string(),
                title: "Practice exercise".to_string(),
                minutes: exercise,
            },
        ]
    }
}

/// Expands a lesson outline into content blocks.
pub struct ContentAgent;

impl ContentAgent {
    /// Populate each planned section with template blocks for the
    /// topic.
    pub fn generate(&self, topic: &str, planned: &[PlannedSection]) -> Vec<Section> {
        planned
            .iter()
            .map(|section| Section {
                id: section.id.clone(),
                title: section.title.clone(),
                minutes: section.minutes,
                blocks: blocks_for(&section.id, topic),
            })
            .collect()
    }
}

fn blocks_for(section_id: &str, topic: &str) -> Vec<ContentBlock> {
    match section_id {
        "concept" => vec![ContentBlock::text(format!(
            "This section explains the core idea behind {topic}.\n\n\
             - what the concept is for\n\
             - when to reach for it\n\
             - one common mistake to avoid"
        ))],
        "example" => vec![
            ContentBlock::text(format!(
                "A short worked example of {topic} in practice.\n\n\
                 - read the code before running it\n\
                 - predict the output"
            )),
            ContentBlock::python(
                "values = [3, 1, 4, 1, 5]\n\
                 total = sum(values)\n\
                 print(f\"sum of {values} is {total}\")",
            ),
        ],
        _ => vec![ContentBlock::exercise(format!(
            "Apply {topic} yourself: write a short snippet that computes a result \
             and prints it, then explain each line in one sentence."
        ))],
    }
}
