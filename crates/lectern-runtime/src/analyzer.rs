//! Lesson-level advisory analysis.
//!
//! Combines the static rule engine with the optional runtime smoke
//! test and translates the findings for the telemetry sink. A panic in
//! any rule is contained to the block that triggered it.

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use lectern_core::hints::translate_outcomes;
use lectern_core::rules::RuleEngine;
use lectern_core::types::{BlockHints, BlockOutcomes, BlockType, HintSummary, Section};

use crate::config::SandboxConfig;
use crate::sandbox::RuntimeSmokeTester;

/// Advisory analysis of one lesson, ready for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Raw findings per python block, smoke-test results included.
    pub outcomes: Vec<BlockOutcomes>,

    /// Human-readable translation of the findings, same grouping.
    pub hints: Vec<BlockHints>,

    /// Aggregate counts; `None` when the lesson has no python blocks.
    pub summary: Option<HintSummary>,

    pub analyzed_at: DateTime<Utc>,
}

/// Runs the full advisory pipeline over a lesson.
pub struct LessonAnalyzer {
    engine: RuleEngine,
    smoke: RuntimeSmokeTester,
}

impl LessonAnalyzer {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            engine: RuleEngine::new(),
            smoke: RuntimeSmokeTester::new(config),
        }
    }

    pub fn from_env() -> Self {
        Self::new(SandboxConfig::from_env())
    }

    /// Collect advisory findings for every python block, in
    /// section-then-block order. Static findings come first within a
    /// block, followed by the smoke-test outcome when enabled. Blocks
    /// with no findings produce no entry.
    pub async fn collect_rule_outcomes(&self, sections: &[Section]) -> Vec<BlockOutcomes> {
        let mut entries = Vec::new();

        for section in sections {
            for (index, block) in section.blocks.iter().enumerate() {
                if block.block_type != BlockType::Python {
                    continue;
                }
                if block.content.trim().is_empty() {
                    continue;
                }

                let mut outcomes =
                    match catch_unwind(AssertUnwindSafe(|| self.engine.run(&block.content))) {
                        Ok(outcomes) => outcomes,
                        Err(_) => {
                            warn!(
                                section = section.id.as_str(),
                                block = index,
                                "rule engine panicked on block, continuing with remaining blocks"
                            );
                            Vec::new()
                        }
                    };

                if let Some(outcome) = self.smoke.run(&block.content).await {
                    outcomes.push(outcome);
                }

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

    /// Full advisory report: findings, their translations and an
    /// aggregate summary.
    pub async fn analyze(&self, sections: &[Section]) -> AnalysisReport {
        let outcomes = self.collect_rule_outcomes(sections).await;

        let hints: Vec<BlockHints> = outcomes
            .iter()
            .map(|entry| BlockHints {
                section_id: Some(entry.section_id.clone()),
                block_index: Some(entry.block_index),
                hints: translate_outcomes(&entry.outcomes),
            })
            .collect();

        let python_blocks = sections
            .iter()
            .flat_map(|s| &s.blocks)
            .filter(|b| b.block_type == BlockType::Python)
            .count();
        let summary = if python_blocks == 0 {
            None
        } else {
            Some(HintSummary {
                python_blocks,
                blocks_with_hints: hints.len(),
                total_hints: hints.iter().map(|g| g.hints.len()).sum(),
            })
        };

        AnalysisReport {
            outcomes,
            hints,
            summary,
            analyzed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::types::ContentBlock;

    fn analyzer() -> LessonAnalyzer {
        // Smoke testing stays off so these tests never need an
        // interpreter on PATH.
        LessonAnalyzer::new(SandboxConfig::default())
    }

    fn lesson(blocks: Vec<ContentBlock>) -> Vec<Section> {
        vec![
            Section {
                id: "concept".to_string(),
                title: "Core concept".to_string(),
                minutes: 5,
                blocks: vec![ContentBlock::text("One idea.\n\n- a point")],
            },
            Section {
                id: "example".to_string(),
                title: "Worked example".to_string(),
                minutes: 6,
                blocks,
            },
        ]
    }

    #[tokio::test]
    async fn findings_are_grouped_per_block() {
        let sections = lesson(vec![
            ContentBlock::python("print('fine')\n"),
            ContentBlock::python("df.groupby('a')\nprint('x')\n"),
        ]);
        let entries = analyzer().collect_rule_outcomes(&sections).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].section_id, "example");
        assert_eq!(entries[0].block_index, 1);
    }

    #[tokio::test]
    async fn empty_python_blocks_are_skipped() {
        let sections = lesson(vec![ContentBlock::python("   \n")]);
        let entries = analyzer().collect_rule_outcomes(&sections).await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn report_translates_findings_and_counts_blocks() {
        let sections = lesson(vec![
            ContentBlock::python("2 + 2\n"),
            ContentBlock::python("print('ok')\n"),
        ]);
        let report = analyzer().analyze(&sections).await;

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.hints.len(), 1);
        assert_eq!(
            report.hints[0].hints.len(),
            report.outcomes[0].outcomes.len()
        );

        let summary = report.summary.unwrap();
        assert_eq!(summary.python_blocks, 2);
        assert_eq!(summary.blocks_with_hints, 1);
    }

    #[tokio::test]
    async fn lesson_without_python_has_no_summary() {
        let report = analyzer().analyze(&lesson(vec![])).await;
        assert!(report.outcomes.is_empty());
        assert!(report.summary.is_none());
    }

    #[tokio::test]
    async fn report_serializes_to_json() {
        let sections = lesson(vec![ContentBlock::python("2 + 2\n")]);
        let report = analyzer().analyze(&sections).await;
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["analyzed_at"].is_string());
        assert_eq!(json["outcomes"][0]["section_id"], "example");
    }
}
