//! Lesson draft parsing from generator output.
//!
//! A draft is the typed form of a generator response. Parsing always
//! goes through the strict JSON Schema gate first, so typed
//! deserialization only ever sees shapes the schema admits.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema;
use crate::types::Section;

lazy_static! {
    /// Fenced code block wrapping a JSON payload, with optional
    /// `json` language tag.
    static ref JSON_FENCE: Regex =
        Regex::new(r"(?s)^\s*```(?:json)?\s*\n(.*?)```\s*$").unwrap();
}

/// Errors that can occur when parsing a lesson draft.
#[derive(Error, Debug)]
pub enum DraftError {
    #[error("Response is not valid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Response violates the lesson schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),
}

/// A candidate lesson as produced by a generator, before hard
/// validation runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LessonDraft {
    /// One-sentence learning objective.
    pub objective: String,

    /// The three lesson sections in presentation order.
    pub sections: Vec<Section>,
}

impl LessonDraft {
    /// Parse a draft from an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DraftError> {
        schema::validate_json_only_response(&value).map_err(DraftError::SchemaError)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a draft from raw generator text.
    ///
    /// Generators sometimes wrap the payload in a markdown code fence
    /// despite being asked for JSON only; a single outer fence is
    /// stripped before parsing.
    pub fn from_json(raw: &str) -> Result<Self, DraftError> {
        let body = match JSON_FENCE.captures(raw) {
            Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(raw),
            None => raw,
        };
        let value: serde_json::Value = serde_json::from_str(body.trim())?;
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_json() -> String {
        json!({
            "objective": "Understand list slicing",
            "sections": [
                {
                    "id": "concept",
                    "title": "Core concept",
                    "minutes": 5,
                    "blocks": [
                        { "type": "text", "content": "Lists are ordered.\n\n- indexable" }
                    ]
                },
                {
                    "id": "example",
                    "title": "Worked example",
                    "minutes": 6,
                    "blocks": [
                        { "type": "python", "content": "print([1, 2, 3][1:])" }
                    ]
                },
                {
                    "id": "exercise",
                    "title": "Practice",
                    "minutes": 4,
                    "blocks": [
                        { "type": "exercise", "content": "Slice the last two items." }
                    ]
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_parse_plain_json() {
        let draft = LessonDraft::from_json(&valid_json()).unwrap();
        assert_eq!(draft.objective, "Understand list slicing");
        assert_eq!(draft.sections.len(), 3);
        assert_eq!(draft.sections[0].id, "concept");
        assert_eq!(draft.sections[1].minutes, 6);
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{}\n```", valid_json());
        let draft = LessonDraft::from_json(&fenced).unwrap();
        assert_eq!(draft.sections.len(), 3);
    }

    #[test]
    fn test_parse_fence_without_language_tag() {
        let fenced = format!("```\n{}\n```", valid_json());
        assert!(LessonDraft::from_json(&fenced).is_ok());
    }

    #[test]
    fn test_non_json_fails_with_json_error() {
        let result = LessonDraft::from_json("Here is your lesson: ...");
        assert!(matches!(result, Err(DraftError::JsonError(_))));
    }

    #[test]
    fn test_schema_violation_fails_before_deserialization() {
        let result = LessonDraft::from_json(r#"{ "objective": "x", "sections": [] }"#);
        assert!(matches!(result, Err(DraftError::SchemaError(_))));
    }

    #[test]
    fn test_prose_around_json_is_rejected() {
        let wrapped = format!("Sure! Here it is:\n{}", valid_json());
        assert!(LessonDraft::from_json(&wrapped).is_err());
    }
}
