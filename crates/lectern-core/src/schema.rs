//! Strict JSON gate for generator output.
//!
//! Raw generator replies are checked against the embedded lesson
//! schema before any typed deserialization. The schema pins exact key
//! sets everywhere, exactly the three required section ids, and no
//! extra properties; anything off-contract is rejected outright, never
//! repaired.

use std::sync::OnceLock;
use thiserror::Error;

const LESSON_SCHEMA_JSON: &str = include_str!("../../../spec/lesson.schema.json");

// Compiled once; the embedded schema cannot change at runtime.
static LESSON_VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn compile_validator() -> Result<jsonschema::Validator, String> {
    let schema: serde_json::Value = serde_json::from_str(LESSON_SCHEMA_JSON)
        .map_err(|e| format!("embedded schema is not valid JSON: {e}"))?;
    jsonschema::options()
        .build(&schema)
        .map_err(|e| format!("embedded schema failed to compile: {e}"))
}

fn validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    LESSON_VALIDATOR
        .get_or_init(compile_validator)
        .as_ref()
        .map_err(|e| SchemaError::LoadError(e.clone()))
}

/// Validate a lesson JSON value against the strict response schema.
///
/// All violations are collected, each with its instance path, so a
/// repair prompt can quote every problem at once.
pub fn validate_json_only_response(lesson_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(lesson_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
