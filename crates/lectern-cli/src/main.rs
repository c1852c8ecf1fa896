//! Lectern command line entry point.
//!
//! Lessons move through the same path the service uses: strict JSON
//! gate, typed draft, hard validation, then optional advisory
//! analysis. Hard validation failures exit non-zero with the
//! descriptive error.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lectern_core::{ContentAgent, LessonDraft, PlannerAgent, ValidatorAgent};
use lectern_runtime::{LessonAnalyzer, SandboxConfig};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Generate, validate and analyze 15-minute micro-lessons")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a lesson from the deterministic planner and templates
    Generate {
        /// Lesson topic
        #[arg(short, long)]
        topic: String,

        /// Learner level (beginner, intermediate, advanced)
        #[arg(short, long, default_value = "beginner")]
        level: String,

        /// Fail instead of rebalancing when minutes do not total 15
        #[arg(long)]
        strict_minutes: bool,

        /// Attach an advisory analysis with the runtime smoke test on
        #[arg(long)]
        smoke: bool,
    },

    /// Validate a lesson JSON file and print the normalized lesson
    Validate {
        /// Path to the lesson JSON file
        file: PathBuf,

        /// Fail instead of rebalancing when minutes do not total 15
        #[arg(long)]
        strict_minutes: bool,
    },

    /// Print an advisory analysis report for a lesson JSON file
    Analyze {
        /// Path to the lesson JSON file
        file: PathBuf,

        /// Force the runtime smoke test on
        #[arg(long)]
        smoke: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            topic,
            level,
            strict_minutes,
            smoke,
        } => generate(&topic, &level, strict_minutes, smoke).await,
        Commands::Validate {
            file,
            strict_minutes,
        } => validate(&file, strict_minutes),
        Commands::Analyze { file, smoke } => analyze(&file, smoke).await,
    }
}

async fn generate(topic: &str, level: &str, strict_minutes: bool, smoke: bool) -> Result<()> {
    let plan = PlannerAgent.plan(topic, level);
    let sections = ContentAgent.generate(topic, &plan);

    let validated = validate_sections(&sections, strict_minutes)?;

    let lesson = LessonDraft {
        objective: format!("Learn {topic} in one focused 15-minute session"),
        sections: validated,
    };

    let mut output = serde_json::to_value(&lesson)?;
    if smoke {
        let analyzer = LessonAnalyzer::new(SandboxConfig::from_env().enabled(true));
        let report = analyzer.analyze(&lesson.sections).await;
        output
            .as_object_mut()
            .context("lesson serialized to a non-object")?
            .insert("analysis".to_string(), serde_json::to_value(&report)?);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn validate(file: &PathBuf, strict_minutes: bool) -> Result<()> {
    let draft = read_draft(file)?;

    let validated = validate_sections(&draft.sections, strict_minutes)?;

    let lesson = LessonDraft {
        objective: draft.objective,
        sections: validated,
    };
    println!("{}", serde_json::to_string_pretty(&lesson)?);
    Ok(())
}

async fn analyze(file: &PathBuf, smoke: bool) -> Result<()> {
    let draft = read_draft(file)?;

    let mut config = SandboxConfig::from_env();
    if smoke {
        config = config.enabled(true);
    }
    let report = LessonAnalyzer::new(config).analyze(&draft.sections).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Run hard validation, logging the failure category so operators can
/// tell a structural failure (regenerate) from a content one (fix the
/// block) without parsing the message.
fn validate_sections(
    sections: &[lectern_core::Section],
    strict_minutes: bool,
) -> Result<Vec<lectern_core::Section>> {
    match ValidatorAgent::new().validate(sections, strict_minutes) {
        Ok(validated) => Ok(validated),
        Err(err) => {
            tracing::warn!(category = ?err.category(), "lesson failed hard validation");
            Err(err.into())
        }
    }
}

fn read_draft(file: &PathBuf) -> Result<LessonDraft> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    match LessonDraft::from_json(&raw) {
        Ok(draft) => Ok(draft),
        Err(e) => bail!("{} is not a valid lesson: {e}", file.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failure_surfaces_the_descriptive_error() {
        let plan = PlannerAgent.plan("list slicing", "beginner");
        let mut sections = ContentAgent.generate("list slicing", &plan);
        sections.pop();

        let err = validate_sections(&sections, false).unwrap_err();
        assert!(err.to_string().contains("exercise"));

        let full = ContentAgent.generate("list slicing", &plan);
        assert!(validate_sections(&full, false).is_ok());
    }
}
