//! # lectern-runtime
//!
//! Async advisory analysis for Lectern lessons.
//!
//! `lectern-core` is fully static and deterministic. This crate adds
//! the parts that touch the outside world:
//! - a disposable-subprocess smoke tester that actually runs snippets
//!   under a tight deadline and a restricted namespace
//! - the lesson analyzer that merges static and runtime findings into
//!   one report
//! - environment-backed configuration for both
//!
//! Everything here is advisory. A lesson is never blocked or mutated
//! by this crate, and every infrastructure failure degrades to "no
//! finding".
//!
//! ## Example
//!
//! ```rust,ignore
//! use lectern_runtime::{LessonAnalyzer, SandboxConfig};
//!
//! let analyzer = LessonAnalyzer::new(SandboxConfig::from_env());
//! let report = analyzer.analyze(&lesson).await;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

pub mod analyzer;
pub mod config;
pub mod sandbox;

pub use analyzer::{AnalysisReport, LessonAnalyzer};
pub use config::SandboxConfig;
pub use sandbox::RuntimeSmokeTester;
