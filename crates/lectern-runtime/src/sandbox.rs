//! Subprocess smoke tester for lesson snippets.
//!
//! Each snippet runs in a disposable, isolated interpreter process
//! (`python -I`) under a harness that installs an interval timer and a
//! heavily restricted builtin namespace before executing the snippet.
//! The harness reports a single JSON line on stdout; anything the
//! harness cannot report (missing interpreter, spawn failure, a wedged
//! child killed at the outer deadline) degrades to "no finding".
//!
//! Advisory only: this never errors and a lesson is never blocked on
//! the result.

use std::process::Stdio;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use lectern_core::python;
use lectern_core::types::RuleOutcome;

use crate::config::SandboxConfig;

/// Outcome code reported for a snippet that raised at runtime.
pub const RUNTIME_ERROR_CODE: &str = "runtime_error";

const INTENT_INSPECT_RUNTIME_ERROR: &str = "inspect_runtime_error";

/// Extra wall-clock allowance past the in-child timer before the child
/// is killed from outside.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Harness executed in the child. Reads the snippet from stdin, arms a
/// real-time interval timer, executes under a restricted namespace and
/// prints one JSON status line. `print` is a no-op so snippet output
/// never corrupts the status line.
const HARNESS: &str = r#"
import json
import signal
import sys

snippet = sys.stdin.read()

def _quiet_print(*args, **kwargs):
    pass

_namespace = {
    "__builtins__": {
        "print": _quiet_print,
        "range": range,
        "len": len,
        "min": min,
        "max": max,
        "sum": sum,
        "abs": abs,
        "enumerate": enumerate,
        "zip": zip,
        "list": list,
        "dict": dict,
        "set": set,
        "tuple": tuple,
        "map": map,
        "filter": filter,
    }
}

def _expired(signum, frame):
    raise TimeoutError("snippet exceeded the {TIMEOUT}s execution deadline")

signal.signal(signal.SIGALRM, _expired)
signal.setitimer(signal.ITIMER_REAL, {TIMEOUT})

try:
    exec(compile(snippet, "<snippet>", "exec"), _namespace)
except BaseException as exc:
    sys.stdout.write(json.dumps({"ok": False, "error": type(exc).__name__, "message": str(exc)}))
else:
    sys.stdout.write(json.dumps({"ok": True}))
"#;

/// Runs lesson snippets in a bounded, disposable interpreter.
pub struct RuntimeSmokeTester {
    config: SandboxConfig,
}

impl RuntimeSmokeTester {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(SandboxConfig::from_env())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Smoke-test one snippet.
    ///
    /// Returns one `runtime_error` outcome when the snippet raised
    /// (including the injected timeout), `None` on success, and `None`
    /// when the test is disabled or not applicable: unparsable
    /// snippets are a hard-validation concern and snippets with
    /// imports cannot run in the restricted namespace.
    pub async fn run(&self, snippet: &str) -> Option<RuleOutcome> {
        if !self.config.enabled {
            return None;
        }
        let suite = python::parse(snippet).ok()?;
        if python::contains_import(&suite) {
            debug!("skipping smoke test for snippet with imports");
            return None;
        }

        let report = self.execute(snippet).await?;
        if report.get("ok").and_then(Value::as_bool) == Some(true) {
            return None;
        }

        let error = report
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Exception");
        let message = report
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("");

        let mut context = Map::new();
        context.insert("error".to_string(), Value::from(error));
        context.insert("message".to_string(), Value::from(message));
        context.insert(
            "correction_intent".to_string(),
            Value::from(INTENT_INSPECT_RUNTIME_ERROR),
        );
        Some(RuleOutcome::new(RUNTIME_ERROR_CODE, context))
    }

    /// Spawn the harness, feed the snippet and parse the status line.
    /// Any infrastructure failure returns `None`.
    async fn execute(&self, snippet: &str) -> Option<Value> {
        let harness = HARNESS.replace("{TIMEOUT}", &format!("{:.3}", self.config.timeout.as_secs_f64()));

        let mut child = match Command::new(&self.config.interpreter)
            .arg("-I")
            .arg("-c")
            .arg(harness)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                debug!(interpreter = %self.config.interpreter, error = %err, "smoke test interpreter unavailable");
                return None;
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            if stdin.write_all(snippet.as_bytes()).await.is_err() {
                return None;
            }
            // Closing stdin lets the harness read to EOF.
        }

        let deadline = self.config.timeout + KILL_GRACE;
        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                debug!(error = %err, "smoke test child failed to run");
                return None;
            }
            Err(_) => {
                // The in-child timer never fired; kill_on_drop reaps it.
                debug!("smoke test child exceeded the outer deadline");
                return None;
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        match serde_json::from_str::<Value>(stdout.trim()) {
            Ok(report) => Some(report),
            Err(err) => {
                debug!(error = %err, "smoke test child produced unparsable output");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_tester() -> RuntimeSmokeTester {
        RuntimeSmokeTester::new(
            SandboxConfig::default()
                .enabled(true)
                .timeout(Duration::from_millis(250)),
        )
    }

    async fn interpreter_available(tester: &RuntimeSmokeTester) -> bool {
        Command::new(&tester.config.interpreter)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok()
    }

    #[tokio::test]
    async fn disabled_tester_reports_nothing() {
        let tester = RuntimeSmokeTester::new(SandboxConfig::default());
        assert!(tester.run("1/0\n").await.is_none());
    }

    #[tokio::test]
    async fn snippets_with_imports_are_skipped() {
        let tester = enabled_tester();
        assert!(tester.run("import os\nprint(os.name)\n").await.is_none());
    }

    #[tokio::test]
    async fn unparsable_snippets_are_skipped() {
        let tester = enabled_tester();
        assert!(tester.run("def broken(:\n").await.is_none());
    }

    #[tokio::test]
    async fn division_by_zero_yields_runtime_error() {
        let tester = enabled_tester();
        if !interpreter_available(&tester).await {
            return;
        }
        let outcome = tester.run("x = 1\ny = x / 0\nprint(y)\n").await.unwrap();
        assert_eq!(outcome.code, RUNTIME_ERROR_CODE);
        assert_eq!(outcome.context["error"], "ZeroDivisionError");
        assert_eq!(outcome.context["correction_intent"], "inspect_runtime_error");
    }

    #[tokio::test]
    async fn successful_snippet_yields_nothing() {
        let tester = enabled_tester();
        if !interpreter_available(&tester).await {
            return;
        }
        assert!(tester.run("total = sum(range(10))\nprint(total)\n").await.is_none());
    }

    #[tokio::test]
    async fn infinite_loop_is_bounded_by_the_timer() {
        let tester = enabled_tester();
        if !interpreter_available(&tester).await {
            return;
        }
        let outcome = tester.run("while True:\n    pass\n").await.unwrap();
        assert_eq!(outcome.code, RUNTIME_ERROR_CODE);
        assert_eq!(outcome.context["error"], "TimeoutError");
    }

    #[tokio::test]
    async fn missing_interpreter_degrades_silently() {
        let tester = RuntimeSmokeTester::new(SandboxConfig {
            enabled: true,
            timeout: Duration::from_millis(250),
            interpreter: "definitely-not-a-python".to_string(),
        });
        assert!(tester.run("print(1)\n").await.is_none());
    }
}
