//! Environment-backed runtime configuration.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Enables the runtime smoke tester ("1"/"true"/"yes"/"on").
pub const ENV_SMOKE_TEST: &str = "LECTERN_SMOKE_TEST";
/// Per-snippet execution deadline in milliseconds.
pub const ENV_SMOKE_TIMEOUT_MS: &str = "LECTERN_SMOKE_TIMEOUT_MS";
/// Python interpreter binary used for the sandbox.
pub const ENV_PYTHON: &str = "LECTERN_PYTHON";

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(250);
const DEFAULT_INTERPRETER: &str = "python3";

/// Configuration for the subprocess sandbox.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Whether snippets are smoke-tested at all. Off by default.
    pub enabled: bool,

    /// Deadline enforced inside the child process.
    pub timeout: Duration,

    /// Interpreter binary name or path.
    pub interpreter: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: DEFAULT_TIMEOUT,
            interpreter: DEFAULT_INTERPRETER.to_string(),
        }
    }
}

impl SandboxConfig {
    /// Resolve configuration from environment variables. Unset or
    /// invalid values fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = env::var(ENV_SMOKE_TEST) {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.enabled = true,
                "" | "0" | "false" | "no" | "off" => config.enabled = false,
                other => {
                    warn!(value = other, "unrecognized {} value, smoke test stays disabled", ENV_SMOKE_TEST);
                }
            }
        }

        if let Ok(value) = env::var(ENV_SMOKE_TIMEOUT_MS) {
            match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.timeout = Duration::from_millis(ms),
                _ => {
                    warn!(value = %value, "invalid {}, using default timeout", ENV_SMOKE_TIMEOUT_MS);
                }
            }
        }

        if let Ok(value) = env::var(ENV_PYTHON) {
            let value = value.trim();
            if !value.is_empty() {
                config.interpreter = value.to_string();
            }
        }

        config
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_disabled_with_short_deadline() {
        let config = SandboxConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.interpreter, "python3");
    }

    // Environment assertions live in one test so parallel test threads
    // never observe each other's variables.
    #[test]
    fn environment_overrides_and_fallbacks() {
        env::set_var(ENV_SMOKE_TEST, "yes");
        env::set_var(ENV_SMOKE_TIMEOUT_MS, "500");
        env::set_var(ENV_PYTHON, "python3.12");
        let config = SandboxConfig::from_env();
        assert!(config.enabled);
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.interpreter, "python3.12");

        env::set_var(ENV_SMOKE_TEST, "definitely");
        env::set_var(ENV_SMOKE_TIMEOUT_MS, "soon");
        env::set_var(ENV_PYTHON, "  ");
        let config = SandboxConfig::from_env();
        assert!(!config.enabled);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.interpreter, "python3");

        env::remove_var(ENV_SMOKE_TEST);
        env::remove_var(ENV_SMOKE_TIMEOUT_MS);
        env::remove_var(ENV_PYTHON);
    }
}
