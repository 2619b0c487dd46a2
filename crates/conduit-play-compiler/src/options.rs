//! Compile options and the structured result handed back to the playground.

use conduit_play_sandbox::sandbox::DEFAULT_MAX_STEPS;
use conduit_play_types::Span;
use serde::{Deserialize, Serialize};

/// Advisory memory limit: 100 MiB.
pub const DEFAULT_MEMORY_LIMIT: u64 = 100 * 1024 * 1024;

/// Options for one compile call. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Reserved; code generation ignores it.
    pub optimize: bool,
    /// Install tracing (when `RUST_LOG` is set) and return the generated code.
    pub debug: bool,
    /// Advisory only; nothing enforces it.
    pub memory_limit: u64,
    /// Sandbox step budget.
    pub max_steps: u64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            optimize: false,
            debug: false,
            memory_limit: DEFAULT_MEMORY_LIMIT,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Outcome of a compile call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResult {
    pub success: bool,
    /// Captured output, on success.
    pub output: Option<String>,
    /// Error message, on failure.
    pub error: Option<String>,
    /// Wall-clock milliseconds, up to completion or failure.
    pub execution_time: f64,
    /// Always zero; memory is not measured.
    pub memory_used: u64,
    /// Host script text, when `debug` is set and generation succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    /// Hex SHA-256 of the source text.
    pub source_hash: String,
    /// Source position of the failure, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Span>,
}

impl CompileResult {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults_from_partial_json() {
        let options: CompileOptions = serde_json::from_str(r#"{"debug": true}"#).unwrap();
        assert!(options.debug);
        assert!(!options.optimize);
        assert_eq!(options.memory_limit, 104_857_600);
        assert_eq!(options.max_steps, DEFAULT_MAX_STEPS);
    }

    #[test]
    fn test_result_uses_camel_case() {
        let result = CompileResult {
            success: true,
            output: Some("ok".into()),
            error: None,
            execution_time: 1.5,
            memory_used: 0,
            generated_code: None,
            source_hash: "abc".into(),
            location: None,
        };
        let json: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(json["executionTime"], 1.5);
        assert_eq!(json["memoryUsed"], 0);
        assert_eq!(json["sourceHash"], "abc");
        assert!(json.get("generatedCode").is_none());
        assert!(json["error"].is_null());
    }
}
