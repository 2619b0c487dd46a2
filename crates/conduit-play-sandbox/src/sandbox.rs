//! Sandbox entry point: configuration and one-shot execution.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SandboxResult;
use crate::framework;
use crate::heap;
use crate::interpreter::Interpreter;
use crate::output::OutputSink;
use crate::script::parse_script;

/// Default step budget for one execution.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

/// Default limit on nested script function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

/// Limits and fixtures for one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SandboxConfig {
    /// Every statement and expression evaluated costs one step.
    pub max_steps: u64,
    pub max_call_depth: usize,
    /// Body of the request simulated by `run`.
    pub request_body: serde_json::Value,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            request_body: serde_json::json!({ "features": [1, 2, 3, 4, 5] }),
        }
    }
}

/// Executes generated host scripts against the mock framework.
///
/// Every call to [`Sandbox::execute`] starts from fresh globals; nothing
/// survives between executions.
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Names the sandbox defines as framework classes. Code generators call
    /// these with `new`.
    pub fn framework_classes() -> Vec<&'static str> {
        framework::FRAMEWORK_CLASSES.to_vec()
    }

    /// Method name decorated definitions are registered through.
    pub fn registrar() -> &'static str {
        framework::REGISTRAR
    }

    /// Parse and run `code`, writing everything it prints to `out`.
    pub fn execute(&self, code: &str, out: &mut dyn OutputSink) -> SandboxResult<()> {
        let script = parse_script(code)?;
        debug!(statements = script.body.len(), "host script parsed");

        // Script values may form cycles; the session empties them all once
        // the run is over.
        let heap = heap::Session::begin();
        let mut interp = Interpreter::new(&self.config, out);
        let result = interp.run(&script);
        let steps = interp.steps();
        drop(interp);
        drop(heap);

        match &result {
            Ok(()) => debug!(steps, "host script finished"),
            Err(e) => debug!(steps, error = %e, "host script failed"),
        }
        result
    }
}
