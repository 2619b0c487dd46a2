//! The orchestrator: tokenize → parse → generate → execute.

use std::time::Instant;

use conduit_play_codegen::{generate_with_source_map, GeneratorConfig, SourceMap};
use conduit_play_lexer::Lexer;
use conduit_play_parser::parse;
use conduit_play_sandbox::{BufferSink, Sandbox, SandboxConfig};
use conduit_play_types::{SourceFile, Span};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::CompileError;
use crate::options::{CompileOptions, CompileResult};

/// Millisecond clock used to time a compile.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// [`Clock`] backed by [`Instant`]. Not usable on `wasm32-unknown-unknown`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Name given to playground input in diagnostics.
const SOURCE_NAME: &str = "main.py";

/// Hex SHA-256 of the source text.
pub fn source_hash(source: &str) -> String {
    format!("{:x}", Sha256::digest(source.as_bytes()))
}

/// Runs the whole pipeline. Every call builds fresh stage instances and a
/// fresh output buffer.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Generator settings matching what the sandbox provides.
    pub fn generator_config() -> GeneratorConfig {
        let mut config =
            GeneratorConfig::default().with_framework_classes(Sandbox::framework_classes());
        config.registrar = Sandbox::registrar().to_string();
        config
    }

    pub fn sandbox_config(&self) -> SandboxConfig {
        SandboxConfig {
            max_steps: self.options.max_steps,
            ..SandboxConfig::default()
        }
    }

    /// Source text to host script text, without running it.
    pub fn translate(&self, source: &str) -> Result<(String, SourceMap), CompileError> {
        self.translate_file(&SourceFile::new(SOURCE_NAME, source))
    }

    fn translate_file(&self, file: &SourceFile) -> Result<(String, SourceMap), CompileError> {
        let tokens = Lexer::new(file).tokenize()?;
        debug!(tokens = tokens.len(), "tokenized");
        let program = parse(tokens)?;
        debug!(statements = program.body.len(), "parsed");
        let (code, source_map) = generate_with_source_map(&program, &Self::generator_config())?;
        debug!(bytes = code.len(), "generated");
        Ok((code, source_map))
    }

    /// Compile and run `source`, timing with the system clock.
    pub fn compile(&self, source: &str) -> CompileResult {
        self.compile_with_clock(source, &SystemClock::new())
    }

    /// Compile and run `source`. Every stage error becomes a failure result;
    /// this never panics on user input.
    pub fn compile_with_clock(&self, source: &str, clock: &dyn Clock) -> CompileResult {
        if self.options.debug {
            crate::init_tracing();
        }
        let start = clock.now_ms();
        let file = SourceFile::new(SOURCE_NAME, source);
        let source_hash = source_hash(source);

        let (code, source_map) = match self.translate_file(&file) {
            Ok(translated) => translated,
            Err(e) => {
                let elapsed = clock.now_ms() - start;
                return Failure::new(&file, &e, None).into_result(None, elapsed, source_hash);
            }
        };

        let mut sink = BufferSink::new();
        let outcome = Sandbox::new(self.sandbox_config()).execute(&code, &mut sink);
        let execution_time = clock.now_ms() - start;
        let generated_code = self.options.debug.then_some(code);

        match outcome {
            Ok(()) => {
                debug!(lines = sink.lines().len(), execution_time, "compile succeeded");
                CompileResult {
                    success: true,
                    output: Some(sink.contents()),
                    error: None,
                    execution_time,
                    memory_used: 0,
                    generated_code,
                    source_hash,
                    location: None,
                }
            }
            Err(e) => Failure::new(&file, &CompileError::from(e), Some(&source_map))
                .into_result(generated_code, execution_time, source_hash),
        }
    }
}

/// A located failure, ready to become a [`CompileResult`].
struct Failure {
    message: String,
    location: Option<Span>,
}

impl Failure {
    fn new(file: &SourceFile, error: &CompileError, source_map: Option<&SourceMap>) -> Self {
        let location = error.span(source_map);
        let source_line = location
            .and_then(|span| file.line(span.start_line))
            .unwrap_or_default();
        debug!(error = %error, file = %file.name, source_line, "compile failed");
        Self {
            message: error.to_string(),
            location,
        }
    }

    fn into_result(
        self,
        generated_code: Option<String>,
        execution_time: f64,
        source_hash: String,
    ) -> CompileResult {
        CompileResult {
            success: false,
            output: None,
            error: Some(self.message),
            execution_time,
            memory_used: 0,
            generated_code,
            source_hash,
            location: self.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Clock that advances by a fixed amount on every reading.
    struct StepClock(std::cell::Cell<f64>);

    impl Clock for StepClock {
        fn now_ms(&self) -> f64 {
            let now = self.0.get();
            self.0.set(now + 2.0);
            now
        }
    }

    #[test]
    fn test_source_hash_is_sha256_hex() {
        assert_eq!(
            source_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_generator_config_knows_framework_classes() {
        let config = Compiler::generator_config();
        assert!(config.is_framework_class("Conduit"));
        assert!(config.is_framework_class("MCPServer"));
        assert_eq!(config.registrar, "__register");
    }

    #[test]
    fn test_elapsed_time_comes_from_clock() {
        let clock = StepClock(std::cell::Cell::new(10.0));
        let result = Compiler::default().compile_with_clock("x = 1\n", &clock);
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.execution_time, 2.0);
    }

    #[test]
    fn test_translate_returns_code_and_map() {
        let (code, map) = Compiler::default().translate("x = 1\nprint(x)\n").unwrap();
        assert_eq!(code, "var x = 1;\nconsole.log(x);\n");
        assert_eq!(map.lookup(2).map(|s| s.start_line), Some(2));
    }
}
