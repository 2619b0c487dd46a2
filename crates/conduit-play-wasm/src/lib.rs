//! Conduit playground compiler as a WASM module for the browser.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { compile } from 'conduit-play-wasm';
//!
//! await init();
//!
//! const result = compile(source, { debug: true });
//! // { success: true, output: "Conduit server starting on port 8080\n...", ... }
//! ```

use conduit_play_compiler::{Clock, CompileOptions, CompileResult, Compiler};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Date, js_name = now)]
    fn date_now() -> f64;
}

/// `Date.now()`; `std::time::Instant` is unavailable in the browser.
struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> f64 {
        date_now()
    }
}

fn run(source: &str, options: CompileOptions) -> CompileResult {
    Compiler::new(options).compile_with_clock(source, &BrowserClock)
}

fn options_error(source: &str, message: String) -> CompileResult {
    CompileResult {
        success: false,
        output: None,
        error: Some(format!("invalid options: {message}")),
        execution_time: 0.0,
        memory_used: 0,
        generated_code: None,
        source_hash: conduit_play_compiler::source_hash(source),
        location: None,
    }
}

/// Compile and run `source`. `options` is a plain object with
/// `CompileOptions` fields (camelCase); `undefined` means defaults.
/// Returns a `CompileResult` object.
#[wasm_bindgen]
pub fn compile(source: &str, options: JsValue) -> JsValue {
    let result = if options.is_undefined() || options.is_null() {
        run(source, CompileOptions::default())
    } else {
        match serde_wasm_bindgen::from_value::<CompileOptions>(options) {
            Ok(options) => run(source, options),
            Err(e) => options_error(source, e.to_string()),
        }
    };
    serde_wasm_bindgen::to_value(&result).unwrap_or_else(|e| JsValue::from_str(&e.to_string()))
}

/// JSON-in, JSON-out variant of [`compile`]. An empty options string means
/// defaults.
#[wasm_bindgen]
pub fn compile_json(source: &str, options_json: &str) -> String {
    let result = if options_json.trim().is_empty() {
        run(source, CompileOptions::default())
    } else {
        match serde_json::from_str::<CompileOptions>(options_json) {
            Ok(options) => run(source, options),
            Err(e) => options_error(source, e.to_string()),
        }
    };
    serde_json::to_string(&result).unwrap_or_else(|e| {
        format!(
            r#"{{"success":false,"output":null,"error":"Serialization error: {}","executionTime":0,"memoryUsed":0,"sourceHash":""}}"#,
            e
        )
    })
}

/// Return the compiler version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
