//! Integration tests for the sandbox: host scripts shaped like generated
//! code, run against the mock framework.

use conduit_play_sandbox::{BufferSink, Sandbox, SandboxConfig, SandboxError};
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Run with the default configuration, panicking on failure.
fn run(code: &str) -> Vec<String> {
    let mut sink = BufferSink::new();
    if let Err(e) = Sandbox::default().execute(code, &mut sink) {
        panic!("execution failed: {e}\noutput so far:\n{}", sink.contents());
    }
    sink.into_lines()
}

/// Run with a custom configuration, returning the result and the output.
fn run_with(config: SandboxConfig, code: &str) -> (Result<(), SandboxError>, Vec<String>) {
    let mut sink = BufferSink::new();
    let result = Sandbox::new(config).execute(code, &mut sink);
    (result, sink.into_lines())
}

// ══════════════════════════════════════════════════════════════════════════════
// Conduit app
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_run_lists_routes_and_simulates_first() {
    let out = run(r#"var app = new Conduit();
function home(req, res) {
  res.json({"message": "hi", "n": len(req.body.features)});
}
app.__register("get", "/", home);
function create(req, res) {
  return "created";
}
app.__register("post", "/items", create);
app.run({port: 3000});
"#);
    assert_eq!(
        out,
        [
            "Conduit server starting on port 3000",
            "Registered routes:",
            "  GET /",
            "  POST /items",
            "Simulating GET /",
            r#"Response: {"message":"hi","n":5}"#,
        ]
    );
}

#[test]
fn test_handler_return_value_is_printed() {
    let out = run(r#"var app = new Conduit();
function h(req) {
  return {"ok": true};
}
app.__register("get", "/x", h);
app.run();
"#);
    assert_eq!(out.last().map(String::as_str), Some(r#"Response: {"ok":true}"#));
    assert_eq!(out[0], "Conduit server starting on port 8080");
}

#[test]
fn test_run_without_routes() {
    let out = run("var app = new Conduit();\napp.run(5000);\n");
    assert_eq!(
        out,
        ["Conduit server starting on port 5000", "No routes registered"]
    );
}

#[test]
fn test_handler_error_degrades_to_fallback_line() {
    let out = run(r#"var app = new Conduit();
function h(req, res) {
  return missing;
}
app.__register("get", "/", h);
app.run();
console.log("after");
"#);
    assert_eq!(
        &out[out.len() - 2..],
        ["Handler error: missing is not defined", "after"]
    );
}

#[test]
fn test_direct_decorator_call_registers() {
    let out = run(r#"var app = new Conduit();
function h(req, res) {
  res.send("direct");
}
app.get("/d")(h);
app.run();
"#);
    assert!(out.contains(&"  GET /d".to_string()), "{out:?}");
    assert_eq!(out.last().map(String::as_str), Some("Response: direct"));
}

#[test]
fn test_config_setters_only_print() {
    let out = run(r#"var app = new Conduit();
app.set_cors_enabled(true);
app.set_rate_limit(100);
app.set_logging(false);
"#);
    assert_eq!(
        out,
        [
            "CORS enabled: true",
            "Rate limit set: 100 requests/minute",
            "Logging enabled: false",
        ]
    );
}

#[test]
fn test_response_methods_write_lines() {
    let out = run(r#"var app = new Conduit();
function h(req, res) {
  res.status(201).set_header("X-Id", "7").send("done");
  res.write("a");
  res.flush();
}
app.__register("post", "/r", h);
app.run();
"#);
    assert_eq!(
        &out[out.len() - 5..],
        [
            "Status: 201",
            "Header: X-Id: 7",
            "Response: done",
            "Write: a",
            "Response flushed",
        ]
    );
}

#[test]
fn test_request_fields() {
    let out = run(r#"var app = new Conduit();
function h(req, res) {
  res.send(req.method + " " + req.path);
  console.log(req.json().features.length, req.params);
}
app.__register("get", "/info", h);
app.run();
"#);
    assert_eq!(&out[out.len() - 2..], ["Response: GET /info", "5 {}"]);
}

#[test]
fn test_custom_request_body() {
    let config = SandboxConfig {
        request_body: serde_json::json!({"name": "ada"}),
        ..SandboxConfig::default()
    };
    let (result, out) = run_with(
        config,
        r#"var app = new Conduit();
function h(req) {
  return req.body.name;
}
app.__register("get", "/", h);
app.run();
"#,
    );
    result.unwrap();
    assert_eq!(out.last().map(String::as_str), Some("Response: ada"));
}

// ══════════════════════════════════════════════════════════════════════════════
// MCPServer
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_mcp_tools() {
    let out = run(r#"var mcp = new MCPServer({"name": "calc", "version": "0.2.0"});
function add(a, b) {
  return a + b;
}
mcp.__register("tool", "add", add);
console.log(mcp.list_tools(), mcp.call_tool("add", 2, 3));
mcp.run();
"#);
    assert_eq!(
        out,
        [
            r#"["add"] 5"#,
            "MCP server 'calc' v0.2.0 ready",
            "Registered tools:",
            "  add",
        ]
    );
}

#[test]
fn test_mcp_unknown_tool_is_error() {
    let (result, _) = run_with(
        SandboxConfig::default(),
        "var mcp = new MCPServer(\"s\", \"1\");\nmcp.call_tool(\"nope\");\n",
    );
    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "runtime error: unknown tool 'nope'");
    assert_eq!(err.line(), Some(2));
}

// ══════════════════════════════════════════════════════════════════════════════
// Language features
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_classes_with_statics_and_methods() {
    let out = run(r#"class Counter {
  static start = 10;
  constructor(step) {
    var self = this;
    self.count = Counter.start;
    self.step = step;
  }
  bump() {
    var self = this;
    self.count = self.count + self.step;
    return self.count;
  }
}
var c = new Counter(5);
c.bump();
console.log(c.bump(), c.start);
"#);
    assert_eq!(out, ["20 10"]);
}

#[test]
fn test_closures_capture_enclosing_scope() {
    let out = run(r#"function make() {
  var total = 0;
  function add(n) {
    total = total + n;
    return total;
  }
  return add;
}
var add = make();
add(2);
console.log(add(3));
"#);
    assert_eq!(out, ["5"]);
}

#[test]
fn test_loops_and_math() {
    let out = run(r#"var total = 0;
for (var i of range(5)) {
  if ((i % 2) === 0) {
    total = total + i;
  } else {
    // pass
  }
}
var n = 3;
while (n > 0) {
  n = n - 1;
}
console.log(total, n, Math.pow(2, 10), Math.floor(7 / 2));
"#);
    assert_eq!(out, ["6 0 1024 3"]);
}

#[test]
fn test_default_parameters() {
    let out = run("function greet(name = \"world\") {\n  return \"hello \" + name;\n}\nconsole.log(greet(), greet(\"ada\"));\n");
    assert_eq!(out, ["hello world hello ada"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors and limits
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_step_budget_stops_infinite_loop() {
    let config = SandboxConfig {
        max_steps: 1_000,
        ..SandboxConfig::default()
    };
    let (result, _) = run_with(config, "while (true) {\n}\n");
    let err = result.unwrap_err();
    assert!(
        matches!(err.root(), SandboxError::BudgetExhausted { limit: 1_000 }),
        "{err:?}"
    );
}

#[test]
fn test_budget_exhaustion_in_handler_is_not_swallowed() {
    let config = SandboxConfig {
        max_steps: 5_000,
        ..SandboxConfig::default()
    };
    let (result, out) = run_with(
        config,
        r#"var app = new Conduit();
function spin(req, res) {
  while (true) {
  }
}
app.__register("get", "/", spin);
app.run();
"#,
    );
    assert!(result.unwrap_err().is_resource_limit());
    assert_eq!(out.last().map(String::as_str), Some("Simulating GET /"));
    assert!(!out.iter().any(|line| line.starts_with("Handler error")));
}

#[test]
fn test_call_depth_limit() {
    let config = SandboxConfig {
        max_call_depth: 20,
        ..SandboxConfig::default()
    };
    let (result, _) = run_with(config, "function f(n) {\n  return f(n + 1);\n}\nf(0);\n");
    let err = result.unwrap_err();
    assert!(
        matches!(err.root(), SandboxError::CallDepthExceeded { limit: 20 }),
        "{err:?}"
    );
}

#[test]
fn test_syntax_error_reports_line() {
    let (result, out) = run_with(SandboxConfig::default(), "var ok = 1;\nvar x = ;\n");
    assert!(out.is_empty());
    match result.unwrap_err() {
        SandboxError::Syntax { line, .. } => assert_eq!(line, 2),
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_type_error_has_line() {
    let (result, _) = run_with(SandboxConfig::default(), "var a = 1;\na();\n");
    let err = result.unwrap_err();
    assert!(matches!(err.root(), SandboxError::TypeMismatch(_)));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn test_circular_structures_print_with_marker() {
    let out = run(r#"var xs = [1];
xs.push(xs);
var o = {"name": "a"};
o.self = o;
o.list = xs;
console.log(xs, o);
console.log(str(o));
"#);
    assert_eq!(
        out,
        [
            r#"[1,"[Circular]"] {"list":[1,"[Circular]"],"name":"a","self":"[Circular]"}"#,
            r#"{"list":[1,"[Circular]"],"name":"a","self":"[Circular]"}"#,
        ]
    );
}

#[test]
fn test_circular_response_body_is_rendered() {
    let out = run(r#"var app = new Conduit();
function h(req, res) {
  var body = {"ok": true};
  body.me = body;
  res.json(body);
}
app.__register("get", "/", h);
app.run();
"#);
    assert_eq!(
        out.last().map(String::as_str),
        Some(r#"Response: {"me":"[Circular]","ok":true}"#)
    );
}

#[test]
fn test_string_repeat_over_limit_is_an_error() {
    let (result, out) = run_with(
        SandboxConfig::default(),
        "console.log(\"ok\");\nvar s = \"ab\" * Math.pow(10, 18);\n",
    );
    assert_eq!(out, ["ok"]);
    let err = result.unwrap_err();
    assert_eq!(err.line(), Some(2));
    assert_eq!(err.to_string(), "runtime error: string result is too large");
}

#[test]
fn test_executions_do_not_share_globals() {
    let sandbox = Sandbox::default();
    let mut first = BufferSink::new();
    sandbox.execute("var x = 1;\nconsole.log(x);\n", &mut first).unwrap();
    let mut second = BufferSink::new();
    let err = sandbox.execute("console.log(x);\n", &mut second).unwrap_err();
    assert_eq!(err.to_string(), "x is not defined");
    assert_eq!(first.lines(), ["1"]);
    assert!(second.is_empty());
}
