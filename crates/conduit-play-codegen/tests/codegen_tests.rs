//! Integration tests for the host script generator.
//!
//! Tests validate:
//! - Route decorators lower to registrar calls after the definition
//! - `var` introduction per function scope
//! - Classes, methods, constructors and static attributes
//! - Operator mapping, calls, keyword arguments and literals
//! - Control flow and `elif` chains
//! - Unsupported constructs fail instead of vanishing
//! - The generated-line source map

use conduit_play_codegen::{generate, generate_with_source_map, CodegenError, GeneratorConfig};
use conduit_play_lexer::tokenize;
use conduit_play_parser::parse;
use conduit_play_types::ast::Program;
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn parse_source(source: &str) -> Program {
    let tokens = tokenize(source).unwrap_or_else(|e| panic!("lex error: {e}"));
    parse(tokens).unwrap_or_else(|e| panic!("parse error: {e}"))
}

fn config() -> GeneratorConfig {
    GeneratorConfig::default().with_framework_classes(["Conduit", "MCPServer"])
}

/// Generate host script (panics on error).
fn gen(source: &str) -> String {
    generate(&parse_source(source), &config()).unwrap_or_else(|e| panic!("codegen failed: {e}"))
}

fn try_gen(source: &str) -> Result<String, CodegenError> {
    generate(&parse_source(source), &config())
}

// ══════════════════════════════════════════════════════════════════════════════
// Decorators
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_route_decorator_registers_after_definition() {
    let source = r#"
app = Conduit()

@app.get("/x")
def h(req, res):
    res.json({"ok": True})
"#;
    assert_eq!(
        gen(source),
        "var app = new Conduit();\n\
         function h(req, res) {\n  res.json({\"ok\": true});\n}\n\
         app.__register(\"get\", \"/x\", h);\n"
    );
}

#[test]
fn test_decorator_method_name_keeps_case() {
    let out = gen("@app.GET(\"/\")\ndef root(req, res):\n    pass\n");
    assert!(out.ends_with("app.__register(\"GET\", \"/\", root);\n"), "{out}");
}

#[test]
fn test_stacked_decorators_register_innermost_name() {
    let source = "@app.get(\"/\")\n@app.post(\"/\")\ndef both(req, res):\n    pass\n";
    assert_eq!(
        gen(source),
        "function both(req, res) {\n  // pass\n}\n\
         app.__register(\"post\", \"/\", both);\n\
         app.__register(\"get\", \"/\", both);\n"
    );
}

#[test]
fn test_bare_decorator_becomes_comment() {
    assert_eq!(
        gen("@cache\ndef f():\n    pass\n"),
        "// @cache\nfunction f() {\n  // pass\n}\n"
    );
    assert_eq!(
        gen("@retry(3)\ndef g():\n    pass\n"),
        "// @retry(3)\nfunction g() {\n  // pass\n}\n"
    );
}

#[test]
fn test_mcp_tool_registration() {
    let source = r#"
mcp = MCPServer(name="calc", version="1.0")

@mcp.tool("add")
def add(a, b):
    """Add two numbers."""
    return a + b
"#;
    assert_eq!(
        gen(source),
        "var mcp = new MCPServer({name: \"calc\", version: \"1.0\"});\n\
         function add(a, b) {\n  \"Add two numbers.\";\n  return (a + b);\n}\n\
         mcp.__register(\"tool\", \"add\", add);\n"
    );
}

#[test]
fn test_custom_registrar_name() {
    let mut config = config();
    config.registrar = "route".to_string();
    let program = parse_source("@app.get(\"/\")\ndef h(req, res):\n    pass\n");
    let out = generate(&program, &config).unwrap();
    assert!(out.ends_with("app.route(\"get\", \"/\", h);\n"), "{out}");
}

// ══════════════════════════════════════════════════════════════════════════════
// Declarations & scopes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_first_assignment_declares_var() {
    assert_eq!(gen("x = 1\nx = 2\n"), "var x = 1;\nx = 2;\n");
}

#[test]
fn test_function_has_its_own_scope() {
    let source = "x = 1\ndef f(a, b=2):\n    x = a\n    a = b\n    return x\n";
    assert_eq!(
        gen(source),
        "var x = 1;\nfunction f(a, b = 2) {\n  var x = a;\n  a = b;\n  return x;\n}\n"
    );
}

#[test]
fn test_member_and_subscript_assignment_never_declare() {
    assert_eq!(
        gen("obj.count = 1\nitems[0] = 2\n"),
        "obj.count = 1;\nitems[0] = 2;\n"
    );
}

#[test]
fn test_imports_become_comments() {
    assert_eq!(
        gen("from conduit import Conduit, Request\nimport json\n"),
        "// from conduit import Conduit, Request\n// import json\n"
    );
}

#[test]
fn test_empty_program_emits_nothing() {
    assert_eq!(gen(""), "");
}

// ══════════════════════════════════════════════════════════════════════════════
// Classes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_class_lowering() {
    let source = r#"
class Counter:
    start = 0
    def __init__(self, n):
        self.n = n
    def inc(self):
        self.n = self.n + 1
        return self.n

c = Counter(1)
"#;
    assert_eq!(
        gen(source),
        "class Counter {\n\
         \x20 static start = 0;\n\
         \x20 constructor(n) {\n\
         \x20   var self = this;\n\
         \x20   self.n = n;\n\
         \x20 }\n\
         \x20 inc() {\n\
         \x20   var self = this;\n\
         \x20   self.n = (self.n + 1);\n\
         \x20   return self.n;\n\
         \x20 }\n\
         }\n\
         var c = new Counter(1);\n"
    );
}

#[test]
fn test_class_used_before_definition_is_constructed() {
    let out = gen("p = Point()\nclass Point:\n    pass\n");
    assert!(out.starts_with("var p = new Point();\n"), "{out}");
}

#[test]
fn test_class_docstring_becomes_comment() {
    let out = gen("class A:\n    \"\"\"A thing.\"\"\"\n    def f(self):\n        return 1\n");
    assert!(out.contains("  // A thing.\n"), "{out}");
}

#[test]
fn test_loop_in_class_body_is_unsupported() {
    let err = try_gen("class A:\n    while True:\n        pass\n").unwrap_err();
    let CodegenError::Unsupported {
        construct,
        context,
        span,
    } = &err;
    assert_eq!(construct, "While");
    assert_eq!(context, "class body of 'A'");
    assert_eq!(span.start_line, 2);
    assert_eq!(err.span().start_line, 2);
}

#[test]
fn test_call_in_class_body_is_unsupported() {
    assert!(matches!(
        try_gen("class A:\n    print(1)\n"),
        Err(CodegenError::Unsupported { .. })
    ));
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_escaped_newline_is_re_escaped() {
    assert_eq!(gen("x = \"a\\nb\"\n"), "var x = \"a\\nb\";\n");
    assert_eq!(gen("s = 'say \"hi\"'\n"), "var s = \"say \\\"hi\\\"\";\n");
}

#[test]
fn test_print_is_renamed() {
    assert_eq!(gen("print(\"hi\", 1)\n"), "console.log(\"hi\", 1);\n");
}

#[test]
fn test_keyword_arguments_gather_into_object() {
    assert_eq!(
        gen("app.run(port=8080, debug=True)\n"),
        "app.run({port: 8080, debug: true});\n"
    );
    assert_eq!(gen("f(1, x=2)\n"), "f(1, {x: 2});\n");
}

#[test]
fn test_operator_mapping() {
    assert_eq!(
        gen("x = a == b and not c\n"),
        "var x = ((a === b) && !c);\n"
    );
    assert_eq!(gen("y = a != b or d\n"), "var y = ((a !== b) || d);\n");
    assert_eq!(gen("z = a // b\n"), "var z = Math.floor(a / b);\n");
    assert_eq!(gen("p = 2 ** 3\n"), "var p = Math.pow(2, 3);\n");
    assert_eq!(gen("n = -m % 3\n"), "var n = ((-m) % 3);\n");
}

#[test]
fn test_chained_comparison_shares_middle_operand() {
    assert_eq!(gen("ok = 1 < x < 3\n"), "var ok = ((1 < x) && (x < 3));\n");
    assert_eq!(
        gen("ok = a <= f() == b\n"),
        "var ok = ((a <= (__cmp0 = f())) && (__cmp0 === b));\n"
    );
    assert_eq!(
        gen("if 0 < i < n:\n    pass\n"),
        "if ((0 < i) && (i < n)) {\n  // pass\n}\n"
    );
}

#[test]
fn test_host_reserved_names_are_suffixed() {
    assert_eq!(gen("new = 1\nprint(new)\n"), "var new_ = 1;\nconsole.log(new_);\n");
    assert_eq!(gen("null = 2\nnull = null + 1\n"), "var null_ = 2;\nnull_ = (null_ + 1);\n");
    assert_eq!(
        gen("def var(this, function=1):\n    return this\n"),
        "function var_(this_, function_ = 1) {\n  return this_;\n}\n"
    );
    assert_eq!(
        gen("for static in xs:\n    print(static)\n"),
        "for (var static_ of xs) {\n  console.log(static_);\n}\n"
    );
    assert_eq!(gen("x = obj.new\n"), "var x = obj.new;\n");
}

#[test]
fn test_reserved_receiver_and_class_names() {
    let source = "class undefined:\n    def get(this):\n        return this.v\nu = undefined()\n";
    assert_eq!(
        gen(source),
        "class undefined_ {\n  get() {\n    var this_ = this;\n    return this_.v;\n  }\n}\n\
         var u = new undefined_();\n"
    );
}

#[test]
fn test_literals() {
    assert_eq!(
        gen("v = [1, 2.5, None, False]\n"),
        "var v = [1, 2.5, null, false];\n"
    );
    assert_eq!(
        gen("d = {\"a\": 1, 2: x, k: v}\n"),
        "var d = {\"a\": 1, 2: x, [k]: v};\n"
    );
    assert_eq!(gen("e = {}\n"), "var e = {};\n");
}

#[test]
fn test_postfix_chain() {
    assert_eq!(
        gen("n = len(req.json()[\"features\"])\n"),
        "var n = len(req.json()[\"features\"]);\n"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Control flow
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_elif_chain_prints_else_if() {
    let source = "if x > 1:\n    y = 1\nelif x > 0:\n    y = 2\nelse:\n    y = 3\n";
    assert_eq!(
        gen(source),
        "if (x > 1) {\n  var y = 1;\n} else if (x > 0) {\n  y = 2;\n} else {\n  y = 3;\n}\n"
    );
}

#[test]
fn test_plain_condition_is_parenthesized() {
    assert_eq!(gen("if ok:\n    pass\n"), "if (ok) {\n  // pass\n}\n");
}

#[test]
fn test_loops() {
    let source = "total = 0\nfor n in [1, 2]:\n    total = total + n\nwhile total > 0:\n    total = total - 1\n";
    assert_eq!(
        gen(source),
        "var total = 0;\n\
         for (var n of [1, 2]) {\n  total = (total + n);\n}\n\
         while (total > 0) {\n  total = (total - 1);\n}\n"
    );
}

#[test]
fn test_bare_return() {
    assert_eq!(gen("def f():\n    return\n"), "function f() {\n  return;\n}\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Source map & determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_source_map_tracks_statement_lines() {
    let program = parse_source("x = 1\ndef f():\n    return x\n");
    let (code, map) = generate_with_source_map(&program, &config()).unwrap();
    assert_eq!(code, "var x = 1;\nfunction f() {\n  return x;\n}\n");
    assert_eq!(map.entries.len(), 3);
    assert_eq!(map.lookup(1).map(|s| s.start_line), Some(1));
    assert_eq!(map.lookup(3).map(|s| s.start_line), Some(3));
    assert_eq!(map.lookup(4).map(|s| s.start_line), Some(3));
}

#[test]
fn test_output_is_deterministic() {
    let source = "app = Conduit()\n@app.get(\"/\")\ndef h(req, res):\n    res.send(\"ok\")\napp.run(port=8080)\n";
    assert_eq!(gen(source), gen(source));
}
