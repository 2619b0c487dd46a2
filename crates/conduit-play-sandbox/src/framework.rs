//! Mock framework objects exposed to host scripts.
//!
//! `Conduit` apps collect routes and, when run, simulate one request against
//! the first route. `MCPServer` collects tools. Nothing here touches the
//! network; every effect is a line in the output sink.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::builtins::object_from;
use crate::env::Environment;
use crate::error::{SandboxError, SandboxResult};
use crate::interpreter::Interpreter;
use crate::value::{HostObject, Value};

/// Method the generated code calls to register a decorated definition.
pub const REGISTRAR: &str = "__register";

/// Global names of the framework classes, in installation order.
pub const FRAMEWORK_CLASSES: &[&str] = &["Conduit", "MCPServer"];

const DEFAULT_PORT: f64 = 8080.0;
const HTTP_METHODS: &[&str] = &["get", "post", "put", "delete", "patch"];

/// Define the framework classes as globals.
pub fn install(globals: &Environment) {
    globals.define("Conduit", Value::host(ConduitClass));
    globals.define("MCPServer", Value::host(McpServerClass));
}

fn str_arg(args: &[Value], index: usize, what: &str) -> SandboxResult<String> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(other) => Err(SandboxError::TypeMismatch(format!(
            "{what} must be a string, got {}",
            other.type_name()
        ))),
        None => Err(SandboxError::TypeMismatch(format!("missing {what}"))),
    }
}

fn callable_arg(args: &[Value], index: usize, what: &str) -> SandboxResult<Value> {
    match args.get(index) {
        Some(value) if value.is_callable() => Ok(value.clone()),
        Some(other) => Err(SandboxError::TypeMismatch(format!(
            "{what} must be a function, got {}",
            other.type_name()
        ))),
        None => Err(SandboxError::TypeMismatch(format!("missing {what}"))),
    }
}

/// Decorator returned by `app.get(path)` / `mcp.tool(name)` when called
/// directly: applying it to a function forwards to the target's registrar.
#[derive(Debug)]
struct PendingRegistration {
    target: Value,
    args: Vec<Value>,
}

impl HostObject for PendingRegistration {
    fn type_name(&self) -> &'static str {
        "decorator"
    }

    fn call(self: Rc<Self>, interp: &mut Interpreter<'_>, args: Vec<Value>) -> SandboxResult<Value> {
        let handler = callable_arg(&args, 0, "decorated value")?;
        let mut register_args = self.args.clone();
        register_args.push(handler);
        interp.call_method(self.target.clone(), REGISTRAR, register_args)
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Conduit
// ══════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct ConduitClass;

impl HostObject for ConduitClass {
    fn type_name(&self) -> &'static str {
        "Conduit"
    }

    fn construct(self: Rc<Self>, _interp: &mut Interpreter<'_>, _args: Vec<Value>) -> SandboxResult<Value> {
        Ok(Value::host(ConduitApp::default()))
    }
}

#[derive(Debug)]
struct Route {
    method: String,
    path: String,
    handler: Value,
}

/// One throwaway application object.
#[derive(Debug, Default)]
struct ConduitApp {
    routes: RefCell<Vec<Route>>,
}

impl HostObject for ConduitApp {
    fn type_name(&self) -> &'static str {
        "ConduitApp"
    }

    fn call_method(
        self: Rc<Self>,
        interp: &mut Interpreter<'_>,
        name: &str,
        args: Vec<Value>,
    ) -> SandboxResult<Value> {
        match name {
            method if HTTP_METHODS.contains(&method) => {
                let path = str_arg(&args, 0, "route path")?;
                Ok(Value::host(PendingRegistration {
                    target: Value::Host(self),
                    args: vec![Value::string(method), Value::string(path)],
                }))
            }
            REGISTRAR => {
                let method = str_arg(&args, 0, "route method")?.to_uppercase();
                let path = str_arg(&args, 1, "route path")?;
                let handler = callable_arg(&args, 2, "route handler")?;
                debug!(%method, %path, "route registered");
                self.routes.borrow_mut().push(Route {
                    method,
                    path,
                    handler: handler.clone(),
                });
                Ok(handler)
            }
            "set_cors_enabled" => {
                let enabled = args.first().cloned().unwrap_or(Value::Bool(true));
                interp.print(&format!("CORS enabled: {enabled}"));
                Ok(Value::Null)
            }
            "set_rate_limit" => {
                let limit = args.first().cloned().unwrap_or(Value::Null);
                interp.print(&format!("Rate limit set: {limit} requests/minute"));
                Ok(Value::Null)
            }
            "set_logging" => {
                let enabled = args.first().cloned().unwrap_or(Value::Bool(true));
                interp.print(&format!("Logging enabled: {enabled}"));
                Ok(Value::Null)
            }
            "run" => self.run(interp, args.first()),
            _ => Err(SandboxError::TypeMismatch(format!(
                "ConduitApp has no method '{name}'"
            ))),
        }
    }
}

impl ConduitApp {
    fn run(&self, interp: &mut Interpreter<'_>, options: Option<&Value>) -> SandboxResult<Value> {
        let port = match options {
            Some(Value::Number(n)) => Value::Number(*n),
            Some(Value::Object(fields)) => fields
                .borrow()
                .get("port")
                .cloned()
                .unwrap_or(Value::Number(DEFAULT_PORT)),
            _ => Value::Number(DEFAULT_PORT),
        };
        interp.print(&format!("Conduit server starting on port {port}"));

        // Snapshot so handlers may register more routes without a borrow clash.
        let (listing, first) = {
            let routes = self.routes.borrow();
            let listing: Vec<String> = routes
                .iter()
                .map(|r| format!("  {} {}", r.method, r.path))
                .collect();
            let first = routes
                .first()
                .map(|r| (r.method.clone(), r.path.clone(), r.handler.clone()));
            (listing, first)
        };

        let Some((method, path, handler)) = first else {
            interp.print("No routes registered");
            return Ok(Value::Null);
        };
        interp.print("Registered routes:");
        for line in &listing {
            interp.print(line);
        }

        interp.print(&format!("Simulating {method} {path}"));
        debug!(%method, %path, "simulating request");
        let body = Value::from_json(&interp.config().request_body);
        let request = Value::host(MockRequest {
            method,
            path,
            body,
        });
        let response = Value::host(MockResponse);

        match interp.call_value(handler, vec![request, response]) {
            Ok(Value::Null) => {}
            Ok(value) => interp.print(&format!("Response: {value}")),
            Err(e) if e.is_resource_limit() => return Err(e),
            Err(e) => {
                debug!(error = %e, "handler failed");
                interp.print(&format!("Handler error: {e}"));
            }
        }
        Ok(Value::Null)
    }
}

/// The single fabricated request handed to the first route.
#[derive(Debug)]
struct MockRequest {
    method: String,
    path: String,
    body: Value,
}

impl HostObject for MockRequest {
    fn type_name(&self) -> &'static str {
        "Request"
    }

    fn get_member(&self, name: &str) -> Option<Value> {
        match name {
            "method" => Some(Value::string(self.method.clone())),
            "path" => Some(Value::string(self.path.clone())),
            "body" => Some(self.body.clone()),
            "params" | "query" | "headers" => Some(object_from([])),
            _ => None,
        }
    }

    fn call_method(
        self: Rc<Self>,
        _interp: &mut Interpreter<'_>,
        name: &str,
        _args: Vec<Value>,
    ) -> SandboxResult<Value> {
        match name {
            "json" | "get_json" => Ok(self.body.clone()),
            _ => Err(SandboxError::TypeMismatch(format!(
                "Request has no method '{name}'"
            ))),
        }
    }
}

/// Response whose every method only writes a line.
#[derive(Debug)]
struct MockResponse;

impl HostObject for MockResponse {
    fn type_name(&self) -> &'static str {
        "Response"
    }

    fn call_method(
        self: Rc<Self>,
        interp: &mut Interpreter<'_>,
        name: &str,
        args: Vec<Value>,
    ) -> SandboxResult<Value> {
        let first = args.first().cloned().unwrap_or(Value::Null);
        match name {
            "json" => {
                interp.print(&format!("Response: {}", first.to_json_string()));
                Ok(Value::Null)
            }
            "send" => {
                interp.print(&format!("Response: {first}"));
                Ok(Value::Null)
            }
            "status" => {
                interp.print(&format!("Status: {first}"));
                Ok(Value::Host(self))
            }
            "set_header" => {
                let value = args.get(1).cloned().unwrap_or(Value::Null);
                interp.print(&format!("Header: {first}: {value}"));
                Ok(Value::Host(self))
            }
            "write" => {
                interp.print(&format!("Write: {first}"));
                Ok(Value::Null)
            }
            "flush" => {
                interp.print("Response flushed");
                Ok(Value::Null)
            }
            _ => Err(SandboxError::TypeMismatch(format!(
                "Response has no method '{name}'"
            ))),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// MCPServer
// ══════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct McpServerClass;

impl HostObject for McpServerClass {
    fn type_name(&self) -> &'static str {
        "MCPServer"
    }

    /// `new MCPServer({name, version})` or `new MCPServer(name, version)`.
    fn construct(self: Rc<Self>, _interp: &mut Interpreter<'_>, args: Vec<Value>) -> SandboxResult<Value> {
        let (name, version) = match args.as_slice() {
            [Value::Object(options)] => {
                let options = options.borrow();
                (options.get("name").cloned(), options.get("version").cloned())
            }
            _ => (args.first().cloned(), args.get(1).cloned()),
        };
        Ok(Value::host(McpServer {
            name: name.map_or_else(|| "mcp-server".to_string(), |v| v.to_string()),
            version: version.map_or_else(|| "1.0.0".to_string(), |v| v.to_string()),
            tools: RefCell::new(Vec::new()),
        }))
    }
}

#[derive(Debug)]
struct McpServer {
    name: String,
    version: String,
    tools: RefCell<Vec<(String, Value)>>,
}

impl HostObject for McpServer {
    fn type_name(&self) -> &'static str {
        "MCPServer"
    }

    fn get_member(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::string(self.name.clone())),
            "version" => Some(Value::string(self.version.clone())),
            _ => None,
        }
    }

    fn call_method(
        self: Rc<Self>,
        interp: &mut Interpreter<'_>,
        name: &str,
        args: Vec<Value>,
    ) -> SandboxResult<Value> {
        match name {
            "tool" => {
                let mut pending = vec![Value::string("tool")];
                pending.extend(args.first().cloned());
                Ok(Value::host(PendingRegistration {
                    target: Value::Host(self),
                    args: pending,
                }))
            }
            REGISTRAR => {
                let kind = str_arg(&args, 0, "registration kind")?;
                if kind != "tool" {
                    return Err(SandboxError::TypeMismatch(format!(
                        "MCPServer cannot register a '{kind}'"
                    )));
                }
                // `@mcp.tool()` passes no name; the function's own name is used.
                let (tool_name, function) = match args.len() {
                    2 => {
                        let function = callable_arg(&args, 1, "tool function")?;
                        let tool_name = match &function {
                            Value::Function(closure) => closure.decl.name.clone(),
                            other => other.to_string(),
                        };
                        (tool_name, function)
                    }
                    _ => (
                        str_arg(&args, 1, "tool name")?,
                        callable_arg(&args, 2, "tool function")?,
                    ),
                };
                debug!(tool = %tool_name, "tool registered");
                self.tools.borrow_mut().push((tool_name, function.clone()));
                Ok(function)
            }
            "list_tools" => Ok(Value::list(
                self.tools
                    .borrow()
                    .iter()
                    .map(|(name, _)| Value::string(name.clone()))
                    .collect(),
            )),
            "call_tool" => {
                let tool_name = str_arg(&args, 0, "tool name")?;
                let function = self
                    .tools
                    .borrow()
                    .iter()
                    .find(|(name, _)| *name == tool_name)
                    .map(|(_, function)| function.clone())
                    .ok_or_else(|| SandboxError::Runtime(format!("unknown tool '{tool_name}'")))?;
                interp.call_value(function, args.into_iter().skip(1).collect())
            }
            "run" => {
                interp.print(&format!("MCP server '{}' v{} ready", self.name, self.version));
                let names: Vec<String> = self.tools.borrow().iter().map(|(n, _)| n.clone()).collect();
                if names.is_empty() {
                    interp.print("No tools registered");
                } else {
                    interp.print("Registered tools:");
                    for name in names {
                        interp.print(&format!("  {name}"));
                    }
                }
                Ok(Value::Null)
            }
            _ => Err(SandboxError::TypeMismatch(format!(
                "MCPServer has no method '{name}'"
            ))),
        }
    }
}
