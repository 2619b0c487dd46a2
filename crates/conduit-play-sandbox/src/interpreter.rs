//! Tree-walking evaluator for the host script.

use std::rc::Rc;

use tracing::trace;

use crate::builtins;
use crate::env::Environment;
use crate::error::{SandboxError, SandboxResult};
use crate::framework;
use crate::heap;
use crate::methods::{self, property_key, resolve_index};
use crate::output::OutputSink;
use crate::sandbox::SandboxConfig;
use crate::script::ast::*;
use crate::value::{format_number, ClassValue, Closure, Instance, Value};

/// Longest string, in bytes, that `+` or `*` may build.
pub const MAX_STRING_BYTES: usize = 16 * 1024 * 1024;

/// Most items a list concatenation may produce.
pub const MAX_LIST_ITEMS: usize = 1024 * 1024;

/// Walks host script statements and expressions, charging one step for each.
pub struct Interpreter<'a> {
    config: &'a SandboxConfig,
    out: &'a mut dyn OutputSink,
    globals: Environment,
    steps: u64,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    /// A fresh interpreter with builtins and framework classes installed.
    pub fn new(config: &'a SandboxConfig, out: &'a mut dyn OutputSink) -> Self {
        let globals = Environment::new();
        builtins::install(&globals);
        framework::install(&globals);
        Self {
            config,
            out,
            globals,
            steps: 0,
            depth: 0,
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        self.config
    }

    /// Steps consumed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Send one line to the output sink.
    pub fn print(&mut self, line: &str) {
        self.out.write_line(line);
    }

    /// Run a whole script in the global scope.
    pub fn run(&mut self, script: &Script) -> SandboxResult<()> {
        let globals = self.globals.clone();
        for stmt in &script.body {
            match self.exec_stmt(stmt, &globals) {
                Ok(()) => {}
                Err(SandboxError::Return(_)) => {
                    return Err(SandboxError::Runtime(
                        "'return' outside of a function".into(),
                    )
                    .at_line(stmt.line))
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // ── Budget ───────────────────────────────────────────────────────────

    fn tick(&mut self) -> SandboxResult<()> {
        self.charge(1)
    }

    /// Consume `n` steps; fails once the budget is exceeded.
    pub fn charge(&mut self, n: u64) -> SandboxResult<()> {
        self.steps = self.steps.saturating_add(n);
        if self.steps > self.config.max_steps {
            Err(SandboxError::BudgetExhausted {
                limit: self.config.max_steps,
            })
        } else {
            Ok(())
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn exec_block(&mut self, body: &[Stmt], env: &Environment) -> SandboxResult<()> {
        for stmt in body {
            self.exec_stmt(stmt, env)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> SandboxResult<()> {
        self.tick().map_err(|e| e.at_line(stmt.line))?;
        self.exec_stmt_kind(&stmt.kind, env)
            .map_err(|e| e.at_line(stmt.line))
    }

    fn exec_stmt_kind(&mut self, kind: &StmtKind, env: &Environment) -> SandboxResult<()> {
        match kind {
            StmtKind::Var { name, init } => {
                let value = match init {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Null,
                };
                env.define(name, value);
            }
            StmtKind::Function(decl) => {
                let closure = Closure {
                    decl: Rc::clone(decl),
                    env: env.clone(),
                };
                env.define(&decl.name, Value::Function(Rc::new(closure)));
            }
            StmtKind::Class(decl) => {
                let class = Rc::new(ClassValue {
                    decl: Rc::clone(decl),
                    env: env.clone(),
                    statics: Default::default(),
                });
                heap::track(&class);
                // Statics may refer to the class itself.
                env.define(&decl.name, Value::Class(Rc::clone(&class)));
                for (name, expr) in &decl.statics {
                    let value = self.eval(expr, env)?;
                    class.statics.borrow_mut().insert(name.clone(), value);
                }
            }
            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                if self.eval(condition, env)?.is_truthy() {
                    self.exec_block(then_body, env)?;
                } else if let Some(else_body) = else_body {
                    self.exec_block(else_body, env)?;
                }
            }
            StmtKind::While { condition, body } => {
                while self.eval(condition, env)?.is_truthy() {
                    self.exec_block(body, env)?;
                }
            }
            StmtKind::ForOf { name, iter, body } => {
                let iterable = self.eval(iter, env)?;
                let items = iterate(iterable)?;
                for item in items {
                    env.define(name, item);
                    self.exec_block(body, env)?;
                }
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Null,
                };
                return Err(SandboxError::Return(value));
            }
            StmtKind::Expr(expr) => {
                self.eval(expr, env)?;
            }
            StmtKind::Empty => {}
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn eval(&mut self, expr: &Expr, env: &Environment) -> SandboxResult<Value> {
        self.tick()?;
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::Str(s) => Ok(Value::string(s.clone())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::This => env
                .get("this")
                .ok_or_else(|| SandboxError::Runtime("'this' used outside of a method".into())),
            ExprKind::Ident(name) => env
                .get(name)
                .ok_or_else(|| SandboxError::UndefinedVariable(name.clone())),
            ExprKind::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, env)?);
                }
                Ok(Value::list(values))
            }
            ExprKind::Object(entries) => {
                let mut fields = std::collections::BTreeMap::new();
                for (key, value) in entries {
                    let key = match key {
                        PropKey::Static(name) => name.clone(),
                        PropKey::Computed(expr) => property_key(&self.eval(expr, env)?)?,
                    };
                    fields.insert(key, self.eval(value, env)?);
                }
                Ok(Value::object(fields))
            }
            ExprKind::Member { object, name } => {
                let object = self.eval(object, env)?;
                self.get_member(&object, name)
            }
            ExprKind::Index { object, index } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                self.get_index(&object, &index)
            }
            ExprKind::Call { callee, args } => {
                if let ExprKind::Member { object, name } = &callee.kind {
                    let receiver = self.eval(object, env)?;
                    let args = self.eval_args(args, env)?;
                    return self.call_method(receiver, name, args);
                }
                let callee = self.eval(callee, env)?;
                let args = self.eval_args(args, env)?;
                self.call_value(callee, args)
            }
            ExprKind::New { callee, args } => {
                let callee = self.eval(callee, env)?;
                let args = self.eval_args(args, env)?;
                self.construct(callee, args)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand, env)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(SandboxError::TypeMismatch(format!(
                            "bad operand type for unary -: {}",
                            other.type_name()
                        ))),
                    },
                }
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                binary_op(*op, left, right)
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.eval(left, env)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right, env)
                }
            }
            ExprKind::Assign { target, value } => {
                let value = self.eval(value, env)?;
                self.assign(target, value.clone(), env)?;
                Ok(value)
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr], env: &Environment) -> SandboxResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, env)).collect()
    }

    fn assign(&mut self, target: &Expr, value: Value, env: &Environment) -> SandboxResult<()> {
        match &target.kind {
            ExprKind::Ident(name) => {
                if !env.set(name, value.clone()) {
                    env.define(name, value);
                }
                Ok(())
            }
            ExprKind::Member { object, name } => {
                let object = self.eval(object, env)?;
                set_member(&object, name, value)
            }
            ExprKind::Index { object, index } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                set_index(&object, &index, value)
            }
            _ => Err(SandboxError::Runtime("invalid assignment target".into())),
        }
    }

    // ── Property access ──────────────────────────────────────────────────

    fn get_member(&self, object: &Value, name: &str) -> SandboxResult<Value> {
        let bound = || Value::BoundMethod {
            receiver: Box::new(object.clone()),
            name: name.to_string(),
        };
        match object {
            Value::Object(fields) => Ok(fields.borrow().get(name).cloned().unwrap_or(Value::Null)),
            Value::List(items) if name == "length" => Ok(Value::Number(items.borrow().len() as f64)),
            Value::Str(s) if name == "length" => Ok(Value::Number(s.chars().count() as f64)),
            Value::Instance(instance) => {
                if let Some(field) = instance.fields.borrow().get(name) {
                    return Ok(field.clone());
                }
                if instance.class.find_method(name).is_some() {
                    return Ok(bound());
                }
                Ok(instance
                    .class
                    .statics
                    .borrow()
                    .get(name)
                    .cloned()
                    .unwrap_or(Value::Null))
            }
            Value::Class(class) => Ok(class.statics.borrow().get(name).cloned().unwrap_or(Value::Null)),
            Value::Host(host) => Ok(host.get_member(name).unwrap_or_else(bound)),
            Value::Null => Err(SandboxError::TypeMismatch(format!(
                "cannot read property '{name}' of null"
            ))),
            _ => Ok(bound()),
        }
    }

    fn get_index(&self, object: &Value, index: &Value) -> SandboxResult<Value> {
        match (object, index) {
            (Value::List(items), Value::Number(i)) => {
                let items = items.borrow();
                resolve_index(*i, items.len())
                    .map(|at| items[at].clone())
                    .ok_or_else(|| {
                        SandboxError::Runtime(format!("list index {} out of range", format_number(*i)))
                    })
            }
            (Value::Str(s), Value::Number(i)) => {
                let chars: Vec<char> = s.chars().collect();
                resolve_index(*i, chars.len())
                    .map(|at| Value::string(chars[at].to_string()))
                    .ok_or_else(|| {
                        SandboxError::Runtime(format!("string index {} out of range", format_number(*i)))
                    })
            }
            (Value::Object(fields), key) => {
                let key = property_key(key)?;
                Ok(fields.borrow().get(&key).cloned().unwrap_or(Value::Null))
            }
            (Value::Instance(_) | Value::Host(_) | Value::Class(_), Value::Str(name)) => {
                self.get_member(object, name)
            }
            (object, index) => Err(SandboxError::TypeMismatch(format!(
                "cannot index {} with {}",
                object.type_name(),
                index.type_name()
            ))),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════

    /// Call any callable value with already evaluated arguments.
    pub fn call_value(&mut self, callee: Value, args: Vec<Value>) -> SandboxResult<Value> {
        match callee {
            Value::Function(closure) => self.invoke(&closure.decl, &closure.env, None, args),
            Value::BoundMethod { receiver, name } => self.call_method(*receiver, &name, args),
            Value::Builtin(builtin) => builtins::call(self, builtin, args),
            Value::Host(host) => host.call(self, args),
            Value::Class(class) => Err(SandboxError::TypeMismatch(format!(
                "class constructor {} cannot be invoked without 'new'",
                class.decl.name
            ))),
            other => Err(SandboxError::TypeMismatch(format!(
                "{} is not a function",
                other.type_name()
            ))),
        }
    }

    /// `receiver.name(args)`.
    pub fn call_method(&mut self, receiver: Value, name: &str, args: Vec<Value>) -> SandboxResult<Value> {
        match &receiver {
            Value::Object(fields) => {
                let property = fields.borrow().get(name).cloned();
                match property {
                    Some(property) if property.is_callable() => self.call_value(property, args),
                    _ => methods::object_method(fields, name, args),
                }
            }
            Value::Instance(instance) => {
                let field = instance.fields.borrow().get(name).cloned();
                if let Some(field) = field {
                    return self.call_value(field, args);
                }
                if let Some(method) = instance.class.find_method(name) {
                    let env = instance.class.env.clone();
                    return self.invoke(&method, &env, Some(receiver.clone()), args);
                }
                let class = Value::Class(Rc::clone(&instance.class));
                self.call_method(class, name, args)
            }
            Value::Class(class) => {
                let property = class.statics.borrow().get(name).cloned();
                match property {
                    Some(property) => self.call_value(property, args),
                    None => Err(SandboxError::TypeMismatch(format!(
                        "{}.{name} is not a function",
                        class.decl.name
                    ))),
                }
            }
            Value::Host(host) => Rc::clone(host).call_method(self, name, args),
            Value::List(items) => methods::list_method(items, name, args),
            Value::Str(s) => methods::str_method(s, name, args),
            Value::Number(n) => methods::number_method(*n, name, args),
            Value::Null => Err(SandboxError::TypeMismatch(format!(
                "cannot read property '{name}' of null"
            ))),
            other => Err(SandboxError::TypeMismatch(format!(
                "{}.{name} is not a function",
                other.type_name()
            ))),
        }
    }

    /// `new callee(args)`.
    pub fn construct(&mut self, callee: Value, args: Vec<Value>) -> SandboxResult<Value> {
        match callee {
            Value::Class(class) => {
                let instance = Rc::new(Instance {
                    class: Rc::clone(&class),
                    fields: Default::default(),
                });
                heap::track(&instance);
                let instance = Value::Instance(instance);
                if let Some(constructor) = &class.decl.constructor {
                    self.invoke(constructor, &class.env, Some(instance.clone()), args)?;
                }
                Ok(instance)
            }
            Value::Host(host) => host.construct(self, args),
            other => Err(SandboxError::TypeMismatch(format!(
                "{} is not a constructor",
                other.type_name()
            ))),
        }
    }

    /// Run a function body in a fresh scope below `closure_env`.
    fn invoke(
        &mut self,
        decl: &Rc<FunctionDecl>,
        closure_env: &Environment,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> SandboxResult<Value> {
        if self.depth >= self.config.max_call_depth {
            return Err(SandboxError::CallDepthExceeded {
                limit: self.config.max_call_depth,
            });
        }
        trace!(function = %decl.name, depth = self.depth, "call");
        self.depth += 1;
        let result = self.invoke_body(decl, closure_env, this, args);
        self.depth -= 1;
        match result {
            Ok(()) => Ok(Value::Null),
            Err(SandboxError::Return(value)) => Ok(value),
            Err(e) => Err(e),
        }
    }

    fn invoke_body(
        &mut self,
        decl: &FunctionDecl,
        closure_env: &Environment,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> SandboxResult<()> {
        let env = closure_env.child();
        if let Some(this) = this {
            env.define("this", this);
        }
        let mut args = args.into_iter();
        for param in &decl.params {
            let value = match (args.next(), &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self.eval(default, &env)?,
                (None, None) => Value::Null,
            };
            env.define(&param.name, value);
        }
        self.exec_block(&decl.body, &env)
    }
}

/// Snapshot of the values a `for … of` loop visits. Objects iterate
/// their keys.
fn iterate(value: Value) -> SandboxResult<Vec<Value>> {
    match value {
        Value::List(items) => Ok(items.borrow().clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
        Value::Object(fields) => Ok(fields.borrow().keys().cloned().map(Value::Str).collect()),
        other => Err(SandboxError::TypeMismatch(format!(
            "{} is not iterable",
            other.type_name()
        ))),
    }
}

fn set_member(object: &Value, name: &str, value: Value) -> SandboxResult<()> {
    match object {
        Value::Object(fields) => {
            fields.borrow_mut().insert(name.to_string(), value);
        }
        Value::Instance(instance) => {
            instance.fields.borrow_mut().insert(name.to_string(), value);
        }
        Value::Class(class) => {
            class.statics.borrow_mut().insert(name.to_string(), value);
        }
        other => {
            return Err(SandboxError::TypeMismatch(format!(
                "cannot set property '{name}' on {}",
                other.type_name()
            )))
        }
    }
    Ok(())
}

fn set_index(object: &Value, index: &Value, value: Value) -> SandboxResult<()> {
    match (object, index) {
        (Value::List(items), Value::Number(i)) => {
            let mut items = items.borrow_mut();
            let at = resolve_index(*i, items.len()).ok_or_else(|| {
                SandboxError::Runtime(format!(
                    "list assignment index {} out of range",
                    format_number(*i)
                ))
            })?;
            items[at] = value;
            Ok(())
        }
        (Value::Object(_) | Value::Instance(_) | Value::Class(_), key) => {
            set_member(object, &property_key(key)?, value)
        }
        (object, index) => Err(SandboxError::TypeMismatch(format!(
            "cannot index {} with {}",
            object.type_name(),
            index.type_name()
        ))),
    }
}

fn number_operands(op: BinaryOp, left: &Value, right: &Value) -> SandboxResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(SandboxError::TypeMismatch(format!(
            "unsupported operand types for {}: {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn too_large(kind: &str) -> SandboxError {
    SandboxError::Runtime(format!("{kind} result is too large"))
}

/// Non-short-circuit binary operators.
fn binary_op(op: BinaryOp, left: Value, right: Value) -> SandboxResult<Value> {
    match op {
        BinaryOp::Add => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                let text = format!("{left}{right}");
                if text.len() > MAX_STRING_BYTES {
                    return Err(too_large("string"));
                }
                Ok(Value::string(text))
            }
            (Value::List(a), Value::List(b)) => {
                if a.borrow().len() + b.borrow().len() > MAX_LIST_ITEMS {
                    return Err(too_large("list"));
                }
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Ok(Value::list(items))
            }
            _ => Err(SandboxError::TypeMismatch(format!(
                "unsupported operand types for +: {} and {}",
                left.type_name(),
                right.type_name()
            ))),
        },
        BinaryOp::Sub => {
            let (a, b) = number_operands(op, &left, &right)?;
            Ok(Value::Number(a - b))
        }
        BinaryOp::Mul => match (&left, &right) {
            (Value::Str(s), Value::Number(n)) | (Value::Number(n), Value::Str(s)) => {
                // NaN and negative counts repeat nothing.
                let count = n.max(0.0).trunc();
                if s.is_empty() || count < 1.0 {
                    return Ok(Value::string(String::new()));
                }
                if count * s.len() as f64 > MAX_STRING_BYTES as f64 {
                    return Err(too_large("string"));
                }
                Ok(Value::string(s.repeat(count as usize)))
            }
            _ => {
                let (a, b) = number_operands(op, &left, &right)?;
                Ok(Value::Number(a * b))
            }
        },
        BinaryOp::Div => {
            let (a, b) = number_operands(op, &left, &right)?;
            if b == 0.0 {
                return Err(SandboxError::ArithmeticTrap("division by zero".into()));
            }
            Ok(Value::Number(a / b))
        }
        BinaryOp::Mod => {
            let (a, b) = number_operands(op, &left, &right)?;
            if b == 0.0 {
                return Err(SandboxError::ArithmeticTrap("modulo by zero".into()));
            }
            Ok(Value::Number(a % b))
        }
        BinaryOp::Eq => Ok(Value::Bool(left.strict_eq(&right))),
        BinaryOp::NotEq => Ok(Value::Bool(!left.strict_eq(&right))),
        BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEq | BinaryOp::GreaterEq => {
            let ordering = methods::compare_values(&left, &right)?;
            Ok(Value::Bool(match op {
                BinaryOp::Less => ordering.is_lt(),
                BinaryOp::Greater => ordering.is_gt(),
                BinaryOp::LessEq => ordering.is_le(),
                _ => ordering.is_ge(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::BufferSink;
    use crate::script::parse_script;

    fn run(code: &str) -> (SandboxResult<()>, Vec<String>) {
        let config = SandboxConfig::default();
        let mut sink = BufferSink::new();
        let result = {
            let _heap = heap::Session::begin();
            let mut interp = Interpreter::new(&config, &mut sink);
            let script = parse_script(code).unwrap();
            interp.run(&script)
        };
        (result, sink.into_lines())
    }

    #[test]
    fn test_string_concatenation_uses_display() {
        let (result, out) = run("console.log(\"n=\" + 3, [1, 2] + [3]);");
        result.unwrap();
        assert_eq!(out, ["n=3 [1,2,3]"]);
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let (result, out) = run("console.log(null || \"x\", 0 && 1, !0);");
        result.unwrap();
        assert_eq!(out, ["x 0 true"]);
    }

    #[test]
    fn test_division_by_zero_traps_with_line() {
        let (result, _) = run("var a = 1;\nvar b = a / 0;\n");
        let err = result.unwrap_err();
        assert!(matches!(err.root(), SandboxError::ArithmeticTrap(_)));
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_undeclared_assignment_defines_locally() {
        let (result, out) = run(
            "function f() {\n  y = 2;\n  return y;\n}\nconsole.log(f());\nconsole.log(y);\n",
        );
        assert_eq!(out, ["2"]);
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "y is not defined");
        assert_eq!(err.line(), Some(6));
    }

    #[test]
    fn test_top_level_return_is_error() {
        let (result, _) = run("return 1;");
        assert!(matches!(result.unwrap_err().root(), SandboxError::Runtime(_)));
    }

    #[test]
    fn test_string_repeat_handles_odd_counts() {
        let (result, out) = run("console.log(\"ab\" * 3, 2 * \"x\", \"a\" * -1, \"\" * 1000000000);");
        result.unwrap();
        assert_eq!(out, ["ababab xx  "]);
    }

    #[test]
    fn test_huge_string_repeat_is_runtime_error() {
        let (result, _) = run("var n = 1000000000 * 1000000000;\nvar s = \"abc\" * n;\n");
        let err = result.unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(
            matches!(err.root(), SandboxError::Runtime(m) if m == "string result is too large"),
            "{err:?}"
        );
    }

    #[test]
    fn test_doubling_string_stops_at_size_limit() {
        let (result, _) = run("var s = \"ab\";\nwhile (true) {\n  s = s + s;\n}\n");
        let err = result.unwrap_err();
        assert!(matches!(err.root(), SandboxError::Runtime(_)), "{err:?}");
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_cycles_are_released_when_the_session_ends() {
        let config = SandboxConfig::default();
        let mut sink = BufferSink::new();
        let (node, xs) = {
            let _heap = heap::Session::begin();
            let mut interp = Interpreter::new(&config, &mut sink);
            let script = parse_script(
                "class Node {\n  constructor() {\n    this.me = this;\n  }\n}\n\
                 function make() {\n  var xs = [];\n  xs.push(xs);\n  return xs;\n}\n\
                 var n = new Node();\nvar xs = make();\n",
            )
            .unwrap();
            interp.run(&script).unwrap();
            let Some(Value::Instance(node)) = interp.globals().get("n") else {
                panic!("n is not an instance");
            };
            let Some(Value::List(xs)) = interp.globals().get("xs") else {
                panic!("xs is not a list");
            };
            (Rc::downgrade(&node), Rc::downgrade(&xs))
        };
        assert_eq!(node.strong_count(), 0);
        assert_eq!(xs.strong_count(), 0);
    }

    #[test]
    fn test_negative_list_index() {
        let (result, out) = run("var xs = [1, 2, 3];\nconsole.log(xs[-1], xs.length);");
        result.unwrap();
        assert_eq!(out, ["3 3"]);
    }
}
