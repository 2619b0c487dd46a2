//! Runtime values of the host script.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::builtins::Builtin;
use crate::env::Environment;
use crate::error::{SandboxError, SandboxResult};
use crate::heap::{self, Clear};
use crate::interpreter::Interpreter;
use crate::script::ast::{ClassDecl, FunctionDecl};

/// A host script value.
///
/// Lists and objects are shared and mutable, like their JavaScript
/// counterparts; objects keep their keys sorted so printed output is stable.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<BTreeMap<String, Value>>>),
    Function(Rc<Closure>),
    Class(Rc<ClassValue>),
    Instance(Rc<Instance>),
    /// A method looked up on a receiver but not yet called.
    BoundMethod { receiver: Box<Value>, name: String },
    Builtin(Builtin),
    Host(Rc<dyn HostObject>),
}

/// A function declaration together with the environment it closes over.
pub struct Closure {
    pub decl: Rc<FunctionDecl>,
    pub env: Environment,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure({})", self.decl.name)
    }
}

/// A class declared by the script.
pub struct ClassValue {
    pub decl: Rc<ClassDecl>,
    pub env: Environment,
    pub statics: RefCell<BTreeMap<String, Value>>,
}

impl ClassValue {
    pub fn find_method(&self, name: &str) -> Option<Rc<FunctionDecl>> {
        self.decl.methods.iter().find(|m| m.name == name).cloned()
    }
}

impl Clear for ClassValue {
    fn clear(&self) {
        self.statics.clear();
    }
}

impl fmt::Debug for ClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.decl.name)
    }
}

/// An object created with `new` from a script class.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<ClassValue>,
    pub fields: RefCell<BTreeMap<String, Value>>,
}

impl Clear for Instance {
    fn clear(&self) {
        self.fields.clear();
    }
}

/// A native object exposed to the script (framework mocks).
///
/// Every operation defaults to a type error, so implementors only provide
/// what they support.
pub trait HostObject: fmt::Debug {
    /// Name used in messages and when printed.
    fn type_name(&self) -> &'static str;

    /// Property read. `None` falls back to a bound method.
    fn get_member(&self, _name: &str) -> Option<Value> {
        None
    }

    fn call_method(
        self: Rc<Self>,
        _interp: &mut Interpreter<'_>,
        name: &str,
        _args: Vec<Value>,
    ) -> SandboxResult<Value> {
        Err(SandboxError::TypeMismatch(format!(
            "{} has no method '{name}'",
            self.type_name()
        )))
    }

    fn call(self: Rc<Self>, _interp: &mut Interpreter<'_>, _args: Vec<Value>) -> SandboxResult<Value> {
        Err(SandboxError::TypeMismatch(format!(
            "{} is not a function",
            self.type_name()
        )))
    }

    fn construct(
        self: Rc<Self>,
        _interp: &mut Interpreter<'_>,
        _args: Vec<Value>,
    ) -> SandboxResult<Value> {
        Err(SandboxError::TypeMismatch(format!(
            "{} is not a constructor",
            self.type_name()
        )))
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        let items = Rc::new(RefCell::new(items));
        heap::track(&items);
        Value::List(items)
    }

    pub fn object(fields: BTreeMap<String, Value>) -> Self {
        let fields = Rc::new(RefCell::new(fields));
        heap::track(&fields);
        Value::Object(fields)
    }

    pub fn host(object: impl HostObject + 'static) -> Self {
        Value::Host(Rc::new(object))
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Function(_) | Value::BoundMethod { .. } | Value::Builtin(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Host(h) => h.type_name(),
        }
    }

    /// JavaScript truthiness: `null`, `false`, `0`, `NaN` and `""` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Strict equality (`===`): primitives by value, everything else by
    /// identity.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => {
                std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
            }
            _ => false,
        }
    }

    /// Whether calling this value can succeed.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::BoundMethod { .. } | Value::Builtin(_) | Value::Host(_)
        )
    }

    /// Convert to JSON. Functions and host objects have no JSON form and
    /// become `null`. A container met again inside itself becomes the string
    /// `"[Circular]"`, and nesting past [`MAX_RENDER_DEPTH`] becomes `"[...]"`.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_within(&mut Vec::new())
    }

    /// `open` holds the containers currently being rendered, outermost first.
    fn to_json_within(&self, open: &mut Vec<*const ()>) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => nested(open, Rc::as_ptr(items).cast(), |open| {
                serde_json::Value::Array(
                    items
                        .borrow()
                        .iter()
                        .map(|item| item.to_json_within(open))
                        .collect(),
                )
            }),
            Value::Object(fields) => nested(open, Rc::as_ptr(fields).cast(), |open| {
                fields_to_json(&fields.borrow(), open)
            }),
            Value::Instance(instance) => nested(open, Rc::as_ptr(instance).cast(), |open| {
                fields_to_json(&instance.fields.borrow(), open)
            }),
            Value::Function(_)
            | Value::Class(_)
            | Value::BoundMethod { .. }
            | Value::Builtin(_)
            | Value::Host(_) => serde_json::Value::Null,
        }
    }

    /// Convert from JSON (used for the simulated request body).
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::string(s.clone()),
            serde_json::Value::Array(items) => Value::list(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Compact JSON text.
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Containers nested deeper than this render as `"[...]"`.
pub const MAX_RENDER_DEPTH: usize = 100;

fn nested(
    open: &mut Vec<*const ()>,
    id: *const (),
    render: impl FnOnce(&mut Vec<*const ()>) -> serde_json::Value,
) -> serde_json::Value {
    if open.contains(&id) {
        return serde_json::Value::String("[Circular]".to_string());
    }
    if open.len() >= MAX_RENDER_DEPTH {
        return serde_json::Value::String("[...]".to_string());
    }
    open.push(id);
    let json = render(open);
    open.pop();
    json
}

fn fields_to_json(fields: &BTreeMap<String, Value>, open: &mut Vec<*const ()>) -> serde_json::Value {
    serde_json::Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json_within(open)))
            .collect(),
    )
}

/// Integral numbers serialize without a fractional part.
fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Number formatting as the host prints it: `3`, `0.5`, `NaN`, `Infinity`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::List(_) | Value::Object(_) => f.write_str(&self.to_json_string()),
            Value::Function(closure) => write!(f, "[Function: {}]", closure.decl.name),
            Value::Class(class) => write!(f, "[class {}]", class.decl.name),
            Value::Instance(instance) => {
                write!(f, "{} {}", instance.class.decl.name, self.to_json_string())
            }
            Value::BoundMethod { name, .. } => write!(f, "[Function: {name}]"),
            Value::Builtin(builtin) => write!(f, "[Function: {}]", builtin.name()),
            Value::Host(host) => write!(f, "[{}]", host.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("0").is_truthy());
        assert!(Value::list(vec![]).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(8080.0).to_string(), "8080");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Null.to_string(), "null");
        let list = Value::list(vec![Value::Number(1.0), Value::string("a")]);
        assert_eq!(list.to_string(), r#"[1,"a"]"#);
    }

    #[test]
    fn test_self_containing_list_prints_circular_marker() {
        let list = Value::list(vec![Value::Number(1.0)]);
        let Value::List(items) = &list else {
            unreachable!()
        };
        items.borrow_mut().push(list.clone());
        assert_eq!(list.to_string(), r#"[1,"[Circular]"]"#);
        items.borrow_mut().clear();
    }

    #[test]
    fn test_shared_value_is_not_circular() {
        let inner = Value::list(vec![Value::Number(1.0)]);
        let outer = Value::list(vec![inner.clone(), inner]);
        assert_eq!(outer.to_string(), "[[1],[1]]");
    }

    #[test]
    fn test_deep_nesting_is_cut_off() {
        let mut value = Value::Number(0.0);
        for _ in 0..MAX_RENDER_DEPTH + 5 {
            value = Value::list(vec![value]);
        }
        let text = value.to_string();
        assert!(text.contains(r#""[...]""#), "{text}");
        assert!(!text.contains('0'));
    }

    #[test]
    fn test_json_round_trip_of_request_body() {
        let json = serde_json::json!({"features": [1, 2, 3], "ok": true});
        let value = Value::from_json(&json);
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_strict_equality_is_identity_for_lists() {
        let a = Value::list(vec![]);
        let b = Value::list(vec![]);
        assert!(a.strict_eq(&a.clone()));
        assert!(!a.strict_eq(&b));
        assert!(Value::string("x").strict_eq(&Value::string("x")));
        assert!(!Value::Number(1.0).strict_eq(&Value::string("1")));
    }
}
