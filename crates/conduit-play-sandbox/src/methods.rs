//! Methods on built-in value types: lists, strings, objects and numbers.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{SandboxError, SandboxResult};
use crate::value::{format_number, Value};

type SharedList = Rc<RefCell<Vec<Value>>>;
type SharedObject = Rc<RefCell<BTreeMap<String, Value>>>;

fn no_method(type_name: &str, name: &str) -> SandboxError {
    SandboxError::TypeMismatch(format!("{type_name}.{name} is not a function"))
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Null)
}

fn str_arg<'v>(args: &'v [Value], index: usize, method: &str) -> SandboxResult<&'v str> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        SandboxError::TypeMismatch(format!("{method}() expects a string argument"))
    })
}

fn number_arg(args: &[Value], index: usize, method: &str) -> SandboxResult<f64> {
    args.get(index).and_then(Value::as_number).ok_or_else(|| {
        SandboxError::TypeMismatch(format!("{method}() expects a number argument"))
    })
}

/// Resolve a possibly negative index against `len`. `None` if out of range.
pub(crate) fn resolve_index(index: f64, len: usize) -> Option<usize> {
    if index.fract() != 0.0 {
        return None;
    }
    let resolved = if index < 0.0 {
        len as f64 + index
    } else {
        index
    };
    (resolved >= 0.0 && resolved < len as f64).then_some(resolved as usize)
}

/// Property name for a computed key or subscript: strings as-is, numbers in
/// printed form.
pub(crate) fn property_key(key: &Value) -> SandboxResult<String> {
    match key {
        Value::Str(s) => Ok(s.clone()),
        Value::Number(n) => Ok(format_number(*n)),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(SandboxError::TypeMismatch(format!(
            "{} cannot be used as a property key",
            other.type_name()
        ))),
    }
}

/// Ordering for `<`, `>`, `sort` and friends: numbers with numbers, strings
/// with strings.
pub(crate) fn compare_values(left: &Value, right: &Value) -> SandboxResult<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b).unwrap_or(Ordering::Equal)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (a, b) => Err(SandboxError::TypeMismatch(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// Sort in place, failing on the first incomparable pair.
pub(crate) fn sort_values(items: &mut [Value]) -> SandboxResult<()> {
    let mut failure = None;
    items.sort_by(|a, b| match compare_values(a, b) {
        Ok(ordering) => ordering,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub(crate) fn list_method(items: &SharedList, name: &str, args: Vec<Value>) -> SandboxResult<Value> {
    match name {
        "append" => {
            items.borrow_mut().push(arg(&args, 0));
            Ok(Value::Null)
        }
        "push" => {
            let mut items = items.borrow_mut();
            items.extend(args);
            Ok(Value::Number(items.len() as f64))
        }
        "pop" => {
            let mut items = items.borrow_mut();
            if items.is_empty() {
                return Err(SandboxError::Runtime("pop from empty list".into()));
            }
            match args.first() {
                Some(Value::Number(i)) => {
                    let index = resolve_index(*i, items.len()).ok_or_else(|| {
                        SandboxError::Runtime(format!("pop index {} out of range", format_number(*i)))
                    })?;
                    Ok(items.remove(index))
                }
                _ => Ok(items.pop().unwrap_or(Value::Null)),
            }
        }
        "join" => {
            let separator = match args.first() {
                Some(Value::Str(s)) => s.clone(),
                _ => ",".to_string(),
            };
            let parts: Vec<String> = items.borrow().iter().map(Value::to_string).collect();
            Ok(Value::string(parts.join(&separator)))
        }
        "index" | "indexOf" => {
            let needle = arg(&args, 0);
            let position = items.borrow().iter().position(|v| v.strict_eq(&needle));
            match (position, name) {
                (Some(i), _) => Ok(Value::Number(i as f64)),
                (None, "indexOf") => Ok(Value::Number(-1.0)),
                (None, _) => Err(SandboxError::Runtime(format!("{needle} is not in list"))),
            }
        }
        "includes" => {
            let needle = arg(&args, 0);
            Ok(Value::Bool(items.borrow().iter().any(|v| v.strict_eq(&needle))))
        }
        "insert" => {
            let at = number_arg(&args, 0, "insert")?;
            let mut items = items.borrow_mut();
            let len = items.len() as f64;
            let clamped = if at < 0.0 { (len + at).max(0.0) } else { at.min(len) };
            items.insert(clamped as usize, arg(&args, 1));
            Ok(Value::Null)
        }
        "reverse" => {
            items.borrow_mut().reverse();
            Ok(Value::Null)
        }
        "sort" => {
            sort_values(&mut items.borrow_mut())?;
            Ok(Value::Null)
        }
        "slice" => {
            let items = items.borrow();
            let len = items.len() as f64;
            let bound = |v: Option<f64>, default: f64| {
                let v = v.unwrap_or(default);
                (if v < 0.0 { len + v } else { v }).clamp(0.0, len) as usize
            };
            let start = bound(args.first().and_then(Value::as_number), 0.0);
            let end = bound(args.get(1).and_then(Value::as_number), len);
            let slice = if start < end { items[start..end].to_vec() } else { Vec::new() };
            Ok(Value::list(slice))
        }
        _ => Err(no_method("list", name)),
    }
}

pub(crate) fn str_method(s: &str, name: &str, args: Vec<Value>) -> SandboxResult<Value> {
    match name {
        "upper" | "toUpperCase" => Ok(Value::string(s.to_uppercase())),
        "lower" | "toLowerCase" => Ok(Value::string(s.to_lowercase())),
        "strip" | "trim" => Ok(Value::string(s.trim())),
        "split" => {
            let parts: Vec<Value> = match args.first() {
                Some(Value::Str(sep)) if !sep.is_empty() => {
                    s.split(sep.as_str()).map(Value::string).collect()
                }
                _ => s.split_whitespace().map(Value::string).collect(),
            };
            Ok(Value::list(parts))
        }
        "startswith" | "startsWith" => Ok(Value::Bool(s.starts_with(str_arg(&args, 0, name)?))),
        "endswith" | "endsWith" => Ok(Value::Bool(s.ends_with(str_arg(&args, 0, name)?))),
        "includes" => Ok(Value::Bool(s.contains(str_arg(&args, 0, name)?))),
        "replace" => {
            let from = str_arg(&args, 0, name)?;
            let to = str_arg(&args, 1, name)?;
            Ok(Value::string(s.replace(from, to)))
        }
        "join" => match args.first() {
            Some(Value::List(items)) => {
                let parts: Vec<String> = items.borrow().iter().map(Value::to_string).collect();
                Ok(Value::string(parts.join(s)))
            }
            _ => Err(SandboxError::TypeMismatch("join() expects a list".into())),
        },
        _ => Err(no_method("string", name)),
    }
}

pub(crate) fn object_method(fields: &SharedObject, name: &str, args: Vec<Value>) -> SandboxResult<Value> {
    match name {
        "get" => {
            let key = property_key(&arg(&args, 0))?;
            Ok(fields.borrow().get(&key).cloned().unwrap_or_else(|| arg(&args, 1)))
        }
        "keys" => Ok(Value::list(
            fields.borrow().keys().cloned().map(Value::Str).collect(),
        )),
        "values" => Ok(Value::list(fields.borrow().values().cloned().collect())),
        "items" => Ok(Value::list(
            fields
                .borrow()
                .iter()
                .map(|(k, v)| Value::list(vec![Value::string(k.clone()), v.clone()]))
                .collect(),
        )),
        "hasOwnProperty" => {
            let key = property_key(&arg(&args, 0))?;
            Ok(Value::Bool(fields.borrow().contains_key(&key)))
        }
        _ => Err(no_method("object", name)),
    }
}

pub(crate) fn number_method(n: f64, name: &str, args: Vec<Value>) -> SandboxResult<Value> {
    match name {
        "toFixed" => {
            let digits = args.first().and_then(Value::as_number).unwrap_or(0.0);
            if !(0.0..=20.0).contains(&digits) {
                return Err(SandboxError::Runtime("toFixed() digits out of range".into()));
            }
            Ok(Value::string(format!("{n:.prec$}", prec = digits as usize)))
        }
        "toString" => Ok(Value::string(format_number(n))),
        _ => Err(no_method("number", name)),
    }
}
