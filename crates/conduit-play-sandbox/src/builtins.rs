//! Global functions and objects available to every host script.

use std::collections::BTreeMap;

use crate::env::Environment;
use crate::error::{SandboxError, SandboxResult};
use crate::interpreter::Interpreter;
use crate::methods::{compare_values, sort_values};
use crate::value::Value;

/// A native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    ConsoleLog,
    Len,
    Range,
    Str,
    Int,
    Float,
    Bool,
    Abs,
    Min,
    Max,
    Sum,
    Sorted,
    Round,
    MathFloor,
    MathCeil,
    MathRound,
    MathSqrt,
    MathPow,
    MathMax,
    MathMin,
    MathAbs,
    JsonStringify,
}

const GLOBAL_FUNCTIONS: &[Builtin] = &[
    Builtin::Len,
    Builtin::Range,
    Builtin::Str,
    Builtin::Int,
    Builtin::Float,
    Builtin::Bool,
    Builtin::Abs,
    Builtin::Min,
    Builtin::Max,
    Builtin::Sum,
    Builtin::Sorted,
    Builtin::Round,
];

const MATH_FUNCTIONS: &[Builtin] = &[
    Builtin::MathFloor,
    Builtin::MathCeil,
    Builtin::MathRound,
    Builtin::MathSqrt,
    Builtin::MathPow,
    Builtin::MathMax,
    Builtin::MathMin,
    Builtin::MathAbs,
];

impl Builtin {
    /// Name the function is reachable under (the member name for `Math.*`,
    /// `JSON.*` and `console.*`).
    pub fn name(self) -> &'static str {
        match self {
            Builtin::ConsoleLog => "log",
            Builtin::Len => "len",
            Builtin::Range => "range",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
            Builtin::Abs | Builtin::MathAbs => "abs",
            Builtin::Min | Builtin::MathMin => "min",
            Builtin::Max | Builtin::MathMax => "max",
            Builtin::Sum => "sum",
            Builtin::Sorted => "sorted",
            Builtin::Round | Builtin::MathRound => "round",
            Builtin::MathFloor => "floor",
            Builtin::MathCeil => "ceil",
            Builtin::MathSqrt => "sqrt",
            Builtin::MathPow => "pow",
            Builtin::JsonStringify => "stringify",
        }
    }
}

fn namespace(functions: &[Builtin]) -> Value {
    Value::object(
        functions
            .iter()
            .map(|b| (b.name().to_string(), Value::Builtin(*b)))
            .collect(),
    )
}

/// Define the builtin globals: free functions plus the `console`, `Math`
/// and `JSON` objects.
pub fn install(globals: &Environment) {
    for builtin in GLOBAL_FUNCTIONS {
        globals.define(builtin.name(), Value::Builtin(*builtin));
    }
    globals.define("console", namespace(&[Builtin::ConsoleLog]));
    globals.define("Math", namespace(MATH_FUNCTIONS));
    globals.define("JSON", namespace(&[Builtin::JsonStringify]));
}

fn arity(builtin: Builtin, args: &[Value], min: usize) -> SandboxResult<()> {
    if args.len() < min {
        return Err(SandboxError::TypeMismatch(format!(
            "{}() expects at least {min} argument(s), got {}",
            builtin.name(),
            args.len()
        )));
    }
    Ok(())
}

fn number(builtin: Builtin, value: &Value) -> SandboxResult<f64> {
    value.as_number().ok_or_else(|| {
        SandboxError::TypeMismatch(format!(
            "{}() expects a number, got {}",
            builtin.name(),
            value.type_name()
        ))
    })
}

/// `min`/`max` accept either one list or several values.
fn candidates(args: &[Value]) -> Vec<Value> {
    match args {
        [Value::List(items)] => items.borrow().clone(),
        _ => args.to_vec(),
    }
}

fn extremum(builtin: Builtin, args: &[Value], want: std::cmp::Ordering) -> SandboxResult<Value> {
    let mut best: Option<Value> = None;
    for value in candidates(args) {
        let replace = match &best {
            Some(current) => compare_values(&value, current)? == want,
            None => true,
        };
        if replace {
            best = Some(value);
        }
    }
    best.ok_or_else(|| SandboxError::Runtime(format!("{}() arg is an empty sequence", builtin.name())))
}

fn parse_number(builtin: Builtin, text: &str) -> SandboxResult<f64> {
    text.trim().parse::<f64>().map_err(|_| {
        SandboxError::Runtime(format!(
            "invalid literal for {}(): '{text}'",
            builtin.name()
        ))
    })
}

/// JavaScript `Math.round`: halves round toward positive infinity.
fn js_round(n: f64) -> f64 {
    (n + 0.5).floor()
}

/// Invoke a builtin.
pub fn call(interp: &mut Interpreter<'_>, builtin: Builtin, args: Vec<Value>) -> SandboxResult<Value> {
    match builtin {
        Builtin::ConsoleLog => {
            let parts: Vec<String> = args.iter().map(Value::to_string).collect();
            interp.print(&parts.join(" "));
            Ok(Value::Null)
        }
        Builtin::Len => {
            arity(builtin, &args, 1)?;
            let len = match &args[0] {
                Value::Str(s) => s.chars().count(),
                Value::List(items) => items.borrow().len(),
                Value::Object(fields) => fields.borrow().len(),
                other => {
                    return Err(SandboxError::TypeMismatch(format!(
                        "object of type {} has no len()",
                        other.type_name()
                    )))
                }
            };
            Ok(Value::Number(len as f64))
        }
        Builtin::Range => range(interp, &args),
        Builtin::Str => Ok(Value::string(
            args.first().map(Value::to_string).unwrap_or_default(),
        )),
        Builtin::Int => match args.first() {
            None => Ok(Value::Number(0.0)),
            Some(Value::Number(n)) => Ok(Value::Number(n.trunc())),
            Some(Value::Bool(b)) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
            Some(Value::Str(s)) => {
                let n = parse_number(builtin, s)?;
                if n.fract() != 0.0 {
                    return Err(SandboxError::Runtime(format!(
                        "invalid literal for int(): '{s}'"
                    )));
                }
                Ok(Value::Number(n))
            }
            Some(other) => Err(SandboxError::TypeMismatch(format!(
                "int() argument must be a string or a number, not {}",
                other.type_name()
            ))),
        },
        Builtin::Float => match args.first() {
            None => Ok(Value::Number(0.0)),
            Some(Value::Number(n)) => Ok(Value::Number(*n)),
            Some(Value::Bool(b)) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
            Some(Value::Str(s)) => Ok(Value::Number(parse_number(builtin, s)?)),
            Some(other) => Err(SandboxError::TypeMismatch(format!(
                "float() argument must be a string or a number, not {}",
                other.type_name()
            ))),
        },
        Builtin::Bool => Ok(Value::Bool(
            args.first().map(Value::is_truthy).unwrap_or(false),
        )),
        Builtin::Abs | Builtin::MathAbs => {
            arity(builtin, &args, 1)?;
            Ok(Value::Number(number(builtin, &args[0])?.abs()))
        }
        Builtin::Min | Builtin::MathMin => extremum(builtin, &args, std::cmp::Ordering::Less),
        Builtin::Max | Builtin::MathMax => extremum(builtin, &args, std::cmp::Ordering::Greater),
        Builtin::Sum => {
            let mut total = 0.0;
            for value in candidates(&args) {
                total += number(builtin, &value)?;
            }
            Ok(Value::Number(total))
        }
        Builtin::Sorted => {
            let mut items = match args.first() {
                Some(Value::List(items)) => items.borrow().clone(),
                Some(Value::Str(s)) => s.chars().map(|c| Value::string(c.to_string())).collect(),
                _ => return Err(SandboxError::TypeMismatch("sorted() expects a list".into())),
            };
            sort_values(&mut items)?;
            Ok(Value::list(items))
        }
        Builtin::Round => {
            arity(builtin, &args, 1)?;
            let n = number(builtin, &args[0])?;
            match args.get(1) {
                Some(digits) => {
                    let scale = 10f64.powf(number(builtin, digits)?.trunc());
                    Ok(Value::Number((n * scale).round() / scale))
                }
                None => Ok(Value::Number(n.round())),
            }
        }
        Builtin::MathRound => {
            arity(builtin, &args, 1)?;
            Ok(Value::Number(js_round(number(builtin, &args[0])?)))
        }
        Builtin::MathFloor => {
            arity(builtin, &args, 1)?;
            Ok(Value::Number(number(builtin, &args[0])?.floor()))
        }
        Builtin::MathCeil => {
            arity(builtin, &args, 1)?;
            Ok(Value::Number(number(builtin, &args[0])?.ceil()))
        }
        Builtin::MathSqrt => {
            arity(builtin, &args, 1)?;
            Ok(Value::Number(number(builtin, &args[0])?.sqrt()))
        }
        Builtin::MathPow => {
            arity(builtin, &args, 2)?;
            let base = number(builtin, &args[0])?;
            let exponent = number(builtin, &args[1])?;
            Ok(Value::Number(base.powf(exponent)))
        }
        Builtin::JsonStringify => {
            let value = args.first().cloned().unwrap_or(Value::Null);
            let indent = args.get(2).and_then(Value::as_number).unwrap_or(0.0);
            let text = if indent > 0.0 {
                serde_json::to_string_pretty(&value.to_json())
                    .map_err(|e| SandboxError::Runtime(e.to_string()))?
            } else {
                value.to_json_string()
            };
            Ok(Value::string(text))
        }
    }
}

/// `range(stop)`, `range(start, stop)` or `range(start, stop, step)`.
/// Each produced element costs one step.
fn range(interp: &mut Interpreter<'_>, args: &[Value]) -> SandboxResult<Value> {
    let numbers = args
        .iter()
        .map(|v| number(Builtin::Range, v))
        .collect::<SandboxResult<Vec<f64>>>()?;
    let (start, stop, step) = match numbers.as_slice() {
        [stop] => (0.0, *stop, 1.0),
        [start, stop] => (*start, *stop, 1.0),
        [start, stop, step, ..] => (*start, *stop, *step),
        [] => return arity(Builtin::Range, args, 1).map(|()| Value::Null),
    };
    if step == 0.0 {
        return Err(SandboxError::Runtime("range() arg 3 must not be zero".into()));
    }
    let count = ((stop - start) / step).ceil().max(0.0);
    interp.charge(count as u64)?;
    let items = (0..count as u64)
        .map(|i| Value::Number(start + step * i as f64))
        .collect();
    Ok(Value::list(items))
}

/// Build a plain object from string/value pairs.
pub(crate) fn object_from<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::object(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<BTreeMap<_, _>>(),
    )
}
