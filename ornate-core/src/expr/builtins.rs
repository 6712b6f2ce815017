//! Globals and the primitive methods templates commonly reach for.

use indexmap::IndexMap;

use crate::error::EvalError;
use crate::value::{Array, Value, Visit};

type EvalResult = Result<Value, EvalError>;

/// Longest string `repeat` will build, in bytes.
const MAX_STRING_LEN: usize = 1 << 29;

thread_local! {
    static GLOBALS: IndexMap<&'static str, Value> = globals();
}

pub(crate) fn global(name: &str) -> Option<Value> {
    GLOBALS.with(|globals| globals.get(name).cloned())
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

fn globals() -> IndexMap<&'static str, Value> {
    let mut g = IndexMap::new();
    g.insert("NaN", Value::Number(f64::NAN));
    g.insert("Infinity", Value::Number(f64::INFINITY));
    g.insert(
        "String",
        Value::function("String", |_, args| {
            Ok(Value::String(args.first().map(Value::to_string).unwrap_or_default()))
        }),
    );
    g.insert(
        "Number",
        Value::function("Number", |_, args| {
            Ok(Value::Number(args.first().map_or(0.0, Value::to_number)))
        }),
    );
    g.insert(
        "Boolean",
        Value::function("Boolean", |_, args| Ok(Value::Bool(arg(args, 0).is_truthy()))),
    );
    g.insert(
        "isNaN",
        Value::function("isNaN", |_, args| Ok(Value::Bool(arg(args, 0).to_number().is_nan()))),
    );
    g.insert(
        "parseInt",
        Value::function("parseInt", |_, args| {
            let radix = args.get(1).map(Value::to_number).filter(|r| *r >= 2.0 && *r <= 36.0);
            Ok(Value::Number(parse_int(&arg(args, 0).to_string(), radix.map(|r| r as u32))))
        }),
    );
    g.insert(
        "parseFloat",
        Value::function("parseFloat", |_, args| {
            Ok(Value::Number(parse_float(&arg(args, 0).to_string())))
        }),
    );
    g.insert("Math", math());
    g.insert("JSON", json());
    g
}

fn math() -> Value {
    fn unary(name: &'static str, f: fn(f64) -> f64) -> (&'static str, Value) {
        (name, Value::function(name, move |_, args| Ok(Value::Number(f(arg(args, 0).to_number())))))
    }
    let mut entries = vec![
        unary("floor", f64::floor),
        unary("ceil", f64::ceil),
        unary("abs", f64::abs),
        unary("sqrt", f64::sqrt),
        unary("trunc", f64::trunc),
        unary("round", |n| (n + 0.5).floor()),
        unary("sign", |n| if n == 0.0 || n.is_nan() { n } else { n.signum() }),
        (
            "pow",
            Value::function("pow", |_, args| {
                Ok(Value::Number(arg(args, 0).to_number().powf(arg(args, 1).to_number())))
            }),
        ),
        (
            "min",
            Value::function("min", |_, args| {
                Ok(Value::Number(fold_numbers(args, f64::INFINITY, f64::min)))
            }),
        ),
        (
            "max",
            Value::function("max", |_, args| {
                Ok(Value::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)))
            }),
        ),
    ];
    entries.push(("PI", Value::Number(std::f64::consts::PI)));
    Value::from_entries(entries)
}

fn fold_numbers(args: &[Value], init: f64, f: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        acc = f(acc, n);
    }
    acc
}

fn json() -> Value {
    Value::from_entries([
        (
            "stringify",
            Value::function("stringify", |_, args| {
                let value = arg(args, 0);
                if matches!(value, Value::Undefined | Value::Function(_)) {
                    return Ok(Value::Undefined);
                }
                serde_json::to_string(&value.try_to_json()?)
                    .map(Value::String)
                    .map_err(|e| EvalError::Native(e.to_string()))
            }),
        ),
        (
            "parse",
            Value::function("parse", |_, args| {
                serde_json::from_str::<serde_json::Value>(&arg(args, 0).to_string())
                    .map(Value::from)
                    .map_err(|e| EvalError::Native(format!("JSON.parse: {e}")))
            }),
        ),
    ])
}

fn parse_int(text: &str, radix: Option<u32>) -> f64 {
    let t = text.trim();
    let (negative, t) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let (radix, digits) = match radix {
        None | Some(16) if t.starts_with("0x") || t.starts_with("0X") => (16, &t[2..]),
        Some(r) => (r, t),
        None => (10, t),
    };
    let mut value = 0.0_f64;
    let mut any = false;
    for c in digits.chars() {
        let Some(d) = c.to_digit(radix) else { break };
        value = value * f64::from(radix) + f64::from(d);
        any = true;
    }
    match (any, negative) {
        (false, _) => f64::NAN,
        (true, true) => -value,
        (true, false) => value,
    }
}

fn parse_float(text: &str) -> f64 {
    let t = text.trim_start();
    for prefix in ["Infinity", "+Infinity", "-Infinity"] {
        if t.starts_with(prefix) {
            return if prefix.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
        }
    }
    let bytes = t.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &t[digits_start..end] == "." {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    t[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Methods on primitive receivers (strings, arrays, numbers).
pub(crate) fn call_method(receiver: &Value, name: &str, args: &[Value]) -> EvalResult {
    match receiver {
        Value::String(s) => string_method(s, name, args),
        Value::Array(items) => array_method(items, name, args),
        Value::Number(n) => number_method(*n, name, args),
        Value::Bool(b) if name == "toString" => Ok(Value::String(b.to_string())),
        Value::Object(_) if name == "hasOwnProperty" => {
            let key = arg(args, 0).to_property_key();
            Ok(Value::Bool(
                receiver.as_object().is_some_and(|map| map.borrow().contains_key(&key)),
            ))
        }
        _ => Err(EvalError::NotCallable(name.to_string())),
    }
}

/// Resolves a possibly negative index argument against `len`.
fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    let Some(value) = value.filter(|v| !matches!(v, Value::Undefined)) else {
        return default;
    };
    let n = value.to_number();
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn string_method(s: &str, name: &str, args: &[Value]) -> EvalResult {
    let chars: Vec<char> = s.chars().collect();
    let text = |i: usize| arg(args, i).to_string();
    let char_index = |byte: usize| s[..byte].chars().count();
    Ok(match name {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "trimStart" => Value::String(s.trim_start().to_string()),
        "trimEnd" => Value::String(s.trim_end().to_string()),
        "toString" => Value::String(s.to_string()),
        "includes" => Value::Bool(s.contains(&text(0))),
        "startsWith" => Value::Bool(s.starts_with(&text(0))),
        "endsWith" => Value::Bool(s.ends_with(&text(0))),
        "indexOf" => Value::Number(s.find(&text(0)).map_or(-1.0, |b| char_index(b) as f64)),
        "charAt" => {
            let i = arg(args, 0).to_number();
            let c = if i >= 0.0 { chars.get(i as usize) } else { None };
            Value::String(c.map(char::to_string).unwrap_or_default())
        }
        "slice" => {
            let start = relative_index(args.first(), chars.len(), 0);
            let end = relative_index(args.get(1), chars.len(), chars.len());
            Value::String(chars.get(start..end.max(start)).unwrap_or_default().iter().collect())
        }
        "substring" => {
            let clamp = |v: Option<&Value>, default: usize| match v {
                None | Some(Value::Undefined) => default,
                Some(v) => {
                    let n = v.to_number();
                    if n.is_nan() || n < 0.0 { 0 } else { (n as usize).min(chars.len()) }
                }
            };
            let (a, b) = (clamp(args.first(), 0), clamp(args.get(1), chars.len()));
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            Value::String(chars[start..end].iter().collect())
        }
        "split" => match args.first() {
            None | Some(Value::Undefined) => Value::array(vec![Value::String(s.to_string())]),
            Some(sep) => {
                let sep = sep.to_string();
                let parts: Vec<Value> = if sep.is_empty() {
                    chars.iter().map(|c| Value::String(c.to_string())).collect()
                } else {
                    s.split(sep.as_str()).map(Value::from).collect()
                };
                Value::array(parts)
            }
        },
        "replace" => Value::String(s.replacen(&text(0), &text(1), 1)),
        "repeat" => {
            let n = arg(args, 0).to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            if n < 0.0 || n.is_infinite() {
                return Err(EvalError::Native("invalid repeat count".into()));
            }
            if n * s.len() as f64 > MAX_STRING_LEN as f64 {
                return Err(EvalError::Native("repeated string is too long".into()));
            }
            Value::String(s.repeat(n as usize))
        }
        "concat" => {
            let mut out = s.to_string();
            for value in args {
                out.push_str(&value.to_string());
            }
            Value::String(out)
        }
        _ => return Err(EvalError::NotCallable(name.to_string())),
    })
}

fn array_method(items: &Array, name: &str, args: &[Value]) -> EvalResult {
    Ok(match name {
        "push" => {
            let mut items = items.borrow_mut();
            items.extend(args.iter().cloned());
            Value::Number(items.len() as f64)
        }
        "pop" => items.borrow_mut().pop().unwrap_or_default(),
        "shift" => {
            let mut items = items.borrow_mut();
            if items.is_empty() { Value::Undefined } else { items.remove(0) }
        }
        "unshift" => {
            let mut items = items.borrow_mut();
            for (i, value) in args.iter().enumerate() {
                items.insert(i, value.clone());
            }
            Value::Number(items.len() as f64)
        }
        "includes" => {
            let needle = arg(args, 0);
            Value::Bool(items.borrow().iter().any(|v| v.strict_equals(&needle)))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            let pos = items.borrow().iter().position(|v| v.strict_equals(&needle));
            Value::Number(pos.map_or(-1.0, |p| p as f64))
        }
        "join" => {
            let sep = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(sep) => sep.to_string(),
            };
            let Some(_visit) = Visit::enter(items) else {
                return Ok(Value::String(String::new()));
            };
            let joined = items
                .borrow()
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_string() })
                .collect::<Vec<_>>()
                .join(&sep);
            Value::String(joined)
        }
        "toString" => Value::String(Value::Array(items.clone()).to_string()),
        "slice" => {
            let items = items.borrow();
            let start = relative_index(args.first(), items.len(), 0);
            let end = relative_index(args.get(1), items.len(), items.len());
            Value::array(items.get(start..end.max(start)).unwrap_or_default().to_vec())
        }
        "splice" => {
            let mut items = items.borrow_mut();
            let start = relative_index(args.first(), items.len(), 0);
            let count = match args.get(1) {
                None => items.len() - start,
                Some(v) => {
                    let n = v.to_number();
                    if n.is_nan() || n < 0.0 { 0 } else { (n as usize).min(items.len() - start) }
                }
            };
            let inserted = args.iter().skip(2).cloned();
            let removed: Vec<Value> = items.splice(start..start + count, inserted).collect();
            Value::array(removed)
        }
        "concat" => {
            let mut out = items.borrow().clone();
            for value in args {
                match value {
                    Value::Array(more) => out.extend(more.borrow().iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Value::array(out)
        }
        "reverse" => {
            items.borrow_mut().reverse();
            Value::Array(items.clone())
        }
        _ => return Err(EvalError::NotCallable(name.to_string())),
    })
}

fn number_method(n: f64, name: &str, args: &[Value]) -> EvalResult {
    Ok(match name {
        "toFixed" => {
            let digits = arg(args, 0).to_number();
            let digits = if digits.is_nan() { 0 } else { digits.clamp(0.0, 100.0) as usize };
            Value::String(format!("{n:.digits$}"))
        }
        "toString" => Value::String(Value::Number(n).to_string()),
        _ => return Err(EvalError::NotCallable(name.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_stops_at_the_first_non_digit() {
        assert_eq!(parse_int("42px", None), 42.0);
        assert_eq!(parse_int("-0x1f", None), -31.0);
        assert!(parse_int("px", None).is_nan());
    }

    #[test]
    fn parse_float_takes_the_longest_numeric_prefix() {
        assert_eq!(parse_float("3.25em"), 3.25);
        assert_eq!(parse_float("1e3x"), 1000.0);
        assert!(parse_float(".").is_nan());
    }
}
