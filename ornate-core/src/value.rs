// ornate-core/src/value.rs

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::EvalError;

/// Largest length an array may be given; longer lengths are a type error.
pub const MAX_ARRAY_LENGTH: u64 = u32::MAX as u64;
/// Largest size an array may grow to through a `length` or index write.
pub const MAX_ARRAY_GROWTH: usize = 1 << 20;

thread_local! {
    static VISITING: RefCell<Vec<*const ()>> = const { RefCell::new(Vec::new()) };
}

/// Marks a shared container as being walked on this thread so that cyclic
/// structures are visited once. Unmarks on drop.
pub(crate) struct Visit(*const ());

impl Visit {
    /// `None` when the container is already being walked.
    pub(crate) fn enter<T>(shared: &Rc<T>) -> Option<Self> {
        let addr = Rc::as_ptr(shared).cast::<()>();
        VISITING.with(|visiting| {
            let mut visiting = visiting.borrow_mut();
            if visiting.contains(&addr) {
                return None;
            }
            visiting.push(addr);
            Some(Visit(addr))
        })
    }
}

impl Drop for Visit {
    fn drop(&mut self) {
        VISITING.with(|visiting| {
            let mut visiting = visiting.borrow_mut();
            if let Some(pos) = visiting.iter().rposition(|a| *a == self.0) {
                visiting.remove(pos);
            }
        });
    }
}

/// Shared, mutable array storage. Cloning a `Value::Array` aliases the same list.
pub type Array = Rc<RefCell<Vec<Value>>>;
/// Shared, mutable object storage with insertion-ordered keys.
pub type Object = Rc<RefCell<IndexMap<String, Value>>>;

/// An object owned by the host presentation tree (elements, events) that
/// expressions can read from and write to.
pub trait HostObject {
    fn type_name(&self) -> &str;
    fn get(&self, key: &str) -> Value;
    /// Returns false when the host refuses the write.
    fn set(&self, key: &str, value: Value) -> bool {
        let _ = (key, value);
        false
    }
}

type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, EvalError>;

/// A callable exposed to templates. The first argument is the receiver
/// (`this`), which for bare calls is the root scope object.
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    body: Rc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, EvalError> + 'static,
    {
        Self {
            name: Rc::from(name),
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
        (self.body)(this, args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.body), Rc::as_ptr(&other.body))
    }
}

/// Dynamic value flowing through scopes, expressions and resolved attributes.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
    Function(Function),
    Host(Rc<dyn HostObject>),
}

impl Value {
    pub fn object() -> Self {
        Value::Object(Rc::new(RefCell::new(IndexMap::new())))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<IndexMap<_, _>>();
        Value::Object(Rc::new(RefCell::new(map)))
    }

    pub fn function<F>(name: &str, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, EvalError> + 'static,
    {
        Value::Function(Function::new(name, body))
    }

    pub fn host(host: impl HostObject + 'static) -> Self {
        Value::Host(Rc::new(host))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Host(_) => true,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Primitives are written as markup attributes; everything else is
    /// assigned as an element property.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Array(_) | Value::Object(_) | Value::Host(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Array(_) => parse_number(&self.to_string()),
            Value::Object(_) | Value::Function(_) | Value::Host(_) => f64::NAN,
        }
    }

    /// Objects collapse to their string form; primitives are returned as-is.
    pub fn to_primitive(&self) -> Value {
        if self.is_primitive() {
            self.clone()
        } else {
            Value::String(self.to_string())
        }
    }

    pub fn to_property_key(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn get_property(&self, key: &str) -> Result<Value, EvalError> {
        match self {
            Value::Undefined | Value::Null => Err(EvalError::Type(format!(
                "cannot read property '{key}' of {self}"
            ))),
            Value::Object(map) => Ok(map.borrow().get(key).cloned().unwrap_or_default()),
            Value::Array(items) => {
                let items = items.borrow();
                if key == "length" {
                    return Ok(Value::Number(items.len() as f64));
                }
                Ok(key
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default())
            }
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                Ok(key
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or_default())
            }
            Value::Function(f) if key == "name" => Ok(Value::String(f.name().to_string())),
            Value::Host(host) => Ok(host.get(key)),
            _ => Ok(Value::Undefined),
        }
    }

    pub fn set_property(&self, key: &str, value: Value) -> Result<(), EvalError> {
        match self {
            Value::Undefined | Value::Null => Err(EvalError::Type(format!(
                "cannot set property '{key}' of {self}"
            ))),
            Value::Object(map) => {
                map.borrow_mut().insert(key.to_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                if key == "length" {
                    let len = value.to_number();
                    if len.is_nan() || len < 0.0 || len.fract() != 0.0 || len > MAX_ARRAY_LENGTH as f64 {
                        return Err(EvalError::Type("invalid array length".into()));
                    }
                    let len = len as usize;
                    if len > items.len().max(MAX_ARRAY_GROWTH) {
                        return Err(EvalError::Type(format!("array length {len} is too large")));
                    }
                    items.resize(len, Value::Undefined);
                } else if let Some(i) = array_index(key) {
                    let i = i as usize;
                    if i >= items.len() {
                        if i >= MAX_ARRAY_GROWTH {
                            return Err(EvalError::Type(format!("array index {i} is too large")));
                        }
                        items.resize(i + 1, Value::Undefined);
                    }
                    items[i] = value;
                }
                Ok(())
            }
            Value::Host(host) => {
                if host.set(key, value) {
                    Ok(())
                } else {
                    Err(EvalError::Type(format!(
                        "cannot set property '{key}' of {}",
                        host.type_name()
                    )))
                }
            }
            // writes to other primitives are silently dropped
            _ => Ok(()),
        }
    }

    /// Lenient property read: `Undefined` whenever the read would fail.
    pub fn get(&self, key: &str) -> Value {
        self.get_property(key).unwrap_or_default()
    }

    /// Lenient property write for host code building scopes.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let _ = self.set_property(key, value.into());
    }

    /// Appends to an array value. Returns false for non-arrays.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        match self {
            Value::Array(items) => {
                items.borrow_mut().push(value.into());
                true
            }
            _ => false,
        }
    }

    /// Enumerable `(key, value)` pairs in for-in order: array and string
    /// indices ascending; for objects, integer-like keys ascending first,
    /// then the remaining keys in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        match self {
            Value::Array(items) => items
                .borrow()
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
            Value::String(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| (i.to_string(), Value::String(c.to_string())))
                .collect(),
            Value::Object(map) => {
                let map = map.borrow();
                let (mut indexed, named): (Vec<_>, Vec<_>) =
                    map.iter().partition(|(k, _)| array_index(k).is_some());
                indexed.sort_by_key(|(k, _)| array_index(k));
                indexed
                    .into_iter()
                    .chain(named)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Host(a), Value::Host(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }

    pub fn loose_equals(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (Number(a), String(_)) => *a == other.to_number(),
            (String(_), Number(b)) => self.to_number() == *b,
            (Bool(_), _) => Number(self.to_number()).loose_equals(other),
            (_, Bool(_)) => self.loose_equals(&Number(other.to_number())),
            (Array(_) | Object(_) | Function(_) | Host(_), Number(_) | String(_)) => {
                self.to_primitive().loose_equals(other)
            }
            (Number(_) | String(_), Array(_) | Object(_) | Function(_) | Host(_)) => {
                self.loose_equals(&other.to_primitive())
            }
            _ => self.strict_equals(other),
        }
    }

    /// JSON view of the value. Cyclic references become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        self.json_value(false).unwrap_or(serde_json::Value::Null)
    }

    /// Like [`to_json`](Self::to_json), but a cyclic structure is an error.
    pub fn try_to_json(&self) -> Result<serde_json::Value, EvalError> {
        self.json_value(true)
    }

    fn json_value(&self, strict: bool) -> Result<serde_json::Value, EvalError> {
        let cyclic = || {
            if strict {
                Err(EvalError::Type("converting circular structure to JSON".into()))
            } else {
                Ok(serde_json::Value::Null)
            }
        };
        Ok(match self {
            Value::Undefined | Value::Null | Value::Function(_) | Value::Host(_) => {
                serde_json::Value::Null
            }
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                let Some(_visit) = Visit::enter(items) else {
                    return cyclic();
                };
                serde_json::Value::Array(
                    items
                        .borrow()
                        .iter()
                        .map(|v| v.json_value(strict))
                        .collect::<Result<_, _>>()?,
                )
            }
            Value::Object(map) => {
                let Some(_visit) = Visit::enter(map) else {
                    return cyclic();
                };
                serde_json::Value::Object(
                    map.borrow()
                        .iter()
                        .map(|(k, v)| Ok((k.clone(), v.json_value(strict)?)))
                        .collect::<Result<_, EvalError>>()?,
                )
            }
        })
    }
}

fn array_index(key: &str) -> Option<u32> {
    key.parse::<u32>()
        .ok()
        .filter(|n| *n != u32::MAX && n.to_string() == key)
}

fn parse_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // Rust accepts "inf"/"nan" spellings that are not numbers here
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                // a cyclic array renders its repeat as empty
                let Some(_visit) = Visit::enter(items) else {
                    return Ok(());
                };
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Function(func) => write!(f, "function {}() {{ [native code] }}", func.name()),
            Value::Host(host) => write!(f, "[object {}]", host.type_name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(items) => match Visit::enter(items) {
                Some(_visit) => f.debug_list().entries(items.borrow().iter()).finish(),
                None => f.write_str("[...]"),
            },
            Value::Object(map) => match Visit::enter(map) {
                Some(_visit) => f.debug_map().entries(map.borrow().iter()).finish(),
                None => f.write_str("{...}"),
            },
            Value::Function(func) => write!(f, "Function({})", func.name()),
            Value::Host(host) => write!(f, "Host({})", host.type_name()),
        }
    }
}

/// Structural equality, used by tests and by host code comparing snapshots.
/// Expressions use `strict_equals`/`loose_equals` instead.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            _ => self.strict_equals(other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::from_entries(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_format_like_script_strings() {
        assert_eq!(Value::from(1).to_string(), "1");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn arrays_alias_on_clone() {
        let a = Value::array(vec![]);
        let b = a.clone();
        b.push(1);
        assert_eq!(a.get("length"), Value::from(1));
        assert!(a.strict_equals(&b));
    }

    #[test]
    fn cyclic_arrays_display_once() {
        let a = Value::array(vec![Value::from(1)]);
        a.push(a.clone());
        assert_eq!(a.to_string(), "1,");
        assert_eq!(format!("{a:?}"), "[1, [...]]");
        assert_eq!(a.to_json(), serde_json::json!([1, null]));
        assert!(a.try_to_json().is_err());
    }
}
