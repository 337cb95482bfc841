//! Runtime values and their conversions.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::FunctionDef;
use crate::error::{RuntimeError, RuntimeResult};
use crate::interp::Env;

/// Longest string, in bytes, that concatenation or a string method may build.
pub const MAX_STRING_LENGTH: usize = (1 << 29) - 24;

/// Most elements a write may grow an array to. Arrays are stored densely,
/// so this is far below the `2^32 - 1` a sparse array could reach.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

pub type Array = Rc<RefCell<Vec<Value>>>;
pub type Object = Rc<RefCell<IndexMap<String, Value>>>;

/// A value produced while evaluating a program.
///
/// Arrays, objects and functions have reference semantics: cloning a `Value`
/// clones the handle, not the contents.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Array),
    Object(Object),
    Function(Rc<Closure>),
    Native(NativeFn),
}

/// A user-defined function together with the scope it closes over.
pub struct Closure {
    pub(crate) def: Arc<FunctionDef>,
    pub(crate) env: Env,
}

/// A builtin function.
#[derive(Clone, Copy)]
pub struct NativeFn {
    pub name: &'static str,
    pub call: fn(&[Value]) -> RuntimeResult<Value>,
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(entries: IndexMap<String, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The result of the `typeof` operator.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_string()),
            _ => f64::NAN,
        }
    }

    /// Primitive conversion used by `+` and relational operators.
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Native(_) => {
                Value::string(self.to_string())
            }
            other => other.clone(),
        }
    }

    /// Convert from a JSON value, as found in a render context.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::string(s.as_str()),
            serde_json::Value::Array(items) => {
                Value::array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON the way `JSON.stringify` does.
    ///
    /// Returns `None` for values JSON cannot represent (`undefined`,
    /// functions). Non-finite numbers become `null`.
    pub fn to_json(&self) -> RuntimeResult<Option<serde_json::Value>> {
        self.to_json_inner(&mut Vec::new())
    }

    fn to_json_inner(&self, seen: &mut Vec<usize>) -> RuntimeResult<Option<serde_json::Value>> {
        let json = match self {
            Value::Undefined | Value::Function(_) | Value::Native(_) => return Ok(None),
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            // Integral numbers are written without a fraction.
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serde_json::Value::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(items) => {
                let id = Rc::as_ptr(items) as usize;
                enter(seen, id)?;
                let mut out = Vec::new();
                for item in items.borrow().iter() {
                    out.push(item.to_json_inner(seen)?.unwrap_or(serde_json::Value::Null));
                }
                seen.pop();
                serde_json::Value::Array(out)
            }
            Value::Object(map) => {
                let id = Rc::as_ptr(map) as usize;
                enter(seen, id)?;
                let mut out = serde_json::Map::new();
                for (key, value) in map.borrow().iter() {
                    if let Some(json) = value.to_json_inner(seen)? {
                        out.insert(key.clone(), json);
                    }
                }
                seen.pop();
                serde_json::Value::Object(out)
            }
        };
        Ok(Some(json))
    }
}

fn enter(seen: &mut Vec<usize>, id: usize) -> RuntimeResult<()> {
    if seen.contains(&id) {
        return Err(RuntimeError::type_error(
            "Converting circular structure to JSON",
        ));
    }
    seen.push(id);
    Ok(())
}

/// String to number conversion: surrounding whitespace is ignored and the
/// empty string is zero.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf" and "nan", which are not numbers here.
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
            f64::NAN
        }
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

/// Reject a string of `len` bytes, or an overflowed length, past
/// [`MAX_STRING_LENGTH`].
pub(crate) fn check_string_length(len: Option<usize>) -> RuntimeResult<usize> {
    len.filter(|&len| len <= MAX_STRING_LENGTH)
        .ok_or_else(|| RuntimeError::Range("Invalid string length".to_string()))
}

/// Reject an array length that is not a valid index count or that would grow
/// a dense array past [`MAX_ARRAY_LENGTH`].
pub(crate) fn check_array_length(len: f64) -> RuntimeResult<usize> {
    if len < 0.0 || len.fract() != 0.0 || !len.is_finite() || len > MAX_ARRAY_LENGTH as f64 {
        return Err(RuntimeError::Range("Invalid array length".to_string()));
    }
    Ok(len as usize)
}

/// Format a number the way it is printed into template output.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        // Covers -0.
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // Shortest round-trip digits; the exponent always carries a sign.
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Function(closure) => write!(
                f,
                "function {}() {{ [code] }}",
                closure.def.name.as_deref().unwrap_or("")
            ),
            Value::Native(native) => write!(f, "function {}() {{ [native code] }}", native.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Object(map) => f.debug_map().entries(map.borrow().iter()).finish(),
            other => write!(f, "{}", other),
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

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(2.5), "2.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(1.2345678901234568e20), "123456789012345680000");
        assert_eq!(number_to_string(0.000001), "0.000001");
    }

    #[test]
    fn test_number_to_string_exponent_form() {
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(-1.5e300), "-1.5e+300");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(1.25e-10), "1.25e-10");
        assert_eq!(number_to_string(f64::MAX), "1.7976931348623157e+308");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x10"), 16.0);
        assert!(string_to_number("abc").is_nan());
        assert!(string_to_number("inf").is_nan());
        assert_eq!(string_to_number("1e3"), 1000.0);
    }

    #[test]
    fn test_length_limits() {
        assert_eq!(check_string_length(Some(3)).unwrap(), 3);
        assert!(check_string_length(Some(MAX_STRING_LENGTH + 1)).is_err());
        assert!(check_string_length(None).is_err());

        assert_eq!(check_array_length(4.0).unwrap(), 4);
        for invalid in [-1.0, 1.5, f64::NAN, f64::INFINITY, 4294967295.0] {
            assert_eq!(
                check_array_length(invalid).unwrap_err(),
                RuntimeError::Range("Invalid array length".to_string())
            );
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::from("").truthy());
        assert!(Value::from("0").truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(Value::array(vec![]).truthy());
        assert!(!Value::Null.truthy());
    }

    #[test]
    fn test_array_display_skips_nullish() {
        let value = Value::array(vec![1.0.into(), Value::Null, "x".into()]);
        assert_eq!(value.to_string(), "1,,x");
    }

    #[test]
    fn test_json_conversion() {
        let source = json!({
            "name": "mite",
            "tags": ["a", "b"],
            "count": 3,
            "nested": {"ok": true}
        });
        let value = Value::from_json(&source);
        assert_eq!(value.to_json().unwrap(), Some(source));
    }

    #[test]
    fn test_json_skips_undefined_members() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Value::Undefined);
        map.insert("b".to_string(), Value::Number(f64::NAN));
        let json = Value::object(map).to_json().unwrap().unwrap();
        assert_eq!(json, json!({"b": null}));
    }

    #[test]
    fn test_json_detects_cycles() {
        let array = Value::array(vec![]);
        if let Value::Array(items) = &array {
            items.borrow_mut().push(array.clone());
        }
        assert!(matches!(array.to_json(), Err(RuntimeError::Type(_))));
        // Break the cycle so the test does not leak.
        if let Value::Array(items) = &array {
            items.borrow_mut().clear();
        }
    }
}
