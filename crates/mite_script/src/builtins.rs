//! Builtin globals, properties and methods.
//!
//! String positions count `char`s.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{RuntimeError, RuntimeResult};
use crate::interp::Interpreter;
use crate::ops::{same_value_zero, strict_equals};
use crate::value::{
    check_array_length, check_string_length, number_to_string, Array, NativeFn, Value,
};

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn native(name: &'static str, call: fn(&[Value]) -> RuntimeResult<Value>) -> Value {
    Value::Native(NativeFn { name, call })
}

fn namespace(entries: Vec<(&'static str, Value)>) -> Value {
    Value::object(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

/// Truncate toward zero; `NaN` becomes zero.
fn to_integer(value: &Value) -> f64 {
    let n = value.to_number();
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

/// Resolve a possibly negative, possibly missing position against `len`.
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if matches!(value, Value::Undefined) {
        return default;
    }
    let n = to_integer(value);
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

/// Parse a canonical array index (`"3"`, not `"03"` or `"3.0"`).
fn array_index(key: &str) -> Option<usize> {
    let index = key.parse::<usize>().ok()?;
    (index.to_string() == key).then_some(index)
}

fn not_a_function(receiver: &Value, name: &str) -> RuntimeError {
    let kind = match receiver {
        Value::Array(_) => "array",
        other => other.type_of(),
    };
    RuntimeError::type_error(format!("{}.{} is not a function", kind, name))
}

fn expect_callable(value: Value) -> RuntimeResult<Value> {
    if value.is_callable() {
        Ok(value)
    } else {
        Err(RuntimeError::type_error(format!(
            "{} is not a function",
            value
        )))
    }
}

// ============ Properties ============

/// Read `object[key]`.
pub(crate) fn get_property(object: &Value, key: &str) -> RuntimeResult<Value> {
    Ok(match object {
        Value::Undefined | Value::Null => {
            return Err(RuntimeError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                object, key
            )));
        }
        Value::String(s) => match key {
            "length" => Value::Number(s.chars().count() as f64),
            _ => array_index(key)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::string(c.to_string()))
                .unwrap_or_default(),
        },
        Value::Array(items) => match key {
            "length" => Value::Number(items.borrow().len() as f64),
            _ => array_index(key)
                .and_then(|i| items.borrow().get(i).cloned())
                .unwrap_or_default(),
        },
        Value::Object(map) => map.borrow().get(key).cloned().unwrap_or_default(),
        Value::Function(closure) if key == "name" => {
            Value::string(closure.def.name.as_deref().unwrap_or(""))
        }
        Value::Native(native) if key == "name" => Value::string(native.name),
        _ => Value::Undefined,
    })
}

/// Write `object[key] = value`. Writes to primitives are ignored.
pub(crate) fn set_property(object: &Value, key: &str, value: Value) -> RuntimeResult<()> {
    match object {
        Value::Undefined | Value::Null => Err(RuntimeError::type_error(format!(
            "Cannot set properties of {} (setting '{}')",
            object, key
        ))),
        Value::Array(items) => {
            if key == "length" {
                let len = check_array_length(value.to_number())?;
                items.borrow_mut().resize(len, Value::Undefined);
            } else if let Some(index) = array_index(key) {
                let mut items = items.borrow_mut();
                if index >= items.len() {
                    let len = check_array_length(index as f64 + 1.0)?;
                    items.resize(len, Value::Undefined);
                }
                items[index] = value;
            }
            Ok(())
        }
        Value::Object(map) => {
            map.borrow_mut().insert(key.to_string(), value);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Enumerable keys, as visited by `for...in` and `Object.keys`.
pub(crate) fn own_keys(value: &Value) -> Vec<Value> {
    match value {
        Value::Object(map) => map.borrow().keys().map(|k| Value::string(k.as_str())).collect(),
        Value::Array(items) => (0..items.borrow().len())
            .map(|i| Value::string(i.to_string()))
            .collect(),
        Value::String(s) => (0..s.chars().count())
            .map(|i| Value::string(i.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

// ============ Methods ============

/// Call the builtin method `name` on `receiver`.
pub(crate) fn call_method(
    interp: &mut Interpreter,
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
) -> RuntimeResult<Value> {
    match receiver {
        Value::Undefined | Value::Null => Err(RuntimeError::type_error(format!(
            "Cannot read properties of {} (reading '{}')",
            receiver, name
        ))),
        Value::String(s) => string_method(interp, receiver, s, name, &args),
        Value::Array(items) => array_method(interp, receiver, items, name, args),
        Value::Number(n) => number_method(*n, name, &args),
        Value::Object(map) => match name {
            "hasOwnProperty" => Ok(Value::Bool(
                map.borrow().contains_key(&arg(&args, 0).to_string()),
            )),
            "toString" => Ok(Value::string(receiver.to_string())),
            _ => Err(not_a_function(receiver, name)),
        },
        _ => match name {
            "toString" => Ok(Value::string(receiver.to_string())),
            _ => Err(not_a_function(receiver, name)),
        },
    }
}

fn string_method(
    interp: &mut Interpreter,
    receiver: &Value,
    s: &str,
    name: &str,
    args: &[Value],
) -> RuntimeResult<Value> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let text_arg = |i: usize| arg(args, i).to_string();

    Ok(match name {
        "toUpperCase" => Value::string(s.to_uppercase()),
        "toLowerCase" => Value::string(s.to_lowercase()),
        "trim" => Value::string(s.trim()),
        "trimStart" => Value::string(s.trim_start()),
        "trimEnd" => Value::string(s.trim_end()),
        "toString" | "valueOf" => receiver.clone(),
        "includes" => Value::Bool(s.contains(text_arg(0).as_str())),
        "startsWith" => Value::Bool(s.starts_with(text_arg(0).as_str())),
        "endsWith" => Value::Bool(s.ends_with(text_arg(0).as_str())),
        "indexOf" => Value::Number(
            s.find(text_arg(0).as_str())
                .map(|byte| s[..byte].chars().count() as f64)
                .unwrap_or(-1.0),
        ),
        "lastIndexOf" => Value::Number(
            s.rfind(text_arg(0).as_str())
                .map(|byte| s[..byte].chars().count() as f64)
                .unwrap_or(-1.0),
        ),
        "charAt" => {
            let index = to_integer(&arg(args, 0));
            let c = (index >= 0.0)
                .then(|| chars.get(index as usize))
                .flatten()
                .map(|c| c.to_string())
                .unwrap_or_default();
            Value::string(c)
        }
        "at" => {
            let n = to_integer(&arg(args, 0));
            let index = if n < 0.0 { len as f64 + n } else { n };
            (index >= 0.0)
                .then(|| chars.get(index as usize))
                .flatten()
                .map(|c| Value::string(c.to_string()))
                .unwrap_or_default()
        }
        "slice" => {
            let start = relative_index(&arg(args, 0), len, 0);
            let end = relative_index(&arg(args, 1), len, len);
            let sliced: String = if start < end {
                chars[start..end].iter().collect()
            } else {
                String::new()
            };
            Value::string(sliced)
        }
        "substring" => {
            let clamp = |v: &Value, default: usize| {
                if matches!(v, Value::Undefined) {
                    default
                } else {
                    to_integer(v).clamp(0.0, len as f64) as usize
                }
            };
            let a = clamp(&arg(args, 0), 0);
            let b = clamp(&arg(args, 1), len);
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            Value::string(chars[start..end].iter().collect::<String>())
        }
        "split" => {
            let parts: Vec<Value> = match arg(args, 0) {
                Value::Undefined => vec![receiver.clone()],
                separator => {
                    let separator = separator.to_string();
                    if separator.is_empty() {
                        chars.iter().map(|c| Value::string(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str()).map(Value::from).collect()
                    }
                }
            };
            Value::array(parts)
        }
        "replace" | "replaceAll" => {
            let pattern = text_arg(0);
            let replacement = arg(args, 1);
            let limit = if name == "replace" { 1 } else { usize::MAX };
            let mut out = String::with_capacity(s.len());
            let mut rest = s;
            let mut count = 0;
            while count < limit {
                let Some(found) = rest.find(pattern.as_str()) else {
                    break;
                };
                out.push_str(&rest[..found]);
                if replacement.is_callable() {
                    let value = interp
                        .call_function(&replacement, vec![Value::from(pattern.as_str())])?;
                    out.push_str(&value.to_string());
                } else {
                    out.push_str(&replacement.to_string());
                }
                count += 1;
                if pattern.is_empty() {
                    // An empty pattern matches between every character.
                    match rest.chars().next() {
                        Some(c) => {
                            out.push(c);
                            rest = &rest[c.len_utf8()..];
                        }
                        None => {
                            rest = "";
                            break;
                        }
                    }
                } else {
                    rest = &rest[found + pattern.len()..];
                }
            }
            out.push_str(rest);
            Value::string(out)
        }
        "repeat" => {
            let count = to_integer(&arg(args, 0));
            if count < 0.0 || count.is_infinite() {
                return Err(RuntimeError::Range(format!(
                    "Invalid count value: {}",
                    number_to_string(count)
                )));
            }
            // `count` is finite and non-negative, so the cast saturates at worst.
            check_string_length(s.len().checked_mul(count as usize))?;
            Value::string(s.repeat(count as usize))
        }
        "padStart" | "padEnd" => {
            let target = to_integer(&arg(args, 0)).max(0.0) as usize;
            let fill = match arg(args, 1) {
                Value::Undefined => " ".to_string(),
                other => other.to_string(),
            };
            if target <= len || fill.is_empty() {
                return Ok(receiver.clone());
            }
            // Each padding char takes at most four bytes.
            let padded = (target - len)
                .checked_mul(4)
                .and_then(|n| n.checked_add(s.len()));
            check_string_length(padded)?;
            let padding: String = fill.chars().cycle().take(target - len).collect();
            if name == "padStart" {
                Value::string(padding + s)
            } else {
                Value::string(s.to_string() + &padding)
            }
        }
        "concat" => {
            let mut out = s.to_string();
            for value in args {
                let value = value.to_string();
                check_string_length(out.len().checked_add(value.len()))?;
                out.push_str(&value);
            }
            Value::string(out)
        }
        _ => return Err(not_a_function(receiver, name)),
    })
}

fn array_method(
    interp: &mut Interpreter,
    receiver: &Value,
    items: &Array,
    name: &str,
    args: Vec<Value>,
) -> RuntimeResult<Value> {
    // Callbacks may mutate the array, so they iterate over a snapshot.
    let snapshot = || items.borrow().clone();

    Ok(match name {
        "push" => {
            let mut items = items.borrow_mut();
            check_array_length((items.len() + args.len()) as f64)?;
            items.extend(args);
            Value::Number(items.len() as f64)
        }
        "pop" => items.borrow_mut().pop().unwrap_or_default(),
        "shift" => {
            let mut items = items.borrow_mut();
            if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            }
        }
        "unshift" => {
            let mut items = items.borrow_mut();
            check_array_length((items.len() + args.len()) as f64)?;
            let tail = std::mem::replace(&mut *items, args);
            items.extend(tail);
            Value::Number(items.len() as f64)
        }
        "join" => {
            let separator = match arg(&args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_string(),
            };
            let parts: Vec<String> = items
                .borrow()
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_string()
                    }
                })
                .collect();
            let total = parts
                .iter()
                .try_fold(0usize, |acc, part| acc.checked_add(part.len()))
                .zip(separator.len().checked_mul(parts.len().saturating_sub(1)))
                .and_then(|(text, separators)| text.checked_add(separators));
            check_string_length(total)?;
            Value::string(parts.join(&separator))
        }
        "toString" => Value::string(receiver.to_string()),
        "includes" => {
            let needle = arg(&args, 0);
            Value::Bool(items.borrow().iter().any(|item| same_value_zero(item, &needle)))
        }
        "indexOf" => {
            let needle = arg(&args, 0);
            Value::Number(
                items
                    .borrow()
                    .iter()
                    .position(|item| strict_equals(item, &needle))
                    .map(|i| i as f64)
                    .unwrap_or(-1.0),
            )
        }
        "slice" => {
            let items = items.borrow();
            let len = items.len();
            let start = relative_index(&arg(&args, 0), len, 0);
            let end = relative_index(&arg(&args, 1), len, len);
            let sliced = if start < end {
                items[start..end].to_vec()
            } else {
                Vec::new()
            };
            Value::array(sliced)
        }
        "concat" => {
            let mut out = snapshot();
            for value in args {
                match value {
                    Value::Array(other) => out.extend(other.borrow().iter().cloned()),
                    other => out.push(other),
                }
                check_array_length(out.len() as f64)?;
            }
            Value::array(out)
        }
        "reverse" => {
            items.borrow_mut().reverse();
            receiver.clone()
        }
        "map" | "filter" | "forEach" | "find" | "findIndex" | "some" | "every" => {
            let callback = expect_callable(arg(&args, 0))?;
            let mut mapped = Vec::new();
            for (i, item) in snapshot().into_iter().enumerate() {
                let result = interp.call_function(
                    &callback,
                    vec![item.clone(), Value::Number(i as f64), receiver.clone()],
                )?;
                match name {
                    "map" => mapped.push(result),
                    "filter" if result.truthy() => mapped.push(item),
                    "find" if result.truthy() => return Ok(item),
                    "findIndex" if result.truthy() => return Ok(Value::Number(i as f64)),
                    "some" if result.truthy() => return Ok(Value::Bool(true)),
                    "every" if !result.truthy() => return Ok(Value::Bool(false)),
                    _ => {}
                }
            }
            match name {
                "map" | "filter" => Value::array(mapped),
                "findIndex" => Value::Number(-1.0),
                "some" => Value::Bool(false),
                "every" => Value::Bool(true),
                _ => Value::Undefined,
            }
        }
        "reduce" => {
            let callback = expect_callable(arg(&args, 0))?;
            let mut entries = snapshot().into_iter().enumerate();
            let mut acc = if args.len() > 1 {
                arg(&args, 1)
            } else {
                match entries.next() {
                    Some((_, first)) => first,
                    None => {
                        return Err(RuntimeError::type_error(
                            "Reduce of empty array with no initial value",
                        ));
                    }
                }
            };
            for (i, item) in entries {
                acc = interp.call_function(
                    &callback,
                    vec![acc, item, Value::Number(i as f64), receiver.clone()],
                )?;
            }
            acc
        }
        "sort" => {
            let comparator = match arg(&args, 0) {
                Value::Undefined => None,
                other => Some(expect_callable(other)?),
            };
            let mut sorted = snapshot();
            // Insertion sort: stable, and the comparator may fail.
            for i in 1..sorted.len() {
                let mut j = i;
                while j > 0 {
                    let ordering = compare_for_sort(
                        interp,
                        comparator.as_ref(),
                        &sorted[j - 1],
                        &sorted[j],
                    )?;
                    if ordering != Ordering::Greater {
                        break;
                    }
                    sorted.swap(j - 1, j);
                    j -= 1;
                }
            }
            *items.borrow_mut() = sorted;
            receiver.clone()
        }
        _ => return Err(not_a_function(receiver, name)),
    })
}

fn compare_for_sort(
    interp: &mut Interpreter,
    comparator: Option<&Value>,
    a: &Value,
    b: &Value,
) -> RuntimeResult<Ordering> {
    // `undefined` always sorts last.
    match (a, b) {
        (Value::Undefined, Value::Undefined) => return Ok(Ordering::Equal),
        (Value::Undefined, _) => return Ok(Ordering::Greater),
        (_, Value::Undefined) => return Ok(Ordering::Less),
        _ => {}
    }
    match comparator {
        Some(comparator) => {
            let n = interp
                .call_function(comparator, vec![a.clone(), b.clone()])?
                .to_number();
            Ok(n.partial_cmp(&0.0).unwrap_or(Ordering::Equal))
        }
        None => Ok(a.to_string().cmp(&b.to_string())),
    }
}

fn number_method(n: f64, name: &str, args: &[Value]) -> RuntimeResult<Value> {
    match name {
        "toFixed" => {
            let digits = to_integer(&arg(args, 0));
            if !(0.0..=100.0).contains(&digits) {
                return Err(RuntimeError::Range(
                    "toFixed() digits argument must be between 0 and 100".to_string(),
                ));
            }
            if !n.is_finite() || n.abs() >= 1e21 {
                return Ok(Value::string(number_to_string(n)));
            }
            Ok(Value::string(format!("{:.*}", digits as usize, n)))
        }
        "toString" | "valueOf" => Ok(Value::string(number_to_string(n))),
        _ => Err(not_a_function(&Value::Number(n), name)),
    }
}

// ============ Globals ============

pub(crate) fn install_globals(interp: &mut Interpreter) {
    interp.define("NaN", Value::Number(f64::NAN));
    interp.define("Infinity", Value::Number(f64::INFINITY));

    interp.define(
        "Math",
        namespace(vec![
            ("PI", Value::Number(std::f64::consts::PI)),
            ("E", Value::Number(std::f64::consts::E)),
            ("floor", native("floor", |a| Ok(arg(a, 0).to_number().floor().into()))),
            ("ceil", native("ceil", |a| Ok(arg(a, 0).to_number().ceil().into()))),
            (
                "round",
                native("round", |a| Ok((arg(a, 0).to_number() + 0.5).floor().into())),
            ),
            ("abs", native("abs", |a| Ok(arg(a, 0).to_number().abs().into()))),
            ("trunc", native("trunc", |a| Ok(arg(a, 0).to_number().trunc().into()))),
            ("sqrt", native("sqrt", |a| Ok(arg(a, 0).to_number().sqrt().into()))),
            ("sign", native("sign", |a| {
                let n = arg(a, 0).to_number();
                Ok(if n == 0.0 || n.is_nan() { n } else { n.signum() }.into())
            })),
            (
                "pow",
                native("pow", |a| Ok(arg(a, 0).to_number().powf(arg(a, 1).to_number()).into())),
            ),
            ("max", native("max", |a| Ok(fold_numbers(a, f64::NEG_INFINITY, f64::max).into()))),
            ("min", native("min", |a| Ok(fold_numbers(a, f64::INFINITY, f64::min).into()))),
        ]),
    );

    interp.define(
        "JSON",
        namespace(vec![
            ("stringify", native("stringify", json_stringify)),
            ("parse", native("parse", json_parse)),
        ]),
    );

    interp.define(
        "Object",
        namespace(vec![
            ("keys", native("keys", |a| object_entries(a, |k, _| k))),
            ("values", native("values", |a| object_entries(a, |_, v| v))),
            (
                "entries",
                native("entries", |a| object_entries(a, |k, v| Value::array(vec![k, v]))),
            ),
        ]),
    );

    interp.define(
        "Array",
        namespace(vec![(
            "isArray",
            native("isArray", |a| Ok(matches!(arg(a, 0), Value::Array(_)).into())),
        )]),
    );

    interp.define(
        "String",
        native("String", |a| {
            Ok(match a.first() {
                Some(value) => Value::string(value.to_string()),
                None => Value::string(""),
            })
        }),
    );
    interp.define(
        "Number",
        native("Number", |a| {
            Ok(a.first().map(Value::to_number).unwrap_or(0.0).into())
        }),
    );
    interp.define(
        "Boolean",
        native("Boolean", |a| Ok(arg(a, 0).truthy().into())),
    );
    interp.define(
        "isNaN",
        native("isNaN", |a| Ok(arg(a, 0).to_number().is_nan().into())),
    );
    interp.define("parseInt", native("parseInt", parse_int));
    interp.define("parseFloat", native("parseFloat", parse_float));
}

/// `Math.max`/`Math.min`: any `NaN` argument wins.
fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}

fn object_entries(args: &[Value], project: fn(Value, Value) -> Value) -> RuntimeResult<Value> {
    let target = arg(args, 0);
    if target.is_nullish() {
        return Err(RuntimeError::type_error(
            "Cannot convert undefined or null to object",
        ));
    }
    let entries = own_keys(&target)
        .into_iter()
        .map(|key| {
            let value = get_property(&target, &key.to_string())?;
            Ok(project(key, value))
        })
        .collect::<RuntimeResult<Vec<_>>>()?;
    Ok(Value::array(entries))
}

fn json_stringify(args: &[Value]) -> RuntimeResult<Value> {
    let Some(json) = arg(args, 0).to_json()? else {
        return Ok(Value::Undefined);
    };
    let indent = match arg(args, 2) {
        Value::Number(n) if n >= 1.0 => Some(" ".repeat(n.min(10.0) as usize)),
        Value::String(s) if !s.is_empty() => Some(s.chars().take(10).collect()),
        _ => None,
    };

    let text = match indent {
        None => serde_json::to_string(&json),
        Some(indent) => {
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            json.serialize(&mut serializer)
                .map(|()| String::from_utf8_lossy(&buf).into_owned())
        }
    }
    .map_err(|e| RuntimeError::type_error(e.to_string()))?;
    Ok(Value::string(text))
}

fn json_parse(args: &[Value]) -> RuntimeResult<Value> {
    let text = arg(args, 0).to_string();
    let json: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| RuntimeError::Syntax(e.to_string()))?;
    Ok(Value::from_json(&json))
}

/// Longest leading run of digits valid in `radix`, after an optional sign.
fn parse_int(args: &[Value]) -> RuntimeResult<Value> {
    let text = arg(args, 0).to_string();
    let mut s = text.trim_start();
    let negative = s.starts_with('-');
    if s.starts_with('-') || s.starts_with('+') {
        s = &s[1..];
    }

    // The radix wraps like a 32-bit signed integer.
    let radix = match to_integer(&arg(args, 1)) {
        n if n.is_finite() => n.rem_euclid(4294967296.0),
        _ => 0.0,
    };
    let radix = if radix >= 2147483648.0 { radix - 4294967296.0 } else { radix };
    if radix != 0.0 && !(2.0..=36.0).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    let mut radix = radix as u32;
    if radix == 0 || radix == 16 {
        if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            s = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }

    let digits: String = s.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return Ok(Value::Number(f64::NAN));
    }
    let value = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64);
    Ok(Value::Number(if negative { -value } else { value }))
}

/// Longest leading prefix that parses as a decimal number.
fn parse_float(args: &[Value]) -> RuntimeResult<Value> {
    let text = arg(args, 0).to_string();
    let s = text.trim_start();
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned.starts_with("Infinity") {
        let sign = if s.starts_with('-') { -1.0 } else { 1.0 };
        return Ok(Value::Number(sign * f64::INFINITY));
    }
    let mut end = 0;
    for (i, c) in s.char_indices() {
        let candidate = &s[..i + c.len_utf8()];
        let parses = candidate.parse::<f64>().is_ok() && !candidate.contains(['i', 'n', 'I', 'N']);
        // Allow incomplete exponents/fractions to extend the prefix.
        let partial = matches!(c, 'e' | 'E' | '+' | '-' | '.');
        if parses {
            end = i + c.len_utf8();
        } else if !partial {
            break;
        }
    }
    Ok(Value::Number(s[..end].parse().unwrap_or(f64::NAN)))
}
