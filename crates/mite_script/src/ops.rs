//! Operator semantics.

use std::rc::Rc;

use crate::ast::BinaryOp;
use crate::error::RuntimeResult;
use crate::value::{check_string_length, Value};

/// Apply a non-short-circuiting binary operator.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> RuntimeResult<Value> {
    Ok(match op {
        BinaryOp::Add => add(left, right)?,
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        // f64 `%` truncates toward zero and keeps the dividend's sign.
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Eq => Value::Bool(loose_equals(left, right)),
        BinaryOp::NotEq => Value::Bool(!loose_equals(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_equals(left, right)),
        BinaryOp::Lt => Value::Bool(compare(left, right, |o| o.is_lt())),
        BinaryOp::LtEq => Value::Bool(compare(left, right, |o| o.is_le())),
        BinaryOp::Gt => Value::Bool(compare(left, right, |o| o.is_gt())),
        BinaryOp::GtEq => Value::Bool(compare(left, right, |o| o.is_ge())),
    })
}

fn add(left: &Value, right: &Value) -> RuntimeResult<Value> {
    let left = left.to_primitive();
    let right = right.to_primitive();
    if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        let (left, right) = (left.to_string(), right.to_string());
        check_string_length(left.len().checked_add(right.len()))?;
        Ok(Value::string(left + &right))
    } else {
        Ok(Value::Number(left.to_number() + right.to_number()))
    }
}

fn compare(left: &Value, right: &Value, test: fn(std::cmp::Ordering) -> bool) -> bool {
    let left = left.to_primitive();
    let right = right.to_primitive();
    let ordering = match (&left, &right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    // Comparisons involving NaN are always false.
    ordering.map(test).unwrap_or(false)
}

/// `===`
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Native(a), Value::Native(b)) => a.name == b.name,
        _ => false,
    }
}

/// Like `===` but `NaN` equals itself, as used by `includes`.
pub fn same_value_zero(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
        _ => strict_equals(left, right),
    }
}

/// `==`
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            left.to_number() == right.to_number()
        }
        (Value::Bool(_), _) => loose_equals(&Value::Number(left.to_number()), right),
        (_, Value::Bool(_)) => loose_equals(left, &Value::Number(right.to_number())),
        (Value::Array(_) | Value::Object(_), Value::Number(_) | Value::String(_))
        | (Value::Number(_) | Value::String(_), Value::Array(_) | Value::Object(_)) => {
            loose_equals(&left.to_primitive(), &right.to_primitive())
        }
        _ => strict_equals(left, right),
    }
}
