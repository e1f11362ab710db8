//! Conversion between literal expressions and JSON values.

use crate::ast::*;
use serde_json::{Map, Number, Value};

/// The JSON value of a pure-literal expression, or `None` if it needs
/// evaluation (references, calls, operators other than negation).
pub fn to_json(expr: &Expr) -> Option<Value> {
    match &expr.kind {
        ExprKind::Null => Some(Value::Null),
        ExprKind::Bool(value) => Some(Value::Bool(*value)),
        ExprKind::Number(raw) => parse_number(raw).map(Value::Number),
        ExprKind::Str(value) => Some(Value::String(value.clone())),
        ExprKind::Array(items) => items.iter().map(to_json).collect::<Option<Vec<_>>>().map(Value::Array),
        ExprKind::Object(members) => {
            let mut map = Map::new();
            for member in members {
                let Member::Field(field) = member else {
                    return None;
                };
                if field.plus || field.params.is_some() || field.visibility == Visibility::Hidden {
                    return None;
                }
                map.insert(field.key.name()?.to_string(), to_json(&field.value)?);
            }
            Some(Value::Object(map))
        }
        ExprKind::Unary(UnaryOp::Neg, operand) => match to_json(operand)? {
            Value::Number(n) => negate(&n).map(Value::Number),
            _ => None,
        },
        ExprKind::Paren(inner) => to_json(inner),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<Number> {
    if let Ok(Value::Number(n)) = serde_json::from_str::<Value>(raw) {
        return Some(n);
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64)
}

fn negate(n: &Number) -> Option<Number> {
    if let Some(i) = n.as_i64() {
        return Some(Number::from(-i));
    }
    if n.as_u64() == Some(i64::MIN.unsigned_abs()) {
        return Some(Number::from(i64::MIN));
    }
    n.as_f64().and_then(|f| Number::from_f64(-f))
}

/// Build a synthetic literal expression for a JSON value.
pub fn from_json(value: &Value) -> Expr {
    match value {
        Value::Null => Expr::synthetic(ExprKind::Null),
        Value::Bool(b) => Expr::synthetic(ExprKind::Bool(*b)),
        Value::Number(n) => {
            let raw = n.to_string();
            match raw.strip_prefix('-') {
                Some(positive) => Expr::synthetic(ExprKind::Unary(
                    UnaryOp::Neg,
                    Box::new(Expr::synthetic(ExprKind::Number(positive.to_string()))),
                )),
                None => Expr::synthetic(ExprKind::Number(raw)),
            }
        }
        Value::String(s) => Expr::string(s.clone()),
        Value::Array(items) => Expr::synthetic(ExprKind::Array(items.iter().map(from_json).collect())),
        Value::Object(map) => Expr::object(map.iter().map(|(k, v)| (k.clone(), from_json(v))).collect()),
    }
}

/// Human-readable form of a value: quoted strings, bare numbers and
/// booleans, compact JSON for arrays and objects.
pub fn display(value: &Value) -> String {
    value.to_string()
}
