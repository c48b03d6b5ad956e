//! Filter operators understood by every document store

use serde_json::Value;
use std::cmp::Ordering;

/// Operator for filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to
    Eq,

    /// Not equal to
    Neq,

    /// Greater than
    Gt,

    /// Greater than or equal to
    Gte,

    /// Less than
    Lt,

    /// Less than or equal to
    Lte,

    /// In a non-empty list of values
    In,
}

impl FilterOperator {
    /// Convert the operator to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::In => "in",
        }
    }

    /// Evaluate the operator against a stored field value
    ///
    /// A missing field only matches `Neq`.
    pub fn matches(&self, field: Option<&Value>, operand: &Value) -> bool {
        let field = match field {
            Some(field) => field,
            None => return *self == FilterOperator::Neq,
        };
        match self {
            FilterOperator::Eq => compare_values(field, operand) == Ordering::Equal,
            FilterOperator::Neq => compare_values(field, operand) != Ordering::Equal,
            FilterOperator::Gt => compare_values(field, operand) == Ordering::Greater,
            FilterOperator::Gte => compare_values(field, operand) != Ordering::Less,
            FilterOperator::Lt => compare_values(field, operand) == Ordering::Less,
            FilterOperator::Lte => compare_values(field, operand) != Ordering::Greater,
            FilterOperator::In => operand
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .any(|v| compare_values(field, v) == Ordering::Equal)
                })
                .unwrap_or(false),
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: null < bool < number < string < array < object
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (x, y) in x.iter().zip(y.iter()) {
                let ord = compare_values(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Null, Value::Null) | (Value::Object(_), Value::Object(_)) => Ordering::Equal,
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
