use crate::utils::error::{ListsError, Result};
use serde_json::Value;

/// Extracts the numeric leaf a dot-path points at inside an arbitrary JSON
/// document. Every bot-list directory shapes its stats response differently
/// (flat field, nested object, array element), so the descent makes no
/// assumption about intermediate node types: objects are keyed by segment,
/// arrays are indexed when the segment parses as a number, and everything
/// else is a typed error rather than a panic.
///
/// "Segment not found" (missing key, index out of range) and "wrong type"
/// (descending into a scalar, non-numeric leaf) are distinct errors; the
/// former usually means a misconfigured accessor, the latter a changed
/// upstream response shape.
pub fn extract(document: &Value, path: &str) -> Result<i64> {
    let mut current = document;

    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map
                .get(segment)
                .ok_or_else(|| not_found(path, segment))?,
            Value::Array(items) => match segment.parse::<usize>() {
                Ok(index) => items
                    .get(index)
                    .ok_or_else(|| not_found(path, segment))?,
                Err(_) => {
                    return Err(wrong_type(
                        path,
                        segment,
                        "arrays require a numeric segment",
                    ))
                }
            },
            other => {
                return Err(wrong_type(
                    path,
                    segment,
                    &format!("cannot descend into {}", type_name(other)),
                ))
            }
        };
    }

    let leaf = path.rsplit('.').next().unwrap_or(path);
    match current {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| wrong_type(path, leaf, "number does not fit in i64")),
        other => Err(wrong_type(
            path,
            leaf,
            &format!("expected a number, found {}", type_name(other)),
        )),
    }
}

fn not_found(path: &str, segment: &str) -> ListsError {
    ListsError::AccessorNotFound {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

fn wrong_type(path: &str, segment: &str, reason: &str) -> ListsError {
    ListsError::AccessorWrongType {
        path: path.to_string(),
        segment: segment.to_string(),
        reason: reason.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
