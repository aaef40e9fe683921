//! CSV export of record collections.

use serde::Serialize;
use serde_json::Value;

use crate::models::Entity;

/// Errors that can occur while exporting.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A row did not serialize to a JSON object.
    #[error("export row is not an object")]
    NotAnObject,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Render rows as CSV.
///
/// The header comes from the first row's fields in declaration order and rows
/// are joined with `\n`. Empty input gives an empty string.
///
/// # Errors
///
/// Returns `ExportError::NotAnObject` if a row is not a struct or map.
pub fn objects_to_csv<T: Serialize>(rows: &[T]) -> Result<String, ExportError> {
    let mut objects = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::to_value(row)? {
            Value::Object(map) => objects.push(map),
            _ => return Err(ExportError::NotAnObject),
        }
    }

    let Some(first) = objects.first() else {
        return Ok(String::new());
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut lines = Vec::with_capacity(objects.len() + 1);
    lines.push(headers.iter().map(|h| escape(h)).collect::<Vec<_>>().join(","));
    for object in &objects {
        let line = headers
            .iter()
            .map(|header| render_cell(object.get(header).unwrap_or(&Value::Null)))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

/// Export rows of a collection, projected to their export shape.
///
/// # Errors
///
/// Returns an `ExportError` if serialization fails.
pub fn records_to_csv<E: Entity>(records: &[E]) -> Result<String, ExportError> {
    let rows: Vec<E::Export> = records.iter().map(Entity::to_export).collect();
    objects_to_csv(&rows)
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => escape(s),
        Value::Array(_) | Value::Object(_) => escape(&value.to_string()),
    }
}

/// Quote a field if it contains a comma, quote or newline.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}
