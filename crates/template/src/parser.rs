//! Field list JSON parsing

use crate::{Result, TemplateError, TextField};
use std::collections::HashSet;

/// Parse a field list from JSON (an array of field objects)
///
/// The list is validated with [`validate_fields`].
pub fn parse_fields(json: &str) -> Result<Vec<TextField>> {
    let fields: Vec<TextField> =
        serde_json::from_str(json).map_err(|e| TemplateError::ParseError(e.to_string()))?;
    validate_fields(&fields)?;
    Ok(fields)
}

/// Serialize a field list as pretty JSON (two-space indent)
pub fn fields_to_json(fields: &[TextField]) -> Result<String> {
    Ok(serde_json::to_string_pretty(fields)?)
}

/// Check that every field has a non-blank name and that names are unique
pub fn validate_fields(fields: &[TextField]) -> Result<()> {
    let mut seen = HashSet::new();
    for (i, field) in fields.iter().enumerate() {
        if field.name.trim().is_empty() {
            return Err(TemplateError::FieldError(format!(
                "field #{} has an empty name",
                i + 1
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(TemplateError::FieldError(format!(
                "duplicate field name '{}'",
                field.name
            )));
        }
    }
    Ok(())
}

/// Field names in order; these are the dataset columns
pub fn field_names(fields: &[TextField]) -> Vec<String> {
    fields.iter().map(|f| f.name.clone()).collect()
}
