//! Result-set validation against a template
//!
//! Checks required fields, numeric parsing and bounds, and enumerated
//! option membership. Failures come back as a structured field-level list;
//! unknown result codes produce warnings rather than errors so ad hoc
//! annotations survive round trips.

use crate::domain::errors::{FieldError, FieldErrorKind};
use crate::domain::template::{FieldType, Template};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of validating a result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Whether the result set passed
    pub valid: bool,

    /// Field-level failures
    pub errors: Vec<FieldError>,

    /// Non-fatal observations (unknown codes, ignored values)
    pub warnings: Vec<String>,
}

impl ValidationOutcome {
    fn new(errors: Vec<FieldError>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Validates raw results against the template's field definitions
pub fn validate_results(
    template: &Template,
    results: &BTreeMap<String, Value>,
) -> ValidationOutcome {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for field in &template.fields {
        let raw = results.get(&field.code);

        let present = match raw {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        };

        let raw = match raw {
            Some(raw) if present => raw,
            _ => {
                if field.required && field.field_type != FieldType::Calculated {
                    errors.push(FieldError::new(
                        &field.code,
                        FieldErrorKind::Required,
                        format!("'{}' is required", field.label),
                    ));
                }
                continue;
            }
        };

        match field.field_type {
            FieldType::Number => {
                let number = match raw {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                match number {
                    None => errors.push(FieldError::new(
                        &field.code,
                        FieldErrorKind::Type,
                        format!("'{}' must be numeric", field.label),
                    )),
                    Some(value) => {
                        if let Some(min) = field.min_value {
                            if value < min {
                                errors.push(FieldError::new(
                                    &field.code,
                                    FieldErrorKind::OutOfBounds,
                                    format!("'{}' must be >= {min}", field.label),
                                ));
                            }
                        }
                        if let Some(max) = field.max_value {
                            if value > max {
                                errors.push(FieldError::new(
                                    &field.code,
                                    FieldErrorKind::OutOfBounds,
                                    format!("'{}' must be <= {max}", field.label),
                                ));
                            }
                        }
                    }
                }
            }
            FieldType::Select | FieldType::Qualitative => {
                if !field.options.is_empty() {
                    let matches = raw
                        .as_str()
                        .map(|text| {
                            field
                                .options
                                .iter()
                                .any(|option| option.eq_ignore_ascii_case(text.trim()))
                        })
                        .unwrap_or(false);
                    if !matches {
                        errors.push(FieldError::new(
                            &field.code,
                            FieldErrorKind::InvalidOption,
                            format!(
                                "'{}' must be one of: {}",
                                field.label,
                                field.options.join(", ")
                            ),
                        ));
                    }
                }
            }
            FieldType::Text | FieldType::Textarea => {}
            FieldType::Calculated => {
                warnings.push(format!(
                    "calculated field '{}' was supplied directly; value is ignored",
                    field.code
                ));
            }
        }
    }

    // Repeatable instance arrays must actually be arrays.
    for section in &template.repeatable_sections {
        if let Some(value) = results.get(&section.id) {
            if !value.is_array() && !value.is_null() {
                errors.push(FieldError::new(
                    &section.id,
                    FieldErrorKind::Type,
                    format!("'{}' must be an array of instances", section.title),
                ));
            }
        }
    }

    for code in results.keys() {
        let known = template.field(code).is_some()
            || template.calculated_fields.iter().any(|c| &c.code == code)
            || template.repeatable_sections.iter().any(|s| &s.id == code);
        if !known {
            warnings.push(format!("unknown field code '{code}'"));
        }
    }

    ValidationOutcome::new(errors, warnings)
}
