//! Qualitative rendering
//!
//! Fields carry enumerated results (POSITIVE / NEGATIVE, REACTIVE /
//! NON_REACTIVE). Positive-like values classify as abnormal via the fixed
//! positive-value set; a field is critical when its value equals a declared
//! field critical value.

use super::interpret::interpret_qualitative;
use super::rendered::{reference_text, RenderedField};
use super::RenderInput;
use crate::domain::report::CriticalValue;
use crate::domain::template::Template;
use serde_json::Value;

/// Renders the fields of a qualitative template
pub(super) fn render_fields(
    template: &Template,
    input: &RenderInput,
) -> (Vec<RenderedField>, Vec<CriticalValue>) {
    let mut fields = Vec::with_capacity(template.fields.len());
    let mut criticals = Vec::new();

    for field in &template.fields {
        let raw = input.results.get(&field.code);
        let (rendered, critical) = render_qualitative_field(template, field, raw);
        if let Some(critical) = critical {
            criticals.push(critical);
        }
        fields.push(rendered);
    }

    (fields, criticals)
}

/// Shared qualitative rendering path, also used for the enumerated subset of
/// hybrid templates and for repeatable-section instance fields
pub(super) fn render_qualitative_field(
    template: &Template,
    field: &crate::domain::template::Field,
    raw: Option<&Value>,
) -> (RenderedField, Option<CriticalValue>) {
    let (interpretation, is_critical) = interpret_qualitative(raw, field);

    let critical = if is_critical {
        let value = raw.cloned().unwrap_or(Value::Null);
        let display = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some(CriticalValue::new(
            &field.code,
            &field.label,
            value,
            format!("result '{display}' matches a declared critical value"),
        ))
    } else {
        None
    };

    let titre_text = template
        .reference_ranges
        .get(&field.code)
        .and_then(|tree| tree.all.as_ref())
        .and_then(reference_text);

    let rendered = RenderedField {
        code: field.code.clone(),
        label: field.label.clone(),
        field_type: field.field_type,
        value: raw.cloned().unwrap_or(Value::Null),
        unit: field.unit.clone(),
        reference_text: titre_text,
        interpretation,
        is_critical,
    };

    (rendered, critical)
}
