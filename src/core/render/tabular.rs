//! Tabular rendering
//!
//! Numeric panels: each field resolves its reference range against the
//! patient context, the raw value is interpreted, and calculated fields are
//! appended after all raw fields so formulas can reference raw field codes.

use super::interpret::{critical_bounds, interpret_numeric, numeric_value, Interpretation};
use super::ranges::resolve_range;
use super::rendered::{reference_text, RenderedField};
use super::RenderInput;
use crate::domain::report::CriticalValue;
use crate::domain::template::{Field, FieldType, Template};
use serde_json::Value;
use std::collections::BTreeMap;

/// Renders the raw fields of a tabular template
///
/// Returns the rendered fields in declaration order plus the critical values
/// detected along the way.
pub(super) fn render_fields(
    template: &Template,
    input: &RenderInput,
) -> (Vec<RenderedField>, Vec<CriticalValue>) {
    let mut fields = Vec::with_capacity(template.fields.len());
    let mut criticals = Vec::new();

    for field in &template.fields {
        let raw = input.results.get(&field.code);
        let (rendered, critical) = render_numeric_field(template, field, raw, input);
        if let Some(critical) = critical {
            criticals.push(critical);
        }
        fields.push(rendered);
    }

    (fields, criticals)
}

/// Renders calculated values as fields, interpreting them against any range
/// declared under the calculated code
pub(super) fn render_calculated_fields(
    template: &Template,
    input: &RenderInput,
    calculated: &BTreeMap<String, Value>,
) -> (Vec<RenderedField>, Vec<CriticalValue>) {
    let mut fields = Vec::with_capacity(template.calculated_fields.len());
    let mut criticals = Vec::new();

    for calc in &template.calculated_fields {
        // Synthetic field definition so calculated values share the numeric
        // interpretation path.
        let mut synthetic = Field::new(&calc.code, &calc.label, FieldType::Calculated);
        synthetic.unit = calc.unit.clone();

        let raw = calculated.get(&calc.code);
        let (rendered, critical) = render_numeric_field(template, &synthetic, raw, input);
        if let Some(critical) = critical {
            criticals.push(critical);
        }
        fields.push(rendered);
    }

    (fields, criticals)
}

/// Shared numeric rendering path, also used for the tabular subset of
/// hybrid templates and for repeatable-section instance fields
pub(super) fn render_numeric_field(
    template: &Template,
    field: &Field,
    raw: Option<&Value>,
    input: &RenderInput,
) -> (RenderedField, Option<CriticalValue>) {
    let resolved = resolve_range(
        &field.code,
        template.reference_ranges.get(&field.code),
        &input.patient,
    );
    let spec = resolved.as_ref().map(|r| &r.spec);

    let interpretation = interpret_numeric(raw, spec, field);

    let critical = match interpretation {
        Interpretation::CriticalLow | Interpretation::CriticalHigh => {
            let (low, high) = critical_bounds(spec, field);
            let value = raw.and_then(numeric_value).unwrap_or_default();
            let reason = if interpretation == Interpretation::CriticalLow {
                format!(
                    "{} at or below critical low {}",
                    value,
                    low.unwrap_or_default()
                )
            } else {
                format!(
                    "{} at or above critical high {}",
                    value,
                    high.unwrap_or_default()
                )
            };
            Some(CriticalValue::new(
                &field.code,
                &field.label,
                raw.cloned().unwrap_or(Value::Null),
                reason,
            ))
        }
        _ => None,
    };

    let rendered = RenderedField {
        code: field.code.clone(),
        label: field.label.clone(),
        field_type: field.field_type,
        value: raw.cloned().unwrap_or(Value::Null),
        unit: field.unit.clone(),
        reference_text: spec.and_then(reference_text),
        interpretation,
        is_critical: critical.is_some(),
    };

    (rendered, critical)
}
