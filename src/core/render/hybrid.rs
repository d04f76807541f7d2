//! Hybrid rendering
//!
//! Mixed templates partition their fields by type: numeric fields go through
//! the tabular interpretation path, enumerated fields through the
//! qualitative path, and free-text fields render verbatim. Repeatable
//! sections (e.g. one entry per isolated organism) are expanded from
//! per-section instance arrays in the result map, each with its own
//! antibiotic sensitivity sub-panel interpreted S/I/R.

use super::interpret::{Interpretation, Sensitivity};
use super::rendered::{RenderedField, RenderedRepeat, RenderedSensitivity};
use super::{qualitative, tabular, RenderInput};
use crate::domain::report::CriticalValue;
use crate::domain::template::{Field, FieldType, RepeatableSection, Template};
use serde_json::{Map, Value};

/// Renders a hybrid template's flat fields and expanded repeatable sections
pub(super) fn render(
    template: &Template,
    input: &RenderInput,
) -> (Vec<RenderedField>, Vec<RenderedRepeat>, Vec<CriticalValue>) {
    let mut fields = Vec::with_capacity(template.fields.len());
    let mut criticals = Vec::new();

    for field in &template.fields {
        let raw = input.results.get(&field.code);
        let (rendered, critical) = render_partitioned_field(template, field, raw, input);
        if let Some(critical) = critical {
            criticals.push(critical);
        }
        fields.push(rendered);
    }

    let mut repeats = Vec::new();
    for section in &template.repeatable_sections {
        expand_repeatable(template, section, input, &mut repeats, &mut criticals);
    }

    (fields, repeats, criticals)
}

/// Dispatches one field to the tabular, qualitative, or verbatim path
fn render_partitioned_field(
    template: &Template,
    field: &Field,
    raw: Option<&Value>,
    input: &RenderInput,
) -> (RenderedField, Option<CriticalValue>) {
    match field.field_type {
        FieldType::Number | FieldType::Calculated => {
            tabular::render_numeric_field(template, field, raw, input)
        }
        FieldType::Select | FieldType::Qualitative => {
            qualitative::render_qualitative_field(template, field, raw)
        }
        FieldType::Text | FieldType::Textarea => {
            let interpretation = match raw {
                Some(Value::String(s)) if !s.trim().is_empty() => Interpretation::Normal,
                _ => Interpretation::NotDone,
            };
            let rendered = RenderedField {
                code: field.code.clone(),
                label: field.label.clone(),
                field_type: field.field_type,
                value: raw.cloned().unwrap_or(Value::Null),
                unit: None,
                reference_text: None,
                interpretation,
                is_critical: false,
            };
            (rendered, None)
        }
    }
}

fn expand_repeatable(
    template: &Template,
    section: &RepeatableSection,
    input: &RenderInput,
    repeats: &mut Vec<RenderedRepeat>,
    criticals: &mut Vec<CriticalValue>,
) {
    let instances = match input.results.get(&section.id) {
        Some(Value::Array(items)) => items,
        _ => return,
    };

    for (index, instance) in instances.iter().enumerate() {
        let map = match instance {
            Value::Object(map) => map,
            _ => continue,
        };

        let mut fields = Vec::with_capacity(section.fields.len());
        for field in &section.fields {
            let raw = map.get(&field.code);
            let (mut rendered, critical) = render_partitioned_field(template, field, raw, input);
            if let Some(mut critical) = critical {
                // Qualify the code so acknowledgements can address the exact
                // instance.
                critical.field_code = format!("{}[{}].{}", section.id, index, field.code);
                criticals.push(critical);
                rendered.is_critical = true;
            }
            fields.push(rendered);
        }

        let sensitivities = section
            .sensitivity_panel
            .as_ref()
            .map(|panel| render_sensitivities(map, &panel.field_code, &panel.antibiotics))
            .unwrap_or_default();

        repeats.push(RenderedRepeat {
            section_id: section.id.clone(),
            title: section.title.clone(),
            instance: index,
            fields,
            sensitivities,
        });
    }
}

fn render_sensitivities(
    instance: &Map<String, Value>,
    panel_field: &str,
    antibiotics: &[String],
) -> Vec<RenderedSensitivity> {
    let panel = instance.get(panel_field).and_then(Value::as_object);

    antibiotics
        .iter()
        .map(|antibiotic| {
            let result = panel
                .and_then(|p| p.get(antibiotic))
                .and_then(Value::as_str)
                .and_then(Sensitivity::parse);
            RenderedSensitivity {
                antibiotic: antibiotic.clone(),
                result,
            }
        })
        .collect()
}
