//! Narrative rendering
//!
//! Free-text fields are grouped into sections verbatim. String values are
//! additionally scanned against the fixed critical phrase library; each
//! match adds a critical value. This is a textual safety net for findings
//! that cannot be numerically ranged.

use super::interpret::Interpretation;
use super::phrases::PhraseLibrary;
use super::rendered::RenderedField;
use super::RenderInput;
use crate::domain::report::CriticalValue;
use crate::domain::template::Template;
use serde_json::Value;

/// Renders the fields of a narrative template
pub(super) fn render_fields(
    template: &Template,
    input: &RenderInput,
    phrases: &PhraseLibrary,
) -> (Vec<RenderedField>, Vec<CriticalValue>) {
    let mut fields = Vec::with_capacity(template.fields.len());
    let mut criticals = Vec::new();

    for field in &template.fields {
        let raw = input.results.get(&field.code);

        let mut is_critical = false;
        if let Some(Value::String(text)) = raw {
            for label in phrases.scan(text) {
                is_critical = true;
                criticals.push(CriticalValue::new(
                    &field.code,
                    &field.label,
                    Value::String(text.clone()),
                    format!("critical phrase '{label}' detected"),
                ));
            }
        }

        let interpretation = match raw {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                if is_critical {
                    Interpretation::Abnormal
                } else {
                    Interpretation::Normal
                }
            }
            _ => Interpretation::NotDone,
        };

        fields.push(RenderedField {
            code: field.code.clone(),
            label: field.label.clone(),
            field_type: field.field_type,
            value: raw.cloned().unwrap_or(Value::Null),
            unit: None,
            reference_text: None,
            interpretation,
            is_critical,
        });
    }

    (fields, criticals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::TemplateCode;
    use crate::domain::patient::PatientContext;
    use crate::domain::template::{Field, FieldType, ReportCategory, Section, TemplateType};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn ct_brain_template() -> Template {
        Template::builder()
            .code(TemplateCode::new("CT_BRAIN").unwrap())
            .name("CT Brain Plain")
            .category(ReportCategory::Radiology)
            .template_type(TemplateType::Narrative)
            .section(Section::new("findings", "Findings", 1))
            .section(Section::new("impression", "Impression", 2))
            .field(
                Field::new("findings", "Findings", FieldType::Textarea).with_section("findings"),
            )
            .field(
                Field::new("impression", "Impression", FieldType::Textarea)
                    .with_section("impression"),
            )
            .build()
            .unwrap()
    }

    fn input(values: &[(&str, &str)]) -> RenderInput {
        let mut results = BTreeMap::new();
        for (code, value) in values {
            results.insert(code.to_string(), json!(value));
        }
        RenderInput {
            patient: PatientContext::default(),
            results,
            specimens: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_phrase_match_raises_critical() {
        let template = ct_brain_template();
        let phrases = PhraseLibrary::default_phrases().unwrap();
        let input = input(&[
            ("findings", "Acute intracranial hemorrhage with midline shift."),
            ("impression", "Needs urgent neurosurgical review."),
        ]);

        let (fields, criticals) = render_fields(&template, &input, &phrases);

        assert!(fields[0].is_critical);
        assert_eq!(fields[0].interpretation, Interpretation::Abnormal);
        // Two phrases matched in the findings text.
        assert_eq!(criticals.len(), 2);
        assert!(criticals.iter().all(|c| c.field_code == "findings"));
    }

    #[test]
    fn test_clean_narrative_is_normal() {
        let template = ct_brain_template();
        let phrases = PhraseLibrary::default_phrases().unwrap();
        let input = input(&[
            ("findings", "Normal study."),
            ("impression", "No acute abnormality."),
        ]);

        let (fields, criticals) = render_fields(&template, &input, &phrases);

        assert!(criticals.is_empty());
        assert!(fields.iter().all(|f| !f.is_critical));
        assert!(fields
            .iter()
            .all(|f| f.interpretation == Interpretation::Normal));
    }

    #[test]
    fn test_missing_text_is_not_done() {
        let template = ct_brain_template();
        let phrases = PhraseLibrary::default_phrases().unwrap();
        let input = input(&[("findings", "Normal study.")]);

        let (fields, _) = render_fields(&template, &input, &phrases);

        assert_eq!(fields[1].interpretation, Interpretation::NotDone);
    }
}
