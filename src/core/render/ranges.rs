//! Reference range resolution
//!
//! Given a field code and patient demographic context, picks the normal band
//! that applies. Resolution priority, most specific first:
//!
//! 1. pregnancy-specific (trimester band when gestational weeks are known)
//! 2. age band
//! 3. gender
//! 4. generic "all" range
//! 5. global critical-value table keyed by field code
//! 6. no range: the field renders without interpretation

use crate::domain::patient::PatientContext;
use crate::domain::template::{RangeSpec, ReferenceRange};
use serde::{Deserialize, Serialize};

/// Which tier of the resolution tree supplied the range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSource {
    Pregnancy,
    AgeBand,
    Gender,
    Generic,
    GlobalCritical,
}

/// A resolved range plus the tier it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRange {
    pub spec: RangeSpec,
    pub source: RangeSource,
}

/// Resolves the reference range for one field against patient context
///
/// `field_range` is the template-declared resolution tree for the field, if
/// any. Falls back to the global critical-value table when the tree yields
/// nothing, and to `None` (no interpretation) after that.
pub fn resolve_range(
    field_code: &str,
    field_range: Option<&ReferenceRange>,
    patient: &PatientContext,
) -> Option<ResolvedRange> {
    if let Some(tree) = field_range {
        if let Some(resolved) = resolve_from_tree(tree, patient) {
            return Some(resolved);
        }
    }

    global_critical_range(field_code).map(|spec| ResolvedRange {
        spec,
        source: RangeSource::GlobalCritical,
    })
}

fn resolve_from_tree(tree: &ReferenceRange, patient: &PatientContext) -> Option<ResolvedRange> {
    // Pregnancy beats everything else, trimester-specific when known.
    if patient.pregnant {
        if let Some(ref pregnancy) = tree.pregnancy {
            if let Some(weeks) = patient.gestational_weeks {
                for band in &pregnancy.trimesters {
                    if weeks >= band.from_week && weeks <= band.to_week {
                        return Some(ResolvedRange {
                            spec: band.range.clone(),
                            source: RangeSource::Pregnancy,
                        });
                    }
                }
            }
            if let Some(ref default) = pregnancy.default {
                return Some(ResolvedRange {
                    spec: default.clone(),
                    source: RangeSource::Pregnancy,
                });
            }
        }
    }

    if let Some(age) = patient.age_years {
        for band in &tree.age_bands {
            if age >= band.min_years && age < band.max_years {
                return Some(ResolvedRange {
                    spec: band.range.clone(),
                    source: RangeSource::AgeBand,
                });
            }
        }
    }

    if let Some(gender) = patient.gender {
        if let Some(spec) = tree.by_gender.get(&gender) {
            return Some(ResolvedRange {
                spec: spec.clone(),
                source: RangeSource::Gender,
            });
        }
    }

    tree.all.as_ref().map(|spec| ResolvedRange {
        spec: spec.clone(),
        source: RangeSource::Generic,
    })
}

/// Global critical-value table
///
/// Safety net for fields whose template declares no range of its own. Keyed
/// by conventional field codes; thresholds follow common laboratory
/// critical-value lists.
pub fn global_critical_range(field_code: &str) -> Option<RangeSpec> {
    let (critical_low, critical_high) = match field_code {
        "hemoglobin" => (Some(7.0), Some(20.0)),
        "platelet_count" => (Some(20.0), Some(1000.0)),
        "wbc_count" => (Some(2.0), Some(30.0)),
        "glucose" => (Some(50.0), Some(400.0)),
        "potassium" => (Some(2.8), Some(6.2)),
        "sodium" => (Some(120.0), Some(160.0)),
        "calcium" => (Some(6.5), Some(13.0)),
        "creatinine" => (None, Some(7.4)),
        "bilirubin_total" => (None, Some(15.0)),
        "inr" => (None, Some(5.0)),
        "troponin_i" => (None, Some(0.4)),
        "lactate" => (None, Some(4.0)),
        _ => return None,
    };

    Some(RangeSpec {
        min: None,
        max: None,
        critical_low,
        critical_high,
        significant_titre: None,
    })
}
