//! Named clinical formulas
//!
//! These are implemented directly rather than through the generic expression
//! grammar: the coefficients are fixed by the published equations and must
//! not be template-editable. Selection happens by formula-name prefix in
//! [`super::formula::evaluate_calculated`].

use super::formula::EvalContext;
use crate::domain::errors::AssayError;
use crate::domain::patient::Gender;
use crate::domain::result::Result;

/// Estimated glomerular filtration rate, CKD-EPI 2021 (race-free)
///
/// `eGFR = 142 * min(Scr/k, 1)^alpha * max(Scr/k, 1)^-1.200 * 0.9938^age
/// * 1.012 (if female)` with `k` = 0.7 (female) / 0.9 (male) and `alpha` =
/// -0.241 (female) / -0.302 (male). Result in mL/min/1.73m², rounded to the
/// nearest integer.
pub fn egfr_ckd_epi_2021(serum_creatinine_mg_dl: f64, age_years: f64, female: bool) -> f64 {
    let (kappa, alpha, sex_multiplier) = if female {
        (0.7, -0.241, 1.012)
    } else {
        (0.9, -0.302, 1.0)
    };

    let ratio = serum_creatinine_mg_dl / kappa;
    let egfr = 142.0
        * ratio.min(1.0).powf(alpha)
        * ratio.max(1.0).powf(-1.200)
        * 0.9938_f64.powf(age_years)
        * sex_multiplier;

    egfr.round()
}

/// Corrected QT interval, Bazett's formula
///
/// `QTc = QT / sqrt(RR)` with `RR = 60 / HR` in seconds. QT in
/// milliseconds, heart rate in beats per minute; result in milliseconds,
/// rounded to the nearest integer.
pub fn qtc_bazett(qt_ms: f64, heart_rate_bpm: f64) -> Result<f64> {
    if heart_rate_bpm <= 0.0 {
        return Err(AssayError::FormulaEvaluation(
            "qtc requires a positive heart rate".to_string(),
        ));
    }
    let rr_seconds = 60.0 / heart_rate_bpm;
    Ok((qt_ms / rr_seconds.sqrt()).round())
}

/// `egfr(<creatinine_field>)`: resolves the creatinine value from the
/// result set and age/gender from patient context
///
/// Patients of unknown or other gender use the male coefficients.
pub fn egfr_from_context(args: &[String], ctx: &EvalContext<'_>) -> Result<f64> {
    let creatinine_field = match args {
        [field] => field.as_str(),
        _ => {
            return Err(AssayError::FormulaEvaluation(
                "egfr expects exactly one argument: the creatinine field code".to_string(),
            ))
        }
    };

    let creatinine = ctx.number(creatinine_field)?;
    let age = ctx.patient.age_years.ok_or_else(|| {
        AssayError::FormulaEvaluation("egfr requires patient age".to_string())
    })?;
    let female = ctx.patient.gender == Some(Gender::Female);

    Ok(egfr_ckd_epi_2021(creatinine, age, female))
}

/// `qtc(<qt_field>, <heart_rate_field>)`: resolves both values from the
/// result set
pub fn qtc_from_context(args: &[String], ctx: &EvalContext<'_>) -> Result<f64> {
    let (qt_field, hr_field) = match args {
        [qt, hr] => (qt.as_str(), hr.as_str()),
        _ => {
            return Err(AssayError::FormulaEvaluation(
                "qtc expects exactly two arguments: QT interval and heart rate field codes"
                    .to_string(),
            ))
        }
    };

    let qt = ctx.number(qt_field)?;
    let heart_rate = ctx.number(hr_field)?;
    qtc_bazett(qt, heart_rate)
}
