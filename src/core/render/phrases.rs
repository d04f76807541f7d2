//! Critical clinical phrase library
//!
//! Narrative reports carry findings that cannot be numerically ranged. As a
//! textual safety net, string field values are scanned against a fixed
//! library of critical clinical phrases and each match raises a critical
//! value.
//!
//! Known limitation: fixed-phrase matching produces false negatives for
//! paraphrased findings. The library is preserved for compatibility with the
//! established phrase set and is deliberately not a general NLP layer.

use crate::domain::errors::AssayError;
use crate::domain::result::Result;
use regex::Regex;

/// A compiled critical phrase pattern
#[derive(Debug, Clone)]
pub struct CriticalPhrase {
    /// Compiled case-insensitive regex
    pub regex: Regex,
    /// Canonical label reported in the critical-value reason
    pub label: &'static str,
}

/// The fixed phrase set scanned in narrative renders
const PHRASE_PATTERNS: &[(&str, &str)] = &[
    (r"intra\s*cranial\s+h(a?)emorrhage", "intracranial hemorrhage"),
    (r"tension\s+pneumothorax", "tension pneumothorax"),
    (r"aortic\s+dissection", "aortic dissection"),
    (r"pulmonary\s+embol(ism|us|i)", "pulmonary embolism"),
    (r"free\s+(intraperitoneal\s+)?air|pneumoperitoneum", "pneumoperitoneum"),
    (r"acute\s+infarct", "acute infarct"),
    (r"midline\s+shift", "midline shift"),
    (r"(spinal\s+)?cord\s+compression", "cord compression"),
    (r"malignant\s+cells", "malignant cells"),
    (r"ruptured\s+aneurysm|aneurysm(al)?\s+rupture", "ruptured aneurysm"),
    (r"bowel\s+perforation|perforated\s+viscus", "bowel perforation"),
    (r"ectopic\s+pregnancy", "ectopic pregnancy"),
];

/// Compiled library of critical clinical phrases
#[derive(Debug)]
pub struct PhraseLibrary {
    phrases: Vec<CriticalPhrase>,
}

impl PhraseLibrary {
    /// Compiles the built-in phrase set
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a built-in pattern fails to compile.
    pub fn default_phrases() -> Result<Self> {
        let mut phrases = Vec::with_capacity(PHRASE_PATTERNS.len());
        for (pattern, label) in PHRASE_PATTERNS {
            let regex = Regex::new(&format!("(?i){pattern}")).map_err(|e| {
                AssayError::Configuration(format!("Invalid phrase pattern '{pattern}': {e}"))
            })?;
            phrases.push(CriticalPhrase { regex, label });
        }
        Ok(Self { phrases })
    }

    /// Scans free text and returns the canonical labels of matched phrases
    ///
    /// Each phrase is reported at most once per scan, in library order.
    pub fn scan(&self, text: &str) -> Vec<&'static str> {
        self.phrases
            .iter()
            .filter(|phrase| phrase.regex.is_match(text))
            .map(|phrase| phrase.label)
            .collect()
    }
}
