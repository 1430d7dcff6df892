//! Normalization of free-text MIC fields.
//!
//! Lab exports report concentrations as `"1"`, `"0,5 mg/L"`, `">2 mg/L"` or
//! `"≤0.25"`. The numeric magnitude is kept and any inequality qualifier is
//! discarded, so `">2"` and `"2"` normalize to the same value. The qualifier
//! is still available through [`parse_mic`] for reporting.

use serde::{Deserialize, Serialize};

/// Unit suffixes stripped before parsing, lowercase
const UNIT_SUFFIXES: [&str; 4] = ["mg/l", "µg/ml", "μg/ml", "ug/ml"];

/// Inequality qualifier reported alongside a MIC value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MicQualifier {
    Exact,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

/// A parsed MIC observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicValue {
    /// Numeric magnitude in mg/L
    pub value: f64,
    /// Qualifier that preceded the magnitude
    pub qualifier: MicQualifier,
}

/// Parse a raw MIC string into its magnitude and qualifier
#[must_use]
pub fn parse_mic(raw: &str) -> Option<MicValue> {
    let mut text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let lower = text.to_lowercase();
    for suffix in UNIT_SUFFIXES {
        if lower.ends_with(suffix) {
            // Suffixes are ASCII apart from the micro sign; cut by char count
            let keep = text.chars().count().saturating_sub(suffix.chars().count());
            let cut = text.char_indices().nth(keep).map_or(text.len(), |(i, _)| i);
            text = text[..cut].trim_end();
            break;
        }
    }

    let (qualifier, magnitude) = split_qualifier(text);
    let value: f64 = magnitude.trim().replace(',', ".").parse().ok()?;
    value.is_finite().then_some(MicValue { value, qualifier })
}

/// Parse a raw MIC string into a numeric value, discarding any qualifier
#[must_use]
pub fn normalize_mic(raw: &str) -> Option<f64> {
    parse_mic(raw).map(|mic| mic.value)
}

fn split_qualifier(text: &str) -> (MicQualifier, &str) {
    const PREFIXES: [(&str, MicQualifier); 7] = [
        (">=", MicQualifier::GreaterOrEqual),
        ("<=", MicQualifier::LessOrEqual),
        ("≥", MicQualifier::GreaterOrEqual),
        ("≤", MicQualifier::LessOrEqual),
        (">", MicQualifier::Greater),
        ("<", MicQualifier::Less),
        ("=", MicQualifier::Exact),
    ];

    let text = text.trim_start();
    PREFIXES
        .iter()
        .find_map(|(prefix, qualifier)| text.strip_prefix(prefix).map(|rest| (*qualifier, rest)))
        .unwrap_or((MicQualifier::Exact, text))
}
