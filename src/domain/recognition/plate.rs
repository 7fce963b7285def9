//! Plate text handling: normalisation, format check and selection of the
//! plate string out of raw OCR detections.

use serde::{Deserialize, Serialize};

/// Provincial prefixes printed above the registration; never part of the
/// lookup key.
const PROVINCE_CODES: [&str; 7] = ["WP", "SP", "CP", "EP", "NP", "UP", "NW"];

/// Granularity of an OCR hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TextKind {
    Word,
    Line,
}

/// One raw text hit returned by an OCR engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDetection {
    pub text: String,
    pub kind: TextKind,
    /// 0–100
    pub confidence: f64,
}

impl TextDetection {
    pub fn word(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            kind: TextKind::Word,
            confidence,
        }
    }

    pub fn line(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            kind: TextKind::Line,
            confidence,
        }
    }
}

/// Plate text chosen by a recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateDetection {
    pub text: String,
    pub confidence: f64,
}

/// Uppercase and drop everything but ASCII letters and digits.
pub fn normalize_plate(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// 5 to 10 characters of `[A-Z0-9]` with at least one letter and one digit.
/// Expects normalised input.
pub fn is_valid_plate(plate: &str) -> bool {
    (5..=10).contains(&plate.len())
        && plate
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        && plate.chars().any(|c| c.is_ascii_uppercase())
        && plate.chars().any(|c| c.is_ascii_digit())
}

fn is_letter_group(text: &str) -> bool {
    (2..=3).contains(&text.len()) && text.chars().all(|c| c.is_ascii_uppercase())
}

fn is_digit_group(text: &str) -> bool {
    text.len() == 4 && text.chars().all(|c| c.is_ascii_digit())
}

/// Pick plate text from OCR output: the first 2–3 letter word that is not a
/// province code, followed by the first 4-digit word or line (whitespace
/// ignored). Confidence is the mean of the two hits. Returns `None` when no
/// letter group is found; a letter group without digits is returned alone.
pub fn select_plate_text(detections: &[TextDetection]) -> Option<PlateDetection> {
    let letters = detections.iter().find(|d| {
        d.kind == TextKind::Word
            && !PROVINCE_CODES.contains(&d.text.as_str())
            && is_letter_group(&d.text)
    })?;

    let mut text = letters.text.clone();
    let mut confidence = letters.confidence;

    let digits = detections.iter().find_map(|d| {
        let compact: String = d.text.chars().filter(|c| !c.is_whitespace()).collect();
        is_digit_group(&compact).then_some((compact, d.confidence))
    });
    if let Some((group, digit_confidence)) = digits {
        text.push(' ');
        text.push_str(&group);
        confidence = (confidence + digit_confidence) / 2.0;
    }

    Some(PlateDetection { text, confidence })
}
