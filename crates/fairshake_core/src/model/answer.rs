//! Answer values on the continuous FAIR scale.
//!
//! Categorical answers are stored as their position on the `[0, 1]` scale:
//! `no`=0, `no but`=0.25, `maybe`=0.5, `yes but`=0.75, `yes`=1.

use serde::{Deserialize, Serialize};

use super::ValidationError;

const CATEGORY_TOLERANCE: f64 = 1e-9;

const CATEGORIES: &[(f64, &str)] = &[
    (0.0, "no"),
    (0.25, "no but"),
    (0.5, "maybe"),
    (0.75, "yes but"),
    (1.0, "yes"),
];

/// Validated answer score in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct AnswerValue(f64);

impl AnswerValue {
    pub const NO: Self = Self(0.0);
    pub const YES: Self = Self(1.0);

    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::AnswerOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Parses a categorical label (`yes`, `yesbut`, `yes but`, `maybe`,
    /// `nobut`, `no but`, `no`) or a numeric score.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_lowercase();
        let compact = normalized.replace([' ', '_', '-'], "");
        for (value, label) in CATEGORIES {
            if label.replace(' ', "") == compact {
                return Ok(Self(*value));
            }
        }
        match normalized.parse::<f64>() {
            Ok(value) => Self::new(value),
            Err(_) => Err(ValidationError::UnknownAnswerLabel(input.trim().to_string())),
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Categorical label when the score sits exactly on one of the five points.
    pub fn label(self) -> Option<&'static str> {
        CATEGORIES
            .iter()
            .find(|(value, _)| (value - self.0).abs() < CATEGORY_TOLERANCE)
            .map(|(_, label)| *label)
    }

    /// Human-readable annotation used for chart axes.
    ///
    /// `yes (100%)`, `no but (25%)`, or just `60%` for off-scale scores.
    pub fn annotate(self, with_percentage: bool) -> String {
        let percentage = format!("{}%", (self.0 * 100.0).round() as i64);
        match (self.label(), with_percentage) {
            (Some(label), true) => format!("{label} ({percentage})"),
            (Some(label), false) => label.to_string(),
            (None, _) => percentage,
        }
    }
}

impl TryFrom<f64> for AnswerValue {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AnswerValue> for f64 {
    fn from(value: AnswerValue) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::AnswerValue;
    use crate::model::ValidationError;

    #[test]
    fn parses_categorical_labels() {
        assert_eq!(AnswerValue::parse("yes").unwrap().value(), 1.0);
        assert_eq!(AnswerValue::parse("YesBut").unwrap().value(), 0.75);
        assert_eq!(AnswerValue::parse("maybe").unwrap().value(), 0.5);
        assert_eq!(AnswerValue::parse("no but").unwrap().value(), 0.25);
        assert_eq!(AnswerValue::parse(" no ").unwrap().value(), 0.0);
    }

    #[test]
    fn parses_numeric_scores_and_rejects_out_of_range() {
        assert_eq!(AnswerValue::parse("0.6").unwrap().value(), 0.6);
        assert_eq!(
            AnswerValue::parse("1.5"),
            Err(ValidationError::AnswerOutOfRange(1.5))
        );
        assert!(matches!(
            AnswerValue::parse("perhaps"),
            Err(ValidationError::UnknownAnswerLabel(_))
        ));
    }

    #[test]
    fn annotation_includes_label_and_percentage() {
        assert_eq!(AnswerValue::YES.annotate(true), "yes (100%)");
        assert_eq!(AnswerValue::new(0.25).unwrap().annotate(true), "no but (25%)");
        assert_eq!(AnswerValue::new(0.25).unwrap().annotate(false), "no but");
        assert_eq!(AnswerValue::new(0.6).unwrap().annotate(true), "60%");
    }

    #[test]
    fn deserialization_enforces_range() {
        let ok: AnswerValue = serde_json::from_str("0.75").unwrap();
        assert_eq!(ok.label(), Some("yes but"));
        assert!(serde_json::from_str::<AnswerValue>("-0.1").is_err());
    }
}
