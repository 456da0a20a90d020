//! Value/unit extraction from retrieved manual text.
//!
//! Dispatch by specification-key category selects a category-specific
//! pattern; dimension strings additionally parse mixed-fraction numerals
//! (`33 1/4`) and support both a unit-trailing layout
//! (`27'' X 33 1/4'' X 39''`) and a unit-per-token layout
//! (`70cm X 84 cm X 99 cm`). A missing numeric match or unit is a normal
//! "not found" outcome, never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::convert::{convert, normalize_unit, UnitError};

/// Shape of an extracted measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Single,
    Range,
    Dimension,
}

/// A measurement pulled out of raw retrieved text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedValue {
    pub kind: ValueKind,
    pub numeric_values: Vec<f64>,
    pub unit: String,
    pub spec_key: String,
}

impl ExtractedValue {
    /// Converts every numeric value to the target unit. Unrecognized or
    /// cross-family units bubble up so the caller can keep the original
    /// text unmodified.
    pub fn convert_to(&self, to_unit: &str) -> Result<ExtractedValue, UnitError> {
        let converted = self
            .numeric_values
            .iter()
            .map(|v| convert(*v, &self.unit, to_unit))
            .collect::<Result<Vec<f64>, UnitError>>()?;
        Ok(ExtractedValue {
            kind: self.kind,
            numeric_values: converted,
            unit: normalize_unit(to_unit),
            spec_key: self.spec_key.clone(),
        })
    }
}

/// Specification-key categories with dedicated extraction patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecCategory {
    Weight,
    Dimension,
    Length,
    Range,
    SpinSpeed,
    Capacity,
    Temperature,
    Generic,
}

/// Maps a spec key (e.g. "net weight", "max spin speed") to its category.
pub fn category_of(spec_key: &str) -> SpecCategory {
    let k = spec_key.to_lowercase();
    if k.contains("weight") {
        SpecCategory::Weight
    } else if k.contains("dimension") || k.contains("size") {
        SpecCategory::Dimension
    } else if k.contains("width") || k.contains("height") || k.contains("depth") {
        SpecCategory::Length
    } else if k.contains("spin") || k.contains("rpm") {
        SpecCategory::SpinSpeed
    } else if k.contains("capacity") || k.contains("volume") {
        SpecCategory::Capacity
    } else if k.contains("min") || k.contains("max") || k.contains("range") {
        // Before temperature: "operating temperature range" is a range.
        SpecCategory::Range
    } else if k.contains("temperature") {
        SpecCategory::Temperature
    } else {
        SpecCategory::Generic
    }
}

/// Regex-based extractor; patterns are compiled once at construction.
pub struct ValueExtractor {
    weight_re: Regex,
    length_re: Regex,
    range_re: Regex,
    spin_re: Regex,
    capacity_re: Regex,
    temperature_re: Regex,
    generic_re: Regex,
    dimension_token_re: Regex,
    dimension_split_re: Regex,
}

impl ValueExtractor {
    pub fn new() -> Self {
        let number = r"(\d+(?:\.\d+)?)(?:\s+(\d+)\s*/\s*(\d+))?";
        Self {
            weight_re: Regex::new(&format!(
                r"(?i){}\s*(kg|kgs|lbs?|pounds?|g|oz)\b",
                number
            ))
            .expect("static regex"),
            length_re: Regex::new(&format!(
                r#"(?i){}\s*(''|"|″|inch(?:es)?|in\b|cm\b|mm\b|m\b|ft\b)"#,
                number
            ))
            .expect("static regex"),
            range_re: Regex::new(
                r"(?i)(-?\d+(?:\.\d+)?)\s*(?:-|–|~|to)\s*(-?\d+(?:\.\d+)?)\s*°?\s*([a-z°]+)?",
            )
            .expect("static regex"),
            spin_re: Regex::new(r"(?i)(\d{3,5})\s*(rpm)\b").expect("static regex"),
            capacity_re: Regex::new(&format!(
                r"(?i){}\s*(cu\.?\s*ft\.?|cubic\s*feet|liters?|litres?|l\b|kg)",
                number
            ))
            .expect("static regex"),
            temperature_re: Regex::new(
                r"(?i)(-?\d+(?:\.\d+)?)\s*°?\s*(f|c|fahrenheit|celsius|kelvin)\b",
            )
            .expect("static regex"),
            generic_re: Regex::new(&format!(r#"(?i){}\s*([a-z°'"″]+)"#, number))
                .expect("static regex"),
            dimension_token_re: Regex::new(&format!(
                r#"(?i){}\s*(''|"|″|inch(?:es)?|in\b|cm\b|mm\b|m\b)?"#,
                number
            ))
            .expect("static regex"),
            dimension_split_re: Regex::new(r"(?i)\s*[x×]\s*").expect("static regex"),
        }
    }

    /// Extracts a measurement from raw text according to the spec key's
    /// category. Returns `None` when no value (or, where required, no
    /// unit) is present.
    pub fn extract(&self, spec_key: &str, raw: &str) -> Option<ExtractedValue> {
        let category = category_of(spec_key);
        debug!(spec_key = %spec_key, category = ?category, "extracting value");
        match category {
            SpecCategory::Weight => self.single(spec_key, raw, &self.weight_re),
            SpecCategory::Length => self.single(spec_key, raw, &self.length_re),
            SpecCategory::SpinSpeed => self.simple_single(spec_key, raw, &self.spin_re),
            SpecCategory::Capacity => self.single(spec_key, raw, &self.capacity_re),
            SpecCategory::Temperature => self.simple_single(spec_key, raw, &self.temperature_re),
            SpecCategory::Range => self.range(spec_key, raw),
            SpecCategory::Dimension => self.dimension(spec_key, raw),
            SpecCategory::Generic => self.single(spec_key, raw, &self.generic_re),
        }
    }

    /// One mixed-fraction value followed by a unit token.
    fn single(&self, spec_key: &str, raw: &str, re: &Regex) -> Option<ExtractedValue> {
        let caps = re.captures(raw)?;
        let value = mixed_fraction(&caps)?;
        let unit = normalize_unit(caps.get(4)?.as_str());
        Some(ExtractedValue {
            kind: ValueKind::Single,
            numeric_values: vec![value],
            unit,
            spec_key: spec_key.to_string(),
        })
    }

    /// One plain value followed by a unit token (no fraction group).
    fn simple_single(&self, spec_key: &str, raw: &str, re: &Regex) -> Option<ExtractedValue> {
        let caps = re.captures(raw)?;
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = normalize_unit(caps.get(2)?.as_str());
        Some(ExtractedValue {
            kind: ValueKind::Single,
            numeric_values: vec![value],
            unit,
            spec_key: spec_key.to_string(),
        })
    }

    fn range(&self, spec_key: &str, raw: &str) -> Option<ExtractedValue> {
        let caps = self.range_re.captures(raw)?;
        let lo: f64 = caps.get(1)?.as_str().parse().ok()?;
        let hi: f64 = caps.get(2)?.as_str().parse().ok()?;
        let unit = caps
            .get(3)
            .map(|m| normalize_unit(m.as_str()))
            .unwrap_or_default();
        Some(ExtractedValue {
            kind: ValueKind::Range,
            numeric_values: vec![lo, hi],
            unit,
            spec_key: spec_key.to_string(),
        })
    }

    /// Dimension strings: the segment before any parenthetical alternative
    /// is split on `X`, each token yields a mixed-fraction value and an
    /// optional unit; the layout's unit is the last one seen.
    fn dimension(&self, spec_key: &str, raw: &str) -> Option<ExtractedValue> {
        let primary = raw.split('(').next().unwrap_or(raw);
        let parts: Vec<&str> = self
            .dimension_split_re
            .split(primary)
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.len() < 2 {
            // Not a WxHxD layout; fall back to a single length value.
            return self.single(spec_key, raw, &self.length_re);
        }

        let mut values = Vec::with_capacity(parts.len());
        let mut unit = String::new();
        for part in parts {
            let caps = self.dimension_token_re.captures(part)?;
            values.push(mixed_fraction(&caps)?);
            if let Some(u) = caps.get(4) {
                unit = normalize_unit(u.as_str());
            }
        }
        if unit.is_empty() {
            return None;
        }

        Some(ExtractedValue {
            kind: ValueKind::Dimension,
            numeric_values: values,
            unit,
            spec_key: spec_key.to_string(),
        })
    }
}

impl Default for ValueExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Sums a whole part and an optional fraction from capture groups 1-3,
/// e.g. `33 1/4` -> 33.25.
fn mixed_fraction(caps: &regex::Captures<'_>) -> Option<f64> {
    let whole: f64 = caps.get(1)?.as_str().parse().ok()?;
    match (caps.get(2), caps.get(3)) {
        (Some(num), Some(den)) => {
            let num: f64 = num.as_str().parse().ok()?;
            let den: f64 = den.as_str().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            Some(whole + num / den)
        }
        _ => Some(whole),
    }
}
