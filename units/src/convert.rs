//! Unit conversion over fixed unit-family tables.
//!
//! Every family converts through a base unit with a linear factor;
//! Fahrenheit/Celsius/Kelvin is the only affine family and uses the exact
//! formulas instead of the factor table.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum UnitError {
    #[error("Unrecognized unit: {0}")]
    Unrecognized(String),

    #[error("Cannot convert {from} to {to}: different unit families")]
    CrossFamily { from: String, to: String },
}

/// Unit families the converter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    Length,
    Weight,
    Volume,
    Pressure,
    Temperature,
    Frequency,
    RotationalSpeed,
}

/// Canonicalizes a unit token: lowercase, dots removed, whitespace runs
/// collapsed, synonyms and the inch tick marks folded to one spelling.
/// "cu. ft.", "cu ft" and "cuft" all end up as `cuft`.
pub fn normalize_unit(unit: &str) -> String {
    let lowered = unit.trim().to_lowercase().replace('.', "");
    let u = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    match u.as_str() {
        "''" | "\"" | "″" | "in" | "inch" | "inches" => "inch".to_string(),
        "'" | "ft" | "feet" | "foot" => "ft".to_string(),
        "lbs" | "lb" | "pound" | "pounds" => "lb".to_string(),
        "kgs" | "kg" | "kilogram" | "kilograms" => "kg".to_string(),
        "grams" | "gram" | "g" => "g".to_string(),
        "ounce" | "ounces" | "oz" => "oz".to_string(),
        "millimeter" | "millimeters" | "mm" => "mm".to_string(),
        "centimeter" | "centimeters" | "cm" => "cm".to_string(),
        "meter" | "meters" | "m" => "m".to_string(),
        "liter" | "liters" | "litre" | "litres" | "l" => "l".to_string(),
        "ml" | "milliliter" | "milliliters" => "ml".to_string(),
        "cuft" | "cu ft" | "cubic feet" | "cubic foot" => "cuft".to_string(),
        "gal" | "gallon" | "gallons" => "gal".to_string(),
        "psi" => "psi".to_string(),
        "kpa" => "kpa".to_string(),
        "mpa" => "mpa".to_string(),
        "bar" => "bar".to_string(),
        "hz" | "hertz" => "hz".to_string(),
        "khz" => "khz".to_string(),
        "rpm" => "rpm".to_string(),
        "f" | "°f" | "fahrenheit" => "fahrenheit".to_string(),
        "c" | "°c" | "celsius" => "celsius".to_string(),
        "k" | "kelvin" => "kelvin".to_string(),
        other => other.to_string(),
    }
}

/// Linear factor to the family's base unit, or `None` for unknown units.
/// Temperature units are listed with factor 1.0 and handled separately.
fn factor(unit: &str) -> Option<(UnitFamily, f64)> {
    let entry = match unit {
        "mm" => (UnitFamily::Length, 0.001),
        "cm" => (UnitFamily::Length, 0.01),
        "m" => (UnitFamily::Length, 1.0),
        "inch" => (UnitFamily::Length, 0.0254),
        "ft" => (UnitFamily::Length, 0.3048),
        "g" => (UnitFamily::Weight, 0.001),
        "kg" => (UnitFamily::Weight, 1.0),
        "lb" => (UnitFamily::Weight, 0.453_592_37),
        "oz" => (UnitFamily::Weight, 0.028_349_523_125),
        "ml" => (UnitFamily::Volume, 0.001),
        "l" => (UnitFamily::Volume, 1.0),
        "cuft" => (UnitFamily::Volume, 28.316_846_592),
        "gal" => (UnitFamily::Volume, 3.785_411_784),
        "kpa" => (UnitFamily::Pressure, 1.0),
        "psi" => (UnitFamily::Pressure, 6.894_757),
        "bar" => (UnitFamily::Pressure, 100.0),
        "mpa" => (UnitFamily::Pressure, 1000.0),
        "hz" => (UnitFamily::Frequency, 1.0),
        "khz" => (UnitFamily::Frequency, 1000.0),
        "rpm" => (UnitFamily::RotationalSpeed, 1.0),
        "fahrenheit" | "celsius" | "kelvin" => (UnitFamily::Temperature, 1.0),
        _ => return None,
    };
    Some(entry)
}

/// The family a unit belongs to, after normalization.
pub fn unit_family(unit: &str) -> Option<UnitFamily> {
    factor(&normalize_unit(unit)).map(|(family, _)| family)
}

/// Converts a value between two units of the same family.
///
/// Temperature uses the exact affine formulas; everything else goes
/// through the linear base-unit factor. Unknown units and cross-family
/// pairs are errors the caller downgrades to "keep the original text".
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    let from_n = normalize_unit(from);
    let to_n = normalize_unit(to);

    let (from_family, from_factor) =
        factor(&from_n).ok_or_else(|| UnitError::Unrecognized(from.to_string()))?;
    let (to_family, to_factor) =
        factor(&to_n).ok_or_else(|| UnitError::Unrecognized(to.to_string()))?;

    if from_family != to_family {
        return Err(UnitError::CrossFamily {
            from: from_n,
            to: to_n,
        });
    }

    if from_family == UnitFamily::Temperature {
        return Ok(convert_temperature(value, &from_n, &to_n));
    }

    Ok(value * from_factor / to_factor)
}

fn convert_temperature(value: f64, from: &str, to: &str) -> f64 {
    let celsius = match from {
        "fahrenheit" => (value - 32.0) * 5.0 / 9.0,
        "kelvin" => value - 273.15,
        _ => value,
    };
    match to {
        "fahrenheit" => celsius * 9.0 / 5.0 + 32.0,
        "kelvin" => celsius + 273.15,
        _ => celsius,
    }
}
