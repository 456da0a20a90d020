//! Product classification: ordered pattern tables mapping free text to a
//! product family and, within it, a sub-family.
//!
//! Table order is load-bearing. Families overlap lexically ("dishwasher"
//! contains "washer", washer-dryer combos mention both), so the more
//! specific entry must sit above the more general one and the first match
//! wins at each level.

use regex::Regex;
use tracing::debug;

/// Pattern-based product family / sub-family classifier.
pub struct ProductClassifier {
    families: Vec<(String, Regex)>,
    sub_families: Vec<(String, String, Regex)>,
}

impl ProductClassifier {
    /// Builds the classifier with the built-in appliance tables.
    pub fn new() -> Self {
        let families = [
            ("washer_dryer", r"(?i)washer[ /-]?dryer|wash\s*tower|combo"),
            ("dishwasher", r"(?i)dish\s*washer"),
            ("dryer", r"(?i)\bdry(?:er|ing)\b|tumble"),
            ("washer", r"(?i)\bwash(?:er|ing)?\b"),
            ("refrigerator", r"(?i)refrigerator|fridge|freezer"),
            ("range", r"(?i)\brange\b|\boven\b|stove|cooktop"),
            ("air_conditioner", r"(?i)air\s*condition|\ba/?c\b"),
        ];
        let sub_families = [
            ("washer", "front_load", r"(?i)front\s*load"),
            ("washer", "top_load", r"(?i)top\s*load"),
            ("dryer", "heat_pump", r"(?i)heat\s*pump"),
            ("dryer", "gas", r"(?i)\bgas\b"),
            ("dryer", "electric", r"(?i)electric"),
            ("refrigerator", "french_door", r"(?i)french\s*door"),
            ("refrigerator", "side_by_side", r"(?i)side[ -]?by[ -]?side"),
            ("refrigerator", "top_freezer", r"(?i)top\s*freezer"),
            ("refrigerator", "bottom_freezer", r"(?i)bottom\s*freezer"),
            ("range", "induction", r"(?i)induction"),
            ("range", "gas", r"(?i)\bgas\b"),
            ("range", "electric", r"(?i)electric"),
            ("air_conditioner", "window", r"(?i)window"),
            ("air_conditioner", "portable", r"(?i)portable"),
        ];

        Self {
            families: families
                .iter()
                .map(|(name, re)| (name.to_string(), Regex::new(re).expect("static regex")))
                .collect(),
            sub_families: sub_families
                .iter()
                .map(|(family, name, re)| {
                    (
                        family.to_string(),
                        name.to_string(),
                        Regex::new(re).expect("static regex"),
                    )
                })
                .collect(),
        }
    }

    /// Classifies text into `(product_family, product_sub_family)`.
    ///
    /// Either side may be `None` independently; a sub-family is only looked
    /// up within the matched family's scope.
    pub fn classify(&self, text: &str) -> (Option<String>, Option<String>) {
        let family = self
            .families
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(name, _)| name.clone());

        let sub_family = family.as_deref().and_then(|fam| {
            self.sub_families
                .iter()
                .filter(|(f, _, _)| f == fam)
                .find(|(_, _, re)| re.is_match(text))
                .map(|(_, name, _)| name.clone())
        });

        debug!(family = ?family, sub_family = ?sub_family, "product classified");
        (family, sub_family)
    }
}

impl Default for ProductClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn washing_machine_is_washer() {
        let c = ProductClassifier::new();
        let (family, sub) = c.classify("What is the net weight of my washing machine?");
        assert_eq!(family.as_deref(), Some("washer"));
        assert_eq!(sub, None);
    }

    #[test]
    fn dishwasher_beats_washer() {
        let c = ProductClassifier::new();
        let (family, _) = c.classify("my dishwasher will not drain");
        assert_eq!(family.as_deref(), Some("dishwasher"));
    }

    #[test]
    fn washer_dryer_combo_beats_both_parts() {
        let c = ProductClassifier::new();
        let (family, _) = c.classify("how do I vent my washer-dryer combo");
        assert_eq!(family.as_deref(), Some("washer_dryer"));
    }

    #[test]
    fn sub_family_scoped_to_family() {
        let c = ProductClassifier::new();
        let (family, sub) = c.classify("front load washer spin speed");
        assert_eq!(family.as_deref(), Some("washer"));
        assert_eq!(sub.as_deref(), Some("front_load"));
    }

    #[test]
    fn no_match_is_none() {
        let c = ProductClassifier::new();
        let (family, sub) = c.classify("hello there");
        assert_eq!(family, None);
        assert_eq!(sub, None);
    }
}
