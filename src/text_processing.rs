//! # Text Processing Module
//!
//! This module provides the measure parser used when recipes are imported with
//! free-text ingredient measures (e.g. `"1 1/2 cup"`, `"200g"`, `"Pinch"`).
//!
//! ## Features
//!
//! - Splits a measure into a quantity token and a unit token
//! - **Fraction support**: simple (`"1/2"`) and mixed (`"1 1/2"`) fractions
//! - **Decimal support**: `"1.5 cups"`, `"1.5cups"`
//! - **Alternative measures**: anything containing `(` or the word `or` is kept whole
//! - Total: every input maps to a [`ParsedMeasure`], nothing is ever rejected

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A measure split into its quantity and unit parts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMeasure {
    /// The numeric part (e.g. "2", "1/2", "1 1/2") or the whole measure
    pub quantity: Option<String>,
    /// The trailing unit text (e.g. "cups", "tsp", "g chopped")
    pub unit: Option<String>,
}

impl ParsedMeasure {
    fn quantity_only(quantity: &str) -> Self {
        Self {
            quantity: Some(quantity.to_string()),
            unit: None,
        }
    }
}

/// Leading numeric token followed by an arbitrary remainder.
///
/// Alternatives are ordered mixed number, simple fraction, decimal/integer.
/// The regex engine takes the first alternative that matches, so the mixed
/// and fraction forms must come before the bare integer.
const LEADING_QUANTITY_PATTERN: &str =
    r"^([0-9]+\s+[0-9]+/[0-9]+|[0-9]+/[0-9]+|[0-9]+(?:\.[0-9]+)?)\s*(.*)$";

lazy_static! {
    static ref LEADING_QUANTITY: Regex =
        Regex::new(LEADING_QUANTITY_PATTERN).expect("Invalid leading quantity regex pattern");
    static ref ALTERNATIVE_MARKER: Regex =
        Regex::new(r"(?i) or ").expect("Invalid alternative marker regex pattern");
}

/// Parser for free-text ingredient measures
///
/// Rules are applied in order and the first one that applies wins:
///
/// ```text
/// ""                    -> { -, - }
/// contains "(" / " or " -> { whole, - }
/// "<num> <rest>"        -> { num, rest }
/// "<num>"               -> { num, - }
/// anything else         -> { whole, - }
/// ```
///
/// `<num>` is a mixed number (`1 1/2`), a fraction (`1/2`) or a decimal/integer (`1.5`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasureParser;

impl MeasureParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a measure string into quantity and unit
    ///
    /// # Examples
    /// ```
    /// use meal_prep::text_processing::MeasureParser;
    ///
    /// let parsed = MeasureParser::new().parse("1 1/2 cups");
    /// assert_eq!(parsed.quantity.as_deref(), Some("1 1/2"));
    /// assert_eq!(parsed.unit.as_deref(), Some("cups"));
    /// ```
    pub fn parse(&self, input: &str) -> ParsedMeasure {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return ParsedMeasure::default();
        }

        // Alternatives and compound measures are not decomposed.
        if trimmed.contains('(') || ALTERNATIVE_MARKER.is_match(trimmed) {
            trace!(measure = %trimmed, "Alternative measure kept whole");
            return ParsedMeasure::quantity_only(trimmed);
        }

        if let Some(caps) = LEADING_QUANTITY.captures(trimmed) {
            let quantity = caps.get(1).map_or("", |m| m.as_str()).trim();
            let remainder = caps.get(2).map_or("", |m| m.as_str()).trim();

            if remainder.is_empty() {
                return ParsedMeasure::quantity_only(quantity);
            }

            return ParsedMeasure {
                quantity: Some(quantity.to_string()),
                unit: Some(remainder.to_string()),
            };
        }

        trace!(measure = %trimmed, "No leading quantity, keeping measure whole");
        ParsedMeasure::quantity_only(trimmed)
    }
}

/// Parse a measure with the default parser
pub fn parse_measure(input: &str) -> ParsedMeasure {
    MeasureParser::new().parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(quantity: Option<&str>, unit: Option<&str>) -> ParsedMeasure {
        ParsedMeasure {
            quantity: quantity.map(str::to_string),
            unit: unit.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(parse_measure(""), ParsedMeasure::default());
        assert_eq!(parse_measure("   \t"), ParsedMeasure::default());
    }

    #[test]
    fn test_mixed_number() {
        assert_eq!(
            parse_measure("1 1/2 cups"),
            parsed(Some("1 1/2"), Some("cups"))
        );
        assert_eq!(parse_measure("2 3/4"), parsed(Some("2 3/4"), None));
    }

    #[test]
    fn test_simple_fraction() {
        assert_eq!(parse_measure("1/2 tsp"), parsed(Some("1/2"), Some("tsp")));
        assert_eq!(parse_measure("3/4"), parsed(Some("3/4"), None));
    }

    #[test]
    fn test_decimal_and_integer() {
        assert_eq!(parse_measure("2"), parsed(Some("2"), None));
        assert_eq!(parse_measure("1.5 kg"), parsed(Some("1.5"), Some("kg")));
        assert_eq!(parse_measure("1.5cups"), parsed(Some("1.5"), Some("cups")));
        assert_eq!(parse_measure("200g"), parsed(Some("200"), Some("g")));
    }

    #[test]
    fn test_remainder_is_trimmed_and_kept_verbatim() {
        assert_eq!(
            parse_measure("  3   large cloves chopped  "),
            parsed(Some("3"), Some("large cloves chopped"))
        );
    }

    #[test]
    fn test_alternative_measures_kept_whole() {
        assert_eq!(
            parse_measure("Salt to taste (or to preference)"),
            parsed(Some("Salt to taste (or to preference)"), None)
        );
        assert_eq!(
            parse_measure("2 cups or more"),
            parsed(Some("2 cups or more"), None)
        );
        assert_eq!(
            parse_measure("1 tbsp OR 2 tsp"),
            parsed(Some("1 tbsp OR 2 tsp"), None)
        );
        assert_eq!(
            parse_measure("400g (1 can)"),
            parsed(Some("400g (1 can)"), None)
        );
    }

    #[test]
    fn test_or_inside_word_is_not_alternative() {
        // "for" and "orange" contain "or" but not the standalone word
        assert_eq!(
            parse_measure("1 orange"),
            parsed(Some("1"), Some("orange"))
        );
        assert_eq!(
            parse_measure("2 tbsp for garnish"),
            parsed(Some("2"), Some("tbsp for garnish"))
        );
    }

    #[test]
    fn test_no_leading_number_falls_back_to_quantity() {
        assert_eq!(parse_measure("Pinch"), parsed(Some("Pinch"), None));
        assert_eq!(
            parse_measure("to serve"),
            parsed(Some("to serve"), None)
        );
        assert_eq!(parse_measure("½ cup"), parsed(Some("½ cup"), None));
    }

    #[test]
    fn test_pattern_compiles() {
        assert!(Regex::new(LEADING_QUANTITY_PATTERN).is_ok());
    }
}
