//! Validation module for request input
//!
//! Reusable validation functions for:
//!
//! - Path ids
//! - Recipe titles and other names
//! - Meal plan dates and meal types
//! - Recipe timings
//!
//! Every check returns a static message that handlers turn into a 400 response.

use chrono::NaiveDate;

/// Longest accepted title or name, matching the `VARCHAR(255)` columns
pub const MAX_NAME_LENGTH: usize = 255;

/// Meal types a meal plan entry may carry
pub const MEAL_TYPES: [&str; 4] = ["breakfast", "lunch", "dinner", "snack"];

/// Parse a path id
///
/// # Examples
/// ```
/// use meal_prep::validation::parse_id;
///
/// assert_eq!(parse_id("42"), Ok(42));
/// assert_eq!(parse_id("0"), Err("invalid id"));
/// assert_eq!(parse_id("abc"), Err("invalid id"));
/// ```
pub fn parse_id(raw: &str) -> Result<i64, &'static str> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err("invalid id"),
    }
}

fn validate_name<'a>(
    value: &'a str,
    empty: &'static str,
    too_long: &'static str,
) -> Result<&'a str, &'static str> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(empty);
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(too_long);
    }

    Ok(trimmed)
}

/// Validates a recipe title
///
/// # Returns
/// * `Ok(&str)` - The trimmed title if valid
///
/// # Examples
/// ```
/// use meal_prep::validation::validate_recipe_title;
///
/// assert_eq!(validate_recipe_title("  Pancakes "), Ok("Pancakes"));
/// assert!(validate_recipe_title("").is_err());
/// assert!(validate_recipe_title(&"a".repeat(256)).is_err());
/// ```
pub fn validate_recipe_title(title: &str) -> Result<&str, &'static str> {
    validate_name(
        title,
        "title is required",
        "title must be at most 255 characters",
    )
}

/// Validates an ingredient or meal plan name
pub fn validate_entity_name(name: &str) -> Result<&str, &'static str> {
    validate_name(
        name,
        "name is required",
        "name must be at most 255 characters",
    )
}

/// Rejects negative servings and timings
pub fn validate_recipe_numbers(
    servings: Option<i32>,
    prep_time: Option<i32>,
    cook_time: Option<i32>,
) -> Result<(), &'static str> {
    if servings.is_some_and(|v| v < 0) {
        return Err("servings must not be negative");
    }
    if prep_time.is_some_and(|v| v < 0) {
        return Err("prep_time must not be negative");
    }
    if cook_time.is_some_and(|v| v < 0) {
        return Err("cook_time must not be negative");
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` date
///
/// # Examples
/// ```
/// use meal_prep::validation::parse_date;
///
/// assert!(parse_date("2024-02-29").is_ok());
/// assert!(parse_date("2023-02-29").is_err());
/// assert!(parse_date("29/02/2024").is_err());
/// ```
pub fn parse_date(raw: &str) -> Result<NaiveDate, &'static str> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| "dates must be YYYY-MM-DD")
}

/// Ensure a date range does not end before it starts
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), &'static str> {
    if end < start {
        return Err("end_date must not be before start_date");
    }
    Ok(())
}

/// Validate a meal type, normalising case
pub fn validate_meal_type(meal_type: &str) -> Result<String, &'static str> {
    let normalized = meal_type.trim().to_lowercase();
    if MEAL_TYPES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err("meal_type must be one of breakfast, lunch, dinner, snack")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("1"), Ok(1));
        assert_eq!(parse_id(" 7 "), Ok(7));
        assert_eq!(parse_id("-3"), Err("invalid id"));
        assert_eq!(parse_id("1.5"), Err("invalid id"));
        assert_eq!(parse_id(""), Err("invalid id"));
        assert_eq!(parse_id("99999999999999999999"), Err("invalid id"));
    }

    #[test]
    fn test_recipe_title() {
        assert_eq!(validate_recipe_title("Soup"), Ok("Soup"));
        assert_eq!(validate_recipe_title("   "), Err("title is required"));
        assert!(validate_recipe_title(&"é".repeat(255)).is_ok());
        assert_eq!(
            validate_recipe_title(&"a".repeat(256)),
            Err("title must be at most 255 characters")
        );
    }

    #[test]
    fn test_entity_name() {
        assert_eq!(validate_entity_name(" flour "), Ok("flour"));
        assert_eq!(validate_entity_name(""), Err("name is required"));
    }

    #[test]
    fn test_recipe_numbers() {
        assert!(validate_recipe_numbers(None, None, None).is_ok());
        assert!(validate_recipe_numbers(Some(4), Some(0), Some(30)).is_ok());
        assert_eq!(
            validate_recipe_numbers(Some(-1), None, None),
            Err("servings must not be negative")
        );
        assert_eq!(
            validate_recipe_numbers(None, None, Some(-5)),
            Err("cook_time must not be negative")
        );
    }

    #[test]
    fn test_dates() {
        let start = parse_date("2024-03-01").unwrap();
        let end = parse_date("2024-03-07").unwrap();

        assert!(validate_date_range(start, end).is_ok());
        assert!(validate_date_range(start, start).is_ok());
        assert_eq!(
            validate_date_range(end, start),
            Err("end_date must not be before start_date")
        );
        assert_eq!(parse_date("2024-3-1x"), Err("dates must be YYYY-MM-DD"));
    }

    #[test]
    fn test_meal_type() {
        assert_eq!(validate_meal_type("Dinner"), Ok("dinner".to_string()));
        assert_eq!(validate_meal_type("snack"), Ok("snack".to_string()));
        assert!(validate_meal_type("brunch").is_err());
        assert!(validate_meal_type("").is_err());
    }
}
