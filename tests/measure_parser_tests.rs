//! Measure parsing against the kind of strings found in the meal dataset

use meal_prep::text_processing::{parse_measure, MeasureParser, ParsedMeasure};

fn check(input: &str, quantity: Option<&str>, unit: Option<&str>) {
    let parsed = parse_measure(input);
    assert_eq!(parsed.quantity.as_deref(), quantity, "quantity of {:?}", input);
    assert_eq!(parsed.unit.as_deref(), unit, "unit of {:?}", input);
}

#[test]
fn test_documented_measures() {
    check("", None, None);
    check("1 1/2 cups", Some("1 1/2"), Some("cups"));
    check("1/2 tsp", Some("1/2"), Some("tsp"));
    check("2", Some("2"), None);
    check(
        "Salt to taste (or to preference)",
        Some("Salt to taste (or to preference)"),
        None,
    );
}

#[test]
fn test_dataset_measures() {
    check("175g/6oz", Some("175"), Some("g/6oz"));
    check("2 tblsp", Some("2"), Some("tblsp"));
    check("1 large", Some("1"), Some("large"));
    check("1.2kg", Some("1.2"), Some("kg"));
    check("3/4 cup", Some("3/4"), Some("cup"));
    check("2 1/4 cups plain flour", Some("2 1/4"), Some("cups plain flour"));
    check("Dash", Some("Dash"), None);
    check("To Glaze", Some("To Glaze"), None);
    check("1 can (400g)", Some("1 can (400g)"), None);
    check("200ml or 1 cup", Some("200ml or 1 cup"), None);
}

#[test]
fn test_parser_never_rejects_input() {
    let parser = MeasureParser::new();
    let inputs = [
        "/",
        "1/",
        "/2 cups",
        "1..5 tsp",
        ".5 cup",
        "   1    ",
        "1 1/",
        "🍋 zest",
        "\n2\tcloves\n",
        "or",
        "(",
    ];

    for input in inputs {
        let parsed = parser.parse(input);
        assert!(
            parsed.quantity.is_some(),
            "non-empty input {:?} must keep a quantity",
            input
        );
        if let Some(unit) = &parsed.unit {
            assert_eq!(unit.trim(), unit, "unit of {:?} is trimmed", input);
            assert!(!unit.is_empty());
        }
    }
}

#[test]
fn test_whitespace_around_tokens() {
    check("\n2\tcloves\n", Some("2"), Some("cloves"));
    check("   1    ", Some("1"), None);
    check("1 1/", Some("1"), Some("1/"));
}

#[test]
fn test_leading_dot_is_not_a_number() {
    check(".5 cup", Some(".5 cup"), None);
}

#[test]
fn test_parsed_measure_serializes_absent_parts_as_null() {
    let value = serde_json::to_value(parse_measure("Pinch")).unwrap();
    assert_eq!(value, serde_json::json!({ "quantity": "Pinch", "unit": null }));

    let decoded: ParsedMeasure = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, parse_measure("Pinch"));
}
