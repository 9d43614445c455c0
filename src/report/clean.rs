//! Default cleaning rules, keyed by declared field type.

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::fields::FieldType;

/// Everything that cannot be part of a plain decimal number.
static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\d\-.]+").expect("static regex is valid"));

/// Money comes back in micro units.
const MICROS_PER_UNIT: f64 = 1_000_000.0;

/// Value the API uses for "no data".
const NO_DATA: &str = "--";

/// Clean one raw cell according to its declared type.
pub fn default_clean(raw: &str, field_type: &FieldType) -> anyhow::Result<Value> {
    let value = raw.trim();
    if value == NO_DATA {
        return Ok(Value::Null);
    }

    match field_type {
        FieldType::List(_) => {
            if value.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::String(parse_list_literal(value)?.join(";")))
            }
        }
        FieldType::Money => Ok(Value::from(round6(parse_number(value)? / MICROS_PER_UNIT))),
        FieldType::Date => {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{}'", value))?;
            Ok(Value::String(date.format("%Y-%m-%d 00:00:00").to_string()))
        }
        FieldType::Double => Ok(Value::from(parse_number(value)?)),
        FieldType::Long | FieldType::Integer => Ok(Value::from(parse_number(value)?.trunc() as i64)),
        FieldType::Other(_) => Ok(Value::String(value.to_string())),
    }
}

fn parse_number(value: &str) -> anyhow::Result<f64> {
    let digits = NON_NUMERIC.replace_all(value, "");
    digits
        .parse::<f64>()
        .with_context(|| format!("invalid number '{}'", value))
}

fn round6(value: f64) -> f64 {
    (value * MICROS_PER_UNIT).round() / MICROS_PER_UNIT
}

/// Parse a bracketed list literal such as `["a", "b"]` or `['a', 'b']` into
/// its members rendered as text.
pub fn parse_list_literal(literal: &str) -> anyhow::Result<Vec<String>> {
    if let Ok(items) = serde_json::from_str::<Vec<Value>>(literal) {
        return items.into_iter().map(list_member).collect();
    }

    let inner = literal
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| anyhow!("not a list literal: {}", literal))?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(quote) = chars.next() else { break };
        if quote != '\'' && quote != '"' {
            bail!("unquoted list member in {}", literal);
        }

        let mut item = String::new();
        loop {
            match chars.next() {
                Some('\\') => match chars.next() {
                    Some('n') => item.push('\n'),
                    Some('t') => item.push('\t'),
                    Some(other) => item.push(other),
                    None => bail!("unterminated escape in {}", literal),
                },
                Some(c) if c == quote => break,
                Some(c) => item.push(c),
                None => bail!("unterminated string in {}", literal),
            }
        }
        items.push(item);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') | None => {}
            Some(other) => bail!("unexpected '{}' in {}", other, literal),
        }
    }
    Ok(items)
}

fn list_member(value: Value) -> anyhow::Result<String> {
    match value {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(anyhow!("unsupported list member {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clean(raw: &str, field_type: &str) -> Value {
        default_clean(raw, &FieldType::parse(field_type)).unwrap()
    }

    #[test]
    fn test_money_is_divided_from_micros() {
        assert_eq!(clean("1230000", "Money"), json!(1.23));
        assert_eq!(clean(" 0 ", "Money"), json!(0.0));
        assert_eq!(clean("-4500000", "Money"), json!(-4.5));
    }

    #[test]
    fn test_money_inverts_micro_encoding() {
        for x in [0.01, 1.23, 19.99, 123456.789012, 0.000001] {
            let micros = (x * 1e6_f64).round();
            let cleaned = clean(&format!("{}", micros), "Money");
            assert_eq!(cleaned, json!(round6(x)), "value {}", x);
        }
    }

    #[test]
    fn test_long_strips_separators_and_truncates() {
        assert_eq!(clean("1,234", "Long"), json!(1234));
        assert_eq!(clean("12.9", "Integer"), json!(12));
        assert_eq!(clean("-3.7", "Long"), json!(-3));
    }

    #[test]
    fn test_double_strips_non_numeric() {
        assert_eq!(clean("12.5%", "Double"), json!(12.5));
        assert_eq!(clean("1,000.25", "Double"), json!(1000.25));
    }

    #[test]
    fn test_date_is_rendered_at_midnight() {
        assert_eq!(clean("2023-01-05", "Date"), json!("2023-01-05 00:00:00"));
        assert!(default_clean("05/01/2023", &FieldType::Date).is_err());
    }

    #[test]
    fn test_no_data_marker_is_null_for_every_type() {
        for field_type in ["Money", "Date", "Double", "Long", "Integer", "StringList", "String"] {
            assert_eq!(clean(" -- ", field_type), Value::Null, "type {}", field_type);
        }
    }

    #[test]
    fn test_list_literals_are_joined() {
        assert_eq!(clean(r#"["brand", "promo"]"#, "StringList"), json!("brand;promo"));
        assert_eq!(clean("['a', 'b c', 'it\\'s']", "StringList"), json!("a;b c;it's"));
        assert_eq!(clean("[1, 2, 3]", "LongList"), json!("1;2;3"));
        assert_eq!(clean("[]", "StringList"), json!(""));
        assert_eq!(clean("  ", "StringList"), Value::Null);
    }

    #[test]
    fn test_malformed_list_is_an_error() {
        assert!(default_clean("[a, b]", &FieldType::parse("StringList")).is_err());
        assert!(default_clean("['a'", &FieldType::parse("StringList")).is_err());
    }

    #[test]
    fn test_other_types_pass_through_trimmed() {
        assert_eq!(clean("  Search Network ", "String"), json!("Search Network"));
        assert_eq!(clean("ENABLED", "CampaignStatus"), json!("ENABLED"));
    }

    #[test]
    fn test_unparseable_number_is_an_error() {
        let err = default_clean("n/a", &FieldType::Money).unwrap_err();
        assert!(err.to_string().contains("invalid number"));
    }
}
