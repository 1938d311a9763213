//! Typed access to fields of untyped JSON documents.
//!
//! The game-center feed is loosely typed: ids and scores arrive as numbers
//! in most documents and as numeric strings in some. Every integer read goes
//! through [`int_value`] so both spellings are accepted.

use serde_json::Value;

use crate::error::ParseError;

/// Walk `path` from `root`. JSON `null` counts as absent.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |node, key| node.get(*key))
        .filter(|v| !v.is_null())
}

fn dotted(path: &[&str]) -> String {
    path.join(".")
}

/// Read an integer from a JSON number or a numeric string.
pub fn int_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Convert a present value to an integer of type `T`, naming `field` on failure.
pub fn to_int<T: TryFrom<i64>>(value: &Value, field: &str) -> Result<T, ParseError> {
    let raw = int_value(value)
        .ok_or_else(|| ParseError::malformed(field, format!("expected integer, got {value}")))?;
    T::try_from(raw).map_err(|_| ParseError::malformed(field, format!("{raw} is out of range")))
}

pub fn required<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value, ParseError> {
    lookup(root, path).ok_or_else(|| ParseError::missing(dotted(path)))
}

pub fn required_int<T: TryFrom<i64>>(root: &Value, path: &[&str]) -> Result<T, ParseError> {
    to_int(required(root, path)?, &dotted(path))
}

fn text(value: &Value, path: &[&str]) -> Result<String, ParseError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ParseError::malformed(
            dotted(path),
            format!("expected string, got {other}"),
        )),
    }
}

pub fn required_str(root: &Value, path: &[&str]) -> Result<String, ParseError> {
    text(required(root, path)?, path)
}

/// String field whose key must exist but whose value may be `null`.
pub fn nullable_str(root: &Value, path: &[&str]) -> Result<Option<String>, ParseError> {
    let value = path
        .iter()
        .try_fold(root, |node, key| node.get(*key))
        .ok_or_else(|| ParseError::missing(dotted(path)))?;
    if value.is_null() {
        return Ok(None);
    }
    text(value, path).map(Some)
}

pub fn required_array<'a>(root: &'a Value, path: &[&str]) -> Result<&'a [Value], ParseError> {
    required(root, path)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| ParseError::malformed(dotted(path), "expected array"))
}

/// Best-effort string lookup: anything missing or non-string is absent.
pub fn optional_str(root: &Value, path: &[&str]) -> Option<String> {
    lookup(root, path)
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_value_accepts_numbers_and_numeric_strings() {
        assert_eq!(int_value(&json!(3)), Some(3));
        assert_eq!(int_value(&json!("3")), Some(3));
        assert_eq!(int_value(&json!(-88)), Some(-88));
        assert_eq!(int_value(&json!(12.0)), Some(12));
        assert_eq!(int_value(&json!(12.5)), None);
        assert_eq!(int_value(&json!("three")), None);
        assert_eq!(int_value(&json!(true)), None);
    }

    #[test]
    fn test_lookup_treats_null_as_absent() {
        let doc = json!({"a": {"b": null, "c": 1}});
        assert!(lookup(&doc, &["a", "b"]).is_none());
        assert_eq!(lookup(&doc, &["a", "c"]), Some(&json!(1)));
        assert!(lookup(&doc, &["a", "x", "y"]).is_none());
    }

    #[test]
    fn test_required_names_dotted_path() {
        let doc = json!({"awayTeam": {}});
        let err = required_str(&doc, &["awayTeam", "commonName", "default"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required field `awayTeam.commonName.default`"
        );
    }

    #[test]
    fn test_required_int_range_check() {
        let doc = json!({"period": 300});
        assert!(matches!(
            required_int::<u8>(&doc, &["period"]),
            Err(ParseError::MalformedField { .. })
        ));
        assert_eq!(required_int::<u16>(&doc, &["period"]).unwrap(), 300);
    }

    #[test]
    fn test_nullable_str_distinguishes_null_from_missing() {
        let doc = json!({"duration": null, "endTime": "00:41", "period": 1});
        assert_eq!(nullable_str(&doc, &["duration"]).unwrap(), None);
        assert_eq!(
            nullable_str(&doc, &["endTime"]).unwrap().as_deref(),
            Some("00:41")
        );
        assert_eq!(
            nullable_str(&doc, &["startTime"]).unwrap_err().to_string(),
            "missing required field `startTime`"
        );
        assert!(matches!(
            nullable_str(&json!({"duration": []}), &["duration"]),
            Err(ParseError::MalformedField { .. })
        ));
    }

    #[test]
    fn test_optional_str_ignores_wrong_types() {
        let doc = json!({"venue": {"default": 7}, "venueLocation": {"default": "Toronto"}});
        assert_eq!(optional_str(&doc, &["venue", "default"]), None);
        assert_eq!(
            optional_str(&doc, &["venueLocation", "default"]).as_deref(),
            Some("Toronto")
        );
    }
}
