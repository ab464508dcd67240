//! Untyped runtime data. A JSON value plus the three things JSON cannot say:
//! "absent" (`Undefined`), normalized dates and big integers.
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    BigInt(BigInt),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

pub(crate) static UNDEFINED: Value = Value::Undefined;

impl Value {
    /// Member lookup where a missing key reads as `Undefined`.
    pub fn get(&self, key: &str) -> &Value {
        match self {
            Value::Object(map) => map.get(key).unwrap_or(&UNDEFINED),
            _ => &UNDEFINED,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Name of the runtime kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::BigInt(_) => "bigint",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Render as JSON: dates as ISO strings, big integers as decimal strings,
    /// `Undefined` members dropped and `Undefined` array slots as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Undefined | Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Number(n) => {
                let integral = n.fract() == 0.0 && n.abs() < 9.0e15;
                if integral {
                    J::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n).map(J::Number).unwrap_or(J::Null)
                }
            }
            Value::String(s) => J::String(s.clone()),
            Value::BigInt(n) => J::String(n.to_string()),
            Value::Date(d) => J::String(format_date(d)),
            Value::Array(xs) => J::Array(xs.iter().map(Value::to_json).collect()),
            Value::Object(map) => J::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// `2024-01-02T03:04:05.678Z`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match value {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(b),
            J::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            J::String(s) => Value::String(s),
            J::Array(xs) => Value::Array(xs.into_iter().map(Value::from).collect()),
            J::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        Value::from(value.clone())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn json_conversion_keeps_member_order() {
        let v = Value::from(json!({"b": 1, "a": [true, null]}));
        let Value::Object(map) = &v else { panic!("expected an object") };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(v.to_json(), json!({"b": 1, "a": [true, null]}));
    }

    #[test]
    fn missing_members_read_as_undefined() {
        let v = Value::from(json!({"xs": [1]}));
        assert!(v.get("nope").is_undefined());
        assert!(Value::Null.get("a").is_undefined());
    }

    #[test]
    fn normalized_values_render_as_strings() {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let v = Value::Object(IndexMap::from([
            ("at".to_string(), Value::Date(date)),
            ("big".to_string(), Value::BigInt(BigInt::from(12345678901234567890u64))),
            ("gone".to_string(), Value::Undefined),
        ]));
        assert_eq!(
            v.to_json(),
            json!({"at": "2024-01-02T03:04:05.000Z", "big": "12345678901234567890"})
        );
    }
}
