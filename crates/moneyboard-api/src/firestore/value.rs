//! Firestore typed-value decoding.
//!
//! The REST API wraps every field in a single-key object naming its type
//! (`{"integerValue": "42"}`). These helpers flatten that encoding into
//! ordinary JSON so the rest of the workspace never sees it.
//!
//! | Firestore          | JSON                                  |
//! |--------------------|---------------------------------------|
//! | `nullValue`        | `null`                                |
//! | `booleanValue`     | bool                                  |
//! | `integerValue`     | number (string on overflow)           |
//! | `doubleValue`      | number (string for `NaN`/`Infinity`)  |
//! | `timestampValue`   | RFC 3339 string                       |
//! | `stringValue`      | string                                |
//! | `bytesValue`       | base64 string                         |
//! | `referenceValue`   | resource-name string                  |
//! | `geoPointValue`    | `{"latitude", "longitude"}`           |
//! | `arrayValue`       | array                                 |
//! | `mapValue`         | object                                |

use serde_json::{Map, Number, Value};

/// Decode a map of typed fields.
pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

/// Decode a single typed value. Unknown encodings pass through unchanged.
pub fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return value.clone();
    };
    let Some((kind, inner)) = single_entry(obj) else {
        return value.clone();
    };

    match kind {
        "nullValue" => Value::Null,
        "booleanValue" | "stringValue" | "timestampValue" | "bytesValue" | "referenceValue" => {
            inner.clone()
        }
        "integerValue" => decode_integer(inner),
        "doubleValue" => decode_double(inner),
        "geoPointValue" => {
            let mut point = Map::new();
            for key in ["latitude", "longitude"] {
                point.insert(
                    key.to_owned(),
                    inner.get(key).cloned().unwrap_or(Value::from(0.0)),
                );
            }
            Value::Object(point)
        }
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => value.clone(),
    }
}

fn single_entry(obj: &Map<String, Value>) -> Option<(&str, &Value)> {
    if obj.len() != 1 {
        return None;
    }
    obj.iter().next().map(|(k, v)| (k.as_str(), v))
}

/// int64 travels as a decimal string to survive JavaScript clients.
fn decode_integer(inner: &Value) -> Value {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map_or_else(|_| inner.clone(), |n| Value::Number(n.into())),
        other => other.clone(),
    }
}

fn decode_double(inner: &Value) -> Value {
    match inner {
        Value::String(s) => s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or_else(|| inner.clone(), Value::Number),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(decode_value(&json!({ "nullValue": null })), Value::Null);
        assert_eq!(decode_value(&json!({ "booleanValue": true })), json!(true));
        assert_eq!(decode_value(&json!({ "integerValue": "42" })), json!(42));
        assert_eq!(decode_value(&json!({ "doubleValue": 100.5 })), json!(100.5));
        assert_eq!(decode_value(&json!({ "stringValue": "CAD" })), json!("CAD"));
        assert_eq!(
            decode_value(&json!({ "timestampValue": "2025-03-01T12:00:00Z" })),
            json!("2025-03-01T12:00:00Z")
        );
    }

    #[test]
    fn special_doubles_stay_strings() {
        assert_eq!(decode_value(&json!({ "doubleValue": "NaN" })), json!("NaN"));
        assert_eq!(decode_value(&json!({ "doubleValue": "2.5" })), json!(2.5));
    }

    #[test]
    fn oversized_integer_stays_string() {
        let raw = "99999999999999999999";
        assert_eq!(decode_value(&json!({ "integerValue": raw })), json!(raw));
    }

    #[test]
    fn nested_map_and_array() {
        let typed = json!({
            "mapValue": {
                "fields": {
                    "tags": { "arrayValue": { "values": [
                        { "stringValue": "food" },
                        { "integerValue": "3" }
                    ] } },
                    "where": { "geoPointValue": { "latitude": 45.5, "longitude": -73.6 } }
                }
            }
        });

        assert_eq!(
            decode_value(&typed),
            json!({
                "tags": ["food", 3],
                "where": { "latitude": 45.5, "longitude": -73.6 }
            })
        );
    }

    #[test]
    fn empty_array_value() {
        assert_eq!(decode_value(&json!({ "arrayValue": {} })), json!([]));
    }

    #[test]
    fn unknown_shape_passes_through() {
        let raw = json!({ "a": 1, "b": 2 });
        assert_eq!(decode_value(&raw), raw);
    }
}
