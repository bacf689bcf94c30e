//! Conversion between plain JSON and Firestore typed values.
//!
//! Firestore wraps every value in a single-key object naming its type:
//! `{"stringValue": "x"}`, `{"integerValue": "42"}`, `{"mapValue": {"fields": {..}}}`.
//! Integers travel as strings. Timestamps, references and bytes decode to
//! their string form; geo points decode to `{latitude, longitude}`.

use serde_json::{Map, Number, Value, json};

use super::{Document, Fields, StoreError};

/// Wrap a JSON value as a Firestore value.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => n.as_i64().map_or_else(
            || json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
            |i| json!({ "integerValue": i.to_string() }),
        ),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Wrap every field of a map.
#[must_use]
pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Unwrap a Firestore value.
///
/// # Errors
///
/// Returns [`StoreError::Codec`] for an unknown or malformed value.
pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(StoreError::Codec(format!("not a typed value: {value}")));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| malformed(kind, inner)),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(|i| Value::Number(i.into()))
                .ok_or_else(|| malformed(kind, inner))
        }
        "doubleValue" => match inner {
            Value::Number(n) => Ok(Value::Number(n.clone())),
            // NaN and infinities are sent as strings and have no JSON form.
            Value::String(_) => Ok(Value::Null),
            _ => Err(malformed(kind, inner)),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| malformed(kind, inner)),
        "geoPointValue" => {
            let coord = |name: &str| {
                inner
                    .get(name)
                    .and_then(Value::as_f64)
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            };
            Ok(json!({ "latitude": coord("latitude"), "longitude": coord("longitude") }))
        }
        "arrayValue" => inner
            .get("values")
            .and_then(Value::as_array)
            .map_or_else(|| Ok(Vec::new()), |vs| vs.iter().map(decode_value).collect())
            .map(Value::Array),
        "mapValue" => inner
            .get("fields")
            .map_or_else(|| Ok(Map::new()), decode_fields)
            .map(Value::Object),
        other => Err(StoreError::Codec(format!("unsupported value type {other}"))),
    }
}

/// Unwrap every field of a Firestore `fields` object.
///
/// # Errors
///
/// Returns [`StoreError::Codec`] when `fields` is not an object or a value
/// cannot be decoded.
pub fn decode_fields(fields: &Value) -> Result<Fields, StoreError> {
    let Some(map) = fields.as_object() else {
        return Err(StoreError::Codec("document fields must be an object".to_string()));
    };
    map.iter()
        .map(|(k, v)| decode_value(v).map(|v| (k.clone(), v)))
        .collect()
}

/// Decode a Firestore document resource (`{name, fields, ..}`).
///
/// The id is the last segment of `name`.
///
/// # Errors
///
/// Returns [`StoreError::Codec`] when the name is missing or a field cannot
/// be decoded.
pub fn decode_document(doc: &Value) -> Result<Document, StoreError> {
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Codec("document has no name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();
    let fields = doc
        .get("fields")
        .map_or_else(|| Ok(Map::new()), decode_fields)?;
    Ok(Document { id, fields })
}

fn malformed(kind: &str, inner: &Value) -> StoreError {
    StoreError::Codec(format!("malformed {kind}: {inner}"))
}
