//! JSON/BSON value bridging.
//!
//! Handlers speak `serde_json::Value`; backends speak BSON. These walkers
//! convert between the two, preserving integer vs. decimal numbers and
//! rendering ObjectIds as hex strings on the way out.

use bson::{Bson, Document};
use serde_json::Value;

use crate::backend::{StoreError, StoreResult};

/// Converts a JSON value into its BSON counterpart.
///
/// Integers become `Int64`, other numbers `Double`. Object keys keep their
/// order.
pub fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Bson::Int64(i)
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_bson(v)))
                .collect(),
        ),
    }
}

/// Converts a JSON object into a BSON document.
pub fn json_object_to_document(value: &Value) -> StoreResult<Document> {
    match json_to_bson(value) {
        Bson::Document(doc) => Ok(doc),
        _ => Err(StoreError::InvalidDocument(
            "expected a JSON object".to_string(),
        )),
    }
}

/// Converts a BSON value back into JSON.
///
/// ObjectIds render as 24-char hex strings; non-finite doubles become null.
pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(d) => serde_json::Number::from_f64(*d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s.clone()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => Value::Object(
            doc.iter()
                .map(|(k, v)| (k.clone(), bson_to_json(v)))
                .collect(),
        ),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use serde_json::json;

    #[test]
    fn integers_survive_the_round_trip_as_integers() {
        let value = json!({"pageCount": 400, "price": 49.9});
        let doc = json_object_to_document(&value).unwrap();
        assert_eq!(doc.get("pageCount"), Some(&Bson::Int64(400)));
        assert_eq!(doc.get("price"), Some(&Bson::Double(49.9)));

        let back = bson_to_json(&Bson::Document(doc));
        assert_eq!(back, value);
    }

    #[test]
    fn object_ids_render_as_hex_strings() {
        let oid = ObjectId::new();
        assert_eq!(bson_to_json(&Bson::ObjectId(oid)), json!(oid.to_hex()));
    }

    #[test]
    fn nested_objects_convert_recursively() {
        let value = json!({"origin": {"author": "Clarice", "publisher": "Rocco", "country": "BR"}});
        let doc = json_object_to_document(&value).unwrap();
        let origin = doc.get_document("origin").unwrap();
        assert_eq!(origin.get("country"), Some(&Bson::String("BR".into())));
    }

    #[test]
    fn non_object_root_is_rejected() {
        assert!(json_object_to_document(&json!([1, 2, 3])).is_err());
    }
}
