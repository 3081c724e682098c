use bson::Document;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use livraria_store::value::{bson_to_json, json_object_to_document};
use livraria_store::{StoreError, StoreResult};

/// A catalog book record.
///
/// `id` is assigned by the store on creation and is never part of the
/// persisted document body. `publication_date` stays text (`DD-MM-YYYY`);
/// `price` keeps integer vs. decimal as received. `origin` must carry
/// `author` and `publisher`; any other keys pass through unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub page_count: i64,
    pub publication_date: String,
    pub price: Number,
    pub origin: Map<String, Value>,
}

impl Book {
    /// Converts a stored document into a `Book`, mapping `_id` to `id`.
    pub fn from_document(doc: &Document) -> StoreResult<Self> {
        let mut value = bson_to_json(&bson::Bson::Document(doc.clone()));
        if let Value::Object(map) = &mut value {
            if let Some(id) = map.remove("_id") {
                map.insert("id".to_string(), id);
            }
        }

        serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Converts this book into a document body for persistence.
    ///
    /// `id` is stripped; the store owns `_id`.
    pub fn to_document(&self) -> StoreResult<Document> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("id");
        }

        json_object_to_document(&value)
    }
}
