//! MongoDB storage backend.
//!
//! Filter expressions are translated into native query documents by a
//! [`QueryVisitor`] implementation; driver acknowledgments map directly onto
//! the backend's ack types.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection};

use crate::backend::{
    DeleteAck, InsertAck, StoreBackend, StoreError, StoreResult, UpdateAck,
};
use crate::query::{Expr, FieldOp, Query, QueryVisitor, SortDirection};

/// Document store backend over a MongoDB deployment.
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: String,
}

impl MongoStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    /// Connect to the deployment described by `endpoint`.
    ///
    /// The connection is established once at process start and shared by all
    /// request handlers.
    pub async fn connect(endpoint: &str, database: &str) -> StoreResult<Self> {
        let options = ClientOptions::parse(endpoint)
            .await
            .map_err(|e| StoreError::Initialization(e.to_string()))?;
        let client =
            Client::with_options(options).map_err(|e| StoreError::Initialization(e.to_string()))?;

        tracing::info!(endpoint, database, "document store client ready");
        Ok(Self::new(client, database.to_string()))
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.client.database(&self.database).collection(name)
    }
}

#[async_trait]
impl StoreBackend for MongoStore {
    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>> {
        let filter = match &query.filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr)?,
            None => doc! {},
        };

        let mut options = FindOptions::default();
        if let Some(sort) = &query.sort {
            options.sort = Some(doc! {
                sort.field.clone(): match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }
            });
        }

        Ok(self
            .collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<InsertAck> {
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let inserted_id = match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            other => other.to_string(),
        };

        Ok(InsertAck { inserted_id })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Expr,
        set: Document,
    ) -> StoreResult<UpdateAck> {
        let filter = MongoQueryTranslator.visit_expr(&filter)?;
        let result = self
            .collection(collection)
            .update_one(filter, doc! { "$set": set })
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(UpdateAck {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Expr) -> StoreResult<DeleteAck> {
        let filter = MongoQueryTranslator.visit_expr(&filter)?;
        let result = self
            .collection(collection)
            .delete_one(filter)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(DeleteAck {
            deleted_count: result.deleted_count,
        })
    }
}

/// Translates filter expressions into MongoDB query documents.
struct MongoQueryTranslator;

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value.clone() },
                FieldOp::Gte => doc! { "$gte": value.clone() },
                FieldOp::Lte => doc! { "$lte": value.clone() },
                FieldOp::EndsWith => match value {
                    Bson::String(s) => doc! { "$regex": format!("{}$", s), "$options": "i" },
                    _ => return Err(StoreError::Backend(
                        "EndsWith operator requires a string value".to_string(),
                    )),
                },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Filter;
    use bson::oid::ObjectId;

    #[test]
    fn id_filter_translates_to_eq_on_underscore_id() {
        let oid = ObjectId::new();
        let expr = Filter::eq("_id", Bson::ObjectId(oid));
        let translated = MongoQueryTranslator.visit_expr(&expr).unwrap();
        assert_eq!(translated, doc! { "_id": { "$eq": oid } });
    }

    #[test]
    fn report_filter_translates_to_and_of_range_and_regex() {
        let expr = Filter::and([
            Filter::gte("pageCount", 350),
            Filter::lte("pageCount", 500),
            Filter::ends_with("publicationDate", "2022"),
        ]);
        let translated = MongoQueryTranslator.visit_expr(&expr).unwrap();

        assert_eq!(
            translated,
            doc! {
                "$and": [
                    { "pageCount": { "$gte": 350 } },
                    { "pageCount": { "$lte": 500 } },
                    { "publicationDate": { "$regex": "2022$", "$options": "i" } },
                ]
            }
        );
    }

    #[test]
    fn ends_with_rejects_non_string_suffix() {
        let expr = Filter::ends_with("publicationDate", 2022);
        assert!(MongoQueryTranslator.visit_expr(&expr).is_err());
    }
}
