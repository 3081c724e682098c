//! Backend trait and result types for document store operations.

use async_trait::async_trait;
use bson::Document;
use serde::Serialize;
use thiserror::Error;

use crate::query::{Expr, Query};

/// Errors surfaced by document store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Conversion between document representations failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization or connection setup.
    #[error("initialization error: {0}")]
    Initialization(String),
    /// The document violates structural expectations.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    /// An error occurred in the underlying storage backend.
    #[error("backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Acknowledgment for a single-document insert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    /// Identifier assigned by the store, as a hex string.
    pub inserted_id: String,
}

/// Acknowledgment for a single-document update.
///
/// Zero matched documents is a valid outcome, not an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Acknowledgment for a single-document delete.
///
/// Deleting an absent document yields `deleted_count == 0`, not an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    pub deleted_count: u64,
}

/// A document store backend executing filters and single-document writes.
///
/// All operations act on one collection at a time; there are no
/// multi-document transactions. Implementations must be shareable across
/// request handlers.
#[async_trait]
pub trait StoreBackend: Send + Sync + std::fmt::Debug {
    /// Find all documents matching the query, in the query's sort order.
    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>>;

    /// Insert a single document; the store assigns its `_id`.
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<InsertAck>;

    /// Apply `set` to the first document matching `filter`.
    async fn update_one(
        &self,
        collection: &str,
        filter: Expr,
        set: Document,
    ) -> StoreResult<UpdateAck>;

    /// Delete the first document matching `filter`.
    async fn delete_one(&self, collection: &str, filter: Expr) -> StoreResult<DeleteAck>;
}
