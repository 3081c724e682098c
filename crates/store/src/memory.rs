//! In-memory storage backend.
//!
//! Documents live in a `HashMap` of collections behind an async read-write
//! lock. Queries scan every document in the collection, which is fine for
//! tests and local development.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;

use crate::backend::{
    DeleteAck, InsertAck, StoreBackend, StoreError, StoreResult, UpdateAck,
};
use crate::query::{Expr, FieldOp, Query, QueryVisitor, SortDirection};

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory document storage backend.
///
/// Cloneable; clones share the same underlying data, so a handle can be kept
/// for assertions while another is injected into the application.
#[derive(Default, Clone, Debug)]
pub struct MemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let docs = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let mut matched = match &query.filter {
            Some(filter) => {
                let mut out = Vec::new();
                for doc in docs {
                    if DocumentEvaluator::new(doc).evaluate(filter)? {
                        out.push(doc.clone());
                    }
                }
                out
            }
            None => docs.clone(),
        };

        if let Some(sort) = &query.sort {
            matched.sort_by(|a, b| {
                let left = a.get(&sort.field).map(Comparable::from);
                let right = b.get(&sort.field).map(Comparable::from);
                let ordering = match (left, right) {
                    (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => Ordering::Equal,
                };
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        Ok(matched)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<InsertAck> {
        let mut store = self.store.write().await;
        let docs = store.entry(collection.to_string()).or_default();

        let id = ObjectId::new();
        let mut doc = Document::new();
        doc.insert("_id", Bson::ObjectId(id));
        for (key, value) in document {
            // The store owns identifier assignment.
            if key != "_id" {
                doc.insert(key, value);
            }
        }
        docs.push(doc);

        Ok(InsertAck {
            inserted_id: id.to_hex(),
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Expr,
        set: Document,
    ) -> StoreResult<UpdateAck> {
        let mut store = self.store.write().await;
        let docs = match store.get_mut(collection) {
            Some(col) => col,
            None => {
                return Ok(UpdateAck {
                    matched_count: 0,
                    modified_count: 0,
                })
            }
        };

        for doc in docs.iter_mut() {
            if DocumentEvaluator::new(doc).evaluate(&filter)? {
                let before = doc.clone();
                for (key, value) in set {
                    // `_id` is immutable once assigned.
                    if key != "_id" {
                        doc.insert(key, value);
                    }
                }
                let modified = u64::from(*doc != before);
                return Ok(UpdateAck {
                    matched_count: 1,
                    modified_count: modified,
                });
            }
        }

        Ok(UpdateAck {
            matched_count: 0,
            modified_count: 0,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Expr) -> StoreResult<DeleteAck> {
        let mut store = self.store.write().await;
        let docs = match store.get_mut(collection) {
            Some(col) => col,
            None => return Ok(DeleteAck { deleted_count: 0 }),
        };

        for (index, doc) in docs.iter().enumerate() {
            if DocumentEvaluator::new(doc).evaluate(&filter)? {
                docs.remove(index);
                return Ok(DeleteAck { deleted_count: 1 });
            }
        }

        Ok(DeleteAck { deleted_count: 0 })
    }
}

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types normalize to f64 so Int32/Int64/Double compare naturally.
#[derive(Debug)]
enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    ObjectId(&'a ObjectId),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(f64::from(*value)),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(value),
            _ => Comparable::Null,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Evaluates a filter expression against a single document.
struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    fn new(document: &'a Document) -> Self {
        Self { document }
    }

    fn evaluate(&mut self, expr: &Expr) -> StoreResult<bool> {
        self.visit_expr(expr)
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        let field_value = match self.document.get(field) {
            Some(v) => v,
            None => return Ok(false),
        };

        match op {
            FieldOp::Eq => Ok(Comparable::from(field_value) == Comparable::from(value)),
            FieldOp::Gte | FieldOp::Lte => {
                match Comparable::from(field_value).partial_cmp(&Comparable::from(value)) {
                    Some(ordering) => Ok(match op {
                        FieldOp::Gte => ordering != Ordering::Less,
                        FieldOp::Lte => ordering != Ordering::Greater,
                        _ => unreachable!(),
                    }),
                    None => Ok(false),
                }
            }
            FieldOp::EndsWith => {
                match (Comparable::from(field_value), Comparable::from(value)) {
                    (Comparable::String(left), Comparable::String(right)) => {
                        Ok(left.to_lowercase().ends_with(&right.to_lowercase()))
                    }
                    _ => Ok(false),
                }
            }
        }
    }
}
