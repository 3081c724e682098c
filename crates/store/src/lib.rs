//! Document store abstraction for Livraria.
//!
//! Exposes a backend trait over find/insert/update/delete plus a small filter
//! expression AST. Two backends are provided: [`MemoryStore`] for tests and
//! local development, and [`MongoStore`] for production deployments.

pub mod backend;
pub mod memory;
pub mod mongo;
pub mod query;
pub mod value;

pub use backend::{DeleteAck, InsertAck, StoreBackend, StoreError, StoreResult, UpdateAck};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use query::{Expr, FieldOp, Filter, Query, QueryVisitor, Sort, SortDirection};
