//! Thin translation layer between validated input and store operations.

use std::sync::Arc;

use livraria_store::{
    DeleteAck, Expr, InsertAck, Query, StoreBackend, StoreResult, UpdateAck,
};

use super::models::Book;

const COLLECTION: &str = "livros";

/// Repository for book records over an injected store backend.
///
/// Each operation returns either a result set, an acknowledgment, or the
/// store's own error; nothing here retries or reinterprets faults.
#[derive(Debug, Clone)]
pub struct BookRepository {
    store: Arc<dyn StoreBackend>,
}

impl BookRepository {
    pub fn new(store: Arc<dyn StoreBackend>) -> Self {
        Self { store }
    }

    /// Find books matching `query`; possibly empty, never an error for a
    /// miss.
    pub async fn find(&self, query: Query) -> StoreResult<Vec<Book>> {
        let docs = self.store.find(COLLECTION, query).await?;
        docs.iter().map(Book::from_document).collect()
    }

    /// Insert a validated book; the store assigns the identifier.
    pub async fn insert(&self, book: &Book) -> StoreResult<InsertAck> {
        let doc = book.to_document()?;
        self.store.insert_one(COLLECTION, doc).await
    }

    /// Replace the fields of the book selected by `filter`.
    ///
    /// Zero matched documents is a valid acknowledgment, not an error.
    pub async fn update(&self, filter: Expr, book: &Book) -> StoreResult<UpdateAck> {
        let doc = book.to_document()?;
        self.store.update_one(COLLECTION, filter, doc).await
    }

    /// Delete the book selected by `filter`; deleting an absent record
    /// acknowledges zero.
    pub async fn delete(&self, filter: Expr) -> StoreResult<DeleteAck> {
        self.store.delete_one(COLLECTION, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::livros::query;
    use livraria_kernel::settings::ReportSettings;
    use livraria_store::MemoryStore;
    use serde_json::json;

    fn repo() -> BookRepository {
        BookRepository::new(Arc::new(MemoryStore::new()))
    }

    fn book(title: &str, pages: i64, date: &str) -> Book {
        serde_json::from_value(json!({
            "title": title,
            "pageCount": pages,
            "publicationDate": date,
            "price": 39.9,
            "origin": { "author": "Autor", "publisher": "Editora" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn insert_then_find_by_id_round_trips_the_record() {
        let repo = repo();
        let original = book("O Cortiço", 304, "20-08-2022");

        let ack = repo.insert(&original).await.unwrap();
        let filter = query::by_id(&ack.inserted_id).unwrap();
        let found = repo.find(Query::filtered(filter)).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_deref(), Some(ack.inserted_id.as_str()));
        assert_eq!(found[0].title, original.title);
        assert_eq!(found[0].price, original.price);
    }

    #[tokio::test]
    async fn list_is_sorted_by_title() {
        let repo = repo();
        for title in ["Helena", "Capitães da Areia", "Sagarana"] {
            repo.insert(&book(title, 200, "01-01-2021")).await.unwrap();
        }

        let books = repo.find(query::all()).await.unwrap();
        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Capitães da Areia", "Helena", "Sagarana"]);
    }

    #[tokio::test]
    async fn report_includes_window_and_year_matches_only() {
        let repo = repo();
        repo.insert(&book("In Window", 400, "01-01-2022")).await.unwrap();
        repo.insert(&book("Too Thin", 100, "01-01-2022")).await.unwrap();
        repo.insert(&book("Old Print", 400, "01-01-1999")).await.unwrap();

        let books = repo
            .find(query::report(&ReportSettings::default()))
            .await
            .unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "In Window");
    }

    #[tokio::test]
    async fn update_is_a_no_op_for_a_missing_record() {
        let repo = repo();
        let phantom = bson::oid::ObjectId::new().to_hex();
        let ack = repo
            .update(
                query::by_id(&phantom).unwrap(),
                &book("Ghost", 100, "01-01-2022"),
            )
            .await
            .unwrap();
        assert_eq!(ack.matched_count, 0);
    }

    #[tokio::test]
    async fn delete_acknowledges_absence_with_zero() {
        let repo = repo();
        let ack = repo.insert(&book("Fugaz", 120, "02-02-2022")).await.unwrap();

        let first = repo
            .delete(query::by_id(&ack.inserted_id).unwrap())
            .await
            .unwrap();
        assert_eq!(first.deleted_count, 1);

        let second = repo
            .delete(query::by_id(&ack.inserted_id).unwrap())
            .await
            .unwrap();
        assert_eq!(second.deleted_count, 0);
    }
}
