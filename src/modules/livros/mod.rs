pub mod models;
pub mod query;
pub mod repo;
pub mod validate;

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde_json::{json, Value};

use livraria_http::error::ApiError;
use livraria_kernel::settings::ReportSettings;
use livraria_kernel::{InitCtx, Module};
use livraria_store::{DeleteAck, InsertAck, Query, StoreBackend, StoreError, UpdateAck};

use models::Book;
use repo::BookRepository;

const BASE_PATH: &str = "/api/livros";

/// Shared handler state: the repository plus the report window.
#[derive(Clone)]
pub struct AppState {
    repo: BookRepository,
    report: ReportSettings,
}

/// Books module: CRUD plus the fixed report query over `/api/livros`.
pub struct LivrosModule {
    state: AppState,
}

impl LivrosModule {
    pub fn new(store: Arc<dyn StoreBackend>, report: ReportSettings) -> Self {
        Self {
            state: AppState {
                repo: BookRepository::new(store),
                report,
            },
        }
    }
}

#[async_trait]
impl Module for LivrosModule {
    fn name(&self) -> &'static str {
        "livros"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "livros module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/",
                get(list_books).post(create_book).put(update_book),
            )
            .route("/id/{id}", get(get_book_by_id))
            .route("/data", get(report_books))
            .route("/{id}", delete(delete_book))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List all books sorted by title",
                        "tags": ["Livros"],
                        "responses": {
                            "200": {
                                "description": "List of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "500": {
                                "description": "Unexpected failure",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Insert a new book",
                        "tags": ["Livros"],
                        "responses": {
                            "200": { "description": "Insert acknowledgment with insertedId" },
                            "400": {
                                "description": "Validation errors or store fault",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    },
                    "put": {
                        "summary": "Update the book identified by the body's id",
                        "tags": ["Livros"],
                        "responses": {
                            "200": { "description": "Update acknowledgment with matched/modified counts" },
                            "400": {
                                "description": "Validation errors or store fault",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/id/{id}": {
                    "get": {
                        "summary": "Find a book by its identifier",
                        "tags": ["Livros"],
                        "responses": {
                            "200": { "description": "Array with zero or one book" },
                            "400": { "description": "Malformed identifier or store fault" }
                        }
                    }
                },
                "/data": {
                    "get": {
                        "summary": "Fixed report: page window and publication year",
                        "tags": ["Livros"],
                        "responses": {
                            "200": { "description": "Matching books, possibly empty" },
                            "400": { "description": "Store fault" }
                        }
                    }
                },
                "/{id}": {
                    "delete": {
                        "summary": "Delete a book by its identifier",
                        "tags": ["Livros"],
                        "responses": {
                            "200": { "description": "Delete acknowledgment with deletedCount" },
                            "400": { "description": "Store fault" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "description": "Store-assigned identifier" },
                            "title": { "type": "string" },
                            "pageCount": { "type": "integer", "minimum": 1 },
                            "publicationDate": { "type": "string", "description": "DD-MM-YYYY" },
                            "price": { "type": "number" },
                            "origin": {
                                "type": "object",
                                "properties": {
                                    "author": { "type": "string" },
                                    "publisher": { "type": "string" }
                                },
                                "required": ["author", "publisher"]
                            }
                        },
                        "required": ["title", "pageCount", "publicationDate", "price", "origin"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "livros module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "livros module stopped");
        Ok(())
    }
}

/// GET /api/livros — every book, sorted ascending by title.
async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    state
        .repo
        .find(query::all())
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("/", "failed to list the books", anyhow::Error::new(e)))
}

/// GET /api/livros/id/{id} — zero or one book for the decoded identifier.
async fn get_book_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let filter = query::by_id(&id)?;
    state
        .repo
        .find(Query::filtered(filter))
        .await
        .map(Json)
        .map_err(|e| ApiError::store(BASE_PATH, "failed to find the book", &e))
}

/// GET /api/livros/data — the fixed report query.
async fn report_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    state
        .repo
        .find(query::report(&state.report))
        .await
        .map(Json)
        .map_err(|e| ApiError::store(BASE_PATH, "failed to run the report query", &e))
}

/// POST /api/livros — validate, then insert.
async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<InsertAck>, ApiError> {
    let violations = validate::validate_book(&payload);
    if !violations.is_empty() {
        return Err(ApiError::validation(violations));
    }

    let book = decode_book(payload)?;
    state
        .repo
        .insert(&book)
        .await
        .map(Json)
        .map_err(|e| ApiError::store(BASE_PATH, "failed to insert the book", &e))
}

/// PUT /api/livros — extract and strip the id, validate, then update.
async fn update_book(
    State(state): State<AppState>,
    Json(mut payload): Json<Value>,
) -> Result<Json<UpdateAck>, ApiError> {
    let id = payload
        .as_object_mut()
        .and_then(|map| map.remove("id"));

    let violations = validate::validate_book(&payload);
    if !violations.is_empty() {
        return Err(ApiError::validation(violations));
    }

    // A request without an id cannot locate its target; surface a lookup
    // fault rather than silently matching nothing.
    let raw_id = match id.as_ref().and_then(Value::as_str) {
        Some(raw) => raw.to_string(),
        None => {
            return Err(ApiError::store(
                BASE_PATH,
                "failed to locate the book to update",
                &StoreError::InvalidDocument("update payload carries no id".to_string()),
            ))
        }
    };

    let filter = query::by_id(&raw_id)?;
    let book = decode_book(payload)?;
    state
        .repo
        .update(filter, &book)
        .await
        .map(Json)
        .map_err(|e| ApiError::store(BASE_PATH, "failed to update the book", &e))
}

/// DELETE /api/livros/{id} — single-record removal by identifier.
async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, ApiError> {
    let filter = query::by_id(&id)?;
    state
        .repo
        .delete(filter)
        .await
        .map(Json)
        .map_err(|e| ApiError::store(BASE_PATH, "failed to delete the book", &e))
}

/// Converts a payload that already passed validation into the typed record.
fn decode_book(payload: Value) -> Result<Book, ApiError> {
    serde_json::from_value(payload).map_err(|e| {
        ApiError::internal(
            BASE_PATH,
            "failed to decode the validated payload",
            anyhow::Error::new(e),
        )
    })
}

/// Create a new instance of the livros module.
pub fn create_module(store: Arc<dyn StoreBackend>, report: ReportSettings) -> Arc<dyn Module> {
    Arc::new(LivrosModule::new(store, report))
}
