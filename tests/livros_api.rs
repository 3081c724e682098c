//! End-to-end tests for the /api/livros surface against the in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use livraria_app::modules;
use livraria_kernel::settings::Settings;
use livraria_kernel::ModuleRegistry;
use livraria_store::MemoryStore;

fn app() -> Router {
    let settings = Settings::default();
    let store = Arc::new(MemoryStore::new());

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, &settings);

    livraria_http::build_router(&registry, &settings)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

fn valid_book(title: &str, pages: i64, date: &str) -> Value {
    json!({
        "title": title,
        "pageCount": pages,
        "publicationDate": date,
        "price": 49.9,
        "origin": { "author": "Jorge Amado", "publisher": "Record" }
    })
}

#[tokio::test]
async fn post_valid_book_acknowledges_with_inserted_id() {
    let app = app();

    let response = app
        .oneshot(with_json(
            "POST",
            "/api/livros",
            &valid_book("Gabriela", 424, "15-03-2022"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let id = body["insertedId"].as_str().expect("insertedId present");
    assert_eq!(id.len(), 24);
}

#[tokio::test]
async fn inserted_book_round_trips_by_id() {
    let app = app();
    let payload = valid_book("Mar Morto", 280, "10-06-2022");

    let response = app
        .clone()
        .oneshot(with_json("POST", "/api/livros", &payload))
        .await
        .unwrap();
    let id = body_json(response).await["insertedId"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(get(&format!("/api/livros/id/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let books = body.as_array().unwrap();
    assert_eq!(books.len(), 1);

    let mut expected = payload.clone();
    expected["id"] = json!(id);
    assert_eq!(books[0], expected);
}

#[tokio::test]
async fn list_returns_books_sorted_by_title() {
    let app = app();
    for title in ["Tereza Batista", "Capitães da Areia", "Dona Flor"] {
        let response = app
            .clone()
            .oneshot(with_json(
                "POST",
                "/api/livros",
                &valid_book(title, 300, "01-01-2021"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/api/livros")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Capitães da Areia", "Dona Flor", "Tereza Batista"]);
}

#[tokio::test]
async fn invalid_payload_accumulates_violations_and_never_persists() {
    let app = app();
    let payload = json!({
        "title": "  ",
        "pageCount": 0,
        "publicationDate": "2022-05-12",
        "price": "free",
        "origin": {}
    });

    let response = app
        .clone()
        .oneshot(with_json("POST", "/api/livros", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let params: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["param"].as_str().unwrap())
        .collect();
    assert_eq!(
        params,
        ["title", "pageCount", "publicationDate", "price", "origin"]
    );

    // The store was never reached.
    let response = app.oneshot(get("/api/livros")).await.unwrap();
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_identifier_is_rejected_with_400() {
    let app = app();

    let response = app.oneshot(get("/api/livros/id/not-an-oid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["param"], "id");
    assert_eq!(body["errors"][0]["value"], "not-an-oid");
}

#[tokio::test]
async fn report_filters_by_page_window_and_year() {
    let app = app();
    let seeds = [
        valid_book("Included", 400, "01-01-2022"),
        valid_book("Too Thin", 100, "01-01-2022"),
        valid_book("Wrong Year", 400, "01-01-2019"),
    ];
    for payload in &seeds {
        app.clone()
            .oneshot(with_json("POST", "/api/livros", payload))
            .await
            .unwrap();
    }

    let response = app.oneshot(get("/api/livros/data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let books = body.as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Included");
}

#[tokio::test]
async fn empty_report_is_a_valid_200() {
    let app = app();

    let response = app.oneshot(get("/api/livros/data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_the_same_book_twice_acknowledges_one_then_zero() {
    let app = app();
    let response = app
        .clone()
        .oneshot(with_json(
            "POST",
            "/api/livros",
            &valid_book("Efêmero", 360, "05-05-2022"),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["insertedId"]
        .as_str()
        .unwrap()
        .to_string();

    let delete = |app: Router, id: String| async move {
        app.oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/livros/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    };

    let response = delete(app.clone(), id.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["deletedCount"], 1);

    let response = delete(app, id).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["deletedCount"], 0);
}

#[tokio::test]
async fn put_replaces_fields_and_acknowledges_counts() {
    let app = app();
    let response = app
        .clone()
        .oneshot(with_json(
            "POST",
            "/api/livros",
            &valid_book("Primeira Edição", 200, "01-02-2022"),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["insertedId"]
        .as_str()
        .unwrap()
        .to_string();

    let mut update = valid_book("Segunda Edição", 220, "01-02-2022");
    update["id"] = json!(id);

    let response = app
        .clone()
        .oneshot(with_json("PUT", "/api/livros", &update))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["matchedCount"], 1);
    assert_eq!(body["modifiedCount"], 1);

    let response = app
        .oneshot(get(&format!("/api/livros/id/{}", id)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body[0]["title"], "Segunda Edição");
    assert_eq!(body[0]["pageCount"], 220);
}

#[tokio::test]
async fn put_without_id_surfaces_a_lookup_fault() {
    let app = app();

    let response = app
        .oneshot(with_json(
            "PUT",
            "/api/livros",
            &valid_book("Sem Identidade", 210, "03-03-2022"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["param"], "/api/livros");
    assert_eq!(body["errors"][0]["msg"], "failed to locate the book to update");
}

#[tokio::test]
async fn put_validates_before_looking_at_the_id() {
    let app = app();
    let mut payload = valid_book("", 0, "01-01-2022");
    payload["id"] = json!("not-an-oid");

    let response = app
        .oneshot(with_json("PUT", "/api/livros", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let params: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["param"].as_str().unwrap())
        .collect();
    assert_eq!(params, ["title", "pageCount"]);
}

#[tokio::test]
async fn unmatched_route_answers_with_the_standard_envelope() {
    let app = app();

    let response = app.oneshot(get("/api/livros/xyz/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["param"], "invalid route");
    assert_eq!(body["errors"][0]["value"], "/api/livros/xyz/abc");
}

#[tokio::test]
async fn unregistered_method_on_a_known_path_answers_with_the_envelope() {
    let app = app();

    // Only DELETE is routed at /api/livros/{id}; a GET must fall through to
    // the same envelope as an unknown path.
    let response = app
        .oneshot(get("/api/livros/0123456789abcdef01234567"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["param"], "invalid route");
    assert_eq!(
        body["errors"][0]["value"],
        "/api/livros/0123456789abcdef01234567"
    );
}

#[tokio::test]
async fn api_banner_reports_operational() {
    let app = app();

    let response = app.oneshot(get("/api")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["version"], "1.0.0");
}
