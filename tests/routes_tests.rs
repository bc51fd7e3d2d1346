//! HTTP behaviour that needs no running database
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`.
//! The pool in the state points at a closed port, so any handler reaching
//! Postgres answers with a storage error.


use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use meal_prep::cache::{MemoryCache, ReadThroughCache};
use meal_prep::routes::router;
use serde_json::{json, Value};
use test_helpers::{sample_record, test_state, InMemoryDocumentStore};
use tower::ServiceExt;

fn app() -> (Router, Arc<InMemoryDocumentStore>) {
    let store = InMemoryDocumentStore::new();
    let cache = ReadThroughCache::new(Arc::new(MemoryCache::<String, Vec<u8>>::new()));
    (router(test_state(store.clone(), cache)), store)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(text) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(text.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

#[tokio::test]
async fn test_health_is_ok() {
    let (app, _) = app();
    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_ready_reports_unavailable_database() {
    let (app, _) = app();
    let (status, body) = get(app, "/ready").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["error"], "database unavailable");
}

#[tokio::test]
async fn test_invalid_path_ids_are_rejected() {
    for uri in [
        "/v1/recipes/abc",
        "/v1/recipes/0",
        "/v1/recipes/-4",
        "/v1/ingredients/1.5",
        "/v1/meal-plans/x",
        "/v1/meal-plan-recipes/0",
        "/v1/recipes/zero/ingredients",
    ] {
        let (app, _) = app();
        let (status, body) = get(app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body, json!({ "error": "invalid id" }), "{}", uri);
    }
}

#[tokio::test]
async fn test_delete_with_invalid_id_is_rejected() {
    let (app, _) = app();
    let (status, body) = send(app, Method::DELETE, "/v1/meal-plans/nope", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid id");
}

#[tokio::test]
async fn test_recipe_title_is_required() {
    let (app, _) = app();
    let (status, body) = post(app, "/v1/recipes", r#"{"title":"   "}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "title is required");
}

#[tokio::test]
async fn test_negative_recipe_numbers_are_rejected() {
    let (app, _) = app();
    let (status, body) = post(
        app,
        "/v1/recipes",
        r#"{"title":"Porridge","servings":-1}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "servings must not be negative");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, _) = app();
    let (status, body) = post(app, "/v1/recipes", "{ title: ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid body");

    let (app, _) = self::app();
    let (status, body) = post(app, "/v1/meal-plans", r#"{"name":"Week"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid body");
}

#[tokio::test]
async fn test_import_recipe_requires_ingredient_names() {
    let (app, _) = app();
    let (status, body) = post(
        app,
        "/v1/recipes/import",
        r#"{"title":"Pancakes","ingredients":[{"name":" ","measure":"1 cup"}]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name is required");
}

#[tokio::test]
async fn test_meal_plan_dates_are_validated() {
    let (app, _) = app();
    let (status, body) = post(
        app,
        "/v1/meal-plans",
        r#"{"name":"Week","start_date":"03/01/2024","end_date":"2024-03-07"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "dates must be YYYY-MM-DD");

    let (app, _) = self::app();
    let (status, body) = post(
        app,
        "/v1/meal-plans",
        r#"{"name":"Week","start_date":"2024-03-07","end_date":"2024-03-01"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "end_date must not be before start_date");
}

#[tokio::test]
async fn test_database_outage_is_a_generic_error() {
    let (app, _) = app();
    let (status, body) = get(app, "/v1/recipes").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "db error" }));
}

#[tokio::test]
async fn test_meal_import_then_lookup() {
    let (app, store) = app();
    let dataset = json!([sample_record("52772", "Pancakes"), { "strMeal": "No id" }]);

    let (status, body) = post(app.clone(), "/v1/meals/import", &dataset.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "imported": 1, "skipped": 1 }));

    let (status, body) = get(app.clone(), "/v1/meals/52772").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["idMeal"], "52772");
    assert_eq!(body["strMeal"], "Pancakes");
    assert_eq!(body["ingredients"][1]["measure"], "1 1/2 cups");

    // Served from the cache once the store goes away
    store.set_available(false);
    let (status, body) = get(app, "/v1/meals/52772").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["strMeal"], "Pancakes");
}

#[tokio::test]
async fn test_unknown_meal_is_not_found() {
    let (app, _) = app();
    let (status, body) = get(app, "/v1/meals/404404").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");
}

#[tokio::test]
async fn test_failed_meal_import_names_the_record() {
    let (app, store) = app();
    store.fail_upsert_for("2");
    let dataset = json!([sample_record("1", "One"), sample_record("2", "Two")]);

    let (status, body) = post(app, "/v1/meals/import", &dataset.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "failed to import meal 2" }));
    assert!(store.stored("1").is_some());
}

#[tokio::test]
async fn test_meal_import_requires_an_array() {
    let (app, _) = app();
    let (status, body) = post(app, "/v1/meals/import", r#"{"idMeal":"1"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid body");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = app();
    let (status, _) = get(app, "/v1/nothing-here").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
