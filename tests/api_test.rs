//! HTTP tests for the dump API, driven through the router without a socket.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

use backoffice_mock::api::router;
use backoffice_mock::schema::get_table;
use backoffice_mock::{seed_database, SeedOptions};

const INDEX_HTML: &str = "<!doctype html><title>backoffice</title>";

/// A seeded database next to a `public/` directory, plus a file outside it
struct Fixture {
    _dir: TempDir,
    db_path: PathBuf,
    public_dir: PathBuf,
}

static FIXTURE: Lazy<Fixture> = Lazy::new(|| {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("backoffice.db");
    let public_dir = dir.path().join("public");

    fs::create_dir_all(public_dir.join("assets")).unwrap();
    fs::write(public_dir.join("index.html"), INDEX_HTML).unwrap();
    fs::write(public_dir.join("assets").join("app.js"), "console.log('ok');").unwrap();
    fs::write(dir.path().join("secret.txt"), "do not serve").unwrap();

    let options = SeedOptions {
        progress: false,
        ..SeedOptions::default()
    };
    seed_database(&db_path, &options).expect("Failed to seed database");

    Fixture {
        _dir: dir,
        db_path,
        public_dir,
    }
});

fn app() -> Router {
    router(FIXTURE.db_path.clone(), FIXTURE.public_dir.clone())
}

async fn get(router: Router, uri: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap_or_else(|err| panic!("failed to build request: {err}"));

    match router.oneshot(request).await {
        Ok(response) => response,
        Err(err) => panic!("router request failed: {err}"),
    }
}

async fn body_text(response: Response) -> String {
    let bytes = match to_bytes(response.into_body(), 16 * 1024 * 1024).await {
        Ok(bytes) => bytes,
        Err(err) => panic!("failed to read response body: {err}"),
    };
    match String::from_utf8(bytes.to_vec()) {
        Ok(body) => body,
        Err(err) => panic!("response body is not UTF-8: {err}"),
    }
}

async fn body_json(response: Response) -> Value {
    let body = body_text(response).await;
    match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(err) => panic!("response body is not JSON: {err}; body={body}"),
    }
}

fn assert_no_cache(response: &Response) {
    let headers = response.headers();
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "no-store, no-cache, must-revalidate, max-age=0"
    );
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

// =============================================================================
// /healthz
// =============================================================================

#[tokio::test]
async fn test_healthz() {
    let response = get(app(), "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_no_cache(&response);
    assert_eq!(body_json(response).await, serde_json::json!({ "ok": true }));
}

// =============================================================================
// /dump
// =============================================================================

#[tokio::test]
async fn test_dump_shape_and_totals() {
    let response = get(app(), "/dump").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_no_cache(&response);

    let dump = body_json(response).await;
    assert_eq!(dump["meta"]["source"], "sqlite-mock");

    let totals = &dump["meta"]["totals"];
    for key in ["associates", "events", "invoices", "payments", "registrations"] {
        let rows = dump["data"][key].as_array().expect("table is an array");
        assert_eq!(totals[key].as_u64(), Some(rows.len() as u64), "{}", key);
    }
    assert_eq!(totals["associates"], 50);
    assert_eq!(totals["events"], 6);
    assert_eq!(totals["invoices"], 220);

    assert!(dump["data"]["reports"]["monthly_revenue"].is_array());
    assert!(dump["data"]["reports"]["delinquency"].is_array());
}

#[tokio::test]
async fn test_dump_rows_follow_schema() {
    let dump = body_json(get(app(), "/dump").await).await;

    for (path, table) in [
        ("/data/associates", "associates"),
        ("/data/invoices", "invoices"),
        ("/data/reports/delinquency", "delinquency"),
    ] {
        let schema = get_table(table).unwrap();
        let rows = dump.pointer(path).and_then(Value::as_array).unwrap();
        let keys: Vec<&str> = rows[0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, schema.column_names(), "column order of {}", table);

        // Ordered by primary key
        let ids: Vec<&str> = rows
            .iter()
            .map(|r| r[schema.primary_key].as_str().unwrap())
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}

#[tokio::test]
async fn test_dump_value_types() {
    let dump = body_json(get(app(), "/dump").await).await;
    let data = &dump["data"];

    let event = &data["events"][0];
    assert!(event["seats"].is_i64());
    assert!(event["price"].is_number());

    let payment = &data["payments"][0];
    assert!(payment["conciliated"] == 0 || payment["conciliated"] == 1);

    let invoices = data["invoices"].as_array().unwrap();
    let unpaid = invoices
        .iter()
        .find(|i| i["status"] != "paid")
        .expect("some invoice is not paid");
    assert!(unpaid["payment_date"].is_null());
    let paid = invoices.iter().find(|i| i["status"] == "paid").unwrap();
    assert!(paid["payment_date"].is_string());
}

#[tokio::test]
async fn test_dump_missing_database_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let router = router(dir.path().join("absent.db"), FIXTURE.public_dir.clone());

    let response = get(router, "/dump").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_no_cache(&response);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "database_unavailable");
    assert!(body["error"]["message"].as_str().unwrap().contains("absent.db"));
}

#[tokio::test]
async fn test_dump_unseeded_database_is_query_failure() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("blank.db");
    Connection::open(&db_path)
        .unwrap()
        .execute_batch("CREATE TABLE unrelated(id INTEGER);")
        .unwrap();

    let response = get(router(db_path, FIXTURE.public_dir.clone()), "/dump").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "query_failed");
}

// =============================================================================
// Static files
// =============================================================================

#[tokio::test]
async fn test_root_serves_index() {
    let response = get(app(), "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_no_cache(&response);
    assert_eq!(body_text(response).await, INDEX_HTML);
}

#[tokio::test]
async fn test_nested_static_file() {
    let response = get(app(), "/assets/app.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "console.log('ok');");
}

#[tokio::test]
async fn test_unknown_file_is_not_found() {
    let response = get(app(), "/missing.html").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_no_cache(&response);
}

#[tokio::test]
async fn test_traversal_is_refused() {
    let response = get(app(), "/../secret.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(app(), "/%2e%2e/secret.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_cross_origin_request() {
    let request = Request::builder()
        .uri("/dump")
        .method("GET")
        .header(header::ORIGIN, "http://dashboard.example")
        .body(Body::empty())
        .unwrap_or_else(|err| panic!("failed to build request: {err}"));

    let response = match app().oneshot(request).await {
        Ok(response) => response,
        Err(err) => panic!("router request failed: {err}"),
    };
    assert_eq!(response.status(), StatusCode::OK);
    assert_no_cache(&response);
}

#[tokio::test]
async fn test_preflight() {
    let request = Request::builder()
        .uri("/dump")
        .method("OPTIONS")
        .header(header::ORIGIN, "http://dashboard.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap_or_else(|err| panic!("failed to build request: {err}"));

    let response = match app().oneshot(request).await {
        Ok(response) => response,
        Err(err) => panic!("router request failed: {err}"),
    };
    assert_eq!(response.status(), StatusCode::OK);
    assert_no_cache(&response);
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap();
    assert!(methods.contains("GET"));
}
