use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use boolsearch_core::engine::SearchEngine;
use boolsearch_core::store::JsonlStore;
use http_body_util::BodyExt;
use serde_json::Value;
use server::{build_app, AppConfig};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

const TOKEN: &str = "secret";

fn write_corpus(dir: &Path) {
    let lines = [
        r#"{"id":"1","pageid":11,"title":"Кошки","text":"Кот спит на диване.","url":"https://ru.wikipedia.org/wiki/1","created_at":1700000000}"#,
        r#"{"id":"2","pageid":12,"title":"Собаки","text":"Кот и собака дружат.","url":"https://ru.wikipedia.org/wiki/2","created_at":1700000001}"#,
        r#"{"id":"3","pageid":13,"title":"Птицы","text":"Птица поёт.","url":"https://ru.wikipedia.org/wiki/3","created_at":1700000002}"#,
    ];
    fs::write(dir.join("pages.jsonl"), lines.join("\n")).unwrap();
}

fn app_for(dir: &Path) -> (Router, Arc<SearchEngine>) {
    let engine = Arc::new(SearchEngine::new(Arc::new(JsonlStore::new(dir))));
    engine.build_index().unwrap();
    let config = AppConfig { admin_token: Some(TOKEN.into()), cors_allow_origin: None };
    (build_app(engine.clone(), config), engine)
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn search_request(body: &str) -> Request<Body> {
    Request::post("/search").body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let (app, _) = app_for(dir.path());
    let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn stats_reports_last_build() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let (app, _) = app_for(dir.path());
    let (status, body) = send(app, Request::get("/stats").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["docs_count"], 3);
    assert_eq!(json["total_tokens"], 10);
    let top = json["top_frequencies"].as_array().unwrap();
    assert_eq!(top[0]["rank"], 1);
    assert_eq!(top[0]["frequency"], 2);
    assert!(json["avg_token_length"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn search_returns_matching_documents() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let (app, _) = app_for(dir.path());
    let (status, body) = send(app, search_request(r#"{"query":"кот && !собака"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["count"], 1);
    let doc = &json["documents"][0];
    assert_eq!(doc["id"], "1");
    assert_eq!(doc["pageid"], 11);
    assert_eq!(doc["title"], "Кошки");
    assert_eq!(doc["created_at"], 1700000000);
}

#[tokio::test]
async fn malformed_query_is_empty_not_an_error() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let (app, _) = app_for(dir.path());
    let (status, body) = send(app, search_request(r#"{"query":"кот &&"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["count"], 0);
    assert!(json["documents"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_search_body_is_rejected() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let (app, _) = app_for(dir.path());
    for body in ["not json", r#"{"q":"кот"}"#, r#"{"query":42}"#] {
        let (status, resp) = send(app.clone(), search_request(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        let json: Value = serde_json::from_slice(&resp).unwrap();
        assert_eq!(json["status"], "error");
    }
}

#[tokio::test]
async fn rebuild_requires_token_and_picks_up_new_documents() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let (app, engine) = app_for(dir.path());

    let (status, _) = send(app.clone(), Request::post("/index/rebuild").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    fs::write(dir.path().join("more.jsonl"), r#"{"id":"4","text":"Новый кот"}"#).unwrap();
    let req = Request::post("/index/rebuild").header("X-ADMIN-TOKEN", TOKEN).body(Body::empty()).unwrap();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["docs_count"], 4);
    assert_eq!(engine.search("кот").len(), 3);
}

#[tokio::test]
async fn deeply_nested_query_returns_empty_result() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let (app, _) = app_for(dir.path());
    let query = format!("{}кот{}", "(".repeat(50_000), ")".repeat(50_000));
    let body = serde_json::json!({ "query": query }).to_string();
    let (status, resp) = send(app.clone(), search_request(&body)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&resp).unwrap();
    assert_eq!(json["count"], 0);

    let chain = vec!["кот"; 20_000].join(" && ");
    let body = serde_json::json!({ "query": chain }).to_string();
    let (status, resp) = send(app, search_request(&body)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&resp).unwrap();
    assert_eq!(json["count"], 2);
}
