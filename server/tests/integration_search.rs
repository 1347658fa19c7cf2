use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use server::{build_app, ServerConfig};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};
use tfidf_core::{build_index_at, SledStore};
use tfidf_core::corpus::WapoReader;
use tower::ServiceExt;

fn article(title: &str, author: &str, content: &str) -> String {
    serde_json::json!({
        "title": title,
        "author": author,
        "published_date": 1489536000000i64,
        "contents": [{ "type": "sanitized_html", "content": content }],
    })
    .to_string()
}

fn build_tiny_index(dir: &Path, lines: &[String]) -> ServerConfig {
    let corpus = dir.join("corpus.jl");
    fs::write(&corpus, lines.join("\n")).unwrap();
    let config = ServerConfig { index: dir.join("index"), norms: dir.join("index_doc_len"), corpus, k: 50 };
    let docs: Vec<_> = WapoReader::open(&config.corpus).unwrap().collect::<Result<_, _>>().unwrap();
    build_index_at(docs, &config.index, &config.norms).unwrap();
    config
}

fn cats_and_dogs() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let lines = vec![
        article("Cat show", "Ann", "The cat sat on the mat."),
        article("Dog park", "Bob", "The dog sat in the park."),
        article("Pets", "Cy", "A cat and a dog and a bird."),
    ];
    let config = build_tiny_index(dir.path(), &lines);
    (dir, build_app(config).unwrap())
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let (_dir, app) = cats_and_dogs();

    let (status, json) = call(app, "/search?q=cat%20the%20zebra").await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["doc_id"].as_u64().unwrap(), 0);
    assert_eq!(arr[1]["doc_id"].as_u64().unwrap(), 2);
    assert_eq!(arr[0]["rank"], 1);
    assert_eq!(arr[0]["title"], "Cat show");
    assert_eq!(arr[0]["published_date"], "2017/3/15");
    assert_eq!(arr[0]["terms"], serde_json::json!(["cat"]));
    assert_eq!(json["stopwords"], serde_json::json!(["the"]));
    assert_eq!(json["unknown"], serde_json::json!(["zebra"]));
    assert_eq!(json["idf"][0]["term"], "cat");
    assert_eq!(json["has_next"], false);
}

#[tokio::test]
async fn empty_query_is_not_an_error() {
    let (_dir, app) = cats_and_dogs();
    let (status, json) = call(app, "/search?q=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
    assert_eq!(json["total_hits"], 0);
}

#[tokio::test]
async fn results_are_paginated() {
    let dir = tempdir().unwrap();
    let lines: Vec<String> = (0..11).map(|i| article(&format!("Story {i}"), "", "election results tonight")).collect();
    let config = build_tiny_index(dir.path(), &lines);
    let app = build_app(config).unwrap();

    let (_, first) = call(app.clone(), "/search?q=election").await;
    assert_eq!(first["results"].as_array().unwrap().len(), 8);
    assert_eq!(first["has_next"], true);
    assert_eq!(first["total_hits"], 11);

    let (_, second) = call(app, "/search?q=election&page=2").await;
    let arr = second["results"].as_array().unwrap();
    assert_eq!(arr.len(), 3);
    assert_eq!(arr[0]["rank"], 9);
    assert_eq!(second["has_next"], false);
}

#[tokio::test]
async fn doc_page_and_missing_doc() {
    let (_dir, app) = cats_and_dogs();
    let (status, json) = call(app.clone(), "/doc/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["author"], "Bob");
    assert_eq!(json["text"], "The dog sat in the park.");

    let (status, json) = call(app, "/doc/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not found");
}

#[tokio::test]
async fn oversized_page_is_empty_not_a_panic() {
    let (_dir, app) = cats_and_dogs();
    let (status, json) = call(app, "/search?q=cat&page=2305843009213693952").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
    assert_eq!(json["has_next"], false);
    assert_eq!(json["total_hits"], 2);
}

#[tokio::test]
async fn unbuilt_index_is_a_server_error() {
    let dir = tempdir().unwrap();
    let config = ServerConfig {
        index: dir.path().join("index"),
        norms: dir.path().join("index_doc_len"),
        corpus: dir.path().join("corpus.jl"),
        k: 50,
    };
    fs::write(&config.corpus, "").unwrap();
    {
        SledStore::open_for_write(&config.index).unwrap();
        SledStore::open_for_write(&config.norms).unwrap();
    }
    let app = build_app(config).unwrap();

    let (status, json) = call(app, "/search?q=cat").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("index not built"));
}

#[tokio::test]
async fn snippets_highlight_each_word_once() {
    let dir = tempdir().unwrap();
    let lines = vec![article("Notes", "", "the cat em here"), article("Other", "", "dog park")];
    let app = build_app(build_tiny_index(dir.path(), &lines)).unwrap();
    let (_, json) = call(app, "/search?q=cat%2C%20em").await;
    assert_eq!(json["results"][0]["snippet"], "the <em>cat</em> <em>em</em> here");
}
