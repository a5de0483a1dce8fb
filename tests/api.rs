//! HTTP API tests: cache-backed endpoints, store-backed lookups, and
//! the degraded-mode boundary when no store URL is configured.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use srd_grounding::config::{Config, PathsConfig, ServerConfig, StoreConfig};
use srd_grounding::models::ClassDocument;
use srd_grounding::{cache, reconcile, server, store, upsert};

fn repo_file(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn shipped_corpus() -> Vec<ClassDocument> {
    let mut docs = Vec::new();
    for name in ["barbarian", "bard", "fighter", "wizard"] {
        let raw =
            std::fs::read_to_string(repo_file(&format!("data/srd/classes/{}.json", name))).unwrap();
        docs.push(serde_json::from_str(&raw).unwrap());
    }
    docs
}

fn test_config(root: &Path, store_url: Option<String>) -> Config {
    Config {
        store: StoreConfig { url: store_url },
        paths: PathsConfig {
            data_dir: root.join("classes"),
            cache_dir: root.join("cache"),
            class_schema: repo_file("schemas/srd-class-5e-2014.json"),
        },
        server: ServerConfig {
            bind: "127.0.0.1:0".to_string(),
        },
    }
}

/// Populate a temp root: data dir with shipped class files, cache
/// artifacts, and (optionally) an ingested store.
async fn populate(root: &Path, with_store: bool) -> Option<String> {
    let data_dir = root.join("classes");
    std::fs::create_dir_all(&data_dir).unwrap();
    for name in ["barbarian", "bard", "fighter", "wizard"] {
        std::fs::copy(
            repo_file(&format!("data/srd/classes/{}.json", name)),
            data_dir.join(format!("{}.json", name)),
        )
        .unwrap();
    }

    let docs = shipped_corpus();

    if with_store {
        let url = format!("sqlite:{}", root.join("srd.sqlite").display());
        let pool = store::connect(&url).await.unwrap();
        store::ensure_collections(&pool).await.unwrap();
        reconcile::reconcile_indexes(&pool).await.unwrap();
        let (class_count, feature_count) = upsert::apply(&pool, &docs).await.unwrap();
        cache::emit(&root.join("cache"), &docs, class_count, feature_count).unwrap();
        pool.close().await;
        Some(url)
    } else {
        let feature_count: i64 = docs.iter().map(|d| d.feature_count()).sum();
        cache::emit(&root.join("cache"), &docs, docs.len() as i64, feature_count).unwrap();
        None
    }
}

async fn spawn_server(config: &Config) -> SocketAddr {
    let app = server::build(config).await.unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn get(addr: SocketAddr, path: &str) -> (u16, serde_json::Value) {
    let resp = reqwest::get(format!("http://{}{}", addr, path))
        .await
        .unwrap();
    let status = resp.status().as_u16();
    let body = resp.json().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), None);
    let addr = spawn_server(&config).await;

    let (status, body) = get(addr, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_meta_and_classes_served_from_cache() {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path(), false).await;
    let config = test_config(tmp.path(), None);
    let addr = spawn_server(&config).await;

    let (status, meta) = get(addr, "/meta").await;
    assert_eq!(status, 200);
    assert_eq!(meta["edition"], "5e-2014");
    assert_eq!(
        meta["classes"],
        serde_json::json!(["Barbarian", "Bard", "Fighter", "Wizard"])
    );

    let (status, classes) = get(addr, "/classes").await;
    assert_eq!(status, 200);
    assert_eq!(classes.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_meta_404_when_cache_absent() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), None);
    let addr = spawn_server(&config).await;

    let (status, body) = get(addr, "/meta").await;
    assert_eq!(status, 404);
    assert_eq!(body["status"], 404);
    assert!(body["detail"].as_str().unwrap().contains("Not found"));
}

#[tokio::test]
async fn test_meta_500_when_cache_unparseable() {
    let tmp = TempDir::new().unwrap();
    let cache_dir = tmp.path().join("cache");
    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(cache_dir.join("meta.json"), "{truncated").unwrap();
    let config = test_config(tmp.path(), None);
    let addr = spawn_server(&config).await;

    let (status, body) = get(addr, "/meta").await;
    assert_eq!(status, 500);
    assert!(body["detail"].as_str().unwrap().contains("Invalid JSON"));
}

#[tokio::test]
async fn test_class_lookup_uses_simple_slug() {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path(), false).await;
    let config = test_config(tmp.path(), None);
    let addr = spawn_server(&config).await;

    let (status, body) = get(addr, "/classes/fighter").await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "Fighter");

    // Display-cased input maps through the same rule.
    let (status, body) = get(addr, "/classes/Fighter").await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "Fighter");

    let (status, _) = get(addr, "/classes/paladin").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_feature_endpoints_degrade_to_503_without_store() {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path(), false).await;
    let config = test_config(tmp.path(), None);
    let addr = spawn_server(&config).await;

    // Cache-backed endpoints stay up.
    let (status, _) = get(addr, "/meta").await;
    assert_eq!(status, 200);
    let (status, _) = get(addr, "/classes").await;
    assert_eq!(status, 200);

    // Store-backed endpoints degrade.
    let (status, body) = get(addr, "/classes/fighter/features?level=1").await;
    assert_eq!(status, 503);
    assert!(body["detail"].as_str().unwrap().contains("not configured"));

    let (status, _) = get(addr, "/features/any-slug").await;
    assert_eq!(status, 503);
}

#[tokio::test]
async fn test_class_features_by_level() {
    let tmp = TempDir::new().unwrap();
    let url = populate(tmp.path(), true).await;
    let config = test_config(tmp.path(), url);
    let addr = spawn_server(&config).await;

    let (status, body) = get(addr, "/classes/fighter/features?level=1").await;
    assert_eq!(status, 200);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    // Sorted by name.
    assert_eq!(names, vec!["Fighting Style", "Second Wind"]);
    assert_eq!(body[1]["slug"], "fighter-second-wind-l1");
}

#[tokio::test]
async fn test_class_features_level_bounds_and_missing() {
    let tmp = TempDir::new().unwrap();
    let url = populate(tmp.path(), true).await;
    let config = test_config(tmp.path(), url);
    let addr = spawn_server(&config).await;

    let (status, _) = get(addr, "/classes/fighter/features?level=25").await;
    assert_eq!(status, 400);

    let (status, _) = get(addr, "/classes/fighter/features").await;
    assert_eq!(status, 400);

    // Valid level with no rows.
    let (status, _) = get(addr, "/classes/fighter/features?level=19").await;
    assert_eq!(status, 404);

    let (status, _) = get(addr, "/classes/paladin/features?level=1").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_feature_by_slug() {
    let tmp = TempDir::new().unwrap();
    let url = populate(tmp.path(), true).await;
    let config = test_config(tmp.path(), url);
    let addr = spawn_server(&config).await;

    let (status, body) = get(addr, "/features/barbarian-rage-2-long-rest-l1").await;
    assert_eq!(status, 200);
    assert_eq!(body["class_name"], "Barbarian");
    assert_eq!(body["slug"], "barbarian-rage-2-long-rest-l1");
    assert_eq!(body["level"], 1);
    assert_eq!(body["meta"]["import_version"], 1);

    let (status, _) = get(addr, "/features/no-such-slug-l1").await;
    assert_eq!(status, 404);
}
