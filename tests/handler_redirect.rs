mod common;

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use surl::domain::entities::UrlEntry;
use surl::domain::repositories::Backend;
use surl::infrastructure::cache::{MemoryCache, NullCache};
use surl::infrastructure::invalidation::{ChangeSignal, spawn_flush_listener};
use surl::utils::snowflake::IdGenerator;

#[tokio::test]
async fn redirect_success() {
    let backend = common::memory_shard(0);
    let id = common::seed(&backend, "https://example.com/target", None).await;

    let resolver = common::build_resolver(vec![backend as Arc<dyn Backend>], Arc::new(NullCache::new()));
    let server = common::test_server(common::test_state(resolver, None));

    let response = server.get(&format!("/{}", id.to_base58())).await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let backend = common::memory_shard(0);
    let resolver = common::build_resolver(vec![backend as Arc<dyn Backend>], Arc::new(NullCache::new()));
    let server = common::test_server(common::test_state(resolver, None));

    let response = server.get("/zzzzzzzz").await;

    response.assert_status_not_found();
    assert_eq!(response.text(), "not found");
}

#[tokio::test]
async fn malformed_id_is_not_found() {
    let backend = common::memory_shard(0);
    let resolver = common::build_resolver(vec![backend as Arc<dyn Backend>], Arc::new(NullCache::new()));
    let server = common::test_server(common::test_state(resolver, None));

    // '0', 'O', 'I', 'l' are outside the alphabet
    let response = server.get("/0OIl").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn expired_entry_is_not_found() {
    let backend = common::memory_shard(0);
    let generator = IdGenerator::new(0, common::EPOCH).unwrap();
    let id = generator.generate().unwrap();
    backend
        .insert(UrlEntry::new(
            id.to_raw(),
            "https://example.com/expired",
            Some(Utc::now().timestamp() - 10),
        ))
        .await
        .unwrap();

    let resolver = common::build_resolver(vec![backend as Arc<dyn Backend>], Arc::new(NullCache::new()));
    let server = common::test_server(common::test_state(resolver, None));

    let response = server.get(&format!("/{}", id.to_base58())).await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn strict_mode_checks_host_header() {
    let backend = common::memory_shard(0);
    let id = common::seed(&backend, "https://example.com/strict", None).await;

    let resolver = common::build_resolver(vec![backend as Arc<dyn Backend>], Arc::new(NullCache::new()));
    let server = common::test_server(common::test_state(
        resolver,
        Some("s.example.com".to_string()),
    ));
    let path = format!("/{}", id.to_base58());

    let wrong = server.get(&path).add_header("Host", "evil.example.com").await;
    wrong.assert_status_not_found();

    let right = server.get(&path).add_header("Host", "s.example.com").await;
    assert_eq!(right.status_code(), 302);
}

#[tokio::test]
async fn cached_entry_survives_deletion_until_flush() {
    let backend = common::memory_shard(0);
    let id = common::seed(&backend, "https://a.example/x", None).await;

    let cache = Arc::new(MemoryCache::new());
    let signal = ChangeSignal::new();
    let _listener = spawn_flush_listener(cache.clone(), &signal);

    let resolver = common::build_resolver(vec![backend.clone() as Arc<dyn Backend>], cache.clone());
    let server = common::test_server(common::test_state(resolver, None));
    let path = format!("/{}", id.to_base58());

    assert_eq!(server.get(&path).await.status_code(), 302);

    backend.delete(id.to_raw()).await.unwrap();

    // still cached
    assert_eq!(server.get(&path).await.status_code(), 302);

    signal.notify();
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if cache.is_empty() {
            break;
        }
    }

    server.get(&path).await.assert_status_not_found();
}

#[tokio::test]
async fn health_reports_shard_count() {
    let backends: Vec<Arc<dyn Backend>> = vec![
        common::memory_shard(0),
        common::memory_shard(1),
        common::memory_shard(2),
    ]
    .into_iter()
    .map(|b| b as Arc<dyn Backend>)
    .collect();
    let resolver = common::build_resolver(backends, Arc::new(NullCache::new()));
    let server = common::test_server(common::test_state(resolver, None));

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["shards"], 3);
}
