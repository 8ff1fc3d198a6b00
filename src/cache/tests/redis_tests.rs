// src/cache/tests/redis_tests.rs
//
// These tests need a Redis on localhost:6379 and skip themselves otherwise.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_test::traced_test;

use crate::cache::{CacheBackend, CacheClient, ConnectionState, RedisBackend};
use crate::config::CacheConfig;
use crate::error::CacheError;

fn local_config(timeout: Duration) -> CacheConfig {
    CacheConfig {
        host: "localhost".to_string(),
        port: 6379,
        timeout,
        ..CacheConfig::default()
    }
}

// Helper to check if Redis is available
async fn is_redis_available() -> bool {
    match RedisBackend::new(&local_config(Duration::from_millis(300))) {
        Ok(redis) => redis.connect().await.is_ok() && redis.ping().await.is_ok(),
        Err(_) => false,
    }
}

async fn create_test_redis() -> RedisBackend {
    let redis = RedisBackend::new(&local_config(Duration::from_secs(1)))
        .expect("Failed to create Redis client");
    redis.connect().await.expect("Failed to connect to Redis");
    redis
}

#[test]
fn test_redis_url_from_config() {
    let redis = RedisBackend::new(&local_config(Duration::from_secs(1))).unwrap();
    assert_eq!(redis.url(), "redis://localhost:6379");
}

#[tokio::test]
async fn test_commands_before_connect_fail() {
    let redis = RedisBackend::new(&local_config(Duration::from_millis(100))).unwrap();

    assert!(matches!(
        redis.get("key").await,
        Err(CacheError::Connection(_))
    ));
    assert!(matches!(redis.ping().await, Err(CacheError::Connection(_))));
}

#[tokio::test]
async fn test_unreachable_redis_leaves_client_disconnected() {
    // Nothing listens on port 1
    let config = CacheConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        timeout: Duration::from_millis(300),
        ..CacheConfig::default()
    };
    let client = CacheClient::new(Arc::new(RedisBackend::new(&config).unwrap()));

    let result = client.connect().await;

    assert!(result.is_err());
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(client.get("counter:main").await, None);
    assert!(client.set("counter:main", "1", Duration::from_secs(1)).await.is_ok());
}

#[tokio::test]
#[traced_test]
async fn test_refused_connection_is_classified() {
    let config = CacheConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..CacheConfig::default()
    };
    let client = CacheClient::new(Arc::new(RedisBackend::new(&config).unwrap()));

    let start = Instant::now();
    let err = client.connect().await.unwrap_err();

    assert!(err.is_connection_refused(), "unexpected error: {:?}", err);
    // Fails fast rather than running into the connect timeout
    assert!(start.elapsed() < config.timeout);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(logs_contain("Cache backend connection refused"));
}

#[tokio::test]
async fn test_redis_basic_operations() {
    if !is_redis_available().await {
        println!("Redis not available, skipping test_redis_basic_operations");
        return;
    }

    let redis = create_test_redis().await;
    let result = super::common::test_basic_operations(&redis).await;
    assert!(result.is_ok(), "Basic Redis operations failed: {:?}", result);
}

#[tokio::test]
async fn test_redis_key_expiration() {
    if !is_redis_available().await {
        println!("Redis not available, skipping test_redis_key_expiration");
        return;
    }

    // Redis TTLs are whole seconds
    let redis = create_test_redis().await;
    let result = super::common::test_key_expiration(
        &redis,
        Duration::from_secs(1),
        Duration::from_secs(2),
    )
    .await;
    assert!(result.is_ok(), "Redis key expiration failed: {:?}", result);
}

#[tokio::test]
async fn test_sub_second_ttl_is_rounded_up() {
    if !is_redis_available().await {
        println!("Redis not available, skipping test_sub_second_ttl_is_rounded_up");
        return;
    }

    let redis = create_test_redis().await;
    let key = "test_redis_sub_second_ttl";

    redis
        .set(key, "1", Duration::from_millis(10))
        .await
        .expect("SETEX with a sub-second TTL should succeed");
    assert_eq!(redis.get(key).await.unwrap().as_deref(), Some("1"));

    redis.delete(key).await.unwrap();
}

#[tokio::test]
async fn test_close_releases_connection() {
    if !is_redis_available().await {
        println!("Redis not available, skipping test_close_releases_connection");
        return;
    }

    let redis = create_test_redis().await;
    redis.close().await;

    assert!(redis.ping().await.is_err());
}
