// src/cache/tests/mod.rs

mod monitor_tests;
mod redis_tests;

// Common utilities for backend tests
pub(crate) mod common {
    use std::time::Duration;
    use tokio::time;

    use crate::cache::CacheBackend;
    use crate::error::CacheError;

    // Basic operations that should work on any backend
    pub async fn test_basic_operations<B: CacheBackend>(backend: &B) -> Result<(), CacheError> {
        let key = "test_basic_key";
        let ttl = Duration::from_secs(60);

        backend.connect().await?;
        backend.ping().await?;

        // Missing key
        backend.delete(key).await?;
        assert_eq!(backend.get(key).await?, None);

        // Set and get
        backend.set(key, "41", ttl).await?;
        assert_eq!(backend.get(key).await?.as_deref(), Some("41"));

        // Overwrite
        backend.set(key, "42", ttl).await?;
        assert_eq!(backend.get(key).await?.as_deref(), Some("42"));

        // Delete reports whether the key existed
        assert!(backend.delete(key).await?);
        assert!(!backend.delete(key).await?);
        assert_eq!(backend.get(key).await?, None);

        Ok(())
    }

    // Expiry with a caller-chosen TTL and wait
    pub async fn test_key_expiration<B: CacheBackend>(
        backend: &B,
        ttl: Duration,
        wait: Duration,
    ) -> Result<(), CacheError> {
        let key = "test_expiry_key";

        backend.connect().await?;
        backend.set(key, "7", ttl).await?;
        assert_eq!(backend.get(key).await?.as_deref(), Some("7"));

        time::sleep(wait).await;

        assert_eq!(backend.get(key).await?, None);
        Ok(())
    }
}
