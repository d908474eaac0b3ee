//! 对象缓存层
//!
//! 目前用于缓存 access token 对应的用户信息，后端可选 moka（内存）或 redis。

pub mod object_cache;
pub mod register;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    /// 后端异常，无法判断键是否存在
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    /// ttl 为 0 时使用配置中的默认 TTL
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

/// JSON 序列化的便捷读写
#[async_trait]
pub trait ObjectCacheExt: ObjectCache {
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> CacheResult<T> {
        match self.get_raw(key).await {
            CacheResult::Found(raw) => match serde_json::from_str(&raw) {
                Ok(value) => CacheResult::Found(value),
                Err(e) => {
                    tracing::debug!("Dropping undecodable cache entry '{}': {}", key, e);
                    self.remove(key).await;
                    CacheResult::NotFound
                }
            },
            CacheResult::NotFound => CacheResult::NotFound,
            CacheResult::ExistsButNoValue => CacheResult::ExistsButNoValue,
        }
    }

    async fn insert_json<T: Serialize + Sync>(&self, key: String, value: &T, ttl: u64) {
        match serde_json::to_string(value) {
            Ok(raw) => self.insert_raw(key, raw, ttl).await,
            Err(e) => tracing::warn!("Failed to serialize cache entry '{}': {}", key, e),
        }
    }
}

impl<C: ObjectCache + ?Sized> ObjectCacheExt for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapCache {
        inner: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl ObjectCache for MapCache {
        async fn get_raw(&self, key: &str) -> CacheResult<String> {
            match self.inner.lock().unwrap().get(key) {
                Some(v) => CacheResult::Found(v.clone()),
                None => CacheResult::NotFound,
            }
        }

        async fn insert_raw(&self, key: String, value: String, _ttl: u64) {
            self.inner.lock().unwrap().insert(key, value);
        }

        async fn remove(&self, key: &str) {
            self.inner.lock().unwrap().remove(key);
        }

        async fn invalidate_all(&self) {
            self.inner.lock().unwrap().clear();
        }
    }

    #[tokio::test]
    async fn test_json_helpers_roundtrip() {
        let cache = MapCache::default();
        cache.insert_json("k".to_string(), &vec![1, 2, 3], 0).await;
        assert_eq!(
            cache.get_json::<Vec<i32>>("k").await,
            CacheResult::Found(vec![1, 2, 3])
        );
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_evicted() {
        let cache = MapCache::default();
        cache
            .insert_raw("k".to_string(), "not json".to_string(), 0)
            .await;
        assert_eq!(cache.get_json::<Vec<i32>>("k").await, CacheResult::NotFound);
        assert_eq!(cache.get_raw("k").await, CacheResult::NotFound);
    }
}
