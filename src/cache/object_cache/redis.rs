use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult, aio::MultiplexedConnection};
use tracing::{debug, error, warn};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::errors::{ClassworkError, Result};

const SCAN_BATCH: usize = 500;

/// Redis 后端；所有键都加上配置的前缀，多路复用连接在各请求间共享
pub struct RedisObjectCache {
    conn: MultiplexedConnection,
    key_prefix: String,
    default_ttl: u64,
}

impl RedisObjectCache {
    /// 连接并 PING 一次，失败时返回 CacheConnection，启动流程据此回退到内存缓存
    pub async fn connect() -> Result<Self> {
        let config = AppConfig::get();
        let redis_config = &config.cache.redis;
        let unavailable = |e: redis::RedisError| {
            ClassworkError::cache_connection(format!("Redis unavailable: {e}"))
        };

        let client = redis::Client::open(redis_config.url.as_str()).map_err(unavailable)?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        debug!(
            "Redis cache ready (prefix '{}', ttl {}s)",
            redis_config.key_prefix, config.cache.default_ttl
        );
        Ok(Self {
            conn,
            key_prefix: redis_config.key_prefix.clone(),
            default_ttl: config.cache.default_ttl,
        })
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    // SCAN 遍历前缀下的键，避免 KEYS 阻塞服务器
    async fn prefixed_keys(&self) -> RedisResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.key_prefix);
        let mut cursor = 0u64;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                return Ok(keys);
            }
            cursor = next;
        }
    }
}

#[async_trait]
impl ObjectCache for RedisObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(self.prefixed(key)).await {
            Ok(Some(data)) => CacheResult::Found(data),
            Ok(None) => CacheResult::NotFound,
            Err(e) => {
                warn!("Redis GET {} failed: {}", key, e);
                CacheResult::ExistsButNoValue
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let ttl = if ttl == 0 { self.default_ttl } else { ttl };
        let mut conn = self.conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(self.prefixed(&key), value, ttl)
            .await
        {
            error!("Redis SETEX {} failed: {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.del::<_, ()>(self.prefixed(key)).await {
            error!("Redis DEL {} failed: {}", key, e);
        }
    }

    async fn invalidate_all(&self) {
        let keys = match self.prefixed_keys().await {
            Ok(keys) if keys.is_empty() => return,
            Ok(keys) => keys,
            Err(e) => {
                error!("Redis SCAN under '{}' failed: {}", self.key_prefix, e);
                return;
            }
        };

        let mut conn = self.conn.clone();
        let total = keys.len();
        for chunk in keys.chunks(SCAN_BATCH) {
            if let Err(e) = conn.del::<_, ()>(chunk.to_vec()).await {
                error!("Redis DEL batch failed: {}", e);
                return;
            }
        }
        debug!("Invalidated {} redis keys", total);
    }
}
