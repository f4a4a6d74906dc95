//! Redis adapter for the TTL cache, over a multiplexed connection manager
//! that reconnects on its own. Callers treat every failure here as a cache
//! miss; nothing above this layer retries.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::config::RedisConfig;
use crate::error::NewstrendsError;

use super::TrendCache;

pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connect once at startup; failure here is fatal.
    pub async fn connect(config: &RedisConfig) -> Result<Self, NewstrendsError> {
        let client = redis::Client::open(config.url())?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl TrendCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, NewstrendsError> {
        let mut conn = self.manager.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), NewstrendsError> {
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), NewstrendsError> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
