use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::storage::{KvStore, StorageError};

/// Key-value store backed by Redis. The multiplexed connection is cheap to
/// clone, so each call works on its own handle.
#[derive(Clone)]
pub struct RedisKvStore {
    connection: MultiplexedConnection,
}

impl RedisKvStore {
    pub async fn connect(client: &redis::Client) -> Result<Self, StorageError> {
        let connection = client.get_multiplexed_async_connection().await?;
        info!("Redis connection established");
        Ok(Self { connection })
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(key, value).await?;
        debug!("SET {key} ({} bytes)", value.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.connection.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }
}
