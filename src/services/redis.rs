//! Redis pub/sub publisher for book events

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use super::events::EventDispatcher;
use crate::{
    error::{AppError, AppResult},
    models::BookEvent,
};

#[derive(Clone)]
pub struct RedisEventPublisher {
    connection: ConnectionManager,
    channel: String,
}

impl RedisEventPublisher {
    /// Connect to Redis and check the connection
    pub async fn connect(url: &str, channel: impl Into<String>) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut connection = ConnectionManager::new(client).await?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut connection)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self {
            connection,
            channel: channel.into(),
        })
    }
}

#[async_trait]
impl EventDispatcher for RedisEventPublisher {
    async fn dispatch(&self, event: BookEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(book_id = %event.book_id(), "Failed to serialize book event: {}", e);
                return;
            }
        };

        let mut connection = self.connection.clone();
        if let Err(e) = connection
            .publish::<_, _, ()>(&self.channel, payload)
            .await
        {
            tracing::warn!(
                book_id = %event.book_id(),
                event = event.kind(),
                channel = %self.channel,
                "Failed to publish book event to Redis: {}",
                e
            );
        }
    }
}
