//! Business logic services

pub mod auth;
pub mod clock;
pub mod collection;
pub mod events;
pub mod id_generator;
pub mod redis;

use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult, repository::BookStore};

use self::{
    clock::Clock,
    events::{BroadcastDispatcher, EventDispatcher, FanOutDispatcher},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: collection::BookCollection,
    /// In-process event feed, also one of the catalog's dispatch targets
    pub events: BroadcastDispatcher,
    pub store: Arc<dyn BookStore>,
}

impl Services {
    /// Create all services on top of the given store and clock
    pub async fn new(
        store: Arc<dyn BookStore>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> AppResult<Self> {
        let broadcast = BroadcastDispatcher::new(config.events.channel_capacity);
        let mut dispatcher = FanOutDispatcher::new().with(Arc::new(broadcast.clone()));

        if let (Some(url), Some(channel)) = (&config.redis.url, &config.events.redis_channel) {
            let publisher = redis::RedisEventPublisher::connect(url, channel.as_str()).await?;
            tracing::info!(channel = %channel, "Publishing book events to Redis");
            dispatcher = dispatcher.with(Arc::new(publisher));
        }

        let events: Arc<dyn EventDispatcher> = Arc::new(dispatcher);
        let ids = id_generator::IdGenerator::new(store.clone(), config.identifiers.max_attempts);

        Ok(Self {
            auth: auth::AuthService::new(config.auth.clone()),
            catalog: collection::BookCollection::new(store.clone(), ids, events, clock),
            events: broadcast,
            store,
        })
    }
}
