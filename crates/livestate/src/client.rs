use super::*;
use redis::AsyncCommands;
use spin_core::*;
use spin_records::Match;

/// Redis client for live snapshots and per-match event fanout.
///
/// The live layer is best-effort: a write or delete failure logs a
/// warning and returns as if it succeeded, so a Redis outage never
/// aborts a durable transaction. Reads degrade to None, which callers
/// treat as "no snapshot yet".
#[derive(Clone)]
pub struct Live {
    client: redis::Client,
}

impl Live {
    pub fn from_env() -> Self {
        const REDIS_URL: &str = "redis://localhost:6379";
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| String::from(REDIS_URL));
        let client = redis::Client::open(url).expect("Redis client to connect");
        Self { client }
    }

    /// Snapshot key for a match.
    pub fn key(id: ID<Match>) -> String {
        format!("match:{}:state", id)
    }
    /// Pub/sub channel carrying the identical JSON payload on every write.
    pub fn channel(id: ID<Match>) -> String {
        format!("match:{}:events", id)
    }

    /// Upserts the snapshot with a 24 h expiry and publishes it to the
    /// match channel.
    pub async fn write(&self, id: ID<Match>, state: &LiveState) {
        let payload = match serde_json::to_string(state) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("[live] snapshot encode failed for {}: {}", id, e);
                return;
            }
        };
        if let Err(e) = self.publish(id, payload).await {
            log::warn!("[live] snapshot write failed for {}: {}", id, e);
        }
    }
    async fn publish(&self, id: ID<Match>, payload: String) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<String, &str, ()>(Self::key(id), &payload, LIVE_TTL_SECS)
            .await?;
        conn.publish::<String, &str, ()>(Self::channel(id), &payload)
            .await?;
        Ok(())
    }

    /// Latest snapshot, normalized; None when missing, expired, or Redis
    /// is unreachable.
    pub async fn read(&self, id: ID<Match>) -> Option<LiveState> {
        let payload = match self.fetch(id).await {
            Ok(payload) => payload?,
            Err(e) => {
                log::warn!("[live] snapshot read failed for {}: {}", id, e);
                return None;
            }
        };
        match serde_json::from_str::<LiveState>(&payload) {
            Ok(state) => Some(state.normalize()),
            Err(e) => {
                log::warn!("[live] snapshot decode failed for {}: {}", id, e);
                None
            }
        }
    }
    async fn fetch(&self, id: ID<Match>) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.get::<String, Option<String>>(Self::key(id)).await
    }

    /// Deletes the snapshot after a match finishes. The durable record
    /// remains the source of truth for history.
    pub async fn clear(&self, id: ID<Match>) {
        let result: Result<(), redis::RedisError> = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            conn.del::<String, ()>(Self::key(id)).await
        }
        .await;
        if let Err(e) = result {
            log::warn!("[live] snapshot clear failed for {}: {}", id, e);
        }
    }

    /// Subscribes to a match's event channel. Unlike the write path this
    /// propagates errors so the socket bridge can fall back to polling.
    pub async fn subscribe(&self, id: ID<Match>) -> Result<redis::aio::PubSub, redis::RedisError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(Self::channel(id)).await?;
        Ok(pubsub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn keys_embed_match_id() {
        let id = ID::<Match>::default();
        assert_eq!(Live::key(id), format!("match:{}:state", id));
        assert_eq!(Live::channel(id), format!("match:{}:events", id));
    }
}
