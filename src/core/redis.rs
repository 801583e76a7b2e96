use std::sync::{Arc, OnceLock};

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError, Script};
use tokio::sync::RwLock;

const FIXED_WINDOW_SCRIPT: &str = r#"
local current = redis.call("INCR", KEYS[1])
if current == 1 then
    redis.call("EXPIRE", KEYS[1], ARGV[1])
end
return current
"#;

static FIXED_WINDOW: OnceLock<Script> = OnceLock::new();

/// Optional Redis connection. Every caller must keep working while it is disconnected.
#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        *self.manager.write().await = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        *self.manager.write().await = None;
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let Some(mut manager) = self.current().await else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// Fixed-window counter. Returns `Ok(true)` while the caller is within `limit`
    /// hits for the current window, and always when Redis is not connected.
    pub(crate) async fn rate_limit(
        &self,
        key: &str,
        limit: u64,
        window_seconds: u64,
    ) -> Result<bool, RedisError> {
        let Some(mut manager) = self.current().await else {
            return Ok(true);
        };

        let script = FIXED_WINDOW.get_or_init(|| Script::new(FIXED_WINDOW_SCRIPT));
        let current: i64 =
            script.key(key).arg(window_seconds as i64).invoke_async(&mut manager).await?;

        Ok(current <= limit as i64)
    }

    async fn current(&self) -> Option<ConnectionManager> {
        self.manager.read().await.clone()
    }
}

pub(crate) fn essay_evaluation_key(user_id: &str) -> String {
    format!("rate-limit:essay-evaluation:{user_id}")
}

#[cfg(test)]
mod tests {
    use super::{essay_evaluation_key, RedisHandle};
    use crate::core::config::Settings;
    use crate::test_support;
    use uuid::Uuid;

    #[tokio::test]
    async fn rate_limit_enforces_limit() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        test_support::reset_redis(settings.redis().redis_url()).await.expect("redis reset");

        let redis = RedisHandle::new(settings.redis().redis_url());
        redis.connect().await.expect("redis connect");

        let key = essay_evaluation_key(&Uuid::new_v4().to_string());
        assert!(redis.rate_limit(&key, 2, 5).await.expect("rate limit"));
        assert!(redis.rate_limit(&key, 2, 5).await.expect("rate limit"));
        assert!(!redis.rate_limit(&key, 2, 5).await.expect("rate limit"));
    }

    #[tokio::test]
    async fn rate_limit_allows_when_disconnected() {
        let redis = RedisHandle::new("redis://127.0.0.1:1/0".to_string());
        let allowed = redis.rate_limit("rate-limit:any", 0, 60).await.expect("no redis");
        assert!(allowed);
    }
}
