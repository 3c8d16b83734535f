use std::env;
use std::time::Duration;

use employee_events::BrokerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cache_backend: CacheBackend,
    pub redis_url: String,
    /// Optional namespace prepended to every Redis key (e.g. "hub:").
    pub cache_prefix: String,
    pub cache_ttl: Duration,
    pub hr_service_url: String,
    pub hr_service_timeout: Duration,
    /// Page size used when walking the HR listing for country-wide views.
    pub hr_page_size: u32,
    /// Upper bound for one message's invalidate + broadcast; expired work is requeued.
    pub processing_timeout: Duration,
    /// Redis channel carrying notification frames between processes.
    pub notify_channel: String,
    /// Whether `serve` also consumes employee events in-process.
    pub consumer_enabled: bool,
    pub broker: BrokerConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let cache_backend = match env::var("CACHE_STORE")
            .unwrap_or_else(|_| "redis".to_string())
            .to_lowercase()
            .as_str()
        {
            "redis" => CacheBackend::Redis,
            "memory" | "array" => CacheBackend::Memory,
            other => anyhow::bail!("Unsupported CACHE_STORE '{}' (expected redis or memory)", other),
        };

        Ok(Self {
            port: env_parse("PORT", 8000),
            cache_backend,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            cache_prefix: env::var("CACHE_PREFIX").unwrap_or_default(),
            cache_ttl: Duration::from_secs(env_parse("CACHE_TTL_SECS", 60)),
            hr_service_url: env::var("HR_SERVICE_URL")
                .unwrap_or_else(|_| "http://hr-service:8000".to_string())
                .trim_end_matches('/')
                .to_string(),
            hr_service_timeout: Duration::from_secs(env_parse("HR_SERVICE_TIMEOUT_SECS", 10)),
            hr_page_size: env_parse::<u32>("HR_PAGE_SIZE", 100).clamp(1, 100),
            processing_timeout: Duration::from_secs(env_parse("PROCESSING_TIMEOUT_SECS", 30)),
            notify_channel: env::var("NOTIFY_CHANNEL")
                .unwrap_or_else(|_| "hub.notifications".to_string()),
            consumer_enabled: env_parse("CONSUMER_ENABLED", true),
            broker: BrokerConfig::from_env(),
        })
    }

    /// Standalone workers invalidate and notify other processes, which only
    /// works when the cache and the notification fan-out live in Redis.
    pub fn ensure_shared_cache(&self, command: &str) -> anyhow::Result<()> {
        match self.cache_backend {
            CacheBackend::Redis => Ok(()),
            CacheBackend::Memory => anyhow::bail!(
                "`{}` needs CACHE_STORE=redis: an in-process cache is private to this process; \
                 run `serve` to consume events next to the in-memory cache",
                command
            ),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
