use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved attribute key holding an asset's cache info
pub const CACHE: &str = "cache";

/// Key of the cache token inside the cache info map
pub const CACHE_TOKEN: &str = "cache_token";

/// Key of the invalidation marker inside the cache info map
pub const INVALIDATION: &str = "invalidation";

/// Invalidation state written by an explicit invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Invalidation {
    Invalidated,
}

/// Cache bookkeeping kept under the `cache` attribute of an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheInfo {
    pub last_verified: DateTime<Utc>,
    pub cache_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalidation: Option<Invalidation>,
}

impl CacheInfo {
    pub fn new<S: Into<String>>(last_verified: DateTime<Utc>, cache_token: S) -> Self {
        Self {
            last_verified,
            cache_token: cache_token.into(),
            invalidation: None,
        }
    }

    /// Cache info verified right now
    pub fn now<S: Into<String>>(cache_token: S) -> Self {
        Self::new(Utc::now(), cache_token)
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidation.is_some()
    }

    /// Attribute form stored under [`CACHE`]
    pub fn to_map(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Decode from the attribute form; `None` when absent or malformed
    pub fn from_map(value: Option<&Value>) -> Option<Self> {
        value.and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Map merged over existing cache info to invalidate it
    pub fn invalidated_overlay() -> Value {
        let mut map = Map::new();
        map.insert(
            INVALIDATION.to_string(),
            serde_json::to_value(Invalidation::Invalidated).unwrap_or(Value::Null),
        );
        Value::Object(map)
    }
}

/// Decides whether cached content must be revalidated
pub trait CacheController: Send + Sync {
    fn is_stale(&self, info: &CacheInfo) -> bool;
}

/// Staleness by age and token.
///
/// Stale when invalidated, when the token differs from `current_token`, or
/// when the entry was verified longer than `max_age` ago. A `None` max age
/// never expires.
#[derive(Debug, Clone)]
pub struct TtlCacheController {
    pub max_age: Option<Duration>,
    pub current_token: Option<String>,
}

impl TtlCacheController {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
            current_token: None,
        }
    }

    pub fn never_expires() -> Self {
        Self {
            max_age: None,
            current_token: None,
        }
    }

    pub fn with_current_token<S: Into<String>>(mut self, token: S) -> Self {
        self.current_token = Some(token.into());
        self
    }

    fn is_expired(&self, info: &CacheInfo, now: DateTime<Utc>) -> bool {
        // An expiry past the representable range never comes
        match self.max_age.and_then(|max_age| info.last_verified.checked_add_signed(max_age)) {
            Some(expires_at) => expires_at < now,
            None => false,
        }
    }
}

impl CacheController for TtlCacheController {
    fn is_stale(&self, info: &CacheInfo) -> bool {
        if info.is_invalidated() {
            return true;
        }
        if let Some(token) = &self.current_token {
            if token != &info.cache_token {
                return true;
            }
        }
        self.is_expired(info, Utc::now())
    }
}
