use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Expiry of an access token: a unix timestamp, or a sentinel meaning the
/// provider never said ("unknown") or the token never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndOfLife {
    /// The provider did not communicate a lifetime. Treated as valid
    /// until explicitly invalidated.
    Unknown,
    /// The token never expires.
    Never,
    /// Expires at the given unix timestamp (seconds).
    At(u64),
}

impl EndOfLife {
    /// Wire sentinel for an unknown end of life.
    pub const UNKNOWN_SENTINEL: i64 = -9;
    /// Wire sentinel for a token that never expires.
    pub const NEVER_SENTINEL: i64 = -1;

    /// Derive an end of life from a provider's `expires_in` (seconds from
    /// now), falling back to `default` when the provider omitted it.
    pub fn from_expires_in(expires_in: Option<u64>, default: EndOfLife) -> EndOfLife {
        match expires_in {
            Some(secs) => EndOfLife::At(unix_now() + secs),
            None => default,
        }
    }

    /// The timestamp-or-sentinel wire value: the timestamp itself, `-9`
    /// for unknown, `-1` for never. This encoding is a compatibility
    /// surface for callers persisting token state.
    pub fn as_timestamp(&self) -> i64 {
        match self {
            EndOfLife::Unknown => Self::UNKNOWN_SENTINEL,
            EndOfLife::Never => Self::NEVER_SENTINEL,
            EndOfLife::At(ts) => *ts as i64,
        }
    }

    /// Whether the given instant is past this end of life. Sentinels
    /// never expire.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self {
            EndOfLife::Unknown | EndOfLife::Never => false,
            EndOfLife::At(ts) => now >= *ts,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// An access credential issued by a provider. Immutable once issued;
/// a refresh replaces the whole token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    access_token: String,
    refresh_token: Option<String>,
    end_of_life: EndOfLife,
    extra_params: serde_json::Map<String, serde_json::Value>,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            end_of_life: EndOfLife::Unknown,
            extra_params: serde_json::Map::new(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_end_of_life(mut self, end_of_life: EndOfLife) -> Self {
        self.end_of_life = end_of_life;
        self
    }

    pub fn with_extra_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extra_params.insert(key.into(), value.into());
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn end_of_life(&self) -> EndOfLife {
        self.end_of_life
    }

    pub fn extra_params(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.extra_params
    }

    /// A string extra parameter, if present (e.g. `oauth_token_secret`
    /// for OAuth 1.0a tokens).
    pub fn extra_param(&self, key: &str) -> Option<&str> {
        self.extra_params.get(key).and_then(|v| v.as_str())
    }

    pub fn is_expired(&self) -> bool {
        self.end_of_life.is_expired_at(unix_now())
    }
}
