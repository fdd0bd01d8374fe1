use std::sync::Mutex;

use crate::tokens::AccessToken;

/// Persists the current user's access token for the duration of a
/// session-equivalent scope.
///
/// Implementations own their thread-safety; the service takes no locks of
/// its own. If concurrent requests race on one store, last-write-wins is
/// acceptable.
pub trait TokenStore: Send + Sync {
    /// The currently stored token, if any.
    fn load(&self) -> Option<AccessToken>;

    /// Replace the stored token wholesale. A refresh must not silently
    /// shorten a known end of life; implementations should at least
    /// record when that happens.
    fn save(&self, token: AccessToken);

    /// Drop the stored token, returning the session to the
    /// unauthenticated state.
    fn clear(&self);
}

/// The default store: a single token behind a mutex, scoped to the
/// lifetime of the store itself.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<AccessToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with a token.
    pub fn with_token(token: AccessToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<AccessToken> {
        self.token.lock().unwrap().clone()
    }

    fn save(&self, token: AccessToken) {
        let mut slot = self.token.lock().unwrap();
        if let Some(previous) = slot.as_ref() {
            let old = previous.end_of_life().as_timestamp();
            let new = token.end_of_life().as_timestamp();
            if old > 0 && new > 0 && new < old {
                tracing::warn!(old, new, "replacement token shortens validity");
            }
        }
        *slot = Some(token);
    }

    fn clear(&self) {
        self.token.lock().unwrap().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::EndOfLife;

    #[test]
    fn starts_empty() {
        let store = MemoryTokenStore::new();
        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryTokenStore::new();
        let token = AccessToken::new("tok").with_refresh_token("rt");
        store.save(token.clone());
        assert_eq!(store.load(), Some(token));
    }

    #[test]
    fn save_replaces_wholesale() {
        let store = MemoryTokenStore::with_token(AccessToken::new("old").with_refresh_token("rt"));
        store.save(AccessToken::new("new"));

        let loaded = store.load().unwrap();
        assert_eq!(loaded.access_token(), "new");
        // The old refresh token does not leak into the replacement.
        assert!(loaded.refresh_token().is_none());
    }

    #[test]
    fn clear_forgets_the_token() {
        let store = MemoryTokenStore::with_token(AccessToken::new("tok"));
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn save_accepts_longer_lived_replacement() {
        let store = MemoryTokenStore::with_token(
            AccessToken::new("old").with_end_of_life(EndOfLife::At(1_000)),
        );
        store.save(AccessToken::new("new").with_end_of_life(EndOfLife::At(2_000)));
        assert_eq!(
            store.load().unwrap().end_of_life(),
            EndOfLife::At(2_000)
        );
    }
}
