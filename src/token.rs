//! Bearer token caching for ingestion endpoints secured with Microsoft Entra ID.

use crate::error::{AuthenticationError, BoxError, Error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{fmt, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Scope a token must be issued for to be accepted by the ingestion service.
pub const INGESTION_SCOPE: &str = "https://monitor.azure.com//.default";

/// Tokens are refreshed this long before they expire, so a token never expires mid-request.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// A bearer token and the instant it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The token, sent as `Authorization: Bearer <token>`.
    pub token: String,
    /// When the token expires.
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    /// Create a new token.
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        AccessToken {
            token: token.into(),
            expires_on,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens, e.g. a managed identity or a service principal.
///
/// The publisher calls it with [`INGESTION_SCOPE`] whenever its cached token is missing or about
/// to expire.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Acquire a new token for the given scope.
    async fn get_token(
        &self,
        scope: &str,
        cancel: &CancellationToken,
    ) -> Result<AccessToken, BoxError>;
}

#[async_trait]
impl<T: TokenCredential + ?Sized> TokenCredential for Arc<T> {
    async fn get_token(
        &self,
        scope: &str,
        cancel: &CancellationToken,
    ) -> Result<AccessToken, BoxError> {
        (**self).get_token(scope, cancel).await
    }
}

/// Caches the token of a [`TokenCredential`] until shortly before it expires.
///
/// Concurrent callers that find the cache stale queue on one lock, so only the first one acquires
/// a token and everybody else reuses it.
pub(crate) struct TokenCache {
    credential: Arc<dyn TokenCredential>,
    refresh_margin: Duration,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub(crate) fn new(credential: Arc<dyn TokenCredential>, refresh_margin: Duration) -> Self {
        TokenCache {
            credential,
            refresh_margin,
            cached: Mutex::new(None),
        }
    }

    pub(crate) async fn get_token(&self, cancel: &CancellationToken) -> Result<String, Error> {
        let mut cached = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            cached = self.cached.lock() => cached,
        };

        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if is_fresh(token, now, self.refresh_margin) {
                return Ok(token.token.clone());
            }
        }

        debug!("Acquiring bearer token");
        let token = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            token = self.credential.get_token(INGESTION_SCOPE, cancel) => token,
        }
        .map_err(AuthenticationError::Credential)?;

        if token.expires_on <= Utc::now() {
            return Err(AuthenticationError::Expired {
                expires_on: token.expires_on,
            }
            .into());
        }

        debug!(expires_on = %token.expires_on, "Acquired bearer token");
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("refresh_margin", &self.refresh_margin)
            .finish()
    }
}

fn is_fresh(token: &AccessToken, now: DateTime<Utc>, margin: Duration) -> bool {
    match chrono::Duration::from_std(margin) {
        Ok(margin) => token
            .expires_on
            .checked_sub_signed(margin)
            .map_or(false, |refresh_at| refresh_at > now),
        Err(_) => false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hands out tokens with a fixed lifetime and counts acquisitions.
    #[derive(Debug)]
    pub(crate) struct CountingCredential {
        pub(crate) calls: AtomicUsize,
        pub(crate) lifetime: chrono::Duration,
        pub(crate) delay: Duration,
    }

    impl CountingCredential {
        pub(crate) fn new(lifetime: chrono::Duration) -> Self {
            CountingCredential {
                calls: AtomicUsize::new(0),
                lifetime,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl TokenCredential for CountingCredential {
        async fn get_token(
            &self,
            scope: &str,
            _cancel: &CancellationToken,
        ) -> Result<AccessToken, BoxError> {
            assert_eq!(INGESTION_SCOPE, scope);
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(AccessToken::new(format!("token-{}", n), Utc::now() + self.lifetime))
        }
    }

    struct FailingCredential;

    #[async_trait]
    impl TokenCredential for FailingCredential {
        async fn get_token(
            &self,
            _scope: &str,
            _cancel: &CancellationToken,
        ) -> Result<AccessToken, BoxError> {
            Err("no identity available".into())
        }
    }

    #[tokio::test]
    async fn caches_token_within_validity() {
        let credential = Arc::new(CountingCredential::new(chrono::Duration::hours(1)));
        let cache = TokenCache::new(credential.clone(), DEFAULT_REFRESH_MARGIN);
        let cancel = CancellationToken::new();

        assert_eq!("token-1", cache.get_token(&cancel).await.unwrap());
        assert_eq!("token-1", cache.get_token(&cancel).await.unwrap());
        assert_eq!(1, credential.calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn refreshes_token_inside_margin() {
        // Valid for two more minutes, which is inside the five minute margin.
        let credential = Arc::new(CountingCredential::new(chrono::Duration::minutes(2)));
        let cache = TokenCache::new(credential.clone(), DEFAULT_REFRESH_MARGIN);
        let cancel = CancellationToken::new();

        assert_eq!("token-1", cache.get_token(&cancel).await.unwrap());
        assert_eq!("token-2", cache.get_token(&cancel).await.unwrap());
        assert_eq!(2, credential.calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn margin_beyond_calendar_range_always_refreshes() {
        let credential = Arc::new(CountingCredential::new(chrono::Duration::hours(1)));
        let margin = Duration::from_secs(300_000 * 366 * 86_400);
        let cache = TokenCache::new(credential.clone(), margin);
        let cancel = CancellationToken::new();

        assert_eq!("token-1", cache.get_token(&cancel).await.unwrap());
        assert_eq!("token-2", cache.get_token(&cancel).await.unwrap());
        assert_eq!(2, credential.calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let credential = Arc::new(CountingCredential::new(chrono::Duration::seconds(-1)));
        let cache = TokenCache::new(credential, DEFAULT_REFRESH_MARGIN);

        let err = cache.get_token(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Authentication(AuthenticationError::Expired { .. })
        ));
    }

    #[tokio::test]
    async fn credential_failure_is_authentication_error() {
        let cache = TokenCache::new(Arc::new(FailingCredential), DEFAULT_REFRESH_MARGIN);

        let err = cache.get_token(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Authentication(AuthenticationError::Credential(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_refreshes_acquire_once() {
        let credential = Arc::new(CountingCredential {
            delay: Duration::from_millis(50),
            ..CountingCredential::new(chrono::Duration::hours(1))
        });
        let cache = Arc::new(TokenCache::new(credential.clone(), DEFAULT_REFRESH_MARGIN));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_token(&CancellationToken::new()).await })
            })
            .collect();
        for handle in handles {
            assert_eq!("token-1", handle.await.unwrap().unwrap());
        }
        assert_eq!(1, credential.calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancelled_before_acquiring() {
        let credential = Arc::new(CountingCredential::new(chrono::Duration::hours(1)));
        let cache = TokenCache::new(credential.clone(), DEFAULT_REFRESH_MARGIN);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(matches!(
            cache.get_token(&cancel).await,
            Err(Error::Cancelled)
        ));
        assert_eq!(0, credential.calls.load(Ordering::SeqCst));
    }
}
