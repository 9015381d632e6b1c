//! Delivery of batches to one ingestion endpoint.

use crate::{
    codec,
    connection_string::{Authorization, ConnectionString},
    error::{AuthenticationError, Error, ValidationError},
    tags::{merge_tags, ContextTagKey, Tags},
    telemetry::Telemetry,
    token::{TokenCache, TokenCredential, DEFAULT_REFRESH_MARGIN},
    uploader,
};
use http::{StatusCode, Uri};
use opentelemetry_http::HttpClient;
use std::{fmt, ops::Deref, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const TRACK_PATH: &str = "v2/track";

/// Immutable snapshot of records drained from the client by one publish call.
///
/// Cheap to clone; every publisher of a client sees the same batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch(Arc<[Telemetry]>);

impl Batch {
    /// The records in the order they were added.
    pub fn records(&self) -> &[Telemetry] {
        &self.0
    }

    /// Copy the records out, e.g. to add them to a client again.
    pub fn to_vec(&self) -> Vec<Telemetry> {
        self.0.to_vec()
    }
}

impl Deref for Batch {
    type Target = [Telemetry];

    fn deref(&self) -> &[Telemetry] {
        &self.0
    }
}

impl From<Vec<Telemetry>> for Batch {
    fn from(records: Vec<Telemetry>) -> Self {
        Batch(records.into())
    }
}

/// A record which was left out of the upload because it could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the record in the batch.
    pub index: usize,
    /// Why the record could not be encoded.
    pub error: ValidationError,
}

/// A batch was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Status of the upload response. `None` if no record could be encoded and nothing was sent.
    pub status: Option<StatusCode>,
    /// Number of records sent.
    pub sent: usize,
    /// Records left out because they could not be encoded.
    pub skipped: Vec<SkippedRecord>,
}

/// A batch could not be delivered.
///
/// Nothing is retried and the records are not put back into the client. The batch is handed back
/// so callers can decide what to do with it.
#[derive(thiserror::Error, Debug)]
#[error("publishing batch of {} records failed: {error}", .batch.len())]
pub struct PublishFailure {
    /// Cause of the failure.
    #[source]
    pub error: Error,
    /// The batch, unchanged.
    pub batch: Batch,
    /// Records which could not be encoded, whether or not the upload was attempted.
    pub skipped: Vec<SkippedRecord>,
}

/// Result of publishing one batch to one endpoint.
pub type PublishResult = Result<Delivery, PublishFailure>;

/// Sends telemetry batches to one Application Insights ingestion endpoint.
#[derive(Clone)]
pub struct Publisher {
    client: Arc<dyn HttpClient>,
    endpoint: Arc<Uri>,
    instrumentation_key: String,
    tags: Tags,
    requires_token: bool,
    credential: Option<Arc<dyn TokenCredential>>,
    refresh_margin: Duration,
    token_cache: Option<Arc<TokenCache>>,
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("client", &self.client)
            .field("endpoint", &self.endpoint)
            .field("instrumentation_key", &self.instrumentation_key)
            .field("tags", &self.tags)
            .field("token_cache", &self.token_cache)
            .finish()
    }
}

impl Publisher {
    /// Create a publisher for the given ingestion endpoint, e.g.
    /// `https://dc.services.visualstudio.com`. The track path is appended.
    pub fn new(
        client: impl HttpClient + 'static,
        ingestion_endpoint: Uri,
        instrumentation_key: impl Into<String>,
    ) -> Result<Self, Error> {
        let instrumentation_key = instrumentation_key.into();
        if instrumentation_key.trim().is_empty() {
            return Err(Error::InvalidArgument("instrumentation key must not be empty"));
        }

        Ok(Publisher {
            client: Arc::new(client),
            endpoint: Arc::new(uploader::append_path(ingestion_endpoint, TRACK_PATH)?),
            instrumentation_key,
            tags: Tags::new(),
            requires_token: false,
            credential: None,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
            token_cache: None,
        })
    }

    /// Create a publisher from an Application Insights connection string.
    ///
    /// If the connection string sets `Authorization=AAD`, a credential has to be configured with
    /// [`Publisher::with_credential`] before publishing.
    pub fn from_connection_string(
        connection_string: impl AsRef<str>,
        client: impl HttpClient + 'static,
    ) -> Result<Self, Error> {
        let connection_string: ConnectionString = connection_string.as_ref().parse()?;
        let mut publisher = Publisher::new(
            client,
            connection_string.ingestion_endpoint,
            connection_string.instrumentation_key,
        )?;
        publisher.requires_token = connection_string.authorization == Authorization::Aad;
        Ok(publisher)
    }

    /// Create a publisher.
    ///
    /// Reads connection string from `APPLICATIONINSIGHTS_CONNECTION_STRING` environment variable.
    pub fn from_env(client: impl HttpClient + 'static) -> Result<Self, Error> {
        let connection_string = std::env::var("APPLICATIONINSIGHTS_CONNECTION_STRING")?;
        Publisher::from_connection_string(connection_string, client)
    }

    /// Set tags added to every record sent through this publisher. They override client tags and
    /// are overridden by record tags.
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Set a single publisher tag.
    pub fn with_tag(mut self, key: ContextTagKey, value: impl Into<String>) -> Self {
        self.tags.insert(key, value.into());
        self
    }

    /// Authenticate uploads with bearer tokens from the given credential.
    pub fn with_credential(mut self, credential: impl TokenCredential + 'static) -> Self {
        self.credential = Some(Arc::new(credential));
        self.rebuild_token_cache();
        self
    }

    /// Set how long before expiry a cached token is refreshed.
    ///
    /// Default: 5 minutes
    pub fn with_refresh_margin(mut self, refresh_margin: Duration) -> Self {
        self.refresh_margin = refresh_margin;
        self.rebuild_token_cache();
        self
    }

    fn rebuild_token_cache(&mut self) {
        self.token_cache = self.credential.as_ref().map(|credential| {
            Arc::new(TokenCache::new(Arc::clone(credential), self.refresh_margin))
        });
    }

    /// Full URI uploads are sent to.
    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// Instrumentation key put into every envelope.
    pub fn instrumentation_key(&self) -> &str {
        &self.instrumentation_key
    }

    /// Encode the batch and send it in a single request. Makes exactly one attempt.
    ///
    /// Tags of each record are merged from `client_tags`, this publisher's tags and the record's
    /// own tags, with the most specific level winning. Records which fail to encode are reported
    /// in the result and do not prevent the rest of the batch from being sent.
    pub async fn publish(
        &self,
        batch: &Batch,
        client_tags: &Tags,
        cancel: &CancellationToken,
    ) -> PublishResult {
        let mut envelopes = Vec::with_capacity(batch.len());
        let mut batch_indices = Vec::with_capacity(batch.len());
        let mut skipped = Vec::new();
        for (index, record) in batch.iter().enumerate() {
            let tags = merge_tags(client_tags, &self.tags, record.tags());
            match codec::encode(record, tags, &self.instrumentation_key) {
                Ok(envelope) => {
                    envelopes.push(envelope);
                    batch_indices.push(index);
                }
                Err(error) => {
                    warn!(index, %error, "Skipping record which could not be encoded");
                    skipped.push(SkippedRecord { index, error });
                }
            }
        }

        if envelopes.is_empty() {
            debug!(endpoint = %self.endpoint, "Nothing to send");
            return Ok(Delivery {
                status: None,
                sent: 0,
                skipped,
            });
        }

        let fail = |error: Error, skipped: Vec<SkippedRecord>| PublishFailure {
            error,
            batch: batch.clone(),
            skipped,
        };

        let token = match self.bearer_token(cancel).await {
            Ok(token) => token,
            Err(error) => return Err(fail(error, skipped)),
        };

        debug!(endpoint = %self.endpoint, items = envelopes.len(), "Sending telemetry");
        match uploader::send(
            self.client.as_ref(),
            &self.endpoint,
            &envelopes,
            token.as_deref(),
            cancel,
        )
        .await
        {
            Ok(status) => Ok(Delivery {
                status: Some(status),
                sent: envelopes.len(),
                skipped,
            }),
            Err(Error::PartialAccept {
                received,
                accepted,
                rejected,
            }) => {
                let rejected = rejected
                    .into_iter()
                    .filter_map(|mut item| match batch_indices.get(item.index) {
                        Some(index) => {
                            item.index = *index;
                            Some(item)
                        }
                        None => {
                            warn!(
                                endpoint = %self.endpoint,
                                index = item.index,
                                sent = envelopes.len(),
                                "Ignoring rejected item with unknown index"
                            );
                            None
                        }
                    })
                    .collect();
                let error = Error::PartialAccept {
                    received,
                    accepted,
                    rejected,
                };
                Err(fail(error, skipped))
            }
            Err(error) => {
                warn!(endpoint = %self.endpoint, %error, "Sending telemetry failed");
                Err(fail(error, skipped))
            }
        }
    }

    async fn bearer_token(&self, cancel: &CancellationToken) -> Result<Option<String>, Error> {
        match &self.token_cache {
            Some(cache) => cache.get_token(cancel).await.map(Some),
            None if self.requires_token => Err(AuthenticationError::MissingCredential.into()),
            None => Ok(None),
        }
    }
}
