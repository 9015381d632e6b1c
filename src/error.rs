use chrono::{DateTime, Utc};
use http::StatusCode;
use std::error::Error as StdError;

/// Boxed error returned by transports and credentials.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that occurred while tracking or publishing telemetry.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An argument to a synchronous API was invalid. Nothing was enqueued.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(#[from] crate::connection_string::ParseError),

    /// The ingestion endpoint is not a valid URI.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] http::uri::InvalidUri),

    /// Reading the connection string from the environment failed.
    #[error("reading connection string from environment failed with {0}")]
    ConnectionStringEnv(#[from] std::env::VarError),

    /// No valid bearer token could be obtained. Nothing was sent.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Application Insights telemetry data failed to serialize to JSON. Telemetry reporting failed
    /// because of this.
    ///
    /// Note: This is an error in this crate. If you spot this, please open an issue.
    #[error("serializing upload request failed with {0}")]
    UploadSerializeRequest(serde_json::Error),

    /// Application Insights telemetry data failed to compress. Telemetry reporting failed because
    /// of this.
    #[error("compressing upload request failed with {0}")]
    UploadCompressRequest(std::io::Error),

    /// Application Insights telemetry response failed to deserialize from JSON.
    ///
    /// Telemetry reporting may have worked. But since we could not look into the response, we
    /// can't be sure.
    #[error("deserializing upload response failed with {0}")]
    UploadDeserializeResponse(serde_json::Error),

    /// Could not complete the HTTP request to Application Insights to send telemetry data.
    /// Telemetry reporting failed because of this.
    #[error("sending upload request failed with {0}")]
    UploadConnection(BoxError),

    /// Application Insights answered with a non-success status.
    #[error("upload failed with {status}: {body}")]
    Upload {
        /// Response status.
        status: StatusCode,
        /// Response body, lossily decoded as UTF-8.
        body: String,
    },

    /// Application Insights accepted only part of the batch.
    #[error("upload partially failed: {accepted} of {received} items accepted")]
    PartialAccept {
        /// Number of items the service received.
        received: usize,
        /// Number of items the service accepted.
        accepted: usize,
        /// Items the service rejected.
        rejected: Vec<RejectedItem>,
    },

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

/// One record rejected by the ingestion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedItem {
    /// Position of the record in the published batch.
    pub index: usize,
    /// Status the service reported for the record.
    pub status_code: u16,
    /// Message the service reported for the record.
    pub message: String,
}

/// A record could not be encoded. It was skipped; the rest of the batch was still sent.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// A required field was empty.
    #[error("required field {0} is missing")]
    MissingField(&'static str),

    /// A numeric field was NaN or infinite.
    #[error("field {0} is not a finite number")]
    NonFiniteValue(&'static str),
}

/// Errors obtaining a bearer token.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum AuthenticationError {
    /// The credential failed to produce a token.
    #[error("acquiring token failed with {0}")]
    Credential(BoxError),

    /// The endpoint requires bearer tokens but no credential was configured.
    #[error("endpoint requires a bearer token but no credential is configured")]
    MissingCredential,

    /// The credential returned a token which is already expired.
    #[error("acquired token expired at {expires_on}")]
    Expired {
        /// Expiry of the returned token.
        expires_on: DateTime<Utc>,
    },
}
