//! A thread-safe telemetry client for [Azure Application Insights].
//!
//! [Azure Application Insights]: https://docs.microsoft.com/en-us/azure/azure-monitor/app/app-insights-overview
//!
//! **Disclaimer**: This is not an official Microsoft product.
//!
//! # Usage
//!
//! Create one or more [`Publisher`]s, one per ingestion endpoint, and a [`TelemetryClient`] which
//! owns them. Records are tracked from any thread and buffered in memory. Nothing is sent until
//! [`TelemetryClient::publish`] is called; the client never flushes on its own.
//!
//! ```no_run
//! use application_insights_telemetry::{
//!     tags, CancellationToken, OperationContext, Publisher, SeverityLevel, TelemetryClient,
//! };
//!
//! # async fn run(
//! #     http_client: impl opentelemetry_http::HttpClient + 'static,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! // Reads APPLICATIONINSIGHTS_CONNECTION_STRING
//! let publisher = Publisher::from_env(http_client)?;
//! let client = TelemetryClient::new([publisher]).with_tag(tags::CLOUD_ROLE, "api");
//!
//! client.set_operation_context(OperationContext::new("GET /users"));
//! client.track_event("start")?;
//! client.track_trace("loading users", SeverityLevel::Information)?;
//!
//! for outcome in client.publish(&CancellationToken::new()).await {
//!     if let Err(failure) = outcome.result {
//!         eprintln!("publishing to {} failed: {}", outcome.endpoint, failure);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The HTTP client is anything implementing [`opentelemetry_http::HttpClient`]. Enable one of
//! the following features to use [reqwest](https://crates.io/crates/reqwest):
//!
//! - `reqwest-client`: native TLS
//! - `reqwest-client-vendored-tls`: vendored native TLS
//! - `reqwest-client-rustls`: rustls
//!
//! # Tags
//!
//! Context tags are set on three levels: on the client, on each publisher and on each record.
//! They are merged when a batch is published. A record tag wins over a publisher tag, which wins
//! over a client tag. Well known keys are in the [`tags`] module.
//!
//! # Operation context
//!
//! Records created with [`TelemetryClient::track`] or one of the `track_*` helpers are stamped
//! with the current [`OperationContext`]:
//!
//! | Tag                     | Value                                        |
//! | ----------------------- | -------------------------------------------- |
//! | `ai.operation.id`       | Operation id                                 |
//! | `ai.operation.name`     | Operation name, if set                       |
//! | `ai.operation.parentId` | Parent id, or the operation id if there is none |
//!
//! [`TelemetryClient::add`] buffers records without stamping them.
//!
//! # Delivery
//!
//! Each publish sends the drained batch to every publisher concurrently, in exactly one request
//! per publisher. There is no retry. Records which fail to encode are skipped and reported in
//! the outcome. If a publisher fails, the [`PublishFailure`] carries the unchanged batch; it is
//! not put back into the client.
//!
//! # Authentication
//!
//! Ingestion endpoints which require Microsoft Entra ID authentication (`Authorization=AAD` in
//! the connection string) need a [`TokenCredential`], configured with
//! [`Publisher::with_credential`]. Tokens are cached and refreshed shortly before they expire.
#![doc(html_root_url = "https://docs.rs/application-insights-telemetry/0.1.0")]
#![deny(missing_docs, unreachable_pub, missing_debug_implementations)]

mod client;
mod codec;
mod connection_string;
mod context;
mod convert;
mod error;
mod models;
mod publisher;
pub mod tags;
pub mod telemetry;
mod token;
mod uploader;

pub use client::{PublishOutcome, TelemetryClient};
pub use connection_string::ParseError as ConnectionStringError;
pub use context::OperationContext;
pub use error::{AuthenticationError, BoxError, Error, RejectedItem, ValidationError};
pub use models::SeverityLevel;
pub use publisher::{Batch, Delivery, PublishFailure, PublishResult, Publisher, SkippedRecord};
pub use telemetry::Telemetry;
pub use token::{AccessToken, TokenCredential, DEFAULT_REFRESH_MARGIN, INGESTION_SCOPE};
pub use tokio_util::sync::CancellationToken;
