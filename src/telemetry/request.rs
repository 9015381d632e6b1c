use super::{common_builders, measurement_builder};
use crate::{context::new_activity_id, tags::Tags};
use chrono::{DateTime, Utc};
use std::{collections::BTreeMap, time::Duration};

/// An incoming request handled by the application.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTelemetry {
    /// Identifier of the request. Telemetry produced while handling it uses it as parent id.
    pub id: String,
    /// Name of the request, e.g. `GET /users/{id}`. Low cardinality.
    pub name: Option<String>,
    /// Full request URL.
    pub url: Option<String>,
    /// Source of the request, e.g. the caller's address.
    pub source: Option<String>,
    /// Response code, e.g. the HTTP status code.
    pub response_code: String,
    /// How long handling the request took.
    pub duration: Duration,
    /// Whether the request succeeded.
    pub success: bool,
    /// Time the request started.
    pub timestamp: DateTime<Utc>,
    /// Context tags specific to this record.
    pub tags: Tags,
    /// Custom properties.
    pub properties: BTreeMap<String, String>,
    /// Custom measurements.
    pub measurements: BTreeMap<String, f64>,
}

impl RequestTelemetry {
    /// Create a request with a fresh id, timestamped now.
    pub fn new(
        name: impl Into<String>,
        response_code: impl Into<String>,
        duration: Duration,
        success: bool,
    ) -> Self {
        RequestTelemetry {
            id: new_activity_id(),
            name: Some(name.into()).filter(|x: &String| !x.is_empty()),
            url: None,
            source: None,
            response_code: response_code.into(),
            duration,
            success,
            timestamp: Utc::now(),
            tags: Tags::new(),
            properties: BTreeMap::new(),
            measurements: BTreeMap::new(),
        }
    }

    /// Set the request URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the source of the request.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Override the generated request id, e.g. with the id from an incoming `traceparent`.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

common_builders!(RequestTelemetry);
measurement_builder!(RequestTelemetry);
