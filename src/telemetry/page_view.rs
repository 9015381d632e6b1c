use super::{common_builders, measurement_builder};
use crate::{context::new_activity_id, tags::Tags};
use chrono::{DateTime, Utc};
use std::{collections::BTreeMap, time::Duration};

/// A page view in a client application.
#[derive(Debug, Clone, PartialEq)]
pub struct PageViewTelemetry {
    /// Identifier of the page view.
    pub id: String,
    /// Page name.
    pub name: String,
    /// Page URL.
    pub url: Option<String>,
    /// URL of the referring page.
    pub referrer_uri: Option<String>,
    /// Page load duration.
    pub duration: Duration,
    /// Time the page view started.
    pub timestamp: DateTime<Utc>,
    /// Context tags specific to this record.
    pub tags: Tags,
    /// Custom properties.
    pub properties: BTreeMap<String, String>,
    /// Custom measurements.
    pub measurements: BTreeMap<String, f64>,
}

impl PageViewTelemetry {
    /// Create a page view with a fresh id, timestamped now.
    pub fn new(name: impl Into<String>) -> Self {
        PageViewTelemetry {
            id: new_activity_id(),
            name: name.into(),
            url: None,
            referrer_uri: None,
            duration: Duration::ZERO,
            timestamp: Utc::now(),
            tags: Tags::new(),
            properties: BTreeMap::new(),
            measurements: BTreeMap::new(),
        }
    }

    /// Set the page URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the referring page.
    pub fn with_referrer_uri(mut self, referrer_uri: impl Into<String>) -> Self {
        self.referrer_uri = Some(referrer_uri.into());
        self
    }

    /// Set the page load duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

common_builders!(PageViewTelemetry);
measurement_builder!(PageViewTelemetry);
