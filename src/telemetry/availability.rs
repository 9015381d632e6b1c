use super::{common_builders, measurement_builder};
use crate::{context::new_activity_id, tags::Tags};
use chrono::{DateTime, Utc};
use std::{collections::BTreeMap, time::Duration};

/// The result of one availability test run.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityTelemetry {
    /// Identifier of the test run.
    pub id: String,
    /// Name of the test.
    pub name: String,
    /// How long the test took.
    pub duration: Duration,
    /// Whether the test passed.
    pub success: bool,
    /// Where the test was run from.
    pub run_location: Option<String>,
    /// Diagnostic message for the result.
    pub message: Option<String>,
    /// Time the test started.
    pub timestamp: DateTime<Utc>,
    /// Context tags specific to this record.
    pub tags: Tags,
    /// Custom properties.
    pub properties: BTreeMap<String, String>,
    /// Custom measurements.
    pub measurements: BTreeMap<String, f64>,
}

impl AvailabilityTelemetry {
    /// Create an availability result with a fresh id, timestamped now.
    pub fn new(name: impl Into<String>, duration: Duration, success: bool) -> Self {
        AvailabilityTelemetry {
            id: new_activity_id(),
            name: name.into(),
            duration,
            success,
            run_location: None,
            message: None,
            timestamp: Utc::now(),
            tags: Tags::new(),
            properties: BTreeMap::new(),
            measurements: BTreeMap::new(),
        }
    }

    /// Set the location the test was run from.
    pub fn with_run_location(mut self, run_location: impl Into<String>) -> Self {
        self.run_location = Some(run_location.into());
        self
    }

    /// Set a diagnostic message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

common_builders!(AvailabilityTelemetry);
measurement_builder!(AvailabilityTelemetry);
