use super::{common_builders, measurement_builder};
use crate::tags::Tags;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A named custom event, e.g. a user action or a business milestone.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTelemetry {
    /// Event name. Keep it low cardinality.
    pub name: String,
    /// Time the event happened.
    pub timestamp: DateTime<Utc>,
    /// Context tags specific to this record.
    pub tags: Tags,
    /// Custom properties.
    pub properties: BTreeMap<String, String>,
    /// Custom measurements.
    pub measurements: BTreeMap<String, f64>,
}

impl EventTelemetry {
    /// Create an event with the given name, timestamped now.
    pub fn new(name: impl Into<String>) -> Self {
        EventTelemetry {
            name: name.into(),
            timestamp: Utc::now(),
            tags: Tags::new(),
            properties: BTreeMap::new(),
            measurements: BTreeMap::new(),
        }
    }
}

common_builders!(EventTelemetry);
measurement_builder!(EventTelemetry);
