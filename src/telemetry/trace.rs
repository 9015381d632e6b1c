use super::common_builders;
use crate::{models::SeverityLevel, tags::Tags};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A free-text diagnostic message, like a log line.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceTelemetry {
    /// The message text.
    pub message: String,
    /// Severity of the message, if known.
    pub severity_level: Option<SeverityLevel>,
    /// Time the message was written.
    pub timestamp: DateTime<Utc>,
    /// Context tags specific to this record.
    pub tags: Tags,
    /// Custom properties.
    pub properties: BTreeMap<String, String>,
}

impl TraceTelemetry {
    /// Create a trace message, timestamped now.
    pub fn new(message: impl Into<String>) -> Self {
        TraceTelemetry {
            message: message.into(),
            severity_level: None,
            timestamp: Utc::now(),
            tags: Tags::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Set the severity level.
    pub fn with_severity_level(mut self, severity_level: SeverityLevel) -> Self {
        self.severity_level = Some(severity_level);
        self
    }
}

common_builders!(TraceTelemetry);
