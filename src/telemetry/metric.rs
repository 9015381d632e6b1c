use super::common_builders;
use crate::tags::Tags;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A single metric value, optionally pre-aggregated.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTelemetry {
    /// Metric name.
    pub name: String,
    /// Metric namespace.
    pub namespace: Option<String>,
    /// The measured value, or the sum of all measurements for an aggregation.
    pub value: f64,
    /// Aggregation statistics. `None` for a single measurement.
    pub aggregation: Option<MetricAggregation>,
    /// Time the value was measured.
    pub timestamp: DateTime<Utc>,
    /// Context tags specific to this record.
    pub tags: Tags,
    /// Custom properties.
    pub properties: BTreeMap<String, String>,
}

/// Statistics of a pre-aggregated metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricAggregation {
    /// Number of measurements.
    pub count: Option<i32>,
    /// Smallest measurement.
    pub min: Option<f64>,
    /// Largest measurement.
    pub max: Option<f64>,
    /// Standard deviation of the measurements.
    pub std_dev: Option<f64>,
}

impl MetricTelemetry {
    /// Create a single measurement, timestamped now.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        MetricTelemetry {
            name: name.into(),
            namespace: None,
            value,
            aggregation: None,
            timestamp: Utc::now(),
            tags: Tags::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Set the metric namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Turn the measurement into an aggregation with the given statistics.
    pub fn with_aggregation(mut self, aggregation: MetricAggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }
}

common_builders!(MetricTelemetry);
