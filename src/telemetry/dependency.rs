use super::{common_builders, measurement_builder};
use crate::{context::new_activity_id, tags::Tags};
use chrono::{DateTime, Utc};
use std::{collections::BTreeMap, time::Duration};

/// A call from the application to a remote component, such as a database or an HTTP service.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyTelemetry {
    /// Identifier of the call. Telemetry produced by the callee uses it as parent id.
    pub id: String,
    /// Name of the command, e.g. `GET /users/{id}`. Low cardinality.
    pub name: String,
    /// Dependency type, e.g. `HTTP` or `SQL`.
    pub dependency_type: Option<String>,
    /// Target of the call, e.g. the host name.
    pub target: Option<String>,
    /// Command issued, e.g. the full URL or SQL statement.
    pub data: Option<String>,
    /// Result code, e.g. the HTTP status code.
    pub result_code: Option<String>,
    /// How long the call took.
    pub duration: Duration,
    /// Whether the call succeeded.
    pub success: bool,
    /// Time the call started.
    pub timestamp: DateTime<Utc>,
    /// Context tags specific to this record.
    pub tags: Tags,
    /// Custom properties.
    pub properties: BTreeMap<String, String>,
    /// Custom measurements.
    pub measurements: BTreeMap<String, f64>,
}

impl DependencyTelemetry {
    /// Create a dependency call with a fresh id, timestamped now.
    pub fn new(name: impl Into<String>, duration: Duration, success: bool) -> Self {
        DependencyTelemetry {
            id: new_activity_id(),
            name: name.into(),
            dependency_type: None,
            target: None,
            data: None,
            result_code: None,
            duration,
            success,
            timestamp: Utc::now(),
            tags: Tags::new(),
            properties: BTreeMap::new(),
            measurements: BTreeMap::new(),
        }
    }

    /// Set the dependency type.
    pub fn with_type(mut self, dependency_type: impl Into<String>) -> Self {
        self.dependency_type = Some(dependency_type.into());
        self
    }

    /// Set the target of the call.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the command issued by the call.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the result code.
    pub fn with_result_code(mut self, result_code: impl Into<String>) -> Self {
        self.result_code = Some(result_code.into());
        self
    }
}

common_builders!(DependencyTelemetry);
measurement_builder!(DependencyTelemetry);
