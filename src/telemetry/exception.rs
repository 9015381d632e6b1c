use super::{common_builders, measurement_builder};
use crate::{models::SeverityLevel, tags::Tags};
use chrono::{DateTime, Utc};
use std::{collections::BTreeMap, error::Error as StdError};

/// A handled or unhandled error.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionTelemetry {
    /// Error type name.
    pub type_name: String,
    /// Error message.
    pub message: String,
    /// Stack trace, if available.
    pub stack: Option<String>,
    /// Messages of the errors that caused this one, outermost first.
    pub causes: Vec<String>,
    /// Severity of the error.
    pub severity_level: Option<SeverityLevel>,
    /// Identifier used to group exceptions.
    pub problem_id: Option<String>,
    /// Time the error happened.
    pub timestamp: DateTime<Utc>,
    /// Context tags specific to this record.
    pub tags: Tags,
    /// Custom properties.
    pub properties: BTreeMap<String, String>,
    /// Custom measurements.
    pub measurements: BTreeMap<String, f64>,
}

impl ExceptionTelemetry {
    /// Create an exception record, timestamped now.
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        ExceptionTelemetry {
            type_name: type_name.into(),
            message: message.into(),
            stack: None,
            causes: Vec::new(),
            severity_level: None,
            problem_id: None,
            timestamp: Utc::now(),
            tags: Tags::new(),
            properties: BTreeMap::new(),
            measurements: BTreeMap::new(),
        }
    }

    /// Create an exception record from an error and its chain of sources.
    ///
    /// The type name is taken from `type_name::<E>()`.
    pub fn from_error<E: StdError + ?Sized>(error: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        ExceptionTelemetry {
            causes,
            ..ExceptionTelemetry::new(std::any::type_name::<E>(), error.to_string())
        }
    }

    /// Set the stack trace.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Set the severity level.
    pub fn with_severity_level(mut self, severity_level: SeverityLevel) -> Self {
        self.severity_level = Some(severity_level);
        self
    }

    /// Set the problem id used to group exceptions.
    pub fn with_problem_id(mut self, problem_id: impl Into<String>) -> Self {
        self.problem_id = Some(problem_id.into());
        self
    }
}

common_builders!(ExceptionTelemetry);
measurement_builder!(ExceptionTelemetry);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(thiserror::Error, Debug)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(thiserror::Error, Debug)]
    #[error("inner")]
    struct Inner;

    #[test]
    fn from_error_collects_causes() {
        let exception = ExceptionTelemetry::from_error(&Outer(Inner));
        assert_eq!("outer", exception.message);
        assert!(exception.type_name.ends_with("Outer"));
        assert_eq!(vec!["inner".to_string()], exception.causes);
    }
}
