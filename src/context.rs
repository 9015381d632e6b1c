//! Distributed operation context.

use crate::{
    convert::{span_id_to_string, trace_id_to_string},
    error::Error,
    tags::{Tags, OPERATION_ID, OPERATION_NAME, OPERATION_PARENT_ID},
};
use opentelemetry::trace::{SpanId, TraceId};
use opentelemetry_sdk::trace::{IdGenerator as _, RandomIdGenerator};

/// Identifies the distributed logical operation telemetry belongs to.
///
/// The client holds the current context and stamps it onto every record created through
/// [`TelemetryClient::track`](crate::TelemetryClient::track). The context is replaced as a whole,
/// never field by field, so concurrent readers always observe a consistent triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationContext {
    id: String,
    name: Option<String>,
    parent_id: Option<String>,
}

impl OperationContext {
    /// Start a new root operation with a random id.
    pub fn new(name: impl Into<String>) -> Self {
        OperationContext {
            id: trace_id_to_string(RandomIdGenerator::default().new_trace_id()),
            name: Some(name.into()),
            parent_id: None,
        }
    }

    /// Create a context from explicit parts.
    pub fn from_parts(
        id: impl Into<String>,
        name: Option<String>,
        parent_id: Option<String>,
    ) -> Self {
        OperationContext {
            id: id.into(),
            name,
            parent_id,
        }
    }

    /// Continue an operation started by a caller, using a W3C `traceparent` header value.
    ///
    /// The trace id becomes the operation id and the caller's span id the parent id.
    pub fn from_traceparent(traceparent: &str, name: Option<String>) -> Result<Self, Error> {
        let parts: Vec<&str> = traceparent.trim().split('-').collect();
        let [version, trace_id, span_id, _flags] = parts.as_slice() else {
            return Err(Error::InvalidArgument("traceparent must have four fields"));
        };
        if version.len() != 2 || *version == "ff" {
            return Err(Error::InvalidArgument("unsupported traceparent version"));
        }
        let trace_id = parse_trace_id(trace_id)?;
        let span_id = parse_span_id(span_id)?;

        Ok(OperationContext {
            id: trace_id_to_string(trace_id),
            name,
            parent_id: Some(span_id_to_string(span_id)),
        })
    }

    /// Derive the context for work nested under the activity `activity_id` of this operation,
    /// e.g. a request handled by the current operation.
    pub fn child(&self, activity_id: impl Into<String>) -> Self {
        OperationContext {
            id: self.id.clone(),
            name: self.name.clone(),
            parent_id: Some(activity_id.into()),
        }
    }

    /// Build a `traceparent` header value for an outgoing call made by the activity
    /// `activity_id`. Returns `None` if the ids are not in W3C format.
    pub fn traceparent(&self, activity_id: &str) -> Option<String> {
        let trace_id = parse_trace_id(&self.id).ok()?;
        let span_id = parse_span_id(activity_id).ok()?;
        Some(format!(
            "00-{}-{}-01",
            trace_id_to_string(trace_id),
            span_id_to_string(span_id)
        ))
    }

    /// Operation id shared by all telemetry of the operation.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Operation name, e.g. `GET /users/{id}`.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Id of the immediate parent activity.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Write the correlation tags for a new record into `tags`, keeping values already set.
    ///
    /// Without an explicit parent id the operation id itself is the parent.
    pub(crate) fn stamp(&self, tags: &mut Tags) {
        tags.entry(OPERATION_ID).or_insert_with(|| self.id.clone());
        if let Some(name) = &self.name {
            tags.entry(OPERATION_NAME).or_insert_with(|| name.clone());
        }
        tags.entry(OPERATION_PARENT_ID)
            .or_insert_with(|| self.parent_id.clone().unwrap_or_else(|| self.id.clone()));
    }
}

/// A random 16 hex digit id for activity records.
pub(crate) fn new_activity_id() -> String {
    span_id_to_string(RandomIdGenerator::default().new_span_id())
}

fn parse_trace_id(s: &str) -> Result<TraceId, Error> {
    if s.len() != 32 {
        return Err(Error::InvalidArgument("trace id must have 32 hex digits"));
    }
    TraceId::from_hex(s)
        .ok()
        .filter(|id| *id != TraceId::INVALID)
        .ok_or(Error::InvalidArgument("invalid trace id"))
}

fn parse_span_id(s: &str) -> Result<SpanId, Error> {
    if s.len() != 16 {
        return Err(Error::InvalidArgument("span id must have 16 hex digits"));
    }
    SpanId::from_hex(s)
        .ok()
        .filter(|id| *id != SpanId::INVALID)
        .ok_or(Error::InvalidArgument("invalid span id"))
}
