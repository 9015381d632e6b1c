//! Telemetry records.
//!
//! Records are plain values: build one, hand it to
//! [`TelemetryClient::add`](crate::TelemetryClient::add) or
//! [`TelemetryClient::track`](crate::TelemetryClient::track), and it is sent as one envelope on
//! the next publish.

mod availability;
mod dependency;
mod event;
mod exception;
mod metric;
mod page_view;
mod request;
mod trace;

pub use availability::AvailabilityTelemetry;
pub use dependency::DependencyTelemetry;
pub use event::EventTelemetry;
pub use exception::ExceptionTelemetry;
pub use metric::{MetricAggregation, MetricTelemetry};
pub use page_view::PageViewTelemetry;
pub use request::RequestTelemetry;
pub use trace::TraceTelemetry;

use crate::tags::Tags;
use chrono::{DateTime, Utc};

/// One telemetry record.
#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry {
    /// A named custom event.
    Event(EventTelemetry),
    /// A free-text trace message.
    Trace(TraceTelemetry),
    /// A single measurement or pre-aggregated metric.
    Metric(MetricTelemetry),
    /// A handled or unhandled error.
    Exception(ExceptionTelemetry),
    /// The result of an availability test.
    Availability(AvailabilityTelemetry),
    /// A call from the application to a remote component.
    Dependency(DependencyTelemetry),
    /// A page view in a client application.
    PageView(PageViewTelemetry),
    /// An incoming request handled by the application.
    Request(RequestTelemetry),
}

impl Telemetry {
    /// Time the record was created.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Telemetry::Event(t) => t.timestamp,
            Telemetry::Trace(t) => t.timestamp,
            Telemetry::Metric(t) => t.timestamp,
            Telemetry::Exception(t) => t.timestamp,
            Telemetry::Availability(t) => t.timestamp,
            Telemetry::Dependency(t) => t.timestamp,
            Telemetry::PageView(t) => t.timestamp,
            Telemetry::Request(t) => t.timestamp,
        }
    }

    /// Tags set on this record only.
    pub fn tags(&self) -> &Tags {
        match self {
            Telemetry::Event(t) => &t.tags,
            Telemetry::Trace(t) => &t.tags,
            Telemetry::Metric(t) => &t.tags,
            Telemetry::Exception(t) => &t.tags,
            Telemetry::Availability(t) => &t.tags,
            Telemetry::Dependency(t) => &t.tags,
            Telemetry::PageView(t) => &t.tags,
            Telemetry::Request(t) => &t.tags,
        }
    }

    pub(crate) fn tags_mut(&mut self) -> &mut Tags {
        match self {
            Telemetry::Event(t) => &mut t.tags,
            Telemetry::Trace(t) => &mut t.tags,
            Telemetry::Metric(t) => &mut t.tags,
            Telemetry::Exception(t) => &mut t.tags,
            Telemetry::Availability(t) => &mut t.tags,
            Telemetry::Dependency(t) => &mut t.tags,
            Telemetry::PageView(t) => &mut t.tags,
            Telemetry::Request(t) => &mut t.tags,
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Telemetry {
                fn from(telemetry: $ty) -> Self {
                    Telemetry::$variant(telemetry)
                }
            }
        )*
    };
}

impl_from_variant!(
    Event(EventTelemetry),
    Trace(TraceTelemetry),
    Metric(MetricTelemetry),
    Exception(ExceptionTelemetry),
    Availability(AvailabilityTelemetry),
    Dependency(DependencyTelemetry),
    PageView(PageViewTelemetry),
    Request(RequestTelemetry),
);

/// Builder methods shared by all record types.
macro_rules! common_builders {
    ($ty:ty) => {
        impl $ty {
            /// Set the time the record was created. Defaults to now.
            pub fn with_timestamp(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
                self.timestamp = timestamp;
                self
            }

            /// Set a context tag on this record. Record tags take precedence over publisher and
            /// client tags.
            pub fn with_tag(
                mut self,
                key: $crate::tags::ContextTagKey,
                value: impl Into<String>,
            ) -> Self {
                self.tags.insert(key, value.into());
                self
            }

            /// Add a custom property.
            pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
                self.properties.insert(key.into(), value.into());
                self
            }
        }
    };
}

/// Builder method for records which carry custom measurements.
macro_rules! measurement_builder {
    ($ty:ty) => {
        impl $ty {
            /// Add a custom measurement.
            pub fn with_measurement(mut self, key: impl Into<String>, value: f64) -> Self {
                self.measurements.insert(key.into(), value);
                self
            }
        }
    };
}

pub(crate) use common_builders;
pub(crate) use measurement_builder;
