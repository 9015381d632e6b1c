use crate::{models::Data, models::LimitedLenString, tags::Tags};
use serde::Serialize;

/// System variables for a telemetry item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope {
    /// Type name of telemetry data item.
    pub(crate) name: LimitedLenString<1024>,

    /// Event date time when telemetry item was created. This is the wall clock time on the client
    /// when the event was generated.
    pub(crate) time: String,

    /// The instrumentation key of the Application Insights resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) i_key: Option<String>,

    /// Key/value collection of context properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tags: Option<Tags>,

    /// Telemetry data item.
    pub(crate) data: Data,
}
