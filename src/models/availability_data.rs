use crate::models::{LimitedLenString, Measurements, Properties};
use serde::Serialize;

/// Instances of AvailabilityData represent the result of executing an availability test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AvailabilityData {
    /// Schema version
    pub(crate) ver: i32,

    /// Identifier of a test run. Use it to correlate steps of test run and telemetry generated by
    /// the service.
    pub(crate) id: LimitedLenString<64>,

    /// Name of the test that these availability results represent.
    pub(crate) name: LimitedLenString<1024>,

    /// Duration in format: DD.HH:MM:SS.MMMMMM. Must be less than 1000 days.
    pub(crate) duration: String,

    /// Success flag.
    pub(crate) success: bool,

    /// Name of the location where the test was run from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) run_location: Option<LimitedLenString<1024>>,

    /// Diagnostic message for the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<LimitedLenString<8192>>,

    /// Collection of custom properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) properties: Option<Properties>,

    /// Collection of custom measurements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) measurements: Option<Measurements>,
}
