use crate::models::{LimitedLenString, Measurements, Properties};
use serde::Serialize;

/// An instance of PageView represents a generic action on a page like a button click. It is also
/// the base type for PageView.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageViewData {
    /// Schema version
    pub(crate) ver: i32,

    /// Event name. Keep it low cardinality to allow proper grouping and useful metrics.
    pub(crate) name: LimitedLenString<1024>,

    /// Request URL with all query string parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<LimitedLenString<2048>>,

    /// Request duration in format: DD.HH:MM:SS.MMMMMM. For a page view, this is the duration of
    /// the page load.
    pub(crate) duration: String,

    /// Identifier of a page view instance. Used for correlation between page view and other
    /// telemetry items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<LimitedLenString<128>>,

    /// Fully qualified page URI or URL of the referring page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) referrer_uri: Option<LimitedLenString<2048>>,

    /// Collection of custom properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) properties: Option<Properties>,

    /// Collection of custom measurements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) measurements: Option<Measurements>,
}
