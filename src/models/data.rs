use crate::models::{
    AvailabilityData, EventData, ExceptionData, MessageData, MetricData, PageViewData,
    RemoteDependencyData, RequestData,
};
use serde::Serialize;

/// Data struct to contain both B and C sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "baseType", content = "baseData")]
pub(crate) enum Data {
    #[serde(rename = "AvailabilityData")]
    Availability(AvailabilityData),
    #[serde(rename = "EventData")]
    Event(EventData),
    #[serde(rename = "ExceptionData")]
    Exception(ExceptionData),
    #[serde(rename = "MessageData")]
    Message(MessageData),
    #[serde(rename = "MetricData")]
    Metric(MetricData),
    #[serde(rename = "PageViewData")]
    PageView(PageViewData),
    #[serde(rename = "RemoteDependencyData")]
    RemoteDependency(RemoteDependencyData),
    #[serde(rename = "RequestData")]
    Request(RequestData),
}
