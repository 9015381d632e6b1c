//! Converts telemetry records into ingestion envelopes.

use crate::{
    convert::{duration_to_string, time_to_string},
    error::ValidationError,
    models::{
        sanitized, AvailabilityData, Data, DataPoint, DataPointType, Envelope, EventData,
        ExceptionData, ExceptionDetails, MessageData, MetricData, PageViewData,
        RemoteDependencyData, RequestData,
    },
    tags::Tags,
    telemetry::{
        AvailabilityTelemetry, DependencyTelemetry, EventTelemetry, ExceptionTelemetry,
        MetricTelemetry, PageViewTelemetry, RequestTelemetry, Telemetry, TraceTelemetry,
    },
};

const SCHEMA_VERSION: i32 = 2;

/// Encodes one record with its effective (already merged) tag set.
///
/// Text fields longer than their documented maximum are truncated. A record missing a required
/// field is rejected with a [`ValidationError`]. The result only depends on the arguments, so
/// encoding the same input twice serializes to identical bytes.
pub(crate) fn encode(
    telemetry: &Telemetry,
    tags: Tags,
    instrumentation_key: &str,
) -> Result<Envelope, ValidationError> {
    let (name, data) = match telemetry {
        Telemetry::Event(t) => ("Microsoft.ApplicationInsights.Event", Data::Event(t.try_into()?)),
        Telemetry::Trace(t) => (
            "Microsoft.ApplicationInsights.Message",
            Data::Message(t.try_into()?),
        ),
        Telemetry::Metric(t) => (
            "Microsoft.ApplicationInsights.Metric",
            Data::Metric(t.try_into()?),
        ),
        Telemetry::Exception(t) => (
            "Microsoft.ApplicationInsights.Exception",
            Data::Exception(t.try_into()?),
        ),
        Telemetry::Availability(t) => (
            "Microsoft.ApplicationInsights.Availability",
            Data::Availability(t.try_into()?),
        ),
        Telemetry::Dependency(t) => (
            "Microsoft.ApplicationInsights.RemoteDependency",
            Data::RemoteDependency(t.try_into()?),
        ),
        Telemetry::PageView(t) => (
            "Microsoft.ApplicationInsights.PageView",
            Data::PageView(t.try_into()?),
        ),
        Telemetry::Request(t) => (
            "Microsoft.ApplicationInsights.Request",
            Data::Request(t.try_into()?),
        ),
    };

    Ok(Envelope {
        name: name.into(),
        time: time_to_string(telemetry.timestamp()),
        i_key: Some(instrumentation_key.to_string()).filter(|x| !x.is_empty()),
        tags: Some(tags).filter(|x| !x.is_empty()),
        data,
    })
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(value)
    }
}

fn finite(value: f64, field: &'static str) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFiniteValue(field))
    }
}

fn finite_opt(value: Option<f64>, field: &'static str) -> Result<Option<f64>, ValidationError> {
    value.map(|v| finite(v, field)).transpose()
}

fn measurements(
    measurements: &std::collections::BTreeMap<String, f64>,
) -> Result<Option<crate::models::Measurements>, ValidationError> {
    if measurements.values().any(|v| !v.is_finite()) {
        return Err(ValidationError::NonFiniteValue("measurements"));
    }
    Ok(sanitized(measurements.clone()))
}

impl TryFrom<&EventTelemetry> for EventData {
    type Error = ValidationError;

    fn try_from(t: &EventTelemetry) -> Result<Self, Self::Error> {
        Ok(EventData {
            ver: SCHEMA_VERSION,
            name: required(&t.name, "name")?.into(),
            properties: sanitized(t.properties.clone()),
            measurements: measurements(&t.measurements)?,
        })
    }
}

impl TryFrom<&TraceTelemetry> for MessageData {
    type Error = ValidationError;

    fn try_from(t: &TraceTelemetry) -> Result<Self, Self::Error> {
        Ok(MessageData {
            ver: SCHEMA_VERSION,
            message: required(&t.message, "message")?.into(),
            severity_level: t.severity_level,
            properties: sanitized(t.properties.clone()),
        })
    }
}

impl TryFrom<&MetricTelemetry> for MetricData {
    type Error = ValidationError;

    fn try_from(t: &MetricTelemetry) -> Result<Self, Self::Error> {
        let kind = match &t.aggregation {
            None => DataPointType::Measurement,
            Some(aggregation) => DataPointType::Aggregation {
                count: aggregation.count,
                min: finite_opt(aggregation.min, "min")?,
                max: finite_opt(aggregation.max, "max")?,
                std_dev: finite_opt(aggregation.std_dev, "stdDev")?,
            },
        };
        Ok(MetricData {
            ver: SCHEMA_VERSION,
            metrics: vec![DataPoint {
                ns: t.namespace.as_deref().map(Into::into),
                name: required(&t.name, "name")?.into(),
                kind,
                value: finite(t.value, "value")?,
            }],
            properties: sanitized(t.properties.clone()),
        })
    }
}

impl TryFrom<&ExceptionTelemetry> for ExceptionData {
    type Error = ValidationError;

    fn try_from(t: &ExceptionTelemetry) -> Result<Self, Self::Error> {
        let mut exceptions = vec![ExceptionDetails {
            id: 1,
            outer_id: None,
            type_name: required(&t.type_name, "typeName")?.into(),
            message: t.message.as_str().into(),
            has_full_stack: t.stack.is_some(),
            stack: t.stack.as_deref().map(Into::into),
        }];
        // Each cause is nested inside the previous exception of the chain.
        for (i, cause) in t.causes.iter().enumerate() {
            let id = i as i32 + 2;
            exceptions.push(ExceptionDetails {
                id,
                outer_id: Some(id - 1),
                type_name: "<unknown>".into(),
                message: cause.as_str().into(),
                has_full_stack: false,
                stack: None,
            });
        }

        Ok(ExceptionData {
            ver: SCHEMA_VERSION,
            exceptions,
            severity_level: t.severity_level,
            problem_id: t.problem_id.as_deref().map(Into::into),
            properties: sanitized(t.properties.clone()),
            measurements: measurements(&t.measurements)?,
        })
    }
}

impl TryFrom<&AvailabilityTelemetry> for AvailabilityData {
    type Error = ValidationError;

    fn try_from(t: &AvailabilityTelemetry) -> Result<Self, Self::Error> {
        Ok(AvailabilityData {
            ver: SCHEMA_VERSION,
            id: required(&t.id, "id")?.into(),
            name: required(&t.name, "name")?.into(),
            duration: duration_to_string(t.duration),
            success: t.success,
            run_location: t.run_location.as_deref().map(Into::into),
            message: t.message.as_deref().map(Into::into),
            properties: sanitized(t.properties.clone()),
            measurements: measurements(&t.measurements)?,
        })
    }
}

impl TryFrom<&DependencyTelemetry> for RemoteDependencyData {
    type Error = ValidationError;

    fn try_from(t: &DependencyTelemetry) -> Result<Self, Self::Error> {
        Ok(RemoteDependencyData {
            ver: SCHEMA_VERSION,
            name: required(&t.name, "name")?.into(),
            id: Some(required(&t.id, "id")?.into()),
            result_code: t.result_code.as_deref().map(Into::into),
            duration: duration_to_string(t.duration),
            success: Some(t.success),
            data: t.data.as_deref().map(Into::into),
            target: t.target.as_deref().map(Into::into),
            type_: t.dependency_type.as_deref().map(Into::into),
            properties: sanitized(t.properties.clone()),
            measurements: measurements(&t.measurements)?,
        })
    }
}

impl TryFrom<&PageViewTelemetry> for PageViewData {
    type Error = ValidationError;

    fn try_from(t: &PageViewTelemetry) -> Result<Self, Self::Error> {
        Ok(PageViewData {
            ver: SCHEMA_VERSION,
            name: required(&t.name, "name")?.into(),
            url: t.url.as_deref().map(Into::into),
            duration: duration_to_string(t.duration),
            id: Some(t.id.as_str())
                .filter(|x| !x.is_empty())
                .map(Into::into),
            referrer_uri: t.referrer_uri.as_deref().map(Into::into),
            properties: sanitized(t.properties.clone()),
            measurements: measurements(&t.measurements)?,
        })
    }
}

impl TryFrom<&RequestTelemetry> for RequestData {
    type Error = ValidationError;

    fn try_from(t: &RequestTelemetry) -> Result<Self, Self::Error> {
        Ok(RequestData {
            ver: SCHEMA_VERSION,
            id: required(&t.id, "id")?.into(),
            source: t.source.as_deref().map(Into::into),
            name: t.name.as_deref().map(Into::into),
            duration: duration_to_string(t.duration),
            response_code: t.response_code.as_str().into(),
            success: t.success,
            url: t.url.as_deref().map(Into::into),
            properties: sanitized(t.properties.clone()),
            measurements: measurements(&t.measurements)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::SeverityLevel,
        tags::{CLOUD_ROLE, OPERATION_ID},
        telemetry::MetricAggregation,
    };
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use std::time::Duration;
    use test_case::test_case;

    fn timestamp() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn to_json(telemetry: impl Into<Telemetry>, tags: Tags) -> Value {
        let envelope = encode(&telemetry.into(), tags, "ikey").unwrap();
        serde_json::to_value(envelope).unwrap()
    }

    #[test]
    fn event() {
        let event = EventTelemetry::new("start")
            .with_timestamp(timestamp())
            .with_property("user", "marry")
            .with_measurement("items", 3.0);
        let tags = Tags::from([(CLOUD_ROLE, "api".to_string())]);
        assert_eq!(
            json!({
                "name": "Microsoft.ApplicationInsights.Event",
                "time": "2024-01-02T03:04:05.000Z",
                "iKey": "ikey",
                "tags": { "ai.cloud.role": "api" },
                "data": {
                    "baseType": "EventData",
                    "baseData": {
                        "ver": 2,
                        "name": "start",
                        "properties": { "user": "marry" },
                        "measurements": { "items": 3.0 },
                    },
                },
            }),
            to_json(event, tags)
        );
    }

    #[test]
    fn trace() {
        let trace = TraceTelemetry::new("hello")
            .with_timestamp(timestamp())
            .with_severity_level(SeverityLevel::Error);
        assert_eq!(
            json!({
                "name": "Microsoft.ApplicationInsights.Message",
                "time": "2024-01-02T03:04:05.000Z",
                "iKey": "ikey",
                "data": {
                    "baseType": "MessageData",
                    "baseData": { "ver": 2, "message": "hello", "severityLevel": 3 },
                },
            }),
            to_json(trace, Tags::new())
        );
    }

    #[test]
    fn metric() {
        let metric = MetricTelemetry::new("queue length", 12.0)
            .with_timestamp(timestamp())
            .with_namespace("worker")
            .with_aggregation(MetricAggregation {
                count: Some(3),
                min: Some(1.0),
                max: Some(8.0),
                std_dev: None,
            });
        assert_eq!(
            json!({
                "ver": 2,
                "metrics": [{
                    "ns": "worker",
                    "name": "queue length",
                    "kind": "Aggregation",
                    "count": 3,
                    "min": 1.0,
                    "max": 8.0,
                    "value": 12.0,
                }],
            }),
            to_json(metric, Tags::new())["data"]["baseData"]
        );
    }

    #[test]
    fn exception_chain() {
        let exception = ExceptionTelemetry {
            causes: vec!["disk full".into()],
            ..ExceptionTelemetry::new("IoError", "write failed").with_stack("main.rs:1")
        };
        assert_eq!(
            json!({
                "ver": 2,
                "exceptions": [
                    {
                        "id": 1,
                        "typeName": "IoError",
                        "message": "write failed",
                        "hasFullStack": true,
                        "stack": "main.rs:1",
                    },
                    {
                        "id": 2,
                        "outerId": 1,
                        "typeName": "<unknown>",
                        "message": "disk full",
                        "hasFullStack": false,
                    },
                ],
            }),
            to_json(exception, Tags::new())["data"]["baseData"]
        );
    }

    #[test]
    fn availability() {
        let availability = AvailabilityTelemetry {
            id: "test-run".into(),
            ..AvailabilityTelemetry::new("ping", Duration::from_millis(1500), false)
                .with_run_location("westeurope")
                .with_message("timeout")
        };
        let json = to_json(availability, Tags::new());
        assert_eq!("Microsoft.ApplicationInsights.Availability", json["name"]);
        assert_eq!(
            json!({
                "ver": 2,
                "id": "test-run",
                "name": "ping",
                "duration": "0.00:00:01.500000",
                "success": false,
                "runLocation": "westeurope",
                "message": "timeout",
            }),
            json["data"]["baseData"]
        );
    }

    #[test]
    fn dependency() {
        let dependency = DependencyTelemetry {
            id: "0123456789abcdef".into(),
            ..DependencyTelemetry::new("GET /users", Duration::from_millis(20), true)
                .with_type("HTTP")
                .with_target("example.com")
                .with_data("https://example.com/users?page=2")
                .with_result_code("200")
        };
        let json = to_json(dependency, Tags::new());
        assert_eq!("Microsoft.ApplicationInsights.RemoteDependency", json["name"]);
        assert_eq!("RemoteDependencyData", json["data"]["baseType"]);
        assert_eq!(
            json!({
                "ver": 2,
                "name": "GET /users",
                "id": "0123456789abcdef",
                "resultCode": "200",
                "duration": "0.00:00:00.020000",
                "success": true,
                "data": "https://example.com/users?page=2",
                "target": "example.com",
                "type": "HTTP",
            }),
            json["data"]["baseData"]
        );
    }

    #[test]
    fn page_view() {
        let page_view = PageViewTelemetry {
            id: "0123456789abcdef".into(),
            ..PageViewTelemetry::new("Home")
                .with_url("https://example.com/")
                .with_duration(Duration::from_secs(2))
        };
        let json = to_json(page_view, Tags::new());
        assert_eq!("Microsoft.ApplicationInsights.PageView", json["name"]);
        assert_eq!(
            json!({
                "ver": 2,
                "name": "Home",
                "url": "https://example.com/",
                "duration": "0.00:00:02.000000",
                "id": "0123456789abcdef",
            }),
            json["data"]["baseData"]
        );
    }

    #[test]
    fn request() {
        let request = RequestTelemetry::new("GET /", "200", Duration::from_millis(5), true)
            .with_id("0123456789abcdef")
            .with_url("https://example.com/")
            .with_source("10.1.2.3");
        let json = to_json(request, Tags::new());
        assert_eq!("Microsoft.ApplicationInsights.Request", json["name"]);
        assert_eq!(
            json!({
                "ver": 2,
                "id": "0123456789abcdef",
                "source": "10.1.2.3",
                "name": "GET /",
                "duration": "0.00:00:00.005000",
                "responseCode": "200",
                "success": true,
                "url": "https://example.com/",
            }),
            json["data"]["baseData"]
        );
    }

    #[test]
    fn truncates_oversized_text() {
        let trace = TraceTelemetry::new("m".repeat(40000));
        let json = to_json(trace, Tags::new());
        assert_eq!(
            32768,
            json["data"]["baseData"]["message"].as_str().unwrap().chars().count()
        );

        let event = EventTelemetry::new("e").with_property("k".repeat(200), "v");
        let json = to_json(event, Tags::new());
        let properties = json["data"]["baseData"]["properties"].as_object().unwrap();
        assert_eq!(150, properties.keys().next().unwrap().len());
    }

    #[test_case(EventTelemetry::new("n".repeat(2000)).into(), "/data/baseData/name" ; "event")]
    #[test_case(MetricTelemetry::new("n".repeat(2000), 1.0).into(), "/data/baseData/metrics/0/name" ; "metric")]
    #[test_case(RequestTelemetry::new("n".repeat(2000), "200", Duration::ZERO, true).into(), "/data/baseData/name" ; "request")]
    #[test_case(DependencyTelemetry::new("n".repeat(2000), Duration::ZERO, true).into(), "/data/baseData/name" ; "dependency")]
    #[test_case(AvailabilityTelemetry::new("n".repeat(2000), Duration::ZERO, true).into(), "/data/baseData/name" ; "availability")]
    #[test_case(PageViewTelemetry::new("n".repeat(2000)).into(), "/data/baseData/name" ; "page view")]
    fn truncates_long_names(telemetry: Telemetry, pointer: &str) {
        let json = to_json(telemetry, Tags::new());
        let name = json.pointer(pointer).and_then(Value::as_str).unwrap();
        assert_eq!(1024, name.chars().count());
    }

    #[test]
    fn omits_absent_optional_fields() {
        let json = to_json(EventTelemetry::new("e"), Tags::new());
        assert_eq!(None, json.get("tags"));
        assert_eq!(
            json!({ "ver": 2, "name": "e" }),
            json["data"]["baseData"]
        );
    }

    #[test_case(EventTelemetry::new("  ").into(), ValidationError::MissingField("name") ; "event without name")]
    #[test_case(TraceTelemetry::new("").into(), ValidationError::MissingField("message") ; "trace without message")]
    #[test_case(MetricTelemetry::new("m", f64::NAN).into(), ValidationError::NonFiniteValue("value") ; "metric nan")]
    #[test_case(ExceptionTelemetry::new("", "msg").into(), ValidationError::MissingField("typeName") ; "exception without type")]
    #[test_case(EventTelemetry::new("e").with_measurement("m", f64::INFINITY).into(), ValidationError::NonFiniteValue("measurements") ; "infinite measurement")]
    #[test_case(RequestTelemetry::new("r", "200", Duration::ZERO, true).with_id("").into(), ValidationError::MissingField("id") ; "request without id")]
    fn rejects_invalid_records(telemetry: Telemetry, expected: ValidationError) {
        assert_eq!(Err(expected), encode(&telemetry, Tags::new(), "ikey").map(|_| ()));
    }

    #[test]
    fn encoding_is_deterministic() {
        let event: Telemetry = EventTelemetry::new("e")
            .with_property("b", "2")
            .with_property("a", "1")
            .into();
        let tags = Tags::from([
            (OPERATION_ID, "op".to_string()),
            (CLOUD_ROLE, "api".to_string()),
        ]);
        let first = serde_json::to_vec(&encode(&event, tags.clone(), "ikey").unwrap()).unwrap();
        let second = serde_json::to_vec(&encode(&event, tags, "ikey").unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
