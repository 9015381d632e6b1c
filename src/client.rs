use crate::{
    context::OperationContext,
    error::Error,
    models::SeverityLevel,
    publisher::{Batch, PublishResult, Publisher},
    tags::{ContextTagKey, Tags},
    telemetry::{
        AvailabilityTelemetry, DependencyTelemetry, EventTelemetry, ExceptionTelemetry,
        MetricTelemetry, PageViewTelemetry, RequestTelemetry, Telemetry, TraceTelemetry,
    },
};
use futures_util::future::join_all;
use http::Uri;
use parking_lot::{Mutex, RwLock};
use std::{error::Error as StdError, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Outcome of publishing one batch through one publisher.
#[derive(Debug)]
pub struct PublishOutcome {
    /// Endpoint of the publisher.
    pub endpoint: Uri,
    /// What happened to the batch.
    pub result: PublishResult,
}

/// Collects telemetry from any number of threads and publishes it on request.
///
/// Records are buffered in memory until [`TelemetryClient::publish`] is called. The client never
/// publishes on its own.
///
/// # Delivery
///
/// Every record is handed to the publishers exactly once. A publish drains the buffer before
/// anything is sent; if sending fails or is cancelled, the records are **not** put back. The
/// failed batch is returned in the [`PublishFailure`](crate::PublishFailure) so callers which
/// need at-least-once delivery can persist or re-add it themselves.
#[derive(Debug)]
pub struct TelemetryClient {
    publishers: Vec<Publisher>,
    tags: Tags,
    buffer: Mutex<Vec<Telemetry>>,
    operation_context: RwLock<Option<Arc<OperationContext>>>,
}

impl TelemetryClient {
    /// Create a client publishing to the given publishers.
    pub fn new(publishers: impl IntoIterator<Item = Publisher>) -> Self {
        TelemetryClient {
            publishers: publishers.into_iter().collect(),
            tags: Tags::new(),
            buffer: Mutex::new(Vec::new()),
            operation_context: RwLock::new(None),
        }
    }

    /// Set tags added to every record. Publisher and record tags override them.
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Set a single client tag.
    pub fn with_tag(mut self, key: ContextTagKey, value: impl Into<String>) -> Self {
        self.tags.insert(key, value.into());
        self
    }

    /// Add another publisher.
    pub fn with_publisher(mut self, publisher: Publisher) -> Self {
        self.publishers.push(publisher);
        self
    }

    /// Client tags.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Configured publishers.
    pub fn publishers(&self) -> &[Publisher] {
        &self.publishers
    }

    /// Number of records waiting for the next publish.
    pub fn buffered(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Buffer a record as is. Client tags are merged in when it is published.
    pub fn add(&self, record: impl Into<Telemetry>) {
        self.buffer.lock().push(record.into());
    }

    /// Buffer a record after stamping it with the current operation context.
    ///
    /// Tags already set on the record are kept.
    pub fn track(&self, record: impl Into<Telemetry>) {
        let mut record = record.into();
        if let Some(context) = self.operation_context() {
            context.stamp(record.tags_mut());
        }
        self.add(record);
    }

    /// Track a custom event.
    pub fn track_event(&self, name: impl Into<String>) -> Result<(), Error> {
        let name = required(name.into(), "event name must not be empty")?;
        self.track(EventTelemetry::new(name));
        Ok(())
    }

    /// Track a trace message.
    pub fn track_trace(
        &self,
        message: impl Into<String>,
        severity_level: SeverityLevel,
    ) -> Result<(), Error> {
        let message = required(message.into(), "trace message must not be empty")?;
        self.track(TraceTelemetry::new(message).with_severity_level(severity_level));
        Ok(())
    }

    /// Track a single metric measurement.
    pub fn track_metric(&self, name: impl Into<String>, value: f64) -> Result<(), Error> {
        let name = required(name.into(), "metric name must not be empty")?;
        if !value.is_finite() {
            return Err(Error::InvalidArgument("metric value must be finite"));
        }
        self.track(MetricTelemetry::new(name, value));
        Ok(())
    }

    /// Track an error, including its chain of sources.
    pub fn track_exception<E: StdError + ?Sized>(&self, error: &E) -> Result<(), Error> {
        self.track(ExceptionTelemetry::from_error(error));
        Ok(())
    }

    /// Track the result of an availability test.
    pub fn track_availability(
        &self,
        name: impl Into<String>,
        duration: Duration,
        success: bool,
    ) -> Result<(), Error> {
        let name = required(name.into(), "availability test name must not be empty")?;
        self.track(AvailabilityTelemetry::new(name, duration, success));
        Ok(())
    }

    /// Track a call to a remote component, e.g. a database or an HTTP API.
    pub fn track_dependency(
        &self,
        name: impl Into<String>,
        dependency_type: impl Into<String>,
        target: impl Into<String>,
        duration: Duration,
        success: bool,
    ) -> Result<(), Error> {
        let name = required(name.into(), "dependency name must not be empty")?;
        self.track(
            DependencyTelemetry::new(name, duration, success)
                .with_type(dependency_type)
                .with_target(target),
        );
        Ok(())
    }

    /// Track a page view.
    pub fn track_page_view(
        &self,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<(), Error> {
        let name = required(name.into(), "page name must not be empty")?;
        self.track(PageViewTelemetry::new(name).with_url(url));
        Ok(())
    }

    /// Track an incoming request.
    pub fn track_request(
        &self,
        name: impl Into<String>,
        url: impl Into<String>,
        response_code: impl Into<String>,
        duration: Duration,
        success: bool,
    ) -> Result<(), Error> {
        let name = required(name.into(), "request name must not be empty")?;
        self.track(RequestTelemetry::new(name, response_code, duration, success).with_url(url));
        Ok(())
    }

    /// Current operation context, if any.
    pub fn operation_context(&self) -> Option<Arc<OperationContext>> {
        self.operation_context.read().clone()
    }

    /// Make `context` the current operation context.
    pub fn set_operation_context(&self, context: OperationContext) {
        self.replace_operation_context(Some(context));
    }

    /// Replace the current operation context and return the previous one.
    ///
    /// The client does not keep a stack of contexts. When entering a nested operation, keep the
    /// returned context and put it back when the nested operation ends.
    pub fn replace_operation_context(
        &self,
        context: Option<OperationContext>,
    ) -> Option<Arc<OperationContext>> {
        std::mem::replace(&mut *self.operation_context.write(), context.map(Arc::new))
    }

    /// Remove the current operation context.
    pub fn clear_operation_context(&self) -> Option<Arc<OperationContext>> {
        self.replace_operation_context(None)
    }

    /// Send all buffered records to every publisher.
    ///
    /// The buffer is drained at once; records added while the publish is running are left for
    /// the next call. Publishers run concurrently and independently, and their outcomes are
    /// returned in the order the publishers were configured. If nothing was buffered no request
    /// is made and the list is empty.
    ///
    /// Cancelling `cancel` aborts in-flight requests. Drained records are not restored, see
    /// [Delivery](TelemetryClient#delivery).
    pub async fn publish(&self, cancel: &CancellationToken) -> Vec<PublishOutcome> {
        let records = std::mem::take(&mut *self.buffer.lock());
        if records.is_empty() {
            debug!("Nothing to publish");
            return Vec::new();
        }

        let batch = Batch::from(records);
        debug!(
            records = batch.len(),
            publishers = self.publishers.len(),
            "Publishing telemetry"
        );
        join_all(self.publishers.iter().map(|publisher| {
            let batch = &batch;
            async move {
                PublishOutcome {
                    endpoint: publisher.endpoint().clone(),
                    result: publisher.publish(batch, &self.tags, cancel).await,
                }
            }
        }))
        .await
    }
}

fn required(value: String, message: &'static str) -> Result<String, Error> {
    if value.trim().is_empty() {
        Err(Error::InvalidArgument(message))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{CLOUD_ROLE, OPERATION_ID, OPERATION_NAME, OPERATION_PARENT_ID};
    use std::thread;
    use test_case::test_case;

    fn empty_client() -> TelemetryClient {
        TelemetryClient::new(Vec::<Publisher>::new())
    }

    fn drain(client: &TelemetryClient) -> Vec<Telemetry> {
        std::mem::take(&mut *client.buffer.lock())
    }

    #[test]
    fn add_keeps_record_unchanged() {
        let client = empty_client();
        client.set_operation_context(OperationContext::from_parts("op", None, None));
        let record = EventTelemetry::new("start");
        client.add(record.clone());
        assert_eq!(vec![Telemetry::Event(record)], drain(&client));
    }

    #[test]
    fn track_stamps_operation_context() {
        let client = empty_client();
        client.set_operation_context(OperationContext::from_parts(
            "op-id",
            Some("GET /".into()),
            Some("parent".into()),
        ));
        client.track_event("start").unwrap();

        let records = drain(&client);
        let tags = records[0].tags();
        assert_eq!("op-id", tags[&OPERATION_ID]);
        assert_eq!("GET /", tags[&OPERATION_NAME]);
        assert_eq!("parent", tags[&OPERATION_PARENT_ID]);
    }

    #[test]
    fn track_without_context_adds_no_tags() {
        let client = empty_client();
        client.track_trace("hello", SeverityLevel::Information).unwrap();
        assert!(drain(&client)[0].tags().is_empty());
    }

    #[test]
    fn track_keeps_explicit_record_tags() {
        let client = empty_client();
        client.set_operation_context(OperationContext::from_parts("op-id", None, None));
        client.track(EventTelemetry::new("e").with_tag(OPERATION_ID, "mine"));
        assert_eq!("mine", drain(&client)[0].tags()[&OPERATION_ID]);
    }

    #[test_case(|c: &TelemetryClient| c.track_event("") ; "event")]
    #[test_case(|c: &TelemetryClient| c.track_trace(" ", SeverityLevel::Error) ; "trace")]
    #[test_case(|c: &TelemetryClient| c.track_metric("m", f64::NAN) ; "metric value")]
    #[test_case(|c: &TelemetryClient| c.track_metric("", 1.0) ; "metric name")]
    #[test_case(|c: &TelemetryClient| c.track_availability("", Duration::ZERO, true) ; "availability")]
    #[test_case(|c: &TelemetryClient| c.track_dependency("", "SQL", "db", Duration::ZERO, true) ; "dependency")]
    #[test_case(|c: &TelemetryClient| c.track_page_view("", "https://example.com") ; "page view")]
    #[test_case(|c: &TelemetryClient| c.track_request("", "/", "200", Duration::ZERO, true) ; "request")]
    fn invalid_arguments_are_not_buffered(track: fn(&TelemetryClient) -> Result<(), Error>) {
        let client = empty_client();
        assert!(matches!(track(&client), Err(Error::InvalidArgument(_))));
        assert_eq!(0, client.buffered());
    }

    #[test]
    fn replace_returns_previous_context() {
        let client = empty_client();
        let outer = OperationContext::new("outer");
        client.set_operation_context(outer.clone());

        let previous = client.replace_operation_context(Some(outer.child("activity")));
        assert_eq!(Some(&outer), previous.as_deref());
        assert_eq!(
            Some("activity"),
            client.operation_context().unwrap().parent_id()
        );

        client.replace_operation_context(previous.as_deref().cloned());
        assert_eq!(Some(outer), client.operation_context().as_deref().cloned());
        client.clear_operation_context();
        assert!(client.operation_context().is_none());
    }

    #[test]
    fn context_is_read_as_a_whole() {
        let client = Arc::new(empty_client());
        client.set_operation_context(OperationContext::from_parts("a", Some("a".into()), None));

        let writer = {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for i in 0..1000 {
                    let id = if i % 2 == 0 { "b" } else { "a" };
                    client.set_operation_context(OperationContext::from_parts(
                        id,
                        Some(id.into()),
                        None,
                    ));
                }
            })
        };
        for _ in 0..1000 {
            client.track_event("e").unwrap();
        }
        writer.join().unwrap();

        for record in drain(&client) {
            let tags = record.tags();
            assert_eq!(tags[&OPERATION_ID], tags[&OPERATION_NAME]);
            assert_eq!(tags[&OPERATION_ID], tags[&OPERATION_PARENT_ID]);
        }
    }

    #[tokio::test]
    async fn publish_without_records_makes_no_requests() {
        let client = empty_client().with_tag(CLOUD_ROLE, "api");
        assert!(client.publish(&CancellationToken::new()).await.is_empty());
    }

    #[tokio::test]
    async fn publish_drains_buffer_even_without_publishers() {
        let client = empty_client();
        client.track_event("e").unwrap();
        assert!(client.publish(&CancellationToken::new()).await.is_empty());
        assert_eq!(0, client.buffered());
    }
}
