use crate::{
    error::{Error, RejectedItem},
    models::Envelope,
};
use bytes::Bytes;
use flate2::{write::GzEncoder, Compression};
use http::{HeaderValue, Request, Response, StatusCode, Uri};
use opentelemetry_http::HttpClient;
use serde::Deserialize;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const CONTENT_TYPE: &str = "application/x-json-stream";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Transmission {
    items_received: usize,
    items_accepted: usize,
    #[serde(default)]
    errors: Vec<TransmissionItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransmissionItem {
    index: usize,
    status_code: u16,
    #[serde(default)]
    message: String,
}

/// Sends serialized telemetry items to the server. Makes exactly one attempt.
///
/// On partial acceptance the indices of rejected items refer to positions in `envelopes`.
pub(crate) async fn send(
    client: &dyn HttpClient,
    endpoint: &Uri,
    envelopes: &[Envelope],
    bearer_token: Option<&str>,
    cancel: &CancellationToken,
) -> Result<StatusCode, Error> {
    let payload = serialize_request_body(envelopes)?;

    let mut request = Request::post(endpoint)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
        .header(http::header::CONTENT_ENCODING, "gzip");
    if let Some(token) = bearer_token {
        let mut value = HeaderValue::try_from(format!("Bearer {}", token))
            .map_err(|err| Error::UploadConnection(err.into()))?;
        value.set_sensitive(true);
        request = request.header(http::header::AUTHORIZATION, value);
    }
    let request = request
        .body(Bytes::from(payload))
        .map_err(|err| Error::UploadConnection(err.into()))?;

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        response = client.send_bytes(request) => response.map_err(Error::UploadConnection)?,
    };
    handle_response(response)
}

/// Serializes the envelopes as newline delimited JSON and compresses them with gzip.
pub(crate) fn serialize_request_body(envelopes: &[Envelope]) -> Result<Vec<u8>, Error> {
    let mut serialized = Vec::new();
    for (i, envelope) in envelopes.iter().enumerate() {
        if i > 0 {
            serialized.push(b'\n');
        }
        serde_json::to_writer(&mut serialized, envelope).map_err(Error::UploadSerializeRequest)?;
    }

    let mut gzip_encoder = GzEncoder::new(Vec::new(), Compression::default());
    gzip_encoder
        .write_all(&serialized)
        .map_err(Error::UploadCompressRequest)?;
    gzip_encoder.finish().map_err(Error::UploadCompressRequest)
}

fn handle_response(response: Response<Bytes>) -> Result<StatusCode, Error> {
    let status = response.status();
    match status {
        StatusCode::OK => Ok(status),
        StatusCode::PARTIAL_CONTENT => {
            let content: Transmission = serde_json::from_slice(response.body())
                .map_err(Error::UploadDeserializeResponse)?;
            if content.items_received == content.items_accepted {
                Ok(status)
            } else {
                warn!(
                    received = content.items_received,
                    accepted = content.items_accepted,
                    "Ingestion service rejected some items"
                );
                Err(Error::PartialAccept {
                    received: content.items_received,
                    accepted: content.items_accepted,
                    rejected: content
                        .errors
                        .into_iter()
                        .map(|item| RejectedItem {
                            index: item.index,
                            status_code: item.status_code,
                            message: item.message,
                        })
                        .collect(),
                })
            }
        }
        status => {
            let body = String::from_utf8_lossy(response.body()).into_owned();
            debug!(%status, %body, "Ingestion service returned an error");
            Err(Error::Upload { status, body })
        }
    }
}

/// Appends a path to the URI, e.g. `v2/track` to the ingestion endpoint.
pub(crate) fn append_path(uri: impl ToString, path: &str) -> Result<Uri, http::uri::InvalidUri> {
    let mut uri = uri.to_string();
    if !uri.ends_with('/') {
        uri.push('/');
    }
    uri.push_str(path.trim_start_matches('/'));
    uri.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use test_case::test_case;

    fn response(status: u16, body: &'static str) -> Response<Bytes> {
        Response::builder()
            .status(status)
            .body(Bytes::from(body))
            .unwrap()
    }

    #[test_case("https://dc.services.visualstudio.com", "https://dc.services.visualstudio.com/v2/track" ; "no trailing slash")]
    #[test_case("https://example.com/", "https://example.com/v2/track" ; "trailing slash")]
    #[test_case("https://example.com/prefix", "https://example.com/prefix/v2/track" ; "with path")]
    fn append_track_path(base: &'static str, expected: &'static str) {
        let uri = append_path(base, "v2/track").unwrap();
        assert_eq!(expected, uri.to_string());
    }

    #[test]
    fn success() {
        assert_eq!(Ok(StatusCode::OK), handle_response(response(200, "{}")).map_err(|_| ()));
    }

    #[test]
    fn partial_content_fully_accepted() {
        let body = r#"{"itemsReceived":2,"itemsAccepted":2,"errors":[]}"#;
        assert!(handle_response(response(206, body)).is_ok());
    }

    #[test]
    fn partial_content_with_rejections() {
        let body = r#"{"itemsReceived":3,"itemsAccepted":2,"errors":[{"index":1,"statusCode":400,"message":"invalid"}]}"#;
        match handle_response(response(206, body)) {
            Err(Error::PartialAccept {
                received,
                accepted,
                rejected,
            }) => {
                assert_eq!(3, received);
                assert_eq!(2, accepted);
                assert_eq!(
                    vec![RejectedItem {
                        index: 1,
                        status_code: 400,
                        message: "invalid".into()
                    }],
                    rejected
                );
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn error_status_keeps_body() {
        match handle_response(response(503, "try later")) {
            Err(Error::Upload { status, body }) => {
                assert_eq!(StatusCode::SERVICE_UNAVAILABLE, status);
                assert_eq!("try later", body);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn body_is_gzipped_newline_delimited_json() {
        let envelope = |name: &str| Envelope {
            name: name.into(),
            time: "2020-06-21T10:40:00.000Z".into(),
            i_key: None,
            tags: None,
            data: crate::models::Data::Event(crate::models::EventData {
                ver: 2,
                name: "e".into(),
                properties: None,
                measurements: None,
            }),
        };
        let payload = serialize_request_body(&[envelope("a"), envelope("b")]).unwrap();

        let mut json = String::new();
        GzDecoder::new(payload.as_slice())
            .read_to_string(&mut json)
            .unwrap();
        let lines: Vec<_> = json.lines().collect();
        assert_eq!(2, lines.len());
        assert!(lines[0].starts_with(r#"{"name":"a""#));
        assert!(lines[1].starts_with(r#"{"name":"b""#));
    }
}
