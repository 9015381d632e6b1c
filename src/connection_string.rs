use std::{borrow::Cow, collections::HashMap, str::FromStr};

pub(crate) const DEFAULT_BREEZE_ENDPOINT: &str = "https://dc.services.visualstudio.com";
const FIELDS_SEPARATOR: char = ';';
const FIELD_KEY_VALUE_SEPARATOR: char = '=';

/// How the ingestion endpoint authenticates uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Authorization {
    /// The instrumentation key in the payload is enough.
    InstrumentationKey,
    /// Uploads need a Microsoft Entra ID bearer token.
    Aad,
}

#[derive(Debug)]
pub(crate) struct ConnectionString {
    pub(crate) ingestion_endpoint: http::Uri,
    pub(crate) instrumentation_key: String,
    pub(crate) authorization: Authorization,
}

/// Errors parsing an Application Insights connection string.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// A field was not a single `Key=Value` pair.
    #[error("invalid format")]
    InvalidFormat,
    /// The `InstrumentationKey` field is missing.
    #[error("missing instrumentation key")]
    MissingInstrumentationKey,
    /// The `Authorization` field has an unknown value.
    #[error("unsupported authorization; only \"ikey\" and \"aad\" are supported")]
    UnsupportedAuthorization,
    /// An endpoint is not a valid URI.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(http::uri::InvalidUri),
}

impl FromStr for ConnectionString {
    type Err = ParseError;

    /// Parse the given connection string.
    ///
    /// Based on
    /// https://github.com/Azure/azure-sdk-for-js/blob/a4b3762fd7503f90c7bc3bacf9e45ecc4012d3fa/sdk/monitor/monitor-opentelemetry-exporter/src/utils/connectionStringParser.ts
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut result: HashMap<String, String> = s
            .split(FIELDS_SEPARATOR)
            .filter(|kv| !kv.trim().is_empty())
            .map(|kv| {
                let parts: Vec<&str> = kv.split(FIELD_KEY_VALUE_SEPARATOR).collect();
                if parts.len() == 2 {
                    Ok((parts[0].trim().to_lowercase(), parts[1].to_string()))
                } else {
                    Err(ParseError::InvalidFormat)
                }
            })
            .collect::<Result<_, _>>()?;

        let ingestion_endpoint =
            if let Some(ingestion_endpoint) = result.remove("ingestionendpoint") {
                sanitize_url(ingestion_endpoint)?
            } else if let Some(endpoint_suffix) = result.remove("endpointsuffix") {
                let location_prefix = result
                    .remove("location")
                    .map(|x| format!("{}.", x.trim()))
                    .unwrap_or_default();
                sanitize_url(format!(
                    "https://{}dc.{}",
                    location_prefix,
                    endpoint_suffix.trim()
                ))?
            } else {
                http::Uri::from_static(DEFAULT_BREEZE_ENDPOINT)
            };

        let authorization = match result.remove("authorization") {
            None => Authorization::InstrumentationKey,
            Some(authorization) if authorization.trim().eq_ignore_ascii_case("ikey") => {
                Authorization::InstrumentationKey
            }
            Some(authorization) if authorization.trim().eq_ignore_ascii_case("aad") => {
                Authorization::Aad
            }
            Some(_) => return Err(ParseError::UnsupportedAuthorization),
        };
        let instrumentation_key = result
            .remove("instrumentationkey")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ParseError::MissingInstrumentationKey)?;

        Ok(ConnectionString {
            ingestion_endpoint,
            instrumentation_key,
            authorization,
        })
    }
}

fn sanitize_url(url: String) -> Result<http::Uri, ParseError> {
    let mut new_url: Cow<str> = url.trim().into();
    if !new_url.starts_with("https://") {
        new_url = new_url.replace("http://", "https://").into();
    }

    new_url
        .trim_end_matches('/')
        .try_into()
        .map_err(ParseError::InvalidEndpoint)
}
