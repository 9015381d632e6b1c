//! Context tags attached to every envelope.
//!
//! Tags come from three places: the client, the publisher and the individual record. They are
//! merged when a batch is published, with the most specific level winning for each key:
//! record tags override publisher tags, which override client tags.

use crate::models::truncate_chars;
use once_cell::sync::Lazy;
use serde::ser::{Serialize, Serializer};
use std::{collections::BTreeMap, collections::HashMap, fmt, str::FromStr};

/// A well-known Application Insights context tag key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextTagKey {
    key: &'static str,
    max_len: usize,
}

impl ContextTagKey {
    const fn new(key: &'static str, max_len: usize) -> Self {
        ContextTagKey { key, max_len }
    }

    /// Key as it appears on the wire, e.g. `ai.cloud.role`.
    pub fn as_str(&self) -> &'static str {
        self.key
    }

    /// Maximum length of a value for this key. Longer values are truncated.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl fmt::Display for ContextTagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key)
    }
}

impl Serialize for ContextTagKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.key)
    }
}

/// Error returned when parsing a string which is not a known context tag key.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown context tag key: {0}")]
pub struct UnknownTagKey(pub String);

impl FromStr for ContextTagKey {
    type Err = UnknownTagKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TAG_KEY_LOOKUP
            .get(s)
            .copied()
            .ok_or_else(|| UnknownTagKey(s.to_string()))
    }
}

/// A set of context tags. At most one value per key.
pub type Tags = BTreeMap<ContextTagKey, String>;

/// Application version. Information in the application context fields is always about the
/// application that is sending the telemetry.
pub const APPLICATION_VERSION: ContextTagKey = ContextTagKey::new("ai.application.ver", 1024);

/// Unique client device id. Computer name in most cases.
pub const DEVICE_ID: ContextTagKey = ContextTagKey::new("ai.device.id", 1024);

/// Device locale using <language>-<REGION> pattern, following RFC 5646. Example 'en-US'.
pub const DEVICE_LOCALE: ContextTagKey = ContextTagKey::new("ai.device.locale", 64);

/// Model of the device the end user of the application is using. Used for client scenarios. If
/// this field is empty then it is derived from the user agent.
pub const DEVICE_MODEL: ContextTagKey = ContextTagKey::new("ai.device.model", 256);

/// Client device OEM name taken from the browser.
pub const DEVICE_OEM_NAME: ContextTagKey = ContextTagKey::new("ai.device.oemName", 256);

/// Operating system name and version of the device the end user of the application is using. If
/// this field is empty then it is derived from the user agent. Example 'Windows 10 Pro
/// 10.0.10586.0'
pub const DEVICE_OS_VERSION: ContextTagKey = ContextTagKey::new("ai.device.osVersion", 256);

/// The type of the device the end user of the application is using. Used primarily to distinguish
/// JavaScript telemetry from server side telemetry. Examples: 'PC', 'Phone', 'Browser'. 'PC' is
/// the default value.
pub const DEVICE_TYPE: ContextTagKey = ContextTagKey::new("ai.device.type", 64);

/// The IP address of the client device. IPv4 and IPv6 are supported. Information in the location
/// context fields is always about the end user. When telemetry is sent from a service, the
/// location context is about the user that initiated the operation in the service.
pub const LOCATION_IP: ContextTagKey = ContextTagKey::new("ai.location.ip", 46);

/// The country of the client device. If any of Country, Province, or City is specified, those
/// values will be preferred over geolocation of the IP address field.
pub const LOCATION_COUNTRY: ContextTagKey = ContextTagKey::new("ai.location.country", 256);

/// The province/state of the client device.
pub const LOCATION_PROVINCE: ContextTagKey = ContextTagKey::new("ai.location.province", 256);

/// The city of the client device.
pub const LOCATION_CITY: ContextTagKey = ContextTagKey::new("ai.location.city", 256);

/// A unique identifier for the operation instance. The operation.id is created by either a request
/// or a page view. All other telemetry sets this to the value for the containing request or page
/// view. Operation.id is used for finding all the telemetry items for a specific operation
/// instance.
pub const OPERATION_ID: ContextTagKey = ContextTagKey::new("ai.operation.id", 128);

/// The name (group) of the operation. The operation.name is created by either a request or a page
/// view. All other telemetry items set this to the value for the containing request or page view.
/// Operation.name is used for finding all the telemetry items for a group of operations (i.e. 'GET
/// Home/Index').
pub const OPERATION_NAME: ContextTagKey = ContextTagKey::new("ai.operation.name", 1024);

/// The unique identifier of the telemetry item's immediate parent.
pub const OPERATION_PARENT_ID: ContextTagKey = ContextTagKey::new("ai.operation.parentId", 128);

/// Name of synthetic source. Some telemetry from the application may represent a synthetic
/// traffic. It may be web crawler indexing the web site, site availability tests or traces from
/// diagnostic libraries like Application Insights SDK itself.
pub const OPERATION_SYNTHETIC_SOURCE: ContextTagKey =
    ContextTagKey::new("ai.operation.syntheticSource", 1024);

/// The correlation vector is a light weight vector clock which can be used to identify and order
/// related events across clients and services.
pub const OPERATION_CORRELATION_VECTOR: ContextTagKey =
    ContextTagKey::new("ai.operation.correlationVector", 64);

/// Session ID - the instance of the user's interaction with the app.
pub const SESSION_ID: ContextTagKey = ContextTagKey::new("ai.session.id", 64);

/// Boolean value indicating whether the session identified by ai.session.id is first for the user
/// or not.
pub const SESSION_IS_FIRST: ContextTagKey = ContextTagKey::new("ai.session.isFirst", 5);

/// In multi-tenant applications this is the account ID or name which the user is acting with.
pub const USER_ACCOUNT_ID: ContextTagKey = ContextTagKey::new("ai.user.accountId", 1024);

/// Anonymous user id. Represents the end user of the application.
pub const USER_ID: ContextTagKey = ContextTagKey::new("ai.user.id", 128);

/// Authenticated user id. The opposite of ai.user.id, this represents the user with a friendly
/// name. Since it's PII information it is not collected by default by most SDKs.
pub const USER_AUTH_USER_ID: ContextTagKey = ContextTagKey::new("ai.user.authUserId", 1024);

/// Name of the role the application is a part of. Maps directly to the role name in azure.
pub const CLOUD_ROLE: ContextTagKey = ContextTagKey::new("ai.cloud.role", 256);

/// Name of the instance where the application is running. Computer name for on-premisis, instance
/// name for Azure.
pub const CLOUD_ROLE_INSTANCE: ContextTagKey = ContextTagKey::new("ai.cloud.roleInstance", 256);

/// SDK version. See
/// https://github.com/Microsoft/ApplicationInsights-Home/blob/master/SDK-AUTHORING.md#sdk-version-specification
/// for information.
pub const INTERNAL_SDK_VERSION: ContextTagKey = ContextTagKey::new("ai.internal.sdkVersion", 64);

/// Agent version. Used to indicate the version of StatusMonitor installed on the computer if it is
/// used for data collection.
pub const INTERNAL_AGENT_VERSION: ContextTagKey =
    ContextTagKey::new("ai.internal.agentVersion", 64);

/// This is the node name used for billing purposes. Use it to override the standard detection of
/// nodes.
pub const INTERNAL_NODE_NAME: ContextTagKey = ContextTagKey::new("ai.internal.nodeName", 256);

static TAG_KEY_LOOKUP: Lazy<HashMap<&'static str, ContextTagKey>> = Lazy::new(|| {
    [
        APPLICATION_VERSION,
        DEVICE_ID,
        DEVICE_LOCALE,
        DEVICE_MODEL,
        DEVICE_OEM_NAME,
        DEVICE_OS_VERSION,
        DEVICE_TYPE,
        LOCATION_IP,
        LOCATION_COUNTRY,
        LOCATION_PROVINCE,
        LOCATION_CITY,
        OPERATION_ID,
        OPERATION_NAME,
        OPERATION_PARENT_ID,
        OPERATION_SYNTHETIC_SOURCE,
        OPERATION_CORRELATION_VECTOR,
        SESSION_ID,
        SESSION_IS_FIRST,
        USER_ACCOUNT_ID,
        USER_ID,
        USER_AUTH_USER_ID,
        CLOUD_ROLE,
        CLOUD_ROLE_INSTANCE,
        INTERNAL_SDK_VERSION,
        INTERNAL_AGENT_VERSION,
        INTERNAL_NODE_NAME,
    ]
    .into_iter()
    .map(|key| (key.as_str(), key))
    .collect()
});

/// Merges the three tag levels into the effective tag set of one record.
///
/// Later arguments win on key collisions: `record` over `publisher` over `client`. Values are
/// truncated to the maximum length of their key.
pub(crate) fn merge_tags(client: &Tags, publisher: &Tags, record: &Tags) -> Tags {
    let mut merged = client.clone();
    for (key, value) in publisher.iter().chain(record.iter()) {
        merged.insert(*key, value.clone());
    }
    for (key, value) in merged.iter_mut() {
        truncate_chars(value, key.max_len());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(key: ContextTagKey, value: &str) -> Tags {
        Tags::from([(key, value.to_string())])
    }

    #[test]
    fn most_specific_level_wins() {
        let client = tags(CLOUD_ROLE, "c");
        let publisher = tags(CLOUD_ROLE, "b");
        let record = tags(CLOUD_ROLE, "a");

        let merged = merge_tags(&client, &publisher, &record);
        assert_eq!(Some("a"), merged.get(&CLOUD_ROLE).map(String::as_str));

        let merged = merge_tags(&client, &publisher, &Tags::new());
        assert_eq!(Some("b"), merged.get(&CLOUD_ROLE).map(String::as_str));

        let merged = merge_tags(&client, &Tags::new(), &Tags::new());
        assert_eq!(Some("c"), merged.get(&CLOUD_ROLE).map(String::as_str));
    }

    #[test]
    fn absent_keys_fall_through() {
        let client = tags(CLOUD_ROLE, "api");
        let publisher = tags(CLOUD_ROLE_INSTANCE, "vm-1");
        let record = tags(OPERATION_ID, "op");

        let merged = merge_tags(&client, &publisher, &record);
        assert_eq!(3, merged.len());
    }

    #[test]
    fn values_are_truncated_per_key() {
        let record = tags(OPERATION_ID, &"1".repeat(200));
        let merged = merge_tags(&Tags::new(), &Tags::new(), &record);
        assert_eq!(128, merged[&OPERATION_ID].len());
    }

    #[test]
    fn parse_known_keys() {
        assert_eq!(Ok(CLOUD_ROLE), "ai.cloud.role".parse());
        assert_eq!(
            Err(UnknownTagKey("ai.unknown".into())),
            "ai.unknown".parse::<ContextTagKey>()
        );
    }

    #[test]
    fn serializes_as_plain_key() {
        let serialized = serde_json::to_string(&tags(SESSION_IS_FIRST, "true")).unwrap();
        assert_eq!(r#"{"ai.session.isFirst":"true"}"#, serialized);
    }
}
