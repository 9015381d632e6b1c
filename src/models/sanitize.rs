use crate::models::limited_len_string::truncate_chars;
use std::collections::BTreeMap;
use tracing::debug;

pub(crate) const PROPERTY_KEY_MAX_LEN: usize = 150;
pub(crate) const PROPERTY_VALUE_MAX_LEN: usize = 8192;

/// Custom properties as sent in the `properties` field of each data payload.
pub(crate) type Properties = BTreeMap<String, String>;

/// Custom measurements as sent in the `measurements` field of each data payload.
pub(crate) type Measurements = BTreeMap<String, f64>;

pub(crate) trait Sanitize {
    fn sanitize(&mut self);
}

impl Sanitize for Properties {
    fn sanitize(&mut self) {
        truncate_keys(self);
        for value in self.values_mut() {
            truncate_chars(value, PROPERTY_VALUE_MAX_LEN);
        }
    }
}

impl Sanitize for Measurements {
    fn sanitize(&mut self) {
        truncate_keys(self);
    }
}

fn truncate_keys<V>(map: &mut BTreeMap<String, V>) {
    let long_keys: Vec<_> = map
        .keys()
        .filter(|k| k.chars().count() > PROPERTY_KEY_MAX_LEN)
        .cloned()
        .collect();
    for long_key in long_keys {
        if let Some((mut key, value)) = map.remove_entry(&long_key) {
            truncate_chars(&mut key, PROPERTY_KEY_MAX_LEN);
            if map.contains_key(&key) {
                debug!(
                    key = %key,
                    "Truncated property name overrides property with the same name"
                );
            }
            map.insert(key, value);
        }
    }
}

/// Sanitizes the map and drops it if it ends up empty.
pub(crate) fn sanitized<T: Sanitize + IsEmpty>(mut map: T) -> Option<T> {
    map.sanitize();
    Some(map).filter(|x| !x.is_empty())
}

pub(crate) trait IsEmpty {
    fn is_empty(&self) -> bool;
}

impl<V> IsEmpty for BTreeMap<String, V> {
    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}
