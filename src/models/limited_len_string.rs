use serde::Serialize;
use std::borrow::Cow;

/// A string which is cut to at most `N` characters on construction.
///
/// Application Insights documents a maximum length for every text field. Exceeding it makes the
/// ingestion service drop the whole item, so values are truncated instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub(crate) struct LimitedLenString<const N: usize>(String);

impl<const N: usize> AsRef<str> for LimitedLenString<N> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> From<String> for LimitedLenString<N> {
    fn from(mut s: String) -> Self {
        truncate_chars(&mut s, N);
        LimitedLenString(s)
    }
}

impl<const N: usize> From<&str> for LimitedLenString<N> {
    fn from(s: &str) -> Self {
        match s.char_indices().nth(N) {
            Some((idx, _)) => LimitedLenString(s[..idx].to_string()),
            None => LimitedLenString(s.to_string()),
        }
    }
}

impl<const N: usize> From<Cow<'_, str>> for LimitedLenString<N> {
    fn from(s: Cow<'_, str>) -> Self {
        match s {
            Cow::Borrowed(s) => s.into(),
            Cow::Owned(s) => s.into(),
        }
    }
}

/// Truncates the string to at most `max` characters, never splitting a character.
pub(crate) fn truncate_chars(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }

    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("abc", "abc" ; "short")]
    #[test_case("abcd", "abcd" ; "exact")]
    #[test_case("abcde", "abcd" ; "long")]
    #[test_case("äöüßé", "äöüß" ; "multi byte")]
    fn limits_length(input: &'static str, expected: &'static str) {
        let borrowed: LimitedLenString<4> = input.into();
        let owned: LimitedLenString<4> = input.to_string().into();
        assert_eq!(expected, borrowed.as_ref());
        assert_eq!(expected, owned.as_ref());
    }

    #[test]
    fn counts_characters_not_bytes() {
        let mut s = "€".repeat(10);
        truncate_chars(&mut s, 3);
        assert_eq!("€€€", s);
    }
}
