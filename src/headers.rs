//! Ordered, case-insensitive header multi-map

use crate::{Error, Result};

/// Values stored under one header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValues {
    /// The header occurred once
    Single(String),
    /// The header occurred several times, in arrival order
    Multiple(Vec<String>),
}

impl HeaderValues {
    /// Iterate over every value in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            HeaderValues::Single(value) => std::slice::from_ref(value),
            HeaderValues::Multiple(values) => values,
        };
        values.iter().map(String::as_str)
    }

    /// First value received
    pub fn first(&self) -> &str {
        match self {
            HeaderValues::Single(value) => value,
            HeaderValues::Multiple(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// All values joined with `", "`
    pub fn joined(&self) -> String {
        self.iter().collect::<Vec<_>>().join(", ")
    }

    fn push(&mut self, value: String) {
        match self {
            HeaderValues::Single(existing) => {
                let first = std::mem::take(existing);
                *self = HeaderValues::Multiple(vec![first, value]);
            }
            HeaderValues::Multiple(values) => values.push(value),
        }
    }
}

/// Header collection.
///
/// Lookup ignores ASCII case while storage keeps the casing of the first
/// occurrence. Repeated names never overwrite: every value is kept in the order
/// it arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, HeaderValues)>,
}

impl Headers {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct header names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no header is present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a value, keeping any values already stored under the same name
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index].1.push(value),
            None => self.entries.push((name, HeaderValues::Single(value))),
        }
    }

    /// Replace every value stored under `name`
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = HeaderValues::Single(value.into());
        match self.position(&name) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Remove a header, returning its values
    pub fn remove(&mut self, name: &str) -> Option<HeaderValues> {
        self.position(name).map(|index| self.entries.remove(index).1)
    }

    /// Values stored under `name`
    pub fn get(&self, name: &str) -> Option<&HeaderValues> {
        self.position(name).map(|index| &self.entries[index].1)
    }

    /// First value stored under `name`
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.get(name).map(HeaderValues::first)
    }

    /// Whether `name` is present
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterate over names with their grouped values
    pub fn entries(&self) -> impl Iterator<Item = (&str, &HeaderValues)> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values))
    }

    /// Iterate over every `(name, value)` pair, one pair per value
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |value| (name.as_str(), value)))
    }

    /// Parsed `Content-Length`, when present and numeric
    pub fn content_length(&self) -> Option<u64> {
        self.get_first("Content-Length")
            .and_then(|value| value.trim().parse().ok())
    }

    /// Convert to an [`http::HeaderMap`] for transports that speak `http` types
    pub fn to_header_map(&self) -> Result<http::HeaderMap> {
        let mut map = http::HeaderMap::new();
        for (name, value) in self.iter() {
            let header_name = http::HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                Error::InvalidHeader {
                    name: name.to_string(),
                }
            })?;
            let header_value =
                http::HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader {
                    name: name.to_string(),
                })?;
            map.append(header_name, header_value);
        }
        Ok(map)
    }

    /// Collect an [`http::HeaderMap`], keeping repeated names.
    ///
    /// Values that are not valid UTF-8 are decoded as Latin-1.
    pub fn from_header_map(map: &http::HeaderMap) -> Self {
        let mut headers = Headers::new();
        for (name, value) in map {
            let value = match value.to_str() {
                Ok(text) => text.to_string(),
                Err(_) => value.as_bytes().iter().map(|&b| b as char).collect(),
            };
            headers.append(name.as_str(), value);
        }
        headers
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        headers.extend(iter);
        headers
    }
}

impl<K, V> Extend<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.append(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_names_are_preserved() {
        let mut headers = Headers::new();
        headers.append("Set-Cookie", "a=1");
        headers.append("set-cookie", "b=2");
        headers.append("Content-Type", "text/plain");

        assert_eq!(headers.len(), 2);
        let cookies: Vec<_> = headers.get("SET-COOKIE").unwrap().iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);

        // first-seen casing wins
        let names: Vec<_> = headers.entries().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Set-Cookie", "Content-Type"]);
    }

    #[test]
    fn test_set_replaces_and_remove() {
        let mut headers: Headers = [("Accept", "text/html"), ("accept", "*/*")]
            .into_iter()
            .collect();
        assert_eq!(headers.get("accept").unwrap().joined(), "text/html, */*");

        headers.set("ACCEPT", "application/json");
        assert_eq!(
            headers.get("Accept"),
            Some(&HeaderValues::Single("application/json".to_string()))
        );

        assert!(headers.remove("accept").is_some());
        assert!(headers.is_empty());
        assert!(headers.remove("accept").is_none());
    }

    #[test]
    fn test_content_length() {
        let mut headers = Headers::new();
        assert_eq!(headers.content_length(), None);
        headers.append("content-length", " 1024 ");
        assert_eq!(headers.content_length(), Some(1024));
        headers.set("Content-Length", "abc");
        assert_eq!(headers.content_length(), None);
    }

    #[test]
    fn test_header_map_conversion_keeps_duplicates() {
        let mut headers = Headers::new();
        headers.append("X-Trace", "one");
        headers.append("X-Trace", "two");

        let map = headers.to_header_map().unwrap();
        let values: Vec<_> = map.get_all("x-trace").iter().collect();
        assert_eq!(values.len(), 2);

        let back = Headers::from_header_map(&map);
        let values: Vec<_> = back.get("X-Trace").unwrap().iter().collect();
        assert_eq!(values, vec!["one", "two"]);
    }

    #[test]
    fn test_invalid_header_name() {
        let mut headers = Headers::new();
        headers.append("bad header", "x");
        assert!(matches!(
            headers.to_header_map(),
            Err(Error::InvalidHeader { .. })
        ));
    }
}
