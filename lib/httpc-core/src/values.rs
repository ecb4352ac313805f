//! Ordered multi-value mapping for query strings and form bodies.

use std::fmt;

/// Ordered `key -> [values]` mapping.
///
/// Keys keep the order in which they were first inserted, and each key may
/// carry several values (e.g. `scores=100&scores=90`).
///
/// # Example
///
/// ```
/// use httpc_core::Values;
///
/// let mut values = Values::new();
/// values.add("tag", "a");
/// values.add("tag", "b");
/// values.set("page", "1");
/// assert_eq!(values.encode(), "tag=a&tag=b&page=1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    entries: Vec<(String, Vec<String>)>,
}

impl Values {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` string.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut values = Self::new();
        values.extend_from_encoded(input);
        values
    }

    /// Appends the pairs of an encoded query/form string.
    pub fn extend_from_encoded(&mut self, input: &str) {
        for (key, value) in url::form_urlencoded::parse(input.as_bytes()) {
            self.add(key, value);
        }
    }

    /// Appends a value to `key`, keeping existing values.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Replaces all values of `key` with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => *values = vec![value],
            None => self.entries.push((key, vec![value])),
        }
    }

    /// First value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// All values of `key`, in insertion order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    /// Removes `key` and all its values.
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    /// Returns `true` when no key is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Flat iterator over `(key, value)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }

    /// Serializes to `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.pairs() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl<K, V> FromIterator<(K, V)> for Values
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.add(key, value);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_multiplicity() {
        let mut values = Values::new();
        values.add("scores", "100");
        values.add("name", "Jane");
        values.add("scores", "90");

        assert_eq!(values.len(), 2);
        assert_eq!(values.get_all("scores"), ["100", "90"]);
        assert_eq!(values.encode(), "scores=100&scores=90&name=Jane");
    }

    #[test]
    fn set_replaces_values() {
        let mut values = Values::parse("a=1&a=2&b=3");
        values.set("a", "x");

        assert_eq!(values.get_all("a"), ["x"]);
        assert_eq!(values.encode(), "a=x&b=3");
    }

    #[test]
    fn parse_decodes_percent_and_plus() {
        let values = Values::parse("name=Jane+Doe&city=S%C3%A3o%20Paulo");
        assert_eq!(values.get("name"), Some("Jane Doe"));
        assert_eq!(values.get("city"), Some("São Paulo"));
    }

    #[test]
    fn missing_key() {
        let values = Values::new();
        assert!(values.is_empty());
        assert_eq!(values.get("nope"), None);
        assert!(values.get_all("nope").is_empty());
    }

    #[test]
    fn remove_key() {
        let mut values: Values = [("a", "1"), ("b", "2")].into_iter().collect();
        values.remove("a");
        assert_eq!(values.to_string(), "b=2");
    }
}
