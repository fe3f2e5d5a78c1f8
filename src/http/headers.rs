//! HTTP header map with case-insensitive name lookup.
//!
//! Header names keep the casing they were first seen with; later values under
//! a differently cased spelling of the same name join that entry.

use std::fmt;

/// A single parsed `name: value` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

/// A case-insensitive, multi-value HTTP header map.
///
/// Each distinct name holds its values in arrival order. The order across
/// distinct names follows first appearance, though callers should not rely on it.
///
/// # Examples
///
/// ```
/// use h1serve::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("X-Custom", "first");
/// headers.insert("x-custom", "second");
///
/// let all: Vec<_> = headers.get_all("X-CUSTOM").collect();
/// assert_eq!(all, vec!["first", "second"]);
/// assert_eq!(headers.names().collect::<Vec<_>>(), vec!["X-Custom"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value. Values for a name already present are accumulated in order.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entry_mut(&name) {
            Some(values) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Returns the first value for the given header name, or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name)?.first().map(String::as_str)
    }

    /// Returns every value for the given header name in arrival order.
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.values(name)
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
    }

    /// Number of values stored under `name`.
    pub fn count(&self, name: &str) -> usize {
        self.values(name).map_or(0, <[String]>::len)
    }

    /// Removes the entry for `name`. Returns `true` if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.entries.len() < before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values(name).is_some()
    }

    /// Returns the total number of values (not unique names).
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct header names, as first seen.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns an iterator over all `(name, value)` pairs, grouped by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    fn values(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

impl Extend<HeaderField> for Headers {
    fn extend<I: IntoIterator<Item = HeaderField>>(&mut self, iter: I) {
        for field in iter {
            self.insert(field.name, field.value);
        }
    }
}

/// Wire form used by the serializer: `Name:Value\r\n` per value.
impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{name}:{value}\r\n")?;
        }
        Ok(())
    }
}
