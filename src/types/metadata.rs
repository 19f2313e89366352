use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const USER_METADATA_PREFIX: &str = "x-object-meta-";

pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const ETAG_HEADER: &str = "etag";
pub const LAST_MODIFIED_HEADER: &str = "last-modified";
pub const CONTENT_LENGTH_HEADER: &str = "content-length";

// The legacy system stored zip archives labelled as tar.
pub const LEGACY_SOURCE_CONTAINER: &str = "CWRC";
pub const NORMALIZED_ARCHIVE_CONTENT_TYPE: &str = "application/zip";

// Headers the storage layer injects or rewrites on every write.
pub const BASELINE_EXCEPTION_HEADERS: [&str; 5] = [
    "last-modified",
    "x-timestamp",
    "x-trans-id",
    "x-openstack-request-id",
    "date",
];

/// Header-key to header-value mapping describing the stored state of an object.
///
/// Keys are case-insensitive: they are lower-cased on insert and on lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    headers: BTreeMap<String, String>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(|value| value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.headers.contains_key(&key.to_ascii_lowercase())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.headers.remove(&key.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn etag(&self) -> Option<&str> {
        self.get(ETAG_HEADER)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE_HEADER)
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.get(LAST_MODIFIED_HEADER)
    }

    /// User-defined metadata with the `x-object-meta-` prefix stripped.
    pub fn user_metadata(&self) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(USER_METADATA_PREFIX)
                    .map(|name| (name.to_string(), value.clone()))
            })
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for MetadataRecord
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = MetadataRecord::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

/// Header keys allowed to differ, or to be absent on the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionSet {
    keys: BTreeSet<String>,
}

impl ExceptionSet {
    /// Baseline exceptions merged with `additional` keys.
    pub fn with_additional<I, S>(additional: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = BASELINE_EXCEPTION_HEADERS
            .iter()
            .map(|key| key.to_string())
            .chain(
                additional
                    .into_iter()
                    .map(|key| key.as_ref().to_ascii_lowercase()),
            )
            .collect();

        Self { keys }
    }

    /// A new set holding these keys and `key`.
    pub fn including(&self, key: &str) -> Self {
        let mut keys = self.keys.clone();
        keys.insert(key.to_ascii_lowercase());
        Self { keys }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(&key.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for ExceptionSet {
    fn default() -> Self {
        Self::with_additional(std::iter::empty::<&str>())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSystem {
    Legacy,
    Standard,
}

impl SourceSystem {
    pub fn from_container(container: &str) -> Self {
        if container == LEGACY_SOURCE_CONTAINER {
            SourceSystem::Legacy
        } else {
            SourceSystem::Standard
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, SourceSystem::Legacy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    MissingOnDestination {
        key: String,
        source_value: String,
    },
    ValueMismatch {
        key: String,
        source_value: String,
        destination_value: String,
    },
}

impl Discrepancy {
    pub fn key(&self) -> &str {
        match self {
            Discrepancy::MissingOnDestination { key, .. } => key,
            Discrepancy::ValueMismatch { key, .. } => key,
        }
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::MissingOnDestination { key, source_value } => {
                write!(f, "{key} not present in destination: {source_value}")
            }
            Discrepancy::ValueMismatch {
                key,
                source_value,
                destination_value,
            } => write!(f, "{key} differs: {source_value} <> {destination_value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_record_is_case_insensitive() {
        let mut record = MetadataRecord::new();
        record.insert("Content-Type", "application/zip");
        record.insert("X-Object-Meta-Project", "c");

        assert_eq!(record.get("content-type"), Some("application/zip"));
        assert_eq!(record.get("CONTENT-TYPE"), Some("application/zip"));
        assert!(record.contains_key("x-object-meta-project"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn user_metadata_strips_prefix() {
        let record: MetadataRecord = [
            ("x-object-meta-project", "c"),
            ("x-object-meta-promise", "d"),
            ("content-type", "application/zip"),
        ]
        .into_iter()
        .collect();

        let user_metadata = record.user_metadata();
        assert_eq!(user_metadata.len(), 2);
        assert_eq!(user_metadata.get("project").unwrap(), "c");
        assert_eq!(user_metadata.get("promise").unwrap(), "d");
    }

    #[test]
    fn exception_set_contains_baseline() {
        let exceptions = ExceptionSet::default();

        for key in BASELINE_EXCEPTION_HEADERS {
            assert!(exceptions.contains(key));
        }
        assert!(!exceptions.contains("content-type"));
        assert_eq!(exceptions.len(), BASELINE_EXCEPTION_HEADERS.len());
    }

    #[test]
    fn exception_set_merges_additional_keys() {
        let exceptions = ExceptionSet::with_additional(["X-Object-Meta-Promise"]);

        assert!(exceptions.contains("x-object-meta-promise"));
        assert!(exceptions.contains("date"));

        // built fresh per call; earlier additions never leak into a new set
        assert!(!ExceptionSet::default().contains("x-object-meta-promise"));

        let extended = exceptions.including("ETag");
        assert!(extended.contains("etag"));
        assert!(!exceptions.contains("etag"));
    }

    #[test]
    fn source_system_from_container() {
        assert_eq!(SourceSystem::from_container("CWRC"), SourceSystem::Legacy);
        assert_eq!(SourceSystem::from_container("cwrc"), SourceSystem::Standard);
        assert_eq!(SourceSystem::from_container("era"), SourceSystem::Standard);
    }

    #[test]
    fn discrepancy_display() {
        let missing = Discrepancy::MissingOnDestination {
            key: "a".to_string(),
            source_value: "b".to_string(),
        };
        assert_eq!(missing.to_string(), "a not present in destination: b");

        let mismatch = Discrepancy::ValueMismatch {
            key: "a".to_string(),
            source_value: "b".to_string(),
            destination_value: "invalid".to_string(),
        };
        assert_eq!(mismatch.to_string(), "a differs: b <> invalid");
        assert_eq!(mismatch.key(), "a");
    }
}
