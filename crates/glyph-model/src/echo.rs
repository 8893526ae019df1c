//! The append-only echo log.

use crate::error::{ModelError, Result};
use crate::files;
use crate::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Optional annotations on an echo entry.
///
/// Unset and empty values are both treated as "not provided" and leave the
/// key out of the written entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EchoAnnotations {
    pub trace_id: Option<String>,
    pub symbol: Option<String>,
    pub meaning: Option<String>,
}

impl EchoAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn meaning(mut self, meaning: impl Into<String>) -> Self {
        self.meaning = Some(meaning.into());
        self
    }
}

/// A single timestamped assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoEntry {
    #[serde(
        rename = "timestamp",
        serialize_with = "timestamp::serialize",
        deserialize_with = "timestamp::deserialize"
    )]
    pub recorded_at: DateTime<Utc>,
    pub node_id: String,
    pub vector: String,
    pub assertion: String,
    pub truth_anchor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
}

/// Ordered journal of echo entries. Entries can be appended, never edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EchoLog {
    entries: Vec<EchoEntry>,
}

fn provided(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl EchoLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry stamped with the current UTC time.
    pub fn add_entry(
        &mut self,
        node_id: impl Into<String>,
        vector: impl Into<String>,
        assertion: impl Into<String>,
        annotations: EchoAnnotations,
        truth_anchor: impl Into<String>,
    ) -> &EchoEntry {
        let entry = EchoEntry {
            recorded_at: timestamp::now_utc(),
            node_id: node_id.into(),
            vector: vector.into(),
            assertion: assertion.into(),
            truth_anchor: truth_anchor.into(),
            trace_id: provided(annotations.trace_id),
            symbol: provided(annotations.symbol),
            meaning: provided(annotations.meaning),
        };
        debug!(node_id = %entry.node_id, position = self.entries.len(), "echo entry appended");
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[EchoEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EchoEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the log as a bare JSON array in append order.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = files::to_pretty_json(self)?;
        files::write(path.as_ref(), json.as_bytes())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = files::read_to_string(path.as_ref(), "echo log")?;
        serde_json::from_str(&contents).map_err(|e| ModelError::Malformed {
            kind: "echo log",
            reason: e.to_string(),
        })
    }

    /// Load the log at `path`, or start an empty one if the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load(path) {
            Err(ModelError::NotFound { .. }) => Ok(Self::new()),
            other => other,
        }
    }
}

impl<'a> IntoIterator for &'a EchoLog {
    type Item = &'a EchoEntry;
    type IntoIter = std::slice::Iter<'a, EchoEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::DEFAULT_TRUTH_ANCHOR;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_add_echo_entry() {
        let mut echo = EchoLog::new();
        echo.add_entry(
            "NODE-1",
            "⊗_EXAMPLE",
            "Test assertion",
            EchoAnnotations::new()
                .trace_id("TRACE-123")
                .symbol("*")
                .meaning("Example meaning"),
            DEFAULT_TRUTH_ANCHOR,
        );
        assert_eq!(echo.len(), 1);
        assert_eq!(echo.entries()[0].node_id, "NODE-1");
        assert_eq!(echo.entries()[0].trace_id.as_deref(), Some("TRACE-123"));
    }

    #[test]
    fn test_entries_kept_in_call_order() {
        let mut echo = EchoLog::new();
        for i in 0..5 {
            echo.add_entry(
                format!("NODE-{i}"),
                "v",
                "same assertion",
                EchoAnnotations::default(),
                DEFAULT_TRUTH_ANCHOR,
            );
        }
        assert_eq!(echo.len(), 5);
        let nodes: Vec<&str> = echo.iter().map(|e| e.node_id.as_str()).collect();
        assert_eq!(nodes, ["NODE-0", "NODE-1", "NODE-2", "NODE-3", "NODE-4"]);
    }

    #[test]
    fn test_omitted_optionals_absent_from_json() {
        let mut echo = EchoLog::new();
        echo.add_entry(
            "NODE-2",
            "⊗_SAVE",
            "Persistence test",
            EchoAnnotations::new().symbol(""),
            DEFAULT_TRUTH_ANCHOR,
        );
        let value = serde_json::to_value(&echo).unwrap();
        let entry = value[0].as_object().unwrap();
        assert!(!entry.contains_key("trace_id"));
        assert!(!entry.contains_key("symbol"));
        assert!(!entry.contains_key("meaning"));
        assert_eq!(entry["truth_anchor"], "BTC-SOURCE-GENESIS");
        assert!(entry.contains_key("timestamp"));
    }

    #[test]
    fn test_save_echo_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test_echo_log.json");

        let mut echo = EchoLog::new();
        echo.add_entry(
            "NODE-2",
            "⊗_SAVE",
            "Persistence test",
            EchoAnnotations::default(),
            DEFAULT_TRUTH_ANCHOR,
        );
        echo.save(&path).unwrap();

        let data: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(data.is_array());
        assert_eq!(data[0]["vector"], "⊗_SAVE");
    }

    #[test]
    fn test_load_appends_after_existing_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");

        let mut echo = EchoLog::new();
        echo.add_entry("A", "v", "first", EchoAnnotations::default(), DEFAULT_TRUTH_ANCHOR);
        echo.save(&path).unwrap();

        let mut reloaded = EchoLog::load(&path).unwrap();
        assert_eq!(reloaded, echo);
        reloaded.add_entry("B", "v", "second", EchoAnnotations::default(), DEFAULT_TRUTH_ANCHOR);
        assert_eq!(reloaded.entries()[0].assertion, "first");
        assert_eq!(reloaded.entries()[1].assertion, "second");
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let dir = TempDir::new().unwrap();
        let log = EchoLog::load_or_default(dir.path().join("absent.json")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_load_rejects_wrapped_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        fs::write(&path, r#"{"entries": []}"#).unwrap();
        assert!(matches!(
            EchoLog::load_or_default(&path),
            Err(ModelError::Malformed { .. })
        ));
    }
}
