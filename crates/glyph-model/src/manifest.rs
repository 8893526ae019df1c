//! The glyph manifest record.

use crate::error::{ModelError, Result};
use crate::files;
use crate::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Provenance tag applied when the caller has no more specific anchor.
pub const DEFAULT_TRUTH_ANCHOR: &str = "BTC-SOURCE-GENESIS";

/// A primitive value attached to a registry record as an extra attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl From<&str> for ExtraValue {
    fn from(value: &str) -> Self {
        ExtraValue::Text(value.to_string())
    }
}

impl From<String> for ExtraValue {
    fn from(value: String) -> Self {
        ExtraValue::Text(value)
    }
}

impl From<bool> for ExtraValue {
    fn from(value: bool) -> Self {
        ExtraValue::Bool(value)
    }
}

impl From<i64> for ExtraValue {
    fn from(value: i64) -> Self {
        ExtraValue::Number(value.into())
    }
}

impl From<u64> for ExtraValue {
    fn from(value: u64) -> Self {
        ExtraValue::Number(value.into())
    }
}

impl ExtraValue {
    /// Wrap a float. Returns `None` for NaN and infinities, which JSON cannot hold.
    pub fn float(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(ExtraValue::Number)
    }
}

/// One contribution record in a manifest's registry.
///
/// Extra attributes are flattened next to `node` and `contribution` on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub node: String,
    pub contribution: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, ExtraValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dedication {
    pub message: String,
    pub author: String,
}

/// A glyph: the symbolic identity record managed by this crate.
///
/// `id` and `created_at` are fixed at construction. The registry only grows;
/// dedication and closing lines are replaced wholesale by their setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ManifestRecord")]
pub struct Manifest {
    #[serde(rename = "glyph_id")]
    id: String,
    name: String,
    creator: String,
    #[serde(rename = "core_concepts")]
    concepts: Vec<String>,
    truth_anchor: String,
    #[serde(rename = "timestamp", serialize_with = "timestamp::serialize")]
    created_at: DateTime<Utc>,
    registry: Vec<RegistryEntry>,
    #[serde(serialize_with = "serialize_dedication")]
    dedication: Option<Dedication>,
    closing: Vec<String>,
}

impl Manifest {
    /// Create a manifest stamped with the current UTC time.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        creator: impl Into<String>,
        concepts: Vec<String>,
        truth_anchor: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            creator: creator.into(),
            concepts,
            truth_anchor: truth_anchor.into(),
            created_at: timestamp::now_utc(),
            registry: Vec::new(),
            dedication: None,
            closing: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn concepts(&self) -> &[String] {
        &self.concepts
    }

    pub fn truth_anchor(&self) -> &str {
        &self.truth_anchor
    }

    pub fn set_truth_anchor(&mut self, anchor: impl Into<String>) {
        self.truth_anchor = anchor.into();
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn registry(&self) -> &[RegistryEntry] {
        &self.registry
    }

    pub fn dedication(&self) -> Option<&Dedication> {
        self.dedication.as_ref()
    }

    pub fn closing(&self) -> &[String] {
        &self.closing
    }

    /// Append a contribution record with no extra attributes.
    pub fn add_contributor(&mut self, node: impl Into<String>, contribution: impl Into<String>) {
        self.registry.push(RegistryEntry {
            node: node.into(),
            contribution: contribution.into(),
            extra: BTreeMap::new(),
        });
    }

    /// Append a contribution record carrying extra attributes.
    ///
    /// Fails with [`ModelError::ReservedField`] if an extra key would shadow
    /// `node` or `contribution`; the registry is left untouched in that case.
    pub fn add_contributor_with<I, K>(
        &mut self,
        node: impl Into<String>,
        contribution: impl Into<String>,
        extra: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (K, ExtraValue)>,
        K: Into<String>,
    {
        let mut attributes = BTreeMap::new();
        for (key, value) in extra {
            let key = key.into();
            if key == "node" || key == "contribution" {
                return Err(ModelError::ReservedField(key));
            }
            attributes.insert(key, value);
        }
        self.registry.push(RegistryEntry {
            node: node.into(),
            contribution: contribution.into(),
            extra: attributes,
        });
        Ok(())
    }

    pub fn set_dedication(&mut self, message: impl Into<String>, author: impl Into<String>) {
        self.dedication = Some(Dedication {
            message: message.into(),
            author: author.into(),
        });
    }

    pub fn set_closing(&mut self, lines: Vec<String>) {
        self.closing = lines;
    }

    /// The manifest as a JSON value, ready for canonical hashing.
    pub fn to_canonical_form(&self) -> Value {
        serde_json::to_value(self).expect("manifest serialization failed")
    }

    /// SHA-256 over the canonical form.
    pub fn digest(&self) -> String {
        glyph_hash::digest(&self.to_canonical_form())
    }

    /// The on-disk form: four-space indented JSON in file key order.
    pub fn to_json_pretty(&self) -> Result<String> {
        files::to_pretty_json(self)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ModelError::Malformed {
            kind: "manifest",
            reason: e.to_string(),
        })
    }

    /// Write the manifest to `path`. The parent directory must already exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        files::write(path, json.as_bytes())?;
        debug!(glyph_id = %self.id, path = %path.display(), "manifest saved");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = files::read_to_string(path.as_ref(), "manifest")?;
        Self::from_json_str(&contents)
    }
}

fn serialize_dedication<S: Serializer>(
    dedication: &Option<Dedication>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match dedication {
        Some(dedication) => dedication.serialize(serializer),
        // Existing manifests write an unset dedication as `{}`
        None => Map::new().serialize(serializer),
    }
}

/// Loose on-disk shape; required fields are checked in `TryFrom`.
#[derive(Deserialize)]
struct ManifestRecord {
    glyph_id: Option<String>,
    name: Option<String>,
    creator: Option<String>,
    core_concepts: Option<Vec<String>>,
    truth_anchor: Option<String>,
    timestamp: Option<String>,
    registry: Option<Vec<RegistryEntry>>,
    dedication: Option<Map<String, Value>>,
    closing: Option<Vec<String>>,
}

fn required<T>(value: Option<T>, field: &str) -> std::result::Result<T, String> {
    value.ok_or_else(|| format!("missing required field `{field}`"))
}

impl TryFrom<ManifestRecord> for Manifest {
    type Error = String;

    fn try_from(record: ManifestRecord) -> std::result::Result<Self, Self::Error> {
        let created_at = match record.timestamp {
            Some(text) => timestamp::parse_timestamp(&text)
                .map_err(|e| format!("invalid timestamp `{text}`: {e}"))?,
            None => timestamp::now_utc(),
        };
        let dedication = match record.dedication {
            Some(map) if !map.is_empty() => Some(
                serde_json::from_value(Value::Object(map))
                    .map_err(|e| format!("invalid dedication: {e}"))?,
            ),
            _ => None,
        };

        Ok(Manifest {
            id: required(record.glyph_id, "glyph_id")?,
            name: required(record.name, "name")?,
            creator: required(record.creator, "creator")?,
            concepts: required(record.core_concepts, "core_concepts")?,
            truth_anchor: record
                .truth_anchor
                .unwrap_or_else(|| DEFAULT_TRUTH_ANCHOR.to_string()),
            created_at,
            registry: record.registry.unwrap_or_default(),
            dedication,
            closing: record.closing.unwrap_or_default(),
        })
    }
}
