//! Data structures shared by the queue, resolver and merge stages.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Kind of asset handled by the loader. Each kind owns its own key namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
  /// Style sheets, rendered as `<link>` tags.
  #[serde(alias = "css")]
  Style,
  /// Scripts, rendered as `<script>` tags.
  #[serde(alias = "js")]
  Script,
}

impl AssetKind {
  /// Every supported kind, in render order.
  pub const ALL: [AssetKind; 2] = [AssetKind::Style, AssetKind::Script];

  /// Short name used for directories and log labels.
  pub fn as_str(self) -> &'static str {
    match self {
      AssetKind::Style => "css",
      AssetKind::Script => "js",
    }
  }

  /// Heading used for this kind's section of the activity log.
  pub fn title(self) -> &'static str {
    match self {
      AssetKind::Style => "CSS",
      AssetKind::Script => "JS",
    }
  }

  /// Extension given to source files and merged bundles.
  pub fn extension(self) -> &'static str {
    match self {
      AssetKind::Style => ".css",
      AssetKind::Script => ".js",
    }
  }

  /// Defaults template applied over every record of this kind.
  pub fn defaults(self) -> AssetDefaults {
    match self {
      AssetKind::Style => AssetDefaults {
        kind: self,
        key: String::new(),
        address: String::new(),
        media: Some("all".into()),
        requires: Vec::new(),
      },
      AssetKind::Script => AssetDefaults {
        kind: self,
        key: String::new(),
        address: String::new(),
        media: None,
        requires: Vec::new(),
      },
    }
  }
}

impl fmt::Display for AssetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Typed defaults template. A `None` field is one the kind does not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDefaults {
  /// Kind the defaults belong to.
  pub kind: AssetKind,
  /// Default key; empty means "derive from the address".
  pub key: String,
  /// Default address.
  pub address: String,
  /// Default media hint, only present for style sheets.
  pub media: Option<String>,
  /// Default requirements.
  pub requires: Vec<String>,
}

/// A fully normalised asset declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRecord {
  /// Unique identifier within the kind's queue.
  pub key: String,
  /// Kind the record was queued under.
  pub kind: AssetKind,
  /// Relative path (without extension) or absolute URL.
  pub address: String,
  /// Target medium for style sheets.
  pub media: Option<String>,
  /// Keys that must be loaded before this record.
  pub requires: Vec<String>,
  /// Extra attributes carried over verbatim from the declaration.
  pub attributes: BTreeMap<String, String>,
}

impl AssetRecord {
  /// Attributes handed to the tag renderer, media first.
  pub fn tag_attributes(&self) -> BTreeMap<String, String> {
    let mut attributes = self.attributes.clone();
    if let Some(media) = &self.media {
      attributes.insert("media".into(), media.clone());
    }
    attributes
  }
}

/// Requirements as declared: either one key or a list of keys.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Requires {
  /// A single key, wrapped into a one-element list on normalisation.
  One(String),
  /// An ordered list of keys.
  Many(Vec<String>),
}

impl Requires {
  /// Flatten into the canonical ordered list.
  pub fn into_vec(self) -> Vec<String> {
    match self {
      Requires::One(key) if key.is_empty() => Vec::new(),
      Requires::One(key) => vec![key],
      Requires::Many(keys) => keys,
    }
  }
}

/// Declaration as supplied by a caller, with every field optional.
///
/// Fields of the wrong type deserialize as absent instead of rejecting the declaration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PartialRecord {
  /// Optional explicit key.
  #[serde(default, deserialize_with = "lenient")]
  pub key: Option<String>,
  /// Address of the asset; `url` is accepted as an alias.
  #[serde(default, alias = "url", deserialize_with = "lenient")]
  pub address: Option<String>,
  /// Target medium for style sheets.
  #[serde(default, deserialize_with = "lenient")]
  pub media: Option<String>,
  /// Required keys, as a scalar or a list. Non-string entries are ignored.
  #[serde(default, deserialize_with = "lenient_requires")]
  pub requires: Option<Requires>,
  /// Fields unknown to the defaults template.
  #[serde(flatten)]
  pub extra: BTreeMap<String, serde_json::Value>,
}

impl PartialRecord {
  /// Start a declaration for the given address.
  pub fn new(address: impl Into<String>) -> Self {
    Self {
      address: Some(address.into()),
      ..Self::default()
    }
  }

  /// Set an explicit key.
  pub fn key(mut self, key: impl Into<String>) -> Self {
    self.key = Some(key.into());
    self
  }

  /// Set the media hint.
  pub fn media(mut self, media: impl Into<String>) -> Self {
    self.media = Some(media.into());
    self
  }

  /// Declare the keys this record depends on.
  pub fn requires<I, S>(mut self, keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.requires = Some(Requires::Many(keys.into_iter().map(Into::into).collect()));
    self
  }

  /// Attach an extra attribute outside the defaults template.
  pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self
      .extra
      .insert(name.into(), serde_json::Value::String(value.into()));
    self
  }

  /// Address if present and non-empty.
  pub fn usable_address(&self) -> Option<&str> {
    self.address.as_deref().filter(|address| !address.is_empty())
  }
}

/// The four accepted declaration shapes.
///
/// Deserialization never fails: list entries that are neither an address nor a record are
/// dropped, and any other top-level value becomes an empty list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum QueueInput {
  /// A single bare address.
  Address(String),
  /// A list of bare addresses.
  AddressList(Vec<String>),
  /// A single full record.
  Record(PartialRecord),
  /// A list of full records.
  RecordList(Vec<PartialRecord>),
}

impl QueueInput {
  /// Canonical form: an ordered list of record-shaped declarations.
  pub fn into_records(self) -> Vec<PartialRecord> {
    match self {
      QueueInput::Address(address) => vec![PartialRecord::new(address)],
      QueueInput::AddressList(addresses) => addresses.into_iter().map(PartialRecord::new).collect(),
      QueueInput::Record(record) => vec![record],
      QueueInput::RecordList(records) => records,
    }
  }
}

impl From<Value> for QueueInput {
  fn from(value: Value) -> Self {
    match value {
      Value::String(address) => QueueInput::Address(address),
      Value::Array(items) if items.iter().all(Value::is_string) => QueueInput::AddressList(
        items
          .into_iter()
          .filter_map(|item| match item {
            Value::String(address) => Some(address),
            _ => None,
          })
          .collect(),
      ),
      Value::Array(items) => {
        QueueInput::RecordList(items.into_iter().filter_map(record_from_value).collect())
      }
      Value::Object(_) => match record_from_value(value) {
        Some(record) => QueueInput::Record(record),
        None => QueueInput::RecordList(Vec::new()),
      },
      _ => QueueInput::RecordList(Vec::new()),
    }
  }
}

fn record_from_value(value: Value) -> Option<PartialRecord> {
  match value {
    Value::String(address) => Some(PartialRecord::new(address)),
    Value::Object(_) => serde_json::from_value(value).ok(),
    _ => None,
  }
}

/// Deserialize an optional field, treating a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  let value = Value::deserialize(deserializer)?;
  Ok(serde_json::from_value(value).ok())
}

fn lenient_requires<'de, D>(deserializer: D) -> Result<Option<Requires>, D::Error>
where
  D: Deserializer<'de>,
{
  let requires = match Value::deserialize(deserializer)? {
    Value::String(key) => Some(Requires::One(key)),
    Value::Array(items) => Some(Requires::Many(
      items
        .into_iter()
        .filter_map(|item| match item {
          Value::String(key) => Some(key),
          _ => None,
        })
        .collect(),
    )),
    _ => None,
  };
  Ok(requires)
}

impl From<&str> for QueueInput {
  fn from(address: &str) -> Self {
    QueueInput::Address(address.to_string())
  }
}

impl From<String> for QueueInput {
  fn from(address: String) -> Self {
    QueueInput::Address(address)
  }
}

impl From<Vec<&str>> for QueueInput {
  fn from(addresses: Vec<&str>) -> Self {
    QueueInput::AddressList(addresses.into_iter().map(str::to_string).collect())
  }
}

impl From<Vec<String>> for QueueInput {
  fn from(addresses: Vec<String>) -> Self {
    QueueInput::AddressList(addresses)
  }
}

impl From<PartialRecord> for QueueInput {
  fn from(record: PartialRecord) -> Self {
    QueueInput::Record(record)
  }
}

impl From<Vec<PartialRecord>> for QueueInput {
  fn from(records: Vec<PartialRecord>) -> Self {
    QueueInput::RecordList(records)
  }
}

/// A merged bundle written to (or reused from) the cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheArtifact {
  /// Hex signature naming the bundle.
  pub signature: String,
  /// Location of the bundle file on disk.
  pub storage_path: PathBuf,
  /// Source directory the bundle was assembled from.
  pub source_dir: PathBuf,
  /// Bundle address relative to the kind's public directory, without extension.
  pub address: String,
  /// `true` when this pass wrote the bundle, `false` when it was reused.
  pub regenerated: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_every_declaration_shape() {
    let single: QueueInput = serde_json::from_str(r#""base""#).unwrap();
    assert_eq!(single, QueueInput::Address("base".into()));

    let list: QueueInput = serde_json::from_str(r#"["a", "b"]"#).unwrap();
    assert_eq!(list.into_records().len(), 2);

    let record: QueueInput =
      serde_json::from_str(r#"{"key": "theme", "url": "theme", "requires": "base"}"#).unwrap();
    let records = record.into_records();
    assert_eq!(records[0].address.as_deref(), Some("theme"));
    assert_eq!(records[0].requires, Some(Requires::One("base".into())));

    let records: QueueInput =
      serde_json::from_str(r#"[{"address": "a"}, {"address": "b", "requires": ["a"]}]"#).unwrap();
    assert!(matches!(records, QueueInput::RecordList(ref list) if list.len() == 2));
  }

  #[test]
  fn malformed_entries_are_dropped_from_a_batch() {
    let records: QueueInput = serde_json::from_str(r#"[{"url": "a"}, {"url": 5}, 7, "b"]"#).unwrap();
    let records = records.into_records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].usable_address(), Some("a"));
    assert_eq!(records[1].usable_address(), None);
    assert_eq!(records[2].usable_address(), Some("b"));

    let mixed: QueueInput = serde_json::from_str(r#"["a", 5]"#).unwrap();
    assert_eq!(mixed.into_records(), vec![PartialRecord::new("a")]);

    let scalar: QueueInput = serde_json::from_str("42").unwrap();
    assert!(scalar.into_records().is_empty());
  }

  #[test]
  fn wrongly_typed_fields_read_as_absent() {
    let record: PartialRecord = serde_json::from_str(
      r#"{"key": 5, "url": "theme", "media": false, "requires": ["base", 3, null, "grid"]}"#,
    )
    .unwrap();
    assert_eq!(record.key, None);
    assert_eq!(record.address.as_deref(), Some("theme"));
    assert_eq!(record.media, None);
    assert_eq!(
      record.requires,
      Some(Requires::Many(vec!["base".into(), "grid".into()]))
    );
  }

  #[test]
  fn keeps_unknown_fields_as_extras() {
    let record: PartialRecord =
      serde_json::from_str(r#"{"address": "print", "title": "Printer"}"#).unwrap();
    assert_eq!(
      record.extra.get("title"),
      Some(&serde_json::Value::String("Printer".into()))
    );
  }

  #[test]
  fn scalar_requirement_becomes_single_element_list() {
    assert_eq!(Requires::One("base".into()).into_vec(), vec!["base".to_string()]);
    assert!(Requires::One(String::new()).into_vec().is_empty());
  }

  #[test]
  fn media_only_defaults_for_styles() {
    assert_eq!(AssetKind::Style.defaults().media.as_deref(), Some("all"));
    assert_eq!(AssetKind::Script.defaults().media, None);
  }
}
