//! Accumulate resolved asset bodies into one signature-named bundle per kind.

mod cache;
mod filters;
mod signature;

pub use cache::is_stale;
pub use filters::{ContentFilter, CssCompactor, NoopFilter};
pub use signature::Signature;

use crate::activity::{ActivityEvent, ActivityLog};
use crate::models::AssetRecord;
use crate::resolver::{AssetSink, ResolvedSource};
use crate::storage::AssetStorage;

/// Per-kind buffer of merged bodies and the keys that contributed to them.
#[derive(Debug)]
pub struct MergeBuffer<S> {
  storage: S,
  body: Vec<u8>,
  signature_source: String,
  keys: Vec<String>,
}

impl<S: AssetStorage> MergeBuffer<S> {
  /// Create an empty buffer reading sources through `storage`.
  pub fn new(storage: S) -> Self {
    Self {
      storage,
      body: Vec::new(),
      signature_source: String::new(),
      keys: Vec::new(),
    }
  }

  /// Whether no body has been accumulated.
  pub fn is_empty(&self) -> bool {
    self.body.is_empty()
  }

  /// Keys merged so far, in load order.
  pub fn keys(&self) -> &[String] {
    &self.keys
  }

  /// Accumulated bundle body.
  pub fn body(&self) -> &[u8] {
    &self.body
  }

  /// Signature of the keys merged so far.
  pub fn signature(&self) -> Signature {
    Signature::from_source(&self.signature_source)
  }

  /// Append one resolved record's body.
  ///
  /// Fails the record, logging an error, when the source is external, empty or unreadable.
  pub fn resolve_one(
    &mut self,
    record: &AssetRecord,
    source: &ResolvedSource,
    log: &mut ActivityLog,
  ) -> bool {
    let ResolvedSource::Local(path) = source else {
      log.record(ActivityEvent::NotMergeable {
        key: record.key.clone(),
      });
      return false;
    };

    let contents = match self.storage.read_all(path) {
      Ok(contents) if !contents.is_empty() => contents,
      _ => {
        log.record(ActivityEvent::Unreadable {
          key: record.key.clone(),
        });
        return false;
      }
    };

    if !self.body.is_empty() && !self.body.ends_with(b"\n") {
      self.body.push(b'\n');
    }
    self.body.extend_from_slice(&contents);
    self.signature_source.push_str(&record.key);
    self.keys.push(record.key.clone());
    true
  }
}

impl<S: AssetStorage> AssetSink for MergeBuffer<S> {
  fn accept(&mut self, record: &AssetRecord, source: &ResolvedSource, log: &mut ActivityLog) -> bool {
    self.resolve_one(record, source, log)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{AssetKind, PartialRecord};
  use crate::normalize::normalize;
  use crate::storage::memory::MemoryStorage;

  fn record(key: &str) -> AssetRecord {
    normalize(
      &AssetKind::Style.defaults(),
      PartialRecord::new(key).key(key),
      true,
    )
  }

  #[test]
  fn appends_bodies_and_keys_in_order() {
    let storage = MemoryStorage::new();
    storage.put("css/base.css", "body{}");
    storage.put("css/theme.css", "h1{}\n");
    let mut buffer = MergeBuffer::new(&storage);
    let mut log = ActivityLog::new();

    assert!(buffer.resolve_one(&record("base"), &ResolvedSource::Local("css/base.css".into()), &mut log));
    assert!(buffer.resolve_one(&record("theme"), &ResolvedSource::Local("css/theme.css".into()), &mut log));

    assert_eq!(buffer.body(), b"body{}\nh1{}\n");
    assert_eq!(buffer.keys(), ["base".to_string(), "theme".to_string()]);
    assert_eq!(buffer.signature(), Signature::of_keys(["base", "theme"]));
    assert!(log.is_empty());
  }

  #[test]
  fn zero_length_source_fails_the_record() {
    let storage = MemoryStorage::new();
    storage.put("css/empty.css", "");
    let mut buffer = MergeBuffer::new(&storage);
    let mut log = ActivityLog::new();

    let accepted = buffer.resolve_one(
      &record("empty"),
      &ResolvedSource::Local("css/empty.css".into()),
      &mut log,
    );

    assert!(!accepted);
    assert!(buffer.is_empty());
    assert!(buffer.keys().is_empty());
    assert_eq!(log.events(), [ActivityEvent::Unreadable {
      key: "empty".into()
    }]);
  }

  #[test]
  fn external_sources_are_not_merged() {
    let storage = MemoryStorage::new();
    let mut buffer = MergeBuffer::new(&storage);
    let mut log = ActivityLog::new();

    assert!(!buffer.resolve_one(&record("cdn"), &ResolvedSource::External, &mut log));
    assert!(matches!(log.events(), [ActivityEvent::NotMergeable { .. }]));
  }
}
