//! Per-kind queue of pending asset declarations.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::models::{AssetKind, AssetRecord, QueueInput};
use crate::normalize::{assign_key, normalize};

/// Pending records of one kind, addressed by key.
pub type PendingRecords = IndexMap<String, AssetRecord>;

/// Mapping from asset kind to its pending records.
#[derive(Debug, Clone, Default)]
pub struct AssetQueue {
  pending: BTreeMap<AssetKind, PendingRecords>,
}

impl AssetQueue {
  /// Create an empty queue.
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue one or more declarations of `kind`.
  ///
  /// Declarations without a usable address are dropped. A declaration whose key is already
  /// queued replaces the earlier record. Returns how many records were accepted.
  pub fn enqueue(&mut self, kind: AssetKind, input: impl Into<QueueInput>) -> usize {
    let defaults = kind.defaults();
    let pending = self.pending.entry(kind).or_default();
    let mut accepted = 0;

    for declaration in input.into().into_records() {
      if declaration.usable_address().is_none() {
        continue;
      }

      let mut record = normalize(&defaults, declaration, true);
      assign_key(&mut record, |candidate| pending.contains_key(candidate));
      pending.insert(record.key.clone(), record);
      accepted += 1;
    }

    accepted
  }

  /// Records currently pending for `kind`.
  pub fn pending(&self, kind: AssetKind) -> Option<&PendingRecords> {
    self.pending.get(&kind)
  }

  /// Look up a pending record.
  pub fn get(&self, kind: AssetKind, key: &str) -> Option<&AssetRecord> {
    self.pending.get(&kind).and_then(|records| records.get(key))
  }

  /// Number of pending records for `kind`.
  pub fn len(&self, kind: AssetKind) -> usize {
    self.pending.get(&kind).map_or(0, IndexMap::len)
  }

  /// Whether nothing is pending for `kind`.
  pub fn is_empty(&self, kind: AssetKind) -> bool {
    self.len(kind) == 0
  }

  /// Remove and return every pending record of `kind`, leaving its queue empty.
  pub fn drain(&mut self, kind: AssetKind) -> PendingRecords {
    self.pending.remove(&kind).unwrap_or_default()
  }
}
