//! Dependency-ordered draining of one kind's queue.
//!
//! Records are scanned pass after pass. Requirements already loaded are stripped, a
//! requirement that is neither loaded nor pending skips its dependent, and a record with no
//! remaining requirements is located and handed to an [`AssetSink`]. A pass that removes no
//! record means the rest wait on each other, so they are all skipped and the loop ends.

use std::path::PathBuf;

use indexmap::IndexSet;

use crate::activity::{ActivityEvent, ActivityLog};
use crate::address::is_external;
use crate::models::AssetRecord;
use crate::project::AssetLayout;
use crate::queue::PendingRecords;
use crate::storage::AssetStorage;

/// Where a resolved record's body can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
  /// External URL, assumed present.
  External,
  /// Existing file under the kind's source directory.
  Local(PathBuf),
}

/// Receives records whose requirements are satisfied, in load order.
pub trait AssetSink {
  /// Process one record. Returning `false` keeps it out of the loaded set.
  fn accept(&mut self, record: &AssetRecord, source: &ResolvedSource, log: &mut ActivityLog)
  -> bool;
}

impl<F> AssetSink for F
where
  F: FnMut(&AssetRecord, &ResolvedSource, &mut ActivityLog) -> bool,
{
  fn accept(&mut self, record: &AssetRecord, source: &ResolvedSource, log: &mut ActivityLog) -> bool {
    self(record, source, log)
  }
}

/// Find the source backing `record`, probing every configured extension.
pub fn locate<S: AssetStorage + ?Sized>(
  layout: &AssetLayout,
  storage: &S,
  record: &AssetRecord,
) -> Option<ResolvedSource> {
  if is_external(&record.address) {
    return Some(ResolvedSource::External);
  }

  layout
    .source_candidates(record.kind, &record.address)
    .into_iter()
    .find(|candidate| storage.exists(candidate))
    .map(ResolvedSource::Local)
}

/// Drain `pending` in dependency order and return the keys loaded, in load order.
pub fn resolve<S, K>(
  mut pending: PendingRecords,
  layout: &AssetLayout,
  storage: &S,
  sink: &mut K,
  log: &mut ActivityLog,
) -> Vec<String>
where
  S: AssetStorage + ?Sized,
  K: AssetSink + ?Sized,
{
  let mut loaded: IndexSet<String> = IndexSet::new();

  while !pending.is_empty() {
    let mut progressed = false;
    let keys: Vec<String> = pending.keys().cloned().collect();

    for key in keys {
      let requires = match pending.get(&key) {
        Some(record) => record.requires.clone(),
        None => continue,
      };

      if !requires.is_empty() {
        log.record(ActivityEvent::CheckingDependencies { key: key.clone() });

        let mut waiting = Vec::with_capacity(requires.len());
        let mut missing = None;
        for required in requires {
          if loaded.contains(&required) {
            continue;
          }
          if !pending.contains_key(&required) {
            missing = Some(required);
            break;
          }
          log.record(ActivityEvent::Pending {
            key: key.clone(),
            waiting_for: required.clone(),
          });
          waiting.push(required);
        }

        if let Some(missing) = missing {
          pending.shift_remove(&key);
          log.record(ActivityEvent::Skipped { key, missing });
          progressed = true;
          continue;
        }

        if !waiting.is_empty() {
          if let Some(record) = pending.get_mut(&key) {
            record.requires = waiting;
          }
          continue;
        }
      }

      let Some(mut record) = pending.shift_remove(&key) else {
        continue;
      };
      record.requires.clear();
      progressed = true;

      match locate(layout, storage, &record) {
        Some(source) => {
          if sink.accept(&record, &source, log) {
            log.record(ActivityEvent::Loaded {
              key: record.key.clone(),
            });
            loaded.insert(record.key);
          }
        }
        None => log.record(ActivityEvent::Failed { key: record.key }),
      }
    }

    if !progressed {
      for (key, record) in pending.drain(..) {
        let waiting_for = record.requires.first().cloned().unwrap_or_default();
        log.record(ActivityEvent::Stalled { key, waiting_for });
      }
    }
  }

  loaded.into_iter().collect()
}
