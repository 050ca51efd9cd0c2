//! Cache validity checks and bundle persistence.

use std::path::Path;

use super::{ContentFilter, MergeBuffer};
use crate::activity::{ActivityEvent, ActivityLog};
use crate::models::{AssetKind, CacheArtifact};
use crate::project::AssetLayout;
use crate::storage::AssetStorage;

/// Whether the bundle at `artifact` must be regenerated.
///
/// A bundle is stale when it is missing, or when the newest file under `source_dir` is newer
/// than the newest file under `cache_dir`.
pub fn is_stale<S: AssetStorage + ?Sized>(
  storage: &S,
  cache_dir: &Path,
  source_dir: &Path,
  artifact: &Path,
) -> bool {
  if !storage.exists(artifact) {
    return true;
  }

  storage.last_modified_recursive(cache_dir) < storage.last_modified_recursive(source_dir)
}

impl<S: AssetStorage> MergeBuffer<S> {
  /// Persist or reuse the bundle for this pass.
  ///
  /// Returns `None` when nothing was merged or the cache could not be written.
  pub fn finalize(
    self,
    kind: AssetKind,
    layout: &AssetLayout,
    filter: &dyn ContentFilter,
    log: &mut ActivityLog,
  ) -> Option<CacheArtifact> {
    if self.is_empty() {
      return None;
    }

    let cache_dir = layout.cache_dir(kind);
    if !self.storage.exists(&cache_dir) {
      let label = layout.cache_label(kind);
      if self.storage.make_dir(&cache_dir).is_err() {
        log.record(ActivityEvent::CacheDirFailed { kind, label });
        return None;
      }
      log.record(ActivityEvent::CacheDirCreated { kind, label });
    }

    let signature = self.signature().to_hex();
    let storage_path = layout.artifact_path(kind, &signature);
    let source_dir = layout.source_dir(kind);
    let regenerated = is_stale(&self.storage, &cache_dir, &source_dir, &storage_path);

    if regenerated {
      let contents = filter.format(kind, self.body);
      if let Err(err) = self.storage.write_all(&storage_path, &contents) {
        log.record(ActivityEvent::CacheWriteFailed {
          kind,
          signature,
          reason: err.to_string(),
        });
        return None;
      }
      log.record(ActivityEvent::CacheWritten {
        kind,
        signature: signature.clone(),
      });
    } else {
      log.record(ActivityEvent::CacheReused {
        kind,
        signature: signature.clone(),
      });
    }

    Some(CacheArtifact {
      address: layout.bundle_address(&signature),
      signature,
      storage_path,
      source_dir,
      regenerated,
    })
  }
}
