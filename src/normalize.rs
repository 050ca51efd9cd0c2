//! Apply a kind's defaults template over a caller supplied declaration.

use std::collections::BTreeMap;

use crate::models::{AssetDefaults, AssetRecord, PartialRecord};

/// Mask `input` with `defaults`, field by field.
///
/// Fields the template knows about are overridden by the input when present. Fields the
/// template does not carry (unknown extras, or `media` for scripts) are dropped unless
/// `keep_unset` is set, in which case they are kept as extra attributes. The returned
/// record may still have an empty key; see [`assign_key`].
pub fn normalize(defaults: &AssetDefaults, input: PartialRecord, keep_unset: bool) -> AssetRecord {
  let PartialRecord {
    key,
    address,
    media,
    requires,
    extra,
  } = input;

  let mut attributes = BTreeMap::new();

  let media = match (&defaults.media, media) {
    (Some(_), Some(value)) => Some(value),
    (Some(default), None) => Some(default.clone()),
    (None, Some(value)) => {
      if keep_unset {
        attributes.insert("media".to_string(), value);
      }
      None
    }
    (None, None) => None,
  };

  if keep_unset {
    for (name, value) in extra {
      let value = match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => continue,
        other => other.to_string(),
      };
      attributes.insert(name, value);
    }
  }

  AssetRecord {
    key: key.unwrap_or_else(|| defaults.key.clone()),
    kind: defaults.kind,
    address: address.unwrap_or_else(|| defaults.address.clone()),
    media,
    requires: requires
      .map(|requires| requires.into_vec())
      .unwrap_or_else(|| defaults.requires.clone()),
    attributes,
  }
}

/// Fill an empty key from the address, or with the first free sequential number.
pub fn assign_key(record: &mut AssetRecord, is_taken: impl Fn(&str) -> bool) {
  if !record.key.is_empty() {
    return;
  }

  record.key = if record.address.is_empty() {
    synthetic_key(is_taken)
  } else {
    record.address.clone()
  };
}

/// First non-negative integer, as a string, that `is_taken` rejects.
pub fn synthetic_key(is_taken: impl Fn(&str) -> bool) -> String {
  (0u64..)
    .map(|candidate| candidate.to_string())
    .find(|candidate| !is_taken(candidate))
    .unwrap_or_default()
}
