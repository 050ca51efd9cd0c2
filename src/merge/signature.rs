//! Order-sensitive signatures naming merged bundles.

use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 digest of the concatenated keys loaded during one pass.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 32]);

impl Signature {
  /// Digest an already concatenated key string.
  pub fn from_source(source: &str) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    Self(hasher.finalize().into())
  }

  /// Digest keys in load order. Keys are concatenated without a separator.
  pub fn of_keys<I, S>(keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut hasher = Sha256::new();
    for key in keys {
      hasher.update(key.as_ref().as_bytes());
    }
    Self(hasher.finalize().into())
  }

  /// Lowercase hex form, used as the bundle file stem.
  pub fn to_hex(&self) -> String {
    hex::encode(self.0)
  }
}

impl fmt::Debug for Signature {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Signature({})", &self.to_hex()[..16])
  }
}

impl fmt::Display for Signature {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_hex())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn same_order_gives_same_signature() {
    let first = Signature::of_keys(["base", "theme"]);
    let second = Signature::of_keys(vec!["base".to_string(), "theme".to_string()]);
    assert_eq!(first, second);
    assert_eq!(first, Signature::from_source("basetheme"));
  }

  #[test]
  fn load_order_changes_signature() {
    assert_ne!(
      Signature::of_keys(["base", "theme"]),
      Signature::of_keys(["theme", "base"])
    );
  }

  #[test]
  fn renders_full_hex_digest() {
    let hex = Signature::from_source("base").to_hex();
    assert_eq!(hex.len(), 64);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
  }
}
