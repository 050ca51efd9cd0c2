//! Resolved filesystem layout for source directories and caches.

use std::path::{Component, Path, PathBuf};

use crate::models::AssetKind;

/// Owned description of where each kind's sources and caches live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
  /// Web root containing the per-kind directories.
  pub public_root: PathBuf,
  /// Style sheet directory, relative to the web root.
  pub style_dir: String,
  /// Script directory, relative to the web root.
  pub script_dir: String,
  /// Name of the cache directory created inside each kind's directory.
  pub cache_dir_name: String,
  /// Extensions probed when checking that a style sheet exists.
  pub style_extensions: Vec<String>,
  /// Extensions probed when checking that a script exists.
  pub script_extensions: Vec<String>,
}

impl AssetLayout {
  /// Layout rooted at `public_root` with the conventional `css`, `js` and `c` names.
  pub fn rooted_at(public_root: impl Into<PathBuf>) -> Self {
    Self {
      public_root: public_root.into(),
      style_dir: "css".into(),
      script_dir: "js".into(),
      cache_dir_name: "c".into(),
      style_extensions: vec![AssetKind::Style.extension().into()],
      script_extensions: vec![AssetKind::Script.extension().into()],
    }
  }

  /// Directory name of `kind` relative to the web root.
  pub fn kind_dir_name(&self, kind: AssetKind) -> &str {
    match kind {
      AssetKind::Style => &self.style_dir,
      AssetKind::Script => &self.script_dir,
    }
  }

  /// Directory holding the sources for `kind`.
  pub fn source_dir(&self, kind: AssetKind) -> PathBuf {
    self.public_root.join(self.kind_dir_name(kind))
  }

  /// Directory holding merged bundles for `kind`.
  pub fn cache_dir(&self, kind: AssetKind) -> PathBuf {
    self.source_dir(kind).join(&self.cache_dir_name)
  }

  /// Short label for the cache directory used in the activity log, e.g. `css/c`.
  pub fn cache_label(&self, kind: AssetKind) -> String {
    format!(
      "{}/{}",
      self.kind_dir_name(kind).trim_matches('/'),
      self.cache_dir_name.trim_matches('/')
    )
  }

  /// Extensions accepted for `kind`, in probing order.
  pub fn extensions(&self, kind: AssetKind) -> &[String] {
    match kind {
      AssetKind::Style => &self.style_extensions,
      AssetKind::Script => &self.script_extensions,
    }
  }

  /// Candidate source files for a local address, one per accepted extension.
  pub fn source_candidates(&self, kind: AssetKind, address: &str) -> Vec<PathBuf> {
    let relative = address.trim_start_matches('/');
    let source_dir = self.source_dir(kind);
    self
      .extensions(kind)
      .iter()
      .map(|extension| source_dir.join(format!("{relative}{extension}")))
      .collect()
  }

  /// Public path of a located source file, relative to the kind's directory, with `/`
  /// separators and its matched extension.
  pub fn public_file(&self, kind: AssetKind, source: &Path) -> Option<String> {
    let relative = source.strip_prefix(self.source_dir(kind)).ok()?;
    let parts: Option<Vec<&str>> = relative
      .components()
      .map(|component| match component {
        Component::Normal(part) => part.to_str(),
        _ => None,
      })
      .collect();
    Some(parts?.join("/"))
  }

  /// Bundle address relative to the kind's public directory, without extension.
  pub fn bundle_address(&self, signature: &str) -> String {
    format!("{}/{}", self.cache_dir_name.trim_matches('/'), signature)
  }

  /// On-disk location of the bundle named `signature`.
  pub fn artifact_path(&self, kind: AssetKind, signature: &str) -> PathBuf {
    self
      .cache_dir(kind)
      .join(format!("{signature}{}", kind.extension()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolves_kind_directories() {
    let layout = AssetLayout::rooted_at("webroot");
    assert_eq!(layout.source_dir(AssetKind::Style), PathBuf::from("webroot/css"));
    assert_eq!(layout.cache_dir(AssetKind::Script), PathBuf::from("webroot/js/c"));
    assert_eq!(layout.cache_label(AssetKind::Style), "css/c");
  }

  #[test]
  fn builds_one_candidate_per_extension() {
    let mut layout = AssetLayout::rooted_at("webroot");
    layout.style_extensions = vec![".css".into(), ".min.css".into()];

    let candidates = layout.source_candidates(AssetKind::Style, "/layout/grid");
    assert_eq!(candidates, vec![
      PathBuf::from("webroot/css/layout/grid.css"),
      PathBuf::from("webroot/css/layout/grid.min.css"),
    ]);
  }

  #[test]
  fn public_file_keeps_the_matched_extension() {
    let layout = AssetLayout::rooted_at("webroot");
    assert_eq!(
      layout.public_file(AssetKind::Style, Path::new("webroot/css/layout/grid.scss")),
      Some("layout/grid.scss".to_string())
    );
    assert_eq!(layout.public_file(AssetKind::Style, Path::new("elsewhere/grid.css")), None);
  }

  #[test]
  fn names_bundles_by_signature() {
    let layout = AssetLayout::rooted_at("webroot");
    assert_eq!(layout.bundle_address("abc123"), "c/abc123");
    assert_eq!(
      layout.artifact_path(AssetKind::Script, "abc123"),
      PathBuf::from("webroot/js/c/abc123.js")
    );
  }
}
