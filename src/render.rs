//! Tag rendering for individual assets and merged bundles.

use std::collections::BTreeMap;

use crate::address::is_external;
use crate::models::AssetKind;

/// Produces the embeddable reference for an asset or a bundle.
pub trait TagRenderer {
  /// Tag for one resolved asset.
  ///
  /// `file` is either an external URL or a path relative to the kind's public directory,
  /// extension included.
  fn asset_tag(&self, kind: AssetKind, file: &str, attributes: &BTreeMap<String, String>)
  -> String;

  /// Tag for a merged bundle. Defaults to the single asset tag.
  fn bundle_tag(&self, kind: AssetKind, file: &str, attributes: &BTreeMap<String, String>) -> String {
    self.asset_tag(kind, file, attributes)
  }
}

/// Renders `<link>` and `<script>` tags with per-kind URL prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTagRenderer {
  /// Prefix prepended to local style sheet addresses.
  pub style_prefix: String,
  /// Prefix prepended to local script addresses.
  pub script_prefix: String,
}

impl Default for HtmlTagRenderer {
  fn default() -> Self {
    Self {
      style_prefix: "/css/".into(),
      script_prefix: "/js/".into(),
    }
  }
}

impl HtmlTagRenderer {
  /// Public URL for a file of `kind`. External URLs are returned unchanged.
  pub fn url_for(&self, kind: AssetKind, file: &str) -> String {
    if is_external(file) {
      return file.to_string();
    }

    let prefix = match kind {
      AssetKind::Style => &self.style_prefix,
      AssetKind::Script => &self.script_prefix,
    };
    format!("{prefix}{}", file.trim_start_matches('/'))
  }
}

impl TagRenderer for HtmlTagRenderer {
  fn asset_tag(
    &self,
    kind: AssetKind,
    file: &str,
    attributes: &BTreeMap<String, String>,
  ) -> String {
    let url = escape_attribute(&self.url_for(kind, file));
    let extra = render_attributes(attributes);
    match kind {
      AssetKind::Style => {
        format!(r#"<link rel="stylesheet" type="text/css" href="{url}"{extra} />"#)
      }
      AssetKind::Script => {
        format!(r#"<script type="text/javascript" src="{url}"{extra}></script>"#)
      }
    }
  }
}

fn render_attributes(attributes: &BTreeMap<String, String>) -> String {
  attributes
    .iter()
    .filter(|(name, _)| is_attribute_name(name))
    .map(|(name, value)| format!(r#" {name}="{}""#, escape_attribute(value)))
    .collect()
}

fn is_attribute_name(name: &str) -> bool {
  !name.is_empty()
    && name
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}

fn escape_attribute(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '"' => escaped.push_str("&quot;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      other => escaped.push(other),
    }
  }
  escaped
}

#[cfg(test)]
mod tests {
  use super::*;

  fn media(value: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("media".to_string(), value.to_string())])
  }

  #[test]
  fn renders_style_link_with_media() {
    let tag = HtmlTagRenderer::default().asset_tag(AssetKind::Style, "theme.css", &media("all"));
    assert_eq!(
      tag,
      r#"<link rel="stylesheet" type="text/css" href="/css/theme.css" media="all" />"#
    );
  }

  #[test]
  fn renders_script_tag() {
    let tag = HtmlTagRenderer::default().asset_tag(AssetKind::Script, "/app.js", &BTreeMap::new());
    assert_eq!(tag, r#"<script type="text/javascript" src="/js/app.js"></script>"#);
  }

  #[test]
  fn keeps_external_urls_untouched() {
    let renderer = HtmlTagRenderer::default();
    assert_eq!(
      renderer.url_for(AssetKind::Script, "https://cdn.example.com/lib.js"),
      "https://cdn.example.com/lib.js"
    );
  }

  #[test]
  fn escapes_attribute_values_and_drops_bad_names() {
    let attributes = BTreeMap::from([
      ("title".to_string(), "a \"quoted\" <title>".to_string()),
      ("bad name".to_string(), "x".to_string()),
    ]);
    let tag = HtmlTagRenderer::default().asset_tag(AssetKind::Script, "app.js", &attributes);
    assert!(tag.contains(r#"title="a &quot;quoted&quot; &lt;title&gt;""#));
    assert!(!tag.contains("bad name"));
  }

  #[test]
  fn bundle_tag_uses_cache_address() {
    let tag =
      HtmlTagRenderer::default().bundle_tag(AssetKind::Style, "c/0a1b.css", &media("all"));
    assert!(tag.contains(r#"href="/css/c/0a1b.css""#));
  }
}
