//! Content filters applied to bundles at cache-write time.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::AssetKind;

/// Transforms a bundle body before it is written to the cache.
pub trait ContentFilter: Send + Sync {
  /// Return the formatted contents for a bundle of `kind`.
  fn format(&self, kind: AssetKind, contents: Vec<u8>) -> Vec<u8>;
}

/// Leaves contents untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFilter;

impl ContentFilter for NoopFilter {
  fn format(&self, _kind: AssetKind, contents: Vec<u8>) -> Vec<u8> {
    contents
  }
}

/// Strips comments and redundant whitespace from style sheets.
///
/// Quoted strings and `url(...)` arguments are copied verbatim. Scripts and non UTF-8 input
/// pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssCompactor;

struct CompactorPatterns {
  verbatim: Regex,
  whitespace: Regex,
  punctuation: Regex,
  trailing_semicolon: Regex,
}

fn compactor_patterns() -> &'static CompactorPatterns {
  static PATTERNS: OnceLock<CompactorPatterns> = OnceLock::new();
  PATTERNS.get_or_init(|| CompactorPatterns {
    verbatim: Regex::new(
      r#"(?s)/\*.*?\*/|"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|(?i:url)\([^)]*\)"#,
    )
    .expect("invalid verbatim regex"),
    whitespace: Regex::new(r"\s+").expect("invalid whitespace regex"),
    punctuation: Regex::new(r"\s*([{};,>])\s*").expect("invalid punctuation regex"),
    trailing_semicolon: Regex::new(r";}").expect("invalid semicolon regex"),
  })
}

impl CssCompactor {
  /// Compact a style sheet string.
  pub fn compact(text: &str) -> String {
    let patterns = compactor_patterns();
    let mut compacted = String::with_capacity(text.len());
    let mut plain = String::new();
    let mut plain_start = 0;

    for token in patterns.verbatim.find_iter(text) {
      plain.push_str(&text[plain_start..token.start()]);
      plain_start = token.end();
      if token.as_str().starts_with("/*") {
        continue;
      }
      compacted.push_str(&compact_plain(patterns, &plain));
      compacted.push_str(token.as_str());
      plain.clear();
    }
    plain.push_str(&text[plain_start..]);
    compacted.push_str(&compact_plain(patterns, &plain));

    compacted.trim().to_string()
  }
}

/// Compact text known to hold no comments, strings or urls.
fn compact_plain(patterns: &CompactorPatterns, text: &str) -> String {
  let text = patterns.whitespace.replace_all(text, " ");
  let text = patterns.punctuation.replace_all(&text, "$1");
  patterns.trailing_semicolon.replace_all(&text, "}").into_owned()
}

impl ContentFilter for CssCompactor {
  fn format(&self, kind: AssetKind, contents: Vec<u8>) -> Vec<u8> {
    if kind != AssetKind::Style {
      return contents;
    }

    match String::from_utf8(contents) {
      Ok(text) => Self::compact(&text).into_bytes(),
      Err(err) => err.into_bytes(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compacts_style_sheets() {
    let css = "/* reset */\nbody {\n  margin: 0;\n  padding: 0;\n}\n\nh1 , h2 > span {\n  color: red;\n}\n";
    assert_eq!(
      CssCompactor::compact(css),
      "body{margin: 0;padding: 0}h1,h2>span{color: red}"
    );
  }

  #[test]
  fn keeps_quoted_strings_verbatim() {
    let css = ".a::before { content: \"x  ,  y ; /* z */\"; }\n.b { content: 'it''s' ; }";
    assert_eq!(
      CssCompactor::compact(css),
      ".a::before{content: \"x  ,  y ; /* z */\"}.b{content: 'it''s'}"
    );
  }

  #[test]
  fn keeps_url_arguments_verbatim() {
    let css = "/* it's a comment */\ndiv {\n  background: url( a ; b.png ) ;\n}\n";
    assert_eq!(CssCompactor::compact(css), "div{background: url( a ; b.png )}");
  }

  #[test]
  fn leaves_scripts_alone() {
    let js = b"var a = 1;  /* keep */\n".to_vec();
    assert_eq!(CssCompactor.format(AssetKind::Script, js.clone()), js);
  }

  #[test]
  fn passes_invalid_utf8_through() {
    let bytes = vec![0xff, 0xfe, b'{'];
    assert_eq!(CssCompactor.format(AssetKind::Style, bytes.clone()), bytes);
  }
}
