//! Append-only trace of every resolution and caching decision.
//!
//! Each event renders as one line of the operator-facing log and is mirrored to `tracing`
//! so embedding applications can route it into their own subscriber.

use std::fmt;

use crate::models::AssetKind;

const RULE_WIDTH: usize = 100;
const TITLE: &str = "HIERARCHICAL RESOURCE LOADER LOG";

/// A single decision recorded while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
  /// Start of the section for one kind.
  SectionStart {
    /// Kind being rendered.
    kind: AssetKind,
  },
  /// End of the section for one kind.
  SectionEnd,
  /// The kind's queue was empty.
  NothingToLoad,
  /// A record's requirements are being examined.
  CheckingDependencies {
    /// Key of the record concerned.
    key: String,
  },
  /// A requirement is queued but not loaded yet.
  Pending {
    /// Key of the record concerned.
    key: String,
    /// Requirement still outstanding.
    waiting_for: String,
  },
  /// A requirement was never queued or has already been dropped.
  Skipped {
    /// Key of the record concerned.
    key: String,
    /// Requirement that can never be met.
    missing: String,
  },
  /// No record progressed during a whole pass; the record waits on a cycle.
  Stalled {
    /// Key of the record concerned.
    key: String,
    /// Requirement still outstanding.
    waiting_for: String,
  },
  /// The record was resolved and handed on.
  Loaded {
    /// Key of the record concerned.
    key: String,
  },
  /// The record's source file does not exist.
  Failed {
    /// Key of the record concerned.
    key: String,
  },
  /// The source file is empty or unreadable.
  Unreadable {
    /// Key of the record concerned.
    key: String,
  },
  /// External addresses cannot be folded into a merged bundle.
  NotMergeable {
    /// Key of the record concerned.
    key: String,
  },
  /// The cache directory was created.
  CacheDirCreated {
    /// Kind being rendered.
    kind: AssetKind,
    /// Cache directory label, e.g. `css/c`.
    label: String,
  },
  /// The cache directory could not be created.
  CacheDirFailed {
    /// Kind being rendered.
    kind: AssetKind,
    /// Cache directory label, e.g. `css/c`.
    label: String,
  },
  /// A bundle was written.
  CacheWritten {
    /// Kind being rendered.
    kind: AssetKind,
    /// Bundle signature.
    signature: String,
  },
  /// Writing a bundle failed.
  CacheWriteFailed {
    /// Kind being rendered.
    kind: AssetKind,
    /// Bundle signature.
    signature: String,
    /// Underlying I/O error.
    reason: String,
  },
  /// An existing bundle was reused.
  CacheReused {
    /// Kind being rendered.
    kind: AssetKind,
    /// Bundle signature.
    signature: String,
  },
}

impl ActivityEvent {
  /// Whether the event reports a record or bundle that did not make it into the output.
  pub fn is_problem(&self) -> bool {
    matches!(
      self,
      ActivityEvent::Skipped { .. }
        | ActivityEvent::Stalled { .. }
        | ActivityEvent::Failed { .. }
        | ActivityEvent::Unreadable { .. }
        | ActivityEvent::NotMergeable { .. }
        | ActivityEvent::CacheDirFailed { .. }
        | ActivityEvent::CacheWriteFailed { .. }
    )
  }
}

impl fmt::Display for ActivityEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ActivityEvent::SectionStart { kind } => {
        writeln!(f, "{} FILES", kind.title())?;
        write!(f, "{}", "-".repeat(RULE_WIDTH))
      }
      ActivityEvent::SectionEnd => writeln!(f, "{}", "-".repeat(RULE_WIDTH)),
      ActivityEvent::NothingToLoad => write!(f, "|   Nothing to load..."),
      ActivityEvent::CheckingDependencies { key } => {
        write!(f, "|   | DEPENDENCIES: '{key}' - checking dependencies.")
      }
      ActivityEvent::Pending { key, waiting_for } => {
        write!(f, "|   | - PENDING: '{key}' - waiting for file '{waiting_for}'...")
      }
      ActivityEvent::Skipped { key, missing } => write!(
        f,
        "| ! | - SKIPPED: '{key}' - Cannot find requirement {missing}. '{key}' will be skipped."
      ),
      ActivityEvent::Stalled { key, waiting_for } => write!(
        f,
        "| ! | - SKIPPED: '{key}' - Requirement {waiting_for} can never load (circular). '{key}' will be skipped."
      ),
      ActivityEvent::Loaded { key } => write!(f, "| # | LOADED: '{key}' - loaded."),
      ActivityEvent::Failed { key } => write!(f, "| ! | FAILED: File '{key}' does not exist."),
      ActivityEvent::Unreadable { key } => {
        write!(f, "| ! | ERROR: '{key}' - File is corrupt or missing.")
      }
      ActivityEvent::NotMergeable { key } => {
        write!(f, "| ! | ERROR: '{key}' - External files cannot be merged.")
      }
      ActivityEvent::CacheDirCreated { label, .. } => {
        write!(f, "|   | NEWDIR: The directory '{label}' has been created.")
      }
      ActivityEvent::CacheDirFailed { label, .. } => {
        write!(f, "| ! | ERROR: Failed to make the '{label}' directory.")
      }
      ActivityEvent::CacheWritten { kind, signature } => write!(
        f,
        "| # | NEW CACHE: The {kind} has been dumped to cache '{signature}'."
      ),
      ActivityEvent::CacheWriteFailed {
        kind,
        signature,
        reason,
      } => write!(
        f,
        "| ! | ERROR: Failed to write the {kind} cache '{signature}': {reason}."
      ),
      ActivityEvent::CacheReused { kind, signature } => write!(
        f,
        "| # | CACHE: Loaded the cached {kind} from '{signature}'."
      ),
    }
  }
}

/// How [`ActivityLog::render`] wraps the log text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogStyle {
  /// Visible on page inside `<pre>` tags.
  #[default]
  Plain,
  /// Hidden inside an HTML comment.
  Commented,
}

/// Ordered list of events for one loader context.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
  events: Vec<ActivityEvent>,
}

impl ActivityLog {
  /// Create an empty log.
  pub fn new() -> Self {
    Self::default()
  }

  /// Append an event.
  pub fn record(&mut self, event: ActivityEvent) {
    match &event {
      ActivityEvent::SectionStart { .. } | ActivityEvent::SectionEnd => {}
      event if event.is_problem() => tracing::warn!(target: "hrl", "{event}"),
      event => tracing::debug!(target: "hrl", "{event}"),
    }
    self.events.push(event);
  }

  /// Events in the order they were recorded.
  pub fn events(&self) -> &[ActivityEvent] {
    &self.events
  }

  /// Whether nothing has been recorded.
  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }

  /// Banner followed by one line per event.
  pub fn to_text(&self) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut text = format!("\n\n{TITLE:^width$}\n\n{rule}\n\n", width = RULE_WIDTH);
    for event in &self.events {
      text.push_str(&event.to_string());
      text.push('\n');
    }
    text
  }

  /// Log text wrapped for embedding in a page.
  pub fn render(&self, style: LogStyle) -> String {
    match style {
      LogStyle::Plain => format!("<pre>{}</pre>", self.to_text()),
      LogStyle::Commented => format!("<!--\n\n{}\n\n-->", self.to_text()),
    }
  }
}
