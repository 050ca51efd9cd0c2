//! Public entry points: queue declarations into a context and emit tags per kind.

use std::collections::BTreeMap;
use std::path::Path;

use crate::activity::{ActivityEvent, ActivityLog, LogStyle};
use crate::config::LoaderConfig;
use crate::merge::{ContentFilter, CssCompactor, MergeBuffer, NoopFilter};
use crate::models::{AssetKind, AssetRecord, CacheArtifact, PartialRecord, QueueInput};
use crate::normalize::normalize;
use crate::project::AssetLayout;
use crate::queue::{AssetQueue, PendingRecords};
use crate::render::{HtmlTagRenderer, TagRenderer};
use crate::resolver::{AssetSink, ResolvedSource, resolve};
use crate::storage::{AssetStorage, DiskStorage};

/// Per-request state: the pending queue and the activity log.
///
/// One context belongs to one request; loaders can be shared, contexts cannot.
#[derive(Debug, Clone)]
pub struct LoaderContext {
  queue: AssetQueue,
  log: ActivityLog,
}

impl Default for LoaderContext {
  fn default() -> Self {
    Self::new()
  }
}

impl LoaderContext {
  /// Create a context with an empty queue and log.
  pub fn new() -> Self {
    Self {
      queue: AssetQueue::new(),
      log: ActivityLog::new(),
    }
  }

  /// Queue declarations of `kind`. Returns how many records were accepted.
  pub fn enqueue(&mut self, kind: AssetKind, input: impl Into<QueueInput>) -> usize {
    self.queue.enqueue(kind, input)
  }

  /// Pending declarations.
  pub fn queue(&self) -> &AssetQueue {
    &self.queue
  }

  /// Everything recorded so far.
  pub fn log(&self) -> &ActivityLog {
    &self.log
  }

  /// Log text wrapped for embedding in a page.
  pub fn render_log(&self, style: LogStyle) -> String {
    self.log.render(style)
  }
}

/// Result of emitting one kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
  /// Tags, one per line.
  pub html: String,
  /// Keys loaded in this pass, in load order.
  pub loaded: Vec<String>,
  /// Bundle used for this pass when merging.
  pub artifact: Option<CacheArtifact>,
}

type FilterMap = BTreeMap<AssetKind, Box<dyn ContentFilter>>;

/// Resolves queued declarations into tags, merging them into cached bundles when enabled.
pub struct AssetLoader<S = DiskStorage, R = HtmlTagRenderer> {
  layout: AssetLayout,
  merge: bool,
  storage: S,
  renderer: R,
  filters: FilterMap,
}

impl AssetLoader {
  /// Disk-backed loader configured from `config`, with directories relative to `base_dir`.
  pub fn from_config(config: &LoaderConfig, base_dir: &Path) -> Self {
    let renderer = HtmlTagRenderer {
      style_prefix: config.style_url_prefix.clone(),
      script_prefix: config.script_url_prefix.clone(),
    };
    let loader = AssetLoader::new(config.to_layout(base_dir), DiskStorage, renderer)
      .with_merge(config.merge);

    if config.compact_styles {
      loader.with_filter(AssetKind::Style, CssCompactor)
    } else {
      loader
    }
  }
}

impl<S: AssetStorage, R: TagRenderer> AssetLoader<S, R> {
  /// Loader with merging enabled and no content filters.
  pub fn new(layout: AssetLayout, storage: S, renderer: R) -> Self {
    Self {
      layout,
      merge: true,
      storage,
      renderer,
      filters: FilterMap::new(),
    }
  }

  /// Toggle merge mode.
  pub fn with_merge(mut self, merge: bool) -> Self {
    self.merge = merge;
    self
  }

  /// Run `filter` over bundles of `kind` before they are cached.
  pub fn with_filter(mut self, kind: AssetKind, filter: impl ContentFilter + 'static) -> Self {
    self.filters.insert(kind, Box::new(filter));
    self
  }

  /// Directory layout in use.
  pub fn layout(&self) -> &AssetLayout {
    &self.layout
  }

  /// Storage backend in use.
  pub fn storage(&self) -> &S {
    &self.storage
  }

  /// Whether merge mode is enabled.
  pub fn merges(&self) -> bool {
    self.merge
  }

  /// Drain the queue for `kind` and return its tags.
  ///
  /// Never fails: records that cannot be loaded are left out and reported in the log.
  pub fn emit(&self, context: &mut LoaderContext, kind: AssetKind) -> RenderOutput {
    let log = &mut context.log;
    log.record(ActivityEvent::SectionStart { kind });

    if context.queue.is_empty(kind) {
      log.record(ActivityEvent::NothingToLoad);
      return RenderOutput::default();
    }

    let pending = context.queue.drain(kind);
    let output = if self.merge {
      self.emit_merged(kind, pending, log)
    } else {
      self.emit_individually(kind, pending, log)
    };

    log.record(ActivityEvent::SectionEnd);
    output
  }

  /// Emit every kind in turn and concatenate the tags.
  pub fn emit_all(&self, context: &mut LoaderContext) -> String {
    AssetKind::ALL
      .into_iter()
      .map(|kind| self.emit(context, kind).html)
      .collect()
  }

  fn emit_individually(
    &self,
    kind: AssetKind,
    pending: PendingRecords,
    log: &mut ActivityLog,
  ) -> RenderOutput {
    let mut sink = TagSink {
      renderer: &self.renderer,
      layout: &self.layout,
      kind,
      html: String::new(),
    };
    let loaded = resolve(pending, &self.layout, &self.storage, &mut sink, log);

    RenderOutput {
      html: sink.html,
      loaded,
      artifact: None,
    }
  }

  fn emit_merged(&self, kind: AssetKind, pending: PendingRecords, log: &mut ActivityLog) -> RenderOutput {
    let mut buffer = MergeBuffer::new(&self.storage);
    let loaded = resolve(pending, &self.layout, &self.storage, &mut buffer, log);

    let filter: &dyn ContentFilter = match self.filters.get(&kind) {
      Some(filter) => filter.as_ref(),
      None => &NoopFilter,
    };
    let artifact = buffer.finalize(kind, &self.layout, filter, log);

    let html = artifact
      .as_ref()
      .map(|artifact| {
        let bundle = bundle_record(kind, artifact);
        let file = format!("{}{}", bundle.address, kind.extension());
        let mut tag = self
          .renderer
          .bundle_tag(kind, &file, &bundle.tag_attributes());
        tag.push('\n');
        tag
      })
      .unwrap_or_default();

    RenderOutput {
      html,
      loaded,
      artifact,
    }
  }
}

/// Record describing a bundle, built from the kind's defaults like any declaration.
fn bundle_record(kind: AssetKind, artifact: &CacheArtifact) -> AssetRecord {
  normalize(
    &kind.defaults(),
    PartialRecord::new(artifact.address.clone()).key(artifact.signature.clone()),
    false,
  )
}

struct TagSink<'a, R> {
  renderer: &'a R,
  layout: &'a AssetLayout,
  kind: AssetKind,
  html: String,
}

impl<R: TagRenderer> TagSink<'_, R> {
  /// File the tag points at: the external URL, or the located source with its extension.
  fn file_for(&self, record: &AssetRecord, source: &ResolvedSource) -> String {
    let located = match source {
      ResolvedSource::External => return record.address.clone(),
      ResolvedSource::Local(path) => self.layout.public_file(self.kind, path),
    };
    located.unwrap_or_else(|| {
      format!(
        "{}{}",
        record.address.trim_start_matches('/'),
        self.kind.extension()
      )
    })
  }
}

impl<R: TagRenderer> AssetSink for TagSink<'_, R> {
  fn accept(&mut self, record: &AssetRecord, source: &ResolvedSource, _log: &mut ActivityLog) -> bool {
    let file = self.file_for(record, source);
    let tag = self
      .renderer
      .asset_tag(self.kind, &file, &record.tag_attributes());
    self.html.push_str(&tag);
    self.html.push('\n');
    true
  }
}
