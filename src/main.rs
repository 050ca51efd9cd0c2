//! `hrl` renders a JSON file of asset declarations into ordered tags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use hierarchical_loader::{AssetKind, AssetLoader, LoaderConfig, LoaderContext, LogStyle, QueueInput};

#[derive(Parser)]
#[command(name = "hrl", version, about = "Dependency-ordered style sheet and script loader")]
struct Cli {
  /// Print resolution events to stderr.
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve the declarations and print the resulting tags.
  Render(RenderArgs),
}

#[derive(Args)]
struct RenderArgs {
  /// JSON file with `style` and `script` declaration lists.
  #[arg(short, long)]
  manifest: PathBuf,

  /// Configuration file; discovered next to the manifest when omitted.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Directory the configured web root is relative to.
  #[arg(short, long)]
  root: Option<PathBuf>,

  /// Kinds to render, in order. Defaults to style then script.
  #[arg(short, long = "kind", value_enum)]
  kinds: Vec<KindArg>,

  /// Emit one tag per asset instead of a merged bundle.
  #[arg(long)]
  no_merge: bool,

  /// Append the activity log to the output.
  #[arg(long, value_enum)]
  log: Option<LogArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
  Style,
  Script,
}

impl From<KindArg> for AssetKind {
  fn from(kind: KindArg) -> Self {
    match kind {
      KindArg::Style => AssetKind::Style,
      KindArg::Script => AssetKind::Script,
    }
  }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogArg {
  Plain,
  Commented,
}

impl From<LogArg> for LogStyle {
  fn from(style: LogArg) -> Self {
    match style {
      LogArg::Plain => LogStyle::Plain,
      LogArg::Commented => LogStyle::Commented,
    }
  }
}

/// Declaration file layout.
#[derive(Debug, Default, Deserialize)]
struct Declarations {
  #[serde(default, alias = "css")]
  style: Vec<QueueInput>,
  #[serde(default, alias = "js")]
  script: Vec<QueueInput>,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let level = if cli.verbose {
    tracing::Level::DEBUG
  } else {
    tracing::Level::WARN
  };
  tracing_subscriber::fmt()
    .with_max_level(level)
    .with_writer(std::io::stderr)
    .init();

  match cli.command {
    Commands::Render(args) => render(&args),
  }
}

fn render(args: &RenderArgs) -> Result<()> {
  let declarations = load_declarations(&args.manifest)?;
  let manifest_dir = args
    .manifest
    .parent()
    .filter(|parent| !parent.as_os_str().is_empty())
    .unwrap_or(Path::new("."));

  let mut config = match &args.config {
    Some(path) => LoaderConfig::from_path(path)
      .with_context(|| format!("failed to load configuration {}", path.display()))?,
    None => LoaderConfig::discover(manifest_dir),
  };
  if args.no_merge {
    config.merge = false;
  }

  let base_dir = args.root.as_deref().unwrap_or(manifest_dir);
  let loader = AssetLoader::from_config(&config, base_dir);

  let mut context = LoaderContext::new();
  for input in declarations.style {
    context.enqueue(AssetKind::Style, input);
  }
  for input in declarations.script {
    context.enqueue(AssetKind::Script, input);
  }

  let kinds: Vec<AssetKind> = if args.kinds.is_empty() {
    AssetKind::ALL.to_vec()
  } else {
    args.kinds.iter().copied().map(AssetKind::from).collect()
  };

  for kind in kinds {
    print!("{}", loader.emit(&mut context, kind).html);
  }

  if let Some(style) = args.log {
    println!("{}", context.render_log(style.into()));
  }

  Ok(())
}

fn load_declarations(path: &Path) -> Result<Declarations> {
  let content = fs::read_to_string(path)
    .with_context(|| format!("declarations not found at {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse declarations in {}", path.display()))
}
