use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use hierarchical_loader::merge::Signature;
use hierarchical_loader::{
  ActivityEvent, AssetKind, AssetLoader, LoaderConfig, LoaderContext, LogStyle, PartialRecord,
};
use tempfile::tempdir;

fn write_sources(root: &Path) -> std::io::Result<()> {
  let css = root.join("webroot/css");
  fs::create_dir_all(css.join("layout"))?;
  fs::write(css.join("base.css"), "body {\n  margin: 0;\n}\n")?;
  fs::write(css.join("layout/theme.css"), "/* theme */\nh1 { color: red; }\n")?;
  fs::write(css.join("x.css"), "ghost { display: none; }\n")?;
  Ok(())
}

fn declare(context: &mut LoaderContext) {
  context.enqueue(AssetKind::Style, PartialRecord::new("base").key("base"));
  context.enqueue(
    AssetKind::Style,
    PartialRecord::new("layout/theme").key("theme").requires(["base"]),
  );
  context.enqueue(
    AssetKind::Style,
    PartialRecord::new("x").key("ghost").requires(["missing"]),
  );
}

fn set_mtime(path: &Path, time: SystemTime) -> std::io::Result<()> {
  fs::File::options().write(true).open(path)?.set_modified(time)
}

#[test]
fn resolves_merges_and_caches_on_disk() -> std::io::Result<()> {
  let temp = tempdir()?;
  let root = temp.path();
  write_sources(root)?;

  let loader = AssetLoader::from_config(&LoaderConfig::default(), root);
  let signature = Signature::of_keys(["base", "theme"]).to_hex();
  let bundle = root.join(format!("webroot/css/c/{signature}.css"));

  let mut first = LoaderContext::new();
  declare(&mut first);
  let output = loader.emit(&mut first, AssetKind::Style);

  assert_eq!(output.loaded, vec!["base", "theme"]);
  assert_eq!(
    output.html,
    format!("<link rel=\"stylesheet\" type=\"text/css\" href=\"/css/c/{signature}.css\" media=\"all\" />\n")
  );
  assert_eq!(fs::read_to_string(&bundle)?, "body{margin: 0}h1{color: red}");

  let log = first.render_log(LogStyle::Commented);
  assert!(log.contains("NEWDIR: The directory 'css/c' has been created."));
  assert!(log.contains("SKIPPED: 'ghost' - Cannot find requirement missing."));
  assert!(log.contains("NEW CACHE"));

  // Age every source so the bundle is clearly the newest file.
  let past = SystemTime::now() - Duration::from_secs(3600);
  for source in ["base.css", "layout/theme.css", "x.css"] {
    set_mtime(&root.join("webroot/css").join(source), past)?;
  }
  let written_at = fs::metadata(&bundle)?.modified()?;

  let mut second = LoaderContext::new();
  declare(&mut second);
  let reused = loader.emit(&mut second, AssetKind::Style);

  assert_eq!(reused.html, output.html);
  assert!(!reused.artifact.as_ref().unwrap().regenerated);
  assert_eq!(fs::metadata(&bundle)?.modified()?, written_at);
  assert!(
    second
      .log()
      .events()
      .iter()
      .any(|event| matches!(event, ActivityEvent::CacheReused { .. }))
  );

  // Touch a nested source; the next pass must rewrite the bundle.
  fs::write(root.join("webroot/css/layout/theme.css"), "h1 { color: blue; }\n")?;
  set_mtime(
    &root.join("webroot/css/layout/theme.css"),
    SystemTime::now() + Duration::from_secs(3600),
  )?;

  let mut third = LoaderContext::new();
  declare(&mut third);
  let refreshed = loader.emit(&mut third, AssetKind::Style);

  assert!(refreshed.artifact.unwrap().regenerated);
  assert_eq!(fs::read_to_string(&bundle)?, "body{margin: 0}h1{color: blue}");
  Ok(())
}

#[test]
fn unmerged_output_lists_tags_in_dependency_order() -> std::io::Result<()> {
  let temp = tempdir()?;
  let root = temp.path();
  write_sources(root)?;
  fs::create_dir_all(root.join("webroot/js"))?;
  fs::write(root.join("webroot/js/app.js"), "start();")?;

  let config = LoaderConfig {
    merge: false,
    ..LoaderConfig::default()
  };
  let loader = AssetLoader::from_config(&config, root);

  let mut context = LoaderContext::new();
  context.enqueue(
    AssetKind::Script,
    PartialRecord::new("app").requires(["https://cdn.example.com/lib.js"]),
  );
  context.enqueue(AssetKind::Script, "https://cdn.example.com/lib.js");

  let output = loader.emit(&mut context, AssetKind::Script);

  assert_eq!(output.loaded, vec!["https://cdn.example.com/lib.js", "app"]);
  assert_eq!(
    output.html,
    concat!(
      "<script type=\"text/javascript\" src=\"https://cdn.example.com/lib.js\"></script>\n",
      "<script type=\"text/javascript\" src=\"/js/app.js\"></script>\n"
    )
  );
  assert!(!root.join("webroot/js/c").exists());
  Ok(())
}
