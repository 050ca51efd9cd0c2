//! Filesystem capabilities used by the resolver and the merge cache.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use jwalk::WalkDir;

/// Narrow filesystem seam. Every failure is reported, never panicked on.
pub trait AssetStorage {
  /// Whether a file or directory exists at `path`.
  fn exists(&self, path: &Path) -> bool;

  /// Read the full contents of a file.
  fn read_all(&self, path: &Path) -> io::Result<Vec<u8>>;

  /// Newest modification time of any file below `dir`, recursively.
  ///
  /// `None` when the directory is missing or holds no files.
  fn last_modified_recursive(&self, dir: &Path) -> Option<SystemTime>;

  /// Create `path` and any missing parents.
  fn make_dir(&self, path: &Path) -> io::Result<()>;

  /// Create or truncate the file at `path` with `contents`.
  fn write_all(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// [`AssetStorage`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStorage;

impl AssetStorage for DiskStorage {
  fn exists(&self, path: &Path) -> bool {
    path.exists()
  }

  fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
  }

  fn last_modified_recursive(&self, dir: &Path) -> Option<SystemTime> {
    if !dir.is_dir() {
      return None;
    }

    WalkDir::new(dir)
      .into_iter()
      .filter_map(Result::ok)
      .filter(|entry| entry.file_type().is_file())
      .filter_map(|entry| entry.metadata().ok()?.modified().ok())
      .max()
  }

  fn make_dir(&self, path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
  }

  fn write_all(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
  }
}

impl<T: AssetStorage + ?Sized> AssetStorage for &T {
  fn exists(&self, path: &Path) -> bool {
    (**self).exists(path)
  }

  fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
    (**self).read_all(path)
  }

  fn last_modified_recursive(&self, dir: &Path) -> Option<SystemTime> {
    (**self).last_modified_recursive(dir)
  }

  fn make_dir(&self, path: &Path) -> io::Result<()> {
    (**self).make_dir(path)
  }

  fn write_all(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    (**self).write_all(path, contents)
  }
}
