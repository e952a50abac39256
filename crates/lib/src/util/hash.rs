//! Directory and file hashing.
//!
//! Derived source roots and artifact sets are identified by a SHA-256 over
//! their contents. The hash covers relative paths, file contents and symlink
//! targets, never timestamps or permissions, so two trees with the same files
//! hash the same regardless of when or where they were written.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// A full 64-character lowercase hex SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum DirHashError {
  #[error("failed to walk directory: {message}")]
  WalkDir { message: String },

  #[error("failed to read file {path}: {message}")]
  ReadFile { path: PathBuf, message: String },

  #[error("failed to read symlink {path}: {message}")]
  ReadSymlink { path: PathBuf, message: String },
}

fn walk(path: &Path, exclude: &[&str]) -> impl Iterator<Item = Result<walkdir::DirEntry, DirHashError>> {
  let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
  WalkDir::new(path)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(move |e| {
      e.file_name()
        .to_str()
        .map(|name| !exclude.iter().any(|x| x == name))
        .unwrap_or(true)
    })
    .map(|entry| entry.map_err(|e| DirHashError::WalkDir { message: e.to_string() }))
}

fn relative(root: &Path, entry_path: &Path) -> String {
  entry_path
    .strip_prefix(root)
    .unwrap_or(entry_path)
    .components()
    .map(|c| c.as_os_str().to_string_lossy().into_owned())
    .collect::<Vec<_>>()
    .join("/")
}

/// Compute a deterministic hash of a directory's contents.
///
/// Entries whose file name appears in `exclude` are skipped along with
/// everything beneath them. Relative paths are normalised to `/` separators so
/// the hash is the same on every platform.
pub fn hash_directory(path: &Path, exclude: &[&str]) -> Result<ContentHash, DirHashError> {
  let mut entries: Vec<(String, String)> = Vec::new();

  for entry in walk(path, exclude) {
    let entry = entry?;
    let entry_path = entry.path();
    let rel_path = relative(path, entry_path);

    if rel_path.is_empty() {
      continue;
    }

    let file_type = entry.file_type();
    let line = if file_type.is_file() {
      format!("F:{}:{}", rel_path, hash_file(entry_path)?.0)
    } else if file_type.is_dir() {
      format!("D:{}", rel_path)
    } else if file_type.is_symlink() {
      let target = fs::read_link(entry_path).map_err(|e| DirHashError::ReadSymlink {
        path: entry_path.to_path_buf(),
        message: e.to_string(),
      })?;
      format!("L:{}:{}", rel_path, hash_bytes(target.to_string_lossy().as_bytes()).0)
    } else {
      continue;
    };

    entries.push((rel_path, line));
  }

  entries.sort_by(|a, b| a.0.cmp(&b.0));

  let mut hasher = Sha256::new();
  for (_, line) in entries {
    hasher.update(line.as_bytes());
    hasher.update(b"\n");
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// List regular files under `path`, relative to it, in sorted order.
pub fn list_files(path: &Path, exclude: &[&str]) -> Result<Vec<PathBuf>, DirHashError> {
  let mut files = Vec::new();
  for entry in walk(path, exclude) {
    let entry = entry?;
    if entry.file_type().is_file() {
      files.push(PathBuf::from(relative(path, entry.path())));
    }
  }
  files.sort();
  Ok(files)
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> Result<ContentHash, DirHashError> {
  let read_err = |e: std::io::Error| DirHashError::ReadFile {
    path: path.to_path_buf(),
    message: e.to_string(),
  };

  let mut file = fs::File::open(path).map_err(read_err)?;
  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_err)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

pub fn hash_bytes(data: &[u8]) -> ContentHash {
  ContentHash(hex::encode(Sha256::digest(data)))
}
