//! Removal of derived build outputs.
//!
//! Variants, artifacts and the build report under the build directory are all
//! regenerated by the next build, so any of them can be removed at any time.
//! Sources and patches are never touched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::BuildPlan;
use crate::consts::COMPLETE_SUFFIX;
use crate::overlay::{is_complete, marker_path};

#[derive(Debug, Error)]
pub enum CleanError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

#[derive(Debug, Default, Serialize)]
pub struct CleanStats {
  pub variants_deleted: usize,
  /// Variants that had no valid completion marker.
  pub incomplete_variants: usize,
  pub artifacts_deleted: usize,
  pub reports_deleted: usize,
  pub bytes_freed: u64,
}

impl CleanStats {
  pub fn total_deleted(&self) -> usize {
    self.variants_deleted + self.artifacts_deleted + self.reports_deleted
  }
}

#[derive(Debug, Serialize)]
pub struct CleanResult {
  pub stats: CleanStats,
  pub deleted_paths: Vec<PathBuf>,
}

/// Remove every variant, artifact directory and the build report of `plan`.
///
/// With `dry_run`, nothing is deleted but the result lists what would be.
/// A path that fails to delete is logged and skipped.
pub fn clean(plan: &BuildPlan, dry_run: bool) -> Result<CleanResult, CleanError> {
  let mut stats = CleanStats::default();
  let mut deleted_paths = Vec::new();

  let variants_dir = plan.variants_dir();
  for path in entries(&variants_dir)? {
    if is_marker(&path) {
      // Markers go with their variant; only orphans are removed here.
      if !variant_of_marker(&path).exists() {
        remove(&path, dry_run, &mut stats.bytes_freed);
      }
      continue;
    }
    if !is_complete(&path) {
      debug!(path = %path.display(), "removing incomplete variant");
      stats.incomplete_variants += 1;
    }
    if remove(&path, dry_run, &mut stats.bytes_freed) {
      stats.variants_deleted += 1;
      let marker = marker_path(&path);
      if marker.is_file() {
        remove(&marker, dry_run, &mut stats.bytes_freed);
      }
      deleted_paths.push(path);
    }
  }

  for path in entries(&plan.artifacts_dir())? {
    if remove(&path, dry_run, &mut stats.bytes_freed) {
      stats.artifacts_deleted += 1;
      deleted_paths.push(path);
    }
  }

  let report = plan.report_path();
  if report.is_file() && remove(&report, dry_run, &mut stats.bytes_freed) {
    stats.reports_deleted += 1;
    deleted_paths.push(report);
  }

  info!(
    variants_deleted = stats.variants_deleted,
    artifacts_deleted = stats.artifacts_deleted,
    bytes_freed = stats.bytes_freed,
    dry_run,
    "clean complete"
  );

  Ok(CleanResult { stats, deleted_paths })
}

/// Immediate children of `dir`, sorted; empty if `dir` does not exist.
fn entries(dir: &Path) -> Result<Vec<PathBuf>, CleanError> {
  if !dir.is_dir() {
    return Ok(Vec::new());
  }
  let read = fs::read_dir(dir).map_err(|source| CleanError::Read {
    path: dir.to_path_buf(),
    source,
  })?;
  let mut paths: Vec<PathBuf> = read.flatten().map(|e| e.path()).collect();
  paths.sort();
  Ok(paths)
}

fn is_marker(path: &Path) -> bool {
  path.is_file()
    && path
      .file_name()
      .and_then(|n| n.to_str())
      .is_some_and(|n| n.ends_with(COMPLETE_SUFFIX))
}

fn variant_of_marker(marker: &Path) -> PathBuf {
  let name = marker.file_name().and_then(|n| n.to_str()).unwrap_or_default();
  marker.with_file_name(name.strip_suffix(COMPLETE_SUFFIX).unwrap_or(name))
}

fn size_of(path: &Path) -> u64 {
  WalkDir::new(path)
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .filter_map(|e| e.metadata().ok())
    .map(|m| m.len())
    .sum()
}

fn remove(path: &Path, dry_run: bool, bytes_freed: &mut u64) -> bool {
  let size = size_of(path);
  if dry_run {
    *bytes_freed += size;
    return true;
  }

  let result = if path.is_dir() {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  };

  match result {
    Ok(()) => {
      *bytes_freed += size;
      true
    }
    Err(e) => {
      warn!(path = %path.display(), error = %e, "failed to delete");
      false
    }
  }
}
