//! Types for per-version compilation.
//!
//! This module defines the compiler capability, the artifact sets it produces,
//! the error type and the aggregate report of a dispatch.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::overlay::{OverlayError, SourceRoot};
use crate::util::hash::{ContentHash, DirHashError, hash_directory, list_files};
use crate::version::TargetVersion;

/// The external compiler.
///
/// `target` is the language-level ceiling. An implementation must fail with
/// [`CompileError::IncompatibleFeature`] rather than emit output that needs a
/// newer level.
pub trait Compiler: Send + Sync + 'static {
  fn compile(
    &self,
    source: &SourceRoot,
    target: TargetVersion,
  ) -> impl Future<Output = Result<ArtifactSet, CompileError>> + Send;
}

/// Output of compiling one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
  pub version: TargetVersion,
  pub dir: PathBuf,
  /// Files relative to `dir`, sorted.
  pub files: Vec<PathBuf>,
  pub content_hash: ContentHash,
}

impl ArtifactSet {
  /// Describe the compiled output found in `dir`.
  pub fn from_dir(version: TargetVersion, dir: &Path) -> Result<Self, DirHashError> {
    Ok(Self {
      version,
      dir: dir.to_path_buf(),
      files: list_files(dir, &[])?,
      content_hash: hash_directory(dir, &[])?,
    })
  }
}

#[derive(Debug, Error)]
pub enum CompileError {
  /// The source uses a language feature newer than the version's ceiling.
  #[error("version {version}: {feature} requires level {required} (used in {path})")]
  IncompatibleFeature {
    version: TargetVersion,
    feature: String,
    required: TargetVersion,
    path: PathBuf,
  },

  #[error("version {version}: compiler exited with code {code:?}")]
  CommandFailed { version: TargetVersion, code: Option<i32> },

  #[error("failed to prepare variant: {0}")]
  Overlay(#[from] OverlayError),

  #[error("failed to index artifacts: {0}")]
  Artifacts(#[from] DirHashError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// The task running this version panicked or was torn down.
  #[error("compile task did not finish: {0}")]
  TaskFailed(String),
}

/// Aggregate result of compiling every version.
#[derive(Debug, Default)]
pub struct CompileReport {
  pub artifacts: BTreeMap<TargetVersion, ArtifactSet>,
  pub failures: BTreeMap<TargetVersion, CompileError>,
}

impl CompileReport {
  /// True if every dispatched version produced artifacts.
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }

  pub fn failed_versions(&self) -> Vec<TargetVersion> {
    self.failures.keys().copied().collect()
  }

  pub fn total(&self) -> usize {
    self.artifacts.len() + self.failures.len()
  }
}
