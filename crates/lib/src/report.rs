//! Persisted build report.
//!
//! After every build the outcome of each version is written to
//! `<build_dir>/report.json`:
//!
//! ```text
//! {
//!   "version": 1,
//!   "label": "1.0-SNAPSHOT",
//!   "targets": [ { "target": 17, "status": "compiled", ... }, ... ]
//! }
//! ```
//!
//! Only `mvb info` reads it back. `mvb publish` rebuilds and works from the
//! fresh in-memory result.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::compile::CompileReport;
use crate::publish::BuildVersionLabel;
use crate::version::{TargetVersion, VersionSet};

/// Current report format version.
pub const REPORT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ReportError {
  #[error("failed to serialize report: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to write report: {0}")]
  Write(#[source] io::Error),

  #[error("failed to read report: {0}")]
  Read(#[source] io::Error),

  #[error("failed to parse report: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("unsupported report version {0}")]
  UnsupportedVersion(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
  Compiled,
  Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
  pub target: TargetVersion,
  pub default: bool,
  pub status: TargetStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub artifacts_dir: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub files: Vec<PathBuf>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content_hash: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
  pub version: u32,
  pub label: BuildVersionLabel,
  /// One entry per target, in version-set order.
  pub targets: Vec<TargetReport>,
}

impl BuildReport {
  pub fn from_compile(label: &BuildVersionLabel, versions: &VersionSet, report: &CompileReport) -> Self {
    let targets = versions
      .list()
      .into_iter()
      .filter_map(|target| {
        let default = versions.is_default(target);
        if let Some(set) = report.artifacts.get(&target) {
          Some(TargetReport {
            target,
            default,
            status: TargetStatus::Compiled,
            artifacts_dir: Some(set.dir.clone()),
            files: set.files.clone(),
            content_hash: Some(set.content_hash.0.clone()),
            error: None,
          })
        } else {
          report.failures.get(&target).map(|err| TargetReport {
            target,
            default,
            status: TargetStatus::Failed,
            artifacts_dir: None,
            files: Vec::new(),
            content_hash: None,
            error: Some(err.to_string()),
          })
        }
      })
      .collect();

    Self {
      version: REPORT_VERSION,
      label: label.clone(),
      targets,
    }
  }

  pub fn compiled(&self) -> usize {
    self.targets.iter().filter(|t| t.status == TargetStatus::Compiled).count()
  }

  pub fn failed(&self) -> usize {
    self.targets.iter().filter(|t| t.status == TargetStatus::Failed).count()
  }

  /// Write the report to `path` atomically (temp file, then rename).
  pub fn save(&self, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(ReportError::Write)?;
    }
    let temp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(self).map_err(ReportError::Serialize)?;
    fs::write(&temp_path, &content).map_err(ReportError::Write)?;
    fs::rename(&temp_path, path).map_err(ReportError::Write)?;
    debug!(path = ?path, "build report saved");
    Ok(())
  }

  /// Load the report at `path`; `Ok(None)` if no build has run yet.
  pub fn load(path: &Path) -> Result<Option<Self>, ReportError> {
    if !path.exists() {
      return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(ReportError::Read)?;
    let report: Self = serde_json::from_str(&content).map_err(ReportError::Parse)?;
    if report.version != REPORT_VERSION {
      return Err(ReportError::UnsupportedVersion(report.version));
    }
    Ok(Some(report))
  }
}
