//! Source roots, patch sets and the errors raised while merging them.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::util::hash::DirHashError;
use crate::version::{TargetVersion, VersionSet};

/// Whether a source root is the authoritative tree or a generated variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
  Base,
  Derived,
}

/// A named directory of sources valid for one target version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRoot {
  pub name: String,
  pub path: PathBuf,
  pub version: TargetVersion,
  pub origin: SourceOrigin,
}

impl SourceRoot {
  pub fn base(name: impl Into<String>, path: impl Into<PathBuf>, version: TargetVersion) -> Self {
    Self {
      name: name.into(),
      path: path.into(),
      version,
      origin: SourceOrigin::Base,
    }
  }

  pub fn is_derived(&self) -> bool {
    self.origin == SourceOrigin::Derived
  }
}

/// File-level overrides for one additional target version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchSet {
  pub name: String,
  /// Name of the source root this patch applies to.
  pub base: String,
  pub target: TargetVersion,
  pub dir: PathBuf,
}

/// Patch sets keyed by the additional version they produce.
///
/// Only constructible through [`PatchBindings::bind`], which guarantees exactly
/// one patch per additional version of the given [`VersionSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchBindings {
  by_version: BTreeMap<TargetVersion, PatchSet>,
}

impl PatchBindings {
  pub fn bind(versions: &VersionSet, patches: Vec<PatchSet>) -> Result<Self, ConfigError> {
    let mut by_version: BTreeMap<TargetVersion, PatchSet> = BTreeMap::new();

    for patch in patches {
      if !versions.is_additional(patch.target) {
        return Err(ConfigError::PatchForUndeclaredVersion {
          patch: patch.name,
          version: patch.target,
        });
      }
      if let Some(existing) = by_version.get(&patch.target) {
        return Err(ConfigError::DuplicatePatch {
          version: patch.target,
          first: existing.name.clone(),
          second: patch.name,
        });
      }
      by_version.insert(patch.target, patch);
    }

    if let Some(&missing) = versions.additional().iter().find(|v| !by_version.contains_key(v)) {
      return Err(ConfigError::MissingPatch(missing));
    }

    Ok(Self { by_version })
  }

  pub fn get(&self, version: TargetVersion) -> Option<&PatchSet> {
    self.by_version.get(&version)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&TargetVersion, &PatchSet)> {
    self.by_version.iter()
  }

  pub fn len(&self) -> usize {
    self.by_version.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_version.is_empty()
  }
}

#[derive(Debug, Error)]
pub enum OverlayError {
  /// The base source root does not exist. Fatal; never retried.
  #[error("base source root does not exist: {0}")]
  MissingBase(PathBuf),

  #[error("patch '{patch}' applies to source root '{expected}', not '{actual}'")]
  BaseMismatch {
    patch: String,
    expected: String,
    actual: String,
  },

  #[error("variant directory {dest} overlaps its input {input}")]
  Overlap { dest: PathBuf, input: PathBuf },

  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to walk {path}: {message}")]
  Walk { path: PathBuf, message: String },

  #[error("failed to hash variant: {0}")]
  Hash(#[from] DirHashError),

  #[error("invalid completion marker: {0}")]
  Marker(#[from] serde_json::Error),
}

impl OverlayError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    OverlayError::Io {
      path: path.into(),
      source,
    }
  }
}
