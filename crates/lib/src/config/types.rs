//! On-disk configuration format and configuration errors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compile::LanguageFeature;
use crate::version::TargetVersion;

/// The parsed `mvb.toml`, before validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
  pub project: ProjectSection,
  pub versions: VersionsSection,
  #[serde(default, rename = "patch")]
  pub patches: Vec<PatchSection>,
  pub compiler: CompilerSection,
  #[serde(default)]
  pub publish: PublishSection,
  #[serde(default)]
  pub build: BuildSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
  pub name: String,
  pub group: String,
  /// Version label, e.g. `1.0.0` or `1.1.0-SNAPSHOT`.
  pub version: String,
  /// Root project name when this project is a subproject.
  #[serde(default)]
  pub root: Option<String>,
  /// Base source directory, relative to the project root.
  #[serde(default)]
  pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VersionsSection {
  pub default: TargetVersion,
  #[serde(default)]
  pub additional: Vec<TargetVersion>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PatchSection {
  pub name: String,
  pub target: TargetVersion,
  /// Overlay directory, defaults to `patches/<name>`.
  #[serde(default)]
  pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerSection {
  pub command: String,
  #[serde(default)]
  pub parallelism: Option<usize>,
  /// Shell used to run `command`, defaults to `/bin/sh` on Unix.
  #[serde(default)]
  pub shell: Option<String>,
  #[serde(default, rename = "feature")]
  pub features: Vec<LanguageFeature>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PublishSection {
  #[serde(default)]
  pub url: Option<String>,
  #[serde(default)]
  pub channel: Option<String>,
  #[serde(default)]
  pub snapshot_marker: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
  #[serde(default)]
  pub dir: Option<PathBuf>,
}

/// Invalid or inconsistent configuration. Always detected before any work is
/// scheduled.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid value for {field}: {message}")]
  Invalid { field: &'static str, message: String },

  #[error("default version already declared as {existing}, cannot redeclare as {version}")]
  DefaultRedeclared {
    existing: TargetVersion,
    version: TargetVersion,
  },

  #[error("additional version {version} must be lower than the default version {default}")]
  NotBelowDefault {
    version: TargetVersion,
    default: TargetVersion,
  },

  #[error("additional versions declared before a default version")]
  DefaultNotDeclared,

  #[error("version {0} declared twice")]
  DuplicateVersion(TargetVersion),

  #[error("patch '{patch}' targets version {version}, which is not an additional version")]
  PatchForUndeclaredVersion { patch: String, version: TargetVersion },

  #[error("version {version} has two patches: '{first}' and '{second}'")]
  DuplicatePatch {
    version: TargetVersion,
    first: String,
    second: String,
  },

  #[error("additional version {0} has no patch")]
  MissingPatch(TargetVersion),

  #[error("additional version {0} has no source variant")]
  MissingOverlay(TargetVersion),

  #[error("source variant given for version {0}, which is not an additional version")]
  UnexpectedOverlay(TargetVersion),
}
