//! Language-level feature gate.
//!
//! Each [`LanguageFeature`] names a token that only compiles from a given
//! level onwards. Scanning a source root against a ceiling reports the first
//! file using a feature that is too new.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compile::CompileError;
use crate::util::hash::list_files;
use crate::version::TargetVersion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageFeature {
  /// Substring whose presence marks use of the feature.
  pub token: String,
  /// First level supporting the feature.
  pub since: TargetVersion,
  /// Human-readable name, defaults to the token.
  #[serde(default)]
  pub name: Option<String>,
}

impl LanguageFeature {
  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or(self.token.trim())
  }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureGate {
  features: Vec<LanguageFeature>,
}

impl FeatureGate {
  pub fn new(features: Vec<LanguageFeature>) -> Self {
    Self { features }
  }

  pub fn is_empty(&self) -> bool {
    self.features.is_empty()
  }

  /// Fail if any file under `source` uses a feature above `ceiling`.
  ///
  /// Files are visited in sorted order and features in declaration order, so
  /// the reported violation is stable between runs.
  pub fn check(&self, source: &Path, ceiling: TargetVersion) -> Result<(), CompileError> {
    let too_new: Vec<&LanguageFeature> = self.features.iter().filter(|f| f.since > ceiling).collect();
    if too_new.is_empty() {
      return Ok(());
    }

    let files = list_files(source, &[])?;
    debug!(files = files.len(), gated = too_new.len(), ceiling = %ceiling, "scanning for gated features");

    for rel in files {
      let bytes = fs::read(source.join(&rel))?;
      let content = String::from_utf8_lossy(&bytes);
      if let Some(feature) = too_new.iter().find(|f| content.contains(f.token.as_str())) {
        return Err(CompileError::IncompatibleFeature {
          version: ceiling,
          feature: feature.display_name().to_string(),
          required: feature.since,
          path: rel,
        });
      }
    }

    Ok(())
  }
}
