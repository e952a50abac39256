//! Target versions and the ordered set of versions a project is built for.
//!
//! A [`VersionSet`] holds one default version and any number of additional
//! versions. Additional versions exist so that patches can *downgrade* source
//! usage, so each one must be strictly lower than the default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// An ordinal language level that compiled output must not exceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetVersion(pub u32);

impl TargetVersion {
  pub fn ordinal(self) -> u32 {
    self.0
  }
}

impl fmt::Display for TargetVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

impl From<u32> for TargetVersion {
  fn from(value: u32) -> Self {
    TargetVersion(value)
  }
}

/// Default version plus additional versions, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionSet {
  default: Option<TargetVersion>,
  additional: Vec<TargetVersion>,
}

impl VersionSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Convenience constructor running both declarations.
  pub fn with_versions(default: TargetVersion, additional: &[TargetVersion]) -> Result<Self, ConfigError> {
    let mut set = Self::new();
    set.declare_default(default)?;
    set.declare_additional(additional)?;
    Ok(set)
  }

  /// Declare the default version.
  ///
  /// Fails if a default was already declared, or if an additional version
  /// declared earlier would not be strictly below it.
  pub fn declare_default(&mut self, version: TargetVersion) -> Result<(), ConfigError> {
    if let Some(existing) = self.default {
      return Err(ConfigError::DefaultRedeclared { existing, version });
    }
    if let Some(&offending) = self.additional.iter().find(|v| **v >= version) {
      return Err(ConfigError::NotBelowDefault {
        version: offending,
        default: version,
      });
    }
    self.default = Some(version);
    Ok(())
  }

  /// Append additional versions.
  ///
  /// The whole call is validated before anything is recorded, so a failure
  /// leaves the set untouched.
  pub fn declare_additional(&mut self, versions: &[TargetVersion]) -> Result<(), ConfigError> {
    let default = self.default.ok_or(ConfigError::DefaultNotDeclared)?;

    let mut seen = self.additional.clone();
    for &version in versions {
      if version >= default {
        return Err(ConfigError::NotBelowDefault { version, default });
      }
      if seen.contains(&version) {
        return Err(ConfigError::DuplicateVersion(version));
      }
      seen.push(version);
    }

    self.additional = seen;
    Ok(())
  }

  /// All versions: default first, then additional in declaration order.
  pub fn list(&self) -> Vec<TargetVersion> {
    self.default.iter().copied().chain(self.additional.iter().copied()).collect()
  }

  pub fn default_version(&self) -> Option<TargetVersion> {
    self.default
  }

  pub fn additional(&self) -> &[TargetVersion] {
    &self.additional
  }

  pub fn contains(&self, version: TargetVersion) -> bool {
    self.default == Some(version) || self.additional.contains(&version)
  }

  pub fn is_default(&self, version: TargetVersion) -> bool {
    self.default == Some(version)
  }

  pub fn is_additional(&self, version: TargetVersion) -> bool {
    self.additional.contains(&version)
  }

  pub fn len(&self) -> usize {
    self.additional.len() + usize::from(self.default.is_some())
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
