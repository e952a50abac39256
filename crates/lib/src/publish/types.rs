//! Types for routing and uploading build artifacts.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::TargetVersion;

/// Snapshot (pre-release, mutable) or release (immutable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseKind {
  Snapshot,
  Release,
}

/// The project's externally visible version string, e.g. `2.0.1-SNAPSHOT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildVersionLabel(pub String);

impl BuildVersionLabel {
  pub fn new(label: impl Into<String>) -> Self {
    Self(label.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_snapshot(&self, marker: &str) -> bool {
    self.0.ends_with(marker)
  }
}

impl fmt::Display for BuildVersionLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A resolved remote destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishChannel {
  /// Name used to look up the channel's credential.
  pub name: String,
  pub url: String,
  pub kind: ReleaseKind,
}

/// Result of resolving where a label publishes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChannelResolution {
  /// No base URL configured; publishing is a no-op.
  Disabled,
  Publish(PublishChannel),
}

/// Group and name of the published artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCoordinates {
  pub group: String,
  pub name: String,
  /// Name of the enclosing root project when this is a subproject.
  pub root: Option<String>,
}

impl ProjectCoordinates {
  /// `name` for a root project, `<root>-<name>` for a subproject.
  pub fn artifact_id(&self) -> String {
    match &self.root {
      Some(root) if root != &self.name => format!("{}-{}", root, self.name),
      _ => self.name.clone(),
    }
  }

  /// Remote location of `file` (relative to an artifact set) for one version.
  pub fn remote_path(&self, label: &BuildVersionLabel, version: TargetVersion, file: &Path) -> String {
    let mut segments: Vec<String> = self
      .group
      .split('.')
      .filter(|s| !s.is_empty())
      .map(str::to_string)
      .collect();
    segments.push(self.artifact_id());
    segments.push(label.to_string());
    segments.push(format!("v{}", version));
    segments.extend(file.components().map(|c| c.as_os_str().to_string_lossy().into_owned()));
    segments.join("/")
  }
}

/// Username and password for one channel.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
  pub username: String,
  pub password: String,
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credential")
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}

/// Supplies credentials by channel name.
pub trait CredentialProvider: Send + Sync + 'static {
  fn lookup(&self, channel: &str) -> Result<Credential, PublishError>;
}

/// The external artifact repository.
pub trait ArtifactRepository: Send + Sync + 'static {
  /// Whether uploads to `channel` need a credential.
  fn requires_credential(&self, _channel: &PublishChannel) -> bool {
    true
  }

  /// Upload one local `file` to `remote_path` under the channel URL.
  fn upload(
    &self,
    channel: &PublishChannel,
    credential: Option<&Credential>,
    remote_path: &str,
    file: &Path,
  ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

#[derive(Debug, Error)]
pub enum PublishError {
  #[error("no credential for channel '{channel}'")]
  MissingCredential { channel: String },

  #[error("upload to {url} failed: {message}")]
  Upload { url: String, message: String },

  #[error("upload to {url} rejected with HTTP {status}")]
  Rejected { url: String, status: u16 },

  #[error("unsupported repository url: {0}")]
  UnsupportedScheme(String),

  #[error("remote path {0} leaves the repository")]
  InvalidPath(String),

  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedFile {
  pub version: TargetVersion,
  pub remote_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PublishOutcome {
  /// Publishing is not configured.
  Skipped,
  Published {
    channel: PublishChannel,
    files: Vec<PublishedFile>,
    /// Versions that failed to compile and were left out.
    withheld: Vec<TargetVersion>,
  },
}
