//! Publishing compiled artifacts.
//!
//! The project version label decides between the `snapshots` and `releases`
//! locations under a configured base URL. Resolution is pure and never cached;
//! credentials are only looked up once an upload is actually attempted, so a
//! project without credentials still builds.

mod credentials;
mod directory;
mod http;
mod types;

use tracing::{debug, info, warn};

use crate::compile::CompileReport;
use crate::consts::{DEFAULT_CHANNEL_NAME, DEFAULT_SNAPSHOT_MARKER, RELEASES_SEGMENT, SNAPSHOTS_SEGMENT};

pub use credentials::EnvCredentials;
pub use directory::DirectoryRepository;
pub use http::{HttpRepository, SchemeRepository};
pub use types::*;

/// Classifies version labels and resolves publish channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRouter {
  snapshot_marker: String,
  channel_name: String,
}

impl Default for PublishRouter {
  fn default() -> Self {
    Self::new(DEFAULT_SNAPSHOT_MARKER, DEFAULT_CHANNEL_NAME)
  }
}

impl PublishRouter {
  pub fn new(snapshot_marker: impl Into<String>, channel_name: impl Into<String>) -> Self {
    Self {
      snapshot_marker: snapshot_marker.into(),
      channel_name: channel_name.into(),
    }
  }

  pub fn channel_name(&self) -> &str {
    &self.channel_name
  }

  pub fn classify(&self, label: &BuildVersionLabel) -> ReleaseKind {
    if label.is_snapshot(&self.snapshot_marker) {
      ReleaseKind::Snapshot
    } else {
      ReleaseKind::Release
    }
  }

  /// Resolve the channel `label` publishes to.
  ///
  /// An absent or empty base URL disables publishing. The segment is appended
  /// to the base URL as is, so the base is expected to end with `/`.
  pub fn resolve(&self, label: &BuildVersionLabel, base_url: Option<&str>) -> ChannelResolution {
    let Some(base_url) = base_url.filter(|u| !u.is_empty()) else {
      return ChannelResolution::Disabled;
    };

    let kind = self.classify(label);
    let segment = match kind {
      ReleaseKind::Snapshot => SNAPSHOTS_SEGMENT,
      ReleaseKind::Release => RELEASES_SEGMENT,
    };

    ChannelResolution::Publish(PublishChannel {
      name: self.channel_name.clone(),
      url: format!("{}{}", base_url, segment),
      kind,
    })
  }
}

/// Upload every artifact of every successfully compiled version.
///
/// Versions that failed to compile are left out and listed as withheld. The
/// first failed upload ends the attempt; nothing is retried.
pub async fn publish_report<R, P>(
  repository: &R,
  credentials: &P,
  channel: PublishChannel,
  coordinates: &ProjectCoordinates,
  label: &BuildVersionLabel,
  report: &CompileReport,
) -> Result<PublishOutcome, PublishError>
where
  R: ArtifactRepository,
  P: CredentialProvider,
{
  let credential = if repository.requires_credential(&channel) {
    Some(credentials.lookup(&channel.name)?)
  } else {
    None
  };

  let withheld = report.failed_versions();
  if !withheld.is_empty() {
    warn!(versions = ?withheld, "not publishing versions that failed to compile");
  }

  info!(channel = %channel.name, url = %channel.url, label = %label, "publishing artifacts");

  let mut files = Vec::new();
  for (version, artifacts) in &report.artifacts {
    for rel in &artifacts.files {
      let remote_path = coordinates.remote_path(label, *version, rel);
      debug!(version = %version, remote = %remote_path, "uploading");
      repository
        .upload(&channel, credential.as_ref(), &remote_path, &artifacts.dir.join(rel))
        .await?;
      files.push(PublishedFile {
        version: *version,
        remote_path,
      });
    }
  }

  info!(files = files.len(), "publish complete");

  Ok(PublishOutcome::Published {
    channel,
    files,
    withheld,
  })
}
