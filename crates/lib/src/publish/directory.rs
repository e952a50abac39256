//! Local directory repository for `file://` channel URLs.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::publish::{ArtifactRepository, Credential, PublishChannel, PublishError};

#[derive(Debug, Clone, Default)]
pub struct DirectoryRepository;

impl DirectoryRepository {
  /// Local directory a `file://` URL points at.
  pub fn root(url: &str) -> Result<PathBuf, PublishError> {
    url
      .strip_prefix("file://")
      .filter(|p| !p.is_empty())
      .map(PathBuf::from)
      .ok_or_else(|| PublishError::UnsupportedScheme(url.to_string()))
  }
}

impl ArtifactRepository for DirectoryRepository {
  fn requires_credential(&self, _channel: &PublishChannel) -> bool {
    false
  }

  async fn upload(
    &self,
    channel: &PublishChannel,
    _credential: Option<&Credential>,
    remote_path: &str,
    file: &Path,
  ) -> Result<(), PublishError> {
    let mut dest = Self::root(&channel.url)?;
    for segment in remote_path.split('/').filter(|s| !s.is_empty()) {
      if segment == "." || segment == ".." || segment.contains('\\') {
        return Err(PublishError::InvalidPath(remote_path.to_string()));
      }
      dest.push(segment);
    }

    if let Some(parent) = dest.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|source| PublishError::Io {
          path: parent.to_path_buf(),
          source,
        })?;
    }
    tokio::fs::copy(file, &dest).await.map_err(|source| PublishError::Io {
      path: dest.clone(),
      source,
    })?;

    debug!(dest = ?dest, "copied artifact");
    Ok(())
  }
}
