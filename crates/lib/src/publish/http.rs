//! HTTP artifact repository.
//!
//! Uploads are a single `PUT` per file with basic authentication, the way a
//! Maven-style repository accepts deployments.

use std::path::Path;

use tracing::debug;

use crate::publish::{ArtifactRepository, Credential, DirectoryRepository, PublishChannel, PublishError};

#[derive(Debug, Clone, Default)]
pub struct HttpRepository {
  client: reqwest::Client,
}

impl HttpRepository {
  pub fn new(client: reqwest::Client) -> Self {
    Self { client }
  }
}

impl ArtifactRepository for HttpRepository {
  async fn upload(
    &self,
    channel: &PublishChannel,
    credential: Option<&Credential>,
    remote_path: &str,
    file: &Path,
  ) -> Result<(), PublishError> {
    let url = join_url(&channel.url, remote_path);

    let body = tokio::fs::read(file).await.map_err(|source| PublishError::Io {
      path: file.to_path_buf(),
      source,
    })?;
    let size = body.len();

    let mut request = self.client.put(&url).body(body);
    if let Some(credential) = credential {
      request = request.basic_auth(&credential.username, Some(&credential.password));
    }

    let response = request.send().await.map_err(|e| PublishError::Upload {
      url: url.clone(),
      message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
      return Err(PublishError::Rejected {
        url,
        status: status.as_u16(),
      });
    }

    debug!(url = %url, size, "uploaded");
    Ok(())
  }
}

/// Routes each upload by the channel URL's scheme: `file://` to a local
/// directory, `http://` and `https://` to an HTTP repository.
#[derive(Debug, Clone, Default)]
pub struct SchemeRepository {
  http: HttpRepository,
  directory: DirectoryRepository,
}

enum Scheme {
  File,
  Http,
}

fn scheme(url: &str) -> Option<Scheme> {
  if url.starts_with("file://") {
    Some(Scheme::File)
  } else if url.starts_with("http://") || url.starts_with("https://") {
    Some(Scheme::Http)
  } else {
    None
  }
}

impl ArtifactRepository for SchemeRepository {
  fn requires_credential(&self, channel: &PublishChannel) -> bool {
    !matches!(scheme(&channel.url), Some(Scheme::File))
  }

  async fn upload(
    &self,
    channel: &PublishChannel,
    credential: Option<&Credential>,
    remote_path: &str,
    file: &Path,
  ) -> Result<(), PublishError> {
    match scheme(&channel.url) {
      Some(Scheme::File) => self.directory.upload(channel, credential, remote_path, file).await,
      Some(Scheme::Http) => self.http.upload(channel, credential, remote_path, file).await,
      None => Err(PublishError::UnsupportedScheme(channel.url.clone())),
    }
  }
}

pub(crate) fn join_url(base: &str, remote_path: &str) -> String {
  format!("{}/{}", base.trim_end_matches('/'), remote_path.trim_start_matches('/'))
}
