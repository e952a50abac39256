//! Credentials from the environment.
//!
//! A channel named `pub` reads `MVB_PUB_USERNAME` and `MVB_PUB_PASSWORD`.
//! The channel name is upper-cased and every non-alphanumeric character
//! becomes `_`.

use tracing::debug;

use crate::consts::APP_NAME;
use crate::publish::{Credential, CredentialProvider, PublishError};

#[derive(Debug, Clone)]
pub struct EnvCredentials {
  prefix: String,
}

impl Default for EnvCredentials {
  fn default() -> Self {
    Self::new(APP_NAME.to_uppercase())
  }
}

impl EnvCredentials {
  pub fn new(prefix: impl Into<String>) -> Self {
    Self { prefix: prefix.into() }
  }

  /// Names of the username and password variables for `channel`.
  pub fn var_names(&self, channel: &str) -> (String, String) {
    let key: String = channel
      .chars()
      .map(|c| {
        if c.is_ascii_alphanumeric() {
          c.to_ascii_uppercase()
        } else {
          '_'
        }
      })
      .collect();
    (
      format!("{}_{}_USERNAME", self.prefix, key),
      format!("{}_{}_PASSWORD", self.prefix, key),
    )
  }
}

impl CredentialProvider for EnvCredentials {
  fn lookup(&self, channel: &str) -> Result<Credential, PublishError> {
    let (user_var, pass_var) = self.var_names(channel);
    let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

    match (read(&user_var), read(&pass_var)) {
      (Some(username), Some(password)) => {
        debug!(channel, var = %user_var, "found credential");
        Ok(Credential { username, password })
      }
      _ => Err(PublishError::MissingCredential {
        channel: channel.to_string(),
      }),
    }
  }
}
