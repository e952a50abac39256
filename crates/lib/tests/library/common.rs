//! Shared helpers for library integration tests.

use std::path::{Path, PathBuf};

use mvb_lib::config::{BuildPlan, parse};
use tempfile::TempDir;

/// A project directory with a config, base sources and patches.
pub struct TestProject {
  pub temp: TempDir,
}

impl TestProject {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the project root.
  pub fn write(&self, rel: &str, content: &str) -> &Self {
    let path = self.root().join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    self
  }

  pub fn read(&self, rel: impl AsRef<Path>) -> String {
    std::fs::read_to_string(self.root().join(rel)).unwrap()
  }

  pub fn plan(&self, config: &str) -> BuildPlan {
    let file = parse(config, &self.config_path()).unwrap();
    BuildPlan::from_file(file, self.root()).unwrap()
  }

  pub fn config_path(&self) -> PathBuf {
    self.root().join("mvb.toml")
  }
}
