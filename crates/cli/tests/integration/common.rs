//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Copies each source file into `$MVB_OUT` and records the target level.
pub const COPY_COMPILER: &str =
  r#"cp -R "$MVB_SOURCE"/. "$MVB_OUT" && echo "$MVB_TARGET" > "$MVB_OUT/LEVEL""#;

/// Isolated test project.
///
/// Each test gets its own temporary directory holding the config, sources,
/// patches and build output.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  /// Create an empty project directory.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("mvb.toml");
    Self { temp, config_path }
  }

  /// A three-version project (17 default, 11 and 8 patched) compiled with
  /// [`COPY_COMPILER`]. `extra` is appended to the config.
  pub fn three_versions(java8_util: &str, extra: &str) -> Self {
    let env = Self::empty();
    env.write_file("src/org/Util.java", "record Point(int x) {}");
    env.write_file("src/org/Api.java", "interface Api {}");
    env.write_file("patches/java11/org/Util.java", "final class Point11 {}");
    env.write_file("patches/java8/org/Util.java", java8_util);
    env.write_config(&format!(
      r#"
[project]
name = "lib"
group = "org.example"
version = "1.2.0"

[versions]
default = 17
additional = [11, 8]

[[patch]]
name = "java11"
target = 11

[[patch]]
name = "java8"
target = 8

[compiler]
command = '{}'

[[compiler.feature]]
token = "record "
since = 16
{}"#,
      COPY_COMPILER, extra
    ));
    env
  }

  pub fn write_config(&self, content: &str) {
    std::fs::write(&self.config_path, content).unwrap();
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.temp.path().join(relative_path)).unwrap()
  }

  /// Project root, canonicalized so it can be compared with printed paths.
  pub fn root_path(&self) -> PathBuf {
    let p = self.temp.path().to_path_buf();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Build output directory (the default `build/mvb`).
  pub fn build_path(&self) -> PathBuf {
    self.temp.path().join("build/mvb")
  }

  /// Get a pre-configured Command for the mvb binary.
  ///
  /// Points `--config` at this project and clears every `MVB_*` variable that
  /// would otherwise leak in from the caller's environment.
  pub fn mvb_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("mvb");
    cmd.arg("--config").arg(&self.config_path);
    for var in [
      "MVB_PUBLISH_URL",
      "MVB_BUILD_DIR",
      "MVB_PUB_USERNAME",
      "MVB_PUB_PASSWORD",
      "RUST_LOG",
    ] {
      cmd.env_remove(var);
    }
    cmd
  }
}
