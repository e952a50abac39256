//! Shell-command compiler.
//!
//! Runs a user-supplied command once per target version. The command sees
//! three environment variables:
//!
//! - `MVB_SOURCE`: the source root to compile (base or variant)
//! - `MVB_TARGET`: the target ordinal, to be used as the language ceiling
//! - `MVB_OUT`: an empty directory the command must write its output into
//!
//! Unlike an isolated build, the inherited environment is kept so toolchains
//! on `PATH` remain reachable.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use crate::compile::{ArtifactSet, CompileError, Compiler, FeatureGate};
use crate::overlay::SourceRoot;
use crate::version::TargetVersion;

#[derive(Debug, Clone)]
pub struct CommandCompiler {
  command: String,
  workdir: PathBuf,
  artifacts_dir: PathBuf,
  gate: FeatureGate,
  shell: Option<String>,
}

impl CommandCompiler {
  pub fn new(command: impl Into<String>, workdir: impl Into<PathBuf>, artifacts_dir: impl Into<PathBuf>) -> Self {
    Self {
      command: command.into(),
      workdir: workdir.into(),
      artifacts_dir: artifacts_dir.into(),
      gate: FeatureGate::default(),
      shell: None,
    }
  }

  pub fn with_gate(mut self, gate: FeatureGate) -> Self {
    self.gate = gate;
    self
  }

  pub fn with_shell(mut self, shell: Option<String>) -> Self {
    self.shell = shell;
    self
  }

  /// Output directory for `version`.
  pub fn output_dir(&self, version: TargetVersion) -> PathBuf {
    self.artifacts_dir.join(version.to_string())
  }
}

impl Compiler for CommandCompiler {
  async fn compile(&self, source: &SourceRoot, target: TargetVersion) -> Result<ArtifactSet, CompileError> {
    info!(version = %target, source = ?source.path, "compiling");

    let gate = self.gate.clone();
    let source_path = source.path.clone();
    tokio::task::spawn_blocking(move || gate.check(&source_path, target))
      .await
      .map_err(|e| CompileError::TaskFailed(e.to_string()))??;

    let out_dir = self.output_dir(target);
    if out_dir.exists() {
      tokio::fs::remove_dir_all(&out_dir).await?;
    }
    tokio::fs::create_dir_all(&out_dir).await?;

    let (shell_cmd, shell_args) = get_shell(self.shell.as_deref());

    let mut command = Command::new(&shell_cmd);
    command
      .args(&shell_args)
      .arg(&self.command)
      .current_dir(&self.workdir)
      .env("MVB_SOURCE", &source.path)
      .env("MVB_TARGET", target.to_string())
      .env("MVB_OUT", &out_dir)
      .kill_on_drop(true);

    debug!(shell = %shell_cmd, workdir = ?self.workdir, "spawning compiler");

    let output = command.output().await?;

    if !output.status.success() {
      log_output(&output.stdout, &output.stderr);
      return Err(CompileError::CommandFailed {
        version: target,
        code: output.status.code(),
      });
    }

    let artifacts = tokio::task::spawn_blocking(move || ArtifactSet::from_dir(target, &out_dir))
      .await
      .map_err(|e| CompileError::TaskFailed(e.to_string()))??;

    info!(version = %target, files = artifacts.files.len(), "compile complete");
    Ok(artifacts)
  }
}

fn log_output(stdout: &[u8], stderr: &[u8]) {
  let stderr = String::from_utf8_lossy(stderr);
  let stdout = String::from_utf8_lossy(stdout);
  if !stderr.is_empty() {
    debug!(stderr = %stderr, "compiler stderr");
  }
  if !stdout.is_empty() {
    debug!(stdout = %stdout, "compiler stdout");
  }
}

/// Shell and leading arguments used to run the command string.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}

/// Artifact directory layout used by [`CommandCompiler`] under `build_dir`.
pub fn artifacts_dir(build_dir: &Path) -> PathBuf {
  build_dir.join("artifacts")
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;
  use crate::compile::LanguageFeature;
  use std::fs;
  use std::time::Duration;
  use tempfile::TempDir;

  fn base(temp: &TempDir) -> SourceRoot {
    let dir = temp.path().join("src");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("Main.java"), "class Main { var x = 1; }").unwrap();
    SourceRoot::base("main", dir, TargetVersion(17))
  }

  #[tokio::test]
  async fn command_sees_source_target_and_out() {
    let temp = TempDir::new().unwrap();
    let source = base(&temp);
    let compiler = CommandCompiler::new(
      r#"cp "$MVB_SOURCE/Main.java" "$MVB_OUT/Main.class" && echo "$MVB_TARGET" > "$MVB_OUT/level""#,
      temp.path(),
      temp.path().join("build/artifacts"),
    );

    let artifacts = compiler.compile(&source, TargetVersion(17)).await.unwrap();

    assert_eq!(artifacts.version, TargetVersion(17));
    assert_eq!(artifacts.dir, temp.path().join("build/artifacts/17"));
    assert_eq!(artifacts.files, vec![PathBuf::from("Main.class"), PathBuf::from("level")]);
    assert_eq!(fs::read_to_string(artifacts.dir.join("level")).unwrap().trim(), "17");
  }

  #[tokio::test]
  async fn nonzero_exit_is_command_failed() {
    let temp = TempDir::new().unwrap();
    let source = base(&temp);
    let compiler = CommandCompiler::new("exit 3", temp.path(), temp.path().join("out"));

    let err = compiler.compile(&source, TargetVersion(17)).await.unwrap_err();
    assert!(matches!(err, CompileError::CommandFailed { code: Some(3), .. }));
  }

  #[tokio::test]
  async fn gated_feature_fails_before_running_command() {
    let temp = TempDir::new().unwrap();
    let source = base(&temp);
    let marker = temp.path().join("ran");
    let compiler = CommandCompiler::new(format!("touch {}", marker.display()), temp.path(), temp.path().join("out"))
      .with_gate(FeatureGate::new(vec![LanguageFeature {
        token: "var ".to_string(),
        since: TargetVersion(10),
        name: None,
      }]));

    let err = compiler.compile(&source, TargetVersion(8)).await.unwrap_err();

    assert!(matches!(err, CompileError::IncompatibleFeature { required, .. } if required == TargetVersion(10)));
    assert!(!marker.exists());
  }

  #[tokio::test]
  async fn previous_output_is_cleared() {
    let temp = TempDir::new().unwrap();
    let source = base(&temp);
    let out = temp.path().join("out");
    fs::create_dir_all(out.join("17")).unwrap();
    fs::write(out.join("17/Stale.class"), "old").unwrap();

    let compiler = CommandCompiler::new(r#"touch "$MVB_OUT/Fresh.class""#, temp.path(), &out);
    let artifacts = compiler.compile(&source, TargetVersion(17)).await.unwrap();

    assert_eq!(artifacts.files, vec![PathBuf::from("Fresh.class")]);
  }

  #[tokio::test]
  async fn dropped_compile_kills_the_command() {
    let temp = TempDir::new().unwrap();
    let source = base(&temp);
    let finished = temp.path().join("finished");
    let compiler = CommandCompiler::new(
      format!("sleep 0.5 && touch {}", finished.display()),
      temp.path(),
      temp.path().join("out"),
    );

    let result = tokio::time::timeout(Duration::from_millis(150), compiler.compile(&source, TargetVersion(17))).await;
    assert!(result.is_err());

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert!(!finished.exists());
  }
}
