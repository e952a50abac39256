//! Project configuration.
//!
//! `mvb.toml` is parsed into a [`ConfigFile`], environment overrides are
//! applied, and the result is validated once into a [`BuildPlan`]. Every
//! inconsistency surfaces here as a [`ConfigError`], before any merge or
//! compile is scheduled.

mod types;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::compile::command::artifacts_dir;
use crate::compile::{CommandCompiler, FeatureGate, LanguageFeature};
use crate::consts::{
  BASE_ROOT_NAME, BUILD_DIR_ENV, DEFAULT_BUILD_DIR, DEFAULT_CHANNEL_NAME, DEFAULT_PARALLELISM, DEFAULT_PATCHES_DIR,
  DEFAULT_SNAPSHOT_MARKER, DEFAULT_SOURCE_DIR, PUBLISH_URL_ENV, REPORT_FILE_NAME,
};
use crate::overlay::{OverlayEngine, PatchBindings, PatchSet, SourceRoot};
use crate::publish::{BuildVersionLabel, ChannelResolution, ProjectCoordinates, PublishRouter};
use crate::version::VersionSet;

pub use types::*;

#[derive(Debug, Clone, Serialize)]
pub struct CompilerSettings {
  pub command: String,
  pub parallelism: usize,
  pub shell: Option<String>,
  pub features: Vec<LanguageFeature>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishSettings {
  /// Base URL; `None` disables publishing.
  pub url: Option<String>,
  pub channel: String,
  pub snapshot_marker: String,
}

/// A validated, immutable description of one build invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
  pub project_root: PathBuf,
  pub coordinates: ProjectCoordinates,
  pub label: BuildVersionLabel,
  pub versions: VersionSet,
  pub base: SourceRoot,
  pub patches: PatchBindings,
  pub build_dir: PathBuf,
  pub compiler: CompilerSettings,
  pub publish: PublishSettings,
}

impl BuildPlan {
  pub fn variants_dir(&self) -> PathBuf {
    self.build_dir.join("variants")
  }

  pub fn artifacts_dir(&self) -> PathBuf {
    artifacts_dir(&self.build_dir)
  }

  pub fn report_path(&self) -> PathBuf {
    self.build_dir.join(REPORT_FILE_NAME)
  }

  pub fn overlay_engine(&self) -> OverlayEngine {
    OverlayEngine::new(self.variants_dir())
  }

  pub fn router(&self) -> PublishRouter {
    PublishRouter::new(&self.publish.snapshot_marker, &self.publish.channel)
  }

  /// Resolve the publish channel for this plan's label.
  pub fn channel(&self) -> ChannelResolution {
    self.router().resolve(&self.label, self.publish.url.as_deref())
  }

  /// The shell-command compiler described by `[compiler]`.
  pub fn command_compiler(&self) -> CommandCompiler {
    CommandCompiler::new(&self.compiler.command, &self.project_root, self.artifacts_dir())
      .with_gate(FeatureGate::new(self.compiler.features.clone()))
      .with_shell(self.compiler.shell.clone())
  }
}

/// Load, override and validate the configuration at `path`.
///
/// Relative paths in the file are resolved against the file's directory.
pub fn load(path: &Path) -> Result<BuildPlan, ConfigError> {
  info!(path = ?path, "loading configuration");

  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  let mut file = parse(&content, path)?;
  apply_env_overrides(&mut file);

  let project_root = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
    _ => PathBuf::from("."),
  };

  BuildPlan::from_file(file, &project_root)
}

/// Parse configuration text; `path` is only used in errors.
pub fn parse(content: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
  toml::from_str(content).map_err(|source| ConfigError::Parse {
    path: path.to_path_buf(),
    source,
  })
}

/// Apply `MVB_PUBLISH_URL` and `MVB_BUILD_DIR`.
pub fn apply_env_overrides(file: &mut ConfigFile) {
  if let Ok(url) = std::env::var(PUBLISH_URL_ENV) {
    debug!(var = PUBLISH_URL_ENV, "overriding publish url");
    file.publish.url = Some(url);
  }
  if let Ok(dir) = std::env::var(BUILD_DIR_ENV) {
    debug!(var = BUILD_DIR_ENV, dir = %dir, "overriding build dir");
    file.build.dir = Some(PathBuf::from(dir));
  }
}

impl BuildPlan {
  pub fn from_file(file: ConfigFile, project_root: &Path) -> Result<Self, ConfigError> {
    let ConfigFile {
      project,
      versions,
      patches,
      compiler,
      publish,
      build,
    } = file;

    require_non_empty("project.name", &project.name)?;
    require_non_empty("project.group", &project.group)?;
    require_non_empty("project.version", &project.version)?;
    require_non_empty("compiler.command", &compiler.command)?;
    require_path_segment("project.name", &project.name)?;
    require_path_segment("project.version", &project.version)?;
    if let Some(root) = &project.root {
      require_path_segment("project.root", root)?;
    }
    if project.group.contains(['/', '\\']) {
      return Err(ConfigError::Invalid {
        field: "project.group",
        message: "must not contain path separators".to_string(),
      });
    }

    let mut version_set = VersionSet::new();
    version_set.declare_default(versions.default)?;
    version_set.declare_additional(&versions.additional)?;

    let source_dir = project.source.unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR));
    let base = SourceRoot::base(BASE_ROOT_NAME, project_root.join(source_dir), versions.default);

    let patch_sets = patches
      .into_iter()
      .map(|p| -> Result<PatchSet, ConfigError> {
        require_non_empty("patch.name", &p.name)?;
        let dir = p
          .dir
          .unwrap_or_else(|| Path::new(DEFAULT_PATCHES_DIR).join(&p.name));
        Ok(PatchSet {
          base: BASE_ROOT_NAME.to_string(),
          target: p.target,
          dir: project_root.join(dir),
          name: p.name,
        })
      })
      .collect::<Result<Vec<_>, _>>()?;
    let bindings = PatchBindings::bind(&version_set, patch_sets)?;

    let parallelism = compiler.parallelism.unwrap_or(DEFAULT_PARALLELISM);
    if parallelism == 0 {
      return Err(ConfigError::Invalid {
        field: "compiler.parallelism",
        message: "must be at least 1".to_string(),
      });
    }
    for feature in &compiler.features {
      require_non_empty("compiler.feature.token", &feature.token)?;
    }

    let channel = publish.channel.unwrap_or_else(|| DEFAULT_CHANNEL_NAME.to_string());
    require_non_empty("publish.channel", &channel)?;
    let snapshot_marker = publish
      .snapshot_marker
      .unwrap_or_else(|| DEFAULT_SNAPSHOT_MARKER.to_string());
    require_non_empty("publish.snapshot_marker", &snapshot_marker)?;

    let build_dir = project_root.join(build.dir.unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR)));
    check_build_dir(&build_dir, &base, &bindings)?;

    let plan = Self {
      project_root: project_root.to_path_buf(),
      coordinates: ProjectCoordinates {
        group: project.group,
        name: project.name,
        root: project.root,
      },
      label: BuildVersionLabel::new(project.version),
      versions: version_set,
      base,
      patches: bindings,
      build_dir,
      compiler: CompilerSettings {
        command: compiler.command,
        parallelism,
        shell: compiler.shell,
        features: compiler.features,
      },
      publish: PublishSettings {
        url: publish.url.filter(|u| !u.is_empty()),
        channel,
        snapshot_marker,
      },
    };

    debug!(
      versions = ?plan.versions.list(),
      patches = plan.patches.len(),
      build_dir = ?plan.build_dir,
      "configuration validated"
    );

    Ok(plan)
  }
}

/// Variants are written under the build directory, so it must not share a
/// subtree with the base or any patch directory.
fn check_build_dir(build_dir: &Path, base: &SourceRoot, patches: &PatchBindings) -> Result<(), ConfigError> {
  let abs = |p: &Path| std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf());
  let build_abs = abs(build_dir);

  let inputs = std::iter::once(("base source", &base.path)).chain(patches.iter().map(|(_, p)| ("patch", &p.dir)));
  for (kind, input) in inputs {
    let input_abs = abs(input);
    if build_abs.starts_with(&input_abs) || input_abs.starts_with(&build_abs) {
      return Err(ConfigError::Invalid {
        field: "build.dir",
        message: format!(
          "{} overlaps the {} directory {}",
          build_dir.display(),
          kind,
          input.display()
        ),
      });
    }
  }
  Ok(())
}

/// Values that become a single segment of a published path.
fn require_path_segment(field: &'static str, value: &str) -> Result<(), ConfigError> {
  if value == "." || value == ".." || value.contains(['/', '\\']) {
    return Err(ConfigError::Invalid {
      field,
      message: format!("{:?} is not usable as a path segment", value),
    });
  }
  Ok(())
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ConfigError> {
  if value.trim().is_empty() {
    return Err(ConfigError::Invalid {
      field,
      message: "must not be empty".to_string(),
    });
  }
  Ok(())
}
