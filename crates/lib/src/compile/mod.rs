//! Per-version compile dispatch.
//!
//! This module provides the entry points for compiling every target version.
//! It handles:
//! - Up-front validation that every additional version has its source variant
//! - Parallel execution of independent version pipelines
//! - Isolation of failures, so one bad version does not hide the others
//!
//! Dropping a dispatch future drops its `JoinSet`, which aborts every version
//! still in flight.

pub mod command;
pub mod feature;
mod types;

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::ConfigError;
use crate::consts::DEFAULT_PARALLELISM;
use crate::overlay::{OverlayEngine, PatchBindings, PatchSet, SourceRoot};
use crate::version::{TargetVersion, VersionSet};

pub use command::CommandCompiler;
pub use feature::{FeatureGate, LanguageFeature};
pub use types::*;

/// Where a version's sources come from.
enum JobSource {
  /// Already on disk.
  Ready(SourceRoot),
  /// Merged inside the version's own task, right before compiling.
  Merge {
    base: SourceRoot,
    patch: PatchSet,
    engine: OverlayEngine,
  },
}

struct CompileJob {
  version: TargetVersion,
  source: JobSource,
}

/// Fans compiles out across versions through an injected [`Compiler`].
pub struct CompileDispatcher<C> {
  compiler: Arc<C>,
  parallelism: usize,
}

impl<C: Compiler> CompileDispatcher<C> {
  pub fn new(compiler: Arc<C>) -> Self {
    Self {
      compiler,
      parallelism: DEFAULT_PARALLELISM,
    }
  }

  /// Limit the number of versions compiling at once (at least one).
  pub fn with_parallelism(mut self, parallelism: usize) -> Self {
    self.parallelism = parallelism.max(1);
    self
  }

  /// Compile every version against sources that already exist.
  ///
  /// The default version compiles `base`; each additional version compiles
  /// its entry in `overlays`. A missing or unexpected overlay is rejected
  /// before any compile is dispatched.
  pub async fn compile_all(
    &self,
    versions: &VersionSet,
    base: &SourceRoot,
    overlays: &BTreeMap<TargetVersion, SourceRoot>,
  ) -> Result<CompileReport, ConfigError> {
    let default = versions.default_version().ok_or(ConfigError::DefaultNotDeclared)?;
    check_coverage(versions, overlays.keys().copied())?;

    let mut jobs = vec![CompileJob {
      version: default,
      source: JobSource::Ready(base.clone()),
    }];
    for version in versions.additional() {
      if let Some(root) = overlays.get(version) {
        jobs.push(CompileJob {
          version: *version,
          source: JobSource::Ready(root.clone()),
        });
      }
    }

    Ok(self.run(jobs).await)
  }

  /// Merge and compile every version, one pipeline per version.
  ///
  /// Each additional version merges its patch and then compiles the result
  /// inside the same task, so a version never waits on another version's
  /// merge.
  pub async fn merge_and_compile_all(
    &self,
    versions: &VersionSet,
    base: &SourceRoot,
    patches: &PatchBindings,
    engine: &OverlayEngine,
  ) -> Result<CompileReport, ConfigError> {
    let default = versions.default_version().ok_or(ConfigError::DefaultNotDeclared)?;
    check_coverage(versions, patches.iter().map(|(v, _)| *v)).map_err(|e| match e {
      ConfigError::MissingOverlay(v) => ConfigError::MissingPatch(v),
      ConfigError::UnexpectedOverlay(v) => ConfigError::PatchForUndeclaredVersion {
        patch: patches.get(v).map(|p| p.name.clone()).unwrap_or_default(),
        version: v,
      },
      other => other,
    })?;

    let mut jobs = vec![CompileJob {
      version: default,
      source: JobSource::Ready(base.clone()),
    }];
    for version in versions.additional() {
      if let Some(patch) = patches.get(*version) {
        jobs.push(CompileJob {
          version: *version,
          source: JobSource::Merge {
            base: base.clone(),
            patch: patch.clone(),
            engine: engine.clone(),
          },
        });
      }
    }

    Ok(self.run(jobs).await)
  }

  async fn run(&self, jobs: Vec<CompileJob>) -> CompileReport {
    info!(versions = jobs.len(), parallelism = self.parallelism, "dispatching compiles");

    let expected: Vec<TargetVersion> = jobs.iter().map(|j| j.version).collect();
    let semaphore = Arc::new(Semaphore::new(self.parallelism));
    let mut join_set = JoinSet::new();

    for job in jobs {
      let compiler = self.compiler.clone();
      let semaphore = semaphore.clone();

      join_set.spawn(async move {
        let version = job.version;
        let result = match semaphore.acquire_owned().await {
          Ok(_permit) => run_job(compiler.as_ref(), job).await,
          Err(e) => Err(CompileError::TaskFailed(e.to_string())),
        };
        (version, result)
      });
    }

    let mut report = CompileReport::default();

    while let Some(joined) = join_set.join_next().await {
      match joined {
        Ok((version, Ok(artifacts))) => {
          info!(version = %version, "version compiled");
          report.artifacts.insert(version, artifacts);
        }
        Ok((version, Err(e))) => {
          error!(version = %version, error = %e, "version failed");
          report.failures.insert(version, e);
        }
        Err(e) => {
          error!(error = %e, "compile task panicked");
        }
      }
    }

    // A panicked task never reports its version; account for it here.
    for version in expected {
      if !report.artifacts.contains_key(&version) && !report.failures.contains_key(&version) {
        report
          .failures
          .insert(version, CompileError::TaskFailed("task panicked".to_string()));
      }
    }

    info!(
      compiled = report.artifacts.len(),
      failed = report.failures.len(),
      "compile dispatch complete"
    );

    report
  }
}

async fn run_job<C: Compiler>(compiler: &C, job: CompileJob) -> Result<ArtifactSet, CompileError> {
  let source = match job.source {
    JobSource::Ready(root) => root,
    JobSource::Merge { base, patch, engine } => {
      debug!(version = %job.version, patch = %patch.name, "merging before compile");
      tokio::task::spawn_blocking(move || engine.merge(&base, &patch))
        .await
        .map_err(|e| CompileError::TaskFailed(e.to_string()))??
    }
  };

  compiler.compile(&source, job.version).await
}

/// Every additional version must be provided, and nothing else.
fn check_coverage(versions: &VersionSet, provided: impl Iterator<Item = TargetVersion>) -> Result<(), ConfigError> {
  let provided: Vec<TargetVersion> = provided.collect();

  if let Some(&extra) = provided.iter().find(|v| !versions.is_additional(**v)) {
    return Err(ConfigError::UnexpectedOverlay(extra));
  }
  if let Some(&missing) = versions.additional().iter().find(|v| !provided.contains(v)) {
    return Err(ConfigError::MissingOverlay(missing));
  }
  Ok(())
}
