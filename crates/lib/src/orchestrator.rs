//! Top-level build and publish operations.
//!
//! The [`Orchestrator`] owns a validated [`BuildPlan`] and the three external
//! collaborators it drives: the compiler, the artifact repository and the
//! credential provider. All three are passed in at construction.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::compile::{CompileDispatcher, CompileReport, Compiler};
use crate::config::{BuildPlan, ConfigError};
use crate::overlay::OverlayError;
use crate::publish::{
  ArtifactRepository, BuildVersionLabel, ChannelResolution, CredentialProvider, PublishError, PublishOutcome,
  ReleaseKind, publish_report,
};
use crate::report::{BuildReport, ReportError};
use crate::version::TargetVersion;

#[derive(Debug, Error)]
pub enum OrchestratorError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Overlay(#[from] OverlayError),

  #[error(transparent)]
  Publish(#[from] PublishError),

  #[error(transparent)]
  Report(#[from] ReportError),
}

/// What a build would do, without touching the filesystem.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
  pub label: BuildVersionLabel,
  pub release: ReleaseKind,
  pub channel: ChannelResolution,
  pub parallelism: usize,
  pub build_dir: PathBuf,
  pub targets: Vec<PlannedTarget>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedTarget {
  pub target: TargetVersion,
  pub default: bool,
  /// Directory the target compiles: the base, or the variant to be merged.
  pub source: PathBuf,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub patch: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub patch_dir: Option<PathBuf>,
  pub output: PathBuf,
}

pub struct Orchestrator<C, R, P> {
  plan: BuildPlan,
  compiler: Arc<C>,
  repository: R,
  credentials: P,
}

impl<C, R, P> Orchestrator<C, R, P>
where
  C: Compiler,
  R: ArtifactRepository,
  P: CredentialProvider,
{
  pub fn new(plan: BuildPlan, compiler: C, repository: R, credentials: P) -> Self {
    Self {
      plan,
      compiler: Arc::new(compiler),
      repository,
      credentials,
    }
  }

  pub fn build_plan(&self) -> &BuildPlan {
    &self.plan
  }

  /// Merge and compile every target version, then write the build report.
  ///
  /// A missing base source root is fatal before anything is scheduled. Per
  /// version failures are collected in the returned report.
  pub async fn build(&self) -> Result<CompileReport, OrchestratorError> {
    let plan = &self.plan;
    if !plan.base.path.is_dir() {
      return Err(OverlayError::MissingBase(plan.base.path.clone()).into());
    }

    let engine = plan.overlay_engine();
    engine.clear()?;

    info!(
      label = %plan.label,
      versions = ?plan.versions.list(),
      "starting build"
    );

    let report = CompileDispatcher::new(self.compiler.clone())
      .with_parallelism(plan.compiler.parallelism)
      .merge_and_compile_all(&plan.versions, &plan.base, &plan.patches, &engine)
      .await?;

    BuildReport::from_compile(&plan.label, &plan.versions, &report).save(&plan.report_path())?;

    info!(
      compiled = report.artifacts.len(),
      failed = report.failures.len(),
      "build finished"
    );

    Ok(report)
  }

  /// Publish the artifacts in `report` to the channel the label resolves to.
  pub async fn publish(&self, report: &CompileReport) -> Result<PublishOutcome, OrchestratorError> {
    let channel = match self.plan.channel() {
      ChannelResolution::Disabled => {
        info!("no publish url configured, skipping publish");
        return Ok(PublishOutcome::Skipped);
      }
      ChannelResolution::Publish(channel) => channel,
    };

    let outcome = publish_report(
      &self.repository,
      &self.credentials,
      channel,
      &self.plan.coordinates,
      &self.plan.label,
      report,
    )
    .await?;

    Ok(outcome)
  }

  /// Describe the build without running it.
  pub fn plan(&self) -> PlanSummary {
    let plan = &self.plan;
    let engine = plan.overlay_engine();

    let targets = plan
      .versions
      .list()
      .into_iter()
      .map(|target| {
        let patch = plan.patches.get(target);
        PlannedTarget {
          target,
          default: plan.versions.is_default(target),
          source: match patch {
            Some(_) => engine.variant_path(target),
            None => plan.base.path.clone(),
          },
          patch: patch.map(|p| p.name.clone()),
          patch_dir: patch.map(|p| p.dir.clone()),
          output: plan.artifacts_dir().join(target.to_string()),
        }
      })
      .collect();

    PlanSummary {
      label: plan.label.clone(),
      release: plan.router().classify(&plan.label),
      channel: plan.channel(),
      parallelism: plan.compiler.parallelism,
      build_dir: plan.build_dir.clone(),
      targets,
    }
  }
}
