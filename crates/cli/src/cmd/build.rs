//! Implementation of the `mvb build` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use mvb_lib::compile::CompileReport;
use mvb_lib::config::BuildPlan;
use mvb_lib::report::BuildReport;

use crate::cmd::{orchestrator, run_interruptible};
use crate::output::{
  OutputFormat, Status, artifact_detail, format_duration, join, print_field, print_json, print_status, print_version,
};

/// Merge every patch and compile every target version.
///
/// Fails with a non-zero exit if any version failed to compile; the other
/// versions' artifacts are still written.
pub fn cmd_build(config: &Path, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let orch = orchestrator(config)?;
  let plan = orch.build_plan();

  if !output.is_json() {
    print_status(
      Status::Note,
      &format!(
        "Building {} {} for {}",
        plan.coordinates.artifact_id(),
        plan.label,
        join(&plan.versions.list())
      ),
    );
  }

  let report = run_interruptible(orch.build()).context("Build failed")?;

  if output.is_json() {
    print_json(&BuildReport::from_compile(&plan.label, &plan.versions, &report))?;
  } else {
    print_build_summary(plan, &report);
    print_field("Duration", &format_duration(start.elapsed()));
  }

  ensure_success(&report)
}

pub(crate) fn print_build_summary(plan: &BuildPlan, report: &CompileReport) {
  println!();
  for version in plan.versions.list() {
    if let Some(artifacts) = report.artifacts.get(&version) {
      print_version(Status::Done, version, &artifact_detail(artifacts));
    } else if let Some(err) = report.failures.get(&version) {
      print_version(Status::Failed, version, &err.to_string());
    }
  }
  println!();
  print_field("Compiled", &report.artifacts.len().to_string());
  print_field("Failed", &report.failures.len().to_string());
  print_field("Artifacts", &plan.artifacts_dir().display().to_string());
}

pub(crate) fn ensure_success(report: &CompileReport) -> Result<()> {
  if !report.is_success() {
    bail!("Build failed for version(s) {}", join(&report.failed_versions()));
  }
  Ok(())
}
