use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use mvb_lib::publish::{ChannelResolution, ReleaseKind};
use mvb_lib::report::BuildReport;

use crate::cmd::load_plan;
use crate::output::{OutputFormat, join, print_field, print_json};

#[derive(Serialize)]
struct Info {
  tool_version: &'static str,
  artifact: String,
  label: String,
  release: ReleaseKind,
  versions: Vec<u32>,
  channel: ChannelResolution,
  last_build: Option<BuildReport>,
}

pub fn cmd_info(config: &Path, output: OutputFormat) -> Result<()> {
  let plan = load_plan(config)?;
  let last_build = BuildReport::load(&plan.report_path()).context("Failed to read build report")?;

  let info = Info {
    tool_version: env!("CARGO_PKG_VERSION"),
    artifact: format!("{}:{}", plan.coordinates.group, plan.coordinates.artifact_id()),
    label: plan.label.to_string(),
    release: plan.router().classify(&plan.label),
    versions: plan.versions.list().iter().map(|v| v.ordinal()).collect(),
    channel: plan.channel(),
    last_build,
  };

  if output.is_json() {
    return print_json(&info);
  }

  println!("mvb {}", info.tool_version);
  println!();
  print_field("Artifact", &info.artifact);
  print_field(
    "Version",
    &format!(
      "{} ({})",
      info.label,
      match info.release {
        ReleaseKind::Snapshot => "snapshot",
        ReleaseKind::Release => "release",
      }
    ),
  );
  print_field("Targets", &join(&info.versions));
  match &info.channel {
    ChannelResolution::Disabled => print_field("Publish", "disabled"),
    ChannelResolution::Publish(channel) => print_field("Publish", &channel.url),
  }
  match &info.last_build {
    Some(report) => print_field(
      "Last build",
      &format!("{} compiled, {} failed", report.compiled(), report.failed()),
    ),
    None => print_field("Last build", "none"),
  }

  Ok(())
}
