//! Implementation of the `mvb publish` command.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;

use mvb_lib::publish::{PublishOutcome, PublishedFile};
use mvb_lib::report::BuildReport;
use mvb_lib::version::TargetVersion;

use crate::cmd::build::{ensure_success, print_build_summary};
use crate::cmd::{orchestrator, run_interruptible};
use crate::output::{OutputFormat, Status, format_duration, join, print_field, print_json, print_status, print_version};

#[derive(Serialize)]
struct PublishOutput<'a> {
  build: &'a BuildReport,
  publish: &'a PublishOutcome,
}

/// Build every version, then upload what compiled.
///
/// Versions that failed to compile are withheld, and the command still exits
/// non-zero once the rest has been published.
pub fn cmd_publish(config: &Path, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let orch = orchestrator(config)?;
  let plan = orch.build_plan();

  let report = run_interruptible(orch.build()).context("Build failed")?;
  let outcome = run_interruptible(orch.publish(&report)).context("Publish failed")?;

  if output.is_json() {
    let build = BuildReport::from_compile(&plan.label, &plan.versions, &report);
    print_json(&PublishOutput {
      build: &build,
      publish: &outcome,
    })?;
  } else {
    print_build_summary(plan, &report);
    println!();
    match &outcome {
      PublishOutcome::Skipped => {
        print_status(Status::Note, "No publish url configured, nothing uploaded");
      }
      PublishOutcome::Published {
        channel,
        files,
        withheld,
      } => {
        print_status(Status::Done, &format!("Published {} to {}", plan.label, channel.url));
        for (version, count) in uploads_per_version(files) {
          print_version(Status::Done, version, &format!("{} file(s) uploaded", count));
        }
        print_field("Files uploaded", &files.len().to_string());
        if !withheld.is_empty() {
          print_status(Status::Warn, &format!("Withheld version(s) {}", join(withheld)));
        }
      }
    }
    print_field("Duration", &format_duration(start.elapsed()));
  }

  ensure_success(&report)
}

fn uploads_per_version(files: &[PublishedFile]) -> BTreeMap<TargetVersion, usize> {
  let mut counts = BTreeMap::new();
  for file in files {
    *counts.entry(file.version).or_insert(0) += 1;
  }
  counts
}
