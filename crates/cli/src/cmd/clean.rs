use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use mvb_lib::clean::clean;

use crate::cmd::load_plan;
use crate::output::{OutputFormat, Status, format_bytes, format_duration, print_field, print_json, print_status};

pub fn cmd_clean(config: &Path, dry_run: bool, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let plan = load_plan(config)?;

  let result = clean(&plan, dry_run).context("Clean failed")?;

  if output.is_json() {
    print_json(&result)?;
  } else {
    println!();
    if dry_run {
      print_status(Status::Note, "Dry run - no changes made");
    } else {
      print_status(Status::Done, "Clean complete!");
    }
    print_field("Variants removed", &result.stats.variants_deleted.to_string());
    print_field("Artifacts removed", &result.stats.artifacts_deleted.to_string());
    print_field("Space freed", &format_bytes(result.stats.bytes_freed));
    print_field("Duration", &format_duration(start.elapsed()));
  }

  Ok(())
}
