use std::path::Path;

use anyhow::Result;

use mvb_lib::publish::ChannelResolution;

use crate::cmd::orchestrator;
use crate::output::{ARROW, OutputFormat, Status, print_field, print_json, print_status};

pub fn cmd_plan(config: &Path, output: OutputFormat) -> Result<()> {
  let summary = orchestrator(config)?.plan();

  if output.is_json() {
    return print_json(&summary);
  }

  print_status(Status::Note, &format!("Plan for {}", summary.label));
  for target in &summary.targets {
    let kind = if target.default { "default" } else { "additional" };
    println!("  {:>3} ({})", target.target, kind);
    if let (Some(patch), Some(dir)) = (&target.patch, &target.patch_dir) {
      println!("      patch {} from {}", patch, dir.display());
    }
    println!("      {} {}", ARROW, target.source.display());
    println!("      {} {}", ARROW, target.output.display());
  }

  println!();
  print_field("Parallelism", &summary.parallelism.to_string());
  print_field("Build dir", &summary.build_dir.display().to_string());
  match &summary.channel {
    ChannelResolution::Disabled => print_field("Publish", "disabled"),
    ChannelResolution::Publish(channel) => {
      print_field("Publish", &format!("{} ({})", channel.url, channel.name));
    }
  }

  Ok(())
}
