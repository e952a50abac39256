//! Terminal output for mvb commands.
//!
//! Text output is a column of per-version status lines followed by
//! `label: value` fields. `--output json` replaces all of it with a single
//! serialized document on stdout.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use mvb_lib::compile::ArtifactSet;
use mvb_lib::version::TargetVersion;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub const ARROW: &str = "→";

/// Leading symbol of a status line. `Failed` and `Warn` go to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Done,
  Failed,
  Warn,
  Note,
}

impl Status {
  fn symbol(self) -> &'static str {
    match self {
      Status::Done => "✓",
      Status::Failed => "✗",
      Status::Warn => "⚠",
      Status::Note => "•",
    }
  }
}

pub fn print_status(status: Status, message: &str) {
  let symbol = status.symbol();
  match status {
    Status::Done => println!("{} {}", symbol.if_supports_color(Stream::Stdout, |s| s.green()), message),
    Status::Note => println!("{} {}", symbol.if_supports_color(Stream::Stdout, |s| s.blue()), message),
    Status::Failed => eprintln!(
      "{} {}",
      symbol.if_supports_color(Stream::Stderr, |s| s.red()),
      message.if_supports_color(Stream::Stderr, |s| s.red())
    ),
    Status::Warn => eprintln!(
      "{} {}",
      symbol.if_supports_color(Stream::Stderr, |s| s.yellow()),
      message.if_supports_color(Stream::Stderr, |s| s.yellow())
    ),
  }
}

/// `<ordinal>  <detail>`, with ordinals right-aligned so a column of
/// versions lines up.
pub fn version_line(version: TargetVersion, detail: &str) -> String {
  format!("{:>3}  {}", version, detail)
}

pub fn print_version(status: Status, version: TargetVersion, detail: &str) {
  print_status(status, &version_line(version, detail));
}

/// File count and abbreviated content hash of a compiled version.
pub fn artifact_detail(artifacts: &ArtifactSet) -> String {
  let hash = &artifacts.content_hash.0;
  format!("{} file(s)  {}", artifacts.files.len(), hash.get(..12).unwrap_or(hash))
}

pub fn print_field(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

pub fn format_bytes(bytes: u64) -> String {
  const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

  if bytes < 1024 {
    return format!("{} B", bytes);
  }
  let mut value = bytes as f64 / 1024.0;
  let mut unit = 0;
  while value >= 1024.0 && unit + 1 < UNITS.len() {
    value /= 1024.0;
    unit += 1;
  }
  format!("{:.1} {}", value, UNITS[unit])
}

/// Compile runs are reported to a tenth of a second; anything past a minute
/// drops the fraction.
pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  match duration.as_millis() {
    ms @ 0..1000 => format!("{}ms", ms),
    1000..60_000 => format!("{:.1}s", duration.as_secs_f64()),
    _ => format!("{}m {:02}s", secs / 60, secs % 60),
  }
}

/// Comma-separated list of anything displayable, e.g. target versions.
pub fn join<T: std::fmt::Display>(items: &[T]) -> String {
  items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}
