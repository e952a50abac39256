mod build;
mod clean;
mod info;
mod plan;
mod publish;

use std::future::Future;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use mvb_lib::compile::CommandCompiler;
use mvb_lib::config::{self, BuildPlan};
use mvb_lib::orchestrator::{Orchestrator, OrchestratorError};
use mvb_lib::publish::{EnvCredentials, SchemeRepository};

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use info::cmd_info;
pub use plan::cmd_plan;
pub use publish::cmd_publish;

type CliOrchestrator = Orchestrator<CommandCompiler, SchemeRepository, EnvCredentials>;

fn load_plan(config_path: &Path) -> Result<BuildPlan> {
  let plan = config::load(config_path).with_context(|| format!("Failed to load {}", config_path.display()))?;
  debug!(root = %plan.project_root.display(), build_dir = %plan.build_dir.display(), "loaded project");
  Ok(plan)
}

fn orchestrator(config_path: &Path) -> Result<CliOrchestrator> {
  let plan = load_plan(config_path)?;
  let compiler = plan.command_compiler();
  Ok(Orchestrator::new(
    plan,
    compiler,
    SchemeRepository::default(),
    EnvCredentials::default(),
  ))
}

/// Run `future` to completion, or drop it on Ctrl-C.
///
/// Dropping the future aborts every in-flight compile and kills its child
/// process.
fn run_interruptible<T>(future: impl Future<Output = Result<T, OrchestratorError>>) -> Result<T> {
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(async {
    tokio::select! {
      result = future => result.map_err(anyhow::Error::from),
      _ = tokio::signal::ctrl_c() => Err(anyhow!("Interrupted")),
    }
  })
}
