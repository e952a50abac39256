//! Build and publish through the shell-command compiler.

#![cfg(unix)]

use mvb_lib::compile::CompileError;
use mvb_lib::orchestrator::Orchestrator;
use mvb_lib::publish::{DirectoryRepository, EnvCredentials, PublishOutcome};
use mvb_lib::report::{BuildReport, TargetStatus};
use mvb_lib::version::TargetVersion;

use super::common::TestProject;

/// "Compiles" by copying every source file into the output directory and
/// recording the level it was built for.
const CONFIG: &str = r#"
[project]
name = "midnightlib"
group = "org.wallentines"
version = "2.0.1"
root = "midnight"
source = "src/main/java"

[versions]
default = 17
additional = [11, 8]

[[patch]]
name = "java11"
target = 11

[[patch]]
name = "java8"
target = 8

[compiler]
command = 'cp -R "$MVB_SOURCE"/. "$MVB_OUT" && echo "$MVB_TARGET" > "$MVB_OUT/LEVEL"'

[[compiler.feature]]
token = "record "
since = 16
name = "records"
"#;

fn project(java8_util: &str) -> TestProject {
  let project = TestProject::new();
  project
    .write("src/main/java/org/Util.java", "record Point(int x, int y) {}")
    .write("src/main/java/org/Api.java", "interface Api {}")
    .write("patches/java11/org/Util.java", "final class Point { int x; int y; }")
    .write("patches/java8/org/Util.java", java8_util);
  project
}

#[tokio::test]
async fn every_version_compiles_its_own_variant() {
  let project = project("final class Point { int x; }");
  let plan = project.plan(CONFIG);
  let compiler = plan.command_compiler();
  let orch = Orchestrator::new(plan, compiler, DirectoryRepository, EnvCredentials::default());

  let report = orch.build().await.unwrap();

  assert!(report.is_success());
  let out = orch.build_plan().artifacts_dir();
  assert_eq!(project.read(out.join("17/org/Util.java")), "record Point(int x, int y) {}");
  assert_eq!(project.read(out.join("8/org/Util.java")), "final class Point { int x; }");
  assert_eq!(project.read(out.join("8/org/Api.java")), "interface Api {}");
  assert_eq!(project.read(out.join("11/LEVEL")).trim(), "11");

  // Patched variants carry no files beyond the base and the patch.
  for version in [17, 11, 8] {
    let files: Vec<String> = report.artifacts[&TargetVersion(version)]
      .files
      .iter()
      .map(|f| f.display().to_string())
      .collect();
    assert_eq!(files, vec!["LEVEL", "org/Api.java", "org/Util.java"]);
  }
}

#[tokio::test]
async fn gated_feature_fails_only_that_version() {
  let project = project("record Point(int x) {}");
  let plan = project.plan(CONFIG);
  let compiler = plan.command_compiler();
  let orch = Orchestrator::new(plan, compiler, DirectoryRepository, EnvCredentials::default());

  let report = orch.build().await.unwrap();

  assert_eq!(report.failed_versions(), vec![TargetVersion(8)]);
  match report.failures.get(&TargetVersion(8)) {
    Some(CompileError::IncompatibleFeature { feature, required, .. }) => {
      assert_eq!(feature, "records");
      assert_eq!(*required, TargetVersion(16));
    }
    other => panic!("unexpected failure: {:?}", other),
  }

  let saved = BuildReport::load(&orch.build_plan().report_path()).unwrap().unwrap();
  let statuses: Vec<TargetStatus> = saved.targets.iter().map(|t| t.status).collect();
  assert_eq!(
    statuses,
    vec![TargetStatus::Compiled, TargetStatus::Compiled, TargetStatus::Failed]
  );
}

#[tokio::test]
async fn release_publishes_to_local_repository() {
  let project = project("final class Point { int x; }");
  let repo = project.root().join("repo");
  let config = format!("{}\n[publish]\nurl = \"file://{}/\"\n", CONFIG, repo.display());
  let plan = project.plan(&config);
  let compiler = plan.command_compiler();
  let orch = Orchestrator::new(plan, compiler, DirectoryRepository, EnvCredentials::default());

  let report = orch.build().await.unwrap();
  let outcome = orch.publish(&report).await.unwrap();

  assert!(matches!(outcome, PublishOutcome::Published { .. }));
  let published = repo.join("releases/org/wallentines/midnight-midnightlib/2.0.1/v8/org/Util.java");
  assert_eq!(std::fs::read_to_string(published).unwrap(), "final class Point { int x; }");
}
