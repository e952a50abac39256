use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn clean_with_nothing_built_succeeds() {
  let env = TestEnv::three_versions("final class Point8 {}", "");

  env
    .mvb_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Clean complete"));
}

#[test]
fn clean_removes_build_outputs() {
  let env = TestEnv::three_versions("final class Point8 {}", "");
  env.mvb_cmd().arg("build").assert().success();

  env
    .mvb_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Variants removed: 2"))
    .stdout(predicate::str::contains("Artifacts removed: 3"));

  assert!(!env.build_path().join("variants/8").exists());
  assert!(!env.build_path().join("report.json").exists());
  assert!(env.temp.path().join("patches/java8/org/Util.java").exists());
}

#[test]
fn clean_dry_run_keeps_everything() {
  let env = TestEnv::three_versions("final class Point8 {}", "");
  env.mvb_cmd().arg("build").assert().success();

  env
    .mvb_cmd()
    .args(["clean", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"));

  assert!(env.build_path().join("variants/8").exists());
}

#[test]
fn clean_json_output_is_valid() {
  let env = TestEnv::three_versions("final class Point8 {}", "");

  env
    .mvb_cmd()
    .args(["-o", "json", "clean"])
    .assert()
    .success()
    .stdout(predicate::str::contains("variants_deleted"))
    .stdout(predicate::str::contains("deleted_paths"));
}

#[test]
fn info_reports_last_build() {
  let env = TestEnv::three_versions("record Point8(int x) {}", "");
  env.mvb_cmd().arg("build").assert().failure();

  env
    .mvb_cmd()
    .arg("info")
    .assert()
    .success()
    .stdout(predicate::str::contains("2 compiled, 1 failed"));
}
