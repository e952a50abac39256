use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn build_compiles_every_version() {
  let env = TestEnv::three_versions("final class Point8 {}", "");

  env
    .mvb_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("Compiled: 3"))
    .stdout(predicate::str::contains("Failed: 0"));

  assert_eq!(env.read_file("build/mvb/artifacts/17/org/Util.java"), "record Point(int x) {}");
  assert_eq!(env.read_file("build/mvb/artifacts/11/org/Util.java"), "final class Point11 {}");
  assert_eq!(env.read_file("build/mvb/artifacts/8/org/Util.java"), "final class Point8 {}");
  assert_eq!(env.read_file("build/mvb/artifacts/8/org/Api.java"), "interface Api {}");
  assert_eq!(env.read_file("build/mvb/artifacts/8/LEVEL").trim(), "8");
  assert!(env.build_path().join("report.json").exists());
}

#[test]
fn build_leaves_sources_untouched() {
  let env = TestEnv::three_versions("final class Point8 {}", "");

  env.mvb_cmd().arg("build").assert().success();

  assert_eq!(env.read_file("src/org/Util.java"), "record Point(int x) {}");
  assert!(!env.temp.path().join("src/org/LEVEL").exists());
}

#[test]
fn failing_version_fails_the_build_but_keeps_the_others() {
  let env = TestEnv::three_versions("record Point8(int x) {}", "");

  env
    .mvb_cmd()
    .arg("build")
    .assert()
    .failure()
    .stdout(predicate::str::contains("Compiled: 2"))
    .stderr(predicate::str::contains("requires level 16"))
    .stderr(predicate::str::contains("Build failed for version(s) 8"));

  assert!(env.build_path().join("artifacts/17/org/Util.java").exists());
  assert!(env.build_path().join("artifacts/11/org/Util.java").exists());
}

#[test]
fn build_json_output_is_the_report() {
  let env = TestEnv::three_versions("final class Point8 {}", "");

  let output = env.mvb_cmd().args(["-o", "json", "build"]).output().unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let targets: Vec<u64> = report["targets"]
    .as_array()
    .unwrap()
    .iter()
    .map(|t| t["target"].as_u64().unwrap())
    .collect();
  assert_eq!(targets, vec![17, 11, 8]);
  assert_eq!(report["label"], "1.2.0");
}

#[test]
fn missing_patch_binding_fails_before_compiling() {
  let env = TestEnv::three_versions("final class Point8 {}", "");
  let config = std::fs::read_to_string(&env.config_path).unwrap();
  env.write_config(&config.replace("[[patch]]\nname = \"java8\"\ntarget = 8\n", ""));

  env
    .mvb_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("additional version 8 has no patch"));

  assert!(!env.build_path().join("artifacts").exists());
}

#[test]
fn missing_base_is_fatal() {
  let env = TestEnv::three_versions("final class Point8 {}", "");
  std::fs::remove_dir_all(env.temp.path().join("src")).unwrap();

  env
    .mvb_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("base source root does not exist"));
}

#[test]
fn build_dir_can_be_overridden_from_the_environment() {
  let env = TestEnv::three_versions("final class Point8 {}", "");

  env
    .mvb_cmd()
    .arg("build")
    .env("MVB_BUILD_DIR", "out")
    .assert()
    .success();

  assert!(env.temp.path().join("out/artifacts/8/org/Util.java").exists());
  assert!(!env.build_path().exists());
}

#[test]
fn plan_lists_variants_without_building() {
  let env = TestEnv::three_versions("final class Point8 {}", "");

  env
    .mvb_cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("patch java8"))
    .stdout(predicate::str::contains("variants/8"));

  assert!(!env.build_path().exists());
}
