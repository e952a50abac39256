use predicates::prelude::*;

use super::common::TestEnv;

fn repo_url(env: &TestEnv) -> String {
  format!("file://{}/", env.root_path().join("repo").display())
}

#[test]
fn publish_without_url_only_builds() {
  let env = TestEnv::three_versions("final class Point8 {}", "");

  env
    .mvb_cmd()
    .arg("publish")
    .assert()
    .success()
    .stdout(predicate::str::contains("nothing uploaded"));

  assert!(env.build_path().join("artifacts/8").exists());
}

#[test]
fn release_publishes_to_releases() {
  let env = TestEnv::three_versions("final class Point8 {}", "");

  env
    .mvb_cmd()
    .arg("publish")
    .env("MVB_PUBLISH_URL", repo_url(&env))
    .assert()
    .success()
    .stdout(predicate::str::contains("Files uploaded: 9"))
    .stdout(predicate::str::contains("  8  3 file(s) uploaded"));

  let version_dir = env.root_path().join("repo/releases/org/example/lib/1.2.0/v8");
  assert_eq!(
    std::fs::read_to_string(version_dir.join("org/Util.java")).unwrap(),
    "final class Point8 {}"
  );
  assert!(!version_dir.join(".mvb-complete").exists());
  assert!(!env.root_path().join("repo/snapshots").exists());
}

#[test]
fn snapshot_publishes_to_snapshots() {
  let env = TestEnv::three_versions("final class Point8 {}", "");
  let config = std::fs::read_to_string(&env.config_path).unwrap();
  env.write_config(&config.replace("version = \"1.2.0\"", "version = \"1.2.0-SNAPSHOT\""));

  env
    .mvb_cmd()
    .arg("publish")
    .env("MVB_PUBLISH_URL", repo_url(&env))
    .assert()
    .success();

  assert!(
    env
      .root_path()
      .join("repo/snapshots/org/example/lib/1.2.0-SNAPSHOT/v17/org/Util.java")
      .exists()
  );
}

#[test]
fn failed_version_is_withheld_and_fails_the_command() {
  let env = TestEnv::three_versions("record Point8(int x) {}", "");

  env
    .mvb_cmd()
    .arg("publish")
    .env("MVB_PUBLISH_URL", repo_url(&env))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Withheld version(s) 8"));

  let releases = env.root_path().join("repo/releases/org/example/lib/1.2.0");
  assert!(releases.join("v17").exists());
  assert!(!releases.join("v8").exists());
}

#[test]
fn http_publish_without_credentials_fails_after_building() {
  let env = TestEnv::three_versions("final class Point8 {}", "");

  env
    .mvb_cmd()
    .arg("publish")
    .env("MVB_PUBLISH_URL", "http://127.0.0.1:9/")
    .assert()
    .failure()
    .stderr(predicate::str::contains("no credential for channel 'pub'"));

  assert!(env.build_path().join("artifacts/17/org/Util.java").exists());
}

#[test]
fn publish_json_has_build_and_publish() {
  let env = TestEnv::three_versions("final class Point8 {}", "");

  let output = env
    .mvb_cmd()
    .args(["--output", "json", "publish"])
    .env("MVB_PUBLISH_URL", repo_url(&env))
    .output()
    .unwrap();
  assert!(output.status.success());

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["publish"]["status"], "published");
  assert_eq!(value["publish"]["channel"]["kind"], "release");
  assert_eq!(value["build"]["targets"].as_array().unwrap().len(), 3);
}
