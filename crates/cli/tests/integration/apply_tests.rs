//! Apply command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn apply_provisions_every_resource() {
  let env = TestEnv::from_fixture("with_dns.toml");

  env
    .cmd()
    .arg("apply")
    .arg("--config")
    .arg(&env.config_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Apply complete!"))
    .stdout(predicate::str::contains("Created: 14"));

  assert!(env.backend_document("network", "vpc").exists());
  assert!(env.backend_document("dns", "alias-record").exists());

  let state = env.read_state();
  assert_eq!(state["version"], 1);
  assert_eq!(state["stacks"]["cluster"]["resources"]["service"]["status"], "provisioned");
  assert!(state["stacks"]["dns"]["outputs"]["fqdn"].is_string());
  assert!(env.data_path().join("state.last.json").exists());
}

#[test]
fn second_apply_changes_nothing() {
  let env = TestEnv::empty();

  env.cmd().arg("apply").assert().success();

  env
    .cmd()
    .arg("apply")
    .assert()
    .success()
    .stdout(predicate::str::contains("no changes"))
    .stdout(predicate::str::contains("Unchanged: 13"));
}

#[test]
fn config_change_updates_only_affected_resources() {
  let env = TestEnv::empty();
  env.cmd().arg("apply").assert().success();

  // Same prefix, so only the service's desired count differs
  std::fs::write(&env.config_path, "[cluster]\ndesired_count = 3\n").unwrap();

  let output = env
    .cmd()
    .args(["--output", "json", "apply", "--config"])
    .arg(&env.config_path)
    .output()
    .unwrap();
  assert!(output.status.success());

  let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(result["status"], "success");
  assert_eq!(result["summary"]["updated"], 1);
  assert_eq!(result["summary"]["created"], 0);
  assert_eq!(result["summary"]["unchanged"], 12);
}

#[test]
fn apply_with_explicit_state_path() {
  let env = TestEnv::empty();
  let state = env.temp.path().join("custom").join("run.json");

  env
    .cmd()
    .arg("apply")
    .arg("--state")
    .arg(&state)
    .assert()
    .success();

  assert!(state.exists());
  assert!(env.temp.path().join("custom").join("run.last.json").exists());
  assert!(!env.state_path().exists());
}

#[test]
fn apply_placeholder_zone_fails_before_provisioning() {
  let env = TestEnv::from_fixture("placeholder_zone.toml");

  env
    .cmd()
    .arg("apply")
    .arg("--config")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("YOUR_HOSTED_ZONE_ID"));

  assert!(!env.state_path().exists());
  assert!(!env.data_path().join("backend").exists());
}

#[test]
fn apply_rejects_corrupt_state() {
  let env = TestEnv::empty();
  std::fs::write(env.state_path(), "{ not json").unwrap();

  env
    .cmd()
    .arg("apply")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to open run state"));
}

#[test]
fn invalid_timeout_is_rejected() {
  let env = TestEnv::empty();

  env
    .cmd()
    .args(["apply", "--timeout", "soon"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--timeout"));
}
