//! Plan command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn plan_default_topology() {
  let env = TestEnv::empty();

  env
    .cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("Deployment plan (3 stacks)"))
    .stdout(predicate::str::contains("1. repository"))
    .stdout(predicate::str::contains("3. cluster"));
}

#[test]
fn plan_with_dns_puts_dns_last() {
  let env = TestEnv::from_fixture("with_dns.toml");

  let output = env
    .cmd()
    .args(["--output", "json", "plan", "--config"])
    .arg(&env.config_path)
    .output()
    .unwrap();
  assert!(output.status.success());

  let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let order: Vec<&str> = plan["stacks"]
    .as_array()
    .unwrap()
    .iter()
    .map(|s| s["id"].as_str().unwrap())
    .collect();
  assert_eq!(order, ["repository", "network", "cluster", "dns"]);
  assert_eq!(plan["teardown"][0], "dns");
  assert_eq!(plan["stacks"][2]["depends_on"], serde_json::json!(["repository", "network"]));
}

#[test]
fn plan_does_not_write_state() {
  let env = TestEnv::empty();

  env.cmd().arg("plan").assert().success();

  assert!(!env.state_path().exists());
}

#[test]
fn plan_rejects_placeholder_zone() {
  let env = TestEnv::from_fixture("placeholder_zone.toml");

  env
    .cmd()
    .arg("plan")
    .arg("--config")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("dns.hosted_zone_id"));
}

#[test]
fn plan_malformed_config_fails() {
  let env = TestEnv::from_fixture("malformed.toml");

  env
    .cmd()
    .arg("plan")
    .arg("--config")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load config"));
}
