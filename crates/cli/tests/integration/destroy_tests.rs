//! Destroy command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn destroy_removes_backend_documents() {
  let env = TestEnv::from_fixture("with_dns.toml");

  env
    .cmd()
    .arg("apply")
    .arg("--config")
    .arg(&env.config_path)
    .assert()
    .success();
  assert!(env.backend_document("cluster", "load-balancer").exists());

  env
    .cmd()
    .arg("destroy")
    .arg("--config")
    .arg(&env.config_path)
    .arg("--force")
    .assert()
    .success()
    .stdout(predicate::str::contains("Destroy complete"))
    .stdout(predicate::str::contains("Deleted: 14"));

  assert!(!env.backend_document("cluster", "load-balancer").exists());
  assert_eq!(env.read_state()["stacks"], serde_json::json!({}));
}

#[test]
fn destroy_with_no_state_succeeds() {
  let env = TestEnv::empty();

  env
    .cmd()
    .arg("destroy")
    .arg("--force")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to destroy"));
}

#[test]
fn destroy_is_idempotent() {
  let env = TestEnv::empty();
  env.cmd().arg("apply").assert().success();

  env
    .cmd()
    .args(["destroy", "--force"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Destroy complete"));

  env
    .cmd()
    .args(["destroy", "--force"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to destroy"));
}

#[test]
fn destroy_without_force_refuses_non_interactive() {
  let env = TestEnv::empty();
  env.cmd().arg("apply").assert().success();

  env
    .cmd()
    .arg("destroy")
    .assert()
    .failure()
    .stderr(predicate::str::contains("--force"));

  // Nothing was deleted
  assert!(env.backend_document("network", "vpc").exists());
}

#[test]
fn destroy_reports_resources_already_gone() {
  let env = TestEnv::empty();
  env.cmd().arg("apply").assert().success();

  std::fs::remove_file(env.backend_document("repository", "repository")).unwrap();

  env
    .cmd()
    .args(["destroy", "--force"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Already absent: 1"));
}

#[test]
fn destroy_refuses_stacks_missing_from_config() {
  let env = TestEnv::from_fixture("with_dns.toml");
  env
    .cmd()
    .arg("apply")
    .arg("--config")
    .arg(&env.config_path)
    .assert()
    .success();

  // Built-in defaults have no dns stack
  env
    .cmd()
    .args(["destroy", "--force"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("records dns not in the current configuration"));

  assert!(env.backend_document("dns", "alias-record").exists());
  assert!(env.backend_document("network", "vpc").exists());
  assert!(env.read_state()["stacks"]["dns"].is_object());
}

#[test]
fn destroy_keeps_retained_repository() {
  let env = TestEnv::empty();
  std::fs::write(&env.config_path, "[repository]\nremoval_policy = \"retain\"\n").unwrap();

  env
    .cmd()
    .arg("apply")
    .arg("--config")
    .arg(&env.config_path)
    .assert()
    .success();

  env
    .cmd()
    .arg("destroy")
    .arg("--config")
    .arg(&env.config_path)
    .arg("--force")
    .assert()
    .success()
    .stdout(predicate::str::contains("Deleted: 12"))
    .stdout(predicate::str::contains("Retained: 1"));

  assert!(env.backend_document("repository", "repository").exists());
  assert!(!env.backend_document("network", "vpc").exists());
  assert_eq!(env.read_state()["stacks"], serde_json::json!({}));
}
