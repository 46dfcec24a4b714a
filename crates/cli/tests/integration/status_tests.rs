//! Status command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn status_without_state() {
  let env = TestEnv::empty();

  env
    .cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("No run state found"));
}

#[test]
fn status_after_apply_lists_stacks() {
  let env = TestEnv::empty();
  env.cmd().arg("apply").assert().success();

  env
    .cmd()
    .args(["status", "--verbose"])
    .assert()
    .success()
    .stdout(predicate::str::contains("network (complete)"))
    .stdout(predicate::str::contains("private-subnets"))
    .stdout(predicate::str::contains("repository_uri = "));
}

#[test]
fn status_json_is_the_run_record() {
  let env = TestEnv::empty();
  env.cmd().arg("apply").assert().success();

  let output = env.cmd().args(["--output", "json", "status"]).output().unwrap();
  assert!(output.status.success());

  let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(record, env.read_state());
}
