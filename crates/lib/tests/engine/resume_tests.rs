//! Resume and idempotence across reopened state.

use tempfile::TempDir;

use stackup_lib::backend::LocalBackend;
use stackup_lib::execute::{ExecuteConfig, RunStatus};
use stackup_lib::state::{ResourceStatus, RunStateTracker};
use stackup_lib::topology::{CLUSTER, DnsConfig, NETWORK, TopologyConfig, assemble};

use super::flaky::Flaky;

fn topology() -> TopologyConfig {
  TopologyConfig {
    dns: Some(DnsConfig {
      hosted_zone_id: "Z0123456789ABCDEFGHIJ".to_string(),
      zone_name: "dev.exanubes.com".to_string(),
      record_name: Some("app".to_string()),
    }),
    ..TopologyConfig::default()
  }
}

#[tokio::test]
async fn failed_run_resumes_from_the_failed_resource() {
  let temp = TempDir::new().unwrap();
  let state = temp.path().join("state.json");
  let composition = assemble(&topology()).unwrap();
  let config = ExecuteConfig::default();

  // First run: the listener fails once
  let backend = Flaky::new(LocalBackend::new(temp.path().join("backend"))).fail(CLUSTER, "listener", 1);
  let mut tracker = RunStateTracker::open(&state).unwrap();
  let first = composition.apply(&backend, &mut tracker, &config).await.unwrap();

  let failure = first.failure().unwrap();
  assert_eq!((failure.stack.as_str(), failure.resource.as_str()), (CLUSTER, "listener"));
  assert_eq!(first.summary.created, 8);
  drop(tracker);

  // Second run from a fresh tracker picks up where the first stopped
  let mut tracker = RunStateTracker::open(&state).unwrap();
  assert_eq!(tracker.status(CLUSTER, "listener"), ResourceStatus::Failed);
  assert_eq!(tracker.status(CLUSTER, "load-balancer"), ResourceStatus::Provisioned);

  let second = composition.apply(&backend, &mut tracker, &config).await.unwrap();
  assert!(matches!(second.status, RunStatus::Success));
  assert_eq!(second.summary.unchanged, 8);
  assert_eq!(second.summary.created, 6);
  assert!(tracker.outputs_of("dns").is_some());
}

#[tokio::test]
async fn destroy_after_reopen_empties_everything() {
  let temp = TempDir::new().unwrap();
  let state = temp.path().join("state.json");
  let backend_root = temp.path().join("backend");
  let composition = assemble(&topology()).unwrap();
  let config = ExecuteConfig::default();
  let backend = LocalBackend::new(&backend_root);

  let mut tracker = RunStateTracker::open(&state).unwrap();
  composition.apply(&backend, &mut tracker, &config).await.unwrap();
  assert!(backend.load(NETWORK, "vpc").unwrap().is_some());
  drop(tracker);

  let mut tracker = RunStateTracker::open(&state).unwrap();
  let result = composition.destroy(&backend, &mut tracker, &config).await.unwrap();
  assert!(result.is_success());
  assert_eq!(result.summary.deleted, 14);
  assert!(tracker.record().is_empty());
  assert!(backend.load(NETWORK, "vpc").unwrap().is_none());

  let reopened = RunStateTracker::open(&state).unwrap();
  assert!(reopened.record().is_empty());
}

#[tokio::test]
async fn destroy_failure_then_retry() {
  let temp = TempDir::new().unwrap();
  let state = temp.path().join("state.json");
  let backend_root = temp.path().join("backend");
  let composition = assemble(&topology()).unwrap();
  let config = ExecuteConfig::default();

  let mut tracker = RunStateTracker::open(&state).unwrap();
  composition
    .apply(&LocalBackend::new(&backend_root), &mut tracker, &config)
    .await
    .unwrap();

  let backend = Flaky::new(LocalBackend::new(&backend_root)).fail(NETWORK, "nat-gateway", 1);
  let first = composition.destroy(&backend, &mut tracker, &config).await.unwrap();
  let failure = first.failure().unwrap();
  assert_eq!((failure.stack.as_str(), failure.resource.as_str()), (NETWORK, "nat-gateway"));
  // dns, all of cluster, then private-subnets
  assert_eq!(first.summary.deleted, 10);
  assert_eq!(tracker.status(NETWORK, "nat-gateway"), ResourceStatus::Provisioned);
  assert!(tracker.get(NETWORK, "nat-gateway").unwrap().last_error.is_some());
  drop(tracker);

  let mut tracker = RunStateTracker::open(&state).unwrap();
  let second = composition.destroy(&backend, &mut tracker, &config).await.unwrap();
  assert!(second.is_success());
  assert_eq!(second.summary.deleted, 4);
  assert!(tracker.record().is_empty());
}
