//! Stack builders for the reference application.
//!
//! A containerised web service behind a load balancer:
//! - `repository`: image registry
//! - `network`: virtual network with public and private subnets
//! - `cluster`: container cluster, load balancer and service
//! - `dns`: alias record for the load balancer (optional)

use crate::composition::Composition;
use crate::stack::{Reference, ResourceDescriptor, Stack, Value};

use super::config::{ConfigError, DnsConfig, RemovalPolicy, TopologyConfig};

pub const REPOSITORY: &str = "repository";
pub const NETWORK: &str = "network";
pub const CLUSTER: &str = "cluster";
pub const DNS: &str = "dns";

/// Build every stack the config calls for and register them.
///
/// Registration order is repository, network, cluster, then dns.
pub fn assemble(config: &TopologyConfig) -> Result<Composition, ConfigError> {
  config.validate()?;

  let mut composition = Composition::new();
  composition.register_stack(repository_stack(config))?;
  composition.register_stack(network_stack(config))?;
  composition.register_stack(cluster_stack(config))?;
  if let Some(dns) = &config.dns {
    composition.register_stack(dns_stack(config, dns))?;
  }
  Ok(composition)
}

pub fn repository_stack(config: &TopologyConfig) -> Stack {
  let mut repository = ResourceDescriptor::new("registry.repository", "repository")
    .property("name", config.repository_name())
    .property("scan_on_push", config.repository.scan_on_push)
    .property("removal_policy", config.repository.removal_policy.as_str())
    .output("repository_uri")
    .output("repository_arn");
  if config.repository.removal_policy == RemovalPolicy::Retain {
    repository = repository.retain_on_destroy();
  }

  Stack::new(REPOSITORY)
    .resource(repository)
    .output("repository_uri", "repository", "repository_uri")
}

pub fn network_stack(config: &TopologyConfig) -> Stack {
  let network = &config.network;
  let mask = i64::from(network.subnet_cidr_mask);

  Stack::new(NETWORK)
    .resource(
      ResourceDescriptor::new("network.vpc", "vpc")
        .property("name", format!("{}-vpc", config.prefix))
        .property("cidr", network.cidr.as_str())
        .property("max_azs", network.max_azs)
        .output("vpc_id"),
    )
    .resource(
      ResourceDescriptor::new("network.subnets", "public-subnets")
        .property("name", "public-1")
        .property("vpc", Value::local("vpc", "vpc_id"))
        .property("subnet_type", "public")
        .property("cidr_mask", mask)
        .property("count", network.max_azs)
        .output("subnet_ids"),
    )
    .resource(
      ResourceDescriptor::new("network.nat_gateway", "nat-gateway")
        .property("subnets", Value::local("public-subnets", "subnet_ids"))
        .property("count", network.nat_gateways)
        .output("gateway_ids"),
    )
    .resource(
      ResourceDescriptor::new("network.subnets", "private-subnets")
        .property("name", "private-1")
        .property("vpc", Value::local("vpc", "vpc_id"))
        .property("subnet_type", "private_with_nat")
        .property("cidr_mask", mask)
        .property("count", network.max_azs)
        .property("nat_gateways", Value::local("nat-gateway", "gateway_ids"))
        .output("subnet_ids"),
    )
    .output("net_id", "vpc", "vpc_id")
    .output("public_subnets", "public-subnets", "subnet_ids")
    .output("private_subnets", "private-subnets", "subnet_ids")
}

pub fn cluster_stack(config: &TopologyConfig) -> Stack {
  let cluster = &config.cluster;
  let tls = cluster.certificate_arn.is_some();
  // Bounded by validation; saturate for configs built without it
  let idle_timeout = i64::try_from(cluster.idle_timeout.as_secs()).unwrap_or(i64::MAX);

  let mut listener = ResourceDescriptor::new("loadbalancer.listener", "listener")
    .property("load_balancer", Value::local("load-balancer", "lb_arn"))
    .property("port", cluster.listener_port)
    .property("protocol", if tls { "HTTPS" } else { "HTTP" })
    .property("open", true)
    .output("listener_arn");
  if let Some(arn) = &cluster.certificate_arn {
    listener = listener.property("certificate_arn", arn.as_str());
  }

  Stack::new(CLUSTER)
    .input_ref("net_id", Reference::new(NETWORK, "net_id"))
    .input_ref("public_subnets", Reference::new(NETWORK, "public_subnets"))
    .input_ref("private_subnets", Reference::new(NETWORK, "private_subnets"))
    .input_ref("image", Reference::new(REPOSITORY, "repository_uri"))
    .input_literal("container_port", cluster.container_port)
    .resource(
      ResourceDescriptor::new("container.cluster", "cluster")
        .property("name", config.cluster_name())
        .property("vpc", Value::input("net_id"))
        .property("container_insights", cluster.container_insights)
        .output("cluster_arn"),
    )
    .resource(
      ResourceDescriptor::new("network.security_group", "alb-security-group")
        .property("vpc", Value::input("net_id"))
        .property("allow_all_outbound", true)
        .property("ingress_cidr", "0.0.0.0/0")
        .property("ingress_port", cluster.listener_port)
        .output("group_id"),
    )
    .resource(
      ResourceDescriptor::new("loadbalancer.application", "load-balancer")
        .property("name", format!("{}-ecs-alb", config.prefix))
        .property("internet_facing", true)
        .property("idle_timeout_secs", idle_timeout)
        .property("http2", cluster.http2)
        .property("deletion_protection", false)
        .property("security_group", Value::local("alb-security-group", "group_id"))
        .property("subnets", Value::input("public_subnets"))
        .output("lb_arn")
        .output("dns_name")
        .output("hosted_zone_id"),
    )
    .resource(listener)
    .resource(
      ResourceDescriptor::new("loadbalancer.target_group", "target-group")
        .property("name", "tcp-target-ecs-service")
        .property("listener", Value::local("listener", "listener_arn"))
        .property("vpc", Value::input("net_id"))
        .property("protocol", "HTTP")
        .property("protocol_version", "HTTP1")
        .property("port", Value::input("container_port"))
        .output("target_group_arn"),
    )
    .resource(
      ResourceDescriptor::new("container.task_definition", "task-definition")
        .property("cpu_architecture", cluster.cpu_architecture.as_str())
        .property("os_family", "linux")
        .property("container_name", "web-server")
        .property("image", Value::input("image"))
        .property("container_port", Value::input("container_port"))
        .output("task_definition_arn"),
    )
    .resource(
      ResourceDescriptor::new("network.security_group", "service-security-group")
        .property("vpc", Value::input("net_id"))
        .property("ingress_source", Value::local("alb-security-group", "group_id"))
        .property("ingress_port", Value::input("container_port"))
        .output("group_id"),
    )
    .resource(
      ResourceDescriptor::new("container.fargate_service", "service")
        .property("cluster", Value::local("cluster", "cluster_arn"))
        .property("task_definition", Value::local("task-definition", "task_definition_arn"))
        .property("security_group", Value::local("service-security-group", "group_id"))
        .property("target_group", Value::local("target-group", "target_group_arn"))
        .property("subnets", Value::input("private_subnets"))
        .property("assign_public_ip", false)
        .property("desired_count", cluster.desired_count)
        .output("service_arn"),
    )
    .output("lb_handle", "load-balancer", "lb_arn")
    .output("lb_dns_name", "load-balancer", "dns_name")
    .output("lb_zone_id", "load-balancer", "hosted_zone_id")
    .output("service_arn", "service", "service_arn")
}

pub fn dns_stack(config: &TopologyConfig, dns: &DnsConfig) -> Stack {
  Stack::new(DNS)
    .input_ref("lb_dns_name", Reference::new(CLUSTER, "lb_dns_name"))
    .input_ref("lb_zone_id", Reference::new(CLUSTER, "lb_zone_id"))
    .resource(
      ResourceDescriptor::new("dns.alias_record", "alias-record")
        .property("name", format!("{}-alias", config.prefix))
        .property("hosted_zone_id", dns.hosted_zone_id.as_str())
        .property("zone_name", dns.zone_name.as_str())
        .property("record_name", dns.fqdn())
        .property("target", Value::input("lb_dns_name"))
        .property("target_zone", Value::input("lb_zone_id"))
        .output("fqdn"),
    )
    .output("fqdn", "alias-record", "fqdn")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::MemoryBackend;
  use crate::execute::{ExecuteConfig, RunStatus};
  use crate::stack::Scalar;
  use crate::state::RunStateTracker;

  fn with_dns() -> TopologyConfig {
    TopologyConfig {
      dns: Some(DnsConfig {
        hosted_zone_id: "Z0123456789ABCDEFGHIJ".to_string(),
        zone_name: "dev.exanubes.com".to_string(),
        record_name: None,
      }),
      ..TopologyConfig::default()
    }
  }

  #[test]
  fn default_topology_without_dns() {
    let composition = assemble(&TopologyConfig::default()).unwrap();
    let plan = composition.compute_plan().unwrap();
    assert_eq!(plan.stacks(), [REPOSITORY, NETWORK, CLUSTER]);
    assert!(composition.get(DNS).is_none());
  }

  #[test]
  fn dns_comes_last() {
    let composition = assemble(&with_dns()).unwrap();
    let plan = composition.compute_plan().unwrap();
    assert_eq!(plan.stacks(), [REPOSITORY, NETWORK, CLUSTER, DNS]);
    assert_eq!(plan.waves().len(), 3);

    let graph = composition.graph().unwrap();
    assert_eq!(graph.dependencies(CLUSTER), vec![REPOSITORY, NETWORK]);
    assert_eq!(graph.dependencies(DNS), vec![CLUSTER]);
  }

  #[test]
  fn placeholder_zone_fails_assembly() {
    let mut config = with_dns();
    if let Some(dns) = config.dns.as_mut() {
      dns.hosted_zone_id = "YOUR_HOSTED_ZONE_ID".to_string();
    }
    assert!(matches!(assemble(&config), Err(ConfigError::Placeholder { .. })));
  }

  #[test]
  fn certificate_switches_listener_to_https() {
    let mut config = TopologyConfig::default();
    let plain = cluster_stack(&config);
    let listener = plain.find_resource("listener").unwrap();
    assert_eq!(listener.properties["protocol"], Value::from("HTTP"));
    assert!(!listener.properties.contains_key("certificate_arn"));

    config.cluster.certificate_arn = Some("arn:aws:acm:eu-central-1:123456789012:certificate/abc".to_string());
    let tls = cluster_stack(&config);
    let listener = tls.find_resource("listener").unwrap();
    assert_eq!(listener.properties["protocol"], Value::from("HTTPS"));
    assert!(listener.properties.contains_key("certificate_arn"));
  }

  #[test]
  fn oversized_idle_timeout_fails_assembly() {
    let mut config = TopologyConfig::default();
    config.cluster.idle_timeout = std::time::Duration::from_secs(u64::MAX);
    assert!(matches!(
      assemble(&config),
      Err(ConfigError::Invalid {
        field: "cluster.idle_timeout",
        ..
      })
    ));
  }

  #[tokio::test]
  async fn retained_repository_survives_destroy() {
    let mut config = TopologyConfig::default();
    config.repository.removal_policy = RemovalPolicy::Retain;
    let composition = assemble(&config).unwrap();
    let backend = MemoryBackend::new();
    let mut tracker = RunStateTracker::in_memory();
    let execute = ExecuteConfig::default();

    composition.apply(&backend, &mut tracker, &execute).await.unwrap();
    let result = composition.destroy(&backend, &mut tracker, &execute).await.unwrap();

    assert!(result.is_success());
    assert_eq!(result.summary.deleted, 12);
    assert_eq!(result.summary.retained, 1);
    assert!(backend.contains(REPOSITORY, "repository"));
    assert_eq!(backend.len(), 1);
    assert!(tracker.record().is_empty());
  }

  #[tokio::test]
  async fn full_topology_applies_and_wires_outputs() {
    let composition = assemble(&with_dns()).unwrap();
    let backend = MemoryBackend::new();
    let mut tracker = RunStateTracker::in_memory();

    let result = composition
      .apply(&backend, &mut tracker, &ExecuteConfig::default())
      .await
      .unwrap();
    assert!(matches!(result.status, RunStatus::Success));
    assert_eq!(result.summary.created, 14);

    let image = tracker.outputs_of(REPOSITORY).unwrap()["repository_uri"].clone();
    let task = backend.properties_of(CLUSTER, "task-definition").unwrap();
    assert_eq!(task["image"], image);
    assert_eq!(task["container_port"], Scalar::Int(8081));

    let lb_dns = tracker.outputs_of(CLUSTER).unwrap()["lb_dns_name"].clone();
    let alias = backend.properties_of(DNS, "alias-record").unwrap();
    assert_eq!(alias["target"], lb_dns);
    assert_eq!(alias["record_name"], Scalar::from("dev.exanubes.com"));
  }
}
