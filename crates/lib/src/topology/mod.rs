//! The reference application topology.
//!
//! [`TopologyConfig`] holds the tunables; [`assemble`] turns them into a
//! [`Composition`](crate::composition::Composition) of stacks.

mod config;
mod stacks;

pub use config::{
  ClusterConfig, ConfigError, CpuArchitecture, DnsConfig, NetworkConfig, RemovalPolicy, RepositoryConfig,
  TopologyConfig,
};
pub use stacks::{
  CLUSTER, DNS, NETWORK, REPOSITORY, assemble, cluster_stack, dns_stack, network_stack, repository_stack,
};
