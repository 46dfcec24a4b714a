//! Typed topology configuration.
//!
//! Loaded from TOML. Every section is optional and falls back to the
//! defaults below; only the DNS section has required fields.
//!
//! ```toml
//! prefix = "exanubes"
//!
//! [network]
//! cidr = "10.100.0.0/16"
//! max_azs = 2
//!
//! [cluster]
//! container_port = 8081
//! desired_count = 1
//!
//! [dns]
//! hosted_zone_id = "Z0123456789ABCDEFGHIJ"
//! zone_name = "dev.exanubes.com"
//! ```

use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::execute::GraphError;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  /// A required identifier was left empty or at its template value.
  #[error("{field} must be set to a real value, got {value:?}")]
  Placeholder { field: &'static str, value: String },

  #[error("invalid {field}: {message}")]
  Invalid { field: &'static str, message: String },

  #[error(transparent)]
  Graph(#[from] GraphError),
}

/// Upper bound on the load balancer idle timeout, in seconds.
const MAX_IDLE_TIMEOUT_SECS: u64 = 4000;

/// Whether a resource is deleted or kept when its stack is destroyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
  #[default]
  Destroy,
  Retain,
}

impl RemovalPolicy {
  pub fn as_str(&self) -> &'static str {
    match self {
      RemovalPolicy::Destroy => "destroy",
      RemovalPolicy::Retain => "retain",
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuArchitecture {
  #[default]
  Arm64,
  X86_64,
}

impl CpuArchitecture {
  pub fn as_str(&self) -> &'static str {
    match self {
      CpuArchitecture::Arm64 => "arm64",
      CpuArchitecture::X86_64 => "x86_64",
    }
  }
}

/// The whole topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopologyConfig {
  /// Prefix for every generated resource name.
  pub prefix: String,
  pub network: NetworkConfig,
  pub repository: RepositoryConfig,
  pub cluster: ClusterConfig,
  /// The DNS alias stack is only registered when this is present.
  pub dns: Option<DnsConfig>,
}

impl Default for TopologyConfig {
  fn default() -> Self {
    Self {
      prefix: "exanubes".to_string(),
      network: NetworkConfig::default(),
      repository: RepositoryConfig::default(),
      cluster: ClusterConfig::default(),
      dns: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
  /// Address range of the virtual network.
  pub cidr: String,
  /// Number of availability zones to spread subnets over.
  pub max_azs: u32,
  /// Prefix length of each subnet.
  pub subnet_cidr_mask: u8,
  pub nat_gateways: u32,
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self {
      cidr: "10.100.0.0/16".to_string(),
      max_azs: 2,
      subnet_cidr_mask: 24,
      nat_gateways: 1,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
  /// Defaults to `<prefix>-repository`.
  pub name: Option<String>,
  pub scan_on_push: bool,
  pub removal_policy: RemovalPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
  /// Defaults to `<prefix>-cluster`.
  pub cluster_name: Option<String>,
  pub container_insights: bool,
  pub container_port: u16,
  pub listener_port: u16,
  pub desired_count: u32,
  /// Load balancer idle timeout, in whole seconds.
  #[serde(with = "duration_secs")]
  pub idle_timeout: Duration,
  pub http2: bool,
  pub cpu_architecture: CpuArchitecture,
  /// TLS certificate for the listener. Plain HTTP when absent.
  pub certificate_arn: Option<String>,
}

impl Default for ClusterConfig {
  fn default() -> Self {
    Self {
      cluster_name: None,
      container_insights: true,
      container_port: 8081,
      listener_port: 8081,
      desired_count: 1,
      idle_timeout: Duration::from_secs(600),
      http2: false,
      cpu_architecture: CpuArchitecture::Arm64,
      certificate_arn: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DnsConfig {
  /// Required; there is no usable default.
  pub hosted_zone_id: String,
  #[serde(default = "default_zone_name")]
  pub zone_name: String,
  /// Record name inside the zone. The zone apex when absent.
  #[serde(default)]
  pub record_name: Option<String>,
}

fn default_zone_name() -> String {
  "dev.exanubes.com".to_string()
}

/// Idle timeouts are stored as whole seconds.
mod duration_secs {
  use std::time::Duration;

  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
  }
}

impl TopologyConfig {
  /// Read and validate a TOML config file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.validate()?;
    debug!(path = %path.display(), dns = config.dns.is_some(), "loaded topology config");
    Ok(config)
  }

  /// Load `path` if given, else use the defaults.
  pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
    match path {
      Some(path) => Self::load(path),
      None => Ok(Self::default()),
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.prefix.trim().is_empty() {
      return Err(ConfigError::Invalid {
        field: "prefix",
        message: "must not be empty".to_string(),
      });
    }
    self.network.validate()?;
    self.cluster.validate()?;
    if let Some(dns) = &self.dns {
      dns.validate()?;
    }
    Ok(())
  }

  pub fn repository_name(&self) -> String {
    self
      .repository
      .name
      .clone()
      .unwrap_or_else(|| format!("{}-repository", self.prefix))
  }

  pub fn cluster_name(&self) -> String {
    self
      .cluster
      .cluster_name
      .clone()
      .unwrap_or_else(|| format!("{}-cluster", self.prefix))
  }
}

impl NetworkConfig {
  fn validate(&self) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
      field: "network.cidr",
      message,
    };

    let (addr, len) = self
      .cidr
      .split_once('/')
      .ok_or_else(|| invalid(format!("{:?} is not in address/prefix form", self.cidr)))?;
    addr
      .parse::<Ipv4Addr>()
      .map_err(|e| invalid(format!("{:?}: {}", addr, e)))?;
    let len: u8 = len
      .parse()
      .ok()
      .filter(|l| *l <= 32)
      .ok_or_else(|| invalid(format!("{:?} is not a prefix length", len)))?;

    if self.subnet_cidr_mask <= len || self.subnet_cidr_mask > 28 {
      return Err(ConfigError::Invalid {
        field: "network.subnet_cidr_mask",
        message: format!("must be between /{} and /28, got /{}", len + 1, self.subnet_cidr_mask),
      });
    }
    if self.max_azs == 0 {
      return Err(ConfigError::Invalid {
        field: "network.max_azs",
        message: "must be at least 1".to_string(),
      });
    }
    // One public and one private subnet per zone
    let available = 1u64 << (self.subnet_cidr_mask - len);
    if u64::from(self.max_azs) * 2 > available {
      return Err(ConfigError::Invalid {
        field: "network.max_azs",
        message: format!("{} zones need {} subnets, only {} fit", self.max_azs, self.max_azs * 2, available),
      });
    }
    Ok(())
  }
}

impl ClusterConfig {
  fn validate(&self) -> Result<(), ConfigError> {
    if self.container_port == 0 {
      return Err(ConfigError::Invalid {
        field: "cluster.container_port",
        message: "must not be 0".to_string(),
      });
    }
    if self.listener_port == 0 {
      return Err(ConfigError::Invalid {
        field: "cluster.listener_port",
        message: "must not be 0".to_string(),
      });
    }
    let idle = self.idle_timeout.as_secs();
    if !(1..=MAX_IDLE_TIMEOUT_SECS).contains(&idle) {
      return Err(ConfigError::Invalid {
        field: "cluster.idle_timeout",
        message: format!("must be between 1 and {} seconds, got {}", MAX_IDLE_TIMEOUT_SECS, idle),
      });
    }
    if let Some(arn) = &self.certificate_arn {
      check_identifier("cluster.certificate_arn", arn)?;
    }
    Ok(())
  }
}

impl DnsConfig {
  fn validate(&self) -> Result<(), ConfigError> {
    check_identifier("dns.hosted_zone_id", &self.hosted_zone_id)?;
    if self.zone_name.trim().is_empty() {
      return Err(ConfigError::Invalid {
        field: "dns.zone_name",
        message: "must not be empty".to_string(),
      });
    }
    Ok(())
  }

  /// Fully qualified record name.
  pub fn fqdn(&self) -> String {
    match &self.record_name {
      Some(name) if !name.is_empty() => format!("{}.{}", name, self.zone_name),
      _ => self.zone_name.clone(),
    }
  }
}

/// Reject empty values and template leftovers such as `YOUR_HOSTED_ZONE_ID`.
fn check_identifier(field: &'static str, value: &str) -> Result<(), ConfigError> {
  let trimmed = value.trim();
  if trimmed.is_empty() || trimmed.to_ascii_uppercase().starts_with("YOUR_") || trimmed.starts_with('<') {
    return Err(ConfigError::Placeholder {
      field,
      value: value.to_string(),
    });
  }
  Ok(())
}
