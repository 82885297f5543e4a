/// Configuration management for Nodeboot - bootstrap user-data for cluster nodes
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::cluster::models::{
    ApiEndpoint, Cluster, ClusterNetwork, ClusterSpec, ClusterStatus, Machine, MachineSpec,
    MachineVersions, NetworkRanges, ObjectMeta,
};
use crate::userdata::templates::{CONTROL_PLANE_TEMPLATE, WORKER_TEMPLATE};
use crate::userdata::UserdataRenderer;

/// Environment variable holding the join token
pub const TOKEN_ENV: &str = "BOOTSTRAP_TOKEN";

/// Main bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Cluster the machines join
    pub cluster: Cluster,

    /// Machines to render bootstrap scripts for
    pub machines: Vec<MachineConfig>,

    /// Join token (can also be set via BOOTSTRAP_TOKEN env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Template overrides
    #[serde(default, skip_serializing_if = "TemplateConfig::is_empty")]
    pub templates: TemplateConfig,
}

/// Machine entry with its trailing user-data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    pub machine: Machine,

    /// Appended verbatim after the rendered environment block
    #[serde(default)]
    pub extra_userdata: String,
}

/// Paths to template files replacing the built-in templates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<PathBuf>,
}

impl TemplateConfig {
    fn is_empty(&self) -> bool {
        self.control_plane.is_none() && self.worker.is_none()
    }
}

impl BootstrapConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BootstrapConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cluster.name().is_empty() {
            anyhow::bail!("cluster name cannot be empty");
        }

        if self.machines.is_empty() {
            anyhow::bail!("at least one machine is required");
        }

        let mut seen = HashSet::new();
        for entry in &self.machines {
            let machine = &entry.machine;
            if machine.metadata.name.is_empty() {
                anyhow::bail!("machine name cannot be empty");
            }
            if machine.spec.versions.kubelet.is_empty() {
                anyhow::bail!(
                    "machine {} has no kubelet version",
                    machine.qualified_name()
                );
            }
            if !seen.insert(machine.qualified_name()) {
                anyhow::bail!("duplicate machine: {}", machine.qualified_name());
            }
        }

        // Validate network CIDRs
        let network = &self.cluster.spec.cluster_network;
        for cidr in network
            .pods
            .cidr_blocks
            .iter()
            .chain(network.services.cidr_blocks.iter())
        {
            self.validate_cidr(cidr)?;
        }

        Ok(())
    }

    /// Validate CIDR notation
    fn validate_cidr(&self, cidr: &str) -> anyhow::Result<()> {
        if !cidr.contains('/') {
            anyhow::bail!("Invalid CIDR notation: {}", cidr);
        }
        Ok(())
    }

    /// Get the join token from config or environment
    pub fn get_token(&self) -> anyhow::Result<String> {
        self.resolve_token(None)
    }

    /// Get the join token, preferring an explicit override
    ///
    /// An override must be non-empty. Empty config values fall through to
    /// the BOOTSTRAP_TOKEN environment variable.
    pub fn resolve_token(&self, override_token: Option<&str>) -> anyhow::Result<String> {
        if let Some(token) = override_token {
            if token.is_empty() {
                anyhow::bail!("Join token cannot be empty");
            }
            return Ok(token.to_string());
        }

        self.token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV).ok().filter(|token| !token.is_empty()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Join token not found. Set {} environment variable or specify in config",
                    TOKEN_ENV
                )
            })
    }

    /// Find a machine by name, optionally restricted to a namespace
    pub fn find_machine(
        &self,
        name: &str,
        namespace: Option<&str>,
    ) -> anyhow::Result<&MachineConfig> {
        let mut matches = self.machines.iter().filter(|entry| {
            entry.machine.metadata.name == name
                && namespace.map_or(true, |ns| entry.machine.metadata.namespace == ns)
        });

        let found = matches
            .next()
            .with_context(|| format!("machine '{}' not found in configuration", name))?;
        if matches.next().is_some() {
            anyhow::bail!(
                "machine name '{}' is ambiguous, pass --namespace to select one",
                name
            );
        }

        Ok(found)
    }

    /// Build a renderer, reading any configured template overrides
    pub fn renderer(&self) -> anyhow::Result<UserdataRenderer> {
        if self.templates.is_empty() {
            return Ok(UserdataRenderer::new());
        }

        let control_plane = read_template(self.templates.control_plane.as_deref())?
            .unwrap_or_else(|| CONTROL_PLANE_TEMPLATE.to_string());
        let worker = read_template(self.templates.worker.as_deref())?
            .unwrap_or_else(|| WORKER_TEMPLATE.to_string());

        UserdataRenderer::with_templates(&control_plane, &worker)
            .context("Failed to load user-data templates")
    }

    /// Generate an example configuration file
    pub fn example() -> Self {
        let machine = |name: &str, control_plane: &str| MachineConfig {
            machine: Machine {
                metadata: ObjectMeta {
                    name: name.to_string(),
                    namespace: "default".to_string(),
                },
                spec: MachineSpec {
                    versions: MachineVersions {
                        kubelet: "1.30.0".to_string(),
                        control_plane: control_plane.to_string(),
                    },
                },
            },
            extra_userdata: String::new(),
        };

        Self {
            cluster: Cluster {
                metadata: ObjectMeta {
                    name: "demo-cluster".to_string(),
                    namespace: "default".to_string(),
                },
                spec: ClusterSpec {
                    cluster_network: ClusterNetwork {
                        pods: NetworkRanges {
                            cidr_blocks: vec!["192.168.0.0/16".to_string()],
                        },
                        services: NetworkRanges {
                            cidr_blocks: vec!["10.96.0.0/12".to_string()],
                        },
                        service_domain: "cluster.local".to_string(),
                    },
                },
                status: ClusterStatus {
                    api_endpoints: vec![ApiEndpoint {
                        host: "10.0.1.10".to_string(),
                        port: 443,
                    }],
                },
            },
            machines: vec![machine("control-plane-0", "1.30.0"), machine("worker-0", "")],
            token: None,
            templates: TemplateConfig::default(),
        }
    }
}

fn read_template(path: Option<&Path>) -> anyhow::Result<Option<String>> {
    path.map(|path| {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))
    })
    .transpose()
}
