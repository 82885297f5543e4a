/// Cluster and machine data models
use serde::{Deserialize, Serialize};

/// Object identity shared by clusters and machines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

/// Cluster resource as recorded by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub metadata: ObjectMeta,
    pub spec: ClusterSpec,
    #[serde(default)]
    pub status: ClusterStatus,
}

/// Desired cluster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub cluster_network: ClusterNetwork,
}

/// Cluster-wide network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterNetwork {
    /// Pod network ranges
    #[serde(default)]
    pub pods: NetworkRanges,

    /// Service network ranges
    #[serde(default)]
    pub services: NetworkRanges,

    /// Cluster DNS domain (e.g., "cluster.local")
    #[serde(default = "default_service_domain")]
    pub service_domain: String,
}

/// Ordered list of CIDR blocks (e.g., "10.0.0.0/16")
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRanges {
    #[serde(default)]
    pub cidr_blocks: Vec<String>,
}

/// Observed cluster state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterStatus {
    /// API endpoints, populated once the control plane is provisioned
    #[serde(default)]
    pub api_endpoints: Vec<ApiEndpoint>,
}

/// Host/port pair where the control plane accepts connections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub host: String,
    pub port: u16,
}

/// Machine resource describing a single node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub metadata: ObjectMeta,
    pub spec: MachineSpec,
}

/// Desired machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSpec {
    pub versions: MachineVersions,
}

/// Component versions installed on the machine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineVersions {
    /// Kubelet version (e.g., "1.30.0")
    pub kubelet: String,

    /// Control plane version, empty for worker machines
    #[serde(default)]
    pub control_plane: String,
}

/// Node role in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineRole {
    ControlPlane,
    Worker,
}

impl std::fmt::Display for MachineRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineRole::ControlPlane => write!(f, "control-plane"),
            MachineRole::Worker => write!(f, "worker"),
        }
    }
}

fn default_service_domain() -> String {
    "cluster.local".to_string()
}

impl Cluster {
    /// Cluster name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

impl Machine {
    /// A machine carrying a control plane version runs the control plane
    pub fn role(&self) -> MachineRole {
        if self.spec.versions.control_plane.is_empty() {
            MachineRole::Worker
        } else {
            MachineRole::ControlPlane
        }
    }

    /// "namespace/name", as written to the MACHINE variable
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.metadata.namespace, self.metadata.name)
    }
}
