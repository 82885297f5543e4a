/// User-data rendering for control plane and worker machines
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

use super::error::UserdataError;
use super::templates::{CONTROL_PLANE_TEMPLATE, WORKER_TEMPLATE};
use crate::cluster::{ApiEndpoint, Cluster, Machine, MachineRole, NetworkRanges};

const CONTROL_PLANE: &str = "control-plane";
const WORKER: &str = "worker";

/// Parameters substituted into the bootstrap templates
#[derive(Debug, Serialize)]
struct BootstrapParams<'a> {
    machine: &'a Machine,
    cluster: &'a Cluster,
    token: &'a str,
    master_endpoint: String,
    pod_cidr: String,
    service_cidr: String,
}

impl<'a> BootstrapParams<'a> {
    fn new(cluster: &'a Cluster, machine: &'a Machine, token: &'a str) -> Self {
        let network = &cluster.spec.cluster_network;
        Self {
            machine,
            cluster,
            token,
            master_endpoint: String::new(),
            pod_cidr: subnet(&network.pods),
            service_cidr: subnet(&network.services),
        }
    }
}

/// Renders bootstrap scripts from a pair of registered templates
///
/// Rendering runs in strict mode, so every field a template references must
/// resolve. Values are emitted verbatim; no HTML escaping is applied.
pub struct UserdataRenderer {
    registry: Handlebars<'static>,
}

impl Default for UserdataRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl UserdataRenderer {
    /// Create a renderer with the built-in templates
    ///
    /// # Panics
    ///
    /// Panics if the built-in templates fail to parse. They are compiled in
    /// and covered by tests, so this indicates a broken build.
    pub fn new() -> Self {
        Self::with_templates(CONTROL_PLANE_TEMPLATE, WORKER_TEMPLATE)
            .expect("built-in user-data templates are valid")
    }

    /// Create a renderer with caller-provided templates
    pub fn with_templates(control_plane: &str, worker: &str) -> Result<Self, UserdataError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_template_string(CONTROL_PLANE, control_plane)?;
        registry.register_template_string(WORKER, worker)?;

        Ok(Self { registry })
    }

    /// Build the script matching the machine's role
    pub fn render(
        &self,
        cluster: &Cluster,
        machine: &Machine,
        token: &str,
        metadata: &str,
    ) -> Result<String, UserdataError> {
        match machine.role() {
            MachineRole::ControlPlane => self.control_plane(cluster, machine, token, metadata),
            MachineRole::Worker => self.worker(cluster, machine, token, metadata),
        }
    }

    /// Build the control plane bootstrap script
    pub fn control_plane(
        &self,
        cluster: &Cluster,
        machine: &Machine,
        token: &str,
        metadata: &str,
    ) -> Result<String, UserdataError> {
        debug!(
            "Rendering control-plane user-data for {}",
            machine.qualified_name()
        );

        let params = BootstrapParams::new(cluster, machine, token);
        self.execute(CONTROL_PLANE, &params, metadata)
    }

    /// Build the worker bootstrap script
    ///
    /// The worker joins the first API endpoint registered on the cluster, so
    /// at least one must exist.
    pub fn worker(
        &self,
        cluster: &Cluster,
        machine: &Machine,
        token: &str,
        metadata: &str,
    ) -> Result<String, UserdataError> {
        let master = cluster
            .status
            .api_endpoints
            .first()
            .ok_or_else(|| UserdataError::NoApiEndpoint {
                cluster: cluster.name().to_string(),
            })?;

        debug!(
            "Rendering worker user-data for {} (master {}:{})",
            machine.qualified_name(),
            master.host,
            master.port
        );

        let mut params = BootstrapParams::new(cluster, machine, token);
        params.master_endpoint = endpoint(master);
        self.execute(WORKER, &params, metadata)
    }

    fn execute(
        &self,
        template: &str,
        params: &BootstrapParams<'_>,
        metadata: &str,
    ) -> Result<String, UserdataError> {
        let mut script = self.registry.render(template, params)?;
        script.push_str(metadata);
        Ok(script)
    }
}

fn default_renderer() -> &'static UserdataRenderer {
    static RENDERER: OnceLock<UserdataRenderer> = OnceLock::new();
    RENDERER.get_or_init(UserdataRenderer::new)
}

/// Build the control plane bootstrap script with the built-in template
pub fn control_plane_userdata(
    cluster: &Cluster,
    machine: &Machine,
    token: &str,
    metadata: &str,
) -> Result<String, UserdataError> {
    default_renderer().control_plane(cluster, machine, token, metadata)
}

/// Build the worker bootstrap script with the built-in template
pub fn worker_userdata(
    cluster: &Cluster,
    machine: &Machine,
    token: &str,
    metadata: &str,
) -> Result<String, UserdataError> {
    default_renderer().worker(cluster, machine, token, metadata)
}

/// Format an API endpoint as "host:port"
pub fn endpoint(api_endpoint: &ApiEndpoint) -> String {
    format!("{}:{}", api_endpoint.host, api_endpoint.port)
}

/// First CIDR block of the range, or an empty string
pub fn subnet(ranges: &NetworkRanges) -> String {
    ranges.cidr_blocks.first().cloned().unwrap_or_default()
}
