//! Built-in bootstrap script templates
//!
//! Field paths resolve against the serialized bootstrap parameters. Both
//! templates end with a newline so appended metadata starts on a fresh line.

/// Environment template for control plane machines
pub const CONTROL_PLANE_TEMPLATE: &str = r#"#!/bin/bash
KUBELET_VERSION={{machine.spec.versions.kubelet}}
TOKEN={{token}}
PORT=443
NAMESPACE={{machine.metadata.namespace}}
MACHINE=$NAMESPACE
MACHINE+="/"
MACHINE+={{machine.metadata.name}}
CONTROL_PLANE_VERSION={{machine.spec.versions.control_plane}}
CLUSTER_DNS_DOMAIN={{cluster.spec.cluster_network.service_domain}}
POD_CIDR={{pod_cidr}}
SERVICE_CIDR={{service_cidr}}
"#;

/// Environment template for worker machines
pub const WORKER_TEMPLATE: &str = r#"#!/bin/bash
KUBELET_VERSION={{machine.spec.versions.kubelet}}
MASTER={{master_endpoint}}
TOKEN={{token}}
NAMESPACE={{machine.metadata.namespace}}
MACHINE=$NAMESPACE
MACHINE+="/"
MACHINE+={{machine.metadata.name}}
CLUSTER_DNS_DOMAIN={{cluster.spec.cluster_network.service_domain}}
POD_CIDR={{pod_cidr}}
SERVICE_CIDR={{service_cidr}}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_end_with_newline() {
        assert!(CONTROL_PLANE_TEMPLATE.ends_with('\n'));
        assert!(WORKER_TEMPLATE.ends_with('\n'));
    }

    #[test]
    fn test_role_specific_lines() {
        assert!(CONTROL_PLANE_TEMPLATE.contains("CONTROL_PLANE_VERSION="));
        assert!(!CONTROL_PLANE_TEMPLATE.contains("MASTER="));
        assert!(WORKER_TEMPLATE.contains("MASTER="));
        assert!(!WORKER_TEMPLATE.contains("CONTROL_PLANE_VERSION="));
    }
}
