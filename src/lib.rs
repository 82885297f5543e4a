//! Nodeboot - bootstrap user-data for cluster nodes
//!
//! Renders the first-boot shell scripts that configure control plane and
//! worker machines and join them to the cluster:
//!
//! - [`cluster`]: cluster and machine descriptors
//! - [`userdata`]: template rendering for both machine roles
//! - [`config`]: YAML configuration used by the `nodeboot` CLI

pub mod cluster;
pub mod config;
pub mod userdata;
