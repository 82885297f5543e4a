//! Cluster and machine descriptors consumed by the user-data renderer
pub mod models;

pub use models::{ApiEndpoint, Cluster, Machine, MachineRole, NetworkRanges};
