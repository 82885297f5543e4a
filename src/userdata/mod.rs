//! Bootstrap user-data script rendering
pub mod error;
pub mod renderer;
pub mod templates;

pub use error::UserdataError;
pub use renderer::{control_plane_userdata, endpoint, subnet, worker_userdata, UserdataRenderer};
