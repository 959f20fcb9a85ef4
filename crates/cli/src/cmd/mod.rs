mod add_patch;
mod build;
mod rebuild;
mod release;
mod status;

pub use add_patch::cmd_add_patch;
pub use build::cmd_build;
pub use rebuild::cmd_rebuild;
pub use release::cmd_release;
pub use status::cmd_status;
