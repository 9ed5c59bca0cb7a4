mod fs_ops;
mod layout;
mod patch;
mod replace;
mod tracking;
mod version_dir;

pub use layout::{validate_target_version, TreeConfig, TreeLayout};
pub use patch::{
    patch_dependency_pins, patch_metadata_version, patch_revision_pins,
    rewrite_dependency_version, rewrite_metadata_version, rewrite_revision_pins,
};
pub use replace::{replace_lockfile, write_toolchain_pin, LockfileReplacement};
pub use tracking::{TrackingState, TrackingStateStore};
pub use version_dir::{
    ensure_version_directory, list_version_directories, plan_version_directory, EnsureOutcome,
};
