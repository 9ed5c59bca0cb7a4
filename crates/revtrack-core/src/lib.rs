mod digest;
mod errors;
mod lockfile;
mod toolchain;
mod version;

pub use digest::{sha256_hex, short_digest};
pub use errors::{ExtractionError, MissingBaseError, PatchIoError};
pub use lockfile::{mirrored_pins, DependencyPin};
pub use toolchain::nightly_toolchain_from_commit_date;
pub use version::{
    compare_target_versions, extract_target_version, lenient_semver,
    mc_version_from_package_version, mc_version_from_readme, short_revision,
};
