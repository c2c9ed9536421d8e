//! Buildpack change tracking and release lookup.

pub mod filter;
pub mod release;

pub use filter::{filter_updated_buildpacks, index_by_name};
pub use release::{parse_version, release_info, release_url, version_url};
