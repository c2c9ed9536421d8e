//! Buildpack release lookup.
//!
//! Maps a system buildpack to the GitHub page describing its release, so a
//! notification can point owners at what changed. Pure functions; nothing
//! here can fail. Unknown buildpacks and unrecognised versions degrade to a
//! shorter (or empty) URL.

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use crate::models::{Buildpack, BuildpackReleaseInfo};

/// Release pages of the system buildpacks shipped with Cloud Foundry.
///
/// A specific release lives under `/tag/<version>` of these pages.
const BUILDPACK_RELEASE_URLS: &[(&str, &str)] = &[
    ("staticfile_buildpack", "https://github.com/cloudfoundry/staticfile-buildpack/releases"),
    ("java_buildpack", "https://github.com/cloudfoundry/java-buildpack/releases"),
    ("ruby_buildpack", "https://github.com/cloudfoundry/ruby-buildpack/releases"),
    ("dotnet_core_buildpack", "https://github.com/cloudfoundry/dotnet-core-buildpack/releases"),
    ("nodejs_buildpack", "https://github.com/cloudfoundry/nodejs-buildpack/releases"),
    ("go_buildpack", "https://github.com/cloudfoundry/go-buildpack/releases"),
    ("python_buildpack", "https://github.com/cloudfoundry/python-buildpack/releases"),
    ("php_buildpack", "https://github.com/cloudfoundry/php-buildpack/releases"),
    ("binary_buildpack", "https://github.com/cloudfoundry/binary-buildpack/releases"),
    ("nginx_buildpack", "https://github.com/cloudfoundry/nginx-buildpack/releases"),
    ("r_buildpack", "https://github.com/cloudfoundry/r-buildpack/releases"),
];

const VERSION_TAG_PATH: &str = "/tag/";

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // vX.Y or vX.Y.Z
    PATTERN.get_or_init(|| Regex::new(r"^v[0-9]+\.[0-9]+(\.[0-9]+)?$").expect("valid regex"))
}

/// Release notes page for a system buildpack, or `""` if the name is unknown.
pub fn release_url(buildpack_name: &str) -> &'static str {
    BUILDPACK_RELEASE_URLS
        .iter()
        .find(|(name, _)| *name == buildpack_name)
        .map_or("", |(_, url)| *url)
}

/// Extract the version from a buildpack filename.
///
/// Filenames look like `python_buildpack-cflinuxfs3-v1.7.43.zip`; the version
/// is the third `-`-separated segment with `.zip` removed. A filename without
/// a third segment yields `""`, which [`version_url`] treats like any other
/// unrecognised version.
pub fn parse_version(filename: &str) -> String {
    match filename.split('-').nth(2) {
        Some(segment) => segment.replace(".zip", ""),
        None => {
            warn!(filename, "Buildpack filename does not follow <name>-<stack>-<version>.zip");
            String::new()
        }
    }
}

/// Append `/tag/<version>` to `release_url` when `version` looks like `vX.Y[.Z]`.
///
/// Anything else returns `release_url` unchanged.
pub fn version_url(release_url: &str, version: &str) -> String {
    if version_pattern().is_match(version) {
        format!("{release_url}{VERSION_TAG_PATH}{version}")
    } else {
        release_url.to_string()
    }
}

/// Build the release information rendered for an updated buildpack.
///
/// Buildpacks without a known release page get an empty URL rather than a
/// bare `/tag/<version>` path.
pub fn release_info(buildpack: &Buildpack) -> BuildpackReleaseInfo {
    let version = parse_version(&buildpack.filename);
    let url = match release_url(&buildpack.name) {
        "" => String::new(),
        base => version_url(base, &version),
    };
    BuildpackReleaseInfo {
        name: buildpack.name.clone(),
        version,
        url,
    }
}
