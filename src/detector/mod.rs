//! Outdated application detection.
//!
//! An application is outdated when it is running, has exactly one current
//! droplet, that droplet was staged with a buildpack that changed in this run,
//! and the buildpack was updated strictly after the droplet was created.
//!
//! Per-application problems (droplet fetch errors, ambiguous droplets) are
//! logged and skipped. Malformed timestamps abort the run.

use anyhow::Result;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::buildpack::release_info;
use crate::core::NotifierError;
use crate::models::{Application, Buildpack, BuildpackReleaseInfo, Droplet, parse_timestamp};
use crate::platform::Platform;

/// Result of a detection pass.
#[derive(Debug, Default)]
pub struct OutdatedApps {
    /// Applications needing a restage, in input order.
    pub apps: Vec<Application>,
    /// Release information, one entry per outdated application (not deduplicated).
    pub releases: Vec<BuildpackReleaseInfo>,
}

/// Find running applications whose current droplet predates the update of a
/// changed buildpack.
///
/// `changed` maps buildpack name to the buildpacks selected by
/// [`crate::buildpack::filter_updated_buildpacks`] for this run.
pub async fn find_outdated_apps<P: Platform>(
    platform: &P,
    apps: &[Application],
    changed: &HashMap<String, Buildpack>,
) -> Result<OutdatedApps> {
    let mut outdated = OutdatedApps::default();

    for app in apps {
        if !app.is_started() {
            info!("App {} guid {} not in STARTED state", app.name, app.id);
            continue;
        }

        let Some(droplet) = current_droplet(platform, app).await else {
            info!("Unable to find current droplet for app {} guid {}. Safely skipping.", app.name, app.id);
            continue;
        };

        let Some(buildpack) = matching_buildpack(&droplet, changed) else {
            info!("App {} guid {} not using supported buildpack", app.name, app.id);
            continue;
        };

        if !is_droplet_outdated(&droplet, buildpack)? {
            info!("App {} Guid {} | Buildpack {} not outdated", app.name, app.id, buildpack.name);
            continue;
        }

        info!("App {} Guid {} | Buildpack {} is outdated", app.name, app.id, buildpack.name);
        outdated.releases.push(release_info(buildpack));
        outdated.apps.push(app.clone());
    }

    Ok(outdated)
}

/// The app's single current droplet, or `None` if it cannot be determined.
///
/// A fetch error is logged and treated like a missing droplet; it does not
/// mean the app is up to date, only that it is skipped this run.
async fn current_droplet<P: Platform>(platform: &P, app: &Application) -> Option<Droplet> {
    let droplets = match platform.current_droplets(app).await {
        Ok(droplets) => droplets,
        Err(e) => {
            warn!("Unable to get droplet for app. App {} App GUID {} Error {:#}", app.name, app.id, e);
            return None;
        }
    };

    match <[Droplet; 1]>::try_from(droplets) {
        Ok([droplet]) => Some(droplet),
        Err(droplets) => {
            if droplets.len() > 1 {
                warn!(app = %app.name, guid = %app.id, count = droplets.len(), "App has more than one current droplet");
            }
            None
        }
    }
}

/// The first buildpack used by `droplet` that changed in this run.
///
/// Names match exactly; an empty name never matches.
pub fn matching_buildpack<'a>(
    droplet: &Droplet,
    changed: &'a HashMap<String, Buildpack>,
) -> Option<&'a Buildpack> {
    droplet
        .buildpacks
        .iter()
        .filter(|used| !used.name.is_empty())
        .find_map(|used| changed.get(&used.name))
}

/// Whether `buildpack` was updated strictly after `droplet` was created.
pub fn is_droplet_outdated(droplet: &Droplet, buildpack: &Buildpack) -> Result<bool, NotifierError> {
    let restaged_at = parse_timestamp(&format!("droplet {} created_at", droplet.id), &droplet.created_at)?;
    let buildpack_updated_at = parse_timestamp(
        &format!("buildpack {} ({}) updated_at", buildpack.name, buildpack.id),
        &buildpack.updated_at,
    )?;
    Ok(buildpack_updated_at > restaged_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildpack::index_by_name;
    use crate::models::{AppState, DropletBuildpack};
    use crate::test_utils::{FakePlatform, fixtures};

    fn droplet(created_at: &str, buildpacks: &[&str]) -> Droplet {
        Droplet {
            id: "droplet-1".to_string(),
            created_at: created_at.to_string(),
            buildpacks: buildpacks
                .iter()
                .map(|name| DropletBuildpack {
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_outdated_when_buildpack_newer() {
        let bp = fixtures::buildpack("bp-1", "python_buildpack", "2020-06-01T00:00:00Z");
        assert!(is_droplet_outdated(&droplet("2020-01-01T00:00:00Z", &[]), &bp).unwrap());
    }

    #[test]
    fn test_not_outdated_when_droplet_newer_or_equal() {
        let bp = fixtures::buildpack("bp-1", "python_buildpack", "2020-01-01T00:00:00Z");
        assert!(!is_droplet_outdated(&droplet("2020-06-01T00:00:00Z", &[]), &bp).unwrap());
        assert!(!is_droplet_outdated(&droplet("2020-01-01T00:00:00Z", &[]), &bp).unwrap());
    }

    #[test]
    fn test_outdated_check_rejects_bad_droplet_timestamp() {
        let bp = fixtures::buildpack("bp-1", "python_buildpack", "2020-01-01T00:00:00Z");
        let err = is_droplet_outdated(&droplet("last tuesday", &[]), &bp).unwrap_err();
        assert!(matches!(err, NotifierError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_matching_buildpack_exact_and_nonempty() {
        let mut changed = index_by_name(vec![fixtures::buildpack(
            "bp-1",
            "python_buildpack",
            "2020-06-01T00:00:00Z",
        )]);
        changed.insert(String::new(), fixtures::buildpack("bp-x", "", "2020-06-01T00:00:00Z"));

        assert!(matching_buildpack(&droplet("2020-01-01T00:00:00Z", &[""]), &changed).is_none());
        assert!(matching_buildpack(&droplet("2020-01-01T00:00:00Z", &["Python_buildpack"]), &changed).is_none());
        let found =
            matching_buildpack(&droplet("2020-01-01T00:00:00Z", &["", "python_buildpack"]), &changed).unwrap();
        assert_eq!(found.id, "bp-1");
    }

    #[tokio::test]
    async fn test_find_outdated_apps_end_to_end() {
        let platform = FakePlatform::new()
            .with_app(fixtures::started_app("app-1", "web", "space-1"))
            .with_current_droplet("app-1", fixtures::droplet("d1", "2020-01-01T00:00:00Z", "python_buildpack"))
            .with_app(fixtures::started_app("app-2", "fresh", "space-1"))
            .with_current_droplet("app-2", fixtures::droplet("d2", "2020-07-01T00:00:00Z", "python_buildpack"))
            .with_app(fixtures::started_app("app-3", "other-bp", "space-1"))
            .with_current_droplet("app-3", fixtures::droplet("d3", "2020-01-01T00:00:00Z", "java_buildpack"));

        let mut python = fixtures::buildpack("bp-1", "python_buildpack", "2020-06-01T00:00:00Z");
        python.filename = "python_buildpack-cflinuxfs3-v1.7.43.zip".to_string();
        let changed = index_by_name(vec![python]);

        let outdated = find_outdated_apps(&platform, &platform.apps(), &changed).await.unwrap();
        let ids: Vec<_> = outdated.apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["app-1"]);
        assert_eq!(outdated.releases.len(), 1);
        assert_eq!(outdated.releases[0].version, "v1.7.43");
        assert_eq!(
            outdated.releases[0].url,
            "https://github.com/cloudfoundry/python-buildpack/releases/tag/v1.7.43"
        );
    }

    #[tokio::test]
    async fn test_skips_stopped_and_ambiguous_apps() {
        let mut stopped = fixtures::started_app("app-1", "stopped", "space-1");
        stopped.state = AppState::Other("STOPPED".to_string());

        let platform = FakePlatform::new()
            .with_app(stopped)
            .with_current_droplet("app-1", fixtures::droplet("d1", "2020-01-01T00:00:00Z", "go_buildpack"))
            // No current droplet at all
            .with_app(fixtures::started_app("app-2", "none", "space-1"))
            // Two current droplets
            .with_app(fixtures::started_app("app-3", "two", "space-1"))
            .with_current_droplet("app-3", fixtures::droplet("d3a", "2020-01-01T00:00:00Z", "go_buildpack"))
            .with_current_droplet("app-3", fixtures::droplet("d3b", "2020-01-01T00:00:00Z", "go_buildpack"));

        let changed = index_by_name(vec![fixtures::buildpack("bp-1", "go_buildpack", "2020-06-01T00:00:00Z")]);

        let outdated = find_outdated_apps(&platform, &platform.apps(), &changed).await.unwrap();
        assert!(outdated.apps.is_empty());
        assert!(outdated.releases.is_empty());
        // Stopped apps never reach the droplet lookup
        assert!(!platform.droplet_lookups().contains(&"app-1".to_string()));
    }

    #[tokio::test]
    async fn test_droplet_fetch_error_skips_only_that_app() {
        let platform = FakePlatform::new()
            .with_app(fixtures::started_app("app-1", "broken", "space-1"))
            .with_droplet_error("app-1")
            .with_app(fixtures::started_app("app-2", "web", "space-1"))
            .with_current_droplet("app-2", fixtures::droplet("d2", "2020-01-01T00:00:00Z", "go_buildpack"));

        let changed = index_by_name(vec![fixtures::buildpack("bp-1", "go_buildpack", "2020-06-01T00:00:00Z")]);

        let outdated = find_outdated_apps(&platform, &platform.apps(), &changed).await.unwrap();
        let ids: Vec<_> = outdated.apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["app-2"]);
    }

    #[tokio::test]
    async fn test_release_per_outdated_app_not_deduplicated() {
        let platform = FakePlatform::new()
            .with_app(fixtures::started_app("app-1", "a", "space-1"))
            .with_current_droplet("app-1", fixtures::droplet("d1", "2020-01-01T00:00:00Z", "go_buildpack"))
            .with_app(fixtures::started_app("app-2", "b", "space-2"))
            .with_current_droplet("app-2", fixtures::droplet("d2", "2020-01-01T00:00:00Z", "go_buildpack"));

        let changed = index_by_name(vec![fixtures::buildpack("bp-1", "go_buildpack", "2020-06-01T00:00:00Z")]);

        let outdated = find_outdated_apps(&platform, &platform.apps(), &changed).await.unwrap();
        assert_eq!(outdated.apps.len(), 2);
        assert_eq!(outdated.releases.len(), 2);
        assert_eq!(outdated.releases[0], outdated.releases[1]);
    }

    #[tokio::test]
    async fn test_bad_droplet_timestamp_aborts() {
        let platform = FakePlatform::new()
            .with_app(fixtures::started_app("app-1", "web", "space-1"))
            .with_current_droplet("app-1", fixtures::droplet("d1", "not a time", "go_buildpack"));

        let changed = index_by_name(vec![fixtures::buildpack("bp-1", "go_buildpack", "2020-06-01T00:00:00Z")]);

        let err = find_outdated_apps(&platform, &platform.apps(), &changed).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<NotifierError>(), Some(NotifierError::InvalidTimestamp { .. })));
    }
}
