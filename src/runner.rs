//! The batch pass.
//!
//! [`run`] builds the production collaborators from [`Config`] and hands them
//! to [`notify_outdated_apps`], which does the actual work:
//!
//! 1. list applications and buildpacks
//! 2. keep the buildpacks that changed since the last run
//! 3. find running applications staged before those changes
//! 4. group them by owner and send one message per owner
//! 5. persist the advanced state (or copy it unchanged in a dry run)
//!
//! Any step failing before dispatch aborts the run without writing state, so
//! the next run repeats the same detection.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::buildpack::{filter_updated_buildpacks, index_by_name};
use crate::config::{Config, RunConfig};
use crate::detector::find_outdated_apps;
use crate::notify::{Mailer, SmtpMailer, Templates, send_notify_email_to_users};
use crate::owners::find_owners_of_apps;
use crate::platform::{CfClient, Platform};
use crate::state::{BuildpackState, copy_state, load_state, save_state};

/// Counts from one pass, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub changed_buildpacks: usize,
    pub outdated_apps: usize,
    pub owners: usize,
    pub notified: usize,
}

/// Run one pass against the configured platform and mail server.
pub async fn run(config: &Config) -> Result<RunSummary> {
    if config.run.dry_run {
        info!("Running in dry-run mode: no e-mails will be sent and state will not be advanced");
    }

    let state = load_state(&config.run.in_state)?;
    let templates = Templates::new()?;
    let platform = CfClient::connect(&config.cf_api).await?;
    let mailer = SmtpMailer::new(&config.email)?;

    notify_outdated_apps(&config.run, state, &platform, &mailer, &templates).await
}

/// Detect outdated applications, notify their owners and persist state.
///
/// `state` is the content of `run.in_state`; it is advanced in memory by the
/// change filter and written to `run.out_state` only after dispatch.
pub async fn notify_outdated_apps<P: Platform, M: Mailer>(
    run: &RunConfig,
    mut state: BuildpackState,
    platform: &P,
    mailer: &M,
    templates: &Templates,
) -> Result<RunSummary> {
    let apps = platform.list_apps().await.context("Unable to list applications")?;
    let buildpacks = platform.list_buildpacks().await.context("Unable to list buildpacks")?;
    debug!(apps = apps.len(), buildpacks = buildpacks.len(), "Fetched platform inventory");

    info!("Calculating notifications...");
    let changed = filter_updated_buildpacks(buildpacks, &mut state)?;
    let changed_buildpacks = changed.len();
    let changed = index_by_name(changed);

    let outdated = find_outdated_apps(platform, &apps, &changed).await?;
    let owners = find_owners_of_apps(platform, &outdated.apps).await?;
    info!("Will notify {} owners of outdated apps.", owners.len());

    let notified = send_notify_email_to_users(&owners, &outdated.releases, templates, mailer, run.dry_run).await;

    if run.dry_run {
        copy_state(&run.in_state, &run.out_state)?;
    } else {
        save_state(&state, &run.out_state)?;
    }

    let summary = RunSummary {
        changed_buildpacks,
        outdated_apps: outdated.apps.len(),
        owners: owners.len(),
        notified,
    };
    debug!(?summary, "Run complete");
    Ok(summary)
}
