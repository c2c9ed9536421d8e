//! Mapping outdated applications to the people who should hear about them.
//!
//! An owner is a user with an e-mail username holding one of
//! [`OWNER_ROLES`] in the application's space. Space role lists are fetched
//! at most once per space per run through [`SpaceCache`].
//!
//! Failing to resolve a space is fatal: skipping it would silently leave its
//! owners un-notified.

use anyhow::{Context, Result};
use lettre::message::Mailbox;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::constants::OWNER_ROLES;
use crate::models::{Application, SpaceRole};
use crate::platform::Platform;

/// Owner username to the outdated applications they own, ordered by username.
pub type OwnerApps = BTreeMap<String, Vec<Application>>;

/// Whether `username` parses as an e-mail address (`a@b.c` or `Name <a@b.c>`).
pub fn is_valid_email(username: &str) -> bool {
    username.parse::<Mailbox>().is_ok()
}

/// Per-run cache of resolved owners, keyed by space id.
///
/// Populated lazily by [`SpaceCache::owners_in_space`]; entries are never
/// evicted since the cache lives for a single run.
#[derive(Debug, Default)]
pub struct SpaceCache {
    owners_by_space: HashMap<String, Vec<SpaceRole>>,
}

impl SpaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owners of the space containing `app`, fetching them on first use.
    pub async fn owners_in_space<P: Platform>(
        &mut self,
        platform: &P,
        app: &Application,
    ) -> Result<&[SpaceRole]> {
        if !self.owners_by_space.contains_key(&app.space_id) {
            let owners = fetch_space_owners(platform, app).await?;
            self.owners_by_space.insert(app.space_id.clone(), owners);
        }
        Ok(self.owners_by_space.get(&app.space_id).map(Vec::as_slice).unwrap_or_default())
    }

    /// Number of spaces resolved so far.
    pub fn len(&self) -> usize {
        self.owners_by_space.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners_by_space.is_empty()
    }
}

async fn fetch_space_owners<P: Platform>(platform: &P, app: &Application) -> Result<Vec<SpaceRole>> {
    let space = platform
        .space(&app.space_id)
        .await
        .with_context(|| format!("Unable to get space of app {}", app.name))?;

    let roles = platform
        .space_roles(&space)
        .await
        .with_context(|| format!("Unable to get roles for all users in space {}", space.name))?;

    let mut owners: Vec<SpaceRole> = Vec::new();
    for role in roles {
        if !is_valid_email(&role.username) {
            info!(
                "Dropping notification to user {} about app {} in space {} because invalid e-mail address",
                role.username, app.name, app.space_id
            );
            continue;
        }
        if !role.has_any_role(OWNER_ROLES) {
            continue;
        }
        // One entry per user even if the API lists them twice
        if owners.iter().any(|owner| owner.user_id == role.user_id) {
            continue;
        }
        owners.push(role);
    }

    debug!(space = %space.name, guid = %space.id, owners = owners.len(), "Resolved space owners");
    Ok(owners)
}

/// Group `apps` by owner.
///
/// An application with several owners appears once in each owner's list; an
/// owner of several applications, in one space or many, gets them all in one
/// list in input order.
pub async fn find_owners_of_apps<P: Platform>(platform: &P, apps: &[Application]) -> Result<OwnerApps> {
    let mut owners = OwnerApps::new();
    let mut cache = SpaceCache::new();

    for app in apps {
        for owner in cache.owners_in_space(platform, app).await? {
            owners.entry(owner.username.clone()).or_default().push(app.clone());
        }
    }

    debug!(spaces = cache.len(), owners = owners.len(), "Grouped outdated apps by owner");
    Ok(owners)
}
