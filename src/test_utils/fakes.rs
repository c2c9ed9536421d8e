//! In-memory [`Platform`] and [`Mailer`] implementations.

use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::models::{Application, Buildpack, Droplet, Space, SpaceRole};
use crate::notify::Mailer;
use crate::platform::Platform;

/// Platform served from memory.
///
/// Built with the `with_*` methods; lookups are recorded so tests can assert
/// on caching behaviour.
#[derive(Default)]
pub struct FakePlatform {
    apps: Vec<Application>,
    buildpacks: Vec<Buildpack>,
    droplets: HashMap<String, Vec<Droplet>>,
    spaces: HashMap<String, Space>,
    roles: HashMap<String, Vec<SpaceRole>>,
    failing_droplets: HashSet<String>,
    failing_spaces: HashSet<String>,
    failing_roles: HashSet<String>,
    fail_listing: bool,
    droplet_lookups: Mutex<Vec<String>>,
    space_lookups: Mutex<Vec<String>>,
    role_lookups: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app(mut self, app: Application) -> Self {
        self.apps.push(app);
        self
    }

    pub fn with_buildpack(mut self, buildpack: Buildpack) -> Self {
        self.buildpacks.push(buildpack);
        self
    }

    /// Add a current droplet for `app_id`; call twice for an ambiguous app.
    pub fn with_current_droplet(mut self, app_id: &str, droplet: Droplet) -> Self {
        self.droplets.entry(app_id.to_string()).or_default().push(droplet);
        self
    }

    pub fn with_droplet_error(mut self, app_id: &str) -> Self {
        self.failing_droplets.insert(app_id.to_string());
        self
    }

    /// Name a space; unnamed spaces are served with their id as name.
    pub fn with_space(mut self, id: &str, name: &str) -> Self {
        self.spaces.insert(
            id.to_string(),
            Space {
                id: id.to_string(),
                name: name.to_string(),
            },
        );
        self
    }

    pub fn with_space_roles(mut self, space_id: &str, roles: Vec<SpaceRole>) -> Self {
        self.roles.entry(space_id.to_string()).or_default().extend(roles);
        self
    }

    pub fn with_space_error(mut self, space_id: &str) -> Self {
        self.failing_spaces.insert(space_id.to_string());
        self
    }

    pub fn with_roles_error(mut self, space_id: &str) -> Self {
        self.failing_roles.insert(space_id.to_string());
        self
    }

    /// Make both bulk listings fail.
    pub fn with_listing_error(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// The configured applications.
    pub fn apps(&self) -> Vec<Application> {
        self.apps.clone()
    }

    /// App ids whose droplets were requested, in call order.
    pub fn droplet_lookups(&self) -> Vec<String> {
        lock(&self.droplet_lookups).clone()
    }

    /// Space ids that were fetched, in call order.
    pub fn space_lookups(&self) -> Vec<String> {
        lock(&self.space_lookups).clone()
    }

    /// Space ids whose roles were fetched, in call order.
    pub fn role_lookups(&self) -> Vec<String> {
        lock(&self.role_lookups).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl Platform for FakePlatform {
    async fn list_apps(&self) -> Result<Vec<Application>> {
        if self.fail_listing {
            return Err(anyhow!("listing apps failed"));
        }
        Ok(self.apps.clone())
    }

    async fn list_buildpacks(&self) -> Result<Vec<Buildpack>> {
        if self.fail_listing {
            return Err(anyhow!("listing buildpacks failed"));
        }
        Ok(self.buildpacks.clone())
    }

    async fn current_droplets(&self, app: &Application) -> Result<Vec<Droplet>> {
        lock(&self.droplet_lookups).push(app.id.clone());
        if self.failing_droplets.contains(&app.id) {
            return Err(anyhow!("droplet lookup failed for {}", app.id));
        }
        Ok(self.droplets.get(&app.id).cloned().unwrap_or_default())
    }

    async fn space(&self, space_id: &str) -> Result<Space> {
        lock(&self.space_lookups).push(space_id.to_string());
        if self.failing_spaces.contains(space_id) {
            return Err(anyhow!("space lookup failed for {space_id}"));
        }
        Ok(self.spaces.get(space_id).cloned().unwrap_or_else(|| Space {
            id: space_id.to_string(),
            name: space_id.to_string(),
        }))
    }

    async fn space_roles(&self, space: &Space) -> Result<Vec<SpaceRole>> {
        lock(&self.role_lookups).push(space.id.clone());
        if self.failing_roles.contains(&space.id) {
            return Err(anyhow!("role lookup failed for {}", space.id));
        }
        Ok(self.roles.get(&space.id).cloned().unwrap_or_default())
    }
}

/// A message captured by [`RecordingMailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that records messages instead of sending them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    rejected: HashSet<String>,
    attempts: Mutex<usize>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send to `recipient`.
    pub fn rejecting(mut self, recipient: &str) -> Self {
        self.rejected.insert(recipient.to_string());
        self
    }

    /// Successfully sent messages, in send order.
    pub fn sent(&self) -> Vec<SentEmail> {
        lock(&self.sent).clone()
    }

    /// Number of send calls, including rejected ones.
    pub fn attempts(&self) -> usize {
        *lock(&self.attempts)
    }
}

impl Mailer for RecordingMailer {
    async fn send_email(&self, recipient: &str, subject: &str, body: &[u8]) -> Result<()> {
        *lock(&self.attempts) += 1;
        if self.rejected.contains(recipient) {
            return Err(anyhow!("550 mailbox unavailable: {recipient}"));
        }
        lock(&self.sent).push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: String::from_utf8_lossy(body).into_owned(),
        });
        Ok(())
    }
}
