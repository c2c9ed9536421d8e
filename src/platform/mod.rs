//! Platform API collaborator.
//!
//! The detection engine only depends on the [`Platform`] trait. [`CfClient`]
//! implements it against the Cloud Foundry v2/v3 API; tests substitute the
//! in-memory fake from [`crate::test_utils`].
//!
//! Failure semantics belong to the caller: listing and space lookups abort the
//! run, a failed droplet fetch only skips one application.

pub mod cf;
mod wire;

pub use cf::CfClient;

use anyhow::Result;

use crate::models::{Application, Buildpack, Droplet, Space, SpaceRole};

/// Read-only view of the platform needed for one notification run.
#[allow(async_fn_in_trait)]
pub trait Platform {
    /// All applications, in any state.
    async fn list_apps(&self) -> Result<Vec<Application>>;

    /// All buildpacks with identity, name, update time and filename.
    async fn list_buildpacks(&self) -> Result<Vec<Buildpack>>;

    /// Droplets of `app` filtered by `current=true`.
    ///
    /// Normally zero or one; the caller decides what other counts mean.
    async fn current_droplets(&self, app: &Application) -> Result<Vec<Droplet>>;

    /// The space with the given identity.
    async fn space(&self, space_id: &str) -> Result<Space>;

    /// Every user's role assignments in `space`.
    async fn space_roles(&self, space: &Space) -> Result<Vec<SpaceRole>>;
}
