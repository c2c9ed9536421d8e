//! Shared data models for the notification run.
//!
//! Everything here is transient: fetched fresh from the platform on each run
//! and discarded after dispatch. Only [`crate::state::BuildpackRecord`] is
//! persisted between runs.
//!
//! Timestamps are carried as the raw strings the platform returns and parsed
//! with [`parse_timestamp`] at the point of comparison, so a malformed value
//! surfaces as a fatal [`NotifierError::InvalidTimestamp`] naming the object
//! it came from.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt;

use crate::constants::STARTED_STATE;
use crate::core::NotifierError;

/// A system buildpack as listed by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Buildpack {
    /// Stable unique identity (platform GUID).
    pub id: String,
    /// Buildpack name as referenced by droplets, e.g. `python_buildpack`.
    pub name: String,
    /// Last modification time of the buildpack artifact (RFC 3339).
    pub updated_at: String,
    /// Uploaded artifact name, e.g. `python_buildpack-cflinuxfs3-v1.7.43.zip`.
    pub filename: String,
}

/// Lifecycle state of an application.
///
/// Only [`AppState::Started`] applications are checked for staleness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// The application is running.
    Started,
    /// Any other platform state (`STOPPED`, ...), kept verbatim for logging.
    Other(String),
}

impl AppState {
    /// Map a platform state string onto [`AppState`].
    pub fn from_platform(state: &str) -> Self {
        if state == STARTED_STATE {
            Self::Started
        } else {
            Self::Other(state.to_string())
        }
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str(STARTED_STATE),
            Self::Other(state) => write!(f, "{state}"),
        }
    }
}

impl Serialize for AppState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An application deployed on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Application {
    pub id: String,
    pub name: String,
    pub state: AppState,
    /// Identity of the space that owns the application.
    pub space_id: String,
}

impl Application {
    /// Whether the application is running and therefore a staleness candidate.
    pub fn is_started(&self) -> bool {
        self.state == AppState::Started
    }
}

/// A buildpack reference recorded on a droplet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropletBuildpack {
    pub name: String,
}

/// A built artifact associated with an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Droplet {
    pub id: String,
    /// Creation time of the droplet (RFC 3339), i.e. the last restage.
    pub created_at: String,
    /// Buildpacks applied when staging, in detection order.
    pub buildpacks: Vec<DropletBuildpack>,
}

/// An organizational space grouping applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub id: String,
    pub name: String,
}

/// A user's role assignments within a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceRole {
    pub user_id: String,
    /// Login name; only syntactically valid e-mail addresses are notified.
    pub username: String,
    /// Role names such as `space_manager`, `space_developer`, `space_auditor`.
    pub roles: Vec<String>,
}

impl SpaceRole {
    /// Whether this user holds at least one of `roles`.
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.roles.iter().any(|role| roles.contains(&role.as_str()))
    }
}

/// Release information about an updated buildpack, rendered into notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildpackReleaseInfo {
    pub name: String,
    pub version: String,
    /// Release page for the version, the bare releases page, or empty if unknown.
    pub url: String,
}

/// Parse an RFC 3339 timestamp strictly.
///
/// `subject` describes where the value came from and is carried into the
/// error, e.g. `"buildpack 1f3c... updated_at"`.
pub fn parse_timestamp(subject: &str, value: &str) -> Result<DateTime<FixedOffset>, NotifierError> {
    DateTime::parse_from_rfc3339(value).map_err(|e| NotifierError::InvalidTimestamp {
        subject: subject.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
