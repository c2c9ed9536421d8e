//! Response shapes of the Cloud Foundry API endpoints used by [`super::CfClient`].
//!
//! Only the fields the run needs are declared; everything else is ignored.

use serde::Deserialize;

use crate::models::{AppState, Application, Buildpack, Droplet, DropletBuildpack, Space, SpaceRole};

#[derive(Debug, Deserialize)]
pub(super) struct InfoResponse {
    pub token_endpoint: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
}

// v2 envelopes

#[derive(Debug, Deserialize)]
pub(super) struct V2Page<T> {
    pub next_url: Option<String>,
    #[serde(default = "Vec::new")]
    pub resources: Vec<V2Resource<T>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct V2Resource<T> {
    pub metadata: V2Metadata,
    pub entity: T,
}

#[derive(Debug, Deserialize)]
pub(super) struct V2Metadata {
    pub guid: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BuildpackEntity {
    pub name: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SpaceEntity {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserRolesEntity {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub space_roles: Vec<String>,
}

impl From<V2Resource<BuildpackEntity>> for Buildpack {
    fn from(resource: V2Resource<BuildpackEntity>) -> Self {
        Self {
            id: resource.metadata.guid,
            name: resource.entity.name,
            updated_at: resource.metadata.updated_at.unwrap_or_default(),
            filename: resource.entity.filename.unwrap_or_default(),
        }
    }
}

impl From<V2Resource<SpaceEntity>> for Space {
    fn from(resource: V2Resource<SpaceEntity>) -> Self {
        Self {
            id: resource.metadata.guid,
            name: resource.entity.name,
        }
    }
}

impl From<V2Resource<UserRolesEntity>> for SpaceRole {
    fn from(resource: V2Resource<UserRolesEntity>) -> Self {
        Self {
            user_id: resource.metadata.guid,
            username: resource.entity.username.unwrap_or_default(),
            roles: resource.entity.space_roles,
        }
    }
}

// v3 envelopes

#[derive(Debug, Deserialize)]
pub(super) struct V3Page<T> {
    #[serde(default)]
    pub pagination: Option<V3Pagination>,
    #[serde(default = "Vec::new")]
    pub resources: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct V3Pagination {
    #[serde(default)]
    pub next: Option<V3Link>,
}

#[derive(Debug, Deserialize)]
pub(super) struct V3Link {
    pub href: String,
}

impl<T> V3Page<T> {
    pub fn next_href(&self) -> Option<&str> {
        self.pagination.as_ref()?.next.as_ref().map(|link| link.href.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct V3App {
    pub guid: String,
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub relationships: Option<V3AppRelationships>,
}

#[derive(Debug, Deserialize)]
pub(super) struct V3AppRelationships {
    pub space: V3ToOne,
}

#[derive(Debug, Deserialize)]
pub(super) struct V3ToOne {
    pub data: Option<V3Guid>,
}

#[derive(Debug, Deserialize)]
pub(super) struct V3Guid {
    pub guid: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct V3Droplet {
    pub guid: String,
    pub created_at: String,
    #[serde(default)]
    pub buildpacks: Option<Vec<V3DropletBuildpack>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct V3DropletBuildpack {
    #[serde(default)]
    pub name: Option<String>,
}

impl From<V3App> for Application {
    fn from(app: V3App) -> Self {
        let space_id = app
            .relationships
            .and_then(|r| r.space.data)
            .map(|data| data.guid)
            .unwrap_or_default();
        Self {
            id: app.guid,
            name: app.name,
            state: AppState::from_platform(&app.state),
            space_id,
        }
    }
}

impl From<V3Droplet> for Droplet {
    fn from(droplet: V3Droplet) -> Self {
        Self {
            id: droplet.guid,
            created_at: droplet.created_at,
            buildpacks: droplet
                .buildpacks
                .unwrap_or_default()
                .into_iter()
                .map(|bp| DropletBuildpack {
                    name: bp.name.unwrap_or_default(),
                })
                .collect(),
        }
    }
}
