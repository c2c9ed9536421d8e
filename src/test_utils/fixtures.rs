//! Small constructors for model values used across tests.

use crate::models::{AppState, Application, Buildpack, Droplet, DropletBuildpack, SpaceRole};

/// A buildpack whose filename follows `<name>-cflinuxfs3-v1.0.0.zip`.
pub fn buildpack(id: &str, name: &str, updated_at: &str) -> Buildpack {
    Buildpack {
        id: id.to_string(),
        name: name.to_string(),
        updated_at: updated_at.to_string(),
        filename: format!("{name}-cflinuxfs3-v1.0.0.zip"),
    }
}

/// A running application in `space_id`.
pub fn started_app(id: &str, name: &str, space_id: &str) -> Application {
    Application {
        id: id.to_string(),
        name: name.to_string(),
        state: AppState::Started,
        space_id: space_id.to_string(),
    }
}

/// A droplet staged with a single buildpack.
pub fn droplet(id: &str, created_at: &str, buildpack_name: &str) -> Droplet {
    Droplet {
        id: id.to_string(),
        created_at: created_at.to_string(),
        buildpacks: vec![DropletBuildpack {
            name: buildpack_name.to_string(),
        }],
    }
}

/// A space role assignment.
pub fn role(user_id: &str, username: &str, roles: &[&str]) -> SpaceRole {
    SpaceRole {
        user_id: user_id.to_string(),
        username: username.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}
