//! Cloud Foundry API client.
//!
//! Authenticates once with the UAA client-credentials grant and then issues
//! plain GET requests with a bearer token. Every request shares a fixed
//! overall timeout ([`PLATFORM_REQUEST_TIMEOUT`]) and nothing is retried.
//!
//! Endpoints used:
//!
//! | Operation | Endpoint |
//! |---|---|
//! | discover UAA | `GET /v2/info` |
//! | token | `POST {token_endpoint}/oauth/token` |
//! | applications | `GET /v3/apps` (paginated) |
//! | buildpacks | `GET /v2/buildpacks` (paginated) |
//! | current droplet | `GET /v3/apps/{guid}/droplets?current=true` |
//! | space | `GET /v2/spaces/{guid}` |
//! | space roles | `GET /v2/spaces/{guid}/user_roles` (paginated) |

use anyhow::Result;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::Platform;
use super::wire::{
    BuildpackEntity, InfoResponse, SpaceEntity, TokenResponse, UserRolesEntity, V2Page,
    V2Resource, V3App, V3Droplet, V3Page,
};
use crate::config::CfApiConfig;
use crate::constants::{PLATFORM_REQUEST_TIMEOUT, V3_PAGE_SIZE};
use crate::core::NotifierError;
use crate::models::{Application, Buildpack, Droplet, Space, SpaceRole};

/// Authenticated Cloud Foundry API client.
pub struct CfClient {
    http: reqwest::Client,
    /// API base URL without a trailing slash.
    api: String,
    token: String,
}

impl CfClient {
    /// Build the HTTP client and obtain an access token.
    ///
    /// Any failure here is fatal for the run.
    pub async fn connect(config: &CfApiConfig) -> Result<Self, NotifierError> {
        if !(config.api.starts_with("http://") || config.api.starts_with("https://")) {
            return Err(NotifierError::ConfigError {
                message: format!("CF_API must be an http(s) URL, got '{}'", config.api),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(PLATFORM_REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(config.insecure)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NotifierError::PlatformAuth {
                reason: format!("unable to build HTTP client: {e}"),
            })?;
        let api = config.api.trim_end_matches('/').to_string();

        let info: InfoResponse = http
            .get(format!("{api}/v2/info"))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| NotifierError::PlatformAuth {
                reason: format!("unable to discover token endpoint: {e}"),
            })?
            .json()
            .await
            .map_err(|e| NotifierError::PlatformAuth {
                reason: format!("invalid /v2/info response: {e}"),
            })?;

        let token_url = format!("{}/oauth/token", info.token_endpoint.trim_end_matches('/'));
        debug!(token_url = %token_url, "Requesting client credentials token");

        let token: TokenResponse = http
            .post(&token_url)
            .header(ACCEPT, "application/json")
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| NotifierError::PlatformAuth {
                reason: e.to_string(),
            })?
            .json()
            .await
            .map_err(|e| NotifierError::PlatformAuth {
                reason: format!("invalid token response: {e}"),
            })?;

        Ok(Self {
            http,
            api,
            token: token.access_token,
        })
    }

    /// Resolve a pagination link: v2 returns paths, v3 returns absolute URLs.
    fn absolute(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.api, href)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, url: &str) -> Result<T, NotifierError> {
        debug!(url, "GET");
        let request_error = |reason: String| NotifierError::PlatformRequest {
            operation: operation.to_string(),
            reason,
        };

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| request_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(request_error(format!("HTTP {status}: {body}")));
        }

        response.json().await.map_err(|e| request_error(format!("invalid response body: {e}")))
    }

    async fn get_all_v2<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
    ) -> Result<Vec<V2Resource<T>>, NotifierError> {
        let mut resources = Vec::new();
        let mut next = Some(path.to_string());

        while let Some(href) = next {
            let page: V2Page<T> = self.get_json(operation, &self.absolute(&href)).await?;
            resources.extend(page.resources);
            next = page.next_url;
        }

        Ok(resources)
    }

    async fn get_all_v3<T: DeserializeOwned>(&self, operation: &str, path: &str) -> Result<Vec<T>, NotifierError> {
        let mut resources = Vec::new();
        let mut next = Some(self.absolute(path));

        while let Some(url) = next {
            let page: V3Page<T> = self.get_json(operation, &url).await?;
            next = page.next_href().map(|href| self.absolute(href));
            resources.extend(page.resources);
        }

        Ok(resources)
    }
}

impl Platform for CfClient {
    async fn list_apps(&self) -> Result<Vec<Application>> {
        let apps: Vec<V3App> = self
            .get_all_v3("list apps", &format!("/v3/apps?per_page={V3_PAGE_SIZE}"))
            .await?;
        Ok(apps.into_iter().map(Application::from).collect())
    }

    async fn list_buildpacks(&self) -> Result<Vec<Buildpack>> {
        let buildpacks: Vec<V2Resource<BuildpackEntity>> =
            self.get_all_v2("list buildpacks", "/v2/buildpacks").await?;
        Ok(buildpacks.into_iter().map(Buildpack::from).collect())
    }

    async fn current_droplets(&self, app: &Application) -> Result<Vec<Droplet>> {
        let url = self.absolute(&format!("/v3/apps/{}/droplets?current=true", app.id));
        let page: V3Page<V3Droplet> = self.get_json("get current droplet", &url).await?;
        Ok(page.resources.into_iter().map(Droplet::from).collect())
    }

    async fn space(&self, space_id: &str) -> Result<Space> {
        let url = self.absolute(&format!("/v2/spaces/{space_id}"));
        let space: V2Resource<SpaceEntity> = self.get_json("get space", &url).await?;
        Ok(Space::from(space))
    }

    async fn space_roles(&self, space: &Space) -> Result<Vec<SpaceRole>> {
        let roles: Vec<V2Resource<UserRolesEntity>> = self
            .get_all_v2("list space roles", &format!("/v2/spaces/{}/user_roles", space.id))
            .await?;
        Ok(roles.into_iter().map(SpaceRole::from).collect())
    }
}
