//! Notification e-mail rendering with Tera.
//!
//! The template is compiled into the binary and registered once at startup,
//! so a broken template aborts the run before anything is fetched.

use serde::Serialize;
use std::error::Error as _;
use tera::{Context as TeraContext, Tera};

use crate::core::NotifierError;
use crate::models::{Application, BuildpackReleaseInfo};

const NOTIFY_EMAIL_TEMPLATE: &str = "notify_email.html";
const NOTIFY_EMAIL_SOURCE: &str = include_str!("../../templates/notify_email.html");

/// Values available to the notification template.
#[derive(Debug, Serialize)]
pub struct NotifyEmail<'a> {
    /// Recipient username (e-mail address).
    pub user: &'a str,
    /// The recipient's outdated applications.
    pub apps: &'a [Application],
    pub is_multiple_app: bool,
    pub updated_buildpacks: &'a [BuildpackReleaseInfo],
}

/// Compiled notification templates.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Compile the embedded templates. `.html` templates are auto-escaped.
    pub fn new() -> Result<Self, NotifierError> {
        let mut tera = Tera::default();
        tera.add_raw_template(NOTIFY_EMAIL_TEMPLATE, NOTIFY_EMAIL_SOURCE)
            .map_err(|e| NotifierError::Template {
                reason: error_chain(&e),
            })?;
        Ok(Self {
            tera,
        })
    }

    /// Render the notification body for one recipient.
    pub fn render_notify_email(&self, email: &NotifyEmail<'_>) -> Result<Vec<u8>, NotifierError> {
        let context = TeraContext::from_serialize(email).map_err(|e| NotifierError::Template {
            reason: error_chain(&e),
        })?;
        let body = self.tera.render(NOTIFY_EMAIL_TEMPLATE, &context).map_err(|e| {
            NotifierError::Template {
                reason: error_chain(&e),
            }
        })?;
        Ok(body.into_bytes())
    }
}

/// Tera reports the useful part of an error in its sources.
fn error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;

    fn release(name: &str, version: &str, url: &str) -> BuildpackReleaseInfo {
        BuildpackReleaseInfo {
            name: name.to_string(),
            version: version.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_render_lists_apps_and_releases() {
        let templates = Templates::new().unwrap();
        let apps = vec![
            fixtures::started_app("app-1", "web", "space-1"),
            fixtures::started_app("app-2", "worker", "space-2"),
        ];
        let releases = vec![release(
            "python_buildpack",
            "v1.7.43",
            "https://github.com/cloudfoundry/python-buildpack/releases/tag/v1.7.43",
        )];

        let body = templates
            .render_notify_email(&NotifyEmail {
                user: "dev@example.com",
                apps: &apps,
                is_multiple_app: true,
                updated_buildpacks: &releases,
            })
            .unwrap();
        let body = String::from_utf8(body).unwrap();

        assert!(body.contains("Hello dev@example.com"));
        assert!(body.contains("<strong>web</strong>"));
        assert!(body.contains("<strong>worker</strong>"));
        assert!(body.contains("the following applications, which are"));
        assert!(body.contains(
            r#"href="https://github.com/cloudfoundry/python-buildpack/releases/tag/v1.7.43""#
        ));
    }

    #[test]
    fn test_render_tolerates_missing_url() {
        let templates = Templates::new().unwrap();
        let apps = vec![fixtures::started_app("app-1", "web", "space-1")];
        let releases = vec![release("custom_buildpack", "", "")];

        let body = templates
            .render_notify_email(&NotifyEmail {
                user: "dev@example.com",
                apps: &apps,
                is_multiple_app: false,
                updated_buildpacks: &releases,
            })
            .unwrap();
        let body = String::from_utf8(body).unwrap();

        assert!(body.contains("custom_buildpack"));
        assert!(!body.contains("release notes"));
        assert!(body.contains("the following application, which is"));
    }

    #[test]
    fn test_render_escapes_app_names() {
        let templates = Templates::new().unwrap();
        let apps = vec![fixtures::started_app("app-1", "<script>", "space-1")];

        let body = templates
            .render_notify_email(&NotifyEmail {
                user: "dev@example.com",
                apps: &apps,
                is_multiple_app: false,
                updated_buildpacks: &[],
            })
            .unwrap();
        let body = String::from_utf8(body).unwrap();
        assert!(!body.contains("<strong><script></strong>"));
        assert!(body.contains("&lt;script&gt;"));
    }
}
