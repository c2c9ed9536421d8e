//! Owner notification.
//!
//! One e-mail per owner, listing every outdated application they own. The
//! dispatcher renders through [`Templates`] and sends through any [`Mailer`];
//! a failure for one recipient is logged and never stops the others.
//!
//! In a dry run messages are rendered but not handed to the mailer, and the
//! log reads exactly as it would for a real run.

pub mod mailer;
pub mod templates;

pub use mailer::{Mailer, SmtpMailer};
pub use templates::{NotifyEmail, Templates};

use tracing::{debug, info, warn};

use crate::constants::NOTIFY_SUBJECT;
use crate::models::BuildpackReleaseInfo;
use crate::owners::OwnerApps;

/// Subject line for a message about `app_count` applications.
pub fn subject_for(app_count: usize) -> String {
    if app_count > 1 {
        format!("{NOTIFY_SUBJECT}s")
    } else {
        NOTIFY_SUBJECT.to_string()
    }
}

/// Notify every owner in `owners` about their outdated applications.
///
/// `releases` is rendered into every message unchanged. Returns the number of
/// owners notified (or, in a dry run, who would have been).
pub async fn send_notify_email_to_users<M: Mailer>(
    owners: &OwnerApps,
    releases: &[BuildpackReleaseInfo],
    templates: &Templates,
    mailer: &M,
    dry_run: bool,
) -> usize {
    let mut notified = 0;

    for (user, apps) in owners {
        let email = NotifyEmail {
            user,
            apps,
            is_multiple_app: apps.len() > 1,
            updated_buildpacks: releases,
        };
        let body = match templates.render_notify_email(&email) {
            Ok(body) => body,
            Err(e) => {
                warn!("Unable to render e-mail for {}: {}", user, e);
                continue;
            }
        };
        let subject = subject_for(apps.len());

        if dry_run {
            debug!(recipient = %user, subject = %subject, bytes = body.len(), "Dry run, not sending");
        } else if let Err(e) = mailer.send_email(user, &subject, &body).await {
            warn!("Unable to send e-mail to {}: {:#}", user, e);
            continue;
        }

        info!("Sent e-mail to {}", user);
        notified += 1;
    }

    notified
}
