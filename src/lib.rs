//! buildpack-notify - outdated buildpack notifier for Cloud Foundry
//!
//! When platform operators upgrade a system buildpack, applications staged
//! with the previous version keep running the old artifact until they are
//! restaged. This crate finds those applications and e-mails the people who
//! can restage them.
//!
//! # How a run works
//!
//! A run is a single batch pass (see [`runner`]):
//!
//! 1. Load the state file recording the last buildpack update acted on
//! 2. List applications and buildpacks from the platform API
//! 3. Keep buildpacks whose `updated_at` moved past the recorded value
//!    ([`buildpack::filter_updated_buildpacks`])
//! 4. For each running application, compare its current droplet's creation
//!    time against the update time of the changed buildpack it was staged
//!    with ([`detector`])
//! 5. Resolve Space Managers and Space Developers of outdated applications
//!    ([`owners`])
//! 6. Send each owner one HTML e-mail listing all of their outdated
//!    applications ([`notify`])
//! 7. Write the advanced state, or copy the input state unchanged in a dry run
//!
//! Because state only advances past updates that were acted on, running the
//! program again with the same platform inventory sends nothing.
//!
//! # Modules
//!
//! ## Detection
//! - [`buildpack`] - change filter and release-note URL resolution
//! - [`detector`] - outdated application detection
//! - [`owners`] - space role owner resolution
//! - [`notify`] - e-mail rendering and dispatch
//!
//! ## Collaborators
//! - [`platform`] - platform API trait and HTTP client
//! - [`state`] - state file load, save and copy
//!
//! ## Supporting Modules
//! - [`cli`] - command-line entry point and logging setup
//! - [`config`] - environment-sourced configuration
//! - [`core`] - error types and user-facing error reporting
//! - [`models`] - shared data models
//! - [`utils`] - atomic file writes

pub mod buildpack;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod detector;
pub mod models;
pub mod notify;
pub mod owners;
pub mod platform;
pub mod runner;
pub mod state;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
