//! Constants shared across modules.

use std::time::Duration;

/// Overall timeout applied to every platform API request (30 seconds).
///
/// This is the only timeout in the run; there are no retries.
pub const PLATFORM_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size requested from paginated v3 endpoints.
pub const V3_PAGE_SIZE: u32 = 100;

/// Space roles that make a user an owner of the applications in that space.
pub const OWNER_ROLES: &[&str] = &["space_manager", "space_developer"];

/// Application state that marks an app as running.
pub const STARTED_STATE: &str = "STARTED";

/// Subject line for a single outdated application; pluralized with a trailing `s`.
pub const NOTIFY_SUBJECT: &str = "Action required: restage your application";
