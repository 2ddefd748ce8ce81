//! Client configuration constants.

use std::time::Duration;

/// Default server the client talks to.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3001";

/// Per-request timeout for the HTTP store. A request that exceeds it fails
/// as `Unavailable`, which reverts the commit it belonged to.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Snapshots kept by the history manager before the oldest is evicted.
pub const MAX_HISTORY: usize = 50;
