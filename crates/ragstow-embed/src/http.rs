//! Shared HTTP client construction for consistent timeout and TLS configuration.

use std::time::Duration;

/// Build an HTTP client with the given request timeout.
///
/// Config: 10s connect timeout, caller-supplied request timeout, rustls TLS,
/// `ragstow/{version}` user-agent, redirect limit 10.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn client_with_timeout(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .timeout(timeout)
        .user_agent(concat!("ragstow/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}
