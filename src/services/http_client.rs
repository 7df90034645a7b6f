use crate::constants::network::{TIMEOUT_CONNECTION_MS, TIMEOUT_UPSTREAM_MS, USER_AGENT};
use crate::errors::GatewayError;
use reqwest::Client;
use std::time::Duration;

/// One pooled client shared by every outbound call. Redirects are followed,
/// per-request timeouts may tighten the upstream ceiling.
pub fn build_client() -> Result<Client, GatewayError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_millis(TIMEOUT_CONNECTION_MS))
        .timeout(Duration::from_millis(TIMEOUT_UPSTREAM_MS))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|err| GatewayError::internal(format!("Failed to build HTTP client: {}", err)))
}
