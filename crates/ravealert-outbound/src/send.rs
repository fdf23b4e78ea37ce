//! HTTP delivery of a built alert to a remote CAP inbound listener.

use ravealert_cap::{serialize_alert, Alert};
use ravealert_core::{ConfigError, OutboundConfig};
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SendError {
    /// Listener credentials are not configured
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The request could not be performed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The listener answered with a non-2xx status
    #[error("listener rejected alert: HTTP {status}")]
    Rejected { status: reqwest::StatusCode },
}

/// POSTs the serialized alert to `url` as `application/xml` under basic
/// authentication. Any non-2xx response is fatal; there are no retries.
pub async fn send_alert(
    alert: &Alert,
    url: &str,
    username: &str,
    password: &str,
) -> Result<(), SendError> {
    let body = serialize_alert(alert);
    info!(identifier = %alert.identifier, url, "sending CAP alert");
    debug!(body = %body, "serialized CAP alert");

    let response = reqwest::Client::new()
        .post(url)
        .header(CONTENT_TYPE, "application/xml")
        .basic_auth(username, Some(password))
        .body(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SendError::Rejected { status });
    }

    info!(identifier = %alert.identifier, %status, "alert delivered");
    Ok(())
}

/// Delivery using configured credentials; fails before any network activity
/// when the username or password is missing.
pub async fn send_with_config(alert: &Alert, outbound: &OutboundConfig) -> Result<(), SendError> {
    let (username, password) = outbound.credentials()?;
    send_alert(alert, &outbound.url, username, password).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_alert, BuildParams};

    #[tokio::test]
    async fn test_send_without_credentials_is_a_config_error() {
        let alert = build_alert(BuildParams::default());
        let outbound = OutboundConfig::default();

        let err = send_with_config(&alert, &outbound).await.unwrap_err();
        assert!(matches!(
            err,
            SendError::Config(ConfigError::MissingCredentials)
        ));
    }
}
