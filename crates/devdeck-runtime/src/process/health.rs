//! Point-in-time HTTP health probe.
//!
//! Stateless on purpose: one request, one answer, no retries. Callers that
//! want continuous status poll it themselves.

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Probe `http://127.0.0.1:{port}{path}` once.
///
/// Healthy means the request completed within `timeout` with a 2xx status.
pub async fn probe_health(port: u16, path: &str, timeout: Duration) -> bool {
    let url = health_url(port, path);
    let client = match Client::builder().timeout(timeout).no_proxy().build() {
        Ok(client) => client,
        Err(e) => {
            debug!(error = %e, "Failed to build health check client");
            return false;
        }
    };

    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => true,
        Ok(response) => {
            debug!(%url, status = %response.status(), "Health check returned non-success status");
            false
        }
        Err(e) => {
            debug!(%url, error = %e, "Health check request failed");
            false
        }
    }
}

fn health_url(port: u16, path: &str) -> String {
    if path.starts_with('/') {
        format!("http://127.0.0.1:{port}{path}")
    } else {
        format!("http://127.0.0.1:{port}/{path}")
    }
}
