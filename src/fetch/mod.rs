mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{DashboardError, Result};

/// How many times a remote download is attempted, and the pause between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// CSV export URL for the first worksheet of a Google spreadsheet.
pub fn sheet_csv_url(sheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv&gid=0")
}

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let parsed = url
        .parse::<reqwest::Url>()
        .map_err(|e| DashboardError::Load(format!("invalid URL '{url}': {e}")))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Downloads `url`, retrying failed attempts according to `policy`.
///
/// The last failure is returned once attempts are exhausted.
#[tracing::instrument(skip(client, policy), fields(attempts = policy.attempts))]
pub async fn fetch_with_retry<C: HttpClient>(
    client: &C,
    url: &str,
    policy: RetryPolicy,
) -> Result<Vec<u8>> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match fetch_bytes(client, url).await {
            Ok(bytes) => {
                debug!(attempt, bytes = bytes.len(), "Sheet downloaded");
                return Ok(bytes);
            }
            Err(e) if attempt < attempts => {
                warn!(attempt, error = %e, "Sheet download failed, retrying");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
