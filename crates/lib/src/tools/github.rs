//! GitHub release creation over the REST API.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ReleaseRequest, ToolError};
use crate::consts::APP_NAME;

#[derive(Debug, Serialize)]
struct NewRelease<'a> {
  tag_name: &'a str,
  target_commitish: &'a str,
  name: &'a str,
  body: &'a str,
  prerelease: bool,
}

/// Error body returned by the REST API.
#[derive(Debug, Deserialize)]
struct ApiError {
  message: String,
}

/// `HTTP <status>`, followed by the API's own message when the body has one.
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
  match serde_json::from_str::<ApiError>(body) {
    Ok(err) if !err.message.is_empty() => format!("HTTP {}: {}", status, err.message),
    _ => format!("HTTP {}", status),
  }
}

/// Create a release named and tagged after `release.version`.
pub async fn create_release(
  client: &reqwest::Client,
  api_url: &str,
  token: &str,
  release: &ReleaseRequest,
) -> Result<(), ToolError> {
  let url = format!(
    "{}/repos/{}/{}/releases",
    api_url.trim_end_matches('/'),
    release.owner,
    release.repo
  );
  info!(url = %url, version = %release.version, "creating release");

  let payload = NewRelease {
    tag_name: &release.version,
    target_commitish: &release.target_commitish,
    name: &release.version,
    body: &release.notes,
    prerelease: release.prerelease,
  };

  let response = client
    .post(&url)
    .bearer_auth(token)
    .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    .header(reqwest::header::USER_AGENT, format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
    .json(&payload)
    .send()
    .await
    .map_err(|e| ToolError::Release {
      url: url.clone(),
      message: e.to_string(),
    })?;

  let status = response.status();
  if !status.is_success() {
    let body = response.text().await.unwrap_or_default();
    debug!(status = %status, body = %body, "release request rejected");
    return Err(ToolError::Release {
      url,
      message: rejection_message(status, &body),
    });
  }

  info!(version = %release.version, "release created");
  Ok(())
}
