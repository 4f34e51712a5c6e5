// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Refresh endpoint wire call: exchange a refresh token for a new pair.

use serde::{Deserialize, Serialize};

use crate::token::TokenPair;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Response body: `{ "data": { "accessToken": …, "refreshToken": … } }`.
#[derive(Debug, Deserialize)]
struct RefreshEnvelope {
    #[serde(default)]
    data: RefreshPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshPayload {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Exchange `refresh_token` for a new token pair.
///
/// Sent on a bare client so the call never re-enters the interception
/// pipeline. A success response without an access token is a failure; the
/// caller tears the session down.
pub async fn do_refresh(
    client: &reqwest::Client,
    refresh_url: &str,
    refresh_token: &str,
) -> anyhow::Result<TokenPair> {
    tracing::debug!(url = refresh_url, "requesting token refresh");
    let resp = client.post(refresh_url).json(&RefreshRequest { refresh_token }).send().await?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("refresh failed ({status}): {text}");
    }

    let envelope: RefreshEnvelope = resp.json().await?;
    let Some(access_token) = envelope.data.access_token else {
        anyhow::bail!("refresh response missing access token");
    };
    Ok(TokenPair { access_token, refresh_token: envelope.data.refresh_token })
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
