use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::errors::UserError;
use crate::store::{self, DropboxTokens};

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 1000;
const TOKEN_URL: &str = "https://api.dropboxapi.com/oauth2/token";
const UPLOAD_URL: &str = "https://content.dropboxapi.com/2/files/upload";
const REMOTE_FOLDER: &str = "/Apps/Rakuten Kobo/X Articles";

/// Refresh the access token this long before it actually expires.
const REFRESH_MARGIN_MS: u64 = 60_000;

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: u64,
}

/// Where a file lands in the user's Dropbox.
pub fn remote_path(filename: &str) -> String {
    format!("{}/{}", REMOTE_FOLDER, filename)
}

/// Upload a finished KEPUB to Dropbox.
///
/// The stored access token is refreshed first when it is within a minute
/// of expiry. Setup problems (no tokens, revoked auth, full quota) come
/// back as [`UserError`] so the caller can print the instruction and keep
/// the local file.
pub async fn upload(data: &[u8], filename: &str) -> Result<()> {
    let token = valid_token().await?;
    upload_with_retry(&token, data, &remote_path(filename)).await
}

async fn valid_token() -> Result<String> {
    let Some(tokens) = store::dropbox_tokens() else {
        return Err(
            UserError("Run `kobopress auth` to set up Dropbox, or use --no-upload.".to_string())
                .into(),
        );
    };

    if store::now_millis() >= tokens.expires_at.saturating_sub(REFRESH_MARGIN_MS) {
        let refreshed = refresh_access_token(tokens).await?;
        return Ok(refreshed.access_token);
    }

    Ok(tokens.access_token)
}

async fn refresh_access_token(tokens: DropboxTokens) -> Result<DropboxTokens> {
    let client = reqwest::Client::new();
    let response = client
        .post(TOKEN_URL)
        .basic_auth(&tokens.app_key, Some(&tokens.app_secret))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", tokens.refresh_token.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(UserError(
            "Failed to refresh Dropbox token. Run `kobopress auth` to re-authorize.".to_string(),
        )
        .into());
    }

    let data: RefreshResponse = response.json().await?;
    let updated = DropboxTokens {
        access_token: data.access_token,
        expires_at: store::now_millis() + data.expires_in * 1000,
        ..tokens
    };

    store::save_dropbox_tokens(updated.clone())?;
    Ok(updated)
}

async fn upload_with_retry(token: &str, data: &[u8], path: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let api_arg = serde_json::json!({
        "path": path,
        "mode": "add",
        "autorename": true,
        "mute": false,
    })
    .to_string();

    let mut last_error = String::new();

    for attempt in 0..MAX_ATTEMPTS {
        let sent = client
            .post(UPLOAD_URL)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header("Dropbox-API-Arg", &api_arg)
            .body(data.to_vec())
            .send()
            .await;

        match sent {
            Ok(response) if response.status().is_success() => return Ok(()),
            Ok(response) => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();

                if status.as_u16() == 409 && text.contains("insufficient_space") {
                    return Err(UserError(
                        "Dropbox quota is full. File saved locally instead.".to_string(),
                    )
                    .into());
                }
                if status.as_u16() == 401 {
                    return Err(UserError(
                        "Dropbox token is invalid. Run `kobopress auth` to re-authorize."
                            .to_string(),
                    )
                    .into());
                }

                last_error = format!("HTTP {}: {}", status.as_u16(), text);
            }
            Err(error) => {
                last_error = error.to_string();
            }
        }

        if attempt + 1 < MAX_ATTEMPTS {
            tokio::time::sleep(Duration::from_millis(BACKOFF_BASE_MS * 2u64.pow(attempt))).await;
        }
    }

    anyhow::bail!("Upload failed after {} attempts: {}", MAX_ATTEMPTS, last_error)
}
