use std::io::{self, Write};

use anyhow::Result;
use serde::Deserialize;
use url::Url;

use crate::errors::UserError;
use crate::store::{self, DropboxTokens};

const AUTHORIZE_URL: &str = "https://www.dropbox.com/oauth2/authorize";
const TOKEN_URL: &str = "https://api.dropboxapi.com/oauth2/token";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
}

/// Interactive Dropbox authorization.
///
/// Walks through the offline-access OAuth flow: the user supplies their
/// app key and secret, opens the authorize URL, and pastes the code back;
/// the exchanged token pair is persisted for the uploader.
pub async fn run() -> Result<()> {
    let app_key = prompt("Enter your Dropbox App Key: ")?;
    if app_key.is_empty() {
        return Err(UserError(
            "App Key is required. Create one at https://www.dropbox.com/developers".to_string(),
        )
        .into());
    }

    let app_secret = prompt("Enter your Dropbox App Secret: ")?;
    if app_secret.is_empty() {
        return Err(UserError("App Secret is required.".to_string()).into());
    }

    println!();
    println!("Open this URL in your browser to authorize kobopress:");
    println!("{}", build_authorize_url(&app_key)?);
    println!();

    let code = prompt("Enter the authorization code: ")?;
    if code.is_empty() {
        return Err(UserError("Authorization code is required.".to_string()).into());
    }

    println!("Exchanging code for tokens...");
    let tokens = exchange_code(&app_key, &app_secret, &code).await?;

    store::save_dropbox_tokens(DropboxTokens {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_at: store::now_millis() + tokens.expires_in * 1000,
        app_key,
        app_secret,
    })?;

    println!("Dropbox authorization successful! Tokens saved.");
    Ok(())
}

fn build_authorize_url(app_key: &str) -> Result<String> {
    let mut url = Url::parse(AUTHORIZE_URL)?;
    url.query_pairs_mut()
        .append_pair("client_id", app_key)
        .append_pair("response_type", "code")
        .append_pair("token_access_type", "offline");
    Ok(url.to_string())
}

fn prompt(question: &str) -> Result<String> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

async fn exchange_code(app_key: &str, app_secret: &str, code: &str) -> Result<TokenResponse> {
    let client = reqwest::Client::new();
    let response = client
        .post(TOKEN_URL)
        .basic_auth(app_key, Some(app_secret))
        .form(&[("code", code), ("grant_type", "authorization_code")])
        .send()
        .await?;

    if !response.status().is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(UserError(format!("Token exchange failed: {}", text)).into());
    }

    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_requests_offline_access() {
        let url = build_authorize_url("my-app-key").unwrap();
        assert!(url.starts_with("https://www.dropbox.com/oauth2/authorize?"));
        assert!(url.contains("client_id=my-app-key"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("token_access_type=offline"));
    }
}
