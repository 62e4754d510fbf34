//! Discord API client for the callback verification chain
//!
//! Three calls, always made in this order by the callback handler:
//! token exchange, current user's guilds, current user's member record in one guild.

use oauth2::basic::{BasicErrorResponse, BasicTokenResponse, BasicTokenType};
use oauth2::{AccessToken, ClientId, ClientSecret, RedirectUrl, TokenResponse, TokenUrl};
use reqwest::{header::AUTHORIZATION, StatusCode};
use serde::Deserialize;

use super::helpers::create_http_client;
use crate::config::Config;

// =============================================================================
// Types
// =============================================================================

/// A guild from `GET /users/@me/guilds` (only the id is needed)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Guild {
    pub id: String,
}

/// The user's member record from `GET /users/@me/guilds/{guild.id}/member`
#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Credential obtained from the token exchange. Lives for one request only.
#[derive(Debug)]
pub struct AccessGrant {
    access_token: AccessToken,
    token_type: BasicTokenType,
}

impl AccessGrant {
    pub fn token_type(&self) -> &BasicTokenType {
        &self.token_type
    }

    /// `Authorization` header value built from the token type and token
    fn authorization_header(&self) -> String {
        let scheme = match &self.token_type {
            BasicTokenType::Bearer => "Bearer",
            BasicTokenType::Mac => "MAC",
            BasicTokenType::Extension(other) => other.as_str(),
        };
        format!("{} {}", scheme, self.access_token.secret())
    }
}

impl From<BasicTokenResponse> for AccessGrant {
    fn from(response: BasicTokenResponse) -> Self {
        AccessGrant {
            access_token: response.access_token().clone(),
            token_type: response.token_type().clone(),
        }
    }
}

/// Failure of a single Discord call
#[derive(Debug)]
pub enum ProviderError {
    /// Discord answered with a non-success status
    Status {
        status: StatusCode,
        description: Option<String>,
    },
    /// The request could not be sent or its body could not be decoded
    Request(reqwest::Error),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Request(e)
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Debug, Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    api_url: String,
    token_url: TokenUrl,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
}

impl DiscordClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = create_http_client(
            config.http_connect_timeout_secs,
            config.http_request_timeout_secs,
        )
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(DiscordClient {
            http,
            api_url: config.discord_api_url.clone(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
        })
    }

    /// Exchange an authorization code for an access token (form-encoded POST)
    pub async fn exchange_code(&self, code: &str) -> Result<AccessGrant, ProviderError> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.secret().as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_url.as_str()),
        ];

        let response = self
            .http
            .post(self.token_url.as_str())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let description = serde_json::from_str::<BasicErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error_description().cloned());
            return Err(ProviderError::Status {
                status,
                description,
            });
        }

        let token: BasicTokenResponse = response.json().await?;
        Ok(token.into())
    }

    /// Fetch the guilds the authenticated user belongs to
    pub async fn fetch_guilds(&self, grant: &AccessGrant) -> Result<Vec<Guild>, ProviderError> {
        let url = format!("{}/users/@me/guilds", self.api_url);
        self.get_json(&url, grant).await
    }

    /// Fetch the authenticated user's member record (roles) in one guild
    pub async fn fetch_member(
        &self,
        grant: &AccessGrant,
        guild_id: &str,
    ) -> Result<GuildMember, ProviderError> {
        let url = format!("{}/users/@me/guilds/{}/member", self.api_url, guild_id);
        self.get_json(&url, grant).await
    }

    async fn get_json<T>(&self, url: &str, grant: &AccessGrant) -> Result<T, ProviderError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, grant.authorization_header())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let description = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("message").and_then(|m| m.as_str()).map(String::from));
            return Err(ProviderError::Status {
                status,
                description,
            });
        }

        Ok(response.json().await?)
    }
}
