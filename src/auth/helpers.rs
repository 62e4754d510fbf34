//! Pure helper functions for authentication
//!
//! URL building and HTTP client construction. Nothing here performs I/O.

use std::time::Duration;

use oauth2::{AuthUrl, ClientId, RedirectUrl};

/// Scopes requested from Discord: identity, guild list, and guild member details
pub const DISCORD_SCOPES: &str = "identify guilds guilds.members.read";

// =============================================================================
// HTTP Client Builders
// =============================================================================

/// Create a reqwest client for Discord API requests using config timeouts
pub fn create_http_client(
    connect_timeout_secs: u64,
    request_timeout_secs: u64,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none()) // Security: prevent SSRF
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(request_timeout_secs))
        .build()
}

// =============================================================================
// URL Builders
// =============================================================================

/// Build the Discord authorization URL the login route redirects to
pub fn build_authorize_url(
    authorize_url: &AuthUrl,
    client_id: &ClientId,
    redirect_url: &RedirectUrl,
) -> url::Url {
    let mut url = authorize_url.url().clone();
    url.query_pairs_mut()
        .append_pair("client_id", client_id.as_str())
        .append_pair("redirect_uri", redirect_url.as_str())
        .append_pair("response_type", "code")
        .append_pair("scope", DISCORD_SCOPES);
    url
}

// =============================================================================
// Tests
// =============================================================================
