//! Authentication module
//!
//! This module provides Discord OAuth2 authentication for the gate.
//!
//! ## Structure
//!
//! - `provider`: Discord API client (token exchange, guilds, member roles)
//! - `helpers`: Pure helper functions (authorize URL, HTTP client)
//! - `handlers`: HTTP handlers for the login and callback flows
//!
//! ## Authentication Flow
//!
//! 1. User visits `/login` → redirect to Discord
//! 2. Discord authenticates → redirect to `/callback?code=...`
//! 3. Gate exchanges the code, checks guild membership and roles
//! 4. If allowed, the configured command runs and its output is shown

pub mod handlers;
pub mod helpers;
pub mod provider;

// Re-export handlers for convenient routing
pub use handlers::{callback_handler, login_handler, CallbackOutcome, CallbackParams, Denial};

pub use helpers::{build_authorize_url, DISCORD_SCOPES};
pub use provider::{AccessGrant, DiscordClient, Guild, GuildMember, ProviderError};
