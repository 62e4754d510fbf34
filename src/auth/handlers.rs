//! Authentication handlers for the login and callback flows
//!
//! This module contains the Axum HTTP handlers for the OAuth2 flow:
//! - `login_handler`: Redirects to Discord's authorization page
//! - `callback_handler`: Verifies the user and runs the gated command

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use super::helpers::build_authorize_url;
use super::provider::ProviderError;
use crate::access::{build_role_set, has_any_required_role, is_guild_member, CommandOutput};
use crate::web::errors::GateError;
use crate::web::render::PageRenderer;
use crate::web::templates::{render_body, DeniedBody, OutputBody};
use crate::AppState;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Expected business outcome where the user is authenticated but not allowed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    NotGuildMember { guild_id: String },
    MissingRole { required: Vec<String> },
}

/// Result of a callback that made it through the whole verification chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Granted { output: String },
    Denied(Denial),
}

impl CallbackOutcome {
    /// Render the page for this outcome. Denials are normal pages (200).
    pub fn into_page(self, renderer: &PageRenderer) -> Response {
        let (title, body) = match &self {
            CallbackOutcome::Granted { output } => (
                "Access Granted",
                render_body(&OutputBody {
                    heading: "Command Output",
                    output,
                }),
            ),
            CallbackOutcome::Denied(Denial::NotGuildMember { guild_id }) => (
                "Access Denied",
                render_body(&DeniedBody {
                    message: "You are not a member of the required server.",
                    ids: std::slice::from_ref(guild_id),
                }),
            ),
            CallbackOutcome::Denied(Denial::MissingRole { required }) => (
                "Access Denied",
                render_body(&DeniedBody {
                    message: "You do not have any of the required roles in the server.",
                    ids: required,
                }),
            ),
        };

        (StatusCode::OK, Html(renderer.render(title, &body))).into_response()
    }
}

// =============================================================================
// Internal Helpers
// =============================================================================

/// Map a Discord call failure, keeping transport and decode failures internal
fn provider_failure(
    error: ProviderError,
    step: &'static str,
    on_status: impl FnOnce(StatusCode, Option<String>) -> GateError,
) -> GateError {
    match error {
        ProviderError::Status {
            status,
            description,
        } => on_status(status, description),
        ProviderError::Request(e) => {
            GateError::Internal(anyhow::Error::new(e).context(format!("{} request failed", step)))
        }
    }
}

/// The verification chain. Each step runs only if the previous one succeeded.
pub async fn verify_and_run(state: &AppState, code: &str) -> Result<CallbackOutcome, GateError> {
    let config = &state.config;

    tracing::info!("Exchanging authorization code for access token");
    let grant = state.discord.exchange_code(code).await.map_err(|e| {
        provider_failure(e, "token exchange", |status, description| {
            GateError::TokenExchange {
                status,
                description,
            }
        })
    })?;
    tracing::info!(token_type = ?grant.token_type(), "Successfully obtained access token");

    let guilds = state
        .discord
        .fetch_guilds(&grant)
        .await
        .map_err(|e| provider_failure(e, "guild list", |status, _| GateError::GuildsFetch { status }))?;

    if !is_guild_member(&guilds, &config.required_guild_id) {
        tracing::info!(
            required_guild_id = %config.required_guild_id,
            guild_count = guilds.len(),
            "Access denied: user is not a member of the required guild"
        );
        return Ok(CallbackOutcome::Denied(Denial::NotGuildMember {
            guild_id: config.required_guild_id.clone(),
        }));
    }

    let member = state
        .discord
        .fetch_member(&grant, &config.required_guild_id)
        .await
        .map_err(|e| {
            provider_failure(e, "guild member", |status, _| {
                if status == StatusCode::FORBIDDEN {
                    GateError::MemberScope
                } else {
                    GateError::MemberFetch { status }
                }
            })
        })?;

    let user_roles = build_role_set(&member.roles);
    if !has_any_required_role(&user_roles, &config.required_role_ids) {
        tracing::info!(
            user_roles = ?member.roles,
            required_roles = ?config.required_role_ids,
            "Access denied: user has none of the required roles"
        );
        return Ok(CallbackOutcome::Denied(Denial::MissingRole {
            required: config.required_role_ids.clone(),
        }));
    }

    tracing::info!(command = %config.command, "Access granted, running command");
    match config
        .command
        .run(Duration::from_secs(config.command_timeout_secs))
        .await?
    {
        CommandOutput::Stdout(output) => Ok(CallbackOutcome::Granted { output }),
        CommandOutput::Stderr(stderr) => Err(GateError::CommandStderr { stderr }),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Login handler - redirects to Discord's OAuth2 authorization page
pub async fn login_handler(State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("Login requested");

    let auth_url = build_authorize_url(
        &state.config.authorize_url,
        &state.config.client_id,
        &state.config.redirect_url,
    );

    tracing::info!(
        authorize_url = %state.config.authorize_url.as_str(),
        "Redirecting to Discord for authentication"
    );

    Redirect::to(auth_url.as_str()).into_response()
}

/// Callback handler - verifies guild membership and roles, then runs the command
pub async fn callback_handler(
    query: Result<Query<CallbackParams>, QueryRejection>,
    State(state): State<Arc<AppState>>,
) -> Response {
    tracing::info!("OAuth callback received");

    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => {
            return GateError::BadQuery {
                reason: rejection.body_text(),
            }
            .into_page(&state.renderer);
        }
    };

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return GateError::MissingCode {
            provider_error: params.error_description.or(params.error),
        }
        .into_page(&state.renderer);
    };

    tracing::debug!(code_length = code.len(), "Authorization code received");

    let span = tracing::info_span!("callback_flow", required_guild_id = %state.config.required_guild_id);
    match verify_and_run(&state, &code).instrument(span).await {
        Ok(outcome) => outcome.into_page(&state.renderer),
        Err(e) => e.into_page(&state.renderer),
    }
}
