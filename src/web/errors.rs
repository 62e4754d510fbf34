//! Error pages
//!
//! `GateError` covers every way the callback pipeline can stop short of running
//! the command. Each variant maps to one status code and one rendered page.
//! Panics escaping a handler are turned into a critical error page by
//! [`critical_error_response`].

use std::any::Any;

use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use super::render::PageRenderer;
use super::templates::{render_body, MessageBody, OutputBody};
use crate::access::CommandError;

#[derive(Debug)]
pub enum GateError {
    /// The callback arrived without an authorization code
    MissingCode { provider_error: Option<String> },
    /// The callback query string could not be parsed
    BadQuery { reason: String },
    /// Discord rejected the token exchange
    TokenExchange {
        status: StatusCode,
        description: Option<String>,
    },
    /// Discord failed the guild list request
    GuildsFetch { status: StatusCode },
    /// Discord refused the member request (usually a missing scope)
    MemberScope,
    /// Discord failed the member request for any other reason
    MemberFetch { status: StatusCode },
    /// The command ran but wrote to stderr
    CommandStderr { stderr: String },
    /// The command could not be started
    CommandLaunch(CommandError),
    /// Anything else: transport failures, undecodable responses, timeouts
    Internal(anyhow::Error),
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::MissingCode { .. } | GateError::BadQuery { .. } => StatusCode::BAD_REQUEST,
            GateError::TokenExchange { status, .. }
            | GateError::GuildsFetch { status }
            | GateError::MemberFetch { status } => forwarded_status(*status),
            GateError::MemberScope => StatusCode::FORBIDDEN,
            GateError::CommandStderr { .. }
            | GateError::CommandLaunch(_)
            | GateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            GateError::MissingCode { provider_error } => {
                tracing::warn!(
                    provider_error = ?provider_error,
                    "Callback received without authorization code"
                );
            }
            GateError::BadQuery { reason } => {
                tracing::warn!(reason = %reason, "Callback query string rejected");
            }
            GateError::TokenExchange {
                status,
                description,
            } => {
                tracing::error!(
                    status = %status,
                    description = ?description,
                    "Token exchange failed"
                );
            }
            GateError::GuildsFetch { status } => {
                tracing::error!(status = %status, "Failed to fetch user guilds");
            }
            GateError::MemberScope => {
                tracing::error!(
                    status = %StatusCode::FORBIDDEN,
                    "Discord refused guild member request; check the guilds.members.read scope"
                );
            }
            GateError::MemberFetch { status } => {
                tracing::error!(status = %status, "Failed to fetch guild member");
            }
            GateError::CommandStderr { stderr } => {
                tracing::warn!(stderr_len = stderr.len(), "Command wrote to stderr");
            }
            GateError::CommandLaunch(e) => {
                tracing::error!(error = %e, "Failed to launch command");
            }
            GateError::Internal(e) => {
                tracing::error!(error = %e, "Callback failed with an unexpected error");
            }
        }
    }

    /// Log the error and render its page
    pub fn into_page(self, renderer: &PageRenderer) -> Response {
        self.log();
        let status = self.status();

        let (title, body) = match &self {
            GateError::MissingCode { provider_error } => (
                "Login Failed",
                render_body(&MessageBody {
                    heading: "Login Failed",
                    message: "No authorization code was provided by Discord.",
                    detail: provider_error.as_deref(),
                }),
            ),
            GateError::BadQuery { reason } => (
                "Login Failed",
                render_body(&MessageBody {
                    heading: "Login Failed",
                    message: "The login response from Discord could not be read.",
                    detail: Some(reason),
                }),
            ),
            GateError::TokenExchange { description, .. } => (
                "Login Failed",
                render_body(&MessageBody {
                    heading: "Token Exchange Failed",
                    message: "Discord rejected the authorization code.",
                    detail: Some(description.as_deref().unwrap_or("Unknown error")),
                }),
            ),
            GateError::GuildsFetch { .. } => (
                "Error",
                render_body(&MessageBody {
                    heading: "Fetch Failed",
                    message: "Could not fetch your server list from Discord.",
                    detail: None,
                }),
            ),
            GateError::MemberScope => (
                "Error",
                render_body(&MessageBody {
                    heading: "Permission Problem",
                    message: "Discord refused to share your roles in the required server. \
                              The login may be missing the guilds.members.read scope.",
                    detail: None,
                }),
            ),
            GateError::MemberFetch { .. } => (
                "Error",
                render_body(&MessageBody {
                    heading: "Fetch Failed",
                    message: "Could not fetch your roles from Discord.",
                    detail: None,
                }),
            ),
            GateError::CommandStderr { stderr } => (
                "Command Error",
                render_body(&OutputBody {
                    heading: "Command Error",
                    output: stderr,
                }),
            ),
            GateError::CommandLaunch(_) | GateError::Internal(_) => (
                "System Error",
                render_body(&MessageBody {
                    heading: "System Error",
                    message: "An internal error occurred while processing your login.",
                    detail: None,
                }),
            ),
        };

        (status, Html(renderer.render(title, &body))).into_response()
    }
}

/// Status passed on to the browser for an upstream failure.
///
/// Redirects are never followed, so a 3xx from Discord would leave the browser
/// with a redirect that has no `Location`; those become 502.
fn forwarded_status(upstream: StatusCode) -> StatusCode {
    if upstream.is_redirection() {
        StatusCode::BAD_GATEWAY
    } else {
        upstream
    }
}

impl From<CommandError> for GateError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::Launch { .. } => GateError::CommandLaunch(e),
            other => GateError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Response for a panic that escaped a handler.
///
/// Must not fail: the renderer degrades to fallback text instead of erroring.
pub fn critical_error_response(
    renderer: &PageRenderer,
    panic: Box<dyn Any + Send + 'static>,
) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    tracing::error!(
        status = %status,
        panic = %detail,
        "Unhandled error escaped request handler"
    );

    let body = render_body(&MessageBody {
        heading: "Critical Server Error",
        message: "Something went badly wrong. Please try again later.",
        detail: None,
    });

    let mut response = (status, renderer.render("Critical Error", &body)).into_response();
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}
