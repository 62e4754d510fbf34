use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};

use crate::access::command::CommandLine;

/// Delimiter between entries of `REQUIRED_ROLE_IDS`
pub const ROLE_ID_DELIMITER: char = ',';

const DEFAULT_DISCORD_API_URL: &str = "https://discord.com/api";
const DEFAULT_DISCORD_AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";
const DEFAULT_PAGE_TEMPLATE_PATH: &str = "templates/page.html";

#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,

    // Discord OAuth2 application
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub redirect_url: RedirectUrl,

    // Discord endpoints (overridable so the API can be pointed at a mock)
    pub discord_api_url: String,
    pub authorize_url: AuthUrl,
    pub token_url: TokenUrl,

    // Access requirements
    pub required_guild_id: String,
    pub required_role_ids: Vec<String>,

    // Command executed once access is granted
    pub command: CommandLine,

    // Page template rendered around every response body
    pub page_template_path: PathBuf,

    // HTTP client timeout configuration (in seconds)
    pub http_connect_timeout_secs: u64,
    pub http_request_timeout_secs: u64,

    // Upper bound on a single command run (in seconds)
    pub command_timeout_secs: u64,
}

impl Config {
    /// Load configuration from the process environment
    pub fn load() -> anyhow::Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration from a map of variables instead of the environment
    pub fn from_map(vars: &HashMap<String, String>) -> anyhow::Result<Self> {
        Self::from_vars(|name| vars.get(name).cloned())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Variables set to an empty string count as missing.
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", name))
        };

        // Required variables
        let client_id = ClientId::new(required("DISCORD_CLIENT_ID")?);
        let client_secret = ClientSecret::new(required("DISCORD_CLIENT_SECRET")?);

        let redirect_url = RedirectUrl::new(required("DISCORD_REDIRECT_URI")?)
            .map_err(|e| anyhow::anyhow!("DISCORD_REDIRECT_URI is not a valid URL: {}", e))?;

        let required_guild_id = required("REQUIRED_SERVER_ID")?.trim().to_string();

        let required_role_ids = parse_role_ids(&required("REQUIRED_ROLE_IDS")?);
        if required_role_ids.is_empty() {
            return Err(anyhow::anyhow!(
                "REQUIRED_ROLE_IDS must contain at least one role id"
            ));
        }

        let command = CommandLine::parse(&required("COMMAND_TO_RUN")?)
            .ok_or_else(|| anyhow::anyhow!("COMMAND_TO_RUN must name a program"))?;

        // Optional variables with defaults
        let server_host = var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let server_port = var("SERVER_PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(3000);

        let discord_api_url = var("DISCORD_API_URL")
            .unwrap_or_else(|| DEFAULT_DISCORD_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let authorize_url = AuthUrl::new(
            var("DISCORD_AUTHORIZE_URL")
                .unwrap_or_else(|| DEFAULT_DISCORD_AUTHORIZE_URL.to_string()),
        )
        .map_err(|e| anyhow::anyhow!("Invalid Discord authorize URL: {}", e))?;

        let token_url = TokenUrl::new(format!("{}/oauth2/token", discord_api_url))
            .map_err(|e| anyhow::anyhow!("Invalid Discord token URL: {}", e))?;

        let page_template_path = var("PAGE_TEMPLATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PAGE_TEMPLATE_PATH));

        let http_connect_timeout_secs = var("HTTP_CONNECT_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        let http_request_timeout_secs = var("HTTP_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let command_timeout_secs = var("COMMAND_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);

        Ok(Config {
            server_host,
            server_port,
            client_id,
            client_secret,
            redirect_url,
            discord_api_url,
            authorize_url,
            token_url,
            required_guild_id,
            required_role_ids,
            command,
            page_template_path,
            http_connect_timeout_secs,
            http_request_timeout_secs,
            command_timeout_secs,
        })
    }

    /// Get bind address for server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Split a delimited role id list, trimming entries and dropping blanks and duplicates.
pub fn parse_role_ids(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(ROLE_ID_DELIMITER).map(str::trim) {
        if !id.is_empty() && !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 6] = [
        "DISCORD_CLIENT_ID",
        "DISCORD_CLIENT_SECRET",
        "DISCORD_REDIRECT_URI",
        "REQUIRED_SERVER_ID",
        "REQUIRED_ROLE_IDS",
        "COMMAND_TO_RUN",
    ];

    fn base_vars() -> HashMap<String, String> {
        [
            ("DISCORD_CLIENT_ID", "client-123"),
            ("DISCORD_CLIENT_SECRET", "shh"),
            ("DISCORD_REDIRECT_URI", "http://gate.localhost/callback"),
            ("REQUIRED_SERVER_ID", "guild-1"),
            ("REQUIRED_ROLE_IDS", "role-a,role-b"),
            ("COMMAND_TO_RUN", "uptime -p"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_load_with_all_required_vars() {
        let config = Config::from_map(&base_vars()).unwrap();

        assert_eq!(config.client_id.as_str(), "client-123");
        assert_eq!(config.client_secret.secret(), "shh");
        assert_eq!(config.redirect_url.as_str(), "http://gate.localhost/callback");
        assert_eq!(config.required_guild_id, "guild-1");
        assert_eq!(config.required_role_ids, vec!["role-a", "role-b"]);
        assert_eq!(config.command.program(), "uptime");
        assert_eq!(config.command.args(), ["-p".to_string()]);
    }

    #[test]
    fn test_defaults_for_optional_vars() {
        let config = Config::from_map(&base_vars()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.discord_api_url, "https://discord.com/api");
        assert_eq!(
            config.token_url.as_str(),
            "https://discord.com/api/oauth2/token"
        );
        assert_eq!(
            config.authorize_url.as_str(),
            "https://discord.com/oauth2/authorize"
        );
        assert_eq!(config.page_template_path, PathBuf::from("templates/page.html"));
        assert_eq!(config.http_connect_timeout_secs, 10);
        assert_eq!(config.http_request_timeout_secs, 30);
        assert_eq!(config.command_timeout_secs, 60);
    }

    #[test]
    fn test_api_url_trailing_slash_is_trimmed() {
        let mut vars = base_vars();
        vars.insert("DISCORD_API_URL".into(), "http://127.0.0.1:9999/".into());
        vars.insert("SERVER_PORT".into(), "8081".into());

        let config = Config::from_map(&vars).unwrap();
        assert_eq!(config.discord_api_url, "http://127.0.0.1:9999");
        assert_eq!(config.token_url.as_str(), "http://127.0.0.1:9999/oauth2/token");
        assert_eq!(config.server_port, 8081);
    }

    #[test]
    fn test_each_missing_required_var_is_rejected() {
        for name in REQUIRED {
            let mut vars = base_vars();
            vars.remove(name);

            let err = Config::from_map(&vars).unwrap_err();
            assert!(
                err.to_string().contains(name),
                "error for missing {} was: {}",
                name,
                err
            );
        }
    }

    #[test]
    fn test_empty_required_var_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("DISCORD_CLIENT_SECRET".into(), "   ".into());

        let err = Config::from_map(&vars).unwrap_err();
        assert!(err.to_string().contains("DISCORD_CLIENT_SECRET"));
    }

    #[test]
    fn test_role_ids_are_trimmed_and_blanks_dropped() {
        assert_eq!(parse_role_ids("a, b ,,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_role_ids("a,a, a"), vec!["a"]);
    }

    #[test]
    fn test_only_commas_is_rejected() {
        assert!(parse_role_ids(",,,").is_empty());

        let mut vars = base_vars();
        vars.insert("REQUIRED_ROLE_IDS".into(), " , ,,".into());
        let err = Config::from_map(&vars).unwrap_err();
        assert!(err.to_string().contains("REQUIRED_ROLE_IDS"));
    }

    #[test]
    fn test_empty_role_ids_is_rejected() {
        let mut vars = base_vars();
        vars.insert("REQUIRED_ROLE_IDS".into(), "".into());
        assert!(Config::from_map(&vars).is_err());
    }

    #[test]
    fn test_invalid_redirect_uri_is_rejected() {
        let mut vars = base_vars();
        vars.insert("DISCORD_REDIRECT_URI".into(), "not a url".into());

        let err = Config::from_map(&vars).unwrap_err();
        assert!(err.to_string().contains("DISCORD_REDIRECT_URI"));
    }

    #[test]
    fn test_debug_output_redacts_client_secret() {
        let config = Config::from_map(&base_vars()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("shh"));
    }
}
