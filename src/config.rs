use crate::constants::{email, netlify, network, origins, storage};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Development,
    Production,
}

#[derive(Debug, Clone, Default)]
pub struct MailrelayConfig {
    pub api_key: Option<String>,
    pub domain: Option<String>,
    pub default_from: String,
}

impl MailrelayConfig {
    /// `https://{domain}/api/v1/send`; a domain that already carries a scheme is kept as-is.
    pub fn send_url(&self) -> Option<String> {
        let domain = self.domain.as_deref()?.trim().trim_end_matches('/');
        if domain.is_empty() {
            return None;
        }
        if domain.starts_with("http://") || domain.starts_with("https://") {
            Some(format!("{}{}", domain, email::SEND_PATH))
        } else {
            Some(format!("https://{}{}", domain, email::SEND_PATH))
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetlifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub api_base: String,
    pub authorize_url: String,
    pub post_auth_redirect: String,
    pub default_zip: Option<PathBuf>,
}

impl Default for NetlifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            api_base: netlify::API_BASE.to_string(),
            authorize_url: netlify::AUTHORIZE_URL.to_string(),
            post_auth_redirect: netlify::POST_AUTH_REDIRECT.to_string(),
            default_zip: None,
        }
    }
}

/// Everything the handlers need from the environment, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub mode: RuntimeMode,
    pub allowed_origins: Vec<String>,
    pub database_path: String,
    pub spec_fetch_timeout: Duration,
    pub system_keys: HashMap<String, Option<String>>,
    pub mailrelay: MailrelayConfig,
    pub netlify: NetlifyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: network::DEFAULT_BIND
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8787))),
            mode: RuntimeMode::Production,
            allowed_origins: origins::DEFAULT_ALLOWED
                .iter()
                .map(|s| s.to_string())
                .collect(),
            database_path: storage::DEFAULT_DATABASE_PATH.to_string(),
            spec_fetch_timeout: Duration::from_millis(network::TIMEOUT_SPEC_FETCH_MS),
            system_keys: HashMap::from([
                ("openai".to_string(), None),
                ("gemini".to_string(), None),
            ]),
            mailrelay: MailrelayConfig {
                default_from: email::DEFAULT_FROM.to_string(),
                ..Default::default()
            },
            netlify: NetlifyConfig::default(),
        }
    }
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_origin_list(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut out = Vec::new();
    for entry in raw.split(',') {
        let trimmed = entry.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            continue;
        }
        if url::Url::parse(trimmed).is_err() {
            return Err(ConfigError::InvalidValue {
                key: "GATEWAY_ALLOWED_ORIGINS".to_string(),
                message: format!("'{}' is not an origin URL", trimmed),
            });
        }
        out.push(trimmed.to_string());
    }
    Ok(out)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(bind) = read_env("GATEWAY_BIND") {
            config.bind = bind.parse().map_err(|_| ConfigError::InvalidValue {
                key: "GATEWAY_BIND".to_string(),
                message: format!("'{}' is not a socket address", bind),
            })?;
        }
        if read_env("GATEWAY_ENV").is_some_and(|v| v.eq_ignore_ascii_case("dev")) {
            config.mode = RuntimeMode::Development;
        }
        if let Some(raw) = read_env("GATEWAY_ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origin_list(&raw)?;
        }
        if let Some(path) = read_env("DATABASE_PATH") {
            config.database_path = path;
        }
        if let Some(raw) = read_env("SPEC_FETCH_TIMEOUT_MS") {
            let ms = raw
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "SPEC_FETCH_TIMEOUT_MS".to_string(),
                    message: format!("'{}' is not a positive number of milliseconds", raw),
                })?;
            config.spec_fetch_timeout = Duration::from_millis(ms);
        }

        config
            .system_keys
            .insert("openai".to_string(), read_env("OPENAI_API_KEY"));
        config
            .system_keys
            .insert("gemini".to_string(), read_env("GEMINI_API_KEY"));

        config.mailrelay.api_key = read_env("MAILRELAY_API_KEY");
        config.mailrelay.domain = read_env("MAILRELAY_DOMAIN");
        if let Some(from) = read_env("MAIL_DEFAULT_FROM") {
            config.mailrelay.default_from = from;
        }

        config.netlify.client_id = read_env("NETLIFY_CLIENT_ID");
        config.netlify.client_secret = read_env("NETLIFY_CLIENT_SECRET");
        config.netlify.redirect_uri = read_env("NETLIFY_REDIRECT_URI");
        if let Some(base) = read_env("NETLIFY_API_BASE") {
            config.netlify.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(authorize) = read_env("NETLIFY_AUTHORIZE_URL") {
            config.netlify.authorize_url = authorize;
        }
        if let Some(landing) = read_env("NETLIFY_POST_AUTH_REDIRECT") {
            config.netlify.post_auth_redirect = landing;
        }
        config.netlify.default_zip = read_env("NETLIFY_DEFAULT_ZIP").map(PathBuf::from);

        Ok(config)
    }

    pub fn is_dev(&self) -> bool {
        self.mode == RuntimeMode::Development
    }

    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return false;
        };
        let normalized = origin.trim().trim_end_matches('/');
        if normalized.is_empty() {
            return false;
        }
        self.allowed_origins
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(normalized))
    }
}
