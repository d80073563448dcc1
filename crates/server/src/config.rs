use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

/// Minimum accepted length for the signing and encryption secrets.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// `SameSite` attribute applied to both credential cookies.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign access and refresh credentials.
    pub jwt_secret: String,
    /// Secret the refresh-credential encryption key is derived from.
    pub encrypt_key_secret: String,
    /// Access credential lifetime in seconds.
    #[serde(default = "default_access_token_lifetime")]
    pub access_token_lifetime: i64,
    /// Refresh credential lifetime in seconds.
    #[serde(default = "default_refresh_token_lifetime")]
    pub refresh_token_lifetime: i64,
    /// Mark credential cookies `Secure`. Enable in production.
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default)]
    pub same_site: SameSitePolicy,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProviderKind {
    /// Accounts stored in the service database with argon2 password hashes.
    #[default]
    Local,
    /// Hosted identity-toolkit REST API.
    Remote,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub provider: IdentityProviderKind,
    /// API key of the hosted identity provider.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,
    /// Bearer token with admin rights, used for profile lookups by user id.
    #[serde(default)]
    pub service_token: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            provider: IdentityProviderKind::default(),
            api_key: None,
            base_url: default_identity_base_url(),
            service_token: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Browser origins allowed to make credentialed requests.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
    pub auth: AuthConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl AppConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Check every invariant the rest of the service relies on.
    ///
    /// Called by [`load_config`]; tests that build an `AppConfig` by hand should call it too.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let auth = &self.auth;
        if auth.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Validation(format!(
                "auth.jwt_secret must be at least {MIN_SECRET_LEN} characters"
            )));
        }
        if auth.encrypt_key_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Validation(format!(
                "auth.encrypt_key_secret must be at least {MIN_SECRET_LEN} characters"
            )));
        }
        if auth.jwt_secret == auth.encrypt_key_secret {
            return Err(ConfigError::Validation(
                "auth.jwt_secret and auth.encrypt_key_secret must differ".into(),
            ));
        }
        if auth.access_token_lifetime <= 0 || auth.refresh_token_lifetime <= 0 {
            return Err(ConfigError::Validation(
                "token lifetimes must be positive".into(),
            ));
        }
        if auth.access_token_lifetime >= auth.refresh_token_lifetime {
            return Err(ConfigError::Validation(
                "auth.access_token_lifetime must be shorter than auth.refresh_token_lifetime"
                    .into(),
            ));
        }
        if auth.same_site == SameSitePolicy::None && !auth.secure_cookies {
            return Err(ConfigError::Validation(
                "auth.same_site = none requires auth.secure_cookies".into(),
            ));
        }
        if self.identity.provider == IdentityProviderKind::Remote
            && self.identity.api_key.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::Validation(
                "identity.api_key is required for the remote identity provider".into(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::Validation("port must be > 0".into()));
        }
        Ok(())
    }
}

fn default_access_token_lifetime() -> i64 {
    15 * 60
}

fn default_refresh_token_lifetime() -> i64 {
    7 * 24 * 60 * 60
}

fn default_identity_base_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    3000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_true() -> bool {
    true
}

/// Load application configuration from an optional `config.yaml` + environment overrides.
///
/// Any variable matching the key path separated by double underscores (e.g.
/// `AUTH__JWT_SECRET`) overrides the file value. List values such as
/// `ALLOWED_ORIGINS` are comma separated.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from("config.yaml")
}

/// Same as [`load_config`] but reading the given file path.
pub fn load_config_from(path: &str) -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::default()
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("allowed_origins")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Convenience helper for binaries: missing or weak secrets abort startup.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
