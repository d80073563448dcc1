use config::Config;
use notes_server::config::{
    AppConfig, ConfigError, IdentityProviderKind, SameSitePolicy, load_config_from,
};
use std::fs;

fn write_temp_config(name: &str, contents: &str) -> String {
    let path = std::env::temp_dir().join(format!(
        "notes-server-{name}-{}.yaml",
        std::process::id()
    ));
    fs::write(&path, contents).expect("write temp config");
    path.to_string_lossy().into_owned()
}

#[test]
fn test_app_config_defaults() {
    let yaml_content = r#"
database_url: "sqlite::memory:"
auth:
  jwt_secret: "0123456789abcdef0123456789abcdef"
  encrypt_key_secret: "fedcba9876543210fedcba9876543210"
"#;

    let config = Config::builder()
        .add_source(config::File::from_str(
            yaml_content,
            config::FileFormat::Yaml,
        ))
        .build()
        .expect("Failed to build config");

    let app_config: AppConfig = config
        .try_deserialize()
        .expect("Failed to deserialize app config");
    assert_eq!(app_config.port, 3000);
    assert_eq!(app_config.listen_addr().to_string(), "0.0.0.0:3000");
    assert_eq!(app_config.allowed_origins, vec!["http://localhost:5173"]);
    assert!(app_config.run_migrations);
    assert_eq!(app_config.auth.access_token_lifetime, 900);
    assert_eq!(app_config.auth.refresh_token_lifetime, 604_800);
    assert!(!app_config.auth.secure_cookies);
    assert_eq!(app_config.auth.same_site, SameSitePolicy::Lax);
    assert_eq!(app_config.identity.provider, IdentityProviderKind::Local);
    assert!(app_config.validate().is_ok());
}

#[test]
fn test_full_config_from_file() {
    let path = write_temp_config(
        "full",
        r#"
database_url: "postgres://localhost/notes"
bind_address: "127.0.0.1"
port: 8081
allowed_origins:
  - "https://notes.example.com"
  - "https://admin.example.com"
run_migrations: false
auth:
  jwt_secret: "0123456789abcdef0123456789abcdef"
  encrypt_key_secret: "fedcba9876543210fedcba9876543210"
  access_token_lifetime: 60
  refresh_token_lifetime: 3600
  secure_cookies: true
  same_site: none
identity:
  provider: remote
  api_key: "api-key"
  base_url: "http://localhost:9099"
"#,
    );

    let config = load_config_from(&path).expect("valid config");
    fs::remove_file(&path).ok();

    assert_eq!(config.listen_addr().to_string(), "127.0.0.1:8081");
    assert_eq!(config.allowed_origins.len(), 2);
    assert!(!config.run_migrations);
    assert_eq!(config.auth.access_token_lifetime, 60);
    assert_eq!(config.auth.same_site, SameSitePolicy::None);
    assert_eq!(config.identity.provider, IdentityProviderKind::Remote);
    assert_eq!(config.identity.api_key.as_deref(), Some("api-key"));
    assert_eq!(config.identity.base_url, "http://localhost:9099");
}

#[test]
fn test_weak_secret_fails_fast() {
    let path = write_temp_config(
        "weak",
        r#"
database_url: "sqlite::memory:"
auth:
  jwt_secret: "dev-secret"
  encrypt_key_secret: "fedcba9876543210fedcba9876543210"
"#,
    );

    let result = load_config_from(&path);
    fs::remove_file(&path).ok();
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn test_missing_auth_section_is_an_error() {
    let path = write_temp_config("noauth", "database_url: \"sqlite::memory:\"\n");
    let result = load_config_from(&path);
    fs::remove_file(&path).ok();
    assert!(matches!(result, Err(ConfigError::Build(_))));
}
