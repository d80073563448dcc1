use std::sync::Arc;

use color_eyre::eyre::WrapErr;
use migration::{Migrator, MigratorTrait};
use notes_server::AppResources;
use notes_server::api::start_webserver;
use notes_server::auth::SessionManager;
use notes_server::config::{IdentityProviderKind, load_config_or_panic};
use notes_server::identity::{IdentityProvider, LocalIdentityProvider, RemoteIdentityProvider};
use notes_server::notes::SeaOrmNoteStore;
use sea_orm::Database;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "notes_server=info,tower_http=info,sea_orm=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_level(true))
        .init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    initialize_tracing();

    let config = Arc::new(load_config_or_panic());

    let db = Arc::new(
        Database::connect(&config.database_url)
            .await
            .wrap_err("Failed to connect to database")?,
    );
    if config.run_migrations {
        Migrator::up(db.as_ref(), None)
            .await
            .wrap_err("Failed to run database migrations")?;
    }

    let identity: Arc<dyn IdentityProvider> = match config.identity.provider {
        IdentityProviderKind::Local => Arc::new(LocalIdentityProvider::new(db.clone())),
        IdentityProviderKind::Remote => Arc::new(
            RemoteIdentityProvider::new(&config.identity)
                .wrap_err("Failed to configure remote identity provider")?,
        ),
    };
    tracing::info!(provider = ?config.identity.provider, "Identity provider configured");

    let sessions = SessionManager::from_config(&config.auth, identity)
        .wrap_err("Failed to initialise credential codec")?;

    let resources = AppResources {
        config: config.clone(),
        sessions: Arc::new(sessions),
        notes: Arc::new(SeaOrmNoteStore::new(db)),
    };

    start_webserver(resources).await
}
