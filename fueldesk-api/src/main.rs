//! # FuelDesk API Server
//!
//! Serves the GraphQL API at `POST /graphql` and the admin console at
//! `/admin/`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p fueldesk-api                      # serve
//! cargo run -p fueldesk-api -- create-superuser --mobile 9876543210 --name Owner
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use fueldesk_api::{
    app::{self, AppState},
    config::Config,
    services::users,
};
use fueldesk_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fueldesk-api", version, about = "FuelDesk back-office server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Create an account with staff and superuser rights
    CreateSuperuser {
        /// Mobile number, used as the login name
        #[arg(long)]
        mobile: String,

        #[arg(long)]
        name: String,

        #[arg(long, env = "SUPERUSER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fueldesk_api=debug,fueldesk_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("connecting to database")?;

    migrations::run_migrations(&db)
        .await
        .context("running migrations")?;

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db.clone(), config).await,
        Command::CreateSuperuser {
            mobile,
            name,
            password,
        } => users::create_superuser(&db, &mobile, &name, &password)
            .await
            .map(|user| tracing::info!(user_id = user.id, "Superuser {} created", user.username))
            .map_err(|e| anyhow::anyhow!(e.client_message())),
    };

    pool::close_pool(db).await;
    result
}

async fn serve(db: sqlx::PgPool, config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "FuelDesk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let theme = app::resolve_theme(&config).context("resolving admin theme")?;
    let address = config.bind_address();
    let state = AppState::new(db, config, theme)?;
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, exiting...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
