/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use fueldesk_api::{app::{self, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let theme = app::resolve_theme(&config)?;
/// let state = AppState::new(pool, config, theme)?;
/// let app = app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    admin::{self, registry::AdminRegistry},
    config::Config,
    graphql::{self, FuelDeskSchema, SchemaData},
    middleware::security::SecurityHeadersLayer,
};
use axum::{
    http::{header, HeaderValue, Method},
    response::Redirect,
    routing::{get, post},
    Router,
};
use fueldesk_shared::auth::middleware::{authenticate_request, AuthState};
use fueldesk_shared::theme::{self, ResolvedTheme};
use handlebars::Handlebars;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    pub schema: FuelDeskSchema,

    /// Admin page templates
    pub templates: Arc<Handlebars<'static>>,

    /// Site settings and UI tweaks for the admin console
    pub theme: Arc<ResolvedTheme>,
}

impl AppState {
    /// Creates new application state
    ///
    /// Fails only if a template does not compile.
    pub fn new(db: PgPool, config: Config, theme: ResolvedTheme) -> anyhow::Result<Self> {
        let schema = graphql::create_schema(SchemaData {
            pool: db.clone(),
            jwt_secret: config.jwt.secret.clone(),
            jwt_expiration: config.jwt_expiration(),
        });

        Ok(Self {
            db,
            config: Arc::new(config),
            schema,
            templates: Arc::new(admin::templates::build_registry()?),
            theme: Arc::new(theme),
        })
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Loads the theme file and resolves it against the admin models
///
/// An unknown `search_model` is a configuration error and stops startup.
pub fn resolve_theme(config: &Config) -> anyhow::Result<ResolvedTheme> {
    let theme_config = config.load_theme_config()?;
    let resolved = theme::resolve(theme_config, &AdminRegistry, &config.static_files.url)?;
    Ok(resolved)
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /                         # Redirects to /admin/
/// ├── /health                   # Health check (public)
/// ├── POST /graphql             # GraphQL API (JWT resolved per request)
/// ├── /admin/                   # Admin console (session cookie)
/// └── /static/                  # Theme and vendor assets
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (GraphQL route only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // The middleware never rejects; resolvers decide based on the AuthContext
    let auth_state = AuthState::new(state.db.clone(), state.jwt_secret());
    let graphql_routes = Router::new()
        .route("/graphql", post(graphql::graphql_handler))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            authenticate_request,
        ));

    let redirects = Router::new()
        .route("/", get(|| async { Redirect::permanent("/admin/") }))
        .route("/admin", get(|| async { Redirect::permanent("/admin/") }));

    let static_files = ServeDir::new(&state.config.static_files.root);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;
    let static_mount = state.config.static_mount();

    Router::new()
        .merge(redirects)
        .merge(health_routes)
        .merge(graphql_routes)
        .merge(admin::router())
        .nest_service(&static_mount, static_files)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}
