/// Configuration management for the API server
///
/// Server, database and JWT settings come from environment variables (a
/// `.env` file is honoured in development). The admin theme lives in a
/// separate TOML file loaded with the `config` crate.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: comma-separated allowed origins, `*` for any (default: *)
/// - `PRODUCTION`: enables HSTS and secure cookies (default: false)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 characters (required)
/// - `JWT_EXPIRATION_DAYS`: token lifetime in days (default: 9999)
/// - `STATIC_URL`: public prefix of static assets (default: /static/)
/// - `STATIC_ROOT`: directory served under `STATIC_URL` (default: static)
/// - `ADMIN_THEME_FILE`: theme TOML file (default: admin.toml)
/// - `RUST_LOG`: Log level (default: debug for FuelDesk crates)
///
/// # Example
///
/// ```no_run
/// use fueldesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let theme = config.load_theme_config()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use fueldesk_shared::theme::ThemeConfig;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Static asset serving
    pub static_files: StaticConfig,

    /// Admin console configuration
    pub admin: AdminConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in days
    pub expiration_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticConfig {
    /// URL prefix, e.g. `/static/`
    pub url: String,

    /// Directory on disk
    pub root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Path of the theme TOML file; a missing file means all defaults
    pub theme_file: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    /// - `JWT_SECRET` is shorter than 32 characters
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let production = env::var("PRODUCTION")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expiration_days = env::var("JWT_EXPIRATION_DAYS")
            .unwrap_or_else(|_| "9999".to_string())
            .parse::<i64>()?;

        if expiration_days <= 0 {
            anyhow::bail!("JWT_EXPIRATION_DAYS must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_days,
            },
            static_files: StaticConfig {
                url: env::var("STATIC_URL").unwrap_or_else(|_| "/static/".to_string()),
                root: env::var("STATIC_ROOT").unwrap_or_else(|_| "static".to_string()),
            },
            admin: AdminConfig {
                theme_file: env::var("ADMIN_THEME_FILE")
                    .unwrap_or_else(|_| "admin.toml".to_string()),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Lifetime of issued tokens
    pub fn jwt_expiration(&self) -> chrono::Duration {
        chrono::Duration::days(self.jwt.expiration_days)
    }

    /// Static URL prefix without its trailing slash, as used for routing
    pub fn static_mount(&self) -> String {
        let trimmed = self.static_files.url.trim_end_matches('/');
        if trimmed.is_empty() {
            "/static".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Reads the admin theme file
    pub fn load_theme_config(&self) -> anyhow::Result<ThemeConfig> {
        load_theme_file(&self.admin.theme_file)
    }
}

/// Reads a theme TOML file with `[site_settings]` and `[ui_tweaks]` tables
///
/// A missing file yields the defaults.
pub fn load_theme_file(path: &str) -> anyhow::Result<ThemeConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::new(path, config::FileFormat::Toml).required(false))
        .build()?;

    let theme = settings.try_deserialize::<ThemeConfig>()?;
    tracing::debug!(path, "Loaded admin theme configuration");

    Ok(theme)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expiration_days: 9999,
            },
            static_files: StaticConfig {
                url: "/static/".to_string(),
                root: "static".to_string(),
            },
            admin: AdminConfig {
                theme_file: "admin.toml".to_string(),
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_static_mount() {
        let mut config = test_config();
        assert_eq!(config.static_mount(), "/static");

        config.static_files.url = "/".to_string();
        assert_eq!(config.static_mount(), "/static");
    }

    #[test]
    fn test_jwt_expiration() {
        assert_eq!(test_config().jwt_expiration().num_days(), 9999);
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example,,"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_missing_theme_file_yields_defaults() {
        let theme = load_theme_file("/nonexistent/fueldesk-admin.toml").unwrap();
        assert!(theme.site_settings.site_title.is_none());
    }

    #[test]
    fn test_theme_file_is_parsed() {
        let path = std::env::temp_dir().join(format!("fueldesk-theme-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
[site_settings]
site_title = "Fuel Admin"
hide_apps = ["Auth"]

[ui_tweaks]
theme = "flatly"
navbar_fixed = true
"#,
        )
        .unwrap();

        let theme = load_theme_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(theme.site_settings.site_title.as_deref(), Some("Fuel Admin"));
        assert_eq!(theme.ui_tweaks.theme.as_deref(), Some("flatly"));
    }
}
