/// Configuration management for the API server
///
/// This module loads configuration from environment variables (and a `.env`
/// file when present) into a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: Bind address (default: 0.0.0.0:8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Access token secret (required, 32+ chars)
/// - `JWT_LIFETIME_SECONDS`: Access token lifetime (default: 3600)
/// - `RESET_PASSWORD_TOKEN_SECRET`: Reset token secret (required, 32+ chars)
/// - `VERIFICATION_TOKEN_SECRET`: Verification token secret (required, 32+ chars)
/// - `IMAGEKIT_PRIVATE_KEY`: Object store credentials (required)
/// - `IMAGEKIT_UPLOAD_URL`: Object store upload endpoint
/// - `UPLOAD_TAG`: Provenance tag attached to stored files (default: uploaded_via_feedhub)
/// - `UPLOAD_TMP_DIR`: Staging directory (default: system temp dir)
/// - `MAX_UPLOAD_BYTES`: Request body limit (default: 100 MiB)
/// - `STORAGE_TIMEOUT_SECONDS`: Object store request timeout (default: 120)
/// - `RUST_LOG` / `LOG_FORMAT`: Log filter and `json` output switch
///
/// # Example
///
/// ```no_run
/// use feedhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use feedhub_shared::db::pool::DatabaseConfig as PoolConfig;
use feedhub_shared::storage::ImageKitConfig;
use feedhub_shared::storage::imagekit::DEFAULT_UPLOAD_URL;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Minimum length for every token secret
pub const MIN_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token secrets and lifetimes
    pub tokens: TokensConfig,

    /// Object store and upload staging
    pub storage: StorageConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means any
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS on)
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

/// Token configuration
///
/// Each token purpose has its own secret so that leaking one cannot be used
/// to forge another kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensConfig {
    /// Secret for access tokens
    pub access_secret: String,

    /// Access token lifetime in seconds
    pub access_lifetime_seconds: i64,

    /// Secret for password reset tokens
    pub reset_password_secret: String,

    /// Secret for email verification tokens
    pub verification_secret: String,
}

/// Object store and staging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// ImageKit private key
    pub imagekit_private_key: String,

    /// ImageKit upload endpoint
    pub imagekit_upload_url: String,

    /// Tag attached to every stored file
    pub upload_tag: String,

    /// Where staging files are created; `None` = system temp dir
    pub tmp_dir: Option<PathBuf>,

    /// Largest accepted request body
    pub max_upload_bytes: usize,

    /// Object store request timeout
    pub timeout_seconds: u64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    /// - Token secrets are too short or shared between purposes
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let api = ApiConfig {
            host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "API_PORT", 8080)?,
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            production: parse_or(&lookup, "PRODUCTION", false)?,
        };

        let database = DatabaseConfig {
            url: required("DATABASE_URL")?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
        };

        let tokens = TokensConfig {
            access_secret: required("JWT_SECRET")?,
            access_lifetime_seconds: parse_or(&lookup, "JWT_LIFETIME_SECONDS", 3600)?,
            reset_password_secret: required("RESET_PASSWORD_TOKEN_SECRET")?,
            verification_secret: required("VERIFICATION_TOKEN_SECRET")?,
        };
        tokens.validate()?;

        let storage = StorageConfig {
            imagekit_private_key: required("IMAGEKIT_PRIVATE_KEY")?,
            imagekit_upload_url: lookup("IMAGEKIT_UPLOAD_URL")
                .unwrap_or_else(|| DEFAULT_UPLOAD_URL.to_string()),
            upload_tag: lookup("UPLOAD_TAG").unwrap_or_else(|| "uploaded_via_feedhub".to_string()),
            tmp_dir: lookup("UPLOAD_TMP_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 100 * 1024 * 1024)?,
            timeout_seconds: parse_or(&lookup, "STORAGE_TIMEOUT_SECONDS", 120)?,
        };

        Ok(Self {
            api,
            database,
            tokens,
            storage,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Pool settings for the shared database layer
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }

    /// ImageKit client settings
    pub fn imagekit_config(&self) -> ImageKitConfig {
        ImageKitConfig {
            private_key: self.storage.imagekit_private_key.clone(),
            upload_url: self.storage.imagekit_upload_url.clone(),
            timeout_seconds: self.storage.timeout_seconds,
        }
    }
}

impl TokensConfig {
    /// Checks secret length, lifetime and pairwise distinctness
    pub fn validate(&self) -> anyhow::Result<()> {
        let secrets = [
            ("JWT_SECRET", &self.access_secret),
            ("RESET_PASSWORD_TOKEN_SECRET", &self.reset_password_secret),
            ("VERIFICATION_TOKEN_SECRET", &self.verification_secret),
        ];

        for (name, secret) in secrets {
            if secret.len() < MIN_SECRET_LENGTH {
                anyhow::bail!("{} must be at least {} characters long", name, MIN_SECRET_LENGTH);
            }
        }

        for (i, (name_a, a)) in secrets.iter().enumerate() {
            for (name_b, b) in &secrets[i + 1..] {
                if a == b {
                    anyhow::bail!("{} and {} must be different", name_a, name_b);
                }
            }
        }

        if self.access_lifetime_seconds <= 0 {
            anyhow::bail!("JWT_LIFETIME_SECONDS must be positive");
        }

        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DATABASE_URL", "postgresql://localhost/feedhub".to_string()),
            ("JWT_SECRET", "access-secret-key-at-least-32-bytes".to_string()),
            ("RESET_PASSWORD_TOKEN_SECRET", "reset-secret-key-at-least-32-bytes!".to_string()),
            ("VERIFICATION_TOKEN_SECRET", "verify-secret-key-at-least-32-bytes".to_string()),
            ("IMAGEKIT_PRIVATE_KEY", "private_test_key".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> anyhow::Result<Config> {
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert!(!config.api.production);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.tokens.access_lifetime_seconds, 3600);
        assert_eq!(config.storage.imagekit_upload_url, DEFAULT_UPLOAD_URL);
        assert_eq!(config.storage.upload_tag, "uploaded_via_feedhub");
        assert_eq!(config.storage.tmp_dir, None);
        assert_eq!(config.storage.max_upload_bytes, 104_857_600);
        assert_eq!(config.storage.timeout_seconds, 120);
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("API_HOST", "127.0.0.1".to_string());
        vars.insert("API_PORT", "9000".to_string());
        vars.insert("CORS_ORIGINS", "https://a.example, https://b.example".to_string());
        vars.insert("PRODUCTION", "true".to_string());
        vars.insert("UPLOAD_TMP_DIR", "/var/tmp/feedhub".to_string());
        vars.insert("JWT_LIFETIME_SECONDS", "600".to_string());

        let config = load(&vars).unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(config.api.production);
        assert_eq!(config.storage.tmp_dir, Some(PathBuf::from("/var/tmp/feedhub")));
        assert_eq!(config.tokens.access_lifetime_seconds, 600);
    }

    #[test]
    fn test_missing_required_variable() {
        let mut vars = base_vars();
        vars.remove("IMAGEKIT_PRIVATE_KEY");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("IMAGEKIT_PRIVATE_KEY"));
    }

    #[test]
    fn test_invalid_number() {
        let mut vars = base_vars();
        vars.insert("API_PORT", "eighty".to_string());

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("API_PORT"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut vars = base_vars();
        vars.insert("RESET_PASSWORD_TOKEN_SECRET", "short".to_string());

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("RESET_PASSWORD_TOKEN_SECRET"));
    }

    #[test]
    fn test_shared_secret_rejected() {
        let mut vars = base_vars();
        let access = vars["JWT_SECRET"].clone();
        vars.insert("VERIFICATION_TOKEN_SECRET", access);

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("must be different"));
    }

    #[test]
    fn test_derived_configs() {
        let config = load(&base_vars()).unwrap();

        let pool = config.pool_config();
        assert_eq!(pool.url, "postgresql://localhost/feedhub");
        assert_eq!(pool.max_connections, 10);

        let imagekit = config.imagekit_config();
        assert_eq!(imagekit.private_key, "private_test_key");
        assert_eq!(imagekit.timeout_seconds, 120);
    }
}
