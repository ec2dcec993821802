use anyhow::{Context, anyhow};
use imageshare_core::content::MAX_UPLOAD_BYTES;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const DEFAULT_PEPPER: &str = "change-me-password-pepper";
const DEFAULT_TOKEN_KEY: &str = "change-me-hmac-key";
const DEFAULT_CONFIG_FILE: &str = "imageshare.toml";

/// Server configuration. Environment variables win over the optional TOML
/// file, which wins over built-in defaults.
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Database settings
    pub database_url: Option<String>,

    // Upload settings
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,

    // CORS settings
    pub cors_allowed_origins: Vec<String>,

    /// Base URL of the web client, used in verification and reset links
    pub frontend_url: String,

    // Authentication secrets (pepper for Argon2 + HMAC key for tokens)
    pub auth_password_pepper: String,
    pub auth_token_key: String,
    pub session_ttl_hours: i64,

    // Development settings
    pub dev_mode: bool,

    /// File the settings were read from, if any
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub uploads: UploadSection,
    pub auth: AuthSection,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub frontend_url: Option<String>,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadSection {
    pub dir: Option<PathBuf>,
    pub max_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSection {
    pub password_pepper: Option<String>,
    pub token_key: Option<String>,
    pub session_ttl_hours: Option<i64>,
}

impl FileConfig {
    pub fn parse(contents: &str, origin: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).map_err(|err| anyhow!("invalid config {origin}: {err}"))
    }

    fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// `$IMAGESHARE_CONFIG` must exist when set; the default file is optional.
    fn discover() -> anyhow::Result<Option<(PathBuf, Self)>> {
        if let Ok(path) = env::var("IMAGESHARE_CONFIG") {
            let path = PathBuf::from(path);
            let file = Self::load(&path)?;
            return Ok(Some((path, file)));
        }

        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            return Ok(Some((path.to_path_buf(), Self::load(path)?)));
        }
        Ok(None)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|err| anyhow!("{key} has an invalid value '{raw}': {err}")),
        None => Ok(None),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let file = FileConfig::discover()?;
        Self::resolve(file, |key| env::var(key).ok())
    }

    /// Merge defaults, an optional config file and variables from `lookup`.
    pub fn resolve(
        file: Option<(PathBuf, FileConfig)>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let (config_file, file) = match file {
            Some((path, file)) => (Some(path), file),
            None => (None, FileConfig::default()),
        };

        let config = Self {
            server_host: lookup("SERVER_HOST")
                .or(file.server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: parse_var(&lookup, "SERVER_PORT")?
                .or(file.server.port)
                .unwrap_or(3000),

            database_url: lookup("DATABASE_URL").or(file.database.url),

            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .or(file.uploads.dir)
                .unwrap_or_else(|| PathBuf::from("./uploads")),
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES")?
                .or(file.uploads.max_bytes)
                .unwrap_or(MAX_UPLOAD_BYTES),

            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|raw| split_list(&raw))
                .or(file.cors_allowed_origins)
                .unwrap_or_else(|| vec!["http://localhost:5173".to_string()]),

            frontend_url: lookup("FRONTEND_URL")
                .or(file.frontend_url)
                .unwrap_or_else(|| "http://localhost:5173".to_string()),

            auth_password_pepper: lookup("AUTH_PASSWORD_PEPPER")
                .or(file.auth.password_pepper)
                .unwrap_or_else(|| DEFAULT_PEPPER.to_string()),
            auth_token_key: lookup("AUTH_TOKEN_KEY")
                .or(file.auth.token_key)
                .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
            session_ttl_hours: parse_var(&lookup, "SESSION_TTL_HOURS")?
                .or(file.auth.session_ttl_hours)
                .unwrap_or(24 * 7),

            dev_mode: parse_var(&lookup, "DEV_MODE")?
                .or(file.dev_mode)
                .unwrap_or(false),

            config_file,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.max_upload_bytes == 0 || self.max_upload_bytes > MAX_UPLOAD_BYTES {
            return Err(anyhow!(
                "MAX_UPLOAD_BYTES must be between 1 and {MAX_UPLOAD_BYTES}"
            ));
        }
        if self.session_ttl_hours <= 0 {
            return Err(anyhow!("SESSION_TTL_HOURS must be positive"));
        }
        if let Some(url) = &self.database_url
            && !(url.starts_with("postgres://") || url.starts_with("postgresql://"))
        {
            return Err(anyhow!(
                "Invalid database URL: must start with postgres:// or postgresql://"
            ));
        }
        Ok(())
    }

    /// True while either auth secret is still the shipped placeholder.
    pub fn uses_default_secrets(&self) -> bool {
        self.auth_password_pepper == DEFAULT_PEPPER || self.auth_token_key == DEFAULT_TOKEN_KEY
    }

    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.upload_dir).with_context(|| {
            format!("failed to create upload directory {}", self.upload_dir.display())
        })?;
        Ok(())
    }
}
