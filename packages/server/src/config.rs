use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Largest accepted profile image, in bytes.
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 2 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Exact origins that receive `Access-Control-Allow-Origin`.
    pub allow_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL. Takes precedence over the individual fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub charset: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Directory holding uploaded profile images, also served under `/uploads`.
    pub dir: PathBuf,
    pub max_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Build the configuration, resolving the flat deployment variables
    /// (`DB_HOST`, `APP_PORT`, ...) through `lookup`.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let s = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("database.host", "127.0.0.1")?
            .set_default("database.port", 3306)?
            .set_default("database.user", "root")?
            .set_default("database.password", "")?
            .set_default("database.name", "mahasiswa")?
            .set_default("database.charset", "utf8mb4")?
            .set_default("upload.dir", "./uploads")?
            .set_default("upload.max_size", DEFAULT_MAX_UPLOAD_SIZE)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., MAHASISWA__DATABASE__HOST)
            .add_source(Environment::with_prefix("MAHASISWA").separator("__"))
            .set_override_option("database.host", var("DB_HOST"))?
            .set_override_option("database.port", var("DB_PORT"))?
            .set_override_option("database.user", var("DB_USER"))?
            .set_override_option("database.password", var("DB_PASS"))?
            .set_override_option("database.name", var("DB_NAME"))?
            .set_override_option("database.charset", var("DB_CHARSET"))?
            .set_override_option("upload.dir", var("APP_UPLOAD_DIR"))?
            .set_override_option("server.port", var("APP_PORT"))?
            .set_override_option(
                "server.cors.allow_origins",
                var("FRONTEND_ORIGINS").map(|v| parse_origins(&v)),
            )?
            .build()?;

        s.try_deserialize()
    }
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.to_string();
        }
        format!(
            "mysql://{}:{}@{}:{}/{}?charset={}",
            encode_userinfo(&self.user),
            encode_userinfo(&self.password),
            self.host,
            self.port,
            self.name,
            self.charset
        )
    }
}

/// Split a comma-separated origin list, dropping blank entries.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

/// Percent-encode a URL userinfo component (RFC 3986 unreserved set kept).
fn encode_userinfo(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
