use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_ALLOWED_FILE_TYPES: &str = "image/jpeg,image/png,image/webp,image/gif,image/svg+xml,\
video/mp4,video/webm,video/quicktime,audio/mpeg,audio/wav,audio/ogg,model/gltf+json,model/gltf-binary,\
application/octet-stream,text/plain,application/pdf";

pub const DEFAULT_MAX_FILE_SIZE: i64 = 5 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub database_path: String,
    pub github_client_id: String,
    pub github_client_secret: String,
    pub redirect_uri: String,
    pub allowed_github_logins: String,
    pub jwt_secret_key: String,
    pub jwt_access_token_expire_minutes: i64,
    pub frontend_url: String,
    pub allowed_origins: String,
    pub allowed_file_types: String,
    pub max_file_size: u64,
    pub asset_store: String,
    #[serde(default)]
    pub media_path: Option<String>,
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_service_key: Option<String>,
    pub storage_bucket: String,
    pub log_level: String,
}

fn required(name: &str) -> Result<String, config::ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(config::ConfigError::Message(format!(
            "FATAL: Environment variable '{}' is not set in your .env file.",
            name
        ))),
    }
}

fn parse_number(name: &str, default: i64) -> Result<i64, config::ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<i64>().map_err(|_| {
            config::ConfigError::Message(format!("FATAL: '{}' must be an integer, got '{}'.", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated setting, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path).map_err(|e| {
            config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}",
                env_path.display(),
                e
            ))
        })?;

        let database_path = required("DATABASE_PATH")?;
        if Path::new(&database_path).is_relative() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: The 'DATABASE_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                database_path
            )));
        }

        let github_client_id = required("GITHUB_CLIENT_ID")?;
        let github_client_secret = required("GITHUB_CLIENT_SECRET")?;
        let redirect_uri = required("REDIRECT_URI")?;
        let frontend_url = required("FRONTEND_URL")?;

        let allowed_github_logins = required("ALLOWED_GITHUB_LOGINS")?;
        if parse_list(&allowed_github_logins).is_empty() {
            return Err(config::ConfigError::Message(
                "FATAL: 'ALLOWED_GITHUB_LOGINS' must name at least one GitHub login.".to_string(),
            ));
        }

        let jwt_secret_key = required("JWT_SECRET_KEY")?;
        if jwt_secret_key.len() < 32 {
            return Err(config::ConfigError::Message(
                "FATAL: 'JWT_SECRET_KEY' must be at least 32 characters long.".to_string(),
            ));
        }

        let jwt_access_token_expire_minutes = parse_number("JWT_ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        if jwt_access_token_expire_minutes <= 0 {
            return Err(config::ConfigError::Message(
                "FATAL: 'JWT_ACCESS_TOKEN_EXPIRE_MINUTES' must be positive.".to_string(),
            ));
        }

        let max_file_size = parse_number("MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE)?;
        if max_file_size <= 0 {
            return Err(config::ConfigError::Message(
                "FATAL: 'MAX_FILE_SIZE' must be positive.".to_string(),
            ));
        }

        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_default();
        let allowed_file_types =
            env::var("ALLOWED_FILE_TYPES").unwrap_or_else(|_| DEFAULT_ALLOWED_FILE_TYPES.to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let storage_bucket = env::var("STORAGE_BUCKET").unwrap_or_else(|_| "media".to_string());

        let asset_store = env::var("ASSET_STORE").unwrap_or_else(|_| "local".to_string());
        let mut builder = config::Config::builder()
            .set_default("web.host", "127.0.0.1")?
            .set_default("web.port", 8000_i64)?
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml).required(false));

        match asset_store.as_str() {
            "local" => {
                let media_path = required("MEDIA_PATH")?;
                if Path::new(&media_path).is_relative() {
                    return Err(config::ConfigError::Message(format!(
                        "FATAL: The 'MEDIA_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                        media_path
                    )));
                }
                builder = builder
                    .set_override("media_path", media_path)?
                    .set_override("public_base_url", required("PUBLIC_BASE_URL")?)?;
            }
            "supabase" => {
                builder = builder
                    .set_override("supabase_url", required("SUPABASE_URL")?)?
                    .set_override("supabase_service_key", required("SUPABASE_SERVICE_KEY")?)?;
            }
            other => {
                return Err(config::ConfigError::Message(format!(
                    "FATAL: 'ASSET_STORE' must be 'local' or 'supabase', got '{}'.",
                    other
                )));
            }
        }

        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("web.host", host)?;
        }
        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("web.port", port)?;
        }

        builder
            .set_override("database_path", database_path)?
            .set_override("github_client_id", github_client_id)?
            .set_override("github_client_secret", github_client_secret)?
            .set_override("redirect_uri", redirect_uri)?
            .set_override("allowed_github_logins", allowed_github_logins)?
            .set_override("jwt_secret_key", jwt_secret_key)?
            .set_override("jwt_access_token_expire_minutes", jwt_access_token_expire_minutes)?
            .set_override("frontend_url", frontend_url)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("allowed_file_types", allowed_file_types)?
            .set_override("max_file_size", max_file_size)?
            .set_override("asset_store", asset_store)?
            .set_override("storage_bucket", storage_bucket)?
            .set_override("log_level", log_level)?
            .build()?
            .try_deserialize()
    }

    /// Full path of the SQLite database file.
    pub fn database_file(&self) -> PathBuf {
        PathBuf::from(&self.database_path).join("content.db")
    }

    pub fn allowed_logins(&self) -> Vec<String> {
        parse_list(&self.allowed_github_logins)
    }

    pub fn allowed_mime_types(&self) -> Vec<String> {
        parse_list(&self.allowed_file_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_drop_blank_entries() {
        assert_eq!(parse_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_list(" , ").is_empty());
    }

    #[test]
    fn default_file_types_cover_the_usual_media() {
        let types = parse_list(DEFAULT_ALLOWED_FILE_TYPES);
        assert_eq!(types.len(), 16);
        assert!(types.contains(&"image/png".to_string()));
        assert!(types.contains(&"model/gltf-binary".to_string()));
    }
}
