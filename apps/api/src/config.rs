use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    /// Explicit path to the PDFium shared library. Falls back to discovery when unset.
    pub pdfium_library_path: Option<String>,
    /// Scale factor applied to the first resume page when rendering the preview image.
    pub render_scale: f32,
    pub max_upload_bytes: usize,
    /// How long finished submissions stay on the status board.
    pub status_retention_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            pdfium_library_path: std::env::var("PDFIUM_DYNAMIC_LIB_PATH").ok(),
            render_scale: parse_env_or("RENDER_SCALE", 4.0_f32)
                .context("RENDER_SCALE must be a number")?,
            max_upload_bytes: parse_env_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024_usize)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            status_retention_secs: parse_env_or("STATUS_RETENTION_SECS", 3600_u64)
                .context("STATUS_RETENTION_SECS must be a number of seconds")?,
            port: parse_env_or("PORT", 8080_u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}
