use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub query_timeout: Duration,
    pub busy_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = var("MPJ_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("MPJ_JWT_SECRET is unset or still a placeholder");
        }

        let host = var("MPJ_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("MPJ_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("MPJ_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("MPJ_HOST/MPJ_PORT do not form a socket address")?;

        Ok(Self {
            db_path: var("MPJ_DB_PATH").unwrap_or_else(|| "mpj.db".into()).into(),
            addr,
            jwt_secret,
            jwt_issuer: var("MPJ_JWT_ISSUER").filter(|v| !v.is_empty()),
            jwt_audience: var("MPJ_JWT_AUDIENCE").filter(|v| !v.is_empty()),
            query_timeout: millis(&var, "MPJ_QUERY_TIMEOUT_MS", 5000)?,
            busy_timeout: millis(&var, "MPJ_BUSY_TIMEOUT_MS", 2000)?,
        })
    }
}

fn millis(var: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<Duration> {
    let ms = match var(key) {
        Some(v) => v.parse().with_context(|| format!("{} must be a number of milliseconds", key))?,
        None => default,
    };
    Ok(Duration::from_millis(ms))
}
