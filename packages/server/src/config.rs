//! Runtime configuration loaded from environment variables, matching the
//! teacher's `Config::from_env` pattern.

use std::env;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    /// Identifiers granted every `Capability` by the default permission
    /// checker, comma-separated in `ADMIN_ACTOR_IDS`.
    pub admin_actor_ids: Vec<String>,
    pub default_max_pages: u32,
    pub default_max_depth: u32,
    pub embed_fan_out: usize,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse().context("PORT must be a valid number")?,
            database_url: env::var("DATABASE_URL").ok(),
            admin_actor_ids: env::var("ADMIN_ACTOR_IDS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            default_max_pages: env::var("DEFAULT_MAX_PAGES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DEFAULT_MAX_PAGES must be a valid number")?,
            default_max_depth: env::var("DEFAULT_MAX_DEPTH")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("DEFAULT_MAX_DEPTH must be a valid number")?,
            embed_fan_out: env::var("EMBED_FAN_OUT")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("EMBED_FAN_OUT must be a valid number")?,
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
                .parse()
                .context("MAX_UPLOAD_BYTES must be a valid number")?,
        })
    }
}
