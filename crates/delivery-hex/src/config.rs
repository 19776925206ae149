use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fmt;

use crate::application::auth_service::AuthConfig;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Work factors bcrypt accepts.
pub const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let server_port = lookup("SERVER_PORT").unwrap_or_else(|| "8081".into());
        let database_url = lookup("DATABASE_URL");
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        let token_ttl_hours = match lookup("TOKEN_TTL_HOURS") {
            Some(v) => v.parse().context("TOKEN_TTL_HOURS must be an integer")?,
            None => 24,
        };
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            anyhow::bail!("TOKEN_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS}");
        }
        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(v) => v.parse().context("BCRYPT_COST must be an integer")?,
            None => bcrypt::DEFAULT_COST,
        };
        if !BCRYPT_COST_RANGE.contains(&bcrypt_cost) {
            anyhow::bail!(
                "BCRYPT_COST must be between {} and {}",
                BCRYPT_COST_RANGE.start(),
                BCRYPT_COST_RANGE.end()
            );
        }
        Ok(Self {
            server_port,
            database_url,
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost,
        })
    }

    pub fn auth(&self) -> anyhow::Result<AuthConfig> {
        let token_ttl = chrono::Duration::try_hours(self.token_ttl_hours)
            .context("TOKEN_TTL_HOURS out of range")?;
        Ok(AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            token_ttl,
            bcrypt_cost: self.bcrypt_cost,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}
