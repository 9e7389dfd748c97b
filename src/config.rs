use std::net::SocketAddr;

use anyhow::{anyhow, Context};

use crate::realtime::JoinPolicy;

const DEFAULT_DATABASE_URL: &str = "sqlite://handsup.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub auth_secret: String,
    pub session_idle_minutes: i64,
    pub db_max_connections: u32,
    pub join_policy: JoinPolicy,
}

impl Config {
    /// Reads the process environment, honouring a `.env` file if one exists.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned())
            .parse()
            .context("BIND_ADDR is not a socket address")?;

        let auth_secret = lookup("AUTH_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| anyhow!("AUTH_SECRET must be set"))?;

        let session_idle_minutes = match lookup("SESSION_IDLE_MINUTES") {
            Some(raw) => raw.parse().context("SESSION_IDLE_MINUTES is not an integer")?,
            None => 5,
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().context("DB_MAX_CONNECTIONS is not an integer")?,
            None => 16,
        };

        let join_policy = match lookup("REALTIME_JOIN_POLICY") {
            Some(raw) => raw.parse::<JoinPolicy>().map_err(|err| anyhow!("REALTIME_JOIN_POLICY: {err}"))?,
            None => JoinPolicy::default(),
        };

        Ok(Config {
            database_url,
            bind_addr,
            auth_secret,
            session_idle_minutes,
            db_max_connections,
            join_policy,
        })
    }
}
