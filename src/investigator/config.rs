use anyhow::{Context, Result};

use crate::error::SchemaDocError;

/// Raw connection settings as given on the command line or in the environment
#[derive(Debug, Clone, Default)]
pub struct ConnectionSettings {
    pub host: Option<String>,
    pub port: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Validated PostgreSQL connection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ConnectionConfig {
    /// Every setting is required; the error lists all missing variables at once
    pub fn from_settings(settings: ConnectionSettings) -> Result<Self> {
        let required = [
            ("DB_USER", &settings.user),
            ("DB_PASS", &settings.password),
            ("DB_HOST", &settings.host),
            ("DB_PORT", &settings.port),
            ("DB_NAME", &settings.database),
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaDocError::MissingConnectionSettings(missing).into());
        }

        let port = settings
            .port
            .unwrap_or_default()
            .trim()
            .parse::<u16>()
            .context("DB_PORT must be a port number")?;

        Ok(Self {
            host: settings.host.unwrap_or_default(),
            port,
            database: settings.database.unwrap_or_default(),
            user: settings.user.unwrap_or_default(),
            password: settings.password.unwrap_or_default(),
        })
    }

    /// Connection URL with the password masked, for logs
    pub fn display_url(&self) -> String {
        format!(
            "postgres://{}:********@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}
