use std::{env, path::PathBuf};

use crate::{errors::DashError, models::connections::ConnectionConfig};

pub const ACCOUNT_VAR: &str = "SNOWDASH_ACCOUNT";
pub const BASE_URL_VAR: &str = "SNOWDASH_BASE_URL";
pub const ROLE_VAR: &str = "SNOWDASH_ROLE";
pub const LOG_FILE_VAR: &str = "SNOWDASH_LOG_FILE";

/// Startup settings, read once from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, DashError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DashError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let account = get(ACCOUNT_VAR)
            .ok_or_else(|| DashError::Config(format!("{} must be set", ACCOUNT_VAR)))?;
        if !account
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(DashError::Config(format!(
                "{} contains invalid characters: {}",
                ACCOUNT_VAR, account
            )));
        }

        let mut connection = ConnectionConfig::for_account(&account);
        if let Some(base_url) = get(BASE_URL_VAR) {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(DashError::Config(format!(
                    "{} must start with http:// or https://",
                    BASE_URL_VAR
                )));
            }
            connection.base_url = base_url;
        }
        connection.role = get(ROLE_VAR);

        Ok(Self {
            connection,
            log_file: get(LOG_FILE_VAR).map(PathBuf::from),
        })
    }
}
