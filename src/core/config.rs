//! Credentials and datastore selection.
//!
//! Values come from a `.env` file in the working directory (loaded once at
//! startup through `dotenvy`) and then the process environment, which wins.

use std::path::PathBuf;

use clap::ValueEnum;
use dirs::data_dir;

use crate::error::{ImportError, Result};

pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_ENV: &str = "SUPABASE_KEY";
pub const API_KEY_ENV: &str = "CBDB_API_KEY";
pub const API_KEY_ENV_ALT: &str = "CBBD_API_KEY";
pub const API_BASE_ENV: &str = "CBBD_API_BASE";

/// Base URL of the CollegeBasketballData API.
pub const DEFAULT_API_BASE: &str = "https://api.collegebasketballdata.com";

/// Load `.env` if present. Missing files are not an error.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }
}

/// Read an environment variable, treating empty values as unset.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_env(name: &str) -> Result<String> {
    env_var(name).ok_or_else(|| ImportError::MissingEnv {
        var: name.to_string(),
    })
}

/// Stats API location and bearer token.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub base_url: String,
    pub api_key: String,
}

impl ApiCredentials {
    pub fn from_env() -> Result<Self> {
        let api_key = env_var(API_KEY_ENV)
            .or_else(|| env_var(API_KEY_ENV_ALT))
            .ok_or_else(|| ImportError::MissingEnv {
                var: API_KEY_ENV.to_string(),
            })?;
        let base_url = env_var(API_BASE_ENV).unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

/// Hosted datastore project URL and service key.
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub url: String,
    pub key: String,
}

impl StoreCredentials {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: require_env(SUPABASE_URL_ENV)?.trim_end_matches('/').to_string(),
            key: require_env(SUPABASE_KEY_ENV)?,
        })
    }

    fn present() -> bool {
        env_var(SUPABASE_URL_ENV).is_some() && env_var(SUPABASE_KEY_ENV).is_some()
    }
}

/// Which datastore backend to write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendChoice {
    /// Hosted REST datastore when its credentials are set, SQLite otherwise.
    #[default]
    Auto,
    /// Local SQLite file.
    Sqlite,
    /// Hosted PostgREST endpoint (`SUPABASE_URL` / `SUPABASE_KEY`).
    Postgrest,
}

/// Resolved datastore target.
#[derive(Debug, Clone)]
pub enum StoreTarget {
    Sqlite(PathBuf),
    Postgrest(StoreCredentials),
}

/// Pick the datastore from the CLI choice and environment.
pub fn resolve_store_target(choice: BackendChoice, database: Option<PathBuf>) -> Result<StoreTarget> {
    match choice {
        BackendChoice::Postgrest => Ok(StoreTarget::Postgrest(StoreCredentials::from_env()?)),
        BackendChoice::Sqlite => Ok(StoreTarget::Sqlite(match database {
            Some(path) => path,
            None => default_database_path()?,
        })),
        BackendChoice::Auto => {
            if database.is_none() && StoreCredentials::present() {
                Ok(StoreTarget::Postgrest(StoreCredentials::from_env()?))
            } else {
                resolve_store_target(BackendChoice::Sqlite, database)
            }
        }
    }
}

/// Default SQLite location under the platform data directory.
pub fn default_database_path() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| ImportError::Aborted {
        reason: "could not determine data directory; pass --database".to_string(),
    })?;
    Ok(base.join("hoops-import").join("hoops.db"))
}

/// Show only the first `visible` characters of a secret.
pub fn mask(secret: &str, visible: usize) -> String {
    let prefix: String = secret.chars().take(visible).collect();
    format!("{prefix}...")
}

/// Which credentials are loaded, with secrets masked.
pub fn env_report() -> Vec<(&'static str, Option<String>)> {
    vec![
        (SUPABASE_URL_ENV, env_var(SUPABASE_URL_ENV)),
        (SUPABASE_KEY_ENV, env_var(SUPABASE_KEY_ENV).map(|k| mask(&k, 20))),
        (
            API_KEY_ENV,
            env_var(API_KEY_ENV)
                .or_else(|| env_var(API_KEY_ENV_ALT))
                .map(|k| mask(&k, 20)),
        ),
        (API_BASE_ENV, Some(env_var(API_BASE_ENV).unwrap_or_else(|| DEFAULT_API_BASE.to_string()))),
    ]
}
