use std::path::PathBuf;

use anyhow::{Context, Result};
use storage::StorageBackendKind;
use storage::backend::BackendSettings;

pub const DEFAULT_IDENTITY_HEADER: &str = "x-authenticated-user";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: BackendSettings,
    pub mirror_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub projects_dir: Option<PathBuf>,
    pub identity_header: String,
    pub api_keys: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind: StorageBackendKind = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse().context("Invalid STORAGE_BACKEND")?,
            None => StorageBackendKind::default(),
        };

        let database_url = lookup("DATABASE_URL");
        if kind == StorageBackendKind::Sqlite && database_url.is_none() {
            anyhow::bail!("Cannot load DATABASE_URL env variable");
        }

        Ok(Self {
            host: lookup("HOST").context("Cannot load HOST env variable")?,
            port: lookup("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            backend: BackendSettings {
                kind,
                database_url,
                flat_file_path: lookup("FLAT_FILE_PATH")
                    .unwrap_or_else(|| "data/ratings.json".to_string())
                    .into(),
            },
            mirror_dir: lookup("MIRROR_DIR")
                .unwrap_or_else(|| "data/mirror".to_string())
                .into(),
            catalog_path: lookup("CATALOG_PATH")
                .unwrap_or_else(|| "data/projects.json".to_string())
                .into(),
            projects_dir: lookup("PROJECTS_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            identity_header: lookup("IDENTITY_HEADER")
                .unwrap_or_else(|| DEFAULT_IDENTITY_HEADER.to_string()),
            api_keys: lookup("API_KEYS").unwrap_or_default(),
        })
    }
}
