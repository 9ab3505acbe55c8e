use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Default dotenv file, resolved against the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Runtime configuration for the board server.
///
/// Built once at startup and passed by value to whatever needs it; there is
/// no process-wide config instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub database_path: PathBuf,
    pub admin: AdminSeed,
}

/// Credentials for the admin account created at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Look up `key`, falling back only when it is absent. A key set to the
/// empty string yields the empty string.
pub fn get_env<F>(lookup: &F, key: &str, fallback: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| fallback.to_string())
}

/// Parse a dotenv file into a map without touching the process environment.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to open env file {}", path.display()))?;
    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) =
            item.with_context(|| format!("Failed to parse env file {}", path.display()))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

impl AppConfig {
    /// Load configuration from the process environment and a dotenv file.
    ///
    /// Process variables win over file values. With `env_file = None` a
    /// missing `.env` is not an error; an explicitly named file must exist.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        let file_vars = match env_file {
            Some(path) => read_env_file(path)?,
            None => {
                let default = Path::new(DEFAULT_ENV_FILE);
                if default.exists() {
                    read_env_file(default)?
                } else {
                    tracing::debug!("No .env file found, using process environment only");
                    HashMap::new()
                }
            }
        };
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file_vars.get(key).cloned()))
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port_str = get_env(&lookup, "PORT", "3030");
        let port = port_str
            .trim()
            .parse::<u16>()
            .with_context(|| format!("Invalid PORT value '{}'", port_str))?;

        Ok(Self {
            port,
            database_path: PathBuf::from(get_env(
                &lookup,
                "DATABASE_PATH",
                "data/project-board.db",
            )),
            admin: AdminSeed {
                name: get_env(&lookup, "ADMIN_NAME", "Super admin"),
                email: get_env(&lookup, "ADMIN_EMAIL", "admin@example.com"),
                password: get_env(&lookup, "ADMIN_PASSWORD", "admin123"),
            },
        })
    }
}
