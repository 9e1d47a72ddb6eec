//! Configuration file management for pantry.
//!
//! Provides a TOML-based config file at `~/.config/pantry/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use pantry_core::CommandSuggester;
use pantry_db::config::DbConfig;

/// Owner id used when nothing else is configured.
pub const DEFAULT_OWNER: &str = "default";

/// Env var naming the owner whose pantry the CLI operates on.
pub const OWNER_ENV_VAR: &str = "PANTRY_OWNER";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub owner: OwnerSection,
    #[serde(default)]
    pub suggest: SuggestSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerSection {
    pub id: String,
}

impl Default for OwnerSection {
    fn default() -> Self {
        Self {
            id: DEFAULT_OWNER.to_string(),
        }
    }
}

/// The external command that proposes recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestSection {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Unset means wait as long as the command takes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for SuggestSection {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            args: vec!["-p".to_string()],
            timeout_secs: None,
        }
    }
}

impl SuggestSection {
    pub fn suggester(&self) -> CommandSuggester {
        let suggester = CommandSuggester::new(self.command.clone(), self.args.clone());
        match self.timeout_secs {
            Some(secs) => suggester.with_timeout(Duration::from_secs(secs)),
            None => suggester,
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the pantry config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/pantry` or `~/.config/pantry`,
/// never the platform-specific `dirs::config_dir()`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("pantry");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("pantry")
}

/// Return the path to the pantry config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The database URL may carry a password.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PantryConfig {
    pub db_config: DbConfig,
    pub owner_id: String,
    pub suggest: SuggestSection,
}

impl PantryConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `PANTRY_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Owner: `cli_owner` > `PANTRY_OWNER` > `owner.id` > `"default"`
    /// - Suggestion command: `[suggest]` section > `claude -p`
    ///
    /// A config file that exists but does not parse is an error.
    pub fn resolve(cli_db_url: Option<&str>, cli_owner: Option<&str>) -> Result<Self> {
        let file_config = if config_path().exists() {
            Some(load_config()?)
        } else {
            None
        };
        Ok(Self::from_sources(cli_db_url, cli_owner, file_config))
    }

    fn from_sources(
        cli_db_url: Option<&str>,
        cli_owner: Option<&str>,
        file_config: Option<ConfigFile>,
    ) -> Self {
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let owner_id = if let Some(owner) = cli_owner {
            owner.to_string()
        } else if let Ok(owner) = std::env::var(OWNER_ENV_VAR) {
            owner
        } else if let Some(ref cfg) = file_config {
            cfg.owner.id.clone()
        } else {
            DEFAULT_OWNER.to_string()
        };

        let suggest = file_config.map(|cfg| cfg.suggest).unwrap_or_default();

        Self {
            db_config: DbConfig::new(db_url),
            owner_id,
            suggest,
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
