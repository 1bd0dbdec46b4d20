//! Server configuration loaded from TOML.
//!
//! The file is `mixer.toml` in the working directory unless `MIXER_CONFIG`
//! points elsewhere. Every field has a default, so a missing file yields the
//! default configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use mixer_pool::PoolConfig;

const DEFAULT_CONFIG_FILE: &str = "mixer.toml";
const CONFIG_ENV: &str = "MIXER_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub note: NoteConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeysConfig {
    #[serde(default = "default_keys_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteConfig {
    #[serde(default = "default_asset")]
    pub asset: String,
    /// Denomination as written in note tokens, e.g. `0.1`
    #[serde(default = "default_denomination_label")]
    pub denomination_label: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            dir: default_keys_dir(),
        }
    }
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            asset: default_asset(),
            denomination_label: default_denomination_label(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3001))
}

fn default_keys_dir() -> PathBuf {
    PathBuf::from("keys")
}

fn default_asset() -> String {
    "eth".to_string()
}

fn default_denomination_label() -> String {
    "0.1".to_string()
}

impl Config {
    /// Load from `$MIXER_CONFIG`, else `mixer.toml`, else defaults.
    ///
    /// An explicitly configured path that does not exist is an error.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.pool.validate().context("Invalid [pool] section")?;
        if config.note.asset.contains('-') || config.note.denomination_label.contains('-') {
            anyhow::bail!("[note] asset and denomination_label must not contain '-'");
        }
        Ok(config)
    }
}
