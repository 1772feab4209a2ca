//! `.env` discovery and key lookup.
//!
//! Values from the process environment always win over the file, so a
//! single setting can be overridden without editing it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use otbot_core::Config;
use tracing::debug;

/// Application name used for the config directory path
const APP_NAME: &str = "ot-bot";

const ENV_FILE: &str = ".env";

#[derive(Debug, Default)]
pub struct EnvFile {
    pub path: Option<PathBuf>,
    vars: HashMap<String, String>,
}

impl EnvFile {
    /// Load `explicit` if given (it must exist), otherwise the first of
    /// `./.env` and `<config dir>/ot-bot/.env` that exists, otherwise nothing.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let cwd = std::env::current_dir().context("Could not determine working directory")?;
        match default_location(&cwd, dirs::config_dir()) {
            Some(path) => Self::load(&path),
            None => {
                debug!("No env file found, using process environment only");
                Ok(Self::default())
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let iter = dotenvy::from_path_iter(path)
            .with_context(|| format!("Error loading env file {}", path.display()))?;

        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) =
                item.with_context(|| format!("Error parsing env file {}", path.display()))?;
            vars.insert(key, value);
        }

        debug!(path = %path.display(), count = vars.len(), "Env file loaded");
        Ok(Self {
            path: Some(path.to_path_buf()),
            vars,
        })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().or_else(|| self.vars.get(key).cloned())
    }

    pub fn config(&self) -> otbot_core::Result<Config> {
        Config::from_lookup(|key| self.get(key))
    }
}

fn default_location(cwd: &Path, config_dir: Option<PathBuf>) -> Option<PathBuf> {
    let local = cwd.join(ENV_FILE);
    if local.is_file() {
        return Some(local);
    }
    config_dir
        .map(|dir| dir.join(APP_NAME).join(ENV_FILE))
        .filter(|path| path.is_file())
}
