//! Configuration management for the kiosk
//!
//! Stores settings in ~/.config/turnos-kiosk/config.json

use crate::api::normalize_base_url;
use crate::kiosk::machine::{DEFAULT_IDLE_SECS, DEFAULT_RETURN_SECS};
use crate::models::Branch;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable that overrides `api_base_url`
pub const API_URL_ENV: &str = "KIOSK_API_URL";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

const DEFAULT_API_URL: &str = "http://localhost:3000/api/";

const DEFAULT_PRIVACY_NOTICE: &str = "Los datos que proporciones en este kiosco se usan \
únicamente para generar y administrar tu turno de atención. No se almacenan en el \
equipo y se eliminan de la pantalla al terminar tu sesión.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// Branch served at startup
    pub branch: Branch,
    /// Branches an operator can cycle through; empty means only `branch`
    pub branches: Vec<Branch>,
    pub idle_timeout_secs: u32,
    pub return_countdown_secs: u32,
    pub request_timeout_secs: u64,
    /// Where downloaded ticket PDFs land (defaults to the user's download dir)
    pub download_dir: Option<PathBuf>,
    pub privacy_notice: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            branch: Branch::new("1", "Sucursal Centro"),
            branches: Vec::new(),
            idle_timeout_secs: DEFAULT_IDLE_SECS,
            return_countdown_secs: DEFAULT_RETURN_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            download_dir: None,
            privacy_notice: DEFAULT_PRIVACY_NOTICE.to_string(),
        }
    }
}

impl Config {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("turnos-kiosk"))
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Log file used when `--log-file` is not given
    pub fn default_log_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("turnos-kiosk.log")
    }

    /// Load config from disk (or defaults), then apply the environment override
    pub fn load() -> Self {
        let config = match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        };
        config.with_api_url_override(std::env::var(API_URL_ENV).ok())
    }

    /// Load config from a specific file. A missing file yields defaults; a
    /// corrupt one is set aside as `config.json.bak` and defaults are used.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                preserve_corrupt_config(path, &content);
                warn!(
                    path = %path.display(),
                    "config file was corrupted ({}); a backup was saved and defaults were loaded",
                    err
                );
                Self::default()
            }
        }
    }

    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        self
    }

    /// Persist `branch` as the startup branch. Runtime overrides (env, flags)
    /// are not written back.
    pub fn remember_branch(branch: &Branch) -> Result<(), String> {
        let path = Self::config_path()
            .ok_or_else(|| "Could not determine config directory".to_string())?;
        let mut stored = Self::load_from(&path);
        stored.branch = branch.clone();
        stored.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        write_config_atomic(path, &content).map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Reject settings the kiosk cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        normalize_base_url(&self.api_base_url).map_err(|e| e.to_string())?;
        if self.idle_timeout_secs == 0 {
            return Err("idle_timeout_secs must be greater than zero".to_string());
        }
        if self.return_countdown_secs == 0 {
            return Err("return_countdown_secs must be greater than zero".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }
        if self.branch.id.trim().is_empty() {
            return Err("branch id must not be empty".to_string());
        }
        Ok(())
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// All branches an operator can switch between, the startup branch first.
    pub fn branch_roster(&self) -> Vec<Branch> {
        let mut roster = vec![self.branch.clone()];
        for branch in &self.branches {
            if !roster.iter().any(|b| b.id == branch.id) {
                roster.push(branch.clone());
            }
        }
        roster
    }

    /// The branch after `current_id` in the roster, wrapping around.
    pub fn next_branch(&self, current_id: &str) -> Branch {
        let roster = self.branch_roster();
        let next = roster
            .iter()
            .position(|b| b.id == current_id)
            .map(|i| (i + 1) % roster.len())
            .unwrap_or(0);
        roster[next].clone()
    }

    /// Get the config file location for display
    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/turnos-kiosk/config.json".to_string())
    }
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let backup_path = path.with_extension("json.bak");
    if fs::rename(path, &backup_path).is_err() {
        let _ = fs::write(&backup_path, content);
    }
}

fn write_config_atomic(path: &Path, content: &str) -> Result<(), String> {
    use std::fs::OpenOptions;

    let tmp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)
        .map_err(|e| e.to_string())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
            warn!("failed to set temp config file permissions: {}", e);
        }
    }

    file.write_all(content.as_bytes())
        .map_err(|e| e.to_string())?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.to_string());
    }
    Ok(())
}
