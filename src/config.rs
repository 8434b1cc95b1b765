use std::{
    fs, io,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;

use crate::{error::SetupError, options::OptionOverride, probe::VULKAN_DATA_DIRS};

const APP_DIR: &str = "gamesetup";
const SETTINGS_FILE: &str = "config.toml";

// ── Settings file ─────────────────────────────────────────────────────────────

/// User settings read from `config.toml`. Every field has a default, so a
/// missing file or a partial one is fine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default installation folder; `~` is expanded when used.
    pub game_path: String,
    /// Upper bound for a single probe command.
    pub probe_timeout_secs: u64,
    pub vulkan_data_dirs: Vec<PathBuf>,
    /// Overrides the `lspci` based discrete-GPU detection.
    pub prefer_dri_prime: Option<bool>,
    /// `Exec=` line of created launchers; `{game_id}` is substituted.
    pub shortcut_exec: String,
    /// Games the dry-run interpreter treats as already installed.
    pub installed_games: Vec<String>,
    pub runners: IndexMap<String, RunnerSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    pub system_options_override: Vec<OptionOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            game_path: "~/Games".to_string(),
            probe_timeout_secs: 5,
            vulkan_data_dirs: VULKAN_DATA_DIRS.iter().map(PathBuf::from).collect(),
            prefer_dri_prime: None,
            shortcut_exec: "lutris lutris:rungameid/{game_id}".to_string(),
            installed_games: Vec::new(),
            runners: IndexMap::new(),
        }
    }
}

impl Settings {
    /// `<config dir>/gamesetup/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Reads `path`, or the default location when `None`.
    /// A file that does not exist yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SetupError> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Ok(Settings::default()),
        };

        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!("Loading settings from {}", path.display());
                Self::parse(&text)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", path.display());
                Ok(Settings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(text: &str) -> Result<Self, SetupError> {
        Ok(toml::from_str(text)?)
    }
}

// ── Installer choices ─────────────────────────────────────────────────────────

/// Shortcut flags collected while the installer runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallChoices {
    pub create_desktop_shortcut: bool,
    pub create_menu_shortcut: bool,
    pub create_library_shortcut: bool,
}
