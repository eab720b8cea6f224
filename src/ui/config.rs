use crate::{muted_error, pd_warn, weak_error};
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Application user interface config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UIConfig {
    /// Colorize console output (ignored when stdout is not a terminal).
    pub color: bool,
    /// Save command history in a regular file.
    pub save_history: bool,
    /// Shell prompt.
    pub prompt: String,
    /// Print the watch list after every halt banner.
    pub show_watches_on_halt: bool,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            color: true,
            save_history: false,
            prompt: "(pdb) ".to_string(),
            show_watches_on_halt: true,
        }
    }
}

impl UIConfig {
    const DEFAULT_PATH: &'static str = ".config/plugdb/config.toml";
    const HISTORY_PATH: &'static str = ".config/plugdb/history";

    /// Parse config from toml text, unknown keys are ignored.
    pub fn from_toml(data: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(data)
    }

    /// Load config from file (or from the default location if `path` is `None`).
    /// A missing default file or a malformed file gives default config.
    pub fn from_file(path: Option<&Path>) -> Self {
        let data = match path {
            None => {
                let Some(path) = home::home_dir().map(|home| home.join(Self::DEFAULT_PATH))
                else {
                    return Self::default();
                };
                match muted_error!(read_to_string(path)) {
                    Some(data) => data,
                    None => return Self::default(),
                }
            }
            Some(path) => match read_to_string(path) {
                Ok(data) => data,
                Err(err) => {
                    pd_warn!("error while load config file {}: {err}", path.display());
                    return Self::default();
                }
            },
        };

        weak_error!(Self::from_toml(&data), "malformed config file:").unwrap_or_default()
    }

    /// Location of a persisted command history.
    pub fn history_path() -> Option<PathBuf> {
        home::home_dir().map(|home| home.join(Self::HISTORY_PATH))
    }
}

/// Read-only ui configuration (set only once, at debugger start).
static CONFIG: OnceLock<UIConfig> = OnceLock::new();

/// Set initial configuration. Only the first call takes effect.
pub fn set(config: UIConfig) {
    if CONFIG.set(config).is_err() {
        pd_warn!("ui config already set, ignore new one");
    }
}

/// Return application ui config, default one if it was never set.
pub fn current() -> &'static UIConfig {
    CONFIG.get_or_init(UIConfig::default)
}
