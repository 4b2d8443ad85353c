//! Configuration management for codex

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::stats::{BURN_WINDOW_DAYS, DEFAULT_TARGET_WORDS};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: ThemeVariant,
    pub editor: EditorConfig,
    pub goals: GoalsConfig,
    pub sidebar: SidebarConfig,
    pub storage: StorageConfig,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    pub fn toggled(self) -> Self {
        match self {
            ThemeVariant::Dark => ThemeVariant::Light,
            ThemeVariant::Light => ThemeVariant::Dark,
        }
    }

    /// Persisted form (`dark` / `light`)
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeVariant::Dark => "dark",
            ThemeVariant::Light => "light",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(ThemeVariant::Dark),
            "light" => Some(ThemeVariant::Light),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet window before buffered edits are committed to the book
    pub commit_debounce_ms: u64,
    /// Quiet window before the library is written to disk
    pub autosave_ms: u64,
    /// Gaps between edits longer than this do not count as active time
    pub idle_threshold_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalsConfig {
    pub default_target_words: u64,
    pub burn_window_days: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    pub width: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub enabled: bool,
    pub model: String,
    pub endpoint: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: ThemeVariant::Dark,
            editor: EditorConfig::default(),
            goals: GoalsConfig::default(),
            sidebar: SidebarConfig::default(),
            storage: StorageConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            commit_debounce_ms: 1000,
            autosave_ms: 800,
            idle_threshold_secs: 120,
        }
    }
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            default_target_words: DEFAULT_TARGET_WORDS,
            burn_window_days: BURN_WINDOW_DAYS,
        }
    }
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self { width: 30 }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "gemini-3-flash-preview".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "API_KEY".to_string(),
        }
    }
}

impl Config {
    /// Get the platform-specific config file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "codex")
            .map(|proj_dirs| proj_dirs.config_dir().join("codex.toml"))
    }

    /// Directory holding the library and theme, honoring the override
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage.data_dir.clone().or_else(|| {
            directories::ProjectDirs::from("", "", "codex")
                .map(|proj_dirs| proj_dirs.data_dir().to_path_buf())
        })
    }

    /// Load configuration from the platform path, falling back to defaults if missing
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        // Check config file permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat config file: {}", path.display()))?;
            if metadata.permissions().mode() & 0o002 != 0 {
                anyhow::bail!(
                    "Config file {} is world-writable (insecure permissions)",
                    path.display()
                );
            }
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.theme, ThemeVariant::Dark);
        assert_eq!(config.editor.commit_debounce_ms, 1000);
        assert_eq!(config.goals.default_target_words, 50_000);
        assert_eq!(config.goals.burn_window_days, 7);
        assert_eq!(config.sidebar.width, 30);
        assert!(!config.assistant.enabled);
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_load_valid_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(
            b"theme = \"Light\"\n\
\n\
[editor]\n\
commit_debounce_ms = 250\n\
autosave_ms = 500\n\
idle_threshold_secs = 60\n\
\n\
[goals]\n\
default_target_words = 80000\n\
burn_window_days = 14\n\
\n\
[storage]\n\
data_dir = \"/tmp/codex-data\"\n",
        )?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.theme, ThemeVariant::Light);
        assert_eq!(config.editor.commit_debounce_ms, 250);
        assert_eq!(config.editor.idle_threshold_secs, 60);
        assert_eq!(config.goals.default_target_words, 80_000);
        assert_eq!(config.goals.burn_window_days, 14);
        assert_eq!(config.data_dir(), Some(PathBuf::from("/tmp/codex-data")));

        Ok(())
    }

    #[test]
    fn test_load_partial_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"[editor]\nautosave_ms = 2000\n")?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.theme, ThemeVariant::Dark);
        assert_eq!(config.editor.autosave_ms, 2000);
        assert_eq!(config.editor.commit_debounce_ms, 1000);
        assert_eq!(config.sidebar.width, 30);

        Ok(())
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"invalid toml [[[syntax").unwrap();

        let result = Config::load_from(file.path());
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_world_writable_config_rejected() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let file = NamedTempFile::new()?;
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o666))?;

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("world-writable"));

        Ok(())
    }

    #[test]
    fn test_config_path_returns_some() {
        let path = Config::config_path();
        assert!(path.is_some());
        if let Some(p) = path {
            assert!(p.to_string_lossy().contains("codex"));
            assert!(p.to_string_lossy().ends_with("codex.toml"));
        }
    }

    #[test]
    fn test_theme_variant_serialization() -> Result<()> {
        let config = Config {
            theme: ThemeVariant::Light,
            ..Default::default()
        };

        let toml_str = toml::to_string(&config)?;
        assert!(toml_str.contains("Light"));

        let parsed: Config = toml::from_str(&toml_str)?;
        assert_eq!(parsed.theme, ThemeVariant::Light);

        Ok(())
    }

    #[test]
    fn test_theme_persisted_form() {
        assert_eq!(ThemeVariant::parse("dark"), Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::parse(" Light\n"), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::parse("sepia"), None);
        assert_eq!(ThemeVariant::Dark.toggled(), ThemeVariant::Light);
        assert_eq!(ThemeVariant::Light.as_str(), "light");
    }
}
