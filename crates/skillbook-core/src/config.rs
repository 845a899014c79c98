use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration, loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillbookConfig {
    /// Skill repository root. Falls back to the current directory.
    pub root: Option<PathBuf>,
    pub catalog: CatalogConfig,
    pub install: InstallConfig,
}

impl SkillbookConfig {
    /// Load configuration from the default path (~/.config/skillbook/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skillbook")
            .join("config.toml")
    }

    /// Repository root: the explicit override, then the configured root, then `.`.
    pub fn resolve_root(&self, override_root: Option<&Path>) -> PathBuf {
        override_root
            .map(Path::to_path_buf)
            .or_else(|| self.root.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// How skill directories and their descriptors are recognised.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Conventional descriptor file name inside each skill directory.
    pub descriptor_file: String,
    /// Literal prefix every description is expected to start with.
    pub description_prefix: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            descriptor_file: "SKILL.md".into(),
            description_prefix: "Use when".into(),
        }
    }
}

/// Where `install` copies skills to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Install root; each skill lands in `<dir>/<name>`.
    pub dir: Option<PathBuf>,
}

impl InstallConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_install_dir)
    }
}

fn default_install_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("opencode")
        .join("skill")
}
