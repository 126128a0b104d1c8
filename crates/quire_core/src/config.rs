//! User configuration.
//!
//! [`Config`] stores preferences that outlive a single project: where new
//! projects go, the default author, and the recently opened project list.
//! It is persisted as TOML (typically at `~/.config/quire/config.toml` on
//! Unix systems).
//!
//! # Example
//!
//! ```ignore
//! use quire_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.add_recent("/home/user/novel/Novel.quire");
//! config.save()?;
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QuireError, Result};
use crate::fs::FileSystem;

/// Default length of the recent projects list
pub const DEFAULT_MAX_RECENT: usize = 10;

fn default_max_recent() -> usize {
    DEFAULT_MAX_RECENT
}

/// The parts of Quire that the user can configure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory new projects are created in
    pub default_project_dir: PathBuf,

    /// Author written into new projects' metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_author: Option<String>,

    /// Recently opened project index files, most recent first
    #[serde(default)]
    pub recent_projects: Vec<PathBuf>,

    /// How many entries `recent_projects` keeps
    #[serde(default = "default_max_recent")]
    pub max_recent_projects: usize,
}

impl Config {
    /// Create a new config with the given project directory
    pub fn new(default_project_dir: PathBuf) -> Self {
        Self {
            default_project_dir,
            default_author: None,
            recent_projects: Vec::new(),
            max_recent_projects: DEFAULT_MAX_RECENT,
        }
    }

    /// Record a project as most recently opened.
    ///
    /// An existing entry moves to the front; the list is cut to
    /// `max_recent_projects`.
    pub fn add_recent(&mut self, project: impl Into<PathBuf>) {
        let project = project.into();
        self.recent_projects.retain(|p| *p != project);
        self.recent_projects.insert(0, project);
        self.recent_projects.truncate(self.max_recent_projects);
    }

    /// Drop recent entries whose index file no longer exists
    pub fn prune_recent<FS: FileSystem>(&mut self, fs: &FS) {
        self.recent_projects.retain(|p| fs.exists(p));
    }

    // ========================================================================
    // FileSystem-based methods
    // ========================================================================

    /// Load config from a specific path.
    pub fn load_from<FS: FileSystem>(fs: &FS, path: &Path) -> Result<Self> {
        let contents = fs
            .read_to_string(path)
            .map_err(|e| QuireError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to<FS: FileSystem>(&self, fs: &FS, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs.create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs.write_file(path, &contents)?;
        Ok(())
    }

    /// Load config, returning a default if it is missing or unreadable.
    pub fn load_from_or_default<FS: FileSystem>(
        fs: &FS,
        path: &Path,
        default_project_dir: PathBuf,
    ) -> Self {
        match Self::load_from(fs, path) {
            Ok(config) => config,
            Err(e) => {
                if fs.exists(path) {
                    log::warn!("Ignoring unreadable config {:?}: {}", path, e);
                }
                Self::new(default_project_dir)
            }
        }
    }
}

// ============================================================================
// Native-only implementation
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl Default for Config {
    fn default() -> Self {
        let default_base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Quire");
        Self::new(default_base)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Get the config file path (~/.config/quire/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("quire").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            return Self::load_from(&crate::fs::RealFileSystem, &path);
        }

        Ok(Config::default())
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(QuireError::NoConfigDir)?;
        self.save_to(&crate::fs::RealFileSystem, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;

    #[test]
    fn test_add_recent_dedupes_and_truncates() {
        let mut config = Config::new(PathBuf::from("/books"));
        config.max_recent_projects = 3;

        config.add_recent("/a.quire");
        config.add_recent("/b.quire");
        config.add_recent("/c.quire");
        config.add_recent("/a.quire");
        config.add_recent("/d.quire");

        assert_eq!(
            config.recent_projects,
            vec![
                PathBuf::from("/d.quire"),
                PathBuf::from("/a.quire"),
                PathBuf::from("/c.quire"),
            ]
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let fs = InMemoryFileSystem::new();
        let path = PathBuf::from("/config/quire/config.toml");

        let mut config = Config::new(PathBuf::from("/books"));
        config.default_author = Some("A. Writer".to_string());
        config.add_recent("/books/novel/Novel.quire");
        config.save_to(&fs, &path).unwrap();

        let loaded = Config::load_from(&fs, &path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let fs = InMemoryFileSystem::new();
        let path = PathBuf::from("/config.toml");
        fs.write_file(&path, "default_project_dir = \"/books\"\n")
            .unwrap();

        let config = Config::load_from(&fs, &path).unwrap();
        assert_eq!(config.max_recent_projects, DEFAULT_MAX_RECENT);
        assert!(config.recent_projects.is_empty());
        assert!(config.default_author.is_none());
    }

    #[test]
    fn test_load_or_default_on_garbage() {
        let fs = InMemoryFileSystem::new();
        let path = PathBuf::from("/config.toml");
        fs.write_file(&path, "not = [valid").unwrap();

        let config = Config::load_from_or_default(&fs, &path, PathBuf::from("/fallback"));
        assert_eq!(config.default_project_dir, PathBuf::from("/fallback"));
    }

    #[test]
    fn test_prune_recent() {
        let fs = InMemoryFileSystem::new();
        fs.write_file(Path::new("/kept.quire"), "{}").unwrap();

        let mut config = Config::new(PathBuf::from("/books"));
        config.add_recent("/gone.quire");
        config.add_recent("/kept.quire");
        config.prune_recent(&fs);

        assert_eq!(config.recent_projects, vec![PathBuf::from("/kept.quire")]);
    }
}
