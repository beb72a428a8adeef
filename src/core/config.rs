//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::workspace::Workspace;

/// Atelier configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format
    pub default_format: Option<String>,

    /// Default company id for project listings
    pub default_company: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/atelier/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Workspace config (.atelier/config.yaml)
        if let Ok(workspace) = Workspace::discover() {
            config.merge_workspace(&workspace);
        }

        // 4. Environment variables
        if let Ok(format) = std::env::var("PMC_FORMAT") {
            config.default_format = Some(format);
        }
        if let Ok(company) = std::env::var("PMC_COMPANY") {
            config.default_company = Some(company);
        }

        config
    }

    /// Merge a specific workspace's config file into this one
    pub fn merge_workspace(&mut self, workspace: &Workspace) {
        let path = workspace.atelier_dir().join("config.yaml");
        if path.exists() {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                if let Ok(ws_config) = serde_yml::from_str::<Config>(&contents) {
                    self.merge(ws_config);
                }
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "atelier")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.default_company.is_some() {
            self.default_company = other.default_company;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            default_format: Some("table".to_string()),
            default_company: None,
        };
        base.merge(Config {
            default_format: Some("json".to_string()),
            default_company: Some("CO-1".to_string()),
        });
        assert_eq!(base.default_format.as_deref(), Some("json"));
        assert_eq!(base.default_company.as_deref(), Some("CO-1"));
    }

    #[test]
    fn test_merge_keeps_base_when_other_unset() {
        let mut base = Config {
            default_format: Some("table".to_string()),
            default_company: None,
        };
        base.merge(Config::default());
        assert_eq!(base.default_format.as_deref(), Some("table"));
    }

    #[test]
    fn test_workspace_config_is_read() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        std::fs::write(
            ws.atelier_dir().join("config.yaml"),
            "default_format: csv\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.merge_workspace(&ws);
        assert_eq!(config.default_format.as_deref(), Some("csv"));
    }
}
