//! Where proposals live on disk and what new proposals start from.

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{AppError, Result};
use crate::model::ProposalDefaults;

pub const DEFAULT_DATA_ROOT: &str = "~/Documents/Proposals";

const DEFAULT_COMPANY_TEMPLATE: &str = include_str!("../company.toml");

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppSettings {
    pub data_root: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            data_root: DEFAULT_DATA_ROOT.to_string(),
        }
    }
}

impl AppSettings {
    pub fn root(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.data_root))
    }
}

pub fn config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "proposal-builder", "app") {
        return proj_dirs.config_dir().join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

/// Reads settings; `Ok(None)` when the file has never been written.
pub fn load_settings(path: &Path) -> Result<Option<AppSettings>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(AppError::io(path))?;
    toml::from_str(&content)
        .map(Some)
        .map_err(|source| AppError::TomlDecode {
            path: path.to_path_buf(),
            source,
        })
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(AppError::io(dir))?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    fs::write(path, toml_str).map_err(AppError::io(path))?;
    info!(path = %path.display(), "settings saved");
    Ok(())
}

/// Loads `company.toml` from the data root, writing the default file first
/// when it does not exist yet.
pub fn load_defaults(root: &Path) -> Result<ProposalDefaults> {
    let path = root.join("company.toml");
    let content = if path.exists() {
        fs::read_to_string(&path).map_err(AppError::io(&path))?
    } else {
        println!("✨ Initializing default company configuration...");
        fs::create_dir_all(root).map_err(AppError::io(root))?;
        fs::write(&path, DEFAULT_COMPANY_TEMPLATE).map_err(AppError::io(&path))?;
        DEFAULT_COMPANY_TEMPLATE.to_string()
    };
    parse_defaults(&content).map_err(|source| AppError::TomlDecode { path, source })
}

pub fn parse_defaults(content: &str) -> std::result::Result<ProposalDefaults, toml::de::Error> {
    toml::from_str(content)
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_company_file_matches_built_in_defaults() {
        let parsed = parse_defaults(DEFAULT_COMPANY_TEMPLATE).unwrap();
        assert_eq!(parsed, ProposalDefaults::default());
    }

    #[test]
    fn partial_company_file_keeps_other_defaults() {
        let parsed = parse_defaults(
            r#"
            [company]
            name = "Harbor Glass Co."

            [commercialTerms]
            taxRatePct = 6
            includeBond = true
            "#,
        )
        .unwrap();
        assert_eq!(parsed.company.name, "Harbor Glass Co.");
        assert_eq!(parsed.company.phone, "");
        assert_eq!(parsed.commercial_terms.tax_rate_pct, 6.0);
        assert!(parsed.commercial_terms.include_bond);
        assert_eq!(parsed.commercial_terms.overhead_pct, 10.0);
        assert_eq!(parsed.name, "Untitled Proposal");
    }

    #[test]
    fn defaults_file_is_created_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = load_defaults(dir.path()).unwrap();
        assert_eq!(defaults, ProposalDefaults::default());
        assert!(dir.path().join("company.toml").exists());

        fs::write(dir.path().join("company.toml"), "version = \"2.0\"").unwrap();
        assert_eq!(load_defaults(dir.path()).unwrap().version, "2.0");
    }

    #[test]
    fn broken_company_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("company.toml"), "name = [").unwrap();
        let err = load_defaults(dir.path()).unwrap_err();
        assert!(matches!(err, AppError::TomlDecode { .. }));
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        assert_eq!(load_settings(&path).unwrap(), None);

        let settings = AppSettings {
            data_root: "/srv/bids".into(),
        };
        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path).unwrap(), Some(settings));
    }

    #[test]
    fn relative_roots_are_left_alone() {
        assert_eq!(expand_home_dir("/srv/bids"), "/srv/bids");
        assert!(!expand_home_dir("~/bids").starts_with('~') || BaseDirs::new().is_none());
    }
}
