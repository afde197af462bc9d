pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PROJECT_FILE_ENV: &str = "STACKFLOW_FILE";
pub const REGION_ENV: &str = "AWS_REGION";
pub const PROFILE_ENV: &str = "AWS_PROFILE";

const PROJECT_FILE_CANDIDATES: [&str; 3] =
    ["stackflow.local.yaml", "stackflow.yaml", "stackflow.json"];
const PROJECT_DIR: &str = ".stackflow";
const SETTINGS_FILE: &str = "config.yaml";

/// `~/.config/stackflow/config.yaml`
pub fn settings_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("stackflow")
        .join(SETTINGS_FILE))
}

/// Locate the project file.
///
/// Search order:
/// 1. `STACKFLOW_FILE` (used as-is when it exists)
/// 2. current directory: stackflow.local.yaml, stackflow.yaml, stackflow.json
/// 3. `./.stackflow/`, same order
pub fn find_project_file() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(PROJECT_FILE_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        debug!(path = %path.display(), "{PROJECT_FILE_ENV} points at a missing file");
    }

    let current_dir = std::env::current_dir()?;
    if let Some(path) = find_in(&current_dir) {
        return Ok(path);
    }

    let project_dir = current_dir.join(PROJECT_DIR);
    if project_dir.is_dir()
        && let Some(path) = find_in(&project_dir)
    {
        return Ok(path);
    }

    Err(ConfigError::ProjectFileNotFound)
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    PROJECT_FILE_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Per-user defaults for talking to AWS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl Settings {
    /// Settings file merged with `AWS_REGION` / `AWS_PROFILE`.
    pub fn load() -> Result<Self> {
        let mut settings = match settings_path() {
            Ok(path) => Self::load_from(&path)?,
            Err(_) => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    /// A missing file yields empty settings.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::InvalidSettings {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn apply_env(&mut self) {
        if let Some(region) = non_empty_env(REGION_ENV) {
            self.region = Some(region);
        }
        if let Some(profile) = non_empty_env(PROFILE_ENV) {
            self.profile = Some(profile);
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    struct CwdGuard(PathBuf);

    impl CwdGuard {
        fn enter(dir: &Path) -> Self {
            let original = std::env::current_dir().unwrap();
            std::env::set_current_dir(dir).unwrap();
            Self(original)
        }
    }

    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    #[test]
    #[serial]
    fn test_find_project_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("stackflow.yaml"), "name: demo").unwrap();
        let _cwd = CwdGuard::enter(temp_dir.path());

        let path = find_project_file().unwrap();
        assert!(path.ends_with("stackflow.yaml"));
    }

    #[test]
    #[serial]
    fn test_local_file_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("stackflow.yaml"), "name: shared").unwrap();
        fs::write(temp_dir.path().join("stackflow.local.yaml"), "name: local").unwrap();
        fs::write(temp_dir.path().join("stackflow.json"), "{}").unwrap();
        let _cwd = CwdGuard::enter(temp_dir.path());

        let path = find_project_file().unwrap();
        assert!(path.ends_with("stackflow.local.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_project_file_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_dir = temp_dir.path().join(".stackflow");
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("stackflow.json"), "{}").unwrap();
        let _cwd = CwdGuard::enter(temp_dir.path());

        let path = find_project_file().unwrap();
        assert!(path.ends_with(".stackflow/stackflow.json"));
    }

    #[test]
    #[serial]
    fn test_find_project_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let custom = temp_dir.path().join("custom.yaml");
        fs::write(&custom, "name: custom").unwrap();

        unsafe {
            std::env::set_var(PROJECT_FILE_ENV, &custom);
        }
        let result = find_project_file();
        unsafe {
            std::env::remove_var(PROJECT_FILE_ENV);
        }

        assert_eq!(result.unwrap(), custom);
    }

    #[test]
    #[serial]
    fn test_find_project_file_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let _cwd = CwdGuard::enter(temp_dir.path());

        let result = find_project_file();
        assert!(matches!(result, Err(ConfigError::ProjectFileNotFound)));
    }

    #[test]
    fn test_settings_path() {
        if let Ok(path) = settings_path() {
            assert!(path.ends_with("stackflow/config.yaml"));
        }
    }

    #[test]
    fn test_settings_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&temp_dir.path().join("config.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_settings_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "region: eu-west-1\nprofile: staging\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.region.as_deref(), Some("eu-west-1"));
        assert_eq!(settings.profile.as_deref(), Some("staging"));
    }

    #[test]
    fn test_settings_rejects_unknown_keys() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "regoin: eu-west-1\n").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSettings { .. }));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let mut settings = Settings {
            region: Some("eu-west-1".to_string()),
            profile: Some("staging".to_string()),
        };

        unsafe {
            std::env::set_var(REGION_ENV, "ap-northeast-1");
            std::env::remove_var(PROFILE_ENV);
        }
        settings.apply_env();
        unsafe {
            std::env::remove_var(REGION_ENV);
        }

        assert_eq!(settings.region.as_deref(), Some("ap-northeast-1"));
        assert_eq!(settings.profile.as_deref(), Some("staging"));
    }
}
