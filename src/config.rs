use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::Token;
use crate::checker::PollErrorPolicy;
use crate::providers::{ProviderKind, ProviderOptions};

const CANDIDATES: [&str; 4] = [
    "pipescope.toml",
    "pipescope.json",
    "pipescope.yaml",
    "pipescope.yml",
];

/// Settings file for `pipescope`.
///
/// Every value can be overridden on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub github: ProviderConfig,

    #[serde(default)]
    pub gitlab: ProviderConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProviderConfig {
    /// Access token used when none is given on the command line
    pub token: Option<String>,

    /// API base URL (GitHub Enterprise, self-hosted GitLab)
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Give up after this many seconds of polling
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub on_error: PollErrorPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitConfig {
    #[serde(default = "default_git_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_remote")]
    pub remote: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NotifyConfig {
    /// Ring the terminal bell when the pipeline finishes
    #[serde(default)]
    pub play_sound: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: None,
            on_error: PollErrorPolicy::default(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            directory: default_git_directory(),
            remote: default_remote(),
        }
    }
}

fn default_interval_secs() -> u64 {
    5
}

fn default_git_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_remote() -> String {
    "origin".to_string()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./pipescope.toml, ./pipescope.json, ./pipescope.yaml, ./pipescope.yml
    /// 3. `<config dir>/pipescope/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let user_config = dirs::config_dir().map(|dir| dir.join("pipescope").join("config.toml"));

        let found = CANDIDATES
            .iter()
            .map(PathBuf::from)
            .chain(user_config)
            .find(|candidate| candidate.exists());

        match found {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            _ => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
        };

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.poll.interval_secs == 0 {
            anyhow::bail!("poll.interval-secs must be at least 1");
        }
        Ok(())
    }

    pub fn provider_options(&self) -> ProviderOptions {
        let defaults = ProviderOptions::default();
        ProviderOptions {
            github_url: self.github.base_url.clone().unwrap_or(defaults.github_url),
            gitlab_url: self.gitlab.base_url.clone().unwrap_or(defaults.gitlab_url),
        }
    }

    /// Token configured for `kind`, if any.
    pub fn token_for(&self, kind: ProviderKind) -> Option<Token> {
        let section = match kind {
            ProviderKind::GitHub => &self.github,
            ProviderKind::GitLab => &self.gitlab,
        };
        Token::non_empty(section.token.as_deref())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll.timeout_secs.map(Duration::from_secs)
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
        assert_eq!(config.poll.interval_secs, 5);
        assert_eq!(config.poll.timeout_secs, None);
        assert_eq!(config.poll.on_error, PollErrorPolicy::Report);
        assert_eq!(config.git.directory, PathBuf::from("."));
        assert_eq!(config.git.remote, "origin");
        assert!(!config.notify.play_sound);

        let options = config.provider_options();
        assert_eq!(options.github_url, "https://api.github.com");
        assert_eq!(options.gitlab_url, "https://gitlab.com");
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[gitlab]
token = "glpat-test-token"
base-url = "https://gitlab.example.com"

[poll]
interval-secs = 30
timeout-secs = 600
on-error = "end-stream"

[git]
remote = "upstream"

[notify]
play-sound = true
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(
            config.token_for(ProviderKind::GitLab).unwrap().as_str(),
            "glpat-test-token"
        );
        assert!(config.token_for(ProviderKind::GitHub).is_none());
        assert_eq!(config.provider_options().gitlab_url, "https://gitlab.example.com");
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.poll_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.poll.on_error, PollErrorPolicy::EndStream);
        assert_eq!(config.git.remote, "upstream");
        assert_eq!(config.git.directory, PathBuf::from("."));
        assert!(config.notify.play_sound);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "github": {
    "token": "ghp_json_token",
    "base-url": "https://github.example.com/api/v3"
  },
  "git": {
    "directory": "/src/project"
  }
}"#;
        write!(temp_file, "{}", json_content).unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(
            config.token_for(ProviderKind::GitHub).unwrap().as_str(),
            "ghp_json_token"
        );
        assert_eq!(
            config.provider_options().github_url,
            "https://github.example.com/api/v3"
        );
        assert_eq!(config.git.directory, PathBuf::from("/src/project"));
        assert_eq!(config.git.remote, "origin");
        assert_eq!(config.poll.interval_secs, 5);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yml").unwrap();
        write!(temp_file, "poll:\n  interval-secs: 2\n  on-error: report\n").unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.poll.on_error, PollErrorPolicy::Report);
    }

    #[test]
    fn test_blank_token_is_absent() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[github]\ntoken = \"  \"\n").unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert!(config.token_for(ProviderKind::GitHub).is_none());
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[poll]\ninterval-secs = 0\n").unwrap();

        let err = Config::load(Some(temp_file.path())).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
        assert!(format!("{err:#}").contains("interval-secs must be at least 1"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nonexistent.toml");

        let err = Config::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_malformed_config_reports_path() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[poll]\ninterval-secs = \"often\"\n").unwrap();

        let err = Config::load(Some(temp_file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML config"));
    }
}
