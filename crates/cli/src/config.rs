//! YAML configuration for a census run.
//!
//! ```yaml
//! github:
//!   password: ghp_xxx          # overridden by --token / GITHUB_TOKEN
//!   owner: acme
//!   repo: widgets
//!   project: Roadmap           # optional, default: first project
//!   api_url: https://api.github.com
//! columns:
//!   - name: In Progress
//! size_labels:
//!   - name: size:M
//! engineering_functions:
//!   - name: backend
//! attribution: every_match     # or first_match
//! http:
//!   timeout_secs: 30
//!   max_retries: 2
//!   retry_delay_ms: 500
//!   max_concurrent_requests: 4
//! ```
//!
//! [`Settings`] is the validated form; nothing downstream sees raw YAML.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use census::{AttributionPolicy, CensusRequest, EngineeringFunction, LabelName, RepositoryId};
use github::{GithubConfig, DEFAULT_API_URL};
use serde::Deserialize;
use thiserror::Error;

/// Configuration-related errors. All of them abort before any API call.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read configuration file
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration parsing failed
    #[error("Failed to parse configuration: {source}")]
    Parse { source: serde_yaml_ng::Error },

    /// Invalid configuration value
    #[error("Invalid configuration value for key '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// The same name is listed twice where names must be unique
    #[error("Duplicate entry '{name}' in '{key}'")]
    Duplicate { key: String, name: String },
}

// ---------------------------------------------------------------------------
// File shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FileConfig {
    github: GithubSection,
    #[serde(default)]
    columns: Vec<NamedEntry>,
    #[serde(default)]
    size_labels: Vec<NamedEntry>,
    #[serde(default)]
    engineering_functions: Vec<NamedEntry>,
    #[serde(default)]
    attribution: AttributionPolicy,
    #[serde(default)]
    http: HttpSettings,
}

#[derive(Debug, Deserialize)]
struct GithubSection {
    #[serde(default)]
    password: Option<String>,
    owner: String,
    repo: String,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    api_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    name: String,
}

/// HTTP limits applied to every tracker call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_concurrent_requests: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 2,
            retry_delay_ms: 500,
            max_concurrent_requests: census::DEFAULT_CONCURRENCY,
        }
    }
}

// ---------------------------------------------------------------------------
// Validated settings
// ---------------------------------------------------------------------------

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub repository: RepositoryId,
    pub token: String,
    pub api_url: String,
    pub project: Option<String>,
    pub columns: Vec<String>,
    pub size_labels: Vec<LabelName>,
    pub engineering_functions: Vec<EngineeringFunction>,
    pub attribution: AttributionPolicy,
    pub http: HttpSettings,
}

impl Settings {
    /// Reads and validates the file at `path`.
    ///
    /// `token_override` (from `--token` / `GITHUB_TOKEN`) wins over
    /// `github.password`.
    pub fn load(path: &Path, token_override: Option<String>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ConfigError::FileRead {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::from_yaml(&text, token_override)
    }

    /// Parses and validates YAML text.
    pub fn from_yaml(text: &str, token_override: Option<String>) -> Result<Self, ConfigError> {
        let file: FileConfig =
            serde_yaml_ng::from_str(text).map_err(|source| ConfigError::Parse { source })?;
        Self::validate(file, token_override)
    }

    fn validate(file: FileConfig, token_override: Option<String>) -> Result<Self, ConfigError> {
        let token = token_override
            .filter(|t| !t.trim().is_empty())
            .or(file.github.password)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid("github.password", "a token is required (or set GITHUB_TOKEN)"))?;

        let repository = RepositoryId::new(file.github.owner.trim(), file.github.repo.trim())
            .ok_or_else(|| {
                invalid(
                    "github.owner/github.repo",
                    "both must be non-empty and must not contain '/'",
                )
            })?;

        let api_url = file
            .github
            .api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if api_url.trim().is_empty() {
            return Err(invalid("github.api_url", "must not be empty"));
        }

        let columns = file
            .columns
            .into_iter()
            .map(|entry| {
                if entry.name.is_empty() {
                    Err(invalid("columns", "column names must not be empty"))
                } else {
                    Ok(entry.name)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let size_labels = unique_names("size_labels", file.size_labels, LabelName::new)?;
        let engineering_functions = unique_names(
            "engineering_functions",
            file.engineering_functions,
            EngineeringFunction::new,
        )?;

        if file.http.max_concurrent_requests == 0 {
            return Err(invalid("http.max_concurrent_requests", "must be at least 1"));
        }

        Ok(Self {
            repository,
            token,
            api_url,
            project: file.github.project.filter(|p| !p.is_empty()),
            columns,
            size_labels,
            engineering_functions,
            attribution: file.attribution,
            http: file.http,
        })
    }

    /// The pipeline request these settings describe.
    pub fn census_request(&self) -> CensusRequest {
        CensusRequest {
            repository: self.repository.clone(),
            project: self.project.clone(),
            columns: self.columns.clone(),
            size_labels: self.size_labels.clone(),
            engineering_functions: self.engineering_functions.clone(),
            attribution: self.attribution,
            concurrency: self.http.max_concurrent_requests,
        }
    }

    /// Connection settings for the GitHub adapter.
    pub fn github_config(&self) -> GithubConfig {
        let mut config = GithubConfig::new(self.token.clone());
        config.api_url = self.api_url.clone();
        config.timeout = Duration::from_secs(self.http.timeout_secs);
        config.max_retries = self.http.max_retries;
        config.retry_delay = Duration::from_millis(self.http.retry_delay_ms);
        config.max_concurrent_requests = self.http.max_concurrent_requests;
        config
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Converts configured names, rejecting empty and repeated ones.
///
/// Table keys must equal the configured list exactly, so duplicates are an
/// error rather than silently merged.
fn unique_names<T>(
    key: &str,
    entries: Vec<NamedEntry>,
    make: impl Fn(String) -> Option<T>,
) -> Result<Vec<T>, ConfigError> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .map(|entry| {
            if !seen.insert(entry.name.clone()) {
                return Err(ConfigError::Duplicate {
                    key: key.to_string(),
                    name: entry.name,
                });
            }
            make(entry.name).ok_or_else(|| invalid(key, "names must not be empty"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const FULL: &str = r#"
github:
  password: ghp_from_file
  owner: acme
  repo: widgets
  project: Roadmap
columns:
  - name: In Progress
  - name: Done
size_labels:
  - name: size:S
  - name: size:M
engineering_functions:
  - name: backend
  - name: frontend
attribution: first_match
http:
  timeout_secs: 5
  max_concurrent_requests: 8
"#;

    #[test]
    fn test_full_config() {
        let settings = Settings::from_yaml(FULL, None).unwrap();

        assert_eq!(settings.repository.to_string(), "acme/widgets");
        assert_eq!(settings.token, "ghp_from_file");
        assert_eq!(settings.project.as_deref(), Some("Roadmap"));
        assert_eq!(settings.columns, ["In Progress", "Done"]);
        let sizes: Vec<_> = settings.size_labels.iter().map(|l| l.as_str()).collect();
        assert_eq!(sizes, ["size:S", "size:M"]);
        assert_eq!(settings.engineering_functions.len(), 2);
        assert_eq!(settings.attribution, AttributionPolicy::FirstMatch);
        assert_eq!(settings.http.timeout_secs, 5);
        assert_eq!(settings.http.max_retries, 2);
        assert_eq!(settings.http.max_concurrent_requests, 8);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let yaml = "github:\n  password: t\n  owner: acme\n  repo: widgets\n";
        let settings = Settings::from_yaml(yaml, None).unwrap();

        assert!(settings.columns.is_empty());
        assert!(settings.size_labels.is_empty());
        assert!(settings.project.is_none());
        assert_eq!(settings.attribution, AttributionPolicy::EveryMatch);
        assert_eq!(settings.http, HttpSettings::default());
    }

    #[test]
    fn test_token_override_wins() {
        let settings = Settings::from_yaml(FULL, Some("ghp_from_env".into())).unwrap();
        assert_eq!(settings.token, "ghp_from_env");

        let blank = Settings::from_yaml(FULL, Some("  ".into())).unwrap();
        assert_eq!(blank.token, "ghp_from_file");
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let yaml = "github:\n  owner: acme\n  repo: widgets\n";
        let err = Settings::from_yaml(yaml, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "github.password"));

        assert!(Settings::from_yaml(yaml, Some("t".into())).is_ok());
    }

    #[test]
    fn test_missing_owner_is_a_parse_error() {
        let err = Settings::from_yaml("github:\n  password: t\n  repo: widgets\n", None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_empty_repo_is_rejected() {
        let err = Settings::from_yaml("github:\n  password: t\n  owner: acme\n  repo: ''\n", None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_duplicate_size_label_is_rejected() {
        let yaml = r#"
github: { password: t, owner: acme, repo: widgets }
size_labels:
  - name: size:M
  - name: size:M
"#;
        let err = Settings::from_yaml(yaml, None).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate entry 'size:M' in 'size_labels'");
    }

    #[test]
    fn test_empty_function_name_is_rejected() {
        let yaml = r#"
github: { password: t, owner: acme, repo: widgets }
engineering_functions:
  - name: ""
"#;
        let err = Settings::from_yaml(yaml, None).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "engineering_functions")
        );
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let yaml = r#"
github: { password: t, owner: acme, repo: widgets }
http: { max_concurrent_requests: 0 }
"#;
        assert!(Settings::from_yaml(yaml, None).is_err());
    }

    #[test]
    fn test_unknown_attribution_is_a_parse_error() {
        let yaml = r#"
github: { password: t, owner: acme, repo: widgets }
attribution: round_robin
"#;
        assert!(matches!(
            Settings::from_yaml(yaml, None),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let settings = Settings::load(file.path(), None).unwrap();
        assert_eq!(settings.repository.owner(), "acme");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join("config.yml"), None).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_request_and_client_config_follow_settings() {
        let settings = Settings::from_yaml(FULL, None).unwrap();

        let request = settings.census_request();
        assert_eq!(request.concurrency, 8);
        assert_eq!(request.project.as_deref(), Some("Roadmap"));
        assert_eq!(request.attribution, AttributionPolicy::FirstMatch);

        let github = settings.github_config();
        assert_eq!(github.timeout, Duration::from_secs(5));
        assert_eq!(github.retry_delay, Duration::from_millis(500));
        assert_eq!(github.token, "ghp_from_file");
    }
}
