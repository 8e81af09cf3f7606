//! Client configuration with a profile-file fallback.
//!
//! Resolution order: explicit values passed in (the CLI resolves its flags
//! and the `CLOUDISTICS_ENDPOINT` / `CLOUDISTICS_API_KEY` environment
//! variables first), then the `~/.cloudistics.toml` profile, then the
//! default endpoint. A token has no default and must come from one of the
//! layers.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://manage.cloudistics.com/api/latest";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API token: pass --token, set CLOUDISTICS_API_KEY, or add token to {0}")]
    TokenMissing(String),

    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Resolved endpoint and credentials for [`HttpProvider`](crate::HttpProvider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
struct Profile {
    endpoint: Option<String>,
    token: Option<String>,
}

impl ClientConfig {
    /// Layer explicit values over the profile file.
    ///
    /// `profile_path` overrides the default `~/.cloudistics.toml`; a
    /// missing file is fine, an unreadable or malformed one is not.
    pub fn resolve(
        endpoint: Option<String>,
        token: Option<String>,
        profile_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let path = profile_path.or_else(default_profile_path);
        let profile = match &path {
            Some(p) if p.exists() => load_profile(p)?,
            _ => Profile::default(),
        };

        let endpoint = endpoint
            .or(profile.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let token = token.or(profile.token).ok_or_else(|| {
            ConfigError::TokenMissing(
                path.as_deref()
                    .map_or_else(|| "the profile file".to_string(), |p| p.display().to_string()),
            )
        })?;

        Ok(Self { endpoint, token })
    }
}

fn default_profile_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cloudistics.toml"))
}

fn load_profile(path: &Path) -> Result<Profile, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn profile_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn profile_file_supplies_endpoint_and_token() {
        let file = profile_file(
            "endpoint = \"https://cloud.example.com/api\"\ntoken = \"tk-1\"\n",
        );

        let config =
            ClientConfig::resolve(None, None, Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.endpoint, "https://cloud.example.com/api");
        assert_eq!(config.token, "tk-1");
    }

    #[test]
    fn explicit_values_override_the_profile() {
        let file = profile_file(
            "endpoint = \"https://cloud.example.com/api\"\ntoken = \"tk-1\"\n",
        );

        let config = ClientConfig::resolve(
            Some("https://other.example.com".to_string()),
            Some("tk-2".to_string()),
            Some(file.path().to_path_buf()),
        )
        .unwrap();

        assert_eq!(config.endpoint, "https://other.example.com");
        assert_eq!(config.token, "tk-2");
    }

    #[test]
    fn endpoint_defaults_when_nothing_sets_it() {
        let file = profile_file("token = \"tk-1\"\n");

        let config =
            ClientConfig::resolve(None, None, Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn missing_token_is_an_error() {
        let file = profile_file("endpoint = \"https://cloud.example.com/api\"\n");

        let err =
            ClientConfig::resolve(None, None, Some(file.path().to_path_buf())).unwrap_err();

        assert!(matches!(err, ConfigError::TokenMissing(_)));
    }

    #[test]
    fn malformed_profile_is_an_error() {
        let file = profile_file("token = [not toml");

        let err =
            ClientConfig::resolve(None, None, Some(file.path().to_path_buf())).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
