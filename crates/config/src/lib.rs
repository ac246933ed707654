//! Layered configuration for bookshelf.
//!
//! Values are resolved in order, later layers overriding earlier ones:
//!
//! 1. built-in defaults,
//! 2. a config file (`bookshelf.toml`, `bookshelf.yaml`/`.yml` or
//!    `bookshelf.json`, looked up in the user's config directory and then the
//!    working directory; or an explicit path),
//! 3. `BOOKSHELF_*` environment variables, with `__` between nested keys
//!    (`BOOKSHELF_REMOTE__BASE_URL`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APPLICATION: &str = "bookshelf";
const ENV_PREFIX: &str = "BOOKSHELF_";
const ENV_SEPARATOR: &str = "__";
const CACHE_FILE: &str = "books.db";
const FILE_NAMES: [&str; 4] = ["bookshelf.toml", "bookshelf.yaml", "bookshelf.yml", "bookshelf.json"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
}

/// Where and how to reach the bookshelf server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Total attempts for requests that are safe to repeat, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles with each further retry.
    pub backoff_ms: u64,
}
impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:2505".to_string(),
            timeout_secs: 10,
            max_attempts: 3,
            backoff_ms: 200,
        }
    }
}
impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// SQLite database file, or `:memory:` for a cache that lives only as
    /// long as the process.
    pub path: PathBuf,
}
impl Default for CacheConfig {
    fn default() -> Self {
        let path = match ProjectDirs::from("", "", APPLICATION) {
            Some(dirs) => dirs.data_dir().join(CACHE_FILE),
            None => PathBuf::from(CACHE_FILE),
        };
        Self { path }
    }
}

impl Config {
    /// Load from the default file locations and the environment.
    pub fn load() -> Result<Self> {
        let mut figment = Self::defaults();
        let config_dir = ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().to_path_buf());
        for dir in config_dir.into_iter().chain([PathBuf::from(".")]) {
            for name in FILE_NAMES {
                let path = dir.join(name);
                if path.is_file() {
                    tracing::debug!(path = %path.display(), "using config file");
                    figment = figment.merge(Self::file(&path)?);
                }
            }
        }
        Self::finish(figment)
    }

    /// Load from an explicit file (which must exist) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        Self::finish(Self::defaults().merge(Self::file(path)?))
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
    }

    fn file(path: &Path) -> Result<Figment> {
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        let figment = match extension.as_deref() {
            Some("toml") => Figment::from(Toml::file_exact(path)),
            Some("yaml" | "yml") => Figment::from(Yaml::file_exact(path)),
            Some("json") => Figment::from(Json::file_exact(path)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        };
        Ok(figment)
    }

    fn finish(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
            .extract()
            .or_raise(|| ErrorKind::Invalid)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |key, reason| exn::Exn::from(ErrorKind::Validation { key, reason });
        if self.remote.base_url.trim().is_empty() {
            return Err(invalid("remote.base_url", "must not be empty"));
        }
        if self.remote.timeout_secs == 0 {
            return Err(invalid("remote.timeout_secs", "must be at least 1"));
        }
        if self.remote.max_attempts == 0 {
            return Err(invalid("remote.max_attempts", "must be at least 1"));
        }
        if self.cache.path.as_os_str().is_empty() {
            return Err(invalid("cache.path", "must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load().unwrap();
            assert_eq!(config.remote, RemoteConfig::default());
            assert_eq!(config.remote.timeout(), Duration::from_secs(10));
            assert!(config.cache.path.ends_with(CACHE_FILE));
            Ok(())
        });
    }

    #[test]
    fn test_file_in_working_directory() {
        Jail::expect_with(|jail| {
            jail.create_file("bookshelf.toml", "[remote]\nbase_url = \"https://books.example.com/api\"\n")?;
            let config = Config::load().unwrap();
            assert_eq!(config.remote.base_url, "https://books.example.com/api");
            assert_eq!(config.remote.max_attempts, 3);
            Ok(())
        });
    }

    #[rstest]
    #[case::toml("custom.toml", "[cache]\npath = \":memory:\"\n")]
    #[case::yaml("custom.yaml", "cache:\n  path: \":memory:\"\n")]
    #[case::json("custom.json", r#"{"cache": {"path": ":memory:"}}"#)]
    fn test_explicit_file_formats(#[case] name: &str, #[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cache.path, PathBuf::from(":memory:"));
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("bookshelf.yaml", "remote:\n  timeout_secs: 30\n  backoff_ms: 50\n")?;
            jail.set_env("BOOKSHELF_REMOTE__TIMEOUT_SECS", "5");
            let config = Config::load().unwrap();
            assert_eq!(config.remote.timeout_secs, 5);
            assert_eq!(config.remote.backoff(), Duration::from_millis(50));
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookshelf.ini");
        std::fs::write(&path, "base_url=x").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_wrong_type() {
        Jail::expect_with(|jail| {
            jail.set_env("BOOKSHELF_REMOTE__MAX_ATTEMPTS", "lots");
            let err = Config::load().unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid));
            Ok(())
        });
    }

    #[rstest]
    #[case::empty_url("BOOKSHELF_REMOTE__BASE_URL", " ", "remote.base_url")]
    #[case::zero_timeout("BOOKSHELF_REMOTE__TIMEOUT_SECS", "0", "remote.timeout_secs")]
    #[case::zero_attempts("BOOKSHELF_REMOTE__MAX_ATTEMPTS", "0", "remote.max_attempts")]
    fn test_validation(#[case] var: &str, #[case] value: &str, #[case] expected: &str) {
        Jail::expect_with(|jail| {
            jail.set_env(var, value);
            let err = Config::load().unwrap_err();
            assert!(matches!(&*err, ErrorKind::Validation { key, .. } if *key == expected));
            Ok(())
        });
    }
}
