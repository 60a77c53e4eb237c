//! Deploy configuration (`webdeploy.yaml`).
//!
//! # Resolution order
//!
//! ```text
//! --config <path> / $WEBDEPLOY_CONFIG   (must exist)
//! ./webdeploy.yaml                      (if present)
//! <config_dir>/webdeploy/webdeploy.yaml (if present)
//! built-in defaults
//! ```
//!
//! # API pattern
//!
//! As with the rest of the workspace, functions that touch the user's
//! environment have two forms:
//! - `fn_at(…, config_home: Option<&Path>)` — explicit location; used in tests
//! - `fn(…)` — derives the location from `dirs::config_dir()`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{BlobName, BlobProperties};

/// File name looked up in the working directory and the user config dir.
pub const CONFIG_FILE_NAME: &str = "webdeploy.yaml";

/// Upper bound on names per batch-delete request.
pub const MAX_DELETE_BATCH: usize = 256;

pub const DEFAULT_PAGE_SIZE: usize = 5000;

/// Cache-Control applied to fingerprinted static assets.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public,max-age=31536000";

pub const DEFAULT_PURGE_TOKEN_ENV: &str = "WEBDEPLOY_PURGE_TOKEN";

const DEFAULT_IMMUTABLE_EXTENSIONS: [&str; 7] = ["js", "css", "woff", "ttf", "png", "jpg", "svg"];

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Root of `webdeploy.yaml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Root directory of the directory-backed container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<PathBuf>,
    /// Objects requested per listing page.
    pub page_size: usize,
    /// Names per delete request, `1..=MAX_DELETE_BATCH`.
    pub delete_batch_size: usize,
    /// Deploy dot-prefixed files and directories.
    pub include_hidden: bool,
    pub cache_control: CachePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purge: Option<PurgeConfig>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            container: None,
            page_size: DEFAULT_PAGE_SIZE,
            delete_batch_size: MAX_DELETE_BATCH,
            include_hidden: false,
            cache_control: CachePolicy::default(),
            purge: None,
        }
    }
}

/// Extension-based Cache-Control rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachePolicy {
    /// Extensions (without the dot, case-sensitive) that receive `value`.
    pub extensions: Vec<String>,
    pub value: String,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_IMMUTABLE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            value: IMMUTABLE_CACHE_CONTROL.to_string(),
        }
    }
}

impl CachePolicy {
    /// Upload properties for `name`.
    pub fn properties_for(&self, name: &BlobName) -> BlobProperties {
        let matches = name
            .extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext));
        BlobProperties {
            cache_control: matches.then(|| self.value.clone()),
        }
    }
}

/// HTTP purge endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeConfig {
    pub url: String,
    #[serde(default = "default_purge_paths")]
    pub paths: Vec<String>,
    /// Environment variable holding the bearer token, if any.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl PurgeConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            paths: default_purge_paths(),
            token_env: default_token_env(),
        }
    }

    /// Bearer token read from `token_env`; empty values count as unset.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

fn default_purge_paths() -> Vec<String> {
    vec!["/*".to_string()]
}

fn default_token_env() -> String {
    DEFAULT_PURGE_TOKEN_ENV.to_string()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl DeployConfig {
    /// Reject values the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.delete_batch_size == 0 || self.delete_batch_size > MAX_DELETE_BATCH {
            return Err(ConfigError::Invalid {
                field: "delete_batch_size",
                reason: format!(
                    "must be between 1 and {MAX_DELETE_BATCH}, got {}",
                    self.delete_batch_size
                ),
            });
        }
        if let Some(purge) = &self.purge {
            if !(purge.url.starts_with("http://") || purge.url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    field: "purge.url",
                    reason: format!("expected an http(s) URL, got '{}'", purge.url),
                });
            }
            if purge.paths.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "purge.paths",
                    reason: "at least one path is required".to_string(),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load and validate the config at `path`.
///
/// Returns `ConfigError::ConfigNotFound` if absent, `ConfigError::Parse`
/// (with path + line context) if malformed. An empty file yields defaults.
pub fn load_at(path: &Path) -> Result<DeployConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let config = if contents.trim().is_empty() {
        DeployConfig::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?
    };
    config.validate()?;
    Ok(config)
}

/// Atomically write `config` to `path`.
///
/// Write flow: serialize → `.tmp` sibling → `chmod 0600` → `rename`. Refuses
/// to replace an existing file unless `overwrite` is set.
pub fn save_at(path: &Path, config: &DeployConfig, overwrite: bool) -> Result<(), ConfigError> {
    if path.exists() && !overwrite {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| CONFIG_FILE_NAME.to_string());
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// `<config_home>/webdeploy/webdeploy.yaml`. Pure, no I/O.
pub fn user_config_path_at(config_home: &Path) -> PathBuf {
    config_home.join("webdeploy").join(CONFIG_FILE_NAME)
}

/// First existing config file: working directory, then `config_home`.
pub fn discover_at(cwd: &Path, config_home: Option<&Path>) -> Option<PathBuf> {
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    config_home
        .map(user_config_path_at)
        .filter(|path| path.is_file())
}

/// Resolve the effective config. Returns the config and the file it came
/// from, if any.
///
/// An `explicit` path must exist; discovery misses fall back to defaults.
pub fn resolve_at(
    explicit: Option<&Path>,
    cwd: &Path,
    config_home: Option<&Path>,
) -> Result<(DeployConfig, Option<PathBuf>), ConfigError> {
    let source = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover_at(cwd, config_home),
    };
    match source {
        Some(path) => Ok((load_at(&path)?, Some(path))),
        None => Ok((DeployConfig::default(), None)),
    }
}

/// `resolve_at` convenience wrapper.
pub fn resolve(
    explicit: Option<&Path>,
    cwd: &Path,
) -> Result<(DeployConfig, Option<PathBuf>), ConfigError> {
    resolve_at(explicit, cwd, dirs::config_dir().as_deref())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
