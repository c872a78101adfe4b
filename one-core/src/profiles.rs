//! Profile store and working-directory resolution.
//!
//! # Storage layout
//!
//! ```text
//! $XDG_CONFIG_HOME/one/        (or ~/.config/one/)
//!   config.yml                 (optional global defaults)
//!   projects/                  (mode 0700)
//!     <profile>.yml            (one file per profile, mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(config_dir: &Path, …)`: explicit directory; used in tests with `TempDir`
//! - `fn(…)`: derives the directory from [`config_dir`], delegates to `_at`
//!
//! # Resolution
//!
//! Both the working directory and each declared prefix are normalized (made
//! absolute, symlinks resolved when the path exists, `.`/`..` folded). A
//! profile matches when the directory lies inside one of its prefixes,
//! compared component-wise. When several profiles match, the longest prefix
//! wins; equal lengths fall back to file-name order.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{io_err, ConfigError};
use crate::types::{GlobalConfig, ProjectProfile};

pub const PROJECTS_DIR: &str = "projects";
pub const GLOBAL_CONFIG_FILE: &str = "config.yml";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/one`, else `~/.config/one`.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("one"));
    }
    dirs::home_dir()
        .map(|home| home.join(".config").join("one"))
        .ok_or(ConfigError::HomeNotFound)
}

/// `<config_dir>/projects`. Pure, no I/O.
pub fn projects_dir_at(config_dir: &Path) -> PathBuf {
    config_dir.join(PROJECTS_DIR)
}

/// `<config_dir>/projects/<filename>.yml`. Pure, no I/O.
///
/// A `.yml` suffix is appended unless `filename` already ends in `.yml` or `.yaml`.
pub fn profile_path_at(config_dir: &Path, filename: &str) -> PathBuf {
    let file = if is_yaml_name(filename) {
        filename.to_owned()
    } else {
        format!("{filename}.yml")
    };
    projects_dir_at(config_dir).join(file)
}

fn is_yaml_name(name: &str) -> bool {
    name.ends_with(".yml") || name.ends_with(".yaml")
}

/// Normalize a path for prefix comparison.
///
/// Expands a leading `~`, makes the path absolute against the process working
/// directory, resolves symlinks when the path exists, and otherwise folds
/// `.`/`..` lexically. Trailing separators never survive.
pub fn normalize_path(path: &Path) -> PathBuf {
    let expanded = expand_home(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(expanded),
            Err(_) => expanded,
        }
    };
    std::fs::canonicalize(&absolute).unwrap_or_else(|_| lexical_clean(&absolute))
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Parse a single profile file.
pub fn load_profile(path: &Path) -> Result<ProjectProfile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Every valid profile under `<config_dir>/projects`, sorted by file name.
///
/// Files that fail to parse are skipped with a warning. A missing directory
/// yields an empty list.
pub fn list_profiles_at(
    config_dir: &Path,
) -> Result<Vec<(PathBuf, ProjectProfile)>, ConfigError> {
    let dir = projects_dir_at(config_dir);
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut entries: Vec<_> = std::fs::read_dir(&dir)
        .map_err(|e| io_err(&dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| e.file_name().to_str().map(is_yaml_name).unwrap_or(false))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut profiles = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = entry.path();
        match load_profile(&path) {
            Ok(profile) => profiles.push((path, profile)),
            Err(err) => tracing::warn!(path = %path.display(), error = %err, "skipping invalid profile"),
        }
    }
    Ok(profiles)
}

/// `list_profiles_at` convenience wrapper.
pub fn list_profiles() -> Result<Vec<(PathBuf, ProjectProfile)>, ConfigError> {
    list_profiles_at(&config_dir()?)
}

/// Load `<config_dir>/config.yml`, or defaults when the file is absent.
pub fn load_global_at(config_dir: &Path) -> Result<GlobalConfig, ConfigError> {
    let path = config_dir.join(GLOBAL_CONFIG_FILE);
    if !path.exists() {
        return Ok(GlobalConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

// ---------------------------------------------------------------------------
// 3. Resolve
// ---------------------------------------------------------------------------

/// Find the profile owning `current_dir`, with global defaults applied.
///
/// Returns [`ConfigError::NoProfilesConfigured`] when the store holds no valid
/// profile and [`ConfigError::NoProfileFound`] when none of the prefixes match.
pub fn resolve_at(config_dir: &Path, current_dir: &Path) -> Result<ProjectProfile, ConfigError> {
    let profiles = list_profiles_at(config_dir)?;
    if profiles.is_empty() {
        return Err(ConfigError::NoProfilesConfigured {
            dir: projects_dir_at(config_dir),
        });
    }

    let current = normalize_path(current_dir);
    let mut best: Option<(usize, PathBuf, ProjectProfile)> = None;
    for (path, profile) in profiles {
        let Some(depth) = matching_depth(&current, &profile) else {
            continue;
        };
        tracing::debug!(profile = %profile.project.name, file = %path.display(), depth, "profile prefix matches");
        if best.as_ref().map_or(true, |(d, _, _)| depth > *d) {
            best = Some((depth, path, profile));
        }
    }

    let (_, path, mut profile) = best.ok_or(ConfigError::NoProfileFound { dir: current })?;
    profile.apply_defaults(&load_global_at(config_dir)?);
    tracing::debug!(profile = %profile.project.name, file = %path.display(), "resolved profile");
    Ok(profile)
}

/// `resolve_at` convenience wrapper using the process working directory.
pub fn resolve() -> Result<ProjectProfile, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| io_err(".", e))?;
    resolve_at(&config_dir()?, &cwd)
}

/// Component count of the longest declared prefix containing `current`.
fn matching_depth(current: &Path, profile: &ProjectProfile) -> Option<usize> {
    profile
        .project
        .paths
        .iter()
        .map(|p| normalize_path(p))
        .filter(|prefix| current.starts_with(prefix))
        .map(|prefix| prefix.components().count())
        .max()
}

// ---------------------------------------------------------------------------
// 4. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save a profile to `<config_dir>/projects/<filename>.yml`.
///
/// Write flow: serialize → `.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_profile_at(
    config_dir: &Path,
    profile: &ProjectProfile,
    filename: &str,
) -> Result<PathBuf, ConfigError> {
    let dir = projects_dir_at(config_dir);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }

    let path = profile_path_at(config_dir, filename);
    let file_name = path
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or(filename)
        .to_owned();
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    let yaml = serde_yaml::to_string(profile)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path).map_err(|e| io_err(&path, e))?;
    Ok(path)
}

/// `save_profile_at` convenience wrapper.
pub fn save_profile(profile: &ProjectProfile, filename: &str) -> Result<PathBuf, ConfigError> {
    save_profile_at(&config_dir()?, profile, filename)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn profile_path_appends_yml() {
        let dir = Path::new("/cfg");
        assert_eq!(profile_path_at(dir, "acme"), PathBuf::from("/cfg/projects/acme.yml"));
        assert_eq!(profile_path_at(dir, "acme.yaml"), PathBuf::from("/cfg/projects/acme.yaml"));
    }

    #[test]
    fn lexical_clean_folds_dots_and_trailing_separator() {
        assert_eq!(lexical_clean(Path::new("/a/./b/../c/")), PathBuf::from("/a/c"));
    }

    #[test]
    fn normalize_strips_trailing_separator_for_missing_paths() {
        let normalized = normalize_path(Path::new("/definitely/not/here/"));
        assert_eq!(normalized, PathBuf::from("/definitely/not/here"));
    }

    #[test]
    fn list_profiles_missing_dir_is_empty() {
        let cfg = TempDir::new().expect("tempdir");
        assert!(list_profiles_at(cfg.path()).expect("list").is_empty());
    }

    #[test]
    fn load_global_missing_is_default() {
        let cfg = TempDir::new().expect("tempdir");
        assert_eq!(load_global_at(cfg.path()).expect("global"), GlobalConfig::default());
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(ConfigError::HomeNotFound.to_string().contains("configuration directory"));
    }
}
