//! Build configuration loading and validation.
//!
//! The configuration lives at `conf/build.cfg` under the installation root,
//! one `key=value` per line. Blank lines and lines starting with `#` are
//! ignored; a trailing `#` on a value line starts a comment. Keys are
//! case-insensitive and must belong to the fixed [`SCHEMA`]; every schema
//! option is either supplied in the file or falls back to its default.
//!
//! Loading produces an immutable [`BuildConfig`] that is passed by reference
//! through acquisition, preparation, and the build driver.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A recognized configuration option and its optional default.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub default: Option<&'static str>,
}

/// The fixed set of recognized configuration keys.
///
/// Any key in the config file that is not listed here is a fatal error, as
/// is any entry without a supplied value or default.
pub const SCHEMA: &[OptionSpec] = &[
    OptionSpec {
        name: "kernel_version",
        default: None,
    },
    OptionSpec {
        name: "path_source",
        default: Some("/usr/src"),
    },
    OptionSpec {
        name: "mirror",
        default: Some("https://www.kernel.org/pub/linux/kernel"),
    },
    OptionSpec {
        name: "make_jobs",
        default: Some("1"),
    },
];

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{0}': expected exactly one '='")]
    MalformedLine(String),

    #[error("cannot find the definition of '{0}'")]
    UnknownKey(String),

    #[error("'{0}' is not set")]
    Unset(&'static str),

    #[error("invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

fn schema_entry(key: &str) -> Option<&'static OptionSpec> {
    SCHEMA.iter().find(|spec| spec.name == key)
}

/// Parse the raw text of a config file into supplied key/value pairs.
///
/// Keys are lowercased. Unknown keys and lines without exactly one `=` are
/// rejected here, before defaults are considered.
pub fn parse_settings(text: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut supplied = BTreeMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('=').collect();
        if parts.len() != 2 {
            return Err(ConfigError::MalformedLine(line.to_string()));
        }

        let key = parts[0].trim().to_lowercase();
        // Strip a trailing comment from the value.
        let value = parts[1].split('#').next().unwrap_or("").trim().to_string();

        if schema_entry(&key).is_none() {
            return Err(ConfigError::UnknownKey(key));
        }
        supplied.insert(key, value);
    }

    Ok(supplied)
}

/// Resolve supplied settings against the schema.
///
/// Returns a map covering every schema key, using supplied values where
/// present and declared defaults otherwise.
pub fn resolve_settings(
    supplied: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut resolved = BTreeMap::new();

    for spec in SCHEMA {
        let value = match supplied.get(spec.name) {
            Some(value) => value.clone(),
            None => match spec.default {
                Some(default) => default.to_string(),
                None => return Err(ConfigError::Unset(spec.name)),
            },
        };
        resolved.insert(spec.name.to_string(), value);
    }

    Ok(resolved)
}

/// Resolved, validated build configuration.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Kernel version to fetch and build, `MAJOR.MINOR.PATCH`.
    pub kernel_version: String,
    /// Directory holding downloaded archives and extracted source trees.
    pub source_dir: PathBuf,
    /// Base URL of the kernel archive mirror.
    pub mirror: String,
    /// `-j` value for the compile steps.
    pub make_jobs: u32,
}

impl BuildConfig {
    /// Load and validate the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let supplied = parse_settings(&text)?;
        let resolved = resolve_settings(&supplied)?;
        Self::from_settings(&resolved)
    }

    /// Build a typed config from a fully resolved settings map.
    ///
    /// The map must cover every schema key (as produced by
    /// [`resolve_settings`]); values are validated here.
    pub fn from_settings(settings: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &'static str| -> Result<&String, ConfigError> {
            settings.get(key).ok_or(ConfigError::Unset(key))
        };

        let kernel_version = get("kernel_version")?.clone();
        validate_kernel_version(&kernel_version)?;

        let source_dir = PathBuf::from(get("path_source")?);

        // The archive path is "<mirror>/v<major>.x/..."; a trailing slash
        // would double up.
        let mirror = get("mirror")?.trim_end_matches('/').to_string();

        let raw_jobs = get("make_jobs")?;
        let make_jobs = raw_jobs
            .parse::<u32>()
            .ok()
            .filter(|jobs| *jobs >= 1)
            .ok_or(ConfigError::InvalidValue {
                key: "make_jobs",
                value: raw_jobs.clone(),
                reason: "expected a positive integer",
            })?;

        Ok(Self {
            kernel_version,
            source_dir,
            mirror,
            make_jobs,
        })
    }
}

/// Check that a kernel version has the `MAJOR.MINOR.PATCH` shape.
///
/// The mirror directory is derived from the major segment, so the major
/// must be numeric; the remaining segments only need to be non-empty
/// (patch levels like `3-rc1` are valid filenames upstream).
fn validate_kernel_version(version: &str) -> Result<(), ConfigError> {
    let segments: Vec<&str> = version.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|segment| segment.is_empty()) {
        return Err(ConfigError::InvalidValue {
            key: "kernel_version",
            value: version.to_string(),
            reason: "expected three dot-separated segments",
        });
    }
    if !segments[0].bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::InvalidValue {
            key: "kernel_version",
            value: version.to_string(),
            reason: "major version segment must be numeric",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_from_str(text: &str) -> Result<BuildConfig, ConfigError> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        BuildConfig::load(file.path())
    }

    #[test]
    fn resolves_defaults_for_unsupplied_keys() {
        let config = load_from_str("kernel_version=5.15.3\n").unwrap();
        assert_eq!(config.kernel_version, "5.15.3");
        assert_eq!(config.source_dir, PathBuf::from("/usr/src"));
        assert_eq!(config.mirror, "https://www.kernel.org/pub/linux/kernel");
        assert_eq!(config.make_jobs, 1);
    }

    #[test]
    fn supplied_values_override_defaults() {
        let config = load_from_str(
            "kernel_version=6.1.9\npath_source=/var/tmp/src\nmake_jobs=8\n",
        )
        .unwrap();
        assert_eq!(config.source_dir, PathBuf::from("/var/tmp/src"));
        assert_eq!(config.make_jobs, 8);
    }

    #[test]
    fn resolved_settings_cover_every_schema_key() {
        let supplied = parse_settings("kernel_version=5.15.3\n").unwrap();
        let resolved = resolve_settings(&supplied).unwrap();
        for spec in SCHEMA {
            assert!(resolved.contains_key(spec.name), "missing {}", spec.name);
        }
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let config = load_from_str(
            "# build settings\n\nKERNEL_VERSION=5.15.3  # pinned\n\n# end\n",
        )
        .unwrap();
        assert_eq!(config.kernel_version, "5.15.3");
    }

    #[test]
    fn line_without_equals_is_malformed() {
        let err = load_from_str("kernel_version\n").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedLine(_)));
    }

    #[test]
    fn line_with_two_equals_is_malformed() {
        let err = load_from_str("kernel_version=5.15.3=extra\n").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedLine(_)));
    }

    #[test]
    fn unknown_key_is_named() {
        let err = load_from_str("kernel_colour=blue\n").unwrap_err();
        match err {
            ConfigError::UnknownKey(key) => assert_eq!(key, "kernel_colour"),
            other => panic!("expected UnknownKey, got {other:?}"),
        }
    }

    #[test]
    fn unset_required_key_is_named() {
        let err = load_from_str("path_source=/usr/src\n").unwrap_err();
        match err {
            ConfigError::Unset(key) => assert_eq!(key, "kernel_version"),
            other => panic!("expected Unset, got {other:?}"),
        }
    }

    #[test]
    fn two_segment_version_is_rejected() {
        let err = load_from_str("kernel_version=5.15\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "kernel_version",
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_major_is_rejected() {
        let err = load_from_str("kernel_version=latest.0.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "kernel_version",
                ..
            }
        ));
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let err = load_from_str("kernel_version=5.15.3\nmake_jobs=0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "make_jobs",
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = BuildConfig::load(Path::new("/nonexistent/build.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn trailing_mirror_slash_is_normalized() {
        let config = load_from_str(
            "kernel_version=5.15.3\nmirror=https://mirror.example/pub/linux/kernel/\n",
        )
        .unwrap();
        assert_eq!(config.mirror, "https://mirror.example/pub/linux/kernel");
    }
}
