// src/core/settings.rs

//! User settings and the trace sink they select.

use crate::constants::{
    CONFIG_DIR_NAME, DEFAULT_TRACE_PREFIX, SETTINGS_ENV_VAR, SETTINGS_FILENAME,
};
use crate::core::trace::{LogSink, TraceSink, WriterSink};
use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Failures while loading settings or building the sink they describe.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("Could not read settings file '{path}': {source}")]
    Read {
        /// The file involved.
        path: String,
        /// What went wrong.
        #[source]
        source: std::io::Error,
    },
    /// The settings file is not valid TOML or has unknown keys.
    #[error("Settings file '{path}' is not valid: {source}")]
    Parse {
        /// The file involved.
        path: String,
        /// What went wrong.
        #[source]
        source: toml::de::Error,
    },
    /// The `file` destination was chosen without a `path`.
    #[error("Trace destination 'file' requires a 'path'.")]
    MissingTracePath,
    /// `~` or a variable in the trace path could not be expanded.
    #[error("Could not expand trace path '{path}': {message}")]
    PathExpansion {
        /// The path as written in the settings.
        path: String,
        /// Why expansion failed.
        message: String,
    },
    /// The trace file or its directory could not be created or opened.
    #[error("Could not open trace file '{path}': {source}")]
    TraceFile {
        /// The file involved.
        path: String,
        /// What went wrong.
        #[source]
        source: std::io::Error,
    },
}

/// User settings, read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// The `[trace]` section.
    pub trace: TraceSettings,
}

/// The `[trace]` section: where trace lines and fatal messages go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceSettings {
    /// Where diagnostics go. Defaults to stderr.
    pub destination: TraceDestination,
    /// Text put in front of every trace line. Defaults to `[plumb] $ `.
    pub prefix: String,
    /// Target file for the `file` destination. `~` and `$VAR` are expanded.
    pub path: Option<String>,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            destination: TraceDestination::default(),
            prefix: DEFAULT_TRACE_PREFIX.to_string(),
            path: None,
        }
    }
}

/// The kinds of trace sinks that settings can select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceDestination {
    /// The `log` facade, target `plumb::trace`.
    Log,
    /// The standard error stream of the current process.
    #[default]
    Stderr,
    /// Appended to the file named by `path`.
    File,
}

impl TraceSettings {
    /// Builds the sink described by these settings.
    ///
    /// # Errors
    /// Fails for the `file` destination when no path is set, the path cannot be
    /// expanded, or the file cannot be opened for appending.
    pub fn build_sink(&self) -> Result<Arc<dyn TraceSink>, SettingsError> {
        match self.destination {
            TraceDestination::Log => Ok(Arc::new(LogSink::new(self.prefix.clone()))),
            TraceDestination::Stderr => Ok(Arc::new(WriterSink::stderr(self.prefix.clone()))),
            TraceDestination::File => {
                let template = self.path.as_deref().ok_or(SettingsError::MissingTracePath)?;
                let path = expand_path(template)?;
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        fs::create_dir_all(parent).map_err(|e| SettingsError::TraceFile {
                            path: path.display().to_string(),
                            source: e,
                        })?;
                    }
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|e| SettingsError::TraceFile {
                        path: path.display().to_string(),
                        source: e,
                    })?;
                Ok(Arc::new(WriterSink::new(self.prefix.clone(), file)))
            }
        }
    }
}

/// Expands `~` and environment variables in a path template.
fn expand_path(template: &str) -> Result<PathBuf, SettingsError> {
    let expanded = shellexpand::full(template).map_err(|e| SettingsError::PathExpansion {
        path: template.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Returns `<config_dir>/plumb/config.toml`, if the system has a config directory.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(SETTINGS_FILENAME))
}

/// Loads settings, looking in order at `explicit`, the `PLUMB_CONFIG` variable and
/// the default location.
///
/// A file named explicitly (by argument or variable) must exist. A missing file at
/// the default location just means default settings.
///
/// # Errors
/// Returns an error if the chosen file cannot be read or parsed.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    let candidate = settings_candidate(
        explicit,
        env::var_os(SETTINGS_ENV_VAR),
        default_settings_path(),
    );
    match candidate {
        Some(SettingsCandidate { path, required }) => {
            if !required && !path.exists() {
                log::debug!(
                    "No settings file at '{}', using defaults.",
                    path.display()
                );
                return Ok(Settings::default());
            }
            read_settings(&path)
        }
        None => Ok(Settings::default()),
    }
}

/// Reads and parses a settings file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid settings TOML.
pub fn read_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|e| SettingsError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    let settings = toml::from_str(&content).map_err(|e| SettingsError::Parse {
        path: path.display().to_string(),
        source: e,
    })?;
    log::debug!("Loaded settings from '{}'.", path.display());
    Ok(settings)
}

#[derive(Debug, PartialEq, Eq)]
struct SettingsCandidate {
    path: PathBuf,
    required: bool,
}

fn settings_candidate(
    explicit: Option<&Path>,
    from_env: Option<OsString>,
    default: Option<PathBuf>,
) -> Option<SettingsCandidate> {
    if let Some(path) = explicit {
        return Some(SettingsCandidate {
            path: path.to_path_buf(),
            required: true,
        });
    }
    if let Some(value) = from_env.filter(|v| !v.is_empty()) {
        return Some(SettingsCandidate {
            path: PathBuf::from(value),
            required: true,
        });
    }
    default.map(|path| SettingsCandidate {
        path,
        required: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_defaults_when_sections_are_missing() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.trace.destination, TraceDestination::Stderr);
        assert_eq!(settings.trace.prefix, DEFAULT_TRACE_PREFIX);
    }

    #[test]
    fn test_read_settings_from_file() {
        // --- Setup ---
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[trace]\ndestination = \"log\"\nprefix = \"[deploy] $ \"").unwrap();
        file.flush().unwrap();

        // --- Execute ---
        let settings = read_settings(file.path()).unwrap();

        // --- Assert ---
        assert_eq!(settings.trace.destination, TraceDestination::Log);
        assert_eq!(settings.trace.prefix, "[deploy] $ ");
        assert_eq!(settings.trace.path, None);
    }

    #[test]
    fn test_read_settings_rejects_unknown_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[trace]\ncolour = true").unwrap();
        file.flush().unwrap();
        let result = read_settings(file.path());
        assert!(matches!(result, Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn test_load_settings_requires_explicit_file() {
        let dir = TempDir::new().unwrap();
        let result = load_settings(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(SettingsError::Read { .. })));
    }

    #[test]
    fn test_candidate_precedence() {
        let default = Some(PathBuf::from("/etc/default.toml"));

        let explicit = settings_candidate(
            Some(Path::new("/tmp/explicit.toml")),
            Some(OsString::from("/tmp/env.toml")),
            default.clone(),
        );
        assert_eq!(
            explicit,
            Some(SettingsCandidate {
                path: PathBuf::from("/tmp/explicit.toml"),
                required: true
            })
        );

        let from_env =
            settings_candidate(None, Some(OsString::from("/tmp/env.toml")), default.clone());
        assert_eq!(from_env.map(|c| c.path), Some(PathBuf::from("/tmp/env.toml")));

        let fallback = settings_candidate(None, Some(OsString::new()), default);
        assert_eq!(
            fallback,
            Some(SettingsCandidate {
                path: PathBuf::from("/etc/default.toml"),
                required: false
            })
        );
    }

    #[test]
    fn test_file_destination_requires_path() {
        let settings = TraceSettings {
            destination: TraceDestination::File,
            ..TraceSettings::default()
        };
        assert!(matches!(settings.build_sink(), Err(SettingsError::MissingTracePath)));
    }

    #[test]
    fn test_file_destination_appends_lines() {
        // --- Setup ---
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("trace.log");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "earlier\n").unwrap();
        let settings = TraceSettings {
            destination: TraceDestination::File,
            prefix: String::new(),
            path: Some(path.display().to_string()),
        };

        // --- Execute ---
        let sink = settings.build_sink().unwrap();
        sink.trace("+ go build app");
        drop(sink);

        // --- Assert ---
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "earlier\n+ go build app\n");
    }
}
