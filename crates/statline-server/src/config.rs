// Configuration loading and parsing (server.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Used when no `[database] path` is configured and no platform data
/// directory can be determined.
const FALLBACK_DB_FILE: &str = "statline.db";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Resolved SQLite path (never empty).
    pub db_path: String,
    /// Stats CSV used to seed an empty database, relative to the working
    /// directory unless absolute.
    pub stats_csv: PathBuf,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// ---------------------------------------------------------------------------
// server.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire server.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ServerFile {
    server: ServerConfig,
    #[serde(default)]
    database: DatabaseSection,
    data: DataSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origin allowed to open a WebSocket. Clients that send no
    /// `Origin` header (non-browser tools) are always accepted.
    pub allowed_origin: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DataSection {
    stats_csv: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/server.toml` relative to
/// `base_dir`. Does not copy defaults; see [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let server_path = base_dir.join("config").join("server.toml");
    let text = read_file(&server_path)?;
    let file: ServerFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: server_path.clone(),
        source: e,
    })?;

    let db_path = match file.database.path {
        Some(path) => path,
        None => default_db_path(),
    };

    let config = Config {
        server: file.server,
        db_path,
        stats_csv: PathBuf::from(file.data.stats_csv),
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the server crate directory or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying default
/// config files first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// `<platform data dir>/statline.db`, or `statline.db` in the working
/// directory when the platform gives no home directory.
fn default_db_path() -> String {
    directories::ProjectDirs::from("", "", "statline")
        .map(|dirs| dirs.data_dir().join(FALLBACK_DB_FILE))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DB_FILE))
        .to_string_lossy()
        .into_owned()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.host.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "server.host".into(),
            message: "must not be empty".into(),
        });
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError {
            field: "server.port".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.server.allowed_origin.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "server.allowed_origin".into(),
            message: "must not be empty".into(),
        });
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty when set".into(),
        });
    }

    if config.stats_csv.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.stats_csv".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Path to the server crate root, whether `cargo test` runs from the
    /// crate or the workspace root.
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/statline-server/defaults").exists() {
            cwd.join("crates/statline-server")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Fresh scratch directory containing `config/server.toml` with `body`.
    fn scratch_with_config(name: &str, body: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/server.toml"), body).unwrap();
        tmp
    }

    const VALID: &str = r#"
[server]
host = "0.0.0.0"
port = 9100
allowed_origin = "http://localhost:5173"

[database]
path = "/tmp/statline-test.db"

[data]
stats_csv = "data/stats.csv"
"#;

    #[test]
    fn defaults_file_loads() {
        let root = project_root();
        let tmp = std::env::temp_dir().join("statline_config_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::copy(
            root.join("defaults/server.toml"),
            tmp.join("config/server.toml"),
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("defaults should be valid");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.allowed_origin, "http://localhost:5173");
        assert_eq!(config.stats_csv, PathBuf::from("data/stats.csv"));
        // No [database] path in defaults: falls back to the data directory.
        assert!(config.db_path.ends_with(FALLBACK_DB_FILE));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn explicit_values_are_used() {
        let tmp = scratch_with_config("statline_config_explicit", VALID);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9100");
        assert_eq!(config.db_path, "/tmp/statline-test.db");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_port_zero() {
        let body = VALID.replace("port = 9100", "port = 0");
        let tmp = scratch_with_config("statline_config_port_zero", &body);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "server.port"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_stats_csv() {
        let body = VALID.replace("stats_csv = \"data/stats.csv\"", "stats_csv = \"\"");
        let tmp = scratch_with_config("statline_config_empty_csv", &body);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "data.stats_csv"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_blank_database_path() {
        let body = VALID.replace("/tmp/statline-test.db", "  ");
        let tmp = scratch_with_config("statline_config_blank_db", &body);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "database.path"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_server_toml() {
        let tmp = std::env::temp_dir().join("statline_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }), "{err}");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch_with_config("statline_config_bad_toml", "[server\nport = ");
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }), "{err}");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_then_skips() {
        let root = project_root();
        let tmp = std::env::temp_dir().join("statline_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            root.join("defaults/server.toml"),
            tmp.join("defaults/server.toml"),
        )
        .unwrap();
        fs::write(tmp.join("defaults/server.toml.example"), "ignored").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config/server.toml")]);
        assert!(!tmp.join("config/server.toml.example").exists());

        // Second run leaves the existing file alone.
        fs::write(tmp.join("config/server.toml"), VALID).unwrap();
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.server.port, 9100);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("statline_config_nothing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }
}
