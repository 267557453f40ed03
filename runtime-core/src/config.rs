//! Layered runtime configuration (AMBIENT).
//!
//! `RuntimeConfig` aggregates the knobs that would otherwise be scattered
//! environment lookups: default socket timeout, default listen backlog,
//! default thread stack size, and log verbosity. Layered in increasing
//! priority — built-in defaults, an optional TOML file, then environment
//! variable overrides — mirroring the teacher's own `cross_platform_compat_layer`
//! crate, which pulls in `serde`/`toml` under "Serialization for
//! configuration" but never wires them to anything; this module is that
//! wiring, generalized to the whole runtime rather than one subsystem.

use std::path::Path;

use crate::error::{Code, Domain, Error};

/// Log verbosity knob, mapped onto `log::LevelFilter` at the call site that
/// installs a logger (this crate only carries the setting, it does not
/// install a logger itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogVerbosity {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogVerbosity {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Some(Self::Off),
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

/// The runtime-wide configuration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub default_socket_timeout_ms: u64,
    pub default_listen_backlog: i32,
    pub default_thread_stack_size: usize,
    pub log_verbosity: LogVerbosity,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            default_socket_timeout_ms: 30_000,
            default_listen_backlog: 128,
            default_thread_stack_size: 2 * 1024 * 1024,
            log_verbosity: LogVerbosity::Warn,
        }
    }
}

/// Mirrors `RuntimeConfig` but every field is optional, so a TOML file only
/// needs to name the knobs it wants to override.
#[derive(Debug, Default, serde::Deserialize)]
struct TomlOverrides {
    default_socket_timeout_ms: Option<u64>,
    default_listen_backlog: Option<i32>,
    default_thread_stack_size: Option<usize>,
    log_verbosity: Option<LogVerbosity>,
}

const ENV_CONFIG_FILE: &str = "MULTIOS_RUNTIME_CONFIG";
const ENV_SOCKET_TIMEOUT_MS: &str = "MULTIOS_RUNTIME_SOCKET_TIMEOUT_MS";
const ENV_LISTEN_BACKLOG: &str = "MULTIOS_RUNTIME_LISTEN_BACKLOG";
const ENV_THREAD_STACK_SIZE: &str = "MULTIOS_RUNTIME_THREAD_STACK_SIZE";
const ENV_LOG_VERBOSITY: &str = "MULTIOS_RUNTIME_LOG_VERBOSITY";

impl RuntimeConfig {
    /// Built-in defaults layered with an optional TOML file (path named by
    /// `MULTIOS_RUNTIME_CONFIG`) and then environment variable overrides.
    /// A missing config file is not an error; a present-but-unparseable one
    /// is.
    pub fn load() -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(path) = std::env::var_os(ENV_CONFIG_FILE) {
            config.merge_toml_file(Path::new(&path))?;
        }

        config.apply_env_overrides();
        log::debug!("runtime config loaded: {:?}", config);
        Ok(config)
    }

    /// Applies only the keys present in `path`'s TOML file, leaving
    /// everything else untouched. Public so callers that already know their
    /// config file's location (rather than going through the env var) can
    /// still layer it the same way.
    pub fn merge_toml_file(&mut self, path: &Path) -> Result<(), Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::from_io(Domain::Io, e))?;
        let overrides: TomlOverrides = toml::from_str(&text)
            .map_err(|e| Error::new(Domain::Io, Code::InvalidArgument, format!("invalid config file: {e}")))?;

        if let Some(v) = overrides.default_socket_timeout_ms {
            self.default_socket_timeout_ms = v;
        }
        if let Some(v) = overrides.default_listen_backlog {
            self.default_listen_backlog = v;
        }
        if let Some(v) = overrides.default_thread_stack_size {
            self.default_thread_stack_size = v;
        }
        if let Some(v) = overrides.log_verbosity {
            self.log_verbosity = v;
        }
        Ok(())
    }

    /// Environment variables win over both defaults and the TOML file.
    /// Unparseable values are ignored with a `warn` log rather than
    /// rejected outright — a malformed override shouldn't prevent startup.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(ENV_SOCKET_TIMEOUT_MS) {
            match raw.parse() {
                Ok(v) => self.default_socket_timeout_ms = v,
                Err(_) => log::warn!("ignoring invalid {ENV_SOCKET_TIMEOUT_MS}={raw:?}"),
            }
        }
        if let Ok(raw) = std::env::var(ENV_LISTEN_BACKLOG) {
            match raw.parse() {
                Ok(v) => self.default_listen_backlog = v,
                Err(_) => log::warn!("ignoring invalid {ENV_LISTEN_BACKLOG}={raw:?}"),
            }
        }
        if let Ok(raw) = std::env::var(ENV_THREAD_STACK_SIZE) {
            match raw.parse() {
                Ok(v) => self.default_thread_stack_size = v,
                Err(_) => log::warn!("ignoring invalid {ENV_THREAD_STACK_SIZE}={raw:?}"),
            }
        }
        if let Ok(raw) = std::env::var(ENV_LOG_VERBOSITY) {
            match LogVerbosity::parse(&raw) {
                Some(v) => self.log_verbosity = v,
                None => log::warn!("ignoring invalid {ENV_LOG_VERBOSITY}={raw:?}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // `std::env::set_var` is process-global; serialize the tests that touch
    // it so they don't stomp on each other when run concurrently.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_are_stable() {
        let config = RuntimeConfig::default();
        assert_eq!(config.default_socket_timeout_ms, 30_000);
        assert_eq!(config.default_listen_backlog, 128);
        assert_eq!(config.log_verbosity, LogVerbosity::Warn);
    }

    #[test]
    fn toml_file_overrides_only_named_keys() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("multios-runtime-config-test-{:?}.toml", std::thread::current().id()));
        std::fs::write(&path, "default_listen_backlog = 256\nlog_verbosity = \"trace\"\n").unwrap();

        let mut config = RuntimeConfig::default();
        config.merge_toml_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.default_listen_backlog, 256);
        assert_eq!(config.log_verbosity, LogVerbosity::Trace);
        // Untouched keys keep their defaults.
        assert_eq!(config.default_socket_timeout_ms, 30_000);
    }

    #[test]
    fn missing_toml_file_is_an_error() {
        let mut config = RuntimeConfig::default();
        let missing = std::env::temp_dir().join("multios-runtime-config-does-not-exist.toml");
        assert!(config.merge_toml_file(&missing).is_err());
    }

    #[test]
    fn malformed_toml_file_is_an_error() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("multios-runtime-config-bad-{:?}.toml", std::thread::current().id()));
        std::fs::write(&path, "this is not valid toml =====").unwrap();

        let mut config = RuntimeConfig::default();
        let result = config.merge_toml_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn env_override_wins_over_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(ENV_LISTEN_BACKLOG, "512");
        let mut config = RuntimeConfig::default();
        config.apply_env_overrides();
        std::env::remove_var(ENV_LISTEN_BACKLOG);
        assert_eq!(config.default_listen_backlog, 512);
    }

    #[test]
    fn invalid_env_override_is_ignored() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(ENV_LISTEN_BACKLOG, "not-a-number");
        let mut config = RuntimeConfig::default();
        config.apply_env_overrides();
        std::env::remove_var(ENV_LISTEN_BACKLOG);
        assert_eq!(config.default_listen_backlog, 128);
    }
}
