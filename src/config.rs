//! Runtime options and environment lookups.
//!
//! All options come from the command line; there is no config file.  The two
//! sockets the daemon uses are located through the environment:
//!
//! | Socket          | Path                                         |
//! |-----------------|----------------------------------------------|
//! | niri IPC        | `$NIRI_SOCKET`                               |
//! | control socket  | `$XDG_RUNTIME_DIR/niri-float-sticky.sock`    |

use crate::pattern::{PatternError, WindowFilter};
use std::path::PathBuf;

/// File name of the control socket inside `$XDG_RUNTIME_DIR`.
pub const CONTROL_SOCKET_NAME: &str = "niri-float-sticky.sock";

/// Environment variable holding the niri IPC socket path.
pub const NIRI_SOCKET_ENV: &str = "NIRI_SOCKET";

/// Options that shape the dispatcher's policy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Floating windows are sticky unless overridden.  Default: `true`.
    pub auto_stick: bool,
    /// Move sticky windows even when the activated workspace is on another
    /// output.  Default: `false`.
    pub allow_foreign_monitors: bool,
    /// App-id and title filters for automatic stickiness.  Default: match
    /// everything.
    pub filter: WindowFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_stick: true,
            allow_foreign_monitors: false,
            filter: WindowFilter::default(),
        }
    }
}

impl Config {
    /// Build a config from raw filter fragments.
    pub fn new(
        auto_stick: bool,
        allow_foreign_monitors: bool,
        app_ids: &[String],
        titles: &[String],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            auto_stick,
            allow_foreign_monitors,
            filter: WindowFilter::from_fragments(app_ids, titles)?,
        })
    }
}

/// Error from assembling the runtime configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEnv(&'static str),
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(name)),
    }
}

/// Resolve the control socket path (`$XDG_RUNTIME_DIR/niri-float-sticky.sock`).
pub fn control_socket_path() -> Result<PathBuf, ConfigError> {
    let dir = required_env("XDG_RUNTIME_DIR")?;
    Ok(PathBuf::from(dir).join(CONTROL_SOCKET_NAME))
}

/// Resolve the niri IPC socket path from `$NIRI_SOCKET`.
pub fn niri_socket_path() -> Result<PathBuf, ConfigError> {
    required_env(NIRI_SOCKET_ENV).map(PathBuf::from)
}
