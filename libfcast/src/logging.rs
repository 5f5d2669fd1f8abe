//! Diagnostics for the fcast binaries
//!
//! Everything goes to stderr so stdout carries only command output and the
//! tools can be piped into `jq`. The filter is picked from, highest first:
//! `RUST_LOG`, the binary's `--verbose` flag (`debug`), `FCAST_LOG_LEVEL`,
//! then `warn`. `FCAST_LOG_FORMAT=json` switches to one JSON object per line.

use tracing_subscriber::EnvFilter;

pub const FORMAT_ENV: &str = "FCAST_LOG_FORMAT";
pub const LEVEL_ENV: &str = "FCAST_LOG_LEVEL";

const QUIET: &str = "warn";
const VERBOSE: &str = "debug";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Unknown names fall back to text rather than failing the command.
    fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Logging choices for one run of a binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub directive: String,
}

impl LogSettings {
    pub fn resolve(format: Option<&str>, level: Option<&str>, verbose: bool) -> Self {
        let directive = match level {
            _ if verbose => VERBOSE,
            Some(level) => level,
            None => QUIET,
        };
        Self {
            format: format.map(LogFormat::from_name).unwrap_or_default(),
            directive: directive.to_string(),
        }
    }

    pub fn from_env(verbose: bool) -> Self {
        let format = env_nonempty(FORMAT_ENV);
        let level = env_nonempty(LEVEL_ENV);
        Self::resolve(format.as_deref(), level.as_deref(), verbose)
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.directive))
    }

    /// Install the global subscriber. Later calls leave the first one in place.
    pub fn install(&self) {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr)
            .with_target(false);

        let installed = match self.format {
            LogFormat::Text => builder.with_ansi(false).try_init(),
            LogFormat::Json => builder.json().flatten_event(true).try_init(),
        };
        if installed.is_err() {
            tracing::trace!("subscriber already installed");
        }
    }
}

/// Set up logging for a binary from its `--verbose` flag and the environment.
pub fn init(verbose: bool) {
    LogSettings::from_env(verbose).install();
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_by_default() {
        let settings = LogSettings::resolve(None, None, false);
        assert_eq!(settings.format, LogFormat::Text);
        assert_eq!(settings.directive, "warn");
    }

    #[test]
    fn test_verbose_beats_configured_level() {
        let settings = LogSettings::resolve(None, Some("error"), true);
        assert_eq!(settings.directive, "debug");

        let settings = LogSettings::resolve(None, Some("libfcast=trace"), false);
        assert_eq!(settings.directive, "libfcast=trace");
    }

    #[test]
    fn test_format_names() {
        let format = |name: &str| LogSettings::resolve(Some(name), None, false).format;
        assert_eq!(format("JSON"), LogFormat::Json);
        assert_eq!(format(" json "), LogFormat::Json);
        assert_eq!(format("pretty"), LogFormat::Text);
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_reads_fcast_variables() {
        std::env::set_var(FORMAT_ENV, "json");
        std::env::set_var(LEVEL_ENV, "info");
        let settings = LogSettings::from_env(false);
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.directive, "info");

        // Blank values count as unset
        std::env::set_var(LEVEL_ENV, "  ");
        assert_eq!(LogSettings::from_env(false).directive, "warn");

        std::env::remove_var(FORMAT_ENV);
        std::env::remove_var(LEVEL_ENV);
    }

    #[test]
    fn test_install_twice_is_harmless() {
        let settings = LogSettings::resolve(None, None, false);
        settings.install();
        settings.install();
    }
}
