//! Tracing subscriber setup
//!
//! The level comes from `RUST_LOG` when set, else from `[logging].level`.
//! Output goes to stderr, or appends to `[logging].file`.

use super::config::LoggingConfig;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Pick the filter directive: environment first, then config.
pub fn filter_directive(env: Option<String>, config_level: &str) -> String {
    env.filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config_level.to_string())
}

/// Install the global subscriber. Safe to call once per process.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), &config.level);
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| format!("Invalid log level '{}': {}", directive, e))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Failed to open log file '{}': {}", path.display(), e))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| e.to_string())?;
        }
        None => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_takes_priority() {
        assert_eq!(
            filter_directive(Some("sigvault=trace".to_string()), "info"),
            "sigvault=trace"
        );
    }

    #[test]
    fn test_config_level_used_without_env() {
        assert_eq!(filter_directive(None, "warn"), "warn");
        assert_eq!(filter_directive(Some("  ".to_string()), "debug"), "debug");
    }
}
