//! Logging setup for ninjactl
//!
//! Filter priority:
//! 1. `--verbose` (debug for our crates)
//! 2. `$NINJA_LOG` environment variable
//! 3. `[log] level` from the config file
//!
//! Logs go to stderr so stdout stays clean for `--json`.

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "NINJA_LOG";

/// Pick the filter directive to use
pub fn filter_directive(env: Option<&str>, config_level: &str, verbose: bool) -> String {
    if verbose {
        return "ninja_common=debug,ninjactl=debug,warn".to_string();
    }
    match env.map(str::trim).filter(|v| !v.is_empty()) {
        Some(directive) => directive.to_string(),
        None => config_level.to_string(),
    }
}

/// Install the global tracing subscriber
pub fn init(config_level: &str, verbose: bool) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(env.as_deref(), config_level, verbose);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter '{}'", directive))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}
