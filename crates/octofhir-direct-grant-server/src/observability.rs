//! Tracing setup for the server binary.
//!
//! The subscriber is installed before the configuration file is read, so it
//! starts from `RUST_LOG` or `info`. The filter sits behind a reload layer and
//! is swapped for `logging.level` once the configuration has been loaded.

use std::sync::OnceLock;

use tracing_subscriber::{
    EnvFilter, Registry,
    filter::ParseError,
    fmt,
    layer::SubscriberExt,
    reload,
    util::SubscriberInitExt,
};

const STARTUP_LEVEL: &str = "info";

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Origin of the active log filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    /// `RUST_LOG` is set and always wins.
    Environment,
    /// Startup default, replaced by `logging.level` from the configuration.
    Configuration,
}

impl std::fmt::Display for FilterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Environment => write!(f, "RUST_LOG"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

fn env_filter() -> Option<EnvFilter> {
    std::env::var_os(EnvFilter::DEFAULT_ENV)?;
    EnvFilter::try_from_default_env().ok()
}

/// Builds a filter from a `logging.level` value.
pub fn level_filter(level: &str) -> Result<EnvFilter, ParseError> {
    EnvFilter::try_new(level.trim())
}

/// Installs the global subscriber. A second call leaves the first in place.
pub fn init_tracing() -> FilterSource {
    let (filter, source) = match env_filter() {
        Some(filter) => (filter, FilterSource::Environment),
        None => (EnvFilter::new(STARTUP_LEVEL), FilterSource::Configuration),
    };

    let (filter_layer, handle) = reload::Layer::new(filter);
    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if installed {
        let _ = FILTER_HANDLE.set(handle);
    }
    source
}

/// Switches the filter to the configured level.
///
/// Returns `false` when `RUST_LOG` is set, no subscriber was installed by
/// [`init_tracing`], or the level does not parse.
pub fn apply_logging_level(level: &str) -> bool {
    if env_filter().is_some() {
        return false;
    }
    let Some(handle) = FILTER_HANDLE.get() else {
        return false;
    };

    match level_filter(level) {
        Ok(filter) => handle.reload(filter).is_ok(),
        Err(e) => {
            tracing::warn!(level, error = %e, "Ignoring unparsable log level");
            false
        }
    }
}
