//! Resolver settings layered from defaults and environment variables.
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `SBV_RATE_TIMEOUT_MS` | per-request HTTP timeout |
//! | `SBV_RATE_BAND` | `standard`, `strict` or `LOW-HIGH` |
//! | `SBV_RATE_POLICY` | `priority` or `median` |
//! | `SBV_RATE_BROWSER` | Chromium/Chrome binary for the rendered source |
//! | `SBV_RATE_DUMP_DIR` | directory for debug artifacts |
//!
//! CLI flags are applied on top by the caller.

use std::env;
use std::path::PathBuf;

use crate::{PlausibilityBand, ResolutionPolicy, SourceId, ValidationError};

pub const ENV_TIMEOUT_MS: &str = "SBV_RATE_TIMEOUT_MS";
pub const ENV_BAND: &str = "SBV_RATE_BAND";
pub const ENV_POLICY: &str = "SBV_RATE_POLICY";
pub const ENV_BROWSER: &str = "SBV_RATE_BROWSER";
pub const ENV_DUMP_DIR: &str = "SBV_RATE_DUMP_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub policy: ResolutionPolicy,
    pub band: PlausibilityBand,
    /// Overrides the catalog timeout of every HTTP source.
    pub timeout_ms: Option<u64>,
    /// Explicit source selection; `None` means every default source.
    pub sources: Option<Vec<SourceId>>,
    /// Adds the headless-browser source to the default selection.
    pub render: bool,
    pub browser: Option<PathBuf>,
    pub dump_dir: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            policy: ResolutionPolicy::default(),
            band: PlausibilityBand::default(),
            timeout_ms: None,
            sources: None,
            render: false,
            browser: None,
            dump_dir: PathBuf::from("."),
        }
    }
}

impl ResolverConfig {
    /// Defaults overlaid with `SBV_RATE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = value(ENV_TIMEOUT_MS) {
            let timeout_ms = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ValidationError::InvalidSetting {
                    name: ENV_TIMEOUT_MS,
                    value: raw.clone(),
                })?;
            config.timeout_ms = Some(validate_timeout(timeout_ms)?);
        }
        if let Some(raw) = value(ENV_BAND) {
            config.band = raw.parse()?;
        }
        if let Some(raw) = value(ENV_POLICY) {
            config.policy = raw.parse()?;
        }
        if let Some(raw) = value(ENV_BROWSER) {
            config.browser = Some(PathBuf::from(raw.trim()));
        }
        if let Some(raw) = value(ENV_DUMP_DIR) {
            config.dump_dir = PathBuf::from(raw.trim());
        }

        Ok(config)
    }

    /// Sources to query before chain ordering.
    pub fn selected_sources(&self) -> Vec<SourceId> {
        match &self.sources {
            Some(sources) => sources.clone(),
            None => SourceId::ALL
                .into_iter()
                .filter(|id| self.render || *id != SourceId::SbvRendered)
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(timeout_ms) = self.timeout_ms {
            validate_timeout(timeout_ms)?;
        }
        if self.sources.as_ref().is_some_and(Vec::is_empty) {
            return Err(ValidationError::EmptySourceList);
        }
        Ok(())
    }
}

fn validate_timeout(timeout_ms: u64) -> Result<u64, ValidationError> {
    if timeout_ms == 0 {
        return Err(ValidationError::ZeroTimeout);
    }
    Ok(timeout_ms)
}
