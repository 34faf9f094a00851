use sbv_rate_core::{
    PlausibilityBand, RateQuery, RateResolver, Resolution, ResolverConfig, SourceId,
};
use tracing::debug;

use crate::cli::Cli;
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Resolution, CliError> {
    let query = match &cli.date {
        Some(date) => RateQuery::parse(date, cli.debug)?,
        None => RateQuery::today(cli.debug),
    };
    let config = apply_overrides(cli, ResolverConfig::from_env()?)?;
    let resolver = RateResolver::builder().with_config(config).build()?;
    debug!(date = %query, chain = ?resolver.source_chain(), "resolving");

    Ok(resolver.resolve(&query).await?)
}

/// Layers command-line flags over environment settings.
fn apply_overrides(cli: &Cli, mut config: ResolverConfig) -> Result<ResolverConfig, CliError> {
    if let Some(policy) = &cli.policy {
        config.policy = policy.parse()?;
    }
    if !cli.sources.is_empty() {
        let sources = cli
            .sources
            .iter()
            .map(|raw| raw.parse::<SourceId>())
            .collect::<Result<Vec<_>, _>>()?;
        config.sources = Some(sources);
    }
    if cli.strict_band {
        config.band = PlausibilityBand::strict();
    }
    if let (Some(lower), Some(upper)) = (cli.band_min, cli.band_max) {
        config.band = PlausibilityBand::new(lower, upper)?;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = Some(timeout_ms);
    }
    if cli.render {
        config.render = true;
    }
    if let Some(dump_dir) = &cli.dump_dir {
        config.dump_dir = dump_dir.clone();
    }

    config.validate()?;
    Ok(config)
}
