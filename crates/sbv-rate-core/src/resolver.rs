use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use time::Date;
use tracing::{debug, info, warn};

use crate::adapters::{HttpSourceAdapter, RenderedPageAdapter};
use crate::artifacts::ArtifactWriter;
use crate::catalog::{http_spec, StructuredHints};
use crate::config::ResolverConfig;
use crate::data_source::{RateSource, SourceError, SourceErrorKind};
use crate::extract::CandidateExtractor;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::policy::Observation;
use crate::{
    CoreError, PlausibilityBand, RateCandidate, RateQuery, ResolutionPolicy, ResolvedRate,
    SourceId, UtcDateTime, ValidationError,
};

/// Report for one queried source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceAttempt {
    pub source: SourceId,
    pub url: Option<String>,
    pub success: bool,
    pub error: Option<SourceError>,
    pub candidates: Vec<RateCandidate>,
    pub fetched_at: UtcDateTime,
    pub artifact: Option<PathBuf>,
}

/// Outcome of one resolution, found or not.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    #[serde(serialize_with = "crate::domain::serialize_iso_date")]
    pub query_date: Date,
    pub policy: &'static str,
    pub source_chain: Vec<SourceId>,
    pub attempts: Vec<SourceAttempt>,
    pub rate: Option<ResolvedRate>,
    pub latency_ms: u64,
}

impl Resolution {
    pub fn found(&self) -> bool {
        self.rate.is_some()
    }

    pub fn failed_attempts(&self) -> impl Iterator<Item = &SourceAttempt> {
        self.attempts.iter().filter(|attempt| !attempt.success)
    }
}

/// Queries sources in chain order and applies the configured policy.
pub struct RateResolver {
    chain: Vec<Arc<dyn RateSource>>,
    extractor: CandidateExtractor,
    policy: ResolutionPolicy,
    artifacts: ArtifactWriter,
}

impl RateResolver {
    pub fn builder() -> RateResolverBuilder {
        RateResolverBuilder::new()
    }

    /// Production resolver configured from `SBV_RATE_*` variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        RateResolverBuilder::new()
            .with_config(ResolverConfig::from_env()?)
            .build()
    }

    pub fn source_chain(&self) -> Vec<SourceId> {
        self.chain.iter().map(|source| source.id()).collect()
    }

    pub const fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    /// Resolves the rate for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingDependency`] before any fetch when a source
    /// in the chain lacks local tooling. Source failures never surface here;
    /// they are recorded in [`Resolution::attempts`].
    pub async fn resolve(&self, query: &RateQuery) -> Result<Resolution, CoreError> {
        self.ensure_sources_available()?;

        let started = Instant::now();
        let mut attempts = Vec::with_capacity(self.chain.len());
        let mut observed: Vec<Observation> = Vec::with_capacity(self.chain.len());
        let default_hints = StructuredHints::default();

        for source in &self.chain {
            let id = source.id();
            let result = source.fetch(query).await;

            let artifact = match (&result.payload, query.debug()) {
                (Some(payload), true) => self.artifacts.write(id, payload).await,
                _ => None,
            };

            let candidates = match &result.payload {
                Some(payload) => {
                    let hints = source.hints().unwrap_or(&default_hints);
                    self.extractor.extract(id, payload, query, hints)
                }
                None => Vec::new(),
            };

            if let Some(error) = &result.error {
                warn!(source = %id, code = error.code(), %error, "source failed");
            } else {
                debug!(source = %id, candidates = candidates.len(), "source processed");
            }

            let decisive = self.policy.is_decisive(id, &candidates);
            observed.push((id, candidates.clone()));
            attempts.push(SourceAttempt {
                source: id,
                url: result.url,
                success: result.payload.is_some() && result.error.is_none(),
                error: result.error,
                candidates,
                fetched_at: result.fetched_at,
                artifact,
            });

            if decisive {
                debug!(source = %id, policy = self.policy.name(), "decisive source hit, stopping");
                break;
            }
        }

        let rate = self.policy.resolve(&observed, query.target_date());
        match &rate {
            Some(rate) => info!(
                date = %query,
                value = %rate.value,
                origin = %rate.origin.label(),
                "resolved USD/VND rate"
            ),
            None => warn!(date = %query, attempts = attempts.len(), "no plausible USD/VND rate found"),
        }

        Ok(Resolution {
            query_date: query.target_date(),
            policy: self.policy.name(),
            source_chain: attempts.iter().map(|attempt| attempt.source).collect(),
            attempts,
            rate,
            latency_ms: elapsed_ms(started),
        })
    }

    fn ensure_sources_available(&self) -> Result<(), CoreError> {
        for source in &self.chain {
            if let Err(error) = source.ensure_available() {
                if error.kind() == SourceErrorKind::MissingDependency {
                    return Err(CoreError::missing_dependency(source.id().as_str(), error.message()));
                }
                warn!(source = %source.id(), %error, "source reported unavailable");
            }
        }
        Ok(())
    }
}

/// Builds a [`RateResolver`] from a [`ResolverConfig`], wiring built-in
/// adapters to a shared HTTP client.
///
/// ```rust,ignore
/// use sbv_rate_core::{RateResolver, ResolutionPolicy};
///
/// let resolver = RateResolver::builder()
///     .with_policy(ResolutionPolicy::Median)
///     .with_render(true)
///     .build()?;
/// ```
#[derive(Default)]
pub struct RateResolverBuilder {
    config: ResolverConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    custom_sources: HashMap<SourceId, Arc<dyn RateSource>>,
}

impl RateResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn with_band(mut self, band: PlausibilityBand) -> Self {
        self.config.band = band;
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceId>) -> Self {
        self.config.sources = Some(sources);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_render(mut self, render: bool) -> Self {
        self.config.render = render;
        self
    }

    pub fn with_browser(mut self, browser: impl Into<PathBuf>) -> Self {
        self.config.browser = Some(browser.into());
        self
    }

    pub fn with_dump_dir(mut self, dump_dir: impl Into<PathBuf>) -> Self {
        self.config.dump_dir = dump_dir.into();
        self
    }

    /// Replaces the built-in adapter for `source.id()`.
    pub fn with_source(mut self, source: Arc<dyn RateSource>) -> Self {
        self.custom_sources.insert(source.id(), source);
        self
    }

    pub fn build(self) -> Result<RateResolver, ValidationError> {
        self.config.validate()?;

        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let order = self.config.policy.chain_order(&self.config.selected_sources());
        if order.is_empty() {
            return Err(ValidationError::EmptySourceList);
        }

        let chain = order
            .into_iter()
            .map(|id| {
                self.custom_sources
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| builtin_source(id, &self.config, &http_client))
            })
            .collect();

        Ok(RateResolver {
            chain,
            extractor: CandidateExtractor::new(self.config.band),
            policy: self.config.policy,
            artifacts: ArtifactWriter::new(self.config.dump_dir),
        })
    }
}

fn builtin_source(
    id: SourceId,
    config: &ResolverConfig,
    http_client: &Arc<dyn HttpClient>,
) -> Arc<dyn RateSource> {
    match http_spec(id) {
        Some(spec) => {
            let spec = match config.timeout_ms {
                Some(timeout_ms) => spec.with_timeout_ms(timeout_ms),
                None => spec,
            };
            Arc::new(HttpSourceAdapter::with_http_client(spec, Arc::clone(http_client)))
        }
        None => {
            let adapter = RenderedPageAdapter::new(config.browser.as_deref());
            match config.timeout_ms {
                Some(timeout_ms) => Arc::new(adapter.with_timeout_ms(timeout_ms)),
                None => Arc::new(adapter),
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    let elapsed = started.elapsed().as_millis();
    if elapsed > u128::from(u64::MAX) {
        u64::MAX
    } else {
        elapsed as u64
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::http_client::FixtureHttpClient;

    const VCB_URL: &str = "https://portal.vietcombank.com.vn/Usercontrols/TVPortal.TyGia/pXML.aspx";
    const BIDV_URL: &str = "https://www.bidv.com.vn/ServicesBIDV/ExchangeRatesBIDVAPI";

    fn query() -> RateQuery {
        RateQuery::parse("2023-09-01", false).expect("valid date")
    }

    #[tokio::test]
    async fn failing_sources_are_recorded_not_raised() {
        let client = FixtureHttpClient::new();
        let resolver = RateResolver::builder()
            .with_http_client(Arc::new(client.clone()))
            .build()
            .expect("valid config");

        let resolution = resolver.resolve(&query()).await.expect("no hard error");

        assert!(!resolution.found());
        assert_eq!(resolution.attempts.len(), resolver.source_chain().len());
        assert_eq!(resolution.failed_attempts().count(), resolution.attempts.len());
    }

    #[tokio::test]
    async fn bank_sources_are_averaged_when_sbv_is_silent() {
        let client = FixtureHttpClient::new()
            .with_body(
                VCB_URL,
                r#"<ExrateList><Exrate CurrencyCode="USD" Transfer="23,977.00" /></ExrateList>"#,
            )
            .with_body(BIDV_URL, r#"[{"currency": "USD", "sell": "24,011"}]"#);
        let resolver = RateResolver::builder()
            .with_http_client(Arc::new(client))
            .with_sources(vec![SourceId::SbvEnglish, SourceId::Vietcombank, SourceId::Bidv])
            .build()
            .expect("valid config");

        let resolution = resolver.resolve(&query()).await.expect("resolved");
        let rate = resolution.rate.expect("rate found");
        assert_eq!(rate.value, dec!(23994));
        assert_eq!(rate.origin.label(), "averaged");
    }

    #[test]
    fn rejects_empty_source_selection() {
        let result = RateResolver::builder().with_sources(Vec::new()).build();
        assert!(matches!(result, Err(ValidationError::EmptySourceList)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = RateResolver::builder().with_timeout_ms(0).build();
        assert!(matches!(result, Err(ValidationError::ZeroTimeout)));
    }
}
