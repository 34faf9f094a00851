//! # SBV Rate Core
//!
//! Resolves the USD→VND central exchange rate published by the State Bank of
//! Vietnam (SBV) for a calendar date, falling back to commercial bank feeds
//! and an international API when the official pages stay silent.
//!
//! ## Overview
//!
//! - **Source catalog** describing every official, bank and international source
//! - **Source adapters** for plain HTTP fetches and a headless-browser render
//! - **Candidate extraction** from HTML, plain text, JSON and XML payloads
//! - **Resolution policies** (priority walk or median) over in-band candidates
//! - **Debug artifacts** with the raw payload of each source
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | HTTP and rendered-page source adapters |
//! | [`artifacts`] | Debug payload dumps |
//! | [`catalog`] | Built-in source URLs, formats and hints |
//! | [`config`] | Resolver settings and `SBV_RATE_*` variables |
//! | [`data_source`] | Source trait, payloads and source errors |
//! | [`domain`] | Queries, candidates, bands and resolved rates |
//! | [`error`] | Core error types |
//! | [`extract`] | Number normalization and candidate extraction |
//! | [`http_client`] | HTTP client abstraction |
//! | [`policy`] | Priority and median resolution policies |
//! | [`resolver`] | Sequential source chain and resolution report |
//! | [`source`] | Source identifiers and tiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! #[tokio::main]
//! async fn main() -> Result<(), sbv_rate_core::CoreError> {
//!     match sbv_rate_core::get_rate("2023-09-01", false).await? {
//!         Some(rate) => println!("1 USD = {} VND ({})", rate.vnd_per_usd(), rate.origin.label()),
//!         None => println!("no rate found"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod extract;
pub mod http_client;
pub mod policy;
pub mod resolver;
pub mod source;

pub use adapters::{find_browser, HttpSourceAdapter, RenderedPageAdapter};
pub use artifacts::ArtifactWriter;
pub use catalog::{default_http_specs, http_spec, PayloadFormat, SourceSpec, StructuredHints};
pub use config::ResolverConfig;
pub use data_source::{Payload, RateSource, SourceError, SourceErrorKind, SourceFuture, SourceResult};
pub use domain::{
    PlausibilityBand, QuoteScale, RateCandidate, RateOrigin, RateQuery, ResolvedRate, UtcDateTime,
};
pub use error::{CoreError, ValidationError};
pub use extract::CandidateExtractor;
pub use http_client::{
    FixtureHttpClient, HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};
pub use policy::{PriorityPolicy, ResolutionPolicy};
pub use resolver::{RateResolver, RateResolverBuilder, Resolution, SourceAttempt};
pub use source::{SourceId, SourceTier};

/// Resolves the rate for a `YYYY-MM-DD` date with settings from the
/// environment.
///
/// `Ok(None)` means every source was queried and none yielded an in-band
/// candidate. With `debug`, raw payloads are written to the dump directory.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] for a malformed date or invalid
/// `SBV_RATE_*` setting, and [`CoreError::MissingDependency`] when the
/// rendered source is enabled without a browser. Both happen before any
/// network call.
pub async fn get_rate(date: &str, debug: bool) -> Result<Option<ResolvedRate>, CoreError> {
    let query = RateQuery::parse(date, debug)?;
    let resolver = RateResolver::from_env()?;
    Ok(resolver.resolve(&query).await?.rate)
}
