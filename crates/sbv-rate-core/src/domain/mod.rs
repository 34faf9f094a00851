//! Domain types shared by adapters, the extractor and the resolver.

mod query;
mod rate;
mod timestamp;

pub use query::RateQuery;
pub(crate) use rate::serialize_iso_date;
pub use rate::{PlausibilityBand, QuoteScale, RateCandidate, RateOrigin, ResolvedRate};
pub use timestamp::UtcDateTime;
