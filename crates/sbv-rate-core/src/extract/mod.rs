//! Candidate extraction: payload in, in-band [`RateCandidate`]s out.
//!
//! | Payload | Passes |
//! |---------|--------|
//! | JSON | pointer hint, currency records, USD-named keys |
//! | XML | currency-tagged element attributes |
//! | HTML | date window, table rows, rate elements, scripts, whole text |
//! | Plain text | date window, whole text |
//!
//! Values outside the [`PlausibilityBand`] are dropped here; survivors keep
//! encounter order and are not deduplicated.

mod normalize;
mod structured;
mod text;

use tracing::debug;

pub use normalize::{normalize_token, reinsert_decimal_point, NormalizedNumber};

use crate::catalog::StructuredHints;
use crate::data_source::looks_like_html;
use crate::{Payload, PlausibilityBand, RateCandidate, RateQuery, SourceId};

/// Pure, deterministic extractor bound to one plausibility band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateExtractor {
    band: PlausibilityBand,
}

impl CandidateExtractor {
    pub const fn new(band: PlausibilityBand) -> Self {
        Self { band }
    }

    pub fn extract(
        &self,
        source: SourceId,
        payload: &Payload,
        query: &RateQuery,
        hints: &StructuredHints,
    ) -> Vec<RateCandidate> {
        let numbers = match payload {
            Payload::Json(document) => structured::scan_json(document, hints),
            Payload::Xml(document) => {
                let scan = structured::scan_xml(document, hints);
                if let Some(error) = &scan.error {
                    debug!(
                        source = %source,
                        %error,
                        kept = scan.found.len(),
                        "xml payload scan stopped early"
                    );
                }
                scan.found
            }
            Payload::Text(body) if looks_like_html(body) => text::scan_html(body, &query.vn_date()),
            Payload::Text(body) => text::scan_plain(body, &query.vn_date()),
        };

        let scanned = numbers.len();
        let candidates = numbers
            .into_iter()
            .filter_map(|number| self.band.admit(number.value, number.scale, source))
            .collect::<Vec<_>>();

        debug!(
            source = %source,
            scanned,
            in_band = candidates.len(),
            "extracted rate candidates"
        );
        candidates
    }

    /// Extraction for text, with default hints. Convenience for callers that
    /// only hold a page body.
    pub fn extract_text(&self, source: SourceId, body: &str, query: &RateQuery) -> Vec<RateCandidate> {
        self.extract(
            source,
            &Payload::Text(body.to_owned()),
            query,
            &StructuredHints::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::QuoteScale;

    fn query() -> RateQuery {
        RateQuery::parse("2023-09-01", false).expect("valid date")
    }

    #[test]
    fn out_of_band_numbers_never_become_candidates() {
        let extractor = CandidateExtractor::default();
        let candidates = extractor.extract_text(
            SourceId::SbvEnglish,
            "Ngày 2023: 1 USD = 1,000 VND, 45,000 VND, 19.999 VND",
            &query(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn candidates_keep_encounter_order_without_dedup() {
        let extractor = CandidateExtractor::default();
        let candidates = extractor.extract_text(SourceId::SbvApi, "1 USD = 23,977 VND", &query());

        let values = candidates.iter().map(RateCandidate::value).collect::<Vec<_>>();
        assert_eq!(values.first(), Some(&dec!(23977)));
        assert!(values.len() > 1, "same number found by several patterns");
        assert!(candidates.iter().all(|c| c.source() == SourceId::SbvApi));
    }

    #[test]
    fn thousands_display_is_admitted_in_vnd_terms() {
        let extractor = CandidateExtractor::default();
        let candidates = extractor.extract_text(
            SourceId::SbvVietnamese,
            "<html><body><p>Ngày 01/09/2023</p><p>1 Đô la Mỹ = 23.977 VND</p></body></html>",
            &query(),
        );

        let first = candidates.first().copied().expect("in-band candidate");
        assert_eq!(first.value(), dec!(23.977));
        assert_eq!(first.scale(), QuoteScale::Thousands);
        assert_eq!(first.vnd_per_usd(), dec!(23977));
    }

    #[test]
    fn strict_band_rejects_older_rates() {
        let extractor = CandidateExtractor::new(PlausibilityBand::strict());
        let candidates = extractor.extract_text(SourceId::SbvRendered, "1 USD = 23,977 VND", &query());
        assert!(candidates.is_empty());
    }
}
