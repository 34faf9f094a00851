//! Built-in source catalog.
//!
//! Every HTTP source is described by a [`SourceSpec`]: URL templates, the
//! payload format and hints for structured extraction. One
//! [`HttpSourceAdapter`](crate::adapters::HttpSourceAdapter) serves them all.

use serde::Serialize;

use crate::{RateQuery, SourceId};

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RENDER_TIMEOUT_MS: u64 = 60_000;

pub const SBV_ENGLISH_URL: &str = "https://dttktt.sbv.gov.vn/TyGia/faces/Aiber.jspx";
pub const SBV_VIETNAMESE_URL: &str = "https://dttktt.sbv.gov.vn/TyGia/faces/TyGiaTrungTam.jspx";

/// How a response body is decoded into a [`Payload`](crate::Payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    Html,
    Json,
    Xml,
    /// JSON when the body parses, text otherwise.
    Auto,
}

/// Hints for JSON/XML extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredHints {
    /// Currency code that marks the USD record, e.g. `USD`.
    pub currency: String,
    /// Preferred rate fields in preference order, compared case-insensitively
    /// and without a leading `@`.
    pub rate_fields: Vec<String>,
    /// JSON pointer read before the recursive walk.
    pub json_pointer: Option<String>,
}

impl StructuredHints {
    pub fn usd(rate_fields: &[&str]) -> Self {
        Self {
            currency: String::from("USD"),
            rate_fields: rate_fields.iter().map(|field| (*field).to_owned()).collect(),
            json_pointer: None,
        }
    }

    pub fn with_json_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.json_pointer = Some(pointer.into());
        self
    }
}

impl Default for StructuredHints {
    fn default() -> Self {
        Self::usd(&["transfer", "central", "sell", "buy", "rate"])
    }
}

/// Declarative description of one HTTP source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSpec {
    pub id: SourceId,
    /// Tried in order; `{iso}` and `{vn}` are replaced by the query date.
    pub urls: Vec<String>,
    pub format: PayloadFormat,
    pub hints: StructuredHints,
    pub timeout_ms: u64,
}

impl SourceSpec {
    pub fn new(id: SourceId, urls: &[&str], format: PayloadFormat) -> Self {
        Self {
            id,
            urls: urls.iter().map(|url| (*url).to_owned()).collect(),
            format,
            hints: StructuredHints::default(),
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }

    pub fn with_hints(mut self, hints: StructuredHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Concrete URLs for a query, in try order.
    pub fn urls_for(&self, query: &RateQuery) -> Vec<String> {
        let iso = query.iso_date();
        let vn = query.vn_date();
        self.urls
            .iter()
            .map(|template| template.replace("{iso}", &iso).replace("{vn}", &vn))
            .collect()
    }
}

/// Spec for an HTTP-backed source; `None` for [`SourceId::SbvRendered`],
/// which is served by the browser adapter.
pub fn http_spec(id: SourceId) -> Option<SourceSpec> {
    let spec = match id {
        SourceId::SbvApi => SourceSpec::new(
            id,
            &[
                "https://dttktt.sbv.gov.vn/api/tygia?date={iso}",
                "https://dttktt.sbv.gov.vn/api/exchangerate?date={iso}",
                "https://dttktt.sbv.gov.vn/TyGia/api/data?date={vn}",
            ],
            PayloadFormat::Auto,
        ),
        SourceId::SbvEnglish => SourceSpec::new(id, &[SBV_ENGLISH_URL], PayloadFormat::Html),
        SourceId::SbvVietnamese => {
            SourceSpec::new(id, &[SBV_VIETNAMESE_URL], PayloadFormat::Html)
        }
        SourceId::SbvRendered => return None,
        SourceId::Vietcombank => SourceSpec::new(
            id,
            &["https://portal.vietcombank.com.vn/Usercontrols/TVPortal.TyGia/pXML.aspx"],
            PayloadFormat::Xml,
        )
        .with_hints(StructuredHints::usd(&["Transfer", "Sell", "Buy"])),
        SourceId::Bidv => SourceSpec::new(
            id,
            &["https://www.bidv.com.vn/ServicesBIDV/ExchangeRatesBIDVAPI"],
            PayloadFormat::Json,
        )
        .with_hints(StructuredHints::usd(&["sell", "transfer", "buy"])),
        SourceId::Agribank => SourceSpec::new(
            id,
            &["https://www.agribank.com.vn/vn/json/tygia"],
            PayloadFormat::Json,
        )
        .with_hints(StructuredHints::usd(&["transfer_rate", "transfer", "sell"])),
        SourceId::ExchangerateApi => SourceSpec::new(
            id,
            &["https://api.exchangerate-api.com/v4/latest/USD"],
            PayloadFormat::Json,
        )
        .with_hints(StructuredHints::default().with_json_pointer("/rates/VND")),
    };
    Some(spec)
}

/// Default specs for every HTTP-backed source, in catalog order.
pub fn default_http_specs() -> Vec<SourceSpec> {
    SourceId::ALL.into_iter().filter_map(http_spec).collect()
}
