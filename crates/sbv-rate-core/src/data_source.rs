use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::catalog::StructuredHints;
use crate::{RateQuery, SourceId, UtcDateTime};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    Unavailable,
    Timeout,
    UnexpectedStatus,
    Parse,
    MissingDependency,
}

/// Structured source error, recorded per attempt and never propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Timeout, message)
    }

    pub fn unexpected_status(status: u16, url: &str) -> Self {
        Self::new(
            SourceErrorKind::UnexpectedStatus,
            format!("HTTP {status} from '{url}'"),
        )
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Parse, message)
    }

    pub fn missing_dependency(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::MissingDependency, message)
    }

    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::UnexpectedStatus => "source.unexpected_status",
            SourceErrorKind::Parse => "source.parse",
            SourceErrorKind::MissingDependency => "source.missing_dependency",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl Serialize for SourceError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("SourceError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

/// Raw body returned by a source, before extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// HTML page or plain text.
    Text(String),
    Json(serde_json::Value),
    /// Undecoded XML document.
    Xml(String),
}

impl Payload {
    /// Debug artifact extension for this payload.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text(body) if looks_like_html(body) => "html",
            Self::Text(_) => "txt",
            Self::Json(_) => "json",
            Self::Xml(_) => "xml",
        }
    }

    /// Payload rendered back to text, for artifacts.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(body) | Self::Xml(body) => body.clone(),
            Self::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// Cheap markup sniff used to pick HTML passes over plain-text passes.
pub(crate) fn looks_like_html(body: &str) -> bool {
    const MARKERS: [&str; 8] = [
        "<!doctype html",
        "<html",
        "<body",
        "<table",
        "<tr",
        "<div",
        "<span",
        "<script",
    ];
    let lowered = body.to_lowercase();
    MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Outcome of one adapter call.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceResult {
    pub source_id: SourceId,
    /// URL that produced the payload, or the last URL tried on failure.
    pub url: Option<String>,
    pub payload: Option<Payload>,
    pub fetched_at: UtcDateTime,
    pub error: Option<SourceError>,
}

impl SourceResult {
    pub fn fetched(source_id: SourceId, url: impl Into<String>, payload: Payload) -> Self {
        Self {
            source_id,
            url: Some(url.into()),
            payload: Some(payload),
            fetched_at: UtcDateTime::now(),
            error: None,
        }
    }

    pub fn failed(source_id: SourceId, url: Option<String>, error: SourceError) -> Self {
        Self {
            source_id,
            url,
            payload: None,
            fetched_at: UtcDateTime::now(),
            error: Some(error),
        }
    }

    pub fn success(&self) -> bool {
        self.payload.is_some() && self.error.is_none()
    }
}

pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = SourceResult> + Send + 'a>>;

/// Source adapter contract.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`id`](RateSource::id) | Source identifier |
/// | [`ensure_available`](RateSource::ensure_available) | Local prerequisites check, run before any fetch |
/// | [`hints`](RateSource::hints) | Structured extraction hints for the payload |
/// | [`fetch`](RateSource::fetch) | One fetch for the query |
///
/// `fetch` never fails: transport errors, timeouts and bad statuses are
/// folded into [`SourceResult::error`].
pub trait RateSource: Send + Sync {
    fn id(&self) -> SourceId;

    /// Reports missing local tooling (e.g. a browser binary).
    fn ensure_available(&self) -> Result<(), SourceError> {
        Ok(())
    }

    fn hints(&self) -> Option<&StructuredHints> {
        None
    }

    fn fetch<'a>(&'a self, query: &'a RateQuery) -> SourceFuture<'a>;
}
