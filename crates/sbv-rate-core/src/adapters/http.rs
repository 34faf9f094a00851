use std::sync::Arc;

use tracing::debug;

use crate::catalog::{PayloadFormat, SourceSpec, StructuredHints};
use crate::data_source::{RateSource, SourceError, SourceFuture, SourceResult};
use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::{Payload, RateQuery, SourceId};

/// Fetches one [`SourceSpec`] over HTTP, trying its URLs in order.
///
/// The first 2xx response that decodes wins. Every other outcome is kept as
/// the error of the attempt, and the last one is reported when all URLs fail.
#[derive(Clone)]
pub struct HttpSourceAdapter {
    spec: SourceSpec,
    http_client: Arc<dyn HttpClient>,
}

impl HttpSourceAdapter {
    pub fn with_http_client(spec: SourceSpec, http_client: Arc<dyn HttpClient>) -> Self {
        Self { spec, http_client }
    }

    async fn fetch_urls(&self, query: &RateQuery) -> SourceResult {
        let mut last_url = None;
        let mut last_error = SourceError::unavailable(format!(
            "source '{}' has no URLs configured",
            self.spec.id
        ));

        for url in self.spec.urls_for(query) {
            let request = HttpRequest::browser_get(url.clone()).with_timeout_ms(self.spec.timeout_ms);
            let outcome = self
                .http_client
                .execute(request)
                .await
                .map_err(transport_error)
                .and_then(|response| self.decode(&url, response));

            match outcome {
                Ok(payload) => {
                    debug!(source = %self.spec.id, %url, "source responded");
                    return SourceResult::fetched(self.spec.id, url, payload);
                }
                Err(error) => {
                    debug!(source = %self.spec.id, %url, %error, "source url failed");
                    last_url = Some(url);
                    last_error = error;
                }
            }
        }

        SourceResult::failed(self.spec.id, last_url, last_error)
    }

    fn decode(&self, url: &str, response: HttpResponse) -> Result<Payload, SourceError> {
        if !response.is_success() {
            return Err(SourceError::unexpected_status(response.status, url));
        }

        let content_type = response.content_type.as_deref().map(str::to_ascii_lowercase);
        let body = response.body;
        match self.spec.format {
            PayloadFormat::Html => Ok(Payload::Text(body)),
            PayloadFormat::Json => serde_json::from_str(&body)
                .map(Payload::Json)
                .map_err(|e| SourceError::parse(format!("invalid JSON from '{url}': {e}"))),
            PayloadFormat::Xml => {
                if body.trim_start().starts_with('<') {
                    Ok(Payload::Xml(body))
                } else {
                    Err(SourceError::parse(format!("response from '{url}' is not XML")))
                }
            }
            PayloadFormat::Auto => Ok(sniff(content_type.as_deref(), body)),
        }
    }
}

impl RateSource for HttpSourceAdapter {
    fn id(&self) -> SourceId {
        self.spec.id
    }

    fn hints(&self) -> Option<&StructuredHints> {
        Some(&self.spec.hints)
    }

    fn fetch<'a>(&'a self, query: &'a RateQuery) -> SourceFuture<'a> {
        Box::pin(self.fetch_urls(query))
    }
}

/// Picks a payload kind for `Auto` sources. A declared XML content type
/// wins; otherwise JSON is tried and plain text is the fallback.
fn sniff(content_type: Option<&str>, body: String) -> Payload {
    let declared_xml = content_type
        .is_some_and(|value| value.contains("xml") && !value.contains("html"));
    if declared_xml && body.trim_start().starts_with('<') {
        return Payload::Xml(body);
    }

    serde_json::from_str(&body)
        .map(Payload::Json)
        .unwrap_or(Payload::Text(body))
}

fn transport_error(error: HttpError) -> SourceError {
    if error.timed_out() {
        SourceError::timeout(error.message())
    } else {
        SourceError::unavailable(error.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::http_spec;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::FixtureHttpClient;

    fn query() -> RateQuery {
        RateQuery::parse("2023-09-01", false).expect("valid date")
    }

    fn adapter(id: SourceId, client: &FixtureHttpClient) -> HttpSourceAdapter {
        let spec = http_spec(id).expect("http source");
        HttpSourceAdapter::with_http_client(spec, Arc::new(client.clone()))
    }

    #[tokio::test]
    async fn tries_next_url_until_one_succeeds() {
        let client = FixtureHttpClient::new()
            .with_response(
                "https://dttktt.sbv.gov.vn/api/tygia?date=2023-09-01",
                HttpResponse::with_status(404, "not found"),
            )
            .with_body(
                "https://dttktt.sbv.gov.vn/api/exchangerate?date=2023-09-01",
                r#"{"usd": 23977}"#,
            );

        let result = adapter(SourceId::SbvApi, &client).fetch(&query()).await;

        assert!(result.success());
        assert_eq!(
            result.url.as_deref(),
            Some("https://dttktt.sbv.gov.vn/api/exchangerate?date=2023-09-01")
        );
        assert!(matches!(result.payload, Some(Payload::Json(_))));
        assert_eq!(client.requested_urls().len(), 2);
    }

    #[tokio::test]
    async fn auto_format_falls_back_to_text() {
        let client = FixtureHttpClient::new().with_body(
            "https://dttktt.sbv.gov.vn/api/tygia?date=2023-09-01",
            "1 USD = 23,977 VND",
        );

        let result = adapter(SourceId::SbvApi, &client).fetch(&query()).await;
        assert_eq!(result.payload, Some(Payload::Text(String::from("1 USD = 23,977 VND"))));
    }

    #[tokio::test]
    async fn auto_format_follows_an_xml_content_type() {
        let client = FixtureHttpClient::new().with_response(
            "https://dttktt.sbv.gov.vn/api/tygia?date=2023-09-01",
            HttpResponse::ok(r#"<Rates><Rate Currency="USD" Value="23,977" /></Rates>"#)
                .with_content_type("Application/XML; charset=utf-8"),
        );

        let result = adapter(SourceId::SbvApi, &client).fetch(&query()).await;
        assert!(matches!(result.payload, Some(Payload::Xml(_))));
    }

    #[tokio::test]
    async fn auto_format_keeps_xhtml_pages_as_text() {
        let client = FixtureHttpClient::new().with_response(
            "https://dttktt.sbv.gov.vn/api/tygia?date=2023-09-01",
            HttpResponse::ok("<html><body>1 USD = 23,977 VND</body></html>")
                .with_content_type("application/xhtml+xml"),
        );

        let result = adapter(SourceId::SbvApi, &client).fetch(&query()).await;
        assert!(matches!(result.payload, Some(Payload::Text(_))));
    }

    #[tokio::test]
    async fn reports_last_error_when_every_url_fails() {
        let client = FixtureHttpClient::new().with_error(
            "https://www.bidv.com.vn/ServicesBIDV/ExchangeRatesBIDVAPI",
            HttpError::timeout("request timeout"),
        );

        let result = adapter(SourceId::Bidv, &client).fetch(&query()).await;

        assert!(!result.success());
        assert_eq!(
            result.error.as_ref().map(SourceError::kind),
            Some(SourceErrorKind::Timeout)
        );
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error() {
        let client = FixtureHttpClient::new().with_body(
            "https://www.agribank.com.vn/vn/json/tygia",
            "<html>maintenance</html>",
        );

        let result = adapter(SourceId::Agribank, &client).fetch(&query()).await;
        assert_eq!(result.error.map(|e| e.code()), Some("source.parse"));
    }
}
