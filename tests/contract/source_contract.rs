use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use rust_decimal_macros::dec;
use sbv_rate_core::{
    default_http_specs, CandidateExtractor, FixtureHttpClient, HttpSourceAdapter, PayloadFormat,
    RateQuery, RateSource, RenderedPageAdapter, SourceErrorKind, SourceId, SourceSpec,
    SourceTier,
};

const HTML_BODY: &str = "<html><body><p>1 USD = 23,977 VND</p></body></html>";
const JSON_BODY: &str = r#"{
  "rates": {"VND": 23977},
  "data": [{"currency": "USD", "transfer_rate": "23,977", "transfer": "23,977", "sell": "23,977"}]
}"#;
const XML_BODY: &str = r#"<ExrateList><Exrate CurrencyCode="USD" Transfer="23,977.00" /></ExrateList>"#;

struct SourceCase {
    spec: SourceSpec,
    source: Arc<dyn RateSource>,
    client: FixtureHttpClient,
}

fn query() -> RateQuery {
    RateQuery::parse("2023-09-01", false).expect("valid date")
}

fn body_for(format: PayloadFormat) -> &'static str {
    match format {
        PayloadFormat::Html => HTML_BODY,
        PayloadFormat::Xml => XML_BODY,
        PayloadFormat::Json | PayloadFormat::Auto => JSON_BODY,
    }
}

/// Every catalog HTTP source, wired to a fixture serving a USD quote on each URL.
fn answering_cases() -> Vec<SourceCase> {
    default_http_specs()
        .into_iter()
        .map(|spec| {
            let client = spec
                .urls_for(&query())
                .into_iter()
                .fold(FixtureHttpClient::new(), |client, url| {
                    client.with_body(url, body_for(spec.format))
                });
            let source: Arc<dyn RateSource> = Arc::new(HttpSourceAdapter::with_http_client(
                spec.clone(),
                Arc::new(client.clone()),
            ));
            SourceCase {
                spec,
                source,
                client,
            }
        })
        .collect()
}

#[test]
fn catalog_covers_every_source_except_the_rendered_page() {
    let ids = default_http_specs()
        .iter()
        .map(|spec| spec.id)
        .collect::<Vec<_>>();

    for id in SourceId::ALL {
        assert_eq!(
            ids.contains(&id),
            id != SourceId::SbvRendered,
            "source '{id}': catalog membership"
        );
    }
}

#[test]
fn every_http_source_yields_the_quoted_rate() {
    let extractor = CandidateExtractor::default();

    for case in answering_cases() {
        let id = case.spec.id;
        assert_eq!(case.source.id(), id, "source '{id}': id");
        assert!(case.source.ensure_available().is_ok(), "source '{id}': available");

        let result = block_on(case.source.fetch(&query()));
        assert!(result.success(), "source '{id}': fetch failed: {:?}", result.error);
        assert_eq!(result.source_id, id, "source '{id}': result id");
        assert_eq!(
            case.client.requested_urls().len(),
            1,
            "source '{id}': first URL should answer"
        );

        let payload = result.payload.expect("payload present");
        let hints = case.source.hints().expect("http sources carry hints");
        let candidates = extractor.extract(id, &payload, &query(), hints);
        assert_eq!(
            candidates.first().map(|candidate| candidate.vnd_per_usd()),
            Some(dec!(23977)),
            "source '{id}': first candidate"
        );
    }
}

#[test]
fn every_http_source_fails_softly_when_unreachable() {
    for spec in default_http_specs() {
        let id = spec.id;
        let urls = spec.urls_for(&query());
        let client = FixtureHttpClient::new();
        let source = HttpSourceAdapter::with_http_client(spec, Arc::new(client.clone()));

        let result = block_on(source.fetch(&query()));

        assert!(!result.success(), "source '{id}': should fail");
        assert!(result.payload.is_none(), "source '{id}': no payload");
        assert_eq!(
            result.error.as_ref().map(|error| error.kind()),
            Some(SourceErrorKind::Unavailable),
            "source '{id}': error kind"
        );
        assert_eq!(result.url.as_ref(), urls.last(), "source '{id}': last URL reported");
        assert_eq!(client.requested_urls(), urls, "source '{id}': every URL tried in order");
    }
}

#[test]
fn rendered_source_without_browser_reports_missing_dependency() {
    let source = RenderedPageAdapter::with_browser("https://dttktt.sbv.gov.vn/", None);

    assert_eq!(source.id(), SourceId::SbvRendered);
    assert_eq!(source.id().tier(), SourceTier::Official);
    let error = source.ensure_available().expect_err("no browser");
    assert_eq!(error.kind(), SourceErrorKind::MissingDependency);
    assert_eq!(error.code(), "source.missing_dependency");

    let result = block_on(source.fetch(&query()));
    assert!(!result.success());
    assert_eq!(
        result.error.map(|error| error.kind()),
        Some(SourceErrorKind::MissingDependency)
    );
}

fn block_on<F>(future: F) -> F::Output
where
    F: Future,
{
    let waker = noop_waker();
    let mut context = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(output) => return output,
            Poll::Pending => std::thread::yield_now(),
        }
    }
}

fn noop_waker() -> Waker {
    // SAFETY: The vtable functions never dereference the data pointer and are no-op operations.
    unsafe { Waker::from_raw(noop_raw_waker()) }
}

fn noop_raw_waker() -> RawWaker {
    RawWaker::new(std::ptr::null(), &NOOP_RAW_WAKER_VTABLE)
}

unsafe fn noop_raw_waker_clone(_: *const ()) -> RawWaker {
    noop_raw_waker()
}

unsafe fn noop_raw_waker_wake(_: *const ()) {}

unsafe fn noop_raw_waker_wake_by_ref(_: *const ()) {}

unsafe fn noop_raw_waker_drop(_: *const ()) {}

static NOOP_RAW_WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(
    noop_raw_waker_clone,
    noop_raw_waker_wake,
    noop_raw_waker_wake_by_ref,
    noop_raw_waker_drop,
);
