use std::time::Duration;

use gridwatch_core::Cell;
use gridwatch_engine::{FailureKind, FetchSettings, RefreshEngine, ResultFetcher, ScrapingFetcher};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESULTS_PAGE: &str = r#"<html><body><ul class="rows">
  <li class="result-row"><a class="result-title hdrlnk" href="/bik/d/trek/1.html">Trek</a></li>
  <li class="result-row"><a class="result-title hdrlnk" href="/bik/d/giant/2.html">Giant</a></li>
</ul></body></html>"#;

fn fetcher(settings: FetchSettings) -> ScrapingFetcher {
    ScrapingFetcher::new(settings).expect("client builds")
}

#[tokio::test]
async fn fetcher_scrapes_listing_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/sss"))
        .and(query_param("query", "bike"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(RESULTS_PAGE, "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/search/sss?query=bike", server.uri());
    let results = fetcher(FetchSettings::default())
        .fetch_results(&url)
        .await
        .expect("fetch ok");

    let ids: Vec<_> = results.iter().map(|r| r.identifier.clone()).collect();
    assert_eq!(
        ids,
        vec![
            format!("{}/bik/d/trek/1.html", server.uri()),
            format!("{}/bik/d/giant/2.html", server.uri()),
        ]
    );
    assert_eq!(results[0].title, "Trek");
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let err = fetcher(FetchSettings::default())
        .fetch_results(&url)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw(RESULTS_PAGE, "text/html"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let url = format!("{}/slow", server.uri());
    let err = fetcher(settings).fetch_results(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .insert_header("Content-Length", "11")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let url = format!("{}/large", server.uri());
    let err = fetcher(settings).fetch_results(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn fetcher_rejects_non_html_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let url = format!("{}/feed", server.uri());
    let err = fetcher(FetchSettings::default())
        .fetch_results(&url)
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "application/json".to_string()
        }
    );
}

#[tokio::test]
async fn page_without_results_markup_degrades_the_cell() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blocked"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>Access denied</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let engine = RefreshEngine::new(fetcher(FetchSettings::default()));
    let mut cell = Cell::with_url(format!("{}/blocked", server.uri()));

    let outcome = engine.refresh_cell(&mut cell).await;

    assert!(outcome.is_degraded());
    assert_eq!(cell.hits(), None);
}

#[tokio::test]
async fn malformed_url_is_invalid() {
    let err = fetcher(FetchSettings::default())
        .fetch_results("not a url")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
