use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{FailureKind, FetchError, SearchResult};

/// Elements that only appear on a rendered results page, including one with
/// zero matches.
const RESULTS_CONTAINER: &str = "ul.rows, li.result-row, ol.cl-static-search-results";
/// Listing anchors: the classic `a.result-title` and the static fallback layout.
const RESULT_LINK: &str = "a.result-title, li.cl-static-search-result > a";
const STATIC_TITLE: &str = ".title";

/// Extracts listings from a search results page.
///
/// Identifiers are absolute URLs resolved against `page_url`; repeated
/// anchors for the same listing are reported once, in page order.
pub fn parse_search_results(html: &str, page_url: &str) -> Result<Vec<SearchResult>, FetchError> {
    let container = selector(RESULTS_CONTAINER)?;
    let link = selector(RESULT_LINK)?;
    let static_title = selector(STATIC_TITLE)?;

    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let mut results = Vec::new();
    let mut emitted = HashSet::new();
    let mut saw_link = false;
    for anchor in document.select(&link) {
        saw_link = true;
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(identifier) = resolve_href(href, base.as_ref()) else {
            continue;
        };
        if emitted.insert(identifier.clone()) {
            results.push(SearchResult {
                title: anchor_title(anchor, &static_title),
                identifier,
            });
        }
    }

    if !saw_link && document.select(&container).next().is_none() {
        return Err(FetchError::new(
            FailureKind::NoResultsMarkup,
            format!("no result rows found at {page_url}"),
        ));
    }
    Ok(results)
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css)
        .map_err(|err| FetchError::new(FailureKind::NoResultsMarkup, format!("{css}: {err}")))
}

fn anchor_title(anchor: ElementRef, static_title: &Selector) -> String {
    let text = match anchor.select(static_title).next() {
        Some(title) => title.text().collect::<String>(),
        None => anchor.text().collect::<String>(),
    };
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn resolve_href(href: &str, base: Option<&Url>) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url.into());
    }
    base.and_then(|base| base.join(trimmed).ok()).map(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://sfbay.craigslist.org/search/sss?query=bike";

    #[test]
    fn classic_rows_yield_absolute_identifiers() {
        let html = r#"<html><body><ul class="rows">
            <li class="result-row" data-pid="1">
              <a href="/eby/bik/d/trek/1.html" class="result-title hdrlnk">Trek  road
                bike</a>
            </li>
            <li class="result-row" data-pid="2">
              <a href="https://sfbay.craigslist.org/sfc/bik/d/cannondale/2.html"
                 class="result-title">Cannondale</a>
            </li>
        </ul></body></html>"#;

        let results = parse_search_results(html, PAGE).unwrap();

        assert_eq!(
            results,
            vec![
                SearchResult::new(
                    "Trek road bike",
                    "https://sfbay.craigslist.org/eby/bik/d/trek/1.html"
                ),
                SearchResult::new(
                    "Cannondale",
                    "https://sfbay.craigslist.org/sfc/bik/d/cannondale/2.html"
                ),
            ]
        );
    }

    #[test]
    fn static_layout_reads_title_element() {
        let html = r#"<ol class="cl-static-search-results">
            <li class="cl-static-search-result" title="Desk">
              <a href="https://seattle.craigslist.org/see/fuo/d/desk/9.html">
                <div class="title">Standing desk</div><div class="price">$80</div>
              </a>
            </li></ol>"#;

        let results = parse_search_results(html, PAGE).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Standing desk");
    }

    #[test]
    fn empty_results_page_is_not_an_error() {
        let html = r#"<html><body><ul class="rows"></ul></body></html>"#;
        assert_eq!(parse_search_results(html, PAGE).unwrap(), Vec::new());
    }

    #[test]
    fn page_without_results_markup_is_an_error() {
        let html = "<html><body><p>blocked</p></body></html>";
        let err = parse_search_results(html, PAGE).unwrap_err();
        assert_eq!(err.kind, FailureKind::NoResultsMarkup);
    }

    #[test]
    fn repeated_links_are_reported_once() {
        let html = r#"<ul class="rows">
            <li class="result-row"><a class="result-title" href="/a/1.html">One</a></li>
            <li class="result-row"><a class="result-title" href="/a/1.html">One again</a></li>
        </ul>"#;
        let results = parse_search_results(html, PAGE).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "One");
    }
}
