use url::form_urlencoded;
use url::Url;

pub const SEARCH_DOMAIN: &str = "craigslist.org";

const CATEGORY_CODES: &[(&str, &str)] = &[("for sale", "sss"), ("jobs", "jjj")];

/// Listing category of a table. Free-form label; only known labels map to a
/// site section code.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Category(String);

impl Category {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn unset() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unset(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Section code used in the search path. Unset or unknown labels yield
    /// an empty code.
    pub fn code(&self) -> &'static str {
        let label = self.0.trim();
        CATEGORY_CODES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(label))
            .map(|(_, code)| *code)
            .unwrap_or("")
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// Builds the search page URL for one cell.
///
/// `region` is the column heading (site subdomain), `terms` the row heading.
pub fn build_query_url(terms: &str, region: &str, category: &Category) -> String {
    let host_label = region_host_label(region);
    let query: String = form_urlencoded::byte_serialize(terms.trim().as_bytes()).collect();
    let raw = format!(
        "https://{host_label}.{SEARCH_DOMAIN}/search/{}?query={query}",
        category.code()
    );
    // An empty host label cannot parse; keep the raw form so the fetch fails
    // with an invalid-url error instead of silently querying the wrong page.
    match Url::parse(&raw) {
        Ok(url) => url.into(),
        Err(_) => raw,
    }
}

fn region_host_label(region: &str) -> String {
    region
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}
