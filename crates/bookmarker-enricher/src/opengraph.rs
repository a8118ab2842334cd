use async_trait::async_trait;
use bookmarker_core::{FetchError, MetadataFetcher, PageMetadata};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;
use url::Url;

static META_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("meta tag regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute regex")
});

static TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("title regex"));

const OG_TITLE: &str = "og:title";
const OG_DESCRIPTION: &str = "og:description";
const OG_IMAGE: &str = "og:image";
const OG_IMAGE_URL: &str = "og:image:url";
const OG_TYPE: &str = "og:type";

#[derive(Debug, Clone, TypedBuilder)]
pub struct FetcherSettings {
    /// Upper bound for the whole request, body included.
    #[builder(default = Duration::from_secs(10))]
    pub timeout: Duration,
    #[builder(default = concat!("bookmarker/", env!("CARGO_PKG_VERSION")).to_string())]
    pub user_agent: String,
    /// Bytes of the page read before parsing; the rest is never downloaded.
    #[builder(default = 1024 * 1024)]
    pub max_body_bytes: usize,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Fetches a page over HTTP and reads its Open Graph tags.
///
/// Falls back to `<title>` and `<meta name="description">` when the page does
/// not publish `og:title` or `og:description`.
#[derive(Debug, Clone)]
pub struct OpenGraphFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl OpenGraphFetcher {
    pub fn new(settings: FetcherSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent)
            .build()
            .map_err(|e| FetchError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_body_bytes: settings.max_body_bytes,
        })
    }

    /// Wraps an already configured client, keeping the default body limit.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            max_body_bytes: FetcherSettings::default().max_body_bytes,
        }
    }
}

fn map_reqwest_error(url: &Url, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(url.to_string())
    } else {
        FetchError::Request(format!("{url}: {err}"))
    }
}

/// Reads at most `limit` bytes of the body, decoding it as lossy UTF-8.
async fn read_capped(
    mut response: Response,
    url: &Url,
    limit: usize,
) -> Result<String, FetchError> {
    let mut body = Vec::new();
    while body.len() < limit {
        let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_reqwest_error(url, e))?
        else {
            break;
        };
        let take = chunk.len().min(limit - body.len());
        body.extend_from_slice(&chunk[..take]);
    }

    if body.len() >= limit {
        debug!(url = %url, limit, "page body truncated");
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

#[async_trait]
impl MetadataFetcher for OpenGraphFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageMetadata, FetchError> {
        trace!(url = %url, "fetching page metadata");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default();
            if !is_html(content_type) {
                return Err(FetchError::UnsupportedContent(content_type.to_string()));
            }
        }

        // Relative image links resolve against the final URL after redirects.
        let page_url = response.url().clone();
        let body = read_capped(response, url, self.max_body_bytes).await?;

        let metadata = parse_metadata(&body, &page_url);
        if metadata.is_empty() {
            return Err(FetchError::MissingMetadata(url.to_string()));
        }

        debug!(
            url = %url,
            has_title = metadata.title.is_some(),
            has_image = metadata.image_url.is_some(),
            "parsed page metadata"
        );
        Ok(metadata)
    }
}

/// Extracts Open Graph metadata from an HTML document.
pub fn parse_metadata(html: &str, page_url: &Url) -> PageMetadata {
    let mut tags: HashMap<String, String> = HashMap::new();
    let mut meta_description = None;

    for tag in META_TAG.find_iter(html) {
        let attrs = attributes(tag.as_str());
        let Some(content) = attrs.get("content").filter(|c| !c.is_empty()) else {
            continue;
        };

        // Some sites publish og tags under `name` instead of `property`.
        let key = attrs
            .get("property")
            .or_else(|| attrs.get("name"))
            .map(|key| key.to_ascii_lowercase());

        match key.as_deref() {
            Some(key @ (OG_TITLE | OG_DESCRIPTION | OG_IMAGE | OG_IMAGE_URL | OG_TYPE)) => {
                tags.entry(key.to_string())
                    .or_insert_with(|| content.clone());
            }
            Some("description") => {
                meta_description.get_or_insert_with(|| content.clone());
            }
            _ => {}
        }
    }

    let title = tags.remove(OG_TITLE).or_else(|| title_tag(html));
    let description = tags.remove(OG_DESCRIPTION).or(meta_description);
    let image_url = tags
        .remove(OG_IMAGE)
        .or_else(|| tags.remove(OG_IMAGE_URL))
        .map(|image| resolve_link(page_url, &image));

    PageMetadata {
        title,
        description,
        image_url,
        kind: tags.remove(OG_TYPE),
    }
}

/// Collects the attributes of a single tag; the first occurrence of a name wins.
fn attributes(tag: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for caps in ATTRIBUTE.captures_iter(tag) {
        let name = caps[1].to_ascii_lowercase();
        let raw = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        attrs
            .entry(name)
            .or_insert_with(|| decode_text(raw));
    }
    attrs
}

fn title_tag(html: &str) -> Option<String> {
    TITLE_TAG
        .captures(html)
        .map(|caps| decode_text(&caps[1]))
        .filter(|title| !title.is_empty())
}

/// Decodes HTML entities and collapses runs of whitespace.
fn decode_text(raw: &str) -> String {
    html_escape::decode_html_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_link(page_url: &Url, link: &str) -> String {
    page_url
        .join(link)
        .map(String::from)
        .unwrap_or_else(|_| link.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page_url() -> Url {
        Url::parse("https://example.com/articles/1").unwrap()
    }

    fn html_page(head: &str) -> String {
        format!("<!doctype html><html><head>{head}</head><body><p>hi</p></body></html>")
    }

    fn fetcher() -> OpenGraphFetcher {
        OpenGraphFetcher::new(FetcherSettings::default()).unwrap()
    }

    #[test]
    fn parses_open_graph_tags_in_either_attribute_order() {
        let html = html_page(
            r#"
            <meta property="og:title" content="Example Title">
            <meta content="An example page" property="og:description" />
            <META PROPERTY='og:type' CONTENT='article'>
            <meta property="og:image" content="https://cdn.example.com/cover.png">
            "#,
        );

        let metadata = parse_metadata(&html, &page_url());

        assert_eq!(metadata.title.as_deref(), Some("Example Title"));
        assert_eq!(metadata.description.as_deref(), Some("An example page"));
        assert_eq!(metadata.kind.as_deref(), Some("article"));
        assert_eq!(
            metadata.image_url.as_deref(),
            Some("https://cdn.example.com/cover.png")
        );
    }

    #[test]
    fn falls_back_to_title_and_description_tags() {
        let html = html_page(
            r#"
            <title>
                Plain   Title
            </title>
            <meta name="description" content="Plain description">
            "#,
        );

        let metadata = parse_metadata(&html, &page_url());

        assert_eq!(metadata.title.as_deref(), Some("Plain Title"));
        assert_eq!(metadata.description.as_deref(), Some("Plain description"));
        assert_eq!(metadata.image_url, None);
        assert_eq!(metadata.kind, None);
    }

    #[test]
    fn open_graph_tags_take_precedence_over_fallbacks() {
        let html = html_page(
            r#"
            <title>Fallback</title>
            <meta name="description" content="Fallback description">
            <meta property="og:title" content="Preferred">
            "#,
        );

        let metadata = parse_metadata(&html, &page_url());

        assert_eq!(metadata.title.as_deref(), Some("Preferred"));
        assert_eq!(metadata.description.as_deref(), Some("Fallback description"));
    }

    #[test]
    fn decodes_entities_and_resolves_relative_images() {
        let html = html_page(
            r#"
            <meta property="og:title" content="Tom &amp; Jerry &#8212; &quot;Live&quot;">
            <meta property="og:image" content="../img/cover.png?w=1&amp;h=2">
            "#,
        );

        let metadata = parse_metadata(&html, &page_url());

        assert_eq!(metadata.title.as_deref(), Some("Tom & Jerry \u{2014} \"Live\""));
        assert_eq!(
            metadata.image_url.as_deref(),
            Some("https://example.com/img/cover.png?w=1&h=2")
        );
    }

    #[test]
    fn empty_or_unrelated_tags_yield_no_metadata() {
        let html = html_page(
            r#"
            <meta charset="utf-8">
            <meta property="og:title" content="">
            <meta name="viewport" content="width=device-width">
            "#,
        );

        assert!(parse_metadata(&html, &page_url()).is_empty());
    }

    #[test]
    fn recognises_html_content_types() {
        assert!(is_html("text/html"));
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("application/xhtml+xml"));
        assert!(!is_html("application/json"));
        assert!(!is_html("image/png"));
    }

    #[tokio::test]
    async fn fetches_metadata_over_http() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", "bookmarker-test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(html_page(
                        r#"<meta property="og:title" content="Mocked">
                           <meta property="og:image" content="/cover.png">"#,
                    ), "text/html; charset=utf-8"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = OpenGraphFetcher::new(
            FetcherSettings::builder()
                .user_agent("bookmarker-test".to_string())
                .build(),
        )
        .unwrap();
        let url = Url::parse(&format!("{}/page", mock_server.uri())).unwrap();

        let metadata = fetcher.fetch(&url).await.unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Mocked"));
        assert_eq!(
            metadata.image_url,
            Some(format!("{}/cover.png", mock_server.uri()))
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/missing", mock_server.uri())).unwrap();
        let result = fetcher().fetch(&url).await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn non_html_content_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(r#"{"title": "not a page"}"#),
            )
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/data.json", mock_server.uri())).unwrap();
        let result = fetcher().fetch(&url).await;

        assert!(matches!(result, Err(FetchError::UnsupportedContent(_))));
    }

    #[tokio::test]
    async fn page_without_metadata_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/bare"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><body>nothing here</body></html>", "text/html"),
            )
            .mount(&mock_server)
            .await;

        let url = Url::parse(&format!("{}/bare", mock_server.uri())).unwrap();
        let result = fetcher().fetch(&url).await;

        assert!(matches!(result, Err(FetchError::MissingMetadata(_))));
    }

    #[tokio::test]
    async fn only_the_first_bytes_of_a_large_page_are_read() {
        let mock_server = MockServer::start().await;
        let head = r#"<html><head><meta property="og:title" content="Early">"#;
        let filler = format!("<!-- {} -->", "x".repeat(4096));
        let late = r#"<meta property="og:description" content="Too far in"></head></html>"#;

        Mock::given(method("GET"))
            .and(path("/huge"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(format!("{head}{filler}{late}"), "text/html"),
            )
            .mount(&mock_server)
            .await;

        let fetcher = OpenGraphFetcher::new(
            FetcherSettings::builder().max_body_bytes(1024).build(),
        )
        .unwrap();
        let url = Url::parse(&format!("{}/huge", mock_server.uri())).unwrap();

        let metadata = fetcher.fetch(&url).await.unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Early"));
        assert_eq!(metadata.description, None);
    }

    #[tokio::test]
    async fn slow_pages_time_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(html_page("<title>Too late</title>"), "text/html")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = OpenGraphFetcher::new(
            FetcherSettings::builder()
                .timeout(Duration::from_millis(100))
                .build(),
        )
        .unwrap();
        let url = Url::parse(&format!("{}/slow", mock_server.uri())).unwrap();

        let result = fetcher.fetch(&url).await;

        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }
}
