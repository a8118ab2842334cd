//! Minimal HTML page that republishes a bookmark's Open Graph metadata.

use bookmarker_core::Bookmark;
use html_escape::{encode_double_quoted_attribute, encode_text};
use url::Url;

/// Renders the preview page for `bookmark`. Every interpolated value is escaped.
pub fn render_preview(bookmark: &Bookmark) -> String {
    let title = bookmark.title.as_deref().unwrap_or_default();
    let site_name = Url::parse(&bookmark.url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned));

    let mut html = String::from("<html>");

    html.push_str(r#"<head prefix="og: http://ogp.me/ns#">"#);
    html.push_str(&format!("<title>{}</title>", encode_text(title)));
    push_og_tag(&mut html, "title", bookmark.title.as_deref());
    push_og_tag(&mut html, "type", bookmark.kind.as_deref());
    push_og_tag(&mut html, "image", bookmark.image_url.as_deref());
    push_og_tag(&mut html, "url", Some(&bookmark.url));
    push_og_tag(&mut html, "description", bookmark.description.as_deref());
    push_og_tag(&mut html, "site_name", site_name.as_deref());
    html.push_str("</head>");

    html.push_str(r#"<body style="font-family: Helvetica, Arial, sans-serif;">"#);
    html.push_str(&format!("<h1>{}</h1>", encode_text(title)));
    if let Some(description) = bookmark.description.as_deref().filter(|d| !d.is_empty()) {
        html.push_str(&format!("<p>{}</p>", encode_text(description)));
    }
    if let Some(image_url) = bookmark.image_url.as_deref() {
        html.push_str(&format!(
            r#"<img src="{}" />"#,
            encode_double_quoted_attribute(image_url)
        ));
    }
    html.push_str("</body></html>");

    html
}

fn push_og_tag(html: &mut String, property: &str, value: Option<&str>) {
    if let Some(value) = value {
        html.push_str(&format!(
            r#"<meta property="og:{property}" content="{}">"#,
            encode_double_quoted_attribute(value)
        ));
    }
}
