//! Web page text extraction

use crate::error::ChatError;
use crate::Result;
use reqwest::Client;
use scraper::{Html, Node};
use tracing::{info, warn};

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Text fetched for one URL, or why it came back empty
#[derive(Debug, Clone)]
pub struct UrlText {
    pub url: String,
    pub text: String,
    pub error: Option<String>,
}

/// Fetch a page and return its visible text
pub async fn fetch_url_text(client: &Client, url: &str) -> Result<String> {
    let fetch_error = |reason: String| ChatError::UrlFetchError {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP {}", status)));
    }

    let body = response
        .text()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let text = html_to_text(&body);
    info!(url, chars = text.len(), "Fetched page text");
    Ok(text)
}

/// Fetch every URL in order. A failing URL yields empty text and an error
/// entry; the remaining URLs are still fetched.
pub async fn fetch_all(client: &Client, urls: &[String]) -> Vec<UrlText> {
    let mut results = Vec::with_capacity(urls.len());

    for url in urls {
        let result = match fetch_url_text(client, url).await {
            Ok(text) => UrlText {
                url: url.clone(),
                text,
                error: None,
            },
            Err(e) => {
                warn!("Error extracting text from URL: {}", e);
                UrlText {
                    url: url.clone(),
                    text: String::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(result);
    }

    results
}

/// Concatenate all text nodes outside hidden elements, in document order
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Node::Text(fragment) = node.value() else {
            continue;
        };

        let hidden = node
            .ancestors()
            .filter_map(|ancestor| ancestor.value().as_element())
            .any(|element| HIDDEN_ELEMENTS.contains(&element.name()));

        if !hidden {
            text.push_str(fragment);
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Handbook</title><style>p { color: red; }</style></head>
  <body>
    <h1>Staff handbook</h1>
    <p>Leave requests go to <b>HR</b>.</p>
    <script>var tracking = "hidden";</script>
  </body>
</html>"#;

    #[test]
    fn test_html_to_text_skips_scripts_and_styles() {
        let text = html_to_text(PAGE);
        assert!(text.contains("Handbook"));
        assert!(text.contains("Staff handbook"));
        assert!(text.contains("Leave requests go to HR."));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
    }

    #[tokio::test]
    async fn test_failing_url_does_not_block_others() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let urls = vec![
            format!("{}/missing", server.uri()),
            "http://127.0.0.1:1/unreachable".to_string(),
            format!("{}/ok", server.uri()),
        ];
        let results = fetch_all(&Client::new(), &urls).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].text.is_empty());
        assert!(results[0].error.as_deref().unwrap().contains("404"));
        assert!(results[1].text.is_empty());
        assert!(results[1].error.is_some());
        assert!(results[2].error.is_none());
        assert!(results[2].text.contains("Staff handbook"));
    }
}
