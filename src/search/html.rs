//! DuckDuckGo HTML provider
//!
//! Scrapes the no-JavaScript results page instead of calling an API, and can
//! optionally fetch the top result pages and strip them to readable text so
//! the search agent has more than a snippet to summarise.

use async_trait::async_trait;
use futures::future::join_all;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{http_client, SearchError, SearchHit, WebSearchProvider};

const DUCKDUCKGO_HTML_BASE: &str = "https://html.duckduckgo.com/html/";

/// Longest page excerpt attached to a hit.
const MAX_PAGE_CHARS: usize = 4_000;

/// Elements whose text never reaches the reader.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

pub struct DuckDuckGoHtmlProvider {
    client: reqwest::Client,
    endpoint: String,
    fetch_pages: usize,
}

impl DuckDuckGoHtmlProvider {
    pub fn new(timeout: Duration) -> Self {
        Self::with_endpoint(timeout, DUCKDUCKGO_HTML_BASE)
    }

    pub fn with_endpoint(timeout: Duration, endpoint: &str) -> Self {
        Self {
            client: http_client(timeout),
            endpoint: endpoint.to_string(),
            fetch_pages: 0,
        }
    }

    /// Fetch and strip the first `count` result pages.
    pub fn with_fetch_pages(mut self, count: usize) -> Self {
        self.fetch_pages = count;
        self
    }

    async fn fetch_page_text(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(url = %url, status = %response.status(), "Page fetch returned an error status");
                return None;
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Page fetch failed");
                return None;
            }
        };

        let body = response.text().await.ok()?;
        let text = html_to_text(&body);
        if text.is_empty() {
            None
        } else {
            Some(truncate_chars(&text, MAX_PAGE_CHARS))
        }
    }
}

#[async_trait]
impl WebSearchProvider for DuckDuckGoHtmlProvider {
    fn name(&self) -> &str {
        "duckduckgo-html"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        info!(query = %query, "Searching DuckDuckGo HTML");

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::RequestFailed(format!("DuckDuckGo HTML returned {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        let mut hits = parse_results_page(&body, max_results);
        if hits.is_empty() {
            return Err(SearchError::NoResults);
        }

        let to_fetch = self.fetch_pages.min(hits.len());
        if to_fetch > 0 {
            let pages = join_all(hits[..to_fetch].iter().map(|hit| self.fetch_page_text(&hit.url))).await;
            for (hit, page) in hits.iter_mut().zip(pages) {
                if let Some(text) = page {
                    hit.snippet = format!("{}\n\nPage excerpt:\n{}", hit.snippet, text);
                }
            }
        }

        debug!(count = hits.len(), fetched = to_fetch, "DuckDuckGo HTML search completed");
        Ok(hits)
    }
}

fn selector(css: &str) -> Selector {
    // Selectors are compile-time constants in this module.
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

/// Parse the results page into hits, skipping ads.
pub fn parse_results_page(html: &str, max_results: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let result_sel = selector("div.result");
    let link_sel = selector("a.result__a");
    let snippet_sel = selector(".result__snippet");

    document
        .select(&result_sel)
        .filter(|result| {
            !result
                .value()
                .classes()
                .any(|class| class == "result--ad")
        })
        .filter_map(|result| {
            let link = result.select(&link_sel).next()?;
            let title = collapse_whitespace(&link.text().collect::<String>());
            let url = resolve_redirect(link.value().attr("href")?);
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(|s| collapse_whitespace(&s.text().collect::<String>()))
                .unwrap_or_default();

            if title.is_empty() || url.is_empty() {
                return None;
            }
            Some(SearchHit { title, url, snippet })
        })
        .take(max_results)
        .collect()
}

/// Result links point at `//duckduckgo.com/l/?uddg=<encoded target>&rut=...`.
pub fn resolve_redirect(href: &str) -> String {
    let target = href
        .split(['?', '&'])
        .find_map(|part| part.strip_prefix("uddg="))
        .and_then(|encoded| urlencoding::decode(encoded).ok())
        .map(|decoded| decoded.into_owned());

    match target {
        Some(url) => url,
        None if href.starts_with("//") => format!("https:{}", href),
        None => href.to_string(),
    }
}

/// Strip a page to readable text: drop scripts, styles and other non-content
/// elements, keep text nodes, collapse whitespace per block.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_sel = selector("body");
    let root = document
        .select(&body_sel)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    collect_text(root, &mut current, &mut lines);
    flush_line(&mut current, &mut lines);
    lines.join("\n")
}

fn collect_text(element: ElementRef<'_>, current: &mut String, lines: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                current.push_str(text);
            }
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                let is_block = matches!(
                    name,
                    "p" | "div" | "br" | "li" | "tr" | "section" | "article" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
                );
                if is_block {
                    flush_line(current, lines);
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, current, lines);
                }
                if is_block {
                    flush_line(current, lines);
                }
            }
            _ => {}
        }
    }
}

fn flush_line(current: &mut String, lines: &mut Vec<String>) {
    let line = collapse_whitespace(current);
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
