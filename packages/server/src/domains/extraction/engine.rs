//! Selector evaluation over rendered careers pages.
//!
//! Rendering is async and leases a session; evaluation is a plain function
//! over the HTML string so the parsed document never crosses an await.

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::types::{ExtractedJob, ExtractionResult, SNIPPET_MAX_CHARS};
use crate::domains::selectors::SelectorConfig;
use crate::kernel::{BaseRenderer, NavigateOptions};

pub struct ExtractionEngine {
    renderer: Arc<dyn BaseRenderer>,
    options: NavigateOptions,
}

impl ExtractionEngine {
    pub fn new(renderer: Arc<dyn BaseRenderer>, options: NavigateOptions) -> Self {
        Self { renderer, options }
    }

    /// Render `target_url` and extract postings with `selectors`.
    ///
    /// An empty result is a valid outcome. Errors mean the page could not be
    /// rendered at all. The session is closed before returning on every path.
    pub async fn extract(
        &self,
        target_url: &Url,
        selectors: &SelectorConfig,
    ) -> Result<ExtractionResult> {
        let mut session = self
            .renderer
            .open_session()
            .await
            .context("Failed to lease rendering session")?;

        let rendered = session.navigate(target_url.as_str(), &self.options).await;
        session.close().await;

        let page = rendered.with_context(|| format!("Failed to render {}", target_url))?;
        let jobs = extract_jobs(&page.html, &page.url, selectors);

        info!(url = %page.url, jobs = jobs.len(), "Extraction finished");

        Ok(ExtractionResult {
            jobs,
            html: page.html,
            page_url: page.url,
        })
    }
}

struct CompiledSelectors {
    container: Selector,
    title: Selector,
    link: Selector,
    location: Option<Selector>,
    description: Option<Selector>,
}

impl CompiledSelectors {
    fn compile(config: &SelectorConfig) -> Option<Self> {
        let parse = |locator: &str| match Selector::parse(locator) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!(locator = %locator, error = %e, "Selector does not compile");
                None
            }
        };
        let optional = |locator: &Option<String>| -> Option<Option<Selector>> {
            match locator.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
                Some(l) => parse(l).map(Some),
                None => Some(None),
            }
        };

        Some(Self {
            container: parse(config.job_container.as_str())?,
            title: parse(config.title.as_str())?,
            link: parse(config.link.as_str())?,
            location: optional(&config.location)?,
            description: optional(&config.description)?,
        })
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub(crate) fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<String>())
}

fn first_text(container: ElementRef<'_>, selector: &Selector) -> Option<String> {
    container
        .select(selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}

/// `<base href>` resolved against the page URL, else the page URL itself.
fn base_url(document: &Html, page_url: &str) -> Option<Url> {
    let page = Url::parse(page_url).ok();
    let base_href = Selector::parse("base[href]").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string)
    });

    match (base_href, page) {
        (Some(href), Some(page)) => page.join(&href).ok().or(Some(page)),
        (Some(href), None) => Url::parse(&href).ok(),
        (None, page) => page,
    }
}

fn resolve_link(href: &str, base: Option<&Url>) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Link element for a container: the first matching descendant, or the
/// container itself when it is the link.
fn link_element<'a>(container: ElementRef<'a>, link: &Selector) -> Option<ElementRef<'a>> {
    container
        .select(link)
        .next()
        .or_else(|| link.matches(&container).then_some(container))
}

/// Evaluate `selectors` against `html`. Returns candidates in document order.
pub fn extract_jobs(html: &str, page_url: &str, selectors: &SelectorConfig) -> Vec<ExtractedJob> {
    let Some(compiled) = CompiledSelectors::compile(selectors) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let base = base_url(&document, page_url);

    let mut jobs = Vec::new();
    for container in document.select(&compiled.container) {
        let anchor = link_element(container, &compiled.link);
        let url = anchor
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve_link(href, base.as_ref()))
            .unwrap_or_default();

        let title = first_text(container, &compiled.title)
            .or_else(|| anchor.map(element_text).filter(|t| !t.is_empty()))
            .unwrap_or_default();

        if title.is_empty() && url.is_empty() {
            debug!("Discarding container with neither title nor link");
            continue;
        }

        let location = compiled
            .location
            .as_ref()
            .and_then(|sel| first_text(container, sel));
        let snippet = compiled
            .description
            .as_ref()
            .and_then(|sel| first_text(container, sel))
            .map(|text| truncate_chars(text, SNIPPET_MAX_CHARS));

        jobs.push(ExtractedJob {
            title,
            url,
            location,
            snippet,
        });
    }

    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockRenderer;
    use std::time::Duration;

    const PAGE: &str = "https://acme.test/careers";

    fn listing(cards: &str) -> String {
        format!("<html><head><title>Careers</title></head><body><ul>{cards}</ul></body></html>")
    }

    fn card(title: &str, href: &str) -> String {
        format!(
            r#"<li class="job"><h3>{title}</h3><span class="location"> Remote,
               US </span><a href="{href}">Apply</a><p>Build things.</p></li>"#
        )
    }

    fn options() -> NavigateOptions {
        NavigateOptions::network_idle(Duration::from_secs(5))
    }

    #[test]
    fn extracts_one_record_per_container() {
        let html = listing(&[
            card("Backend Engineer", "/jobs/1"),
            card("Frontend   Engineer", "/jobs/2"),
            card("Data Engineer", "https://boards.example.com/acme/3"),
        ]
        .concat());

        let jobs = extract_jobs(&html, PAGE, &SelectorConfig::builtin_default());

        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].url, "https://acme.test/jobs/1");
        assert_eq!(jobs[1].title, "Frontend Engineer");
        assert_eq!(jobs[1].location.as_deref(), Some("Remote, US"));
        assert_eq!(jobs[2].url, "https://boards.example.com/acme/3");
        assert_eq!(jobs[0].snippet.as_deref(), Some("Build things."));
    }

    #[test]
    fn no_matching_containers_yields_nothing() {
        let html = "<html><body><div class='vacancy'><a href='/x'>X</a></div></body></html>";
        assert!(extract_jobs(html, PAGE, &SelectorConfig::builtin_default()).is_empty());
    }

    #[test]
    fn base_href_wins_over_page_url() {
        let html = format!(
            r#"<html><head><base href="https://jobs.acme.test/board/"></head><body><ul>{}</ul></body></html>"#,
            card("SRE", "sre-42")
        );

        let jobs = extract_jobs(&html, PAGE, &SelectorConfig::builtin_default());

        assert_eq!(jobs[0].url, "https://jobs.acme.test/board/sre-42");
    }

    #[test]
    fn discards_containers_without_title_or_link() {
        let html = listing(
            r#"<li class="job"><span class="location">Berlin</span></li>
               <li class="job"><a href="/jobs/9">Staff Engineer</a></li>"#,
        );

        let jobs = extract_jobs(&html, PAGE, &SelectorConfig::builtin_default());

        assert_eq!(jobs.len(), 1);
        // title falls back to the link text
        assert_eq!(jobs[0].title, "Staff Engineer");
        assert_eq!(jobs[0].url, "https://acme.test/jobs/9");
    }

    #[test]
    fn container_can_be_the_link() {
        let selectors = SelectorConfig {
            job_container: "a.job-card".into(),
            title: ".name".into(),
            link: "a[href]".into(),
            location: None,
            description: None,
        };
        let html = r#"<div><a class="job-card" href="/jobs/7"><span class="name">QA Lead</span></a></div>"#;

        let jobs = extract_jobs(html, PAGE, &selectors);

        assert_eq!(jobs[0].url, "https://acme.test/jobs/7");
        assert_eq!(jobs[0].title, "QA Lead");
    }

    #[test]
    fn non_http_links_are_dropped() {
        let html = listing(&card("Recruiter", "mailto:jobs@acme.test"));
        let jobs = extract_jobs(&html, PAGE, &SelectorConfig::builtin_default());
        assert_eq!(jobs[0].url, "");
        assert_eq!(jobs[0].title, "Recruiter");
    }

    #[test]
    fn snippet_is_capped() {
        let long = "é".repeat(SNIPPET_MAX_CHARS + 20);
        let html = listing(&format!(
            r#"<li class="job"><h2>Writer</h2><a href="/w">x</a><div class="summary">{long}</div></li>"#
        ));

        let jobs = extract_jobs(&html, PAGE, &SelectorConfig::builtin_default());

        assert_eq!(
            jobs[0].snippet.as_ref().unwrap().chars().count(),
            SNIPPET_MAX_CHARS
        );
    }

    #[test]
    fn uncompilable_selectors_yield_nothing() {
        let selectors = SelectorConfig {
            job_container: "li[[".into(),
            ..SelectorConfig::builtin_default()
        };
        let html = listing(&card("Backend Engineer", "/jobs/1"));
        assert!(extract_jobs(&html, PAGE, &selectors).is_empty());
    }

    #[tokio::test]
    async fn session_is_closed_after_success() {
        let html = listing(&card("Backend Engineer", "/jobs/1"));
        let renderer = Arc::new(MockRenderer::new().with_page(PAGE, &html));
        let engine = ExtractionEngine::new(renderer.clone(), options());

        let result = engine
            .extract(&Url::parse(PAGE).unwrap(), &SelectorConfig::builtin_default())
            .await
            .unwrap();

        assert_eq!(result.jobs.len(), 1);
        assert_eq!(result.html, html);
        assert_eq!(renderer.sessions_opened(), 1);
        assert_eq!(renderer.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn session_is_closed_after_render_failure() {
        let renderer = Arc::new(MockRenderer::new().with_failure(PAGE, "navigation timeout"));
        let engine = ExtractionEngine::new(renderer.clone(), options());

        let result = engine
            .extract(&Url::parse(PAGE).unwrap(), &SelectorConfig::builtin_default())
            .await;

        assert!(result.is_err());
        assert_eq!(renderer.sessions_closed(), 1);
    }
}
