//! Prompt construction for the inference gateway.

use crate::domains::selectors::SelectorConfig;

const CANONICAL_URL_PROMPT: &str = r#"You are locating the job listings page of a company's careers site.

You are given the URL a page was rendered from and its (condensed) HTML. Decide
which absolute URL is the canonical page that lists the company's open
positions. It may be the page itself, a link on the page (for example
"View all jobs", "Open positions", "Careers"), or an embedded job board.

Rules:
- Answer with an absolute http or https URL.
- Prefer a page that lists many positions over a single posting.
- If nothing on the page points to a listings page, answer null.

Respond with a single JSON object and nothing else:
{"canonicalUrl": "<absolute url>" | null}"#;

const SELECTOR_SUGGESTION_PROMPT: &str = r#"You are repairing CSS selectors for a job-postings scraper.

The scraper finds every element matching `jobContainer`, then evaluates
`title`, `link`, `location` and `description` INSIDE each container:
- jobContainer: one element per job posting (required)
- title: the posting title within the container (required)
- link: an element with an href to the posting, usually an anchor (required)
- location: the posting location within the container (optional)
- description: a short summary within the container (optional)

The current selectors matched zero postings on the page below. Study the
markup and propose selectors that match every posting on it. Use standard CSS
selectors only (no XPath, no :contains, no jQuery extensions). Prefer stable
class names and data attributes over positional selectors."#;

pub fn canonical_url_prompt(page_url: &str, html: &str) -> String {
    format!(
        "{}\n\n## Page URL\n{}\n\n## HTML\n{}",
        CANONICAL_URL_PROMPT, page_url, html
    )
}

pub fn selector_prompt(page_url: &str, html: &str, existing: Option<&SelectorConfig>) -> String {
    let existing = existing
        .and_then(|s| serde_json::to_string_pretty(s).ok())
        .unwrap_or_else(|| "none".to_string());
    let schema = serde_json::to_string(&SelectorConfig::json_schema()).unwrap_or_default();

    format!(
        "{}\n\n## Current selectors\n{}\n\n## Page URL\n{}\n\n## HTML\n{}\n\n\
         Respond with a single JSON object matching this JSON Schema and nothing else:\n{}",
        SELECTOR_SUGGESTION_PROMPT, existing, page_url, html, schema
    )
}
