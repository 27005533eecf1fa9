//! Shrinks rendered HTML before it goes into a prompt.

use lazy_static::lazy_static;
use regex::Regex;

/// HTML budget per prompt, in characters
pub const MAX_PROMPT_HTML_CHARS: usize = 60_000;

lazy_static! {
    // Elements whose content never helps locate postings
    static ref NOISE_ELEMENTS: Vec<Regex> = ["script", "style", "noscript", "svg"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap())
        .collect();

    static ref COMMENTS: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();

    static ref WHITESPACE_RUNS: Regex = Regex::new(r"\s+").unwrap();
}

/// Drop scripts, styles, `noscript`, inline SVG and comments, collapse
/// whitespace, and cut to `max_chars` on a character boundary.
pub fn condense_html(html: &str, max_chars: usize) -> String {
    let mut condensed = html.to_string();
    for pattern in NOISE_ELEMENTS.iter().chain(std::iter::once(&*COMMENTS)) {
        condensed = pattern.replace_all(&condensed, "").into_owned();
    }
    let condensed = WHITESPACE_RUNS.replace_all(condensed.trim(), " ");

    match condensed.char_indices().nth(max_chars) {
        Some((idx, _)) => condensed[..idx].to_string(),
        None => condensed.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_noise_elements_and_comments() {
        let html = r#"<html><head><script type="text/javascript">var x = "<li>";</script>
            <STYLE>.job { color: red }</STYLE></head>
            <body><!-- tracking --><noscript>enable js</noscript>
            <svg viewBox="0 0 1 1"><path d="M0"/></svg>
            <li class="job">Engineer</li></body></html>"#;

        let condensed = condense_html(html, MAX_PROMPT_HTML_CHARS);

        assert_eq!(
            condensed,
            r#"<html><head> </head> <body> <li class="job">Engineer</li></body></html>"#
        );
    }

    #[test]
    fn truncates_on_char_boundary() {
        let html = format!("<p>{}</p>", "ü".repeat(100));
        let condensed = condense_html(&html, 10);
        assert_eq!(condensed.chars().count(), 10);
        assert!(condensed.starts_with("<p>üüü"));
    }
}
