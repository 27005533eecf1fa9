use url::Url;

/// Absolute http(s) URL with a host, or None.
pub fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    let has_host = url.host_str().is_some_and(|h| !h.is_empty());
    (matches!(url.scheme(), "http" | "https") && has_host).then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_absolute_http_urls() {
        assert!(parse_http_url(" https://acme.test/jobs ").is_some());
        assert!(parse_http_url("http://acme.test").is_some());
        assert!(parse_http_url("/jobs").is_none());
        assert!(parse_http_url("ftp://acme.test/jobs").is_none());
        assert!(parse_http_url("mailto:jobs@acme.test").is_none());
        assert!(parse_http_url("").is_none());
    }
}
