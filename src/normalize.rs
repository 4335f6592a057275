//! Turning user input into absolute URLs

/// Whether `url` starts with a scheme (`[A-Za-z][A-Za-z0-9.+-]+:`).
pub fn url_is_absolute(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    let rest = chars.as_str();
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'))
}

/// Normalize a path-derived URL and an optional query string.
///
/// Returns `None` for empty input. Relative input defaults to `http://`
/// rather than being treated as a local filename.
pub fn normalize_url(url: &str, query_string: Option<&str>) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    let mut url = url.to_string();
    if let Some(qs) = query_string.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(qs);
    }
    if !url_is_absolute(&url) {
        url.insert_str(0, "http://");
    }
    Some(url)
}

/// Whether `url` uses a scheme the navigator fetches on behalf of clients.
///
/// Only `http` and `https` qualify; `file:` and the rest are left to local
/// callers.
pub fn is_web_url(url: &str) -> bool {
    url.split_once(':')
        .map(|(scheme, _)| scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

/// First `url` parameter of a form-encoded query string.
pub fn url_param(query_string: &str) -> Option<String> {
    url::form_urlencoded::parse(query_string.as_bytes())
        .find(|(k, _)| k == "url")
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_no_url() {
        assert_eq!(normalize_url("", None), None);
        assert_eq!(normalize_url("", Some("a=1")), None);
    }

    #[test]
    fn relative_defaults_to_http() {
        assert_eq!(normalize_url("example.com", None).as_deref(), Some("http://example.com"));
        assert_eq!(normalize_url("example.com/a/b", Some("")).as_deref(), Some("http://example.com/a/b"));
    }

    #[test]
    fn query_string_is_appended() {
        assert_eq!(normalize_url("http://x.com", Some("a=1")).as_deref(), Some("http://x.com?a=1"));
        assert_eq!(normalize_url("x.com/s", Some("q=rust&p=2")).as_deref(), Some("http://x.com/s?q=rust&p=2"));
    }

    #[test]
    fn absolute_urls_keep_their_scheme() {
        assert_eq!(normalize_url("https://y.com", None).as_deref(), Some("https://y.com"));
        assert_eq!(normalize_url("file:///tmp/a.html", None).as_deref(), Some("file:///tmp/a.html"));
    }

    #[test]
    fn scheme_detection() {
        assert!(url_is_absolute("http://a"));
        assert!(url_is_absolute("svn+ssh://a"));
        assert!(!url_is_absolute("a"));
        assert!(!url_is_absolute("1http://a"));
        assert!(!url_is_absolute("/path:with/colon"));
        assert!(!url_is_absolute("x:"));
    }

    #[test]
    fn url_param_is_decoded() {
        assert_eq!(url_param("url=example.com%2Fa%3Fb%3D1").as_deref(), Some("example.com/a?b=1"));
        assert_eq!(url_param("other=1&url=a.org").as_deref(), Some("a.org"));
        assert_eq!(url_param(""), None);
    }

    #[test]
    fn only_http_and_https_are_web_urls() {
        assert!(is_web_url("http://a.example/"));
        assert!(is_web_url("HTTPS://a.example/"));
        assert!(!is_web_url("file:///etc/passwd"));
        assert!(!is_web_url("ftp://a.example/"));
        assert!(!is_web_url("a.example"));
    }
}
