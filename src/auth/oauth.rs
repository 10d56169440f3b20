//! Return leg of the Google sign-in redirect
//!
//! The backend sends the browser back with `?auth=success` (or
//! `?auth=error&reason=...`). The marker carries no session data; the
//! session itself always comes from the regular restore.

use url::Url;

const MARKER_PARAM: &str = "auth";

/// The page URL with an `auth=success` marker removed
///
/// Returns `None` when there is no marker, meaning the URL can stay as is.
pub fn strip_auth_marker(page: &Url) -> Option<Url> {
    let has_marker = page
        .query_pairs()
        .any(|(key, value)| key == MARKER_PARAM && value == "success");
    if !has_marker {
        return None;
    }

    let kept: Vec<(String, String)> = page
        .query_pairs()
        .filter(|(key, _)| key != MARKER_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut cleaned = page.clone();
    if kept.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(kept);
    }
    Some(cleaned)
}

/// Failure reason reported by an `auth=error` redirect
pub fn auth_error_reason(page: &Url) -> Option<String> {
    let failed = page
        .query_pairs()
        .any(|(key, value)| key == MARKER_PARAM && value == "error");
    if !failed {
        return None;
    }
    let reason = page
        .query_pairs()
        .find(|(key, _)| key == "reason")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| "unknown".to_string());
    Some(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_strips_success_marker() {
        let cleaned = strip_auth_marker(&url("http://localhost:3000/docs/intro?auth=success")).unwrap();
        assert_eq!(cleaned.as_str(), "http://localhost:3000/docs/intro");
    }

    #[test]
    fn test_keeps_other_params_and_fragment() {
        let cleaned =
            strip_auth_marker(&url("http://localhost:3000/docs/intro?auth=success&tab=2#setup"))
                .unwrap();
        assert_eq!(cleaned.as_str(), "http://localhost:3000/docs/intro?tab=2#setup");
    }

    #[test]
    fn test_no_marker_leaves_url_alone() {
        assert!(strip_auth_marker(&url("http://localhost:3000/docs/intro")).is_none());
        assert!(strip_auth_marker(&url("http://localhost:3000/?auth=error&reason=x")).is_none());
    }

    #[test]
    fn test_error_reason() {
        assert_eq!(
            auth_error_reason(&url("http://localhost:3000/?auth=error&reason=invalid_state")),
            Some("invalid_state".to_string())
        );
        assert_eq!(
            auth_error_reason(&url("http://localhost:3000/?auth=error")),
            Some("unknown".to_string())
        );
        assert_eq!(auth_error_reason(&url("http://localhost:3000/?auth=success")), None);
    }
}
