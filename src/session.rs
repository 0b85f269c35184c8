//! Session URL derivation from the inbound Referer header.
//!
//! Players embed the proxy from a watch page whose path carries the stream
//! identity: `/watch/{source}/{match_id}/{stream_no}`. Those segments are
//! recovered to build the upstream session page URL used for cookie
//! acquisition. Fixed-position extraction is brittle by nature, so this is
//! strictly best-effort: any mismatch yields `None` and the playlist fetch
//! proceeds without cookies.

use url::Url;

/// Derive the upstream session page URL from a client Referer.
pub fn session_url_from_referer(referer: &str, session_page_base: &str) -> Option<String> {
    let parsed = Url::parse(referer).ok()?;
    let mut segments = parsed.path_segments()?;

    if segments.next()? != "watch" {
        return None;
    }

    let source = non_empty(segments.next()?)?;
    let match_id = non_empty(segments.next()?)?;
    let stream_no = non_empty(segments.next()?)?;

    Some(format!(
        "{session_page_base}/{source}/{match_id}/{stream_no}"
    ))
}

fn non_empty(segment: &str) -> Option<&str> {
    if segment.is_empty() { None } else { Some(segment) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://streamed.su/watch";

    #[test]
    fn well_formed_referer_yields_session_url() {
        let url = session_url_from_referer("https://streamed.su/watch/alpha/match42/1", BASE);
        assert_eq!(
            url,
            Some("https://streamed.su/watch/alpha/match42/1".to_string())
        );
    }

    #[test]
    fn referer_from_a_mirror_host_still_parses() {
        // Only the path shape matters, not the referring host
        let url = session_url_from_referer("https://mirror.example/watch/beta/m7/2", BASE);
        assert_eq!(url, Some("https://streamed.su/watch/beta/m7/2".to_string()));
    }

    #[test]
    fn non_watch_path_is_rejected() {
        assert_eq!(session_url_from_referer("https://streamed.su/home", BASE), None);
        assert_eq!(
            session_url_from_referer("https://streamed.su/embed/alpha/m/1", BASE),
            None
        );
    }

    #[test]
    fn missing_segments_are_rejected() {
        assert_eq!(
            session_url_from_referer("https://streamed.su/watch/alpha", BASE),
            None
        );
        assert_eq!(
            session_url_from_referer("https://streamed.su/watch/alpha/m42", BASE),
            None
        );
        assert_eq!(
            session_url_from_referer("https://streamed.su/watch///", BASE),
            None
        );
    }

    #[test]
    fn unparseable_referer_is_rejected() {
        assert_eq!(session_url_from_referer("not a url", BASE), None);
        assert_eq!(session_url_from_referer("", BASE), None);
    }
}
