use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Request-level error taxonomy.
///
/// Every variant maps to one HTTP response; no request failure is fatal to
/// the process.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A required query parameter was absent
    #[error("Missing '{0}' parameter")]
    MissingParam(&'static str),

    /// The `url` parameter was not an http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The requested local path has no entry in the mapping table
    #[error("Not found")]
    UnknownPath,

    /// Playlist fetch failed after exhausting all attempts
    #[error("Error fetching M3U8: {0}")]
    PlaylistUnavailable(String),

    /// The upstream answered with a non-2xx status; relayed as-is
    #[error("Upstream returned {0}")]
    UpstreamStatus(StatusCode),

    /// Network-level failure talking to the upstream
    #[error("Error fetching resource: {0}")]
    UpstreamRequest(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::MissingParam(_) | ProxyError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ProxyError::UnknownPath => StatusCode::NOT_FOUND,
            ProxyError::PlaylistUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::UpstreamStatus(code) => *code,
            ProxyError::UpstreamRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_param_is_bad_request() {
        let resp = ProxyError::MissingParam("url").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_path_is_not_found() {
        let resp = ProxyError::UnknownPath.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_status_is_relayed() {
        let resp = ProxyError::UpstreamStatus(StatusCode::FORBIDDEN).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn playlist_unavailable_is_internal_error() {
        let resp = ProxyError::PlaylistUnavailable("503 after 3 attempts".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_param_message_names_the_parameter() {
        let err = ProxyError::MissingParam("url");
        assert_eq!(err.to_string(), "Missing 'url' parameter");
    }
}
