use std::env;
use std::time::Duration;

/// Per-deployment proxy profile: outbound header templates plus the knobs
/// that used to vary between deployment variants (retry count, relay prefix,
/// upstream host).
#[derive(Clone, Debug)]
pub struct ProxyProfile {
    /// Browser-like User-Agent sent on every outbound request
    pub user_agent: String,
    /// Origin header expected by the upstream embed host
    pub origin: String,
    /// Referer header expected by the upstream embed host
    pub referer: String,
    /// Playlist lines starting with this prefix are treated as upstream segments
    pub upstream_host_prefix: String,
    /// Prefix of the external CORS relay; the percent-encoded segment URL
    /// is appended verbatim
    pub cors_relay_prefix: String,
    /// Total playlist fetch attempts (minimum 1)
    pub max_attempts: u32,
    /// Per-request timeout for all outbound fetches
    pub fetch_timeout: Duration,
    /// Base of the upstream session page used for cookie acquisition
    pub session_page_base: String,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Scheme used when building rewritten playlist URLs (`https` behind a
    /// TLS-terminating front, `http` for local runs)
    pub public_scheme: String,
    pub profile: ProxyProfile,
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/132.0.0.0 Mobile Safari/537.36";

impl Config {
    /// Load configuration from environment variables.
    /// Every variable is optional; defaults match the reference deployment.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()?;

        let public_scheme = env::var("PUBLIC_SCHEME").unwrap_or_else(|_| "https".to_string());

        let max_attempts: u32 = env::var("FETCH_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .unwrap_or(3);

        let fetch_timeout_secs: u64 = env::var("FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .unwrap_or(15);

        let profile = ProxyProfile {
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            origin: env::var("ORIGIN_HEADER")
                .unwrap_or_else(|_| "https://embedstreams.top".to_string()),
            referer: env::var("REFERER_HEADER")
                .unwrap_or_else(|_| "https://embedstreams.top/".to_string()),
            upstream_host_prefix: env::var("UPSTREAM_HOST_PREFIX")
                .unwrap_or_else(|_| "https://p2-panel.streamed.su".to_string()),
            cors_relay_prefix: env::var("CORS_RELAY_PREFIX")
                .unwrap_or_else(|_| "https://corsproxy.io/?url=".to_string()),
            max_attempts: max_attempts.max(1),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            session_page_base: env::var("SESSION_PAGE_BASE")
                .unwrap_or_else(|_| "https://streamed.su/watch".to_string()),
        };

        Ok(Config {
            port,
            public_scheme,
            profile,
        })
    }
}
