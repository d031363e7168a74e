use std::env;
use std::time::Duration;

pub const DEFAULT_CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Raw service account key document. `None` when the env var is unset.
    pub google_credentials_json: Option<String>,
    pub calendar_api_url: String,
    pub request_timeout: Duration,
    /// Empty means any origin is allowed
    pub cors_allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let google_credentials_json = env::var("GOOGLE_CREDENTIALS_JSON")
            .ok()
            .filter(|json| !json.trim().is_empty());
        let calendar_api_url = env::var("GCAL_PROXY_API_URL")
            .unwrap_or_else(|_| DEFAULT_CALENDAR_API_URL.to_string());
        let request_timeout = env::var("GCAL_PROXY_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        let cors_allowed_origins = env::var("GCAL_PROXY_CORS_ORIGINS")
            .map(|origins| parse_origins(&origins))
            .unwrap_or_default();

        Self {
            google_credentials_json,
            calendar_api_url,
            request_timeout,
            cors_allowed_origins,
        }
    }
}

// `*` is treated the same as leaving the variable unset
fn parse_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_origin_lists() {
        assert_eq!(
            parse_origins("https://a.example.com, https://b.example.com,"),
            vec!["https://a.example.com", "https://b.example.com"]
        );
        assert!(parse_origins("*").is_empty());
        assert!(parse_origins("").is_empty());
    }
}
