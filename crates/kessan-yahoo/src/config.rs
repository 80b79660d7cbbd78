use dotenv::var;

/// Host of the JSON API (quote summary, fundamentals time series, chart, crumb).
pub const QUERY_URL: &str = "https://query2.finance.yahoo.com";

/// Host handing out the session cookie the crumb is bound to.
pub const COOKIE_URL: &str = "https://fc.yahoo.com";

/// Yahoo refuses crumbs to clients that do not look like a browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YahooConfig {
    pub query_url: String,
    pub cookie_url: String,
    pub user_agent: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            query_url: QUERY_URL.to_string(),
            cookie_url: COOKIE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl YahooConfig {
    /// Read `YAHOO_QUERY_URL`, `YAHOO_COOKIE_URL` and `USER_AGENT` from the environment
    /// (or `.env`), falling back to the public endpoints.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            query_url: trimmed(var("YAHOO_QUERY_URL").unwrap_or(defaults.query_url)),
            cookie_url: trimmed(var("YAHOO_COOKIE_URL").unwrap_or(defaults.cookie_url)),
            user_agent: var("USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }

    /// Serve both hosts from one base URL, e.g. a local mock server.
    pub fn with_base_url(base_url: &str) -> Self {
        let base_url = trimmed(base_url.to_string());
        Self {
            query_url: base_url.clone(),
            cookie_url: base_url,
            ..Self::default()
        }
    }
}

fn trimmed(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
