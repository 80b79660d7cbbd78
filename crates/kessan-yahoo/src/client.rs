use crate::config::YahooConfig;
use crate::timeseries::Statement;
use crate::{chart, summary, timeseries};
use anyhow::anyhow;
use async_trait::async_trait;
use kessan_core::{FieldBundle, Frame, Provider, ProviderError};
use reqwest::{Client as HttpClient, ClientBuilder};
use tracing::{debug, error, trace, warn};

/// Yahoo Finance, reached through its unofficial JSON API.
#[derive(Debug, Clone)]
pub struct Yahoo {
    http_client: HttpClient,
    config: YahooConfig,
}

impl Yahoo {
    pub fn new(config: YahooConfig) -> anyhow::Result<Self> {
        let http_client = ClientBuilder::new()
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .build()
            .map_err(|e| {
                error!("failed to build the HTTP client: {e}");
                e
            })?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Configure from `YAHOO_QUERY_URL`, `YAHOO_COOKIE_URL` and `USER_AGENT`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(YahooConfig::from_env())
    }

    pub fn config(&self) -> &YahooConfig {
        &self.config
    }

    /// Open a session and return the crumb the quoteSummary endpoint insists on.
    ///
    /// The cookie host answers with an error page but still sets the session cookie, so
    /// only transport failures there are worth a log line.
    async fn crumb(&self) -> Result<String, ProviderError> {
        let cookie_url = &self.config.cookie_url;
        trace!("GET {cookie_url}");
        if let Err(e) = self.http_client.get(cookie_url).send().await {
            warn!("failed to reach {cookie_url}: {e}");
        }

        let url = format!("{}/v1/test/getcrumb", self.config.query_url);
        trace!("GET {url}");
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::upstream)?;
        let status = response.status();
        let crumb = response.text().await.map_err(ProviderError::upstream)?;
        let crumb = crumb.trim();

        if !status.is_success() || crumb.is_empty() {
            error!("no crumb from {url} (HTTP {status})");
            return Err(ProviderError::upstream(anyhow!(
                "could not obtain a Yahoo session crumb (HTTP {status})"
            )));
        }
        Ok(crumb.to_string())
    }
}

/// Trimmed, upper-cased symbol. Anything that cannot be part of a Yahoo symbol is rejected
/// before it reaches a URL.
pub fn canonical(symbol: &str) -> Result<String, ProviderError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ProviderError::Rejected("ticker must not be empty".to_string()));
    }
    if let Some(c) = symbol
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
    {
        return Err(ProviderError::Rejected(format!(
            "invalid character {c:?} in ticker {symbol:?}"
        )));
    }
    Ok(symbol)
}

#[async_trait]
impl Provider for Yahoo {
    async fn fetch_ticker(&self, symbol: &str) -> Result<FieldBundle, ProviderError> {
        let symbol = canonical(symbol)?;
        let query_url = self.config.query_url.as_str();
        let time = std::time::Instant::now();

        let crumb = self.crumb().await?;
        let summary = summary::fetch(&self.http_client, query_url, &symbol, &crumb).await?;
        trace!("[{symbol}] quote summary fetched");

        let income = timeseries::fetch(&self.http_client, query_url, &symbol, Statement::Income).await?;
        let balance =
            timeseries::fetch(&self.http_client, query_url, &symbol, Statement::BalanceSheet).await?;
        let cash_flow =
            timeseries::fetch(&self.http_client, query_url, &symbol, Statement::CashFlow).await?;
        trace!("[{symbol}] statements fetched");

        let events = chart::fetch(&self.http_client, query_url, &symbol, "max").await?;
        let today = chart::fetch(&self.http_client, query_url, &symbol, "1d").await?;
        trace!("[{symbol}] charts fetched");

        let bundle = FieldBundle {
            info: summary.info(),
            calendar: summary.calendar(),
            balance_sheet: balance.annual,
            income_stmt: income.annual,
            ttm_income_stmt: income.trailing,
            quarterly_income_stmt: income.quarterly,
            cash_flow: cash_flow.annual,
            ttm_cash_flow: cash_flow.trailing,
            quarterly_cash_flow: cash_flow.quarterly,
            dividends: events.dividends(),
            splits: events.splits(),
            actions: events.actions(),
            recommendations: summary.recommendations(),
            history: today.history(),
            sustainability: summary.sustainability(),
            institutional_holders: summary.institutional_holders(),
            mutualfund_holders: summary.mutualfund_holders(),
        };

        debug!(
            "[{symbol}] fetched | Elapsed time: {} ms",
            time.elapsed().as_millis()
        );
        Ok(bundle)
    }

    async fn fetch_history(&self, symbol: &str, period: &str) -> Result<Frame, ProviderError> {
        let symbol = canonical(symbol)?;
        let time = std::time::Instant::now();

        let chart = chart::fetch(&self.http_client, &self.config.query_url, &symbol, period).await?;
        let history = chart.history();

        debug!(
            "[{symbol}] {} rows of {period} history | Elapsed time: {} ms",
            history.len(),
            time.elapsed().as_millis()
        );
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_trimmed_and_upper_cased() {
        assert_eq!(canonical(" aapl ").unwrap(), "AAPL");
        assert_eq!(canonical("brk-b").unwrap(), "BRK-B");
        assert_eq!(canonical("^gspc").unwrap(), "^GSPC");
        assert_eq!(canonical("eurusd=x").unwrap(), "EURUSD=X");
        assert_eq!(canonical("vod.l").unwrap(), "VOD.L");
    }

    #[test]
    fn malformed_symbols_are_rejected() {
        assert!(matches!(canonical("   "), Err(ProviderError::Rejected(_))));
        assert!(matches!(canonical("AAPL/../x"), Err(ProviderError::Rejected(_))));
        assert!(matches!(canonical("A B"), Err(ProviderError::Rejected(_))));
    }
}
