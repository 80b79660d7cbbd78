use anyhow::anyhow;
use kessan_core::ProviderError;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, trace};

/// `{"result": [...], "error": {...}}`; every Yahoo endpoint wraps its payload in one of
/// these, under an endpoint-specific root key.
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    pub result: Option<Vec<T>>,
    pub error: Option<ApiError>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        match err.code.as_str() {
            "Not Found" => ProviderError::NotFound(err.description),
            "Bad Request" => ProviderError::Rejected(err.description),
            _ => ProviderError::Upstream(anyhow!("{}: {}", err.code, err.description)),
        }
    }
}

impl<T> Envelope<T> {
    /// The first result; a missing or empty result means Yahoo knows nothing of `symbol`.
    pub fn into_first(self, symbol: &str) -> Result<T, ProviderError> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        self.result
            .and_then(|result| result.into_iter().next())
            .ok_or_else(|| ProviderError::NotFound(format!("No data found for symbol: {symbol}")))
    }

    /// Every result, possibly none.
    pub fn into_all(self) -> Result<Vec<T>, ProviderError> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        Ok(self.result.unwrap_or_default())
    }
}

/// Error body of requests Yahoo rejects before reaching an endpoint (e.g. a bad crumb).
#[derive(Deserialize, Debug)]
struct Rejection {
    finance: Envelope<serde_json::Value>,
}

// -------------------------------------------------------------------------------------------------

/// GET `url` with `query` and deserialize the body as `D`.
///
/// Yahoo answers lookups for unknown symbols with a 404 *and* a well-formed envelope, so
/// the status is not checked before decoding; it only matters once decoding fails.
pub(crate) async fn fetch_de<D>(
    http_client: &HttpClient,
    url: &str,
    query: &[(&str, &str)],
) -> Result<D, ProviderError>
where
    D: DeserializeOwned,
{
    trace!("GET {url}");
    let response = http_client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| {
            error!("failed fetching response from {url}: {e}");
            ProviderError::upstream(e)
        })?;

    let status = response.status();
    let body = response.bytes().await.map_err(|e| {
        error!("failed reading response body from {url}: {e}");
        ProviderError::upstream(e)
    })?;

    match serde_json::from_slice::<D>(&body) {
        Ok(de) => Ok(de),
        Err(e) => {
            if let Ok(Rejection { finance }) = serde_json::from_slice::<Rejection>(&body) {
                if let Some(err) = finance.error {
                    error!("{url} rejected the request (HTTP {status}): {}", err.description);
                    return Err(err.into());
                }
            }
            error!("failed deserializing from {url} (HTTP {status}): {e}");
            Err(ProviderError::upstream(anyhow!(
                "unreadable response from {url} (HTTP {status}): {e}"
            )))
        }
    }
}
