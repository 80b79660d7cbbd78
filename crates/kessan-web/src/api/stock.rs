use crate::error::{ApiError, ErrorBody};
use actix_web::{get, web, HttpResponse};
use kessan_core::{normalize, Provider};
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use tracing::debug;
use utoipa::IntoParams;

/// Period served by `/stock/history` when none is asked for.
pub const DEFAULT_PERIOD: &str = "1d";

fn default_period() -> String {
    DEFAULT_PERIOD.to_string()
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    /// Ticker symbol, e.g. `AAPL`
    pub ticker: String,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Ticker symbol, e.g. `AAPL`
    pub ticker: String,

    /// Yahoo range, `1d` when omitted: `1d`, `5d`, `1mo`, `3mo`, `6mo`, `1y`, `2y`, `5y`, `10y`, `ytd`, `max`
    #[serde(default = "default_period")]
    pub period: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Everything known about a stock
///
/// One JSON object with 18 fields, in this order: `cmp` (current market price), `info`,
/// `calendar`, the annual/trailing/quarterly income and cash flow statements, the balance
/// sheet, `dividends`, `splits`, `actions`, `recommendations`, `history`,
/// `sustainability`, `institutional_holders` and `mutualfund_holders`.
///
/// Tables are arrays of row objects, series are objects keyed by date; missing numbers are
/// `null`.
#[utoipa::path(
    get,
    path = "/stock",
    params(StockQuery),
    responses(
        (
            status = 200, description = "Normalized stock data", body = Object,
            content_type = "application/json",
            example = json!({
                "cmp": 189.5,
                "info": {"symbol": "AAPL", "currentPrice": 189.5},
                "calendar": {"Ex-Dividend Date": "2024-02-09"},
                "dividends": {"2024-02-09T00:00:00-05:00": 0.24},
                "history": [{"Date": "2024-02-08T00:00:00-05:00", "Open": 189.39, "Close": 188.32, "Volume": 40962000}]
            })
        ),
        (status = 400, description = "Missing or malformed ticker", body = ErrorBody),
        (status = 404, description = "Unknown ticker", body = ErrorBody),
        (status = 502, description = "Yahoo Finance failed or answered nonsense", body = ErrorBody),
    )
)]
#[get("/stock")]
pub async fn stock(
    query: web::Query<StockQuery>,
    provider: web::Data<dyn Provider>,
) -> Result<HttpResponse, ApiError> {
    let ticker = query.into_inner().ticker;
    let bundle = provider
        .fetch_ticker(&ticker)
        .await
        .map_err(ApiError::stock_data)?;

    let body: Map<String, Json> = bundle
        .into_fields()
        .into_iter()
        .map(|(name, value)| (name.to_string(), normalize(value)))
        .collect();
    debug!("[{ticker}] normalized {} fields", body.len());

    Ok(HttpResponse::Ok().json(body))
}

// -------------------------------------------------------------------------------------------------

/// Daily price history of a stock
///
/// Rows of `Date, Open, High, Low, Close, Volume, Dividends, Stock Splits`, oldest first.
#[utoipa::path(
    get,
    path = "/stock/history",
    params(HistoryQuery),
    responses(
        (
            status = 200, description = "Daily bars", body = [Object],
            content_type = "application/json",
            example = json!([{
                "Date": "2024-02-08T00:00:00-05:00",
                "Open": 189.39, "High": 189.54, "Low": 187.35, "Close": 188.32,
                "Volume": 40962000, "Dividends": 0.0, "Stock Splits": 0.0
            }])
        ),
        (status = 400, description = "Missing ticker or unsupported period", body = ErrorBody),
        (status = 404, description = "Unknown ticker", body = ErrorBody),
        (status = 502, description = "Yahoo Finance failed or answered nonsense", body = ErrorBody),
    )
)]
#[get("/stock/history")]
pub async fn history(
    query: web::Query<HistoryQuery>,
    provider: web::Data<dyn Provider>,
) -> Result<HttpResponse, ApiError> {
    let HistoryQuery { ticker, period } = query.into_inner();
    let frame = provider
        .fetch_history(&ticker, &period)
        .await
        .map_err(ApiError::stock_history)?;
    debug!("[{ticker}] {} rows of {period} history", frame.len());

    Ok(HttpResponse::Ok().json(normalize(frame.into())))
}
