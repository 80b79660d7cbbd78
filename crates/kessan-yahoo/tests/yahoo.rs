use kessan_core::{normalize, Provider, ProviderError};
use kessan_yahoo::{Yahoo, YahooConfig};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;

const FEB_08: i64 = 1_707_402_600;

fn yahoo(server: &ServerGuard) -> Yahoo {
    Yahoo::new(YahooConfig::with_base_url(&server.url())).unwrap()
}

/// Cookie and crumb endpoints; keep the returned mocks alive for the whole test.
async fn mock_session(server: &mut ServerGuard) -> (Mock, Mock) {
    let cookie = server
        .mock("GET", "/")
        .with_status(404)
        .with_header("set-cookie", "A3=d=AQABBK; Path=/")
        .with_body("Not Found")
        .create_async()
        .await;
    let crumb = server
        .mock("GET", "/v1/test/getcrumb")
        .with_status(200)
        .with_body("kNO5Ej/DeCx")
        .create_async()
        .await;
    (cookie, crumb)
}

fn chart_body(timestamps: &[i64], close: &[Option<f64>]) -> String {
    json!({
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "symbol": "AAPL", "gmtoffset": -18000},
                "timestamp": timestamps,
                "events": {
                    "dividends": {"1707489000": {"amount": 0.24, "date": 1_707_489_000}}
                },
                "indicators": {
                    "quote": [{
                        "open": close,
                        "high": close,
                        "low": close,
                        "close": close,
                        "volume": timestamps.iter().map(|_| 1_000).collect::<Vec<_>>()
                    }],
                    "adjclose": [{"adjclose": close}]
                }
            }],
            "error": null
        }
    })
    .to_string()
}

fn not_found(root: &str) -> String {
    json!({
        root: {
            "result": null,
            "error": {"code": "Not Found", "description": "Quote not found for symbol: INVALID"}
        }
    })
    .to_string()
}

// -------------------------------------------------------------------------------------------------

#[tokio::test]
async fn fetch_ticker_fills_every_field() {
    let mut server = Server::new_async().await;
    let _session = mock_session(&mut server).await;

    let summary = server
        .mock("GET", "/v10/finance/quoteSummary/AAPL")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("crumb".into(), "kNO5Ej/DeCx".into()),
            Matcher::Regex("modules=".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({"quoteSummary": {"result": [{
                "price": {"maxAge": 1, "currency": "USD", "longName": "Apple Inc."},
                "financialData": {"currentPrice": {"raw": 189.5, "fmt": "189.50"}},
                "calendarEvents": {"exDividendDate": {"raw": 1_707_436_800, "fmt": "2024-02-09"}},
                "recommendationTrend": {"trend": [{"period": "0m", "strongBuy": 11, "buy": 21, "hold": 6, "sell": 0, "strongSell": 0}]}
            }], "error": null}})
            .to_string(),
        )
        .create_async()
        .await;

    let statements = server
        .mock("GET", "/ws/fundamentals-timeseries/v1/finance/timeseries/AAPL")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({"timeseries": {"result": [{
                "meta": {"symbol": ["AAPL"], "type": ["annualTotalRevenue"]},
                "annualTotalRevenue": [{"asOfDate": "2023-09-30", "reportedValue": {"raw": 383_285_000_000.0_f64}}]
            }], "error": null}})
            .to_string(),
        )
        .expect(3)
        .create_async()
        .await;

    let events = server
        .mock("GET", "/v8/finance/chart/AAPL")
        .match_query(Matcher::UrlEncoded("range".into(), "max".into()))
        .with_status(200)
        .with_body(chart_body(&[FEB_08], &[Some(188.32)]))
        .create_async()
        .await;
    let today = server
        .mock("GET", "/v8/finance/chart/AAPL")
        .match_query(Matcher::UrlEncoded("range".into(), "1d".into()))
        .with_status(200)
        .with_body(chart_body(&[FEB_08], &[Some(188.32)]))
        .create_async()
        .await;

    let bundle = yahoo(&server).fetch_ticker(" aapl ").await.unwrap();

    summary.assert_async().await;
    statements.assert_async().await;
    events.assert_async().await;
    today.assert_async().await;

    let fields: serde_json::Map<String, serde_json::Value> = bundle
        .into_fields()
        .into_iter()
        .map(|(name, value)| (name.to_string(), normalize(value)))
        .collect();

    assert_eq!(fields.len(), 18);
    assert_eq!(fields["cmp"], json!(189.5));
    assert_eq!(fields["info"]["longName"], json!("Apple Inc."));
    assert_eq!(fields["calendar"], json!({"Ex-Dividend Date": "2024-02-09"}));
    assert_eq!(
        fields["income_stmt"],
        json!([{"index": "Total Revenue", "2023-09-30": 383_285_000_000.0_f64}])
    );
    assert_eq!(fields["balance_sheet"], json!([]));
    assert_eq!(
        fields["dividends"],
        json!({"2024-02-09T00:00:00-05:00": 0.24})
    );
    assert_eq!(fields["splits"], json!({}));
    assert_eq!(fields["history"][0]["Close"], json!(188.32));
    assert_eq!(fields["recommendations"][0]["strongBuy"], json!(11));
    assert_eq!(fields["sustainability"], json!([]));
    assert_eq!(fields["mutualfund_holders"], json!([]));
}

#[tokio::test]
async fn unknown_ticker_is_not_found() {
    let mut server = Server::new_async().await;
    let _session = mock_session(&mut server).await;
    let _summary = server
        .mock("GET", "/v10/finance/quoteSummary/INVALID")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(not_found("quoteSummary"))
        .create_async()
        .await;

    let err = yahoo(&server).fetch_ticker("INVALID").await.unwrap_err();

    assert!(matches!(err, ProviderError::NotFound(_)));
    assert_eq!(err.to_string(), "Quote not found for symbol: INVALID");
}

#[tokio::test]
async fn history_has_no_nan_tokens() {
    let mut server = Server::new_async().await;
    let chart = server
        .mock("GET", "/v8/finance/chart/AAPL")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("range".into(), "5d".into()),
            Matcher::UrlEncoded("interval".into(), "1d".into()),
        ]))
        .with_status(200)
        .with_body(chart_body(
            &[FEB_08, FEB_08 + 86_400],
            &[Some(188.32), None],
        ))
        .create_async()
        .await;

    let history = yahoo(&server).fetch_history("AAPL", "5d").await.unwrap();
    chart.assert_async().await;

    assert_eq!(history.len(), 2);
    let out = normalize(history.into());
    assert!(!out.to_string().contains("NaN"));
    assert_eq!(out[1]["Close"], json!(null));
    assert_eq!(out[1]["Dividends"], json!(0.24));
}

#[tokio::test]
async fn unsupported_period_is_rejected() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v8/finance/chart/AAPL")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(
            json!({"chart": {"result": null, "error": {
                "code": "Bad Request",
                "description": "Invalid input - interval=1d is not supported for range=7x"
            }}})
            .to_string(),
        )
        .create_async()
        .await;

    let err = yahoo(&server).fetch_history("AAPL", "7x").await.unwrap_err();

    assert!(matches!(err, ProviderError::Rejected(_)));
}

#[tokio::test]
async fn unknown_history_ticker_is_not_found() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v8/finance/chart/INVALID")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(not_found("chart"))
        .create_async()
        .await;

    let err = yahoo(&server).fetch_history("invalid", "1d").await.unwrap_err();

    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn missing_crumb_is_an_upstream_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/test/getcrumb")
        .with_status(429)
        .with_body("Too Many Requests")
        .create_async()
        .await;

    let err = yahoo(&server).fetch_ticker("AAPL").await.unwrap_err();

    assert!(matches!(err, ProviderError::Upstream(_)));
}

#[tokio::test]
async fn garbage_body_is_an_upstream_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v8/finance/chart/AAPL")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("<html>Service Unavailable</html>")
        .create_async()
        .await;

    let err = yahoo(&server).fetch_history("AAPL", "1d").await.unwrap_err();

    assert!(matches!(err, ProviderError::Upstream(_)));
    assert!(err.to_string().contains("503"));
}
