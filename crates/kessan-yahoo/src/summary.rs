use crate::http::{fetch_de, Envelope};
use chrono::{DateTime, NaiveDate};
use kessan_core::{Frame, Key, Numeric, ProviderError, Value};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Company profile, calendar, analysts, ESG & ownership from the v10 quoteSummary endpoint
//
////////////////////////////////////////////////////////////////////////////////////////////////////

pub const MODULES: [&str; 12] = [
    "quoteType",
    "assetProfile",
    "summaryProfile",
    "summaryDetail",
    "financialData",
    "defaultKeyStatistics",
    "price",
    "calendarEvents",
    "recommendationTrend",
    "esgScores",
    "institutionOwnership",
    "fundOwnership",
];

/// Modules merged into `info`, in override order.
const INFO_MODULES: [&str; 7] = [
    "quoteType",
    "assetProfile",
    "summaryProfile",
    "summaryDetail",
    "financialData",
    "defaultKeyStatistics",
    "price",
];

pub const RECOMMENDATION_COLUMNS: [&str; 6] =
    ["period", "strongBuy", "buy", "hold", "sell", "strongSell"];

/// `(column, field of an ownership entry)`
const HOLDER_COLUMNS: [(&str, &str); 6] = [
    ("Date Reported", "reportDate"),
    ("Holder", "organization"),
    ("pctHeld", "pctHeld"),
    ("Shares", "position"),
    ("Value", "value"),
    ("pctChange", "pctChange"),
];

/// `(calendar key, field of calendarEvents.earnings)`
const EARNINGS_ESTIMATES: [(&str, &str); 6] = [
    ("Earnings High", "earningsHigh"),
    ("Earnings Low", "earningsLow"),
    ("Earnings Average", "earningsAverage"),
    ("Revenue High", "revenueHigh"),
    ("Revenue Low", "revenueLow"),
    ("Revenue Average", "revenueAverage"),
];

fn url(query_url: &str, symbol: &str) -> String {
    format!("{query_url}/v10/finance/quoteSummary/{symbol}")
}

pub(crate) async fn fetch(
    http_client: &HttpClient,
    query_url: &str,
    symbol: &str,
    crumb: &str,
) -> Result<Summary, ProviderError> {
    let url = url(query_url, symbol);
    let modules = MODULES.join(",");
    let query = [("modules", modules.as_str()), ("crumb", crumb)];
    let response: QuoteSummaryResponse = fetch_de(http_client, &url, &query).await?;
    Ok(Summary(response.quote_summary.into_first(symbol)?))
}

#[derive(Deserialize, Debug)]
pub struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    pub quote_summary: Envelope<Map<String, JsonValue>>,
}

/// One quoteSummary result: module name -> module body.
#[derive(Debug, Clone, Default)]
pub struct Summary(pub Map<String, JsonValue>);

impl Summary {
    fn module(&self, name: &str) -> Option<&Map<String, JsonValue>> {
        self.0.get(name).and_then(JsonValue::as_object)
    }

    /// Entries of the list at `module.field`, or none.
    fn list(&self, module: &str, field: &str) -> &[JsonValue] {
        self.module(module)
            .and_then(|m| m.get(field))
            .and_then(JsonValue::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Profile, pricing and key statistics flattened into one mapping.
    pub fn info(&self) -> Value {
        let mut info: Vec<(Key, Value)> = Vec::new();
        for module in INFO_MODULES.iter().filter_map(|name| self.module(name)) {
            for (field, value) in module {
                if field == "maxAge" {
                    continue;
                }
                upsert(&mut info, field, lift(value.clone()));
            }
        }
        Value::Mapping(info)
    }

    pub fn calendar(&self) -> Value {
        let mut calendar: Vec<(Key, Value)> = Vec::new();
        let Some(events) = self.module("calendarEvents") else {
            return Value::Mapping(calendar);
        };

        for (key, field) in [("Dividend Date", "dividendDate"), ("Ex-Dividend Date", "exDividendDate")] {
            if let Some(date) = events.get(field).and_then(epoch_date) {
                calendar.push((key.into(), date.into()));
            }
        }

        let earnings = events.get("earnings").and_then(JsonValue::as_object);
        if let Some(dates) = earnings
            .and_then(|e| e.get("earningsDate"))
            .and_then(JsonValue::as_array)
        {
            let dates: Vec<NaiveDate> = dates.iter().filter_map(epoch_date).collect();
            calendar.push(("Earnings Date".into(), dates.into()));
        }
        for (key, field) in EARNINGS_ESTIMATES {
            let estimate = earnings
                .and_then(|e| e.get(field))
                .cloned()
                .map(lift)
                .unwrap_or_default();
            if !estimate.is_absent() {
                calendar.push((key.into(), estimate));
            }
        }

        Value::Mapping(calendar)
    }

    /// Analyst rating counts per period (`0m`, `-1m`, ...).
    pub fn recommendations(&self) -> Frame {
        let mut frame = Frame::positional(RECOMMENDATION_COLUMNS);
        for trend in self.list("recommendationTrend", "trend") {
            frame.push_positional(
                RECOMMENDATION_COLUMNS
                    .iter()
                    .map(|column| field(trend, column))
                    .collect(),
            );
        }
        frame
    }

    /// ESG scores, one row per score.
    pub fn sustainability(&self) -> Frame {
        let mut frame = Frame::indexed(None, ["esgScores"]);
        if let Some(scores) = self.module("esgScores") {
            for (name, score) in scores {
                if name == "maxAge" {
                    continue;
                }
                frame.push(name.as_str(), vec![lift(score.clone())]);
            }
        }
        frame
    }

    pub fn institutional_holders(&self) -> Frame {
        self.holders("institutionOwnership")
    }

    pub fn mutualfund_holders(&self) -> Frame {
        self.holders("fundOwnership")
    }

    fn holders(&self, module: &str) -> Frame {
        let mut frame = Frame::positional(HOLDER_COLUMNS.map(|(column, _)| column));
        for owner in self.list(module, "ownershipList") {
            frame.push_positional(
                HOLDER_COLUMNS
                    .iter()
                    .map(|(column, source)| match *column {
                        "Date Reported" => owner
                            .get(source)
                            .and_then(epoch_date)
                            .map_or(Value::Absent, Value::from),
                        _ => field(owner, source),
                    })
                    .collect(),
            );
        }
        frame
    }
}

// -------------------------------------------------------------------------------------------------

/// Replace `key` in place if present, else append.
fn upsert(entries: &mut Vec<(Key, Value)>, key: &str, value: Value) {
    match entries.iter_mut().find(|(k, _)| matches!(k, Key::Str(s) if s == key)) {
        Some((_, slot)) => *slot = value,
        None => entries.push((key.into(), value)),
    }
}

fn field(object: &JsonValue, name: &str) -> Value {
    object.get(name).cloned().map(lift).unwrap_or_default()
}

/// Yahoo JSON -> [`Value`]: `{"raw": x, "fmt": ...}` becomes a numeric wrapper, `{}` is
/// absent, everything else keeps its shape.
pub fn lift(json: JsonValue) -> Value {
    match json {
        JsonValue::Object(object) if object.is_empty() => Value::Absent,
        JsonValue::Object(mut object) => match object.remove("raw") {
            Some(raw) => raw_number(raw),
            None => Value::Mapping(
                object
                    .into_iter()
                    .map(|(k, v)| (Key::Str(k), lift(v)))
                    .collect(),
            ),
        },
        JsonValue::Array(items) => Value::Sequence(items.into_iter().map(lift).collect()),
        other => other.into(),
    }
}

fn raw_number(raw: JsonValue) -> Value {
    match raw {
        JsonValue::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Numeric::I64(i).into(),
            (None, Some(u)) => Numeric::U64(u).into(),
            (None, None) => Numeric::F64(n.as_f64().unwrap_or(f64::NAN)).into(),
        },
        JsonValue::String(s) => match s.parse::<f64>() {
            Ok(x) => Numeric::F64(x).into(),
            Err(_) => Value::Str(s),
        },
        other => other.into(),
    }
}

/// Epoch seconds, bare or as `{"raw": ...}`, to a calendar date.
fn epoch_date(json: &JsonValue) -> Option<NaiveDate> {
    let seconds = json.get("raw").unwrap_or(json).as_i64()?;
    DateTime::from_timestamp(seconds, 0).map(|t| t.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kessan_core::normalize;
    use serde_json::json;

    fn summary(body: JsonValue) -> Summary {
        let response: QuoteSummaryResponse =
            serde_json::from_value(json!({"quoteSummary": {"result": [body], "error": null}})).unwrap();
        Summary(response.quote_summary.into_first("AAPL").unwrap())
    }

    #[test]
    fn raw_objects_become_numeric_wrappers() {
        assert_eq!(
            lift(json!({"raw": 189.5, "fmt": "189.50"})),
            Value::Numeric(Numeric::F64(189.5))
        );
        assert_eq!(
            lift(json!({"raw": 15_441_899_520_i64, "fmt": "15.44B", "longFmt": "15,441,899,520"})),
            Value::Numeric(Numeric::I64(15_441_899_520))
        );
        assert_eq!(
            lift(json!({"raw": u64::MAX, "fmt": "18.45E"})),
            Value::Numeric(Numeric::U64(u64::MAX))
        );
        assert_eq!(lift(json!({})), Value::Absent);
        assert_eq!(lift(json!("Technology")), Value::Str("Technology".into()));
    }

    #[test]
    fn info_merges_modules_with_later_overriding() {
        let summary = summary(json!({
            "quoteType": {"symbol": "AAPL", "maxAge": 1, "longName": "Apple Inc."},
            "assetProfile": {"sector": "Technology", "maxAge": 86400},
            "financialData": {"currentPrice": {"raw": 189.5, "fmt": "189.50"}, "ebitda": {}},
            "price": {"longName": "Apple Inc. (price)", "currency": "USD"},
            "esgScores": {"totalEsg": {"raw": 17.2}},
        }));

        assert_eq!(
            normalize(summary.info()),
            json!({
                "symbol": "AAPL",
                "longName": "Apple Inc. (price)",
                "sector": "Technology",
                "currentPrice": 189.5,
                "ebitda": null,
                "currency": "USD",
            })
        );
    }

    #[test]
    fn calendar_reads_dates_and_estimates() {
        let summary = summary(json!({
            "calendarEvents": {
                "maxAge": 1,
                "earnings": {
                    "earningsDate": [{"raw": 1_714_680_000, "fmt": "2024-05-02"}],
                    "earningsAverage": {"raw": 1.5, "fmt": "1.50"},
                    "earningsLow": {"raw": 1.43},
                    "earningsHigh": {"raw": 1.62},
                    "revenueAverage": {"raw": 90_355_600_000_i64},
                },
                "exDividendDate": {"raw": 1_707_436_800, "fmt": "2024-02-09"},
                "dividendDate": {"raw": 1_707_955_200, "fmt": "2024-02-15"},
            }
        }));

        assert_eq!(
            normalize(summary.calendar()),
            json!({
                "Dividend Date": "2024-02-15",
                "Ex-Dividend Date": "2024-02-09",
                "Earnings Date": ["2024-05-02"],
                "Earnings High": 1.62,
                "Earnings Low": 1.43,
                "Earnings Average": 1.5,
                "Revenue Average": 90_355_600_000_i64,
            })
        );
    }

    #[test]
    fn missing_modules_give_empty_shapes() {
        let summary = summary(json!({}));

        assert_eq!(normalize(summary.info()), json!({}));
        assert_eq!(normalize(summary.calendar()), json!({}));
        assert!(summary.recommendations().is_empty());
        assert!(summary.sustainability().is_empty());
        assert!(summary.institutional_holders().is_empty());
        assert_eq!(normalize(summary.mutualfund_holders().into()), json!([]));
    }

    #[test]
    fn recommendations_have_positional_rows() {
        let summary = summary(json!({
            "recommendationTrend": {"trend": [
                {"period": "0m", "strongBuy": 11, "buy": 21, "hold": 6, "sell": 0, "strongSell": 0},
                {"period": "-1m", "strongBuy": 10, "buy": 20, "hold": 7, "sell": 1},
            ]}
        }));

        assert_eq!(
            normalize(summary.recommendations().into()),
            json!([
                {"index": 0, "period": "0m", "strongBuy": 11, "buy": 21, "hold": 6, "sell": 0, "strongSell": 0},
                {"index": 1, "period": "-1m", "strongBuy": 10, "buy": 20, "hold": 7, "sell": 1, "strongSell": null},
            ])
        );
    }

    #[test]
    fn sustainability_is_indexed_by_score() {
        let summary = summary(json!({
            "esgScores": {"maxAge": 86400, "totalEsg": {"raw": 17.2, "fmt": "17.2"}, "peerGroup": "Technology Hardware"}
        }));

        assert_eq!(
            normalize(summary.sustainability().into()),
            json!([
                {"index": "totalEsg", "esgScores": 17.2},
                {"index": "peerGroup", "esgScores": "Technology Hardware"},
            ])
        );
    }

    #[test]
    fn holders_rename_ownership_fields() {
        let summary = summary(json!({
            "fundOwnership": {"ownershipList": [{
                "maxAge": 1,
                "reportDate": {"raw": 1_703_980_800, "fmt": "2023-12-31"},
                "organization": "Vanguard Total Stock Market Index Fund",
                "pctHeld": {"raw": 0.0296, "fmt": "2.96%"},
                "position": {"raw": 457_000_000_i64},
                "value": {"raw": 87_000_000_000_i64},
                "pctChange": {"raw": 0.0056},
            }]}
        }));

        assert_eq!(
            normalize(summary.mutualfund_holders().into()),
            json!([{
                "index": 0,
                "Date Reported": "2023-12-31",
                "Holder": "Vanguard Total Stock Market Index Fund",
                "pctHeld": 0.0296,
                "Shares": 457_000_000_i64,
                "Value": 87_000_000_000_i64,
                "pctChange": 0.0056,
            }])
        );
    }
}
