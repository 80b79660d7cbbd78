use crate::http::{fetch_de, Envelope};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeDelta, Utc};
use kessan_core::{Frame, Numeric, ProviderError, Series, Value};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Price history & corporate actions from the v8 chart endpoint
//
////////////////////////////////////////////////////////////////////////////////////////////////////

const INTERVAL: &str = "1d";

pub const HISTORY_COLUMNS: [&str; 7] = [
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Dividends",
    "Stock Splits",
];

pub const ACTION_COLUMNS: [&str; 2] = ["Dividends", "Stock Splits"];

fn url(query_url: &str, symbol: &str) -> String {
    format!("{query_url}/v8/finance/chart/{symbol}")
}

/// Daily bars covering `range` (`1d`, `5d`, `1mo`, ..., `max`), with dividend and split
/// events.
pub(crate) async fn fetch(
    http_client: &HttpClient,
    query_url: &str,
    symbol: &str,
    range: &str,
) -> Result<Chart, ProviderError> {
    let url = url(query_url, symbol);
    let query = [
        ("symbol", symbol),
        ("range", range),
        ("interval", INTERVAL),
        ("events", "div|split"),
    ];
    let response: ChartResponse = fetch_de(http_client, &url, &query).await?;
    response.chart.into_first(symbol)
}

// -------------------------------------------------------------------------------------------------

impl Chart {
    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.meta.gmtoffset).unwrap_or_else(|| Utc.fix())
    }

    /// Trading day of `timestamp` at the exchange.
    fn local_date(&self, timestamp: i64) -> Option<NaiveDate> {
        DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(&self.offset()).date_naive())
    }

    /// Midnight of `date` at the exchange; the row label of daily bars.
    fn midnight(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        let offset = self.offset();
        let local = date.and_time(NaiveTime::MIN);
        let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, offset)
    }

    fn dividend_events(&self) -> Vec<(NaiveDate, f64)> {
        let mut events: Vec<&Dividend> = self.events.dividends.values().collect();
        events.sort_by_key(|event| event.date);
        events
            .into_iter()
            .filter_map(|event| Some((self.local_date(event.date)?, event.amount)))
            .collect()
    }

    fn split_events(&self) -> Vec<(NaiveDate, f64)> {
        let mut events: Vec<&Split> = self.events.splits.values().collect();
        events.sort_by_key(|event| event.date);
        events
            .into_iter()
            .filter_map(|event| Some((self.local_date(event.date)?, event.ratio())))
            .collect()
    }

    /// Daily OHLCV bars, prices adjusted for dividends and splits, with the actions paid
    /// out on each day.
    ///
    /// Missing quotes stay NaN, missing volumes stay absent.
    pub fn history(&self) -> Frame {
        let dividends: HashMap<NaiveDate, f64> = self.dividend_events().into_iter().collect();
        let splits: HashMap<NaiveDate, f64> = self.split_events().into_iter().collect();
        let quote = self.indicators.quote.first();
        let adjclose = self.indicators.adjclose.first();

        let mut frame = Frame::indexed(Some("Date"), HISTORY_COLUMNS);
        for (i, &timestamp) in self.timestamp.iter().enumerate() {
            let Some(date) = self.local_date(timestamp) else {
                continue;
            };
            let at = |column: &[Option<f64>]| column.get(i).copied().flatten();

            let (open, high, low, close, volume) = match quote {
                Some(q) => (
                    at(&q.open),
                    at(&q.high),
                    at(&q.low),
                    at(&q.close),
                    q.volume.get(i).copied().flatten(),
                ),
                None => (None, None, None, None, None),
            };
            let ratio = match (adjclose.and_then(|a| at(&a.adjclose)), close) {
                (Some(adjusted), Some(close)) if close != 0.0 => adjusted / close,
                _ => 1.0,
            };
            let price = |x: Option<f64>| Value::Numeric(Numeric::F64(x.map_or(f64::NAN, |x| x * ratio)));

            frame.push(
                self.midnight(date),
                vec![
                    price(open),
                    price(high),
                    price(low),
                    price(close),
                    volume.map(Numeric::I64).into(),
                    Value::Float(dividends.get(&date).copied().unwrap_or(0.0)),
                    Value::Float(splits.get(&date).copied().unwrap_or(0.0)),
                ],
            );
        }
        frame
    }

    /// Every dividend ever paid, oldest first.
    pub fn dividends(&self) -> Series {
        let mut series = Series::named("Dividends");
        for (date, amount) in self.dividend_events() {
            series.push(self.midnight(date), amount);
        }
        series
    }

    /// Every split, oldest first, as new shares per old share.
    pub fn splits(&self) -> Series {
        let mut series = Series::named("Stock Splits");
        for (date, ratio) in self.split_events() {
            series.push(self.midnight(date), ratio);
        }
        series
    }

    /// Dividends and splits side by side over every date either happened on.
    pub fn actions(&self) -> Frame {
        let mut days: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
        for (date, amount) in self.dividend_events() {
            days.entry(date).or_default().0 = amount;
        }
        for (date, ratio) in self.split_events() {
            days.entry(date).or_default().1 = ratio;
        }

        let mut frame = Frame::indexed(Some("Date"), ACTION_COLUMNS);
        for (date, (dividend, split)) in days {
            frame.push(
                self.midnight(date),
                vec![Value::Float(dividend), Value::Float(split)],
            );
        }
        frame
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Deserialization
//
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Deserialize, Debug)]
pub struct ChartResponse {
    pub chart: Envelope<Chart>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Chart {
    pub meta: Meta,
    pub timestamp: Vec<i64>,
    pub events: Events,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Meta {
    pub gmtoffset: i32,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Events {
    pub dividends: HashMap<String, Dividend>,
    pub splits: HashMap<String, Split>,
}

#[derive(Deserialize, Debug)]
pub struct Dividend {
    pub amount: f64,
    pub date: i64,
}

#[derive(Deserialize, Debug)]
pub struct Split {
    pub date: i64,
    pub numerator: f64,
    pub denominator: f64,
}

impl Split {
    fn ratio(&self) -> f64 {
        self.numerator / self.denominator
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Indicators {
    pub quote: Vec<Quote>,
    pub adjclose: Vec<AdjClose>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Quote {
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<i64>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct AdjClose {
    pub adjclose: Vec<Option<f64>>,
}
