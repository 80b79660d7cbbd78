use crate::http::{fetch_de, Envelope};
use chrono::{NaiveDate, Utc};
use kessan_core::{Frame, Key, ProviderError, Value};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeSet, HashMap};
use tracing::trace;

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Financial statements from the fundamentals-timeseries endpoint
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// 2016-12-31T00:00:00Z; statements older than this are not requested.
pub const PERIOD_START: i64 = 1_483_142_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statement {
    Income,
    BalanceSheet,
    CashFlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Annual,
    Quarterly,
    Trailing,
}

impl Frequency {
    fn prefix(self) -> &'static str {
        match self {
            Frequency::Annual => "annual",
            Frequency::Quarterly => "quarterly",
            Frequency::Trailing => "trailing",
        }
    }
}

impl Statement {
    /// Balance sheets are point-in-time, so there is no trailing-twelve-months view.
    pub fn frequencies(self) -> &'static [Frequency] {
        match self {
            Statement::BalanceSheet => &[Frequency::Annual, Frequency::Quarterly],
            _ => &[Frequency::Annual, Frequency::Quarterly, Frequency::Trailing],
        }
    }

    pub fn line_items(self) -> &'static [&'static str] {
        match self {
            Statement::Income => &[
                "TotalRevenue",
                "OperatingRevenue",
                "CostOfRevenue",
                "GrossProfit",
                "ResearchAndDevelopment",
                "SellingGeneralAndAdministration",
                "OperatingExpense",
                "OperatingIncome",
                "InterestIncome",
                "InterestExpense",
                "NetInterestIncome",
                "OtherIncomeExpense",
                "PretaxIncome",
                "TaxProvision",
                "TaxRateForCalcs",
                "NetIncome",
                "NetIncomeCommonStockholders",
                "DilutedNIAvailtoComStockholders",
                "BasicEPS",
                "DilutedEPS",
                "BasicAverageShares",
                "DilutedAverageShares",
                "TotalExpenses",
                "NormalizedIncome",
                "EBIT",
                "EBITDA",
                "NormalizedEBITDA",
                "ReconciledCostOfRevenue",
                "ReconciledDepreciation",
            ],
            Statement::BalanceSheet => &[
                "TotalAssets",
                "CurrentAssets",
                "CashAndCashEquivalents",
                "CashCashEquivalentsAndShortTermInvestments",
                "OtherShortTermInvestments",
                "AccountsReceivable",
                "Inventory",
                "OtherCurrentAssets",
                "TotalNonCurrentAssets",
                "NetPPE",
                "GrossPPE",
                "AccumulatedDepreciation",
                "Goodwill",
                "GoodwillAndOtherIntangibleAssets",
                "InvestmentsAndAdvances",
                "OtherNonCurrentAssets",
                "TotalLiabilitiesNetMinorityInterest",
                "CurrentLiabilities",
                "AccountsPayable",
                "CurrentDebt",
                "CurrentDeferredRevenue",
                "OtherCurrentLiabilities",
                "TotalNonCurrentLiabilitiesNetMinorityInterest",
                "LongTermDebt",
                "OtherNonCurrentLiabilities",
                "TotalDebt",
                "NetDebt",
                "StockholdersEquity",
                "CommonStock",
                "RetainedEarnings",
                "TotalEquityGrossMinorityInterest",
                "WorkingCapital",
                "TangibleBookValue",
                "InvestedCapital",
                "ShareIssued",
                "OrdinarySharesNumber",
                "TreasurySharesNumber",
            ],
            Statement::CashFlow => &[
                "OperatingCashFlow",
                "NetIncomeFromContinuingOperations",
                "DepreciationAndAmortization",
                "DeferredIncomeTax",
                "StockBasedCompensation",
                "ChangeInWorkingCapital",
                "ChangeInReceivables",
                "ChangeInInventory",
                "ChangeInPayable",
                "OtherNonCashItems",
                "InvestingCashFlow",
                "CapitalExpenditure",
                "PurchaseOfBusiness",
                "PurchaseOfInvestment",
                "SaleOfInvestment",
                "NetOtherInvestingChanges",
                "FinancingCashFlow",
                "IssuanceOfDebt",
                "RepaymentOfDebt",
                "IssuanceOfCapitalStock",
                "RepurchaseOfCapitalStock",
                "CashDividendsPaid",
                "NetOtherFinancingCharges",
                "ChangesInCash",
                "BeginningCashPosition",
                "EndCashPosition",
                "IncomeTaxPaidSupplementalData",
                "InterestPaidSupplementalData",
                "FreeCashFlow",
            ],
        }
    }

    /// Every `type` requested for this statement: each line item under each frequency.
    fn types(self) -> Vec<String> {
        self.frequencies()
            .iter()
            .flat_map(|frequency| {
                self.line_items()
                    .iter()
                    .map(move |item| format!("{}{item}", frequency.prefix()))
            })
            .collect()
    }
}

fn url(query_url: &str, symbol: &str) -> String {
    format!("{query_url}/ws/fundamentals-timeseries/v1/finance/timeseries/{symbol}")
}

pub(crate) async fn fetch(
    http_client: &HttpClient,
    query_url: &str,
    symbol: &str,
    statement: Statement,
) -> Result<Statements, ProviderError> {
    let url = url(query_url, symbol);
    let types = statement.types().join(",");
    let period1 = PERIOD_START.to_string();
    let period2 = Utc::now().timestamp().to_string();
    let query = [
        ("symbol", symbol),
        ("type", types.as_str()),
        ("period1", period1.as_str()),
        ("period2", period2.as_str()),
    ];

    let response: TimeseriesResponse = fetch_de(http_client, &url, &query).await?;
    let results = response.timeseries.into_all()?;
    trace!("[{symbol}] {statement:?}: {} time series", results.len());
    Ok(Statements::from_results(statement, &results))
}

#[derive(Deserialize, Debug)]
pub struct TimeseriesResponse {
    pub timeseries: Envelope<Map<String, JsonValue>>,
}

// -------------------------------------------------------------------------------------------------

/// One statement at every frequency Yahoo offers it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statements {
    pub annual: Frame,
    pub quarterly: Frame,
    pub trailing: Frame,
}

/// `(reporting date, reported value)` points of one line item.
type Points = Vec<(NaiveDate, f64)>;

impl Statements {
    fn from_results(statement: Statement, results: &[Map<String, JsonValue>]) -> Self {
        let mut series: HashMap<&str, Points> = HashMap::new();
        for result in results {
            let Some(kind) = result
                .get("meta")
                .and_then(|meta| meta.get("type"))
                .and_then(|kind| kind.get(0))
                .and_then(JsonValue::as_str)
            else {
                continue;
            };
            series.insert(kind, points(result.get(kind)));
        }

        let frame = |frequency: Frequency| {
            if !statement.frequencies().contains(&frequency) {
                return Frame::indexed(None, Vec::<Key>::new());
            }
            let items = statement.line_items().iter().filter_map(|item| {
                let points = series.get(format!("{}{item}", frequency.prefix()).as_str())?;
                (!points.is_empty()).then_some((*item, points))
            });
            statement_frame(items)
        };

        Self {
            annual: frame(Frequency::Annual),
            quarterly: frame(Frequency::Quarterly),
            trailing: frame(Frequency::Trailing),
        }
    }
}

/// Points of one time series; Yahoo pads them with `null` for periods it has nothing for.
fn points(series: Option<&JsonValue>) -> Points {
    let Some(entries) = series.and_then(JsonValue::as_array) else {
        return vec![];
    };
    entries
        .iter()
        .filter_map(|entry| {
            let date = entry.get("asOfDate")?.as_str()?;
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            let value = entry.get("reportedValue")?.get("raw")?.as_f64()?;
            Some((date, value))
        })
        .collect()
}

/// Line items down the side, reporting dates across the top, newest first.
fn statement_frame<'a>(items: impl Iterator<Item = (&'a str, &'a Points)>) -> Frame {
    let items: Vec<(&str, &Points)> = items.collect();
    let dates: BTreeSet<NaiveDate> = items
        .iter()
        .flat_map(|(_, points)| points.iter().map(|(date, _)| *date))
        .collect();
    let dates: Vec<NaiveDate> = dates.into_iter().rev().collect();

    let mut frame = Frame::indexed(None, dates.iter().copied());
    for (item, points) in items {
        let by_date: HashMap<NaiveDate, f64> = points.iter().copied().collect();
        let row = dates
            .iter()
            .map(|date| Value::Float(by_date.get(date).copied().unwrap_or(f64::NAN)))
            .collect();
        frame.push(title_case(item), row);
    }
    frame
}

/// `TotalRevenue` -> `Total Revenue`, `DilutedEPS` -> `Diluted EPS`; acronyms stay whole.
pub fn title_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}
