use crate::error::ProviderError;
use crate::value::{Frame, Series, Value};
use async_trait::async_trait;

/// Source of financial data for a ticker symbol.
///
/// Implementations make every upstream call they need inside one method call; callers
/// never see partial bundles.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Every field served by `/stock`, for one symbol.
    async fn fetch_ticker(&self, symbol: &str) -> Result<FieldBundle, ProviderError>;

    /// Daily price history covering `period` (e.g. `1d`, `5d`, `1mo`, `max`).
    async fn fetch_history(&self, symbol: &str, period: &str) -> Result<Frame, ProviderError>;
}

/// The fields a provider returns for one ticker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBundle {
    pub info: Value,
    pub calendar: Value,
    pub balance_sheet: Frame,
    pub income_stmt: Frame,
    pub ttm_income_stmt: Frame,
    pub quarterly_income_stmt: Frame,
    pub cash_flow: Frame,
    pub ttm_cash_flow: Frame,
    pub quarterly_cash_flow: Frame,
    pub dividends: Series,
    pub splits: Series,
    pub actions: Frame,
    pub recommendations: Frame,
    pub history: Frame,
    pub sustainability: Frame,
    pub institutional_holders: Frame,
    pub mutualfund_holders: Frame,
}

impl FieldBundle {
    /// `info["currentPrice"]`, or [`Value::Absent`].
    pub fn current_price(&self) -> Value {
        self.info.get("currentPrice").cloned().unwrap_or_default()
    }

    /// The named response fields, `cmp` first, in response order.
    pub fn into_fields(self) -> Vec<(&'static str, Value)> {
        let cmp = self.current_price();
        vec![
            ("cmp", cmp),
            ("info", self.info),
            ("calendar", self.calendar),
            ("balance_sheet", self.balance_sheet.into()),
            ("income_stmt", self.income_stmt.into()),
            ("ttm_income_stmt", self.ttm_income_stmt.into()),
            ("quarterly_income_stmt", self.quarterly_income_stmt.into()),
            ("cash_flow", self.cash_flow.into()),
            ("ttm_cash_flow", self.ttm_cash_flow.into()),
            ("quarterly_cash_flow", self.quarterly_cash_flow.into()),
            ("dividends", self.dividends.into()),
            ("splits", self.splits.into()),
            ("actions", self.actions.into()),
            ("recommendations", self.recommendations.into()),
            ("history", self.history.into()),
            ("sustainability", self.sustainability.into()),
            ("institutional_holders", self.institutional_holders.into()),
            ("mutualfund_holders", self.mutualfund_holders.into()),
        ]
    }
}
