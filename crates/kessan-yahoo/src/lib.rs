//! Yahoo Finance implementation of [`kessan_core::Provider`].
//!
//! Every field comes from one of four endpoints of Yahoo's JSON API:
//! `quoteSummary` (profile, calendar, analysts, ESG, ownership), `fundamentals-timeseries`
//! (financial statements), `chart` (prices, dividends, splits) and `getcrumb` (session).

pub mod chart;
pub mod client;
pub mod config;
pub mod http;
pub mod summary;
pub mod timeseries;

pub use client::Yahoo;
pub use config::YahooConfig;
