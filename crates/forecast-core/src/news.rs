//! Static headline list shown under the charts.
//!
//! Sample data only; nothing here is fetched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub date: NaiveDate,
}

impl NewsItem {
    fn new(headline: &str, year: i32, month: u32, day: u32) -> Option<Self> {
        Some(Self {
            headline: headline.to_string(),
            date: NaiveDate::from_ymd_opt(year, month, day)?,
        })
    }
}

/// The three sample headlines, newest first.
pub fn sample_headlines() -> Vec<NewsItem> {
    [
        NewsItem::new("Waymo expands robotaxi service to Washington D.C. in 2026", 2025, 8, 1),
        NewsItem::new("Tesla Robotaxi faces NHTSA probe after erratic test drives", 2025, 7, 20),
        NewsItem::new("Waymo valuation tops $45B after funding round", 2024, 10, 15),
    ]
    .into_iter()
    .flatten()
    .collect()
}
