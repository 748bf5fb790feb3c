use forecast_core::ForecastError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// Compounded values of one series, one entry per year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthProjection {
    pub label: String,
    pub base: f64,
    pub rate: f64,
    pub values: Vec<YearValue>,
}

impl GrowthProjection {
    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.values.iter().find(|v| v.year == year).map(|v| v.value)
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.values.windows(2).all(|w| w[1].value > w[0].value)
    }
}

/// `base * (1 + rate)^(year - start_year)` for every year in `start_year..=end_year`.
pub fn project_growth(
    base: f64,
    rate: f64,
    start_year: i32,
    end_year: i32,
) -> Result<Vec<YearValue>, ForecastError> {
    if !base.is_finite() {
        return Err(ForecastError::InvalidInput(format!("base value {} is not finite", base)));
    }
    if !rate.is_finite() || rate <= -1.0 {
        return Err(ForecastError::InvalidInput(format!(
            "growth rate must be greater than -1, got {}",
            rate
        )));
    }
    if end_year < start_year {
        return Err(ForecastError::InvalidInput(format!(
            "end year {} is before start year {}",
            end_year, start_year
        )));
    }

    Ok((start_year..=end_year)
        .map(|year| YearValue {
            year,
            value: base * (1.0 + rate).powi(year - start_year),
        })
        .collect())
}

/// Fixed assumptions behind the market-cap forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAssumptions {
    /// Waymo shares outstanding after the IPO
    pub shares_outstanding: f64,
    /// Tesla autonomous-driving segment value in the start year
    pub tesla_av_base: f64,
    /// Tesla's growth rate relative to Waymo's
    pub tesla_rate_ratio: f64,
    pub start_year: i32,
    pub end_year: i32,
}

impl Default for ForecastAssumptions {
    fn default() -> Self {
        Self {
            shares_outstanding: 500_000_000.0,
            tesla_av_base: 300e9,
            tesla_rate_ratio: 0.8,
            start_year: 2025,
            end_year: 2030,
        }
    }
}

/// Waymo market cap and Tesla AV segment value, year by year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCapForecast {
    pub waymo: GrowthProjection,
    pub tesla_av: GrowthProjection,
}

impl MarketCapForecast {
    pub const WAYMO_LABEL: &'static str = "Waymo Market Cap";
    pub const TESLA_LABEL: &'static str = "Tesla AV Segment";

    /// Project both series from the expected IPO price.
    ///
    /// `adoption_speed` is a percentage: 20 means 20% annual growth for
    /// Waymo and 16% for Tesla's AV segment with the default ratio.
    pub fn build(
        expected_price: f64,
        adoption_speed: u32,
        assumptions: &ForecastAssumptions,
    ) -> Result<Self, ForecastError> {
        let waymo_rate = adoption_speed as f64 / 100.0;
        let tesla_rate = adoption_speed as f64 * assumptions.tesla_rate_ratio / 100.0;
        let waymo_base = expected_price * assumptions.shares_outstanding;

        let waymo = GrowthProjection {
            label: Self::WAYMO_LABEL.to_string(),
            base: waymo_base,
            rate: waymo_rate,
            values: project_growth(waymo_base, waymo_rate, assumptions.start_year, assumptions.end_year)?,
        };
        let tesla_av = GrowthProjection {
            label: Self::TESLA_LABEL.to_string(),
            base: assumptions.tesla_av_base,
            rate: tesla_rate,
            values: project_growth(
                assumptions.tesla_av_base,
                tesla_rate,
                assumptions.start_year,
                assumptions.end_year,
            )?,
        };

        Ok(Self { waymo, tesla_av })
    }

    pub fn years(&self) -> Vec<i32> {
        self.waymo.values.iter().map(|v| v.year).collect()
    }
}
