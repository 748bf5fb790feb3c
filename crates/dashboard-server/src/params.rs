//! Query-string form of the dashboard controls.

use axum::extract::{rejection::QueryRejection, Query};
use forecast_core::{CompetitionImpact, DashboardInputs, ForecastError, ScenarioPrices};
use serde::Deserialize;

use crate::AppError;

/// Every field is optional; missing ones take the dashboard defaults.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub bear_prob: Option<f64>,
    pub base_prob: Option<f64>,
    pub bear_price: Option<u32>,
    pub base_price: Option<u32>,
    pub bull_price: Option<u32>,
    pub impact: Option<String>,
    pub adoption_speed: Option<u32>,
    pub seed: Option<u64>,
}

impl DashboardQuery {
    /// Unwrap the extractor, turning malformed values into a 400 with the usual envelope.
    pub fn from_extractor(query: Result<Query<Self>, QueryRejection>) -> Result<Self, AppError> {
        query
            .map(|Query(q)| q)
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))
    }

    pub fn inputs(&self) -> Result<DashboardInputs, ForecastError> {
        let defaults = DashboardInputs::default();
        let impact = match self.impact.as_deref() {
            Some(raw) => raw.parse::<CompetitionImpact>()?,
            None => defaults.impact,
        };

        let inputs = DashboardInputs {
            bear_probability: self.bear_prob.unwrap_or(defaults.bear_probability),
            base_probability: self.base_prob.unwrap_or(defaults.base_probability),
            prices: ScenarioPrices {
                bear: self.bear_price.unwrap_or(defaults.prices.bear),
                base: self.base_price.unwrap_or(defaults.prices.base),
                bull: self.bull_price.unwrap_or(defaults.prices.bull),
            },
            impact,
            adoption_speed: self.adoption_speed.unwrap_or(defaults.adoption_speed),
        };
        inputs.validate()?;
        Ok(inputs)
    }

    /// Caller-supplied seed, or a fresh one small enough to survive a JavaScript number.
    pub fn seed_or_random(&self) -> u64 {
        self.seed.unwrap_or_else(|| u64::from(rand::random::<u32>()))
    }
}

/// Query string that reproduces `inputs` and `seed` on the other endpoints.
pub fn to_query_string(inputs: &DashboardInputs, seed: u64) -> String {
    format!(
        "bear_prob={}&base_prob={}&bear_price={}&base_price={}&bull_price={}&impact={}&adoption_speed={}&seed={}",
        inputs.bear_probability,
        inputs.base_probability,
        inputs.prices.bear,
        inputs.prices.base,
        inputs.prices.bull,
        inputs.impact.key(),
        inputs.adoption_speed,
        seed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_uses_defaults() {
        let inputs = DashboardQuery::default().inputs().unwrap();
        assert_eq!(inputs, DashboardInputs::default());
    }

    #[test]
    fn test_overrides() {
        let query = DashboardQuery {
            bear_prob: Some(0.1),
            impact: Some("moderate".into()),
            bull_price: Some(150),
            ..DashboardQuery::default()
        };
        let inputs = query.inputs().unwrap();
        assert_eq!(inputs.bear_probability, 0.1);
        assert_eq!(inputs.impact, CompetitionImpact::Moderate);
        assert_eq!(inputs.prices.bull, 150);
        assert_eq!(inputs.prices.bear, 50);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let query = DashboardQuery { adoption_speed: Some(51), ..DashboardQuery::default() };
        assert!(matches!(query.inputs(), Err(ForecastError::InvalidInput(_))));
    }

    #[test]
    fn test_seed_passthrough() {
        let query = DashboardQuery { seed: Some(123), ..DashboardQuery::default() };
        assert_eq!(query.seed_or_random(), 123);
        assert!(DashboardQuery::default().seed_or_random() <= u64::from(u32::MAX));
    }

    #[test]
    fn test_query_string_round_trip() {
        let inputs = DashboardInputs {
            impact: CompetitionImpact::High,
            ..DashboardInputs::default()
        };
        let qs = to_query_string(&inputs, 42);
        assert_eq!(
            qs,
            "bear_prob=0.2&base_prob=0.5&bear_price=50&base_price=90&bull_price=120&impact=high&adoption_speed=20&seed=42"
        );
    }
}
