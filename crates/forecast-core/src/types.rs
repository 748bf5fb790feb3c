use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ForecastError;

/// Slack allowed when checking that probabilities sum to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

pub const PRICE_MIN: u32 = 10;
pub const PRICE_MAX: u32 = 200;
pub const ADOPTION_SPEED_MIN: u32 = 5;
pub const ADOPTION_SPEED_MAX: u32 = 50;
/// Slider step for the two probability controls (not enforced server-side).
pub const PROBABILITY_STEP: f64 = 0.05;

/// One of the three IPO pricing outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScenarioKind {
    Bear,
    Base,
    Bull,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [ScenarioKind::Bear, ScenarioKind::Base, ScenarioKind::Bull];

    pub fn index(&self) -> usize {
        match self {
            ScenarioKind::Bear => 0,
            ScenarioKind::Base => 1,
            ScenarioKind::Bull => 2,
        }
    }
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioKind::Bear => write!(f, "Bear"),
            ScenarioKind::Base => write!(f, "Base"),
            ScenarioKind::Bull => write!(f, "Bull"),
        }
    }
}

/// A pricing outcome with its IPO price and probability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub price: u32,
    pub probability: f64,
}

/// Per-scenario IPO prices in dollars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPrices {
    pub bear: u32,
    pub base: u32,
    pub bull: u32,
}

impl ScenarioPrices {
    pub fn get(&self, kind: ScenarioKind) -> u32 {
        match kind {
            ScenarioKind::Bear => self.bear,
            ScenarioKind::Base => self.base,
            ScenarioKind::Bull => self.bull,
        }
    }
}

impl Default for ScenarioPrices {
    fn default() -> Self {
        Self { bear: 50, base: 90, bull: 120 }
    }
}

/// Bear, Base and Bull scenarios whose probabilities form a distribution.
///
/// Construction is the only place the distribution is checked, so every
/// `ScenarioSet` in circulation has non-negative weights summing to one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSet {
    scenarios: [Scenario; 3],
}

impl ScenarioSet {
    /// Build from explicit probabilities in Bear, Base, Bull order.
    pub fn new(prices: ScenarioPrices, probabilities: [f64; 3]) -> Result<Self, ForecastError> {
        for (kind, p) in ScenarioKind::ALL.iter().zip(probabilities) {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(ForecastError::InvalidDistribution(format!(
                    "{} probability {} is outside [0, 1]",
                    kind, p
                )));
            }
        }

        let total: f64 = probabilities.iter().sum();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ForecastError::InvalidDistribution(format!(
                "probabilities sum to {:.4}, expected 1",
                total
            )));
        }

        let scenarios = ScenarioKind::ALL.map(|kind| Scenario {
            kind,
            price: prices.get(kind),
            probability: probabilities[kind.index()],
        });

        Ok(Self { scenarios })
    }

    /// Build from the two slider values, deriving Bull as the remainder.
    ///
    /// Fails instead of clamping when Bear + Base exceeds one.
    pub fn from_two(
        bear_probability: f64,
        base_probability: f64,
        prices: ScenarioPrices,
    ) -> Result<Self, ForecastError> {
        let bull = derive_bull_probability(bear_probability, base_probability)?;
        Self::new(prices, [bear_probability, base_probability, bull])
    }

    pub fn scenarios(&self) -> &[Scenario; 3] {
        &self.scenarios
    }

    pub fn get(&self, kind: ScenarioKind) -> &Scenario {
        &self.scenarios[kind.index()]
    }

    pub fn probabilities(&self) -> [f64; 3] {
        self.scenarios.map(|s| s.probability)
    }

    /// Price of each scenario after the competition discount.
    pub fn adjusted_prices(&self, impact: CompetitionImpact) -> [f64; 3] {
        self.scenarios.map(|s| impact.apply(s.price as f64))
    }

    /// Probability-weighted price before any discount.
    pub fn expected_price(&self) -> f64 {
        self.scenarios
            .iter()
            .map(|s| s.probability * s.price as f64)
            .sum()
    }
}

/// Remaining probability mass for the Bull case.
pub fn derive_bull_probability(bear: f64, base: f64) -> Result<f64, ForecastError> {
    let bull = 1.0 - bear - base;
    if !bull.is_finite() || bull < -PROBABILITY_TOLERANCE {
        return Err(ForecastError::InvalidDistribution(format!(
            "bear ({}) + base ({}) probabilities exceed 1",
            bear, base
        )));
    }
    // Absorb rounding residue just below zero
    Ok(bull.max(0.0))
}

/// Discount applied to the IPO price for Tesla's competitive pressure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionImpact {
    #[default]
    Low,
    Moderate,
    High,
}

impl CompetitionImpact {
    pub const ALL: [CompetitionImpact; 3] = [
        CompetitionImpact::Low,
        CompetitionImpact::Moderate,
        CompetitionImpact::High,
    ];

    /// Multiplicative adjustment, e.g. -0.15 for a 15% haircut.
    pub fn factor(&self) -> f64 {
        match self {
            CompetitionImpact::Low => 0.0,
            CompetitionImpact::Moderate => -0.15,
            CompetitionImpact::High => -0.3,
        }
    }

    /// Short form used in query strings.
    pub fn key(&self) -> &'static str {
        match self {
            CompetitionImpact::Low => "low",
            CompetitionImpact::Moderate => "moderate",
            CompetitionImpact::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompetitionImpact::Low => "Low Impact (0%)",
            CompetitionImpact::Moderate => "Moderate Impact (-15%)",
            CompetitionImpact::High => "High Impact (-30%)",
        }
    }

    pub fn apply(&self, price: f64) -> f64 {
        price * (1.0 + self.factor())
    }
}

impl std::fmt::Display for CompetitionImpact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for CompetitionImpact {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        CompetitionImpact::ALL
            .into_iter()
            .find(|impact| {
                trimmed.eq_ignore_ascii_case(impact.key())
                    || trimmed.eq_ignore_ascii_case(impact.label())
            })
            .ok_or_else(|| {
                ForecastError::InvalidInput(format!(
                    "unknown competition impact '{}' (expected low, moderate or high)",
                    s
                ))
            })
    }
}

/// Values of the dashboard controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardInputs {
    pub bear_probability: f64,
    pub base_probability: f64,
    pub prices: ScenarioPrices,
    pub impact: CompetitionImpact,
    /// Expected 2030 AV penetration in percent, doubles as the growth rate
    pub adoption_speed: u32,
}

impl Default for DashboardInputs {
    fn default() -> Self {
        Self {
            bear_probability: 0.2,
            base_probability: 0.5,
            prices: ScenarioPrices::default(),
            impact: CompetitionImpact::Low,
            adoption_speed: 20,
        }
    }
}

impl DashboardInputs {
    /// Check every control against its widget bounds.
    pub fn validate(&self) -> Result<(), ForecastError> {
        for (field, value) in [
            ("bear_prob", self.bear_probability),
            ("base_prob", self.base_probability),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ForecastError::InvalidInput(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    field, value
                )));
            }
        }

        for kind in ScenarioKind::ALL {
            let price = self.prices.get(kind);
            if !(PRICE_MIN..=PRICE_MAX).contains(&price) {
                return Err(ForecastError::InvalidInput(format!(
                    "{}_price must be between {} and {}, got {}",
                    kind.to_string().to_lowercase(),
                    PRICE_MIN,
                    PRICE_MAX,
                    price
                )));
            }
        }

        if !(ADOPTION_SPEED_MIN..=ADOPTION_SPEED_MAX).contains(&self.adoption_speed) {
            return Err(ForecastError::InvalidInput(format!(
                "adoption_speed must be between {} and {}, got {}",
                ADOPTION_SPEED_MIN, ADOPTION_SPEED_MAX, self.adoption_speed
            )));
        }

        Ok(())
    }

    pub fn bull_probability(&self) -> Result<f64, ForecastError> {
        derive_bull_probability(self.bear_probability, self.base_probability)
    }

    pub fn scenario_set(&self) -> Result<ScenarioSet, ForecastError> {
        self.validate()?;
        ScenarioSet::from_two(self.bear_probability, self.base_probability, self.prices)
    }
}

/// Most recent daily close for a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestQuote {
    pub ticker: String,
    pub close: f64,
    pub as_of: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_two_derives_bull() {
        let set = ScenarioSet::from_two(0.2, 0.5, ScenarioPrices::default()).unwrap();
        assert_relative_eq!(set.get(ScenarioKind::Bull).probability, 0.3, epsilon = 1e-12);
        assert_eq!(set.get(ScenarioKind::Bull).price, 120);
    }

    #[test]
    fn test_from_two_rejects_overfull_distribution() {
        let err = ScenarioSet::from_two(0.6, 0.5, ScenarioPrices::default()).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidDistribution(_)));
    }

    #[test]
    fn test_from_two_snaps_rounding_residue() {
        assert_eq!(derive_bull_probability(0.5, 0.5 + 1e-12).unwrap(), 0.0);

        // Every slider pair on the 0.05 grid that fills the distribution
        for step in 0..=20 {
            let bear = step as f64 * PROBABILITY_STEP;
            let base = 1.0 - bear;
            let set = ScenarioSet::from_two(bear, base, ScenarioPrices::default()).unwrap();
            let bull = set.get(ScenarioKind::Bull).probability;
            assert!((0.0..1e-12).contains(&bull), "bear={} bull={}", bear, bull);
        }
    }

    #[test]
    fn test_new_rejects_negative_weight() {
        let err = ScenarioSet::new(ScenarioPrices::default(), [0.6, 0.6, -0.2]).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidDistribution(_)));
    }

    #[test]
    fn test_new_rejects_bad_sum() {
        let err = ScenarioSet::new(ScenarioPrices::default(), [0.2, 0.2, 0.2]).unwrap_err();
        assert!(err.to_string().contains("sum"));
    }

    #[test]
    fn test_expected_price() {
        let set = ScenarioSet::from_two(0.2, 0.5, ScenarioPrices::default()).unwrap();
        assert_relative_eq!(set.expected_price(), 91.0, epsilon = 1e-9);
    }

    #[test]
    fn test_adjusted_prices() {
        let set = ScenarioSet::from_two(0.2, 0.5, ScenarioPrices::default()).unwrap();
        let adjusted = set.adjusted_prices(CompetitionImpact::High);
        assert_relative_eq!(adjusted[0], 35.0, epsilon = 1e-9);
        assert_relative_eq!(adjusted[2], 84.0, epsilon = 1e-9);
    }

    #[test]
    fn test_impact_parsing() {
        assert_eq!("moderate".parse::<CompetitionImpact>().unwrap(), CompetitionImpact::Moderate);
        assert_eq!("HIGH".parse::<CompetitionImpact>().unwrap(), CompetitionImpact::High);
        assert_eq!(
            "Low Impact (0%)".parse::<CompetitionImpact>().unwrap(),
            CompetitionImpact::Low
        );
        assert!("severe".parse::<CompetitionImpact>().is_err());
    }

    #[test]
    fn test_default_inputs_are_valid() {
        let inputs = DashboardInputs::default();
        assert!(inputs.validate().is_ok());
        assert_relative_eq!(inputs.bull_probability().unwrap(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_price_bounds() {
        let mut inputs = DashboardInputs::default();
        inputs.prices.bull = 201;
        let err = inputs.validate().unwrap_err();
        assert!(err.to_string().contains("bull_price"));

        inputs.prices.bull = 200;
        inputs.prices.bear = 9;
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_validate_adoption_bounds() {
        let mut inputs = DashboardInputs::default();
        inputs.adoption_speed = 4;
        assert!(inputs.validate().is_err());
        inputs.adoption_speed = 50;
        assert!(inputs.validate().is_ok());
    }

    #[test]
    fn test_validate_probability_bounds() {
        let mut inputs = DashboardInputs::default();
        inputs.base_probability = f64::NAN;
        assert!(matches!(inputs.validate(), Err(ForecastError::InvalidInput(_))));
        inputs.base_probability = 1.2;
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_scenario_set_checks_distribution_after_bounds() {
        let inputs = DashboardInputs {
            bear_probability: 0.65,
            base_probability: 0.65,
            ..DashboardInputs::default()
        };
        assert!(matches!(
            inputs.scenario_set(),
            Err(ForecastError::InvalidDistribution(_))
        ));
    }
}
