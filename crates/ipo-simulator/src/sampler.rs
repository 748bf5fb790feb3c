use forecast_core::{CompetitionImpact, ForecastError, ScenarioKind, ScenarioSet};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Number of draws the dashboard runs per evaluation.
pub const DEFAULT_RUNS: usize = 5000;

/// Sampled IPO prices after the competition discount, in draw order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub prices: Vec<f64>,
    /// Draws per scenario, indexed Bear, Base, Bull
    pub scenario_counts: [usize; 3],
    pub impact: CompetitionImpact,
    pub seed: Option<u64>,
}

impl SimulationResult {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Arithmetic mean of the sampled prices (the "expected IPO price").
    pub fn mean(&self) -> f64 {
        if self.prices.is_empty() {
            return 0.0;
        }
        self.prices.iter().sum::<f64>() / self.prices.len() as f64
    }

    /// Share of draws that landed on each scenario.
    pub fn frequencies(&self) -> [f64; 3] {
        let n = self.prices.len().max(1) as f64;
        self.scenario_counts.map(|c| c as f64 / n)
    }

    pub fn count_for(&self, kind: ScenarioKind) -> usize {
        self.scenario_counts[kind.index()]
    }
}

/// Draw `runs` scenario outcomes and return the discounted price of each.
///
/// Each draw picks Bear, Base or Bull with probability equal to its weight.
/// The three discounted prices are computed up front, so every sample is
/// bit-for-bit one of them.
pub fn simulate_prices<R: Rng + ?Sized>(
    set: &ScenarioSet,
    impact: CompetitionImpact,
    runs: usize,
    rng: &mut R,
) -> Result<SimulationResult, ForecastError> {
    if runs == 0 {
        return Err(ForecastError::InvalidInput(
            "simulation needs at least one run".to_string(),
        ));
    }

    let weights = set.probabilities();
    let chooser = WeightedIndex::new(&weights)
        .map_err(|e| ForecastError::InvalidDistribution(e.to_string()))?;
    let adjusted = set.adjusted_prices(impact);

    let mut prices = Vec::with_capacity(runs);
    let mut scenario_counts = [0usize; 3];
    for _ in 0..runs {
        let idx = chooser.sample(rng);
        scenario_counts[idx] += 1;
        prices.push(adjusted[idx]);
    }

    tracing::debug!(
        runs,
        bear = scenario_counts[0],
        base = scenario_counts[1],
        bull = scenario_counts[2],
        "Scenario sampling complete"
    );

    Ok(SimulationResult {
        prices,
        scenario_counts,
        impact,
        seed: None,
    })
}

/// Reproducible variant of [`simulate_prices`] driven by a seeded `StdRng`.
pub fn simulate_seeded(
    set: &ScenarioSet,
    impact: CompetitionImpact,
    runs: usize,
    seed: u64,
) -> Result<SimulationResult, ForecastError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut result = simulate_prices(set, impact, runs, &mut rng)?;
    result.seed = Some(seed);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_core::ScenarioPrices;

    fn default_set() -> ScenarioSet {
        ScenarioSet::from_two(0.2, 0.5, ScenarioPrices::default()).unwrap()
    }

    #[test]
    fn test_samples_are_exact_scenario_prices() {
        let set = default_set();
        for impact in CompetitionImpact::ALL {
            let allowed = set.adjusted_prices(impact);
            let result = simulate_seeded(&set, impact, 2000, 7).unwrap();
            assert_eq!(result.len(), 2000);
            assert!(result.prices.iter().all(|p| allowed.contains(p)));
        }
    }

    #[test]
    fn test_frequencies_converge_to_probabilities() {
        let set = ScenarioSet::new(ScenarioPrices::default(), [0.25, 0.35, 0.4]).unwrap();
        let result = simulate_seeded(&set, CompetitionImpact::Low, 100_000, 42).unwrap();

        for (freq, p) in result.frequencies().iter().zip(set.probabilities()) {
            assert!((freq - p).abs() < 0.01, "frequency {} vs probability {}", freq, p);
        }
        assert_eq!(result.scenario_counts.iter().sum::<usize>(), 100_000);
    }

    #[test]
    fn test_mean_near_analytic_expectation() {
        let set = default_set();
        let result = simulate_seeded(&set, CompetitionImpact::Low, DEFAULT_RUNS, 2025).unwrap();

        // 0.2*50 + 0.5*90 + 0.3*120 = 91, sampling sd is about 0.34
        assert!((result.mean() - 91.0).abs() < 2.0, "mean was {}", result.mean());
    }

    #[test]
    fn test_discount_shifts_mean() {
        let set = default_set();
        let low = simulate_seeded(&set, CompetitionImpact::Low, DEFAULT_RUNS, 9).unwrap();
        let high = simulate_seeded(&set, CompetitionImpact::High, DEFAULT_RUNS, 9).unwrap();

        // Same seed, same scenario picks, so the ratio is exact up to rounding
        assert!((high.mean() - low.mean() * 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weight_scenario_never_drawn() {
        let set = ScenarioSet::from_two(0.0, 1.0, ScenarioPrices::default()).unwrap();
        let result = simulate_seeded(&set, CompetitionImpact::Low, 5000, 1).unwrap();
        assert_eq!(result.count_for(ScenarioKind::Base), 5000);
        assert!(result.prices.iter().all(|&p| p == 90.0));
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let set = default_set();
        let a = simulate_seeded(&set, CompetitionImpact::Moderate, 500, 11).unwrap();
        let b = simulate_seeded(&set, CompetitionImpact::Moderate, 500, 11).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.seed, Some(11));
    }

    #[test]
    fn test_zero_runs_rejected() {
        let set = default_set();
        let err = simulate_seeded(&set, CompetitionImpact::Low, 0, 1).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }
}
