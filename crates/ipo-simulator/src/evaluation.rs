use forecast_core::{DashboardInputs, ForecastError};

use crate::projection::{ForecastAssumptions, MarketCapForecast};
use crate::sampler::{simulate_seeded, SimulationResult, DEFAULT_RUNS};
use crate::stats::{Histogram, PriceSummary, DEFAULT_BINS};

/// Knobs that are not dashboard controls
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub runs: usize,
    pub bins: usize,
    pub assumptions: ForecastAssumptions,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            bins: DEFAULT_BINS,
            assumptions: ForecastAssumptions::default(),
        }
    }
}

/// Everything the dashboard shows that is derived from the controls
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub inputs: DashboardInputs,
    pub bull_probability: f64,
    /// Mean of the sampled prices
    pub expected_price: f64,
    /// Probability-weighted discounted price, for comparison with the sample mean
    pub analytic_expected_price: f64,
    pub simulation: SimulationResult,
    pub summary: PriceSummary,
    pub histogram: Histogram,
    pub forecast: MarketCapForecast,
}

/// Run the full pipeline for one set of control values.
///
/// Pure apart from the RNG, which is seeded from `seed`.
pub fn evaluate(
    inputs: &DashboardInputs,
    settings: &SimulationSettings,
    seed: u64,
) -> Result<Evaluation, ForecastError> {
    let set = inputs.scenario_set()?;
    let bull_probability = inputs.bull_probability()?;

    let simulation = simulate_seeded(&set, inputs.impact, settings.runs, seed)?;
    let summary = PriceSummary::from_samples(&simulation.prices)?;
    let histogram = Histogram::from_samples(&simulation.prices, settings.bins)?;
    let expected_price = summary.mean;
    let forecast = MarketCapForecast::build(expected_price, inputs.adoption_speed, &settings.assumptions)?;

    tracing::debug!(
        seed,
        runs = settings.runs,
        expected_price,
        impact = %inputs.impact,
        "Evaluated IPO scenarios"
    );

    Ok(Evaluation {
        inputs: inputs.clone(),
        bull_probability,
        expected_price,
        analytic_expected_price: inputs.impact.apply(set.expected_price()),
        simulation,
        summary,
        histogram,
        forecast,
    })
}
