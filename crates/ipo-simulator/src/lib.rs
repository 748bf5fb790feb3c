//! IPO Simulator
//!
//! Monte Carlo sampling over the Bear/Base/Bull pricing scenarios, summary
//! statistics of the sampled prices, and the compound-growth market-cap
//! projection built on top of the expected price.

pub mod evaluation;
pub mod projection;
pub mod sampler;
pub mod stats;

pub use evaluation::{evaluate, Evaluation, SimulationSettings};
pub use projection::{project_growth, ForecastAssumptions, GrowthProjection, MarketCapForecast, YearValue};
pub use sampler::{simulate_prices, simulate_seeded, SimulationResult, DEFAULT_RUNS};
pub use stats::{Histogram, HistogramBin, PriceSummary, DEFAULT_BINS};
