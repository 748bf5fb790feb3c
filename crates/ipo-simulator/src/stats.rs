//! Summary statistics for the sampled price distribution.
//!
//! `PriceSummary` feeds the box-plot strip and the headline metric,
//! `Histogram` feeds the bar chart underneath it.

use forecast_core::ForecastError;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Bin count used by the price distribution chart.
pub const DEFAULT_BINS: usize = 30;

/// Tukey fence multiplier for outlier detection.
const FENCE_MULTIPLIER: f64 = 1.5;

/// Five-number summary plus outliers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Smallest sample inside the fences
    pub whisker_low: f64,
    /// Largest sample inside the fences
    pub whisker_high: f64,
    /// Distinct values outside the fences, ascending
    pub outliers: Vec<f64>,
}

impl PriceSummary {
    pub fn from_samples(samples: &[f64]) -> Result<Self, ForecastError> {
        if samples.is_empty() {
            return Err(ForecastError::InsufficientData(
                "no samples to summarize".to_string(),
            ));
        }
        if samples.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidInput(
                "samples contain non-finite values".to_string(),
            ));
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let lower_fence = q1 - FENCE_MULTIPLIER * iqr;
        let upper_fence = q3 + FENCE_MULTIPLIER * iqr;

        let inside = || sorted.iter().copied().filter(|v| (lower_fence..=upper_fence).contains(v));
        // Quartiles always lie within the fences, so `inside` is never empty
        let whisker_low = inside().next().unwrap_or(q1);
        let whisker_high = inside().last().unwrap_or(q3);

        let mut outliers: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|v| *v < lower_fence || *v > upper_fence)
            .collect();
        outliers.dedup();

        Ok(Self {
            count: sorted.len(),
            mean: samples.mean(),
            std_dev: if samples.len() > 1 { samples.population_std_dev() } else { 0.0 },
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[sorted.len() - 1],
            lower_fence,
            upper_fence,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

/// Linear-interpolation quantile of already sorted data, `p` in [0, 1].
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let last = sorted.len() - 1;
    let pos = p.clamp(0.0, 1.0) * last as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper.min(last)] - sorted[lower]) * weight
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width frequency histogram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Bin `samples` into `bins` equal-width buckets spanning `[min, max]`.
    ///
    /// Buckets are half-open except the last, which also takes `max`.
    /// A degenerate range (all samples equal) is widened by 0.5 either side.
    pub fn from_samples(samples: &[f64], bins: usize) -> Result<Self, ForecastError> {
        if bins == 0 {
            return Err(ForecastError::InvalidInput(
                "histogram needs at least one bin".to_string(),
            ));
        }
        if samples.is_empty() {
            return Err(ForecastError::InsufficientData(
                "no samples to bin".to_string(),
            ));
        }

        let (mut lo, mut hi) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if !lo.is_finite() || !hi.is_finite() {
            return Err(ForecastError::InvalidInput(
                "samples contain non-finite values".to_string(),
            ));
        }
        if hi - lo <= f64::EPSILON * hi.abs().max(1.0) {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let mut counts = vec![0usize; bins];
        for &v in samples {
            let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: lo + width * i as f64,
                upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
                count,
            })
            .collect();

        Ok(Self { bins })
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_summary_quartiles() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let s = PriceSummary::from_samples(&samples).unwrap();

        assert_eq!(s.count, 9);
        assert_relative_eq!(s.mean, 5.0);
        assert_relative_eq!(s.q1, 3.0);
        assert_relative_eq!(s.median, 5.0);
        assert_relative_eq!(s.q3, 7.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 9.0);
        assert!(s.outliers.is_empty());
        assert_eq!(s.whisker_low, 1.0);
        assert_eq!(s.whisker_high, 9.0);
    }

    #[test]
    fn test_summary_interpolates_between_samples() {
        let s = PriceSummary::from_samples(&[10.0, 20.0, 30.0, 40.0]).unwrap();
        assert_relative_eq!(s.median, 25.0);
        assert_relative_eq!(s.q1, 17.5);
        assert_relative_eq!(s.q3, 32.5);
    }

    #[test]
    fn test_summary_flags_outliers() {
        let mut samples = vec![90.0; 80];
        samples.extend(vec![120.0; 15]);
        samples.extend(vec![50.0; 5]);
        let s = PriceSummary::from_samples(&samples).unwrap();

        // q1 = q3 = 90, so both tails fall outside the fences
        assert_eq!(s.q1, 90.0);
        assert_eq!(s.q3, 90.0);
        assert_eq!(s.outliers, vec![50.0, 120.0]);
        assert_eq!(s.whisker_low, 90.0);
        assert_eq!(s.whisker_high, 90.0);
    }

    #[test]
    fn test_summary_population_std_dev() {
        let s = PriceSummary::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_relative_eq!(s.std_dev, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_summary_single_sample() {
        let s = PriceSummary::from_samples(&[42.0]).unwrap();
        assert_eq!(s.median, 42.0);
        assert_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn test_summary_empty() {
        assert!(matches!(
            PriceSummary::from_samples(&[]),
            Err(ForecastError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_histogram_counts_every_sample() {
        let samples: Vec<f64> = (0..1000).map(|i| (i % 97) as f64 * 1.5).collect();
        let h = Histogram::from_samples(&samples, DEFAULT_BINS).unwrap();
        assert_eq!(h.bins.len(), DEFAULT_BINS);
        assert_eq!(h.total(), 1000);
        assert_eq!(h.bins.first().unwrap().lower, 0.0);
        assert_eq!(h.bins.last().unwrap().upper, 96.0 * 1.5);
    }

    #[test]
    fn test_histogram_max_lands_in_last_bin() {
        let h = Histogram::from_samples(&[50.0, 90.0, 120.0], 7).unwrap();
        assert_eq!(h.bins[0].count, 1);
        assert_eq!(h.bins[6].count, 1);
        assert_eq!(h.total(), 3);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let h = Histogram::from_samples(&[90.0; 10], 30).unwrap();
        assert_eq!(h.total(), 10);
        assert_relative_eq!(h.bins[0].lower, 89.5);
        assert_relative_eq!(h.bins[29].upper, 90.5);
        assert_eq!(h.max_count(), 10);
    }

    #[test]
    fn test_histogram_rejects_zero_bins() {
        assert!(Histogram::from_samples(&[1.0], 0).is_err());
    }
}
