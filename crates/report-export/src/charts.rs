//! SVG renderings of the price distribution and the market-cap forecast.

use ipo_simulator::{Histogram, MarketCapForecast, PriceSummary};
use plotters::prelude::*;
use std::error::Error;

use crate::ExportError;

const WIDTH: u32 = 900;
const DISTRIBUTION_HEIGHT: u32 = 560;
const FORECAST_HEIGHT: u32 = 480;
/// Height of the box-plot strip above the histogram
const BOX_STRIP_HEIGHT: u32 = 110;
const Y_LABEL_AREA: u32 = 70;

const BAR_COLOR: RGBColor = RGBColor(99, 110, 250);
const OUTLIER_COLOR: RGBColor = RGBColor(239, 85, 59);
const WAYMO_COLOR: RGBColor = RGBColor(99, 110, 250);
const TESLA_COLOR: RGBColor = RGBColor(239, 85, 59);

type DrawResult = Result<(), Box<dyn Error>>;

/// Histogram of sampled prices with a box-plot strip on top.
pub fn distribution_chart_svg(summary: &PriceSummary, histogram: &Histogram) -> Result<String, ExportError> {
    let mut svg = String::new();
    draw_distribution(&mut svg, summary, histogram).map_err(|e| ExportError::Chart(e.to_string()))?;
    tracing::debug!(bytes = svg.len(), bins = histogram.bins.len(), "Rendered distribution chart");
    Ok(svg)
}

/// Both market-cap series over the forecast years, in USD billions.
pub fn forecast_chart_svg(forecast: &MarketCapForecast) -> Result<String, ExportError> {
    let mut svg = String::new();
    draw_forecast(&mut svg, forecast).map_err(|e| ExportError::Chart(e.to_string()))?;
    tracing::debug!(bytes = svg.len(), "Rendered forecast chart");
    Ok(svg)
}

fn draw_distribution(svg: &mut String, summary: &PriceSummary, histogram: &Histogram) -> DrawResult {
    let (x_min, x_max) = match (histogram.bins.first(), histogram.bins.last()) {
        (Some(first), Some(last)) => (first.lower, last.upper),
        _ => return Err("histogram has no bins".into()),
    };
    let y_max = (histogram.max_count() as f64 * 1.1).max(1.0);

    let root = SVGBackend::with_string(svg, (WIDTH, DISTRIBUTION_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("IPO Price Distribution", ("sans-serif", 22))?;
    let (strip, main) = root.split_vertically(BOX_STRIP_HEIGHT);

    let mut chart = ChartBuilder::on(&main)
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Final Price")
        .y_desc("count")
        .draw()?;

    chart.draw_series(histogram.bins.iter().map(|bin| {
        Rectangle::new([(bin.lower, 0.0), (bin.upper, bin.count as f64)], BAR_COLOR.filled())
    }))?;

    // Same x mapping as the histogram so the box lines up with the bars
    let mut strip_chart = ChartBuilder::on(&strip)
        .margin(10)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_min..x_max, 0f64..1f64)?;

    strip_chart.draw_series([
        Rectangle::new([(summary.q1, 0.25), (summary.q3, 0.75)], BAR_COLOR.mix(0.3).filled()),
        Rectangle::new([(summary.q1, 0.25), (summary.q3, 0.75)], BAR_COLOR.stroke_width(2)),
    ])?;
    strip_chart.draw_series([
        PathElement::new(vec![(summary.median, 0.25), (summary.median, 0.75)], BAR_COLOR.stroke_width(3)),
        PathElement::new(vec![(summary.whisker_low, 0.5), (summary.q1, 0.5)], BAR_COLOR.stroke_width(2)),
        PathElement::new(vec![(summary.q3, 0.5), (summary.whisker_high, 0.5)], BAR_COLOR.stroke_width(2)),
        PathElement::new(vec![(summary.whisker_low, 0.35), (summary.whisker_low, 0.65)], BAR_COLOR.stroke_width(2)),
        PathElement::new(vec![(summary.whisker_high, 0.35), (summary.whisker_high, 0.65)], BAR_COLOR.stroke_width(2)),
    ])?;
    strip_chart.draw_series(
        summary
            .outliers
            .iter()
            .map(|&v| Circle::new((v, 0.5), 4, OUTLIER_COLOR.filled())),
    )?;

    root.present()?;
    Ok(())
}

fn draw_forecast(svg: &mut String, forecast: &MarketCapForecast) -> DrawResult {
    let years = forecast.years();
    let (start, end) = match (years.first(), years.last()) {
        (Some(&s), Some(&e)) if e > s => (s, e),
        (Some(&s), Some(_)) => (s, s + 1),
        _ => return Err("forecast has no years".into()),
    };

    let series = [(&forecast.waymo, WAYMO_COLOR), (&forecast.tesla_av, TESLA_COLOR)];
    let peak = series
        .iter()
        .flat_map(|(p, _)| p.values.iter().map(|v| v.value / 1e9))
        .fold(0.0_f64, f64::max);
    let y_max = (peak * 1.1).max(1.0);

    let root = SVGBackend::with_string(svg, (WIDTH, FORECAST_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Long-term Market Cap Forecast ({}-{})", start, end),
            ("sans-serif", 22),
        )
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(start..end, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_labels(years.len())
        .x_label_formatter(&|year| year.to_string())
        .y_label_formatter(&|v| format!("${:.0}B", v))
        .x_desc("Year")
        .draw()?;

    for (projection, color) in series {
        let points: Vec<(i32, f64)> = projection
            .values
            .iter()
            .map(|v| (v.year, v.value / 1e9))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
            .label(projection.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
