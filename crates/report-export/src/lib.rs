//! Report Export
//!
//! Turns a simulation into artifacts a browser can download or display:
//! the sampled-price CSV and the two SVG charts.

pub mod charts;
pub mod csv_export;
pub mod error;

pub use charts::{distribution_chart_svg, forecast_chart_svg};
pub use csv_export::{parse_simulation_csv, simulation_csv, CSV_FILE_NAME, CSV_MIME, PRICE_COLUMN};
pub use error::ExportError;
