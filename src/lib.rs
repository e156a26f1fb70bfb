//! WAIS-IV Profile Charts
//!
//! Renders the subtest scaled-score profile and the composite score profile
//! of a WAIS-IV report as PNG images.

pub mod charts;
pub mod config;
pub mod data;
pub mod error;

pub use charts::{ChartMode, ChartRequest, RenderedChart, StaticChartRenderer};
pub use config::RenderOptions;
pub use data::ScoreSheet;
pub use error::ChartError;
