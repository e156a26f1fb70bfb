//! Error types for chart requests and rendering.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("{item} {field} {value} is outside the allowed range {min}..={max}")]
    InvalidInput {
        item: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Subtest profile requires a category grouping")]
    MissingGrouping,
    #[error("Invalid category grouping: {0}")]
    InvalidGrouping(String),
    #[error("Duplicate item in score series: {0}")]
    DuplicateItem(String),
    #[error("Invalid axis configuration: {0}")]
    InvalidAxis(String),
    #[error("Unknown chart mode: {0:?}")]
    UnknownMode(String),
    #[error("Failed to draw chart: {0}")]
    Render(String),
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Converts a plotters drawing error into a [`ChartError::Render`].
pub(crate) fn render_err(err: impl std::fmt::Display) -> ChartError {
    ChartError::Render(err.to_string())
}
