//! Render options: figure sizes, output naming and font.

use serde::{Deserialize, Serialize};

/// Default filename prefix for exported charts
pub const DEFAULT_FILE_PREFIX: &str = "wais-iv";

/// Pixel dimensions of a rendered figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureSize {
    pub width: u32,
    pub height: u32,
}

impl FigureSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// 12 x 6 inches at 100 px/in
    pub subtest_size: FigureSize,
    /// 5 x 6 inches at 100 px/in
    pub composite_size: FigureSize,
    pub file_prefix: String,
    pub font_family: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            subtest_size: FigureSize::new(1200, 600),
            composite_size: FigureSize::new(500, 600),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            font_family: "sans-serif".to_string(),
        }
    }
}
