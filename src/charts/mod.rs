//! Charts module - Profile chart layout and rendering

mod backend;
mod layout;
mod renderer;
mod request;

pub use backend::LabelSafeBackend;
pub use layout::{ChartLayout, ErrorBar, Label, LabelKind, Marker};
pub use renderer::StaticChartRenderer;
pub use request::{AxisConfig, ChartMode, ChartRequest, RenderedChart, ScoreBounds};
