//! Chart Layout Module
//! Computes every plotted element of a profile chart in data coordinates.
//!
//! Subtest profile:
//! - one x slot per subtest, in domain order
//! - domain dividers between groups, subtest labels and domain labels in the
//!   headroom above the highest scaled score
//!
//! Composite profile:
//! - four connected index scores, then FSIQ set off by a divider
//! - mean line at 100, category labels under the plot

use crate::charts::request::{ChartMode, ChartRequest};
use crate::data::{CategoryGrouping, ScoreItem};
use crate::error::ChartError;
use tracing::debug;

/// Headroom above the axis maximum reserved for the two label rows
pub const LABEL_HEADROOM: f64 = 2.4;
/// Item labels sit halfway into the headroom (20.2 on the scaled-score axis)
pub const ITEM_LABEL_OFFSET: f64 = 1.2;

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub item: String,
    pub x: f64,
    pub y: f64,
}

/// Symmetric error bar from `low` to `high` at `x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorBar {
    pub x: f64,
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Subtest name above the plot
    Item,
    /// Domain name above the item row, bold
    Group,
    /// Category name under the x axis
    Category,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub kind: LabelKind,
}

/// Immutable description of one chart, ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub mode: ChartMode,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub markers: Vec<Marker>,
    pub error_bars: Vec<ErrorBar>,
    /// Polylines through consecutive present values; absent values break a run
    pub lines: Vec<Vec<(f64, f64)>>,
    pub band: (f64, f64),
    pub mean_line: Option<f64>,
    pub grid_lines: Vec<f64>,
    pub y_ticks: Vec<f64>,
    pub dividers: Vec<f64>,
    pub labels: Vec<Label>,
}

impl ChartLayout {
    /// Validate the request and lay out the chart for its mode.
    pub fn compute(request: &ChartRequest) -> Result<Self, ChartError> {
        request.validate()?;

        let layout = match request.mode {
            ChartMode::SubtestProfile => {
                let grouping = request
                    .grouping
                    .as_ref()
                    .ok_or(ChartError::MissingGrouping)?;
                Self::subtest_profile(request, grouping)
            }
            ChartMode::CompositeProfile => Self::composite_profile(request),
        };

        debug!(
            mode = %layout.mode,
            markers = layout.markers.len(),
            lines = layout.lines.len(),
            dividers = layout.dividers.len(),
            "chart layout computed"
        );
        Ok(layout)
    }

    fn empty(request: &ChartRequest, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        let axis = &request.axis;
        Self {
            mode: request.mode,
            x_range,
            y_range,
            markers: Vec::new(),
            error_bars: Vec::new(),
            lines: Vec::new(),
            band: (axis.reference_band_low, axis.reference_band_high),
            mean_line: axis.mean_line,
            grid_lines: axis.ticks(),
            y_ticks: axis.ticks(),
            dividers: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn subtest_profile(request: &ChartRequest, grouping: &CategoryGrouping) -> Self {
        let axis = &request.axis;
        let order: Vec<&ScoreItem> = grouping
            .flatten()
            .into_iter()
            .filter_map(|name| request.series.get(name))
            .collect();
        let n = order.len();

        let mut layout = Self::empty(
            request,
            (-0.5, n as f64 - 0.25),
            (axis.min, axis.max + LABEL_HEADROOM),
        );

        layout.plot_items(order.iter().copied().enumerate(), true);

        let item_label_y = axis.max + ITEM_LABEL_OFFSET;
        layout
            .labels
            .extend(order.iter().enumerate().map(|(i, item)| Label {
                text: item.name.clone(),
                x: i as f64,
                y: item_label_y,
                kind: LabelKind::Item,
            }));

        let group_label_y = axis.max + LABEL_HEADROOM;
        let group_count = grouping.groups().len();
        let mut start = 0usize;
        for (idx, group) in grouping.groups().iter().enumerate() {
            let end = start + group.items.len();
            layout.labels.push(Label {
                text: group.name.clone(),
                x: (start + end) as f64 / 2.0 - 0.5,
                y: group_label_y,
                kind: LabelKind::Group,
            });
            if idx + 1 < group_count {
                layout.dividers.push(end as f64 - 0.5);
            }
            start = end;
        }

        layout
    }

    fn composite_profile(request: &ChartRequest) -> Self {
        let axis = &request.axis;
        let items = request.series.items();
        let n = items.len();

        let mut layout = Self::empty(request, (-0.5, n as f64 - 0.5), (axis.min, axis.max));

        // The last item is the full-scale score: plotted alone, never joined to the indices.
        if let Some((full_scale, indices)) = items.split_last() {
            layout.plot_items(indices.iter().enumerate(), true);
            layout.plot_items(std::iter::once((indices.len(), full_scale)), false);
            if !indices.is_empty() {
                layout.dividers.push(indices.len() as f64 - 0.5);
            }
        }

        layout
            .labels
            .extend(items.iter().enumerate().map(|(i, item)| Label {
                text: item.name.clone(),
                x: i as f64,
                y: axis.min,
                kind: LabelKind::Category,
            }));

        layout
    }

    /// Markers, error bars and (optionally) connecting runs for items at the given x slots.
    fn plot_items<'a>(
        &mut self,
        items: impl IntoIterator<Item = (usize, &'a ScoreItem)>,
        connect: bool,
    ) {
        let mut run: Vec<(f64, f64)> = Vec::new();

        for (slot, item) in items {
            let x = slot as f64;
            let Some(value) = item.value else {
                self.finish_run(&mut run);
                continue;
            };

            self.markers.push(Marker {
                item: item.name.clone(),
                x,
                y: value,
            });
            if let Some(error) = item.error {
                self.error_bars.push(ErrorBar {
                    x,
                    low: value - error,
                    high: value + error,
                });
            }
            if connect {
                run.push((x, value));
            }
        }

        self.finish_run(&mut run);
    }

    fn finish_run(&mut self, run: &mut Vec<(f64, f64)>) {
        if run.len() >= 2 {
            self.lines.push(std::mem::take(run));
        } else {
            run.clear();
        }
    }
}
