//! Static Chart Renderer
//! Draws a profile chart layout with plotters and encodes it as PNG.
//!
//! Layers, back to front:
//! 1. Shaded average band
//! 2. Grid lines, mean line, group dividers, plot frame
//! 3. Score line runs, error bars with caps, markers
//! 4. Y tick labels, item/group/category labels

use crate::charts::backend::LabelSafeBackend;
use crate::charts::layout::{ChartLayout, LabelKind};
use crate::charts::request::{ChartMode, ChartRequest, RenderedChart};
use crate::config::{FigureSize, RenderOptions};
use crate::error::{render_err, ChartError};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::debug;

// Colors
const SCORE_BLUE: RGBColor = RGBColor(0, 0, 255);
const BAND_BLUE: RGBColor = RGBColor(173, 216, 230);
const MEAN_BLUE: RGBColor = RGBColor(0, 0, 139);
const LIGHT_GRAY: RGBColor = RGBColor(211, 211, 211);
const GRAY: RGBColor = RGBColor(128, 128, 128);
const GRID_GRAY: RGBColor = RGBColor(176, 176, 176);

const BAND_ALPHA: f64 = 0.3;
const MARKER_RADIUS: u32 = 5;
const CAP_HALF_WIDTH: i32 = 5;
const TICK_LENGTH: i32 = 4;
const SMALLEST_FIGURE: u32 = 100;

/// Fractions of the figure left empty around the plot area.
#[derive(Debug, Clone, Copy)]
struct Margins {
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

impl Margins {
    fn for_mode(mode: ChartMode) -> Self {
        match mode {
            // Top margin holds the domain label row
            ChartMode::SubtestProfile => Self {
                top: 0.16,
                right: 0.02,
                bottom: 0.08,
                left: 0.07,
            },
            ChartMode::CompositeProfile => Self {
                top: 0.03,
                right: 0.04,
                bottom: 0.07,
                left: 0.12,
            },
        }
    }
}

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Renders chart requests to in-memory PNG images.
#[derive(Debug, Clone, Default)]
pub struct StaticChartRenderer {
    options: RenderOptions,
}

impl StaticChartRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    fn figure_size(&self, mode: ChartMode) -> FigureSize {
        match mode {
            ChartMode::SubtestProfile => self.options.subtest_size,
            ChartMode::CompositeProfile => self.options.composite_size,
        }
    }

    /// Validate, lay out, draw and encode one chart.
    ///
    /// Nothing is drawn unless the request passes validation.
    pub fn render(&self, request: &ChartRequest) -> Result<RenderedChart, ChartError> {
        let layout = ChartLayout::compute(request)?;
        let FigureSize { width, height } = self.figure_size(request.mode);
        if width < SMALLEST_FIGURE || height < SMALLEST_FIGURE {
            return Err(ChartError::Render(format!(
                "figure size {width}x{height} is below {SMALLEST_FIGURE}x{SMALLEST_FIGURE}"
            )));
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let backend = LabelSafeBackend::new(BitMapBackend::with_buffer(
                &mut buffer,
                (width, height),
            ));
            let root = backend.into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;
            self.draw_layout(&root, &layout)?;
            root.present().map_err(render_err)?;
        }

        let png = encode_png(&buffer, width, height)?;
        debug!(
            mode = %request.mode,
            width,
            height,
            bytes = png.len(),
            "chart rendered"
        );

        Ok(RenderedChart::new(
            png,
            request.mode.filename(&self.options.file_prefix),
            width,
            height,
        ))
    }

    fn draw_layout<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        layout: &ChartLayout,
    ) -> Result<(), ChartError> {
        let (width, height) = root.dim_in_pixel();
        let margins = Margins::for_mode(layout.mode);
        let (x0, x1) = layout.x_range;
        let (y0, y1) = layout.y_range;

        let mut chart = ChartBuilder::on(root)
            .margin_top((height as f64 * margins.top) as u32)
            .margin_right((width as f64 * margins.right) as u32)
            .margin_bottom((height as f64 * margins.bottom) as u32)
            .margin_left((width as f64 * margins.left) as u32)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(render_err)?;

        Self::draw_reference_layers(&mut chart, layout)?;
        Self::draw_scores(root, &mut chart, layout)?;
        self.draw_tick_labels(root, &chart, layout)?;
        self.draw_labels(root, &chart, layout)?;
        Ok(())
    }

    fn draw_reference_layers<DB: DrawingBackend>(
        chart: &mut Chart<'_, DB>,
        layout: &ChartLayout,
    ) -> Result<(), ChartError> {
        let (x0, x1) = layout.x_range;
        let (y0, y1) = layout.y_range;
        let (band_low, band_high) = layout.band;

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x0, band_low), (x1, band_high)],
                BAND_BLUE.mix(BAND_ALPHA).filled(),
            )))
            .map_err(render_err)?;

        let (grid_style, divider_style) = match layout.mode {
            ChartMode::SubtestProfile => (LIGHT_GRAY.stroke_width(1), GRAY.stroke_width(1)),
            ChartMode::CompositeProfile => (
                GRID_GRAY.mix(BAND_ALPHA).stroke_width(1),
                LIGHT_GRAY.stroke_width(1),
            ),
        };

        chart
            .draw_series(
                layout
                    .grid_lines
                    .iter()
                    .map(|&y| PathElement::new(vec![(x0, y), (x1, y)], grid_style)),
            )
            .map_err(render_err)?;

        if let Some(mean) = layout.mean_line {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x0, mean), (x1, mean)],
                    MEAN_BLUE.stroke_width(2),
                )))
                .map_err(render_err)?;
        }

        chart
            .draw_series(
                layout
                    .dividers
                    .iter()
                    .map(|&x| PathElement::new(vec![(x, y0), (x, y1)], divider_style)),
            )
            .map_err(render_err)?;

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x0, y0), (x1, y1)],
                BLACK.stroke_width(1),
            )))
            .map_err(render_err)?;

        Ok(())
    }

    fn draw_scores<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &mut Chart<'_, DB>,
        layout: &ChartLayout,
    ) -> Result<(), ChartError> {
        let (y0, y1) = layout.y_range;

        chart
            .draw_series(
                layout
                    .lines
                    .iter()
                    .map(|run| PathElement::new(run.clone(), SCORE_BLUE.stroke_width(2))),
            )
            .map_err(render_err)?;

        for bar in &layout.error_bars {
            // Bars are clipped to the visible range; a clipped end gets no cap.
            let low = bar.low.max(y0);
            let high = bar.high.min(y1);
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(bar.x, low), (bar.x, high)],
                    SCORE_BLUE.stroke_width(2),
                )))
                .map_err(render_err)?;

            let ends = [(bar.low, low), (bar.high, high)];
            for (y, _) in ends.iter().filter(|(raw, shown)| raw == shown) {
                let (px, py) = chart.backend_coord(&(bar.x, *y));
                root.draw(&PathElement::new(
                    vec![(px - CAP_HALF_WIDTH, py), (px + CAP_HALF_WIDTH, py)],
                    SCORE_BLUE.stroke_width(2),
                ))
                .map_err(render_err)?;
            }
        }

        chart
            .draw_series(
                layout
                    .markers
                    .iter()
                    .map(|m| Circle::new((m.x, m.y), MARKER_RADIUS, SCORE_BLUE.filled())),
            )
            .map_err(render_err)?;

        Ok(())
    }

    fn font(&self, size: f64, style: FontStyle) -> FontDesc<'_> {
        FontDesc::new(FontFamily::from(self.options.font_family.as_str()), size, style)
    }

    fn draw_tick_labels<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        chart: &Chart<'_, DB>,
        layout: &ChartLayout,
    ) -> Result<(), ChartError> {
        let x0 = layout.x_range.0;
        let style = TextStyle::from(self.font(11.0, FontStyle::Normal))
            .color(&BLACK)
            .pos(Pos::new(HPos::Right, VPos::Center));

        for &tick in &layout.y_ticks {
            let (px, py) = chart.backend_coord(&(x0, tick));
            root.draw(&PathElement::new(
                vec![(px - TICK_LENGTH, py), (px, py)],
                BLACK.stroke_width(1),
            ))
            .map_err(render_err)?;
            root.draw(&Text::new(
                format_tick(tick),
                (px - TICK_LENGTH - 3, py),
                style.clone(),
            ))
            .map_err(render_err)?;
        }
        Ok(())
    }

    fn draw_labels<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        chart: &Chart<'_, DB>,
        layout: &ChartLayout,
    ) -> Result<(), ChartError> {
        let item_style = TextStyle::from(self.font(12.0, FontStyle::Normal))
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        let group_style = TextStyle::from(self.font(13.0, FontStyle::Bold))
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        let category_style = TextStyle::from(self.font(12.0, FontStyle::Normal))
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));

        for label in &layout.labels {
            let (px, py) = chart.backend_coord(&(label.x, label.y));
            let (style, offset) = match label.kind {
                LabelKind::Item => (&item_style, 0),
                LabelKind::Group => (&group_style, -2),
                LabelKind::Category => (&category_style, 6),
            };
            root.draw(&Text::new(label.text.clone(), (px, py + offset), style.clone()))
                .map_err(render_err)?;
        }
        Ok(())
    }
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ChartError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(buffer, width, height, ExtendedColorType::Rgb8)?;
    Ok(png)
}
