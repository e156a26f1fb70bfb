//! Chart Request Module
//! Axis configuration, chart modes and the validated input to a render call.

use crate::data::{CategoryGrouping, ScoreSeries, ScoreSheet};
use crate::error::ChartError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper limit on tick intervals for one axis
pub const MAX_TICKS: usize = 1000;

/// Vertical axis bounds, tick spacing and the shaded "average" band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub min: f64,
    pub max: f64,
    pub tick_step: f64,
    pub reference_band_low: f64,
    pub reference_band_high: f64,
    /// Solid line at the scale mean, if drawn
    pub mean_line: Option<f64>,
}

impl AxisConfig {
    /// Scaled scores: 1-19, average band 9.5-10.5
    pub const SCALED_SCORE: AxisConfig = AxisConfig {
        min: 1.0,
        max: 19.0,
        tick_step: 1.0,
        reference_band_low: 9.5,
        reference_band_high: 10.5,
        mean_line: None,
    };

    /// Composite scores: 35-165 in steps of 5, mean line at 100
    pub const COMPOSITE: AxisConfig = AxisConfig {
        min: 35.0,
        max: 165.0,
        tick_step: 5.0,
        reference_band_low: 97.5,
        reference_band_high: 102.5,
        mean_line: Some(100.0),
    };

    pub fn validate(&self) -> Result<(), ChartError> {
        if !(self.min.is_finite() && self.max.is_finite()) {
            return Err(ChartError::InvalidAxis(format!(
                "axis bounds must be finite, got {}..={}",
                self.min, self.max
            )));
        }
        let ordered = self.min < self.reference_band_low
            && self.reference_band_low <= self.reference_band_high
            && self.reference_band_high < self.max;
        if !ordered {
            return Err(ChartError::InvalidAxis(format!(
                "expected min < band low <= band high < max, got {} / {} / {} / {}",
                self.min, self.reference_band_low, self.reference_band_high, self.max
            )));
        }
        if !(self.tick_step > 0.0 && self.tick_step.is_finite()) {
            return Err(ChartError::InvalidAxis(format!(
                "tick step must be positive, got {}",
                self.tick_step
            )));
        }
        let tick_count = (self.max - self.min) / self.tick_step;
        if tick_count > MAX_TICKS as f64 {
            return Err(ChartError::InvalidAxis(format!(
                "tick step {} gives {tick_count:.0} ticks, limit is {MAX_TICKS}",
                self.tick_step
            )));
        }
        if let Some(mean) = self.mean_line {
            if !(self.min..=self.max).contains(&mean) {
                return Err(ChartError::InvalidAxis(format!(
                    "mean line {mean} is outside {}..={}",
                    self.min, self.max
                )));
            }
        }
        Ok(())
    }

    /// Tick values from `min` to `max` inclusive.
    pub fn ticks(&self) -> Vec<f64> {
        // Count steps up front so float accumulation never drops the last tick.
        let steps = ((self.max - self.min) / self.tick_step + 1e-9).floor() as usize;
        (0..=steps)
            .map(|i| self.min + i as f64 * self.tick_step)
            .collect()
    }
}

/// Accepted range for plotted values and their standard errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBounds {
    pub value_min: f64,
    pub value_max: f64,
    pub error_min: f64,
    pub error_max: f64,
}

impl ScoreBounds {
    pub const SCALED_SCORE: ScoreBounds = ScoreBounds {
        value_min: 1.0,
        value_max: 19.0,
        error_min: 0.0,
        error_max: 3.0,
    };

    pub const COMPOSITE: ScoreBounds = ScoreBounds {
        value_min: 35.0,
        value_max: 165.0,
        error_min: 0.0,
        error_max: 10.0,
    };

    fn check(
        item: &str,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ChartError> {
        if value.is_finite() && (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(ChartError::InvalidInput {
                item: item.to_string(),
                field,
                value,
                min,
                max,
            })
        }
    }

    /// Reject any present value or error outside these bounds.
    pub fn validate(&self, series: &ScoreSeries) -> Result<(), ChartError> {
        for item in series.items() {
            if let Some(value) = item.value {
                Self::check(&item.name, "score", value, self.value_min, self.value_max)?;
            }
            if let Some(error) = item.error {
                Self::check(&item.name, "SEM", error, self.error_min, self.error_max)?;
            }
        }
        Ok(())
    }
}

/// Which profile chart to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartMode {
    SubtestProfile,
    CompositeProfile,
}

impl ChartMode {
    pub const ALL: [ChartMode; 2] = [ChartMode::SubtestProfile, ChartMode::CompositeProfile];

    pub fn title(self) -> &'static str {
        match self {
            ChartMode::SubtestProfile => "Subtest Scaled Score Profile",
            ChartMode::CompositeProfile => "Composite Score Profile",
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            ChartMode::SubtestProfile => "subtest",
            ChartMode::CompositeProfile => "composite",
        }
    }

    pub fn bounds(self) -> ScoreBounds {
        match self {
            ChartMode::SubtestProfile => ScoreBounds::SCALED_SCORE,
            ChartMode::CompositeProfile => ScoreBounds::COMPOSITE,
        }
    }

    pub fn default_axis(self) -> AxisConfig {
        match self {
            ChartMode::SubtestProfile => AxisConfig::SCALED_SCORE,
            ChartMode::CompositeProfile => AxisConfig::COMPOSITE,
        }
    }

    pub fn requires_grouping(self) -> bool {
        matches!(self, ChartMode::SubtestProfile)
    }

    /// Download filename, e.g. `wais-iv_composite_score_profile.png`.
    pub fn filename(self, prefix: &str) -> String {
        let stem = match self {
            ChartMode::SubtestProfile => "subtest_scaled_score_profile",
            ChartMode::CompositeProfile => "composite_score_profile",
        };
        format!("{prefix}_{stem}.png")
    }
}

impl fmt::Display for ChartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Matches a chart title or short id exactly; nothing is trimmed or case-folded.
impl FromStr for ChartMode {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartMode::ALL
            .into_iter()
            .find(|mode| s == mode.title() || s == mode.id())
            .ok_or_else(|| ChartError::UnknownMode(s.to_string()))
    }
}

/// Everything one render call needs. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub series: ScoreSeries,
    pub grouping: Option<CategoryGrouping>,
    pub axis: AxisConfig,
    pub mode: ChartMode,
}

impl ChartRequest {
    pub fn new(
        series: ScoreSeries,
        grouping: Option<CategoryGrouping>,
        axis: AxisConfig,
        mode: ChartMode,
    ) -> Self {
        Self {
            series,
            grouping,
            axis,
            mode,
        }
    }

    /// Subtests grouped by domain on the scaled-score axis.
    pub fn subtest_profile(sheet: &ScoreSheet) -> Result<Self, ChartError> {
        Ok(Self::new(
            sheet.subtest_series()?,
            Some(ScoreSheet::domain_grouping()),
            AxisConfig::SCALED_SCORE,
            ChartMode::SubtestProfile,
        ))
    }

    /// Index scores then FSIQ on the composite axis.
    pub fn composite_profile(sheet: &ScoreSheet) -> Result<Self, ChartError> {
        Ok(Self::new(
            sheet.composite_series()?,
            None,
            AxisConfig::COMPOSITE,
            ChartMode::CompositeProfile,
        ))
    }

    pub fn from_sheet(sheet: &ScoreSheet, mode: ChartMode) -> Result<Self, ChartError> {
        match mode {
            ChartMode::SubtestProfile => Self::subtest_profile(sheet),
            ChartMode::CompositeProfile => Self::composite_profile(sheet),
        }
    }

    /// Checks run before any drawing starts.
    pub fn validate(&self) -> Result<(), ChartError> {
        self.axis.validate()?;
        let bounds = self.mode.bounds();
        // Every accepted score must land inside the plot range.
        if self.axis.min > bounds.value_min || self.axis.max < bounds.value_max {
            return Err(ChartError::InvalidAxis(format!(
                "{} axis {}..={} does not cover scores {}..={}",
                self.mode, self.axis.min, self.axis.max, bounds.value_min, bounds.value_max
            )));
        }
        bounds.validate(&self.series)?;
        if self.mode.requires_grouping() {
            self.grouping
                .as_ref()
                .ok_or(ChartError::MissingGrouping)?
                .validate_against(&self.series)?;
        }
        Ok(())
    }
}

/// An encoded chart image ready to be saved or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    png: Vec<u8>,
    filename: String,
    width: u32,
    height: u32,
}

impl RenderedChart {
    pub(crate) fn new(png: Vec<u8>, filename: String, width: u32, height: u32) -> Self {
        Self {
            png,
            filename,
            width,
            height,
        }
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Consume the chart, keeping only the encoded bytes.
    pub fn into_png(self) -> Vec<u8> {
        self.png
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ScoreEntry, ScoreItem, Subtest};

    #[test]
    fn test_mode_parsing_is_exact() {
        assert_eq!(
            "Subtest Scaled Score Profile".parse::<ChartMode>().unwrap(),
            ChartMode::SubtestProfile
        );
        assert_eq!(
            "Composite Score Profile".parse::<ChartMode>().unwrap(),
            ChartMode::CompositeProfile
        );
        assert_eq!("subtest".parse::<ChartMode>().unwrap(), ChartMode::SubtestProfile);
        assert_eq!(
            "composite".parse::<ChartMode>().unwrap(),
            ChartMode::CompositeProfile
        );

        for text in [
            "WAIS-IV Subtest Scaled Score Profile",
            "WAIS-IV Composite Score Profile",
            "subtest scaled score profile",
            " Composite Score Profile",
            "Composite",
            "",
        ] {
            assert!(
                matches!(text.parse::<ChartMode>(), Err(ChartError::UnknownMode(_))),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn test_mode_round_trips_through_title() {
        for mode in ChartMode::ALL {
            assert_eq!(mode.to_string().parse::<ChartMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_filenames() {
        assert_eq!(
            ChartMode::SubtestProfile.filename("wais-iv"),
            "wais-iv_subtest_scaled_score_profile.png"
        );
        assert_eq!(
            ChartMode::CompositeProfile.filename("client42"),
            "client42_composite_score_profile.png"
        );
    }

    #[test]
    fn test_axis_ticks() {
        let scaled = AxisConfig::SCALED_SCORE.ticks();
        assert_eq!(scaled.len(), 19);
        assert_eq!(scaled.first(), Some(&1.0));
        assert_eq!(scaled.last(), Some(&19.0));

        let composite = AxisConfig::COMPOSITE.ticks();
        assert_eq!(composite.len(), 27);
        assert_eq!(composite.last(), Some(&165.0));
    }

    #[test]
    fn test_axis_ordering_enforced() {
        assert!(AxisConfig::SCALED_SCORE.validate().is_ok());
        assert!(AxisConfig::COMPOSITE.validate().is_ok());

        let band_outside = AxisConfig {
            reference_band_high: 19.0,
            ..AxisConfig::SCALED_SCORE
        };
        assert!(matches!(
            band_outside.validate(),
            Err(ChartError::InvalidAxis(_))
        ));

        let inverted = AxisConfig {
            reference_band_low: 11.0,
            ..AxisConfig::SCALED_SCORE
        };
        assert!(inverted.validate().is_err());

        let zero_step = AxisConfig {
            tick_step: 0.0,
            ..AxisConfig::COMPOSITE
        };
        assert!(zero_step.validate().is_err());
    }

    #[test]
    fn test_unbounded_axis_rejected() {
        for axis in [
            AxisConfig {
                max: f64::INFINITY,
                ..AxisConfig::COMPOSITE
            },
            AxisConfig {
                min: f64::NEG_INFINITY,
                ..AxisConfig::SCALED_SCORE
            },
            AxisConfig {
                max: f64::NAN,
                ..AxisConfig::COMPOSITE
            },
        ] {
            assert!(
                matches!(axis.validate(), Err(ChartError::InvalidAxis(_))),
                "{axis:?} should be rejected"
            );
        }

        let request = ChartRequest::new(
            ScoreSheet::default().composite_series().unwrap(),
            None,
            AxisConfig {
                max: f64::INFINITY,
                ..AxisConfig::COMPOSITE
            },
            ChartMode::CompositeProfile,
        );
        assert!(matches!(
            request.validate(),
            Err(ChartError::InvalidAxis(_))
        ));
    }

    #[test]
    fn test_tick_count_is_capped() {
        let dense = AxisConfig {
            max: 1e12,
            tick_step: 1e-6,
            ..AxisConfig::COMPOSITE
        };
        assert!(matches!(dense.validate(), Err(ChartError::InvalidAxis(_))));

        // 1..=1001 in unit steps is exactly MAX_TICKS intervals
        let at_limit = AxisConfig {
            max: 1001.0,
            ..AxisConfig::SCALED_SCORE
        };
        assert!(at_limit.validate().is_ok());
        let over_limit = AxisConfig {
            max: 1002.0,
            ..AxisConfig::SCALED_SCORE
        };
        assert!(over_limit.validate().is_err());
    }

    #[test]
    fn test_axis_must_cover_score_range() {
        let sheet = ScoreSheet::default();

        let subtest_on_composite_axis = ChartRequest::new(
            sheet.subtest_series().unwrap(),
            Some(ScoreSheet::domain_grouping()),
            AxisConfig::COMPOSITE,
            ChartMode::SubtestProfile,
        );
        assert!(matches!(
            subtest_on_composite_axis.validate(),
            Err(ChartError::InvalidAxis(_))
        ));

        let composite_on_scaled_axis = ChartRequest::new(
            sheet.composite_series().unwrap(),
            None,
            AxisConfig::SCALED_SCORE,
            ChartMode::CompositeProfile,
        );
        assert!(matches!(
            composite_on_scaled_axis.validate(),
            Err(ChartError::InvalidAxis(_))
        ));

        let wider = ChartRequest::new(
            sheet.subtest_series().unwrap(),
            Some(ScoreSheet::domain_grouping()),
            AxisConfig {
                min: 0.0,
                max: 20.0,
                ..AxisConfig::SCALED_SCORE
            },
            ChartMode::SubtestProfile,
        );
        assert!(wider.validate().is_ok());
    }

    #[test]
    fn test_scaled_score_out_of_range() {
        let mut sheet = ScoreSheet::default();
        sheet
            .subtests
            .insert(Subtest::BlockDesign, ScoreEntry::new(20.0, 1.0));
        let request = ChartRequest::subtest_profile(&sheet).unwrap();
        match request.validate() {
            Err(ChartError::InvalidInput {
                item, field, value, ..
            }) => {
                assert_eq!(item, "BD");
                assert_eq!(field, "score");
                assert_eq!(value, 20.0);
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_sem_out_of_range() {
        let mut sheet = ScoreSheet::default();
        sheet
            .subtests
            .insert(Subtest::Coding, ScoreEntry::new(10.0, 3.5));
        let request = ChartRequest::subtest_profile(&sheet).unwrap();
        assert!(matches!(
            request.validate(),
            Err(ChartError::InvalidInput { field: "SEM", .. })
        ));
    }

    #[test]
    fn test_nan_rejected() {
        let series =
            ScoreSeries::new(vec![ScoreItem::new("VCI", Some(f64::NAN), Some(2.0))]).unwrap();
        let request =
            ChartRequest::new(series, None, AxisConfig::COMPOSITE, ChartMode::CompositeProfile);
        assert!(matches!(
            request.validate(),
            Err(ChartError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let series = ScoreSeries::new(vec![
            ScoreItem::new("low", Some(35.0), Some(0.0)),
            ScoreItem::new("high", Some(165.0), Some(10.0)),
        ])
        .unwrap();
        let request =
            ChartRequest::new(series, None, AxisConfig::COMPOSITE, ChartMode::CompositeProfile);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_subtest_without_grouping() {
        let sheet = ScoreSheet::default();
        let request = ChartRequest::new(
            sheet.subtest_series().unwrap(),
            None,
            AxisConfig::SCALED_SCORE,
            ChartMode::SubtestProfile,
        );
        assert!(matches!(
            request.validate(),
            Err(ChartError::MissingGrouping)
        ));
    }

    #[test]
    fn test_composite_ignores_grouping() {
        let request = ChartRequest::composite_profile(&ScoreSheet::default()).unwrap();
        assert!(request.grouping.is_none());
        assert!(request.validate().is_ok());
    }
}
