//! WAIS-IV Score Sheet Module
//! Subtest, domain and composite constants plus the entered scores with their defaults.

use crate::data::series::{CategoryGroup, CategoryGrouping, ScoreItem, ScoreSeries};
use crate::error::ChartError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default scaled score for a core subtest
pub const DEFAULT_SCALED_SCORE: f64 = 10.0;
/// Default SEM for a core subtest
pub const DEFAULT_SUBTEST_SEM: f64 = 0.99;
/// Default composite score
pub const DEFAULT_COMPOSITE_SCORE: f64 = 100.0;
/// Default SEM for a composite
pub const DEFAULT_COMPOSITE_SEM: f64 = 1.99;

/// WAIS-IV subtests in profile display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subtest {
    #[serde(rename = "SI")]
    Similarities,
    #[serde(rename = "VC")]
    Vocabulary,
    #[serde(rename = "IN")]
    Information,
    #[serde(rename = "CO")]
    Comprehension,
    #[serde(rename = "BD")]
    BlockDesign,
    #[serde(rename = "MR")]
    MatrixReasoning,
    #[serde(rename = "VP")]
    VisualPuzzles,
    #[serde(rename = "FW")]
    FigureWeights,
    #[serde(rename = "PCm")]
    PictureCompletion,
    #[serde(rename = "DS")]
    DigitSpan,
    #[serde(rename = "AR")]
    Arithmetic,
    #[serde(rename = "LN")]
    LetterNumberSequencing,
    #[serde(rename = "SS")]
    SymbolSearch,
    #[serde(rename = "CD")]
    Coding,
    #[serde(rename = "CA")]
    Cancellation,
}

impl Subtest {
    pub const ALL: [Subtest; 15] = [
        Subtest::Similarities,
        Subtest::Vocabulary,
        Subtest::Information,
        Subtest::Comprehension,
        Subtest::BlockDesign,
        Subtest::MatrixReasoning,
        Subtest::VisualPuzzles,
        Subtest::FigureWeights,
        Subtest::PictureCompletion,
        Subtest::DigitSpan,
        Subtest::Arithmetic,
        Subtest::LetterNumberSequencing,
        Subtest::SymbolSearch,
        Subtest::Coding,
        Subtest::Cancellation,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            Subtest::Similarities => "SI",
            Subtest::Vocabulary => "VC",
            Subtest::Information => "IN",
            Subtest::Comprehension => "CO",
            Subtest::BlockDesign => "BD",
            Subtest::MatrixReasoning => "MR",
            Subtest::VisualPuzzles => "VP",
            Subtest::FigureWeights => "FW",
            Subtest::PictureCompletion => "PCm",
            Subtest::DigitSpan => "DS",
            Subtest::Arithmetic => "AR",
            Subtest::LetterNumberSequencing => "LN",
            Subtest::SymbolSearch => "SS",
            Subtest::Coding => "CD",
            Subtest::Cancellation => "CA",
        }
    }

    /// Supplemental subtests do not contribute to the index scores.
    pub fn is_supplemental(self) -> bool {
        matches!(
            self,
            Subtest::Comprehension
                | Subtest::FigureWeights
                | Subtest::PictureCompletion
                | Subtest::LetterNumberSequencing
                | Subtest::Cancellation
        )
    }

    /// Chart label; supplemental subtests are parenthesised, e.g. `(CO)`.
    pub fn label(self) -> String {
        if self.is_supplemental() {
            format!("({})", self.abbreviation())
        } else {
            self.abbreviation().to_string()
        }
    }
}

/// The four WAIS-IV cognitive domains, used to group subtests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    VerbalComprehension,
    PerceptualReasoning,
    WorkingMemory,
    ProcessingSpeed,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::VerbalComprehension,
        Domain::PerceptualReasoning,
        Domain::WorkingMemory,
        Domain::ProcessingSpeed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Domain::VerbalComprehension => "Verbal Comprehension",
            Domain::PerceptualReasoning => "Perceptual Reasoning",
            Domain::WorkingMemory => "Working Memory",
            Domain::ProcessingSpeed => "Processing Speed",
        }
    }

    pub fn subtests(self) -> &'static [Subtest] {
        match self {
            Domain::VerbalComprehension => &[
                Subtest::Similarities,
                Subtest::Vocabulary,
                Subtest::Information,
                Subtest::Comprehension,
            ],
            Domain::PerceptualReasoning => &[
                Subtest::BlockDesign,
                Subtest::MatrixReasoning,
                Subtest::VisualPuzzles,
                Subtest::FigureWeights,
                Subtest::PictureCompletion,
            ],
            Domain::WorkingMemory => &[
                Subtest::DigitSpan,
                Subtest::Arithmetic,
                Subtest::LetterNumberSequencing,
            ],
            Domain::ProcessingSpeed => &[
                Subtest::SymbolSearch,
                Subtest::Coding,
                Subtest::Cancellation,
            ],
        }
    }
}

/// The four index scores followed by the full-scale composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Composite {
    #[serde(rename = "VCI")]
    VerbalComprehension,
    #[serde(rename = "PRI")]
    PerceptualReasoning,
    #[serde(rename = "WMI")]
    WorkingMemory,
    #[serde(rename = "PSI")]
    ProcessingSpeed,
    #[serde(rename = "FSIQ")]
    FullScale,
}

impl Composite {
    pub const ALL: [Composite; 5] = [
        Composite::VerbalComprehension,
        Composite::PerceptualReasoning,
        Composite::WorkingMemory,
        Composite::ProcessingSpeed,
        Composite::FullScale,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            Composite::VerbalComprehension => "VCI",
            Composite::PerceptualReasoning => "PRI",
            Composite::WorkingMemory => "WMI",
            Composite::ProcessingSpeed => "PSI",
            Composite::FullScale => "FSIQ",
        }
    }
}

/// A score and its SEM as entered; `None` means not administered.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreEntry {
    pub score: Option<f64>,
    pub sem: Option<f64>,
}

impl ScoreEntry {
    pub fn new(score: f64, sem: f64) -> Self {
        Self {
            score: Some(score),
            sem: Some(sem),
        }
    }
}

/// All scores entered for one examinee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSheet {
    #[serde(default = "default_subtests")]
    pub subtests: BTreeMap<Subtest, ScoreEntry>,
    #[serde(default = "default_composites")]
    pub composites: BTreeMap<Composite, ScoreEntry>,
}

impl Default for ScoreSheet {
    fn default() -> Self {
        Self {
            subtests: default_subtests(),
            composites: default_composites(),
        }
    }
}

fn default_subtests() -> BTreeMap<Subtest, ScoreEntry> {
    Subtest::ALL
        .into_iter()
        .filter(|s| !s.is_supplemental())
        .map(|s| (s, ScoreEntry::new(DEFAULT_SCALED_SCORE, DEFAULT_SUBTEST_SEM)))
        .collect()
}

fn default_composites() -> BTreeMap<Composite, ScoreEntry> {
    Composite::ALL
        .into_iter()
        .map(|c| (c, ScoreEntry::new(DEFAULT_COMPOSITE_SCORE, DEFAULT_COMPOSITE_SEM)))
        .collect()
}

impl ScoreSheet {
    /// Subtests in display order; subtests missing from the sheet are absent.
    pub fn subtest_series(&self) -> Result<ScoreSeries, ChartError> {
        let items = Subtest::ALL
            .into_iter()
            .map(|s| {
                let entry = self.subtests.get(&s).copied().unwrap_or_default();
                ScoreItem::new(s.label(), entry.score, entry.sem)
            })
            .collect();
        ScoreSeries::new(items)
    }

    pub fn composite_series(&self) -> Result<ScoreSeries, ChartError> {
        let items = Composite::ALL
            .into_iter()
            .map(|c| {
                let entry = self.composites.get(&c).copied().unwrap_or_default();
                ScoreItem::new(c.abbreviation(), entry.score, entry.sem)
            })
            .collect();
        ScoreSeries::new(items)
    }

    /// Subtests grouped by domain.
    pub fn domain_grouping() -> CategoryGrouping {
        CategoryGrouping::new(
            Domain::ALL
                .into_iter()
                .map(|d| CategoryGroup {
                    name: d.name().to_string(),
                    items: d.subtests().iter().map(|s| s.label()).collect(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_subtest_has_one_domain() {
        let grouped: Vec<Subtest> = Domain::ALL
            .iter()
            .flat_map(|d| d.subtests().iter().copied())
            .collect();
        assert_eq!(grouped, Subtest::ALL.to_vec());
        assert!(Domain::WorkingMemory.subtests().contains(&Subtest::Arithmetic));
        assert!(Domain::ProcessingSpeed.subtests().contains(&Subtest::Cancellation));
    }

    #[test]
    fn test_supplemental_labels_are_parenthesised() {
        assert_eq!(Subtest::Comprehension.label(), "(CO)");
        assert_eq!(Subtest::PictureCompletion.label(), "(PCm)");
        assert_eq!(Subtest::Similarities.label(), "SI");
    }

    #[test]
    fn test_default_sheet_leaves_supplementals_absent() {
        let series = ScoreSheet::default().subtest_series().unwrap();
        assert_eq!(series.items().len(), 15);

        let present = series.items().iter().filter(|i| i.value.is_some()).count();
        assert_eq!(present, 10);

        let co = series.get("(CO)").unwrap();
        assert_eq!(co.value, None);
        assert_eq!(co.error, None);

        let si = series.get("SI").unwrap();
        assert_eq!(si.value, Some(10.0));
        assert_eq!(si.error, Some(0.99));
    }

    #[test]
    fn test_default_composites() {
        let series = ScoreSheet::default().composite_series().unwrap();
        let names: Vec<&str> = series.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["VCI", "PRI", "WMI", "PSI", "FSIQ"]);
        assert!(series
            .items()
            .iter()
            .all(|i| i.value == Some(100.0) && i.error == Some(1.99)));
    }

    #[test]
    fn test_domain_grouping_matches_series() {
        let sheet = ScoreSheet::default();
        let series = sheet.subtest_series().unwrap();
        let grouping = ScoreSheet::domain_grouping();
        assert!(grouping.validate_against(&series).is_ok());
        assert_eq!(grouping.groups().len(), 4);
        assert_eq!(grouping.groups()[1].name, "Perceptual Reasoning");
    }

    #[test]
    fn test_sheet_from_json_uses_abbreviations() {
        let json = r#"{
            "subtests": {
                "SI": { "score": 12, "sem": 1.2 },
                "CO": { "score": 8, "sem": 1.0 }
            },
            "composites": {
                "FSIQ": { "score": 104, "sem": 2.6 }
            }
        }"#;
        let sheet: ScoreSheet = serde_json::from_str(json).unwrap();

        let subtests = sheet.subtest_series().unwrap();
        assert_eq!(subtests.get("SI").unwrap().value, Some(12.0));
        assert_eq!(subtests.get("(CO)").unwrap().value, Some(8.0));
        assert_eq!(subtests.get("VC").unwrap().value, None);

        let composites = sheet.composite_series().unwrap();
        assert_eq!(composites.get("FSIQ").unwrap().error, Some(2.6));
        assert_eq!(composites.get("VCI").unwrap().value, None);
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let sheet: ScoreSheet = serde_json::from_str("{}").unwrap();
        assert_eq!(sheet, ScoreSheet::default());
    }
}
