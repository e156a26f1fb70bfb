//! Score Series Module
//! Ordered, named (value, error) items and their category grouping.

use crate::error::ChartError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One plotted position: a score and its standard error, either of which may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreItem {
    pub name: String,
    pub value: Option<f64>,
    pub error: Option<f64>,
}

impl ScoreItem {
    pub fn new(name: impl Into<String>, value: Option<f64>, error: Option<f64>) -> Self {
        Self {
            name: name.into(),
            value,
            error,
        }
    }

    /// An item that was not administered.
    pub fn absent(name: impl Into<String>) -> Self {
        Self::new(name, None, None)
    }
}

/// Ordered sequence of uniquely named score items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSeries {
    items: Vec<ScoreItem>,
}

impl ScoreSeries {
    pub fn new(items: Vec<ScoreItem>) -> Result<Self, ChartError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.name.as_str()) {
                return Err(ChartError::DuplicateItem(item.name.clone()));
            }
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[ScoreItem] {
        &self.items
    }

    pub fn get(&self, name: &str) -> Option<&ScoreItem> {
        self.items.iter().find(|item| item.name == name)
    }
}

/// A named, contiguous run of series items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub name: String,
    pub items: Vec<String>,
}

/// Ordered partition of a series' item names into named groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGrouping {
    groups: Vec<CategoryGroup>,
}

impl CategoryGrouping {
    pub fn new(groups: Vec<CategoryGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    /// Item names in display order: groups in declaration order, items in order within a group.
    pub fn flatten(&self) -> Vec<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.items.iter().map(String::as_str))
            .collect()
    }

    /// Check that every series item appears in exactly one group and nothing else does.
    pub fn validate_against(&self, series: &ScoreSeries) -> Result<(), ChartError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for group in &self.groups {
            if group.items.is_empty() {
                return Err(ChartError::InvalidGrouping(format!(
                    "group {:?} has no items",
                    group.name
                )));
            }
            for name in &group.items {
                if series.get(name).is_none() {
                    return Err(ChartError::InvalidGrouping(format!(
                        "{name:?} in group {:?} is not in the series",
                        group.name
                    )));
                }
                if !seen.insert(name.as_str()) {
                    return Err(ChartError::InvalidGrouping(format!(
                        "{name:?} appears in more than one group"
                    )));
                }
            }
        }

        if let Some(missing) = series
            .items()
            .iter()
            .find(|item| !seen.contains(item.name.as_str()))
        {
            return Err(ChartError::InvalidGrouping(format!(
                "{:?} does not belong to any group",
                missing.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(names: &[&str]) -> ScoreSeries {
        ScoreSeries::new(
            names
                .iter()
                .map(|n| ScoreItem::new(*n, Some(10.0), Some(1.0)))
                .collect(),
        )
        .unwrap()
    }

    fn group(name: &str, items: &[&str]) -> CategoryGroup {
        CategoryGroup {
            name: name.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = ScoreSeries::new(vec![ScoreItem::absent("SI"), ScoreItem::absent("SI")]);
        assert!(matches!(result, Err(ChartError::DuplicateItem(name)) if name == "SI"));
    }

    #[test]
    fn test_flatten_follows_group_order() {
        let grouping = CategoryGrouping::new(vec![group("B", &["c", "d"]), group("A", &["a", "b"])]);
        assert_eq!(grouping.flatten(), vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn test_partition_accepted() {
        let grouping = CategoryGrouping::new(vec![group("A", &["a", "b"]), group("B", &["c"])]);
        assert!(grouping.validate_against(&series(&["a", "b", "c"])).is_ok());
    }

    #[test]
    fn test_ungrouped_item_rejected() {
        let grouping = CategoryGrouping::new(vec![group("A", &["a", "b"])]);
        let err = grouping.validate_against(&series(&["a", "b", "c"])).unwrap_err();
        assert!(matches!(err, ChartError::InvalidGrouping(_)));
    }

    #[test]
    fn test_item_in_two_groups_rejected() {
        let grouping = CategoryGrouping::new(vec![group("A", &["a", "b"]), group("B", &["b"])]);
        assert!(grouping.validate_against(&series(&["a", "b"])).is_err());
    }

    #[test]
    fn test_unknown_item_rejected() {
        let grouping = CategoryGrouping::new(vec![group("A", &["a", "z"])]);
        assert!(grouping.validate_against(&series(&["a"])).is_err());
    }

    #[test]
    fn test_empty_group_rejected() {
        let grouping = CategoryGrouping::new(vec![group("A", &["a"]), group("B", &[])]);
        assert!(grouping.validate_against(&series(&["a"])).is_err());
    }
}
