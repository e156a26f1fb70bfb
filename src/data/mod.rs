//! Data module - WAIS-IV scores and plotted series

mod scores;
mod series;

pub use scores::{Composite, Domain, ScoreEntry, ScoreSheet, Subtest};
pub use series::{CategoryGroup, CategoryGrouping, ScoreItem, ScoreSeries};
