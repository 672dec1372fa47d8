//! The activity catalog.
//!
//! An immutable table of activities and their drop items, built once from
//! the two exported CSV tables and shared read-only between requests:
//! - `loader`: CSV parsing with the lenient numeric rules of the export
//! - `store`: snapshot holder that swaps in a fully built replacement

mod loader;
mod store;

pub use loader::*;
pub use store::*;

#[cfg(test)]
pub(crate) use loader::fixtures;

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Activity, ActivityIndex, CatalogFingerprint, DropItem, ItemId};

/// Errors that abort a catalog build.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed {table} row at line {line}: {message}")]
    Malformed {
        table: &'static str,
        line: u64,
        message: String,
    },

    #[error("Activity index {0} appears more than once")]
    DuplicateActivity(ActivityIndex),

    #[error("Activity {activity} has drop item {item_id} at sequence {found}, expected {expected}")]
    BadSequence {
        activity: ActivityIndex,
        item_id: ItemId,
        expected: u32,
        found: u32,
    },

    #[error("No catalog source configured")]
    NoSource,
}

/// Where the two catalog tables live on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSource {
    pub activities_path: PathBuf,
    pub drop_items_path: PathBuf,
}

impl CatalogSource {
    pub fn new(activities_path: PathBuf, drop_items_path: PathBuf) -> Self {
        Self {
            activities_path,
            drop_items_path,
        }
    }

    /// Both tables under one directory.
    pub fn in_dir(dir: &std::path::Path, activities_file: &str, drop_items_file: &str) -> Self {
        Self::new(dir.join(activities_file), dir.join(drop_items_file))
    }
}

/// Read-only table of activities in load order.
#[derive(Debug, Clone)]
pub struct Catalog {
    activities: Vec<Activity>,
    positions: HashMap<ActivityIndex, usize>,
    fingerprint: CatalogFingerprint,
    loaded_at: DateTime<Utc>,
}

impl Catalog {
    /// Build a catalog from already-constructed activities.
    pub fn from_activities(activities: Vec<Activity>) -> Result<Self, CatalogLoadError> {
        let encoded = serde_json::to_vec(&activities).unwrap_or_default();
        let fingerprint = CatalogFingerprint::of_tables(&[&encoded]);
        Self::build(activities, fingerprint)
    }

    pub(crate) fn build(
        activities: Vec<Activity>,
        fingerprint: CatalogFingerprint,
    ) -> Result<Self, CatalogLoadError> {
        let mut positions = HashMap::with_capacity(activities.len());
        for (pos, activity) in activities.iter().enumerate() {
            if positions.insert(activity.activity_index, pos).is_some() {
                return Err(CatalogLoadError::DuplicateActivity(activity.activity_index));
            }
            check_sequences(activity)?;
        }

        Ok(Self {
            activities,
            positions,
            fingerprint,
            loaded_at: Utc::now(),
        })
    }

    /// An empty catalog, used before the first successful load.
    pub fn empty() -> Self {
        Self {
            activities: Vec::new(),
            positions: HashMap::new(),
            fingerprint: CatalogFingerprint::of_tables(&[]),
            loaded_at: Utc::now(),
        }
    }

    pub fn get_activity(&self, index: ActivityIndex) -> Option<&Activity> {
        self.positions.get(&index).map(|&pos| &self.activities[pos])
    }

    /// Distinct activity indices in load order.
    pub fn all_activity_indices(&self) -> Vec<ActivityIndex> {
        self.activities.iter().map(|a| a.activity_index).collect()
    }

    /// Drop items ordered by sequence; empty for an unknown index.
    pub fn drop_items_for(&self, index: ActivityIndex) -> &[DropItem] {
        self.get_activity(index)
            .map(|a| a.drop_items())
            .unwrap_or(&[])
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.activities.iter().map(|a| a.drop_items().len()).sum()
    }

    pub fn fingerprint(&self) -> &CatalogFingerprint {
        &self.fingerprint
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// `requires_previous` resolves predecessors by position, so sequences
/// must run `1..=n` in list order.
fn check_sequences(activity: &Activity) -> Result<(), CatalogLoadError> {
    for (pos, item) in activity.drop_items().iter().enumerate() {
        let expected = pos as u32 + 1;
        if item.sequence != expected {
            return Err(CatalogLoadError::BadSequence {
                activity: activity.activity_index,
                item_id: item.item_id,
                expected,
                found: item.sequence,
            });
        }
    }
    Ok(())
}
