//! Activities and the collection log items they drop.

use serde::Serialize;

use super::{AccountVariant, ActivityIndex, ItemId};

/// A collection log item dropped by an activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropItem {
    pub item_id: ItemId,

    pub item_name: String,

    /// Expected completions to obtain this item on its own.
    /// Values `<= 0` mean no data and are skipped by rate calculations.
    pub drop_rate_attempts: f64,

    /// Contribution to the combined "neither" rate; `None` excludes the
    /// item from that model.
    pub neither_inverse: Option<f64>,

    /// Cannot be pursued until the item at `sequence - 1` is obtained.
    pub requires_previous: bool,

    pub exact: bool,

    pub independent: bool,

    /// 1-based position in the owning activity's drop list.
    pub sequence: u32,
}

impl DropItem {
    pub fn new(item_id: ItemId, item_name: impl Into<String>, drop_rate_attempts: f64) -> Self {
        Self {
            item_id,
            item_name: item_name.into(),
            drop_rate_attempts,
            neither_inverse: None,
            requires_previous: false,
            exact: false,
            independent: false,
            sequence: 0,
        }
    }

    pub fn with_neither_inverse(mut self, value: f64) -> Self {
        self.neither_inverse = Some(value);
        self
    }

    pub fn with_requires_previous(mut self, requires_previous: bool) -> Self {
        self.requires_previous = requires_previous;
        self
    }

    pub fn with_models(mut self, exact: bool, independent: bool) -> Self {
        self.exact = exact;
        self.independent = independent;
        self
    }

    /// Whether the attempts-based rate can feed a time calculation.
    pub fn has_drop_rate(&self) -> bool {
        self.drop_rate_attempts.is_finite() && self.drop_rate_attempts > 0.0
    }

    /// The inverse rate if it can contribute to the "neither" sum.
    pub fn usable_neither_inverse(&self) -> Option<f64> {
        self.neither_inverse
            .filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// A repeatable in-game task with throughput figures and a drop list.
///
/// Only built through `push_item`, which keeps `sequence` contiguous.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub activity_index: ActivityIndex,

    pub activity_name: String,

    pub completions_per_hour_main: f64,

    pub completions_per_hour_iron: f64,

    /// Hours spent once before the first completion is possible.
    pub extra_time_to_first_completion: f64,

    pub notes: String,

    pub verification_source: String,

    /// Ordered by `sequence`, contiguous from 1.
    drop_items: Vec<DropItem>,
}

impl Activity {
    pub fn new(
        activity_index: ActivityIndex,
        activity_name: impl Into<String>,
        completions_per_hour_main: f64,
        completions_per_hour_iron: f64,
    ) -> Self {
        Self {
            activity_index,
            activity_name: activity_name.into(),
            completions_per_hour_main,
            completions_per_hour_iron,
            extra_time_to_first_completion: 0.0,
            notes: String::new(),
            verification_source: String::new(),
            drop_items: Vec::new(),
        }
    }

    pub fn with_extra_time(mut self, hours: f64) -> Self {
        self.extra_time_to_first_completion = hours;
        self
    }

    pub fn with_notes(
        mut self,
        notes: impl Into<String>,
        verification_source: impl Into<String>,
    ) -> Self {
        self.notes = notes.into();
        self.verification_source = verification_source.into();
        self
    }

    /// Append an item, assigning it the next sequence number.
    pub fn with_item(mut self, item: DropItem) -> Self {
        self.push_item(item);
        self
    }

    /// Append an item, assigning it the next sequence number.
    /// Any sequence already set on `item` is overwritten.
    pub fn push_item(&mut self, mut item: DropItem) -> &DropItem {
        item.sequence = self.drop_items.len() as u32 + 1;
        self.drop_items.push(item);
        &self.drop_items[self.drop_items.len() - 1]
    }

    pub fn drop_items(&self) -> &[DropItem] {
        &self.drop_items
    }

    /// The item at a 1-based sequence position.
    pub fn item_at(&self, sequence: u32) -> Option<&DropItem> {
        if sequence == 0 {
            return None;
        }
        self.drop_items.get(sequence as usize - 1)
    }

    pub fn completions_per_hour(&self, variant: AccountVariant) -> f64 {
        match variant {
            AccountVariant::Main => self.completions_per_hour_main,
            AccountVariant::Iron => self.completions_per_hour_iron,
        }
    }

    /// Whether the activity can be timed for this variant at all.
    pub fn is_completable(&self, variant: AccountVariant) -> bool {
        let cph = self.completions_per_hour(variant);
        cph.is_finite() && cph > 0.0
    }
}

#[cfg(test)]
impl Activity {
    /// Replace the drop list without renumbering.
    pub(crate) fn with_raw_items(mut self, items: Vec<DropItem>) -> Self {
        self.drop_items = items;
        self
    }
}
