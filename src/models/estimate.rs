//! Estimation output records.

use serde::{Deserialize, Serialize};

use super::{ActivityIndex, DropItem, ItemId, Metric, NextLogSlot};

/// Per-activity completion estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEstimate {
    pub activity_index: ActivityIndex,

    pub activity_name: String,

    /// Attempts until any remaining "neither" item drops.
    pub droprate_neither: Metric,

    /// Attempts until the most common remaining item drops.
    pub droprate_independent: Metric,

    /// Hours, from the "neither" rate.
    pub time_to_exact: Metric,

    /// Hours, from the independent rate.
    pub time_to_ei: Metric,

    pub time_to_next_log_slot: NextLogSlot,

    /// Hours for one completion plus one-off setup time.
    pub base_time_hours: Metric,

    /// Recommended next item, if any item is currently pursuable.
    pub fastest_slot: Option<FastestSlot>,
}

/// The quickest active item of an activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FastestSlot {
    pub item_id: ItemId,
    pub item_name: String,
    pub drop_rate_attempts: f64,
}

impl From<&DropItem> for FastestSlot {
    fn from(item: &DropItem) -> Self {
        Self {
            item_id: item.item_id,
            item_name: item.item_name.clone(),
            drop_rate_attempts: item.drop_rate_attempts,
        }
    }
}

/// Obtained/active state of one drop item for a player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStatus {
    pub item_id: ItemId,
    pub item_name: String,
    pub sequence: u32,
    pub drop_rate_attempts: f64,
    pub neither_inverse: Option<f64>,
    pub requires_previous: bool,
    pub exact: bool,
    pub independent: bool,
    pub obtained: bool,
    /// Not obtained and not blocked by an unobtained predecessor.
    pub active: bool,
}

/// Ordering applied to ranked estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    /// Per-activity summary: `1 / completions_per_hour + extra time`.
    BaseTime,
    /// Per-item recommendation: expected wait for the next log slot.
    #[default]
    NextLogSlot,
}

impl std::str::FromStr for RankBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "base_time" | "base" => Ok(RankBy::BaseTime),
            "next_log_slot" | "next_slot" | "next" => Ok(RankBy::NextLogSlot),
            other => Err(format!(
                "unknown ranking '{}', expected 'base-time' or 'next-log-slot'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_by_from_str() {
        assert_eq!("base-time".parse::<RankBy>(), Ok(RankBy::BaseTime));
        assert_eq!("next_log_slot".parse::<RankBy>(), Ok(RankBy::NextLogSlot));
        assert_eq!("Next-Slot".parse::<RankBy>(), Ok(RankBy::NextLogSlot));
        assert!("fastest".parse::<RankBy>().is_err());
    }

    #[test]
    fn test_estimate_serialization_shape() {
        let estimate = ActivityEstimate {
            activity_index: 5,
            activity_name: "Giant Mole".to_string(),
            droprate_neither: Metric::Undefined,
            droprate_independent: Metric::Defined(50.0),
            time_to_exact: Metric::Undefined,
            time_to_ei: Metric::Defined(5.0),
            time_to_next_log_slot: NextLogSlot::Days(0.2),
            base_time_hours: Metric::Defined(0.1),
            fastest_slot: None,
        };

        let json = serde_json::to_value(&estimate).unwrap();
        assert_eq!(json["droprate_neither"], "n/a");
        assert_eq!(json["droprate_independent"], 50.0);
        assert_eq!(json["time_to_next_log_slot"], 0.2);
        assert!(json["fastest_slot"].is_null());
    }
}
