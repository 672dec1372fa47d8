//! Ranking activities across the whole catalog.

use std::cmp::Ordering;

use tracing::debug;

use super::{active_items, estimate_with_rates};
use crate::catalog::Catalog;
use crate::models::{AccountVariant, ActivityEstimate, ObtainedSet, RankBy, RateOverrides};

/// How to filter and order a ranking.
#[derive(Debug, Clone, Default)]
pub struct RankingOptions {
    pub variant: AccountVariant,

    pub rank_by: RankBy,

    pub overrides: RateOverrides,

    /// Keep only the first `limit` activities.
    pub limit: Option<usize>,
}

impl RankingOptions {
    pub fn for_variant(variant: AccountVariant) -> Self {
        Self {
            variant,
            ..Default::default()
        }
    }

    pub fn rank_by(mut self, rank_by: RankBy) -> Self {
        self.rank_by = rank_by;
        self
    }

    pub fn with_overrides(mut self, overrides: RateOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

fn compare(a: &ActivityEstimate, b: &ActivityEstimate, rank_by: RankBy) -> Ordering {
    let primary = match rank_by {
        RankBy::BaseTime => {
            let key = |e: &ActivityEstimate| e.base_time_hours.value().unwrap_or(f64::INFINITY);
            key(a).total_cmp(&key(b))
        }
        RankBy::NextLogSlot => {
            let (ga, va) = a.time_to_next_log_slot.rank_key();
            let (gb, vb) = b.time_to_next_log_slot.rank_key();
            ga.cmp(&gb).then(va.total_cmp(&vb))
        }
    };
    primary.then(a.activity_index.cmp(&b.activity_index))
}

/// Estimate and order every eligible activity.
///
/// An activity is skipped when it is disabled by an override, when its
/// completions per hour for the variant is zero, or when none of its items
/// is active. Ties keep ascending activity index order.
pub fn rank_activities(
    catalog: &Catalog,
    obtained: &ObtainedSet,
    options: &RankingOptions,
) -> Vec<ActivityEstimate> {
    let overrides = &options.overrides;

    let mut estimates: Vec<ActivityEstimate> = catalog
        .activities()
        .iter()
        .filter(|activity| !overrides.is_disabled(activity.activity_index))
        .filter_map(|activity| {
            let cph = overrides.completions_per_hour(activity, options.variant);
            if !(cph.is_finite() && cph > 0.0) {
                debug!(
                    "Skipping {} ({}): not completable as {}",
                    activity.activity_name, activity.activity_index, options.variant
                );
                return None;
            }
            if active_items(activity, obtained).next().is_none() {
                return None;
            }
            Some(estimate_with_rates(
                activity,
                cph,
                overrides.extra_time(activity),
                obtained,
            ))
        })
        .collect();

    estimates.sort_by(|a, b| compare(a, b, options.rank_by));

    if let Some(limit) = options.limit {
        estimates.truncate(limit);
    }

    debug!(
        "Ranked {} of {} activities for {} account ({} items obtained)",
        estimates.len(),
        catalog.len(),
        options.variant,
        obtained.len()
    );

    estimates
}

/// Rank every eligible activity by time to the next log slot.
pub fn calculate_all_completion_times(
    catalog: &Catalog,
    obtained: &ObtainedSet,
    variant: AccountVariant,
) -> Vec<ActivityEstimate> {
    rank_activities(catalog, obtained, &RankingOptions::for_variant(variant))
}
