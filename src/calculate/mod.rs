//! Completion-time estimation engine.
//!
//! Pure functions over an activity and a player's obtained items:
//! - Effective drop rates under the "neither" and independent models
//! - Hours to the next drop under each model
//! - Days to the next collection log slot
//! - Active-item status along `requires_previous` chains
//!
//! Ranking across a whole catalog lives in [`ranking`].

pub mod ranking;

pub use ranking::*;

use crate::models::{
    AccountVariant, Activity, ActivityEstimate, DropItem, FastestSlot, ItemStatus, Metric,
    NextLogSlot, ObtainedSet,
};

const HOURS_PER_DAY: f64 = 24.0;

/// Combined drop rate of all unobtained "neither" items: `1 / Σ neither_inverse`.
///
/// Undefined when no unobtained item carries a positive inverse rate.
pub fn effective_droprate_neither(activity: &Activity, obtained: &ObtainedSet) -> Metric {
    let sum: f64 = activity
        .drop_items()
        .iter()
        .filter(|item| !obtained.contains(item.item_id))
        .filter_map(DropItem::usable_neither_inverse)
        .sum();

    if sum == 0.0 {
        Metric::Undefined
    } else {
        Metric::from_finite(1.0 / sum)
    }
}

/// Lowest positive `drop_rate_attempts` among unobtained items.
pub fn effective_droprate_independent(activity: &Activity, obtained: &ObtainedSet) -> Metric {
    activity
        .drop_items()
        .iter()
        .filter(|item| !obtained.contains(item.item_id) && item.has_drop_rate())
        .map(|item| item.drop_rate_attempts)
        .min_by(f64::total_cmp)
        .into()
}

/// Hours until a "neither" item drops.
pub fn time_to_exact(
    activity: &Activity,
    completions_per_hour: f64,
    obtained: &ObtainedSet,
) -> Metric {
    effective_droprate_neither(activity, obtained).per_hour(completions_per_hour)
}

/// Hours until the most common remaining item drops.
pub fn time_to_ei(
    activity: &Activity,
    completions_per_hour: f64,
    obtained: &ObtainedSet,
) -> Metric {
    effective_droprate_independent(activity, obtained).per_hour(completions_per_hour)
}

/// Collapse the four rate/time metrics into a next-log-slot estimate.
///
/// Any defined value of exactly zero means `Done`; no defined values means
/// `NoData`; otherwise the smallest value is read as hours and converted to
/// days.
pub fn resolve_next_log_slot(values: &[Metric]) -> NextLogSlot {
    let defined: Vec<f64> = values.iter().filter_map(Metric::value).collect();

    if defined.iter().any(|v| *v == 0.0) {
        return NextLogSlot::Done;
    }

    match defined.into_iter().min_by(f64::total_cmp) {
        Some(min) => NextLogSlot::Days(min / HOURS_PER_DAY),
        None => NextLogSlot::NoData,
    }
}

/// Days until the next collection log slot for this activity.
pub fn time_to_next_log_slot(
    activity: &Activity,
    completions_per_hour: f64,
    obtained: &ObtainedSet,
) -> NextLogSlot {
    let neither = effective_droprate_neither(activity, obtained);
    let independent = effective_droprate_independent(activity, obtained);
    resolve_next_log_slot(&[
        neither,
        independent,
        neither.per_hour(completions_per_hour),
        independent.per_hour(completions_per_hour),
    ])
}

/// Hours for a single completion including one-off setup time.
pub fn base_time_hours(completions_per_hour: f64, extra_time_to_first_completion: f64) -> Metric {
    if completions_per_hour > 0.0 {
        Metric::from_finite(1.0 / completions_per_hour + extra_time_to_first_completion)
    } else {
        Metric::Undefined
    }
}

/// Whether an item can be pursued now.
///
/// An item is active when it is not obtained and either has no
/// predecessor requirement or its predecessor (`sequence - 1`) is obtained.
/// The first item never waits on a predecessor.
pub fn is_item_active(activity: &Activity, item: &DropItem, obtained: &ObtainedSet) -> bool {
    if obtained.contains(item.item_id) {
        return false;
    }
    if !item.requires_previous || item.sequence <= 1 {
        return true;
    }
    activity
        .item_at(item.sequence - 1)
        .map_or(true, |previous| obtained.contains(previous.item_id))
}

/// Items that can be pursued now, in sequence order.
pub fn active_items<'a, 'b>(
    activity: &'a Activity,
    obtained: &'b ObtainedSet,
) -> impl Iterator<Item = &'a DropItem> + 'b
where
    'a: 'b,
{
    activity
        .drop_items()
        .iter()
        .filter(move |item| is_item_active(activity, item, obtained))
}

/// The active item with the lowest positive drop rate; earlier sequence wins ties.
pub fn fastest_active_item<'a>(
    activity: &'a Activity,
    obtained: &ObtainedSet,
) -> Option<&'a DropItem> {
    active_items(activity, obtained)
        .filter(|item| item.has_drop_rate())
        .min_by(|a, b| {
            a.drop_rate_attempts
                .total_cmp(&b.drop_rate_attempts)
                .then(a.sequence.cmp(&b.sequence))
        })
}

/// Obtained and active flags for every item of an activity.
pub fn item_statuses(activity: &Activity, obtained: &ObtainedSet) -> Vec<ItemStatus> {
    activity
        .drop_items()
        .iter()
        .map(|item| ItemStatus {
            item_id: item.item_id,
            item_name: item.item_name.clone(),
            sequence: item.sequence,
            drop_rate_attempts: item.drop_rate_attempts,
            neither_inverse: item.neither_inverse,
            requires_previous: item.requires_previous,
            exact: item.exact,
            independent: item.independent,
            obtained: obtained.contains(item.item_id),
            active: is_item_active(activity, item, obtained),
        })
        .collect()
}

/// Full estimate using explicit throughput figures.
pub fn estimate_with_rates(
    activity: &Activity,
    completions_per_hour: f64,
    extra_time_to_first_completion: f64,
    obtained: &ObtainedSet,
) -> ActivityEstimate {
    let droprate_neither = effective_droprate_neither(activity, obtained);
    let droprate_independent = effective_droprate_independent(activity, obtained);
    let time_to_exact = droprate_neither.per_hour(completions_per_hour);
    let time_to_ei = droprate_independent.per_hour(completions_per_hour);

    ActivityEstimate {
        activity_index: activity.activity_index,
        activity_name: activity.activity_name.clone(),
        droprate_neither,
        droprate_independent,
        time_to_exact,
        time_to_ei,
        time_to_next_log_slot: resolve_next_log_slot(&[
            droprate_neither,
            droprate_independent,
            time_to_exact,
            time_to_ei,
        ]),
        base_time_hours: base_time_hours(completions_per_hour, extra_time_to_first_completion),
        fastest_slot: fastest_active_item(activity, obtained).map(FastestSlot::from),
    }
}

/// Full estimate using the catalog figures for an account variant.
pub fn estimate_activity(
    activity: &Activity,
    variant: AccountVariant,
    obtained: &ObtainedSet,
) -> ActivityEstimate {
    estimate_with_rates(
        activity,
        activity.completions_per_hour(variant),
        activity.extra_time_to_first_completion,
        obtained,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    /// Activity 5 with items 100 and 101.
    fn mole() -> Activity {
        Activity::new(5, "Giant Mole", 10.0, 0.0)
            .with_item(DropItem::new(100, "Baby mole", 50.0).with_neither_inverse(0.02))
            .with_item(DropItem::new(101, "Long bone", 200.0).with_neither_inverse(0.005))
    }

    fn chained() -> Activity {
        Activity::new(8, "Barbarian Assault", 2.0, 2.0)
            .with_item(DropItem::new(1, "Fighter hat", 30.0).with_requires_previous(true))
            .with_item(DropItem::new(2, "Ranger hat", 30.0).with_requires_previous(true))
            .with_item(DropItem::new(3, "Healer hat", 30.0))
    }

    fn approx(metric: Metric, expected: f64) {
        let value = metric.value().expect("metric should be defined");
        assert!((value - expected).abs() < EPS, "{} != {}", value, expected);
    }

    #[test]
    fn test_fresh_activity_metrics() {
        let activity = mole();
        let obtained = ObtainedSet::new();

        approx(effective_droprate_neither(&activity, &obtained), 40.0);
        approx(effective_droprate_independent(&activity, &obtained), 50.0);
        approx(time_to_exact(&activity, 10.0, &obtained), 4.0);
        approx(time_to_ei(&activity, 10.0, &obtained), 5.0);

        let days = time_to_next_log_slot(&activity, 10.0, &obtained)
            .days()
            .unwrap();
        assert!((days - 4.0 / 24.0).abs() < EPS);
    }

    #[test]
    fn test_fully_obtained_activity_has_no_data() {
        let activity = mole();
        let obtained = ObtainedSet::from([100, 101]);

        assert_eq!(effective_droprate_neither(&activity, &obtained), Metric::Undefined);
        assert_eq!(effective_droprate_independent(&activity, &obtained), Metric::Undefined);
        assert_eq!(time_to_exact(&activity, 10.0, &obtained), Metric::Undefined);
        assert_eq!(
            time_to_next_log_slot(&activity, 10.0, &obtained),
            NextLogSlot::NoData
        );
    }

    #[test]
    fn test_partially_obtained_activity() {
        let activity = mole();
        let obtained = ObtainedSet::from([100]);

        approx(effective_droprate_neither(&activity, &obtained), 200.0);
        approx(effective_droprate_independent(&activity, &obtained), 200.0);
        approx(time_to_ei(&activity, 10.0, &obtained), 20.0);
    }

    #[test]
    fn test_zero_completions_per_hour_leaves_only_rates() {
        let activity = mole();
        let obtained = ObtainedSet::new();

        assert_eq!(time_to_exact(&activity, 0.0, &obtained), Metric::Undefined);
        assert_eq!(time_to_ei(&activity, 0.0, &obtained), Metric::Undefined);

        // Rates still feed the minimum: min(40, 50) / 24.
        let days = time_to_next_log_slot(&activity, 0.0, &obtained)
            .days()
            .unwrap();
        assert!((days - 40.0 / 24.0).abs() < EPS);
    }

    #[test]
    fn test_items_without_neither_inverse_are_skipped() {
        let activity = Activity::new(1, "DKS", 4.0, 4.0)
            .with_item(DropItem::new(600, "Pet", 5000.0))
            .with_item(DropItem::new(601, "Ring", 128.0).with_neither_inverse(0.0));
        assert_eq!(
            effective_droprate_neither(&activity, &ObtainedSet::new()),
            Metric::Undefined
        );
        approx(effective_droprate_independent(&activity, &ObtainedSet::new()), 128.0);
    }

    #[test]
    fn test_zero_drop_rates_are_not_instant() {
        let activity = Activity::new(1, "No data", 4.0, 4.0)
            .with_item(DropItem::new(1, "Unknown", 0.0));
        assert_eq!(
            effective_droprate_independent(&activity, &ObtainedSet::new()),
            Metric::Undefined
        );
        assert_eq!(
            time_to_next_log_slot(&activity, 4.0, &ObtainedSet::new()),
            NextLogSlot::NoData
        );
    }

    #[test]
    fn test_independent_rate_is_monotonic() {
        let activity = Activity::new(1, "Many", 1.0, 1.0)
            .with_item(DropItem::new(1, "a", 10.0))
            .with_item(DropItem::new(2, "b", 5.0))
            .with_item(DropItem::new(3, "c", 80.0))
            .with_item(DropItem::new(4, "d", 20.0));

        let mut obtained = ObtainedSet::new();
        let mut previous = effective_droprate_independent(&activity, &obtained)
            .value()
            .unwrap();
        for id in [2, 4, 1] {
            obtained.insert(id);
            let current = effective_droprate_independent(&activity, &obtained)
                .value()
                .unwrap();
            assert!(current >= previous, "{} < {}", current, previous);
            previous = current;
        }
        obtained.insert(3);
        assert_eq!(
            effective_droprate_independent(&activity, &obtained),
            Metric::Undefined
        );
    }

    #[test]
    fn test_resolve_next_log_slot() {
        assert_eq!(
            resolve_next_log_slot(&[Metric::Undefined, Metric::Defined(0.0)]),
            NextLogSlot::Done
        );
        assert_eq!(
            resolve_next_log_slot(&[Metric::Undefined, Metric::Undefined]),
            NextLogSlot::NoData
        );
        assert_eq!(
            resolve_next_log_slot(&[Metric::Defined(48.0), Metric::Defined(24.0)]),
            NextLogSlot::Days(1.0)
        );
    }

    #[test]
    fn test_base_time_hours() {
        approx(base_time_hours(10.0, 1.5), 1.6);
        assert_eq!(base_time_hours(0.0, 1.5), Metric::Undefined);
    }

    #[test]
    fn test_active_status_follows_chain() {
        let activity = chained();
        let statuses = |obtained: &ObtainedSet| -> Vec<bool> {
            item_statuses(&activity, obtained)
                .iter()
                .map(|s| s.active)
                .collect()
        };

        // First item ignores its own requirement; second waits on the first.
        assert_eq!(statuses(&ObtainedSet::new()), vec![true, false, true]);
        assert_eq!(statuses(&ObtainedSet::from([1])), vec![false, true, true]);
        assert_eq!(statuses(&ObtainedSet::from([1, 2, 3])), vec![false, false, false]);
    }

    #[test]
    fn test_item_statuses_flags() {
        let activity = chained();
        let statuses = item_statuses(&activity, &ObtainedSet::from([3]));
        assert_eq!(statuses.len(), 3);
        assert!(statuses[2].obtained);
        assert!(!statuses[0].obtained);
        assert_eq!(statuses[1].sequence, 2);
        assert!(statuses[1].requires_previous);
    }

    #[test]
    fn test_fastest_active_item() {
        let activity = Activity::new(1, "Slots", 1.0, 1.0)
            .with_item(DropItem::new(1, "slow", 100.0))
            .with_item(DropItem::new(2, "fast but locked", 5.0).with_requires_previous(true))
            .with_item(DropItem::new(3, "fast", 20.0))
            .with_item(DropItem::new(4, "tied", 20.0));

        let fastest = fastest_active_item(&activity, &ObtainedSet::new()).unwrap();
        assert_eq!(fastest.item_id, 3);

        let fastest = fastest_active_item(&activity, &ObtainedSet::from([1])).unwrap();
        assert_eq!(fastest.item_id, 2);

        assert!(fastest_active_item(&activity, &ObtainedSet::from([1, 2, 3, 4])).is_none());
    }

    #[test]
    fn test_fastest_item_outlives_obtained_set() {
        let activity = mole();
        let fastest = {
            let obtained = ObtainedSet::from([100]);
            fastest_active_item(&activity, &obtained)
        };
        assert_eq!(fastest.map(|item| item.item_id), Some(101));

        let active: Vec<&DropItem> = {
            let obtained = ObtainedSet::new();
            let items = active_items(&activity, &obtained).collect();
            items
        };
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn test_estimate_activity_by_variant() {
        let activity = mole();
        let obtained = ObtainedSet::new();

        let main = estimate_activity(&activity, AccountVariant::Main, &obtained);
        approx(main.time_to_exact, 4.0);
        approx(main.time_to_ei, 5.0);
        approx(main.base_time_hours, 0.1);
        assert_eq!(main.fastest_slot.as_ref().map(|s| s.item_id), Some(100));

        let iron = estimate_activity(&activity, AccountVariant::Iron, &obtained);
        assert_eq!(iron.time_to_exact, Metric::Undefined);
        assert_eq!(iron.base_time_hours, Metric::Undefined);
    }
}
