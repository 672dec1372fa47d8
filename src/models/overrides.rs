//! Player-supplied adjustments to catalog throughput figures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AccountVariant, Activity, ActivityIndex};

#[derive(Debug, Error, PartialEq)]
pub enum OverrideError {
    #[error("{field} for activity {activity_index} must be a finite, non-negative number (got {value})")]
    InvalidValue {
        activity_index: ActivityIndex,
        field: &'static str,
        value: f64,
    },
}

/// Replacement figures for one activity. Unset fields keep catalog values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateOverride {
    #[serde(default)]
    pub completions_per_hour_main: Option<f64>,

    #[serde(default)]
    pub completions_per_hour_iron: Option<f64>,

    #[serde(default)]
    pub extra_time_to_first_completion: Option<f64>,

    /// Leave the activity out of rankings entirely.
    #[serde(default)]
    pub disabled: bool,
}

/// Overrides keyed by activity index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateOverrides(HashMap<ActivityIndex, RateOverride>);

impl RateOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an override after checking its values.
    pub fn set(
        &mut self,
        activity_index: ActivityIndex,
        rate: RateOverride,
    ) -> Result<(), OverrideError> {
        Self::check(activity_index, &rate)?;
        self.0.insert(activity_index, rate);
        Ok(())
    }

    /// Reject negative or non-finite values across all entries.
    pub fn validate(&self) -> Result<(), OverrideError> {
        let mut indices: Vec<&ActivityIndex> = self.0.keys().collect();
        indices.sort_unstable();
        for index in indices {
            Self::check(*index, &self.0[index])?;
        }
        Ok(())
    }

    fn check(activity_index: ActivityIndex, rate: &RateOverride) -> Result<(), OverrideError> {
        let fields = [
            ("completions_per_hour_main", rate.completions_per_hour_main),
            ("completions_per_hour_iron", rate.completions_per_hour_iron),
            (
                "extra_time_to_first_completion",
                rate.extra_time_to_first_completion,
            ),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(OverrideError::InvalidValue {
                        activity_index,
                        field,
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, activity_index: ActivityIndex) -> Option<&RateOverride> {
        self.0.get(&activity_index)
    }

    pub fn is_disabled(&self, activity_index: ActivityIndex) -> bool {
        self.get(activity_index).is_some_and(|o| o.disabled)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Completions per hour for the variant, override first.
    pub fn completions_per_hour(&self, activity: &Activity, variant: AccountVariant) -> f64 {
        let overridden = self.get(activity.activity_index).and_then(|o| match variant {
            AccountVariant::Main => o.completions_per_hour_main,
            AccountVariant::Iron => o.completions_per_hour_iron,
        });
        overridden.unwrap_or_else(|| activity.completions_per_hour(variant))
    }

    pub fn extra_time(&self, activity: &Activity) -> f64 {
        self.get(activity.activity_index)
            .and_then(|o| o.extra_time_to_first_completion)
            .unwrap_or(activity.extra_time_to_first_completion)
    }
}
