//! Rate and time values that may be undefined.

use serde::{Serialize, Serializer};

/// Wire form of [`Metric::Undefined`].
pub const UNDEFINED_LABEL: &str = "n/a";

/// Wire form of [`NextLogSlot::Done`].
pub const DONE_LABEL: &str = "Done!";

/// Wire form of [`NextLogSlot::NoData`].
pub const NO_DATA_LABEL: &str = "no available data";

/// A drop rate or duration that can be missing.
///
/// Never coerce `Undefined` to zero: zero has its own meaning in
/// [`NextLogSlot`] resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Metric {
    Defined(f64),
    #[default]
    Undefined,
}

impl Metric {
    /// Wrap a value, treating NaN and infinities as undefined.
    pub fn from_finite(value: f64) -> Self {
        if value.is_finite() {
            Metric::Defined(value)
        } else {
            Metric::Undefined
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Defined(v) => Some(*v),
            Metric::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Defined(_))
    }

    /// Divide by a throughput; undefined when the divisor is not positive.
    pub fn per_hour(self, completions_per_hour: f64) -> Metric {
        match self {
            Metric::Defined(v) if completions_per_hour > 0.0 => {
                Metric::from_finite(v / completions_per_hour)
            }
            _ => Metric::Undefined,
        }
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Metric::Undefined, Metric::from_finite)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Defined(v) => write!(f, "{:.4}", v),
            Metric::Undefined => write!(f, "{}", UNDEFINED_LABEL),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Defined(v) => serializer.serialize_f64(*v),
            Metric::Undefined => serializer.serialize_str(UNDEFINED_LABEL),
        }
    }
}

/// Expected wait until the next collection log slot for an activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NextLogSlot {
    /// Expected wait in days.
    Days(f64),
    /// One of the contributing metrics is exactly zero.
    Done,
    /// None of the contributing metrics is defined.
    NoData,
}

impl NextLogSlot {
    pub fn days(&self) -> Option<f64> {
        match self {
            NextLogSlot::Days(d) => Some(*d),
            _ => None,
        }
    }

    /// Sort key: numeric waits first (ascending), then `Done`, then `NoData`.
    pub(crate) fn rank_key(&self) -> (u8, f64) {
        match self {
            NextLogSlot::Days(d) => (0, *d),
            NextLogSlot::Done => (1, 0.0),
            NextLogSlot::NoData => (2, 0.0),
        }
    }
}

impl std::fmt::Display for NextLogSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NextLogSlot::Days(d) => write!(f, "{:.4} days", d),
            NextLogSlot::Done => write!(f, "{}", DONE_LABEL),
            NextLogSlot::NoData => write!(f, "{}", NO_DATA_LABEL),
        }
    }
}

impl Serialize for NextLogSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NextLogSlot::Days(d) => serializer.serialize_f64(*d),
            NextLogSlot::Done => serializer.serialize_str(DONE_LABEL),
            NextLogSlot::NoData => serializer.serialize_str(NO_DATA_LABEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_from_finite() {
        assert_eq!(Metric::from_finite(2.5), Metric::Defined(2.5));
        assert_eq!(Metric::from_finite(f64::NAN), Metric::Undefined);
        assert_eq!(Metric::from_finite(f64::INFINITY), Metric::Undefined);
    }

    #[test]
    fn test_metric_per_hour() {
        assert_eq!(Metric::Defined(40.0).per_hour(10.0), Metric::Defined(4.0));
        assert_eq!(Metric::Defined(40.0).per_hour(0.0), Metric::Undefined);
        assert_eq!(Metric::Undefined.per_hour(10.0), Metric::Undefined);
    }

    #[test]
    fn test_metric_serialization() {
        assert_eq!(serde_json::to_string(&Metric::Defined(4.0)).unwrap(), "4.0");
        assert_eq!(
            serde_json::to_string(&Metric::Undefined).unwrap(),
            "\"n/a\""
        );
    }

    #[test]
    fn test_next_log_slot_serialization() {
        assert_eq!(
            serde_json::to_string(&NextLogSlot::Done).unwrap(),
            "\"Done!\""
        );
        assert_eq!(
            serde_json::to_string(&NextLogSlot::NoData).unwrap(),
            "\"no available data\""
        );
        assert_eq!(
            serde_json::to_string(&NextLogSlot::Days(0.5)).unwrap(),
            "0.5"
        );
    }

    #[test]
    fn test_next_log_slot_rank_key_order() {
        let mut slots = vec![
            NextLogSlot::NoData,
            NextLogSlot::Days(3.0),
            NextLogSlot::Done,
            NextLogSlot::Days(1.0),
        ];
        slots.sort_by(|a, b| a.rank_key().partial_cmp(&b.rank_key()).unwrap());
        assert_eq!(
            slots,
            vec![
                NextLogSlot::Days(1.0),
                NextLogSlot::Days(3.0),
                NextLogSlot::Done,
                NextLogSlot::NoData,
            ]
        );
    }
}
