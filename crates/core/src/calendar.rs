//! Disabled-date computation for the delivery-date picker.
//!
//! Everything before the earliest available date and after the latest one is
//! disabled, plus every gap day in between. Days are walked on `NaiveDate`,
//! which has no timezone, so there is no DST or offset drift.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::DeliveryDate;

/// Dates the picker must not offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisabledDates {
    /// Every date strictly before this one is disabled.
    pub before: Option<NaiveDate>,
    /// Every date strictly after this one is disabled.
    pub after: Option<NaiveDate>,
    /// Gap days strictly between `before` and `after`, ascending.
    pub dates: Vec<NaiveDate>,
}

impl DisabledDates {
    /// Whether `date` is disabled.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.before.is_some_and(|first| date < first)
            || self.after.is_some_and(|last| date > last)
            || self.dates.binary_search(&date).is_ok()
    }
}

/// Compute the disabled set for `available`.
///
/// Input order and duplicates do not matter. An empty input disables nothing.
#[must_use]
pub fn disabled_dates(available: &[NaiveDate]) -> DisabledDates {
    let available: BTreeSet<NaiveDate> = available.iter().copied().collect();

    let (Some(&first), Some(&last)) = (available.first(), available.last()) else {
        return DisabledDates::default();
    };

    let dates = first
        .iter_days()
        .skip(1)
        .take_while(|day| *day < last)
        .filter(|day| !available.contains(day))
        .collect();

    DisabledDates {
        before: Some(first),
        after: Some(last),
        dates,
    }
}

/// [`disabled_dates`] over formatted delivery dates.
#[must_use]
pub fn disabled_delivery_dates(available: &[DeliveryDate]) -> DisabledDates {
    let dates: Vec<NaiveDate> = available.iter().map(|d| d.date).collect();
    disabled_dates(&dates)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let disabled = disabled_dates(&[]);
        assert_eq!(disabled, DisabledDates::default());
        assert!(!disabled.contains(ymd(2024, 5, 1)));
    }

    #[test]
    fn test_bounds_and_gaps() {
        let available = [ymd(2024, 5, 6), ymd(2024, 5, 2), ymd(2024, 5, 3)];
        let disabled = disabled_dates(&available);

        assert_eq!(disabled.before, Some(ymd(2024, 5, 2)));
        assert_eq!(disabled.after, Some(ymd(2024, 5, 6)));
        assert_eq!(disabled.dates, vec![ymd(2024, 5, 4), ymd(2024, 5, 5)]);

        assert!(disabled.contains(ymd(2024, 5, 1)));
        assert!(disabled.contains(ymd(2024, 5, 7)));
        assert!(disabled.contains(ymd(2024, 5, 5)));
    }

    #[test]
    fn test_available_dates_never_disabled() {
        let available = [
            ymd(2024, 2, 27),
            ymd(2024, 3, 1),
            ymd(2024, 3, 31),
            ymd(2024, 4, 1),
        ];
        let disabled = disabled_dates(&available);
        for date in available {
            assert!(!disabled.contains(date), "{date} should be selectable");
        }
        // 2024 is a leap year: Feb 28, Feb 29 are gaps
        assert!(disabled.dates.contains(&ymd(2024, 2, 29)));
    }

    #[test]
    fn test_idempotent() {
        let available = [ymd(2024, 5, 1), ymd(2024, 5, 4), ymd(2024, 5, 1)];
        assert_eq!(disabled_dates(&available), disabled_dates(&available));
    }

    #[test]
    fn test_crosses_dst_change() {
        // Europe/Amsterdam switches to summer time on 2024-03-31
        let available = [ymd(2024, 3, 30), ymd(2024, 4, 1)];
        assert_eq!(disabled_dates(&available).dates, vec![ymd(2024, 3, 31)]);
    }

    #[test]
    fn test_single_date() {
        let disabled = disabled_dates(&[ymd(2024, 5, 1)]);
        assert!(disabled.dates.is_empty());
        assert!(disabled.contains(ymd(2024, 4, 30)));
        assert!(!disabled.contains(ymd(2024, 5, 1)));
    }
}
