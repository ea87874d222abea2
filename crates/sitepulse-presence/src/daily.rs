//! Daily counter rollover.
//!
//! `today_visitors` belongs to the local calendar day of the counters row's
//! `last_updated`. The first operation that observes a later local day resets
//! it to zero.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sitepulse_store::VisitorCounters;

/// The local calendar date of `ts` in the given offset.
#[must_use]
pub fn local_date(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

/// Whether `now` falls on a later local day than `last_updated`.
///
/// A clock that moved backwards never triggers a reset.
#[must_use]
pub fn is_new_day(last_updated: DateTime<Utc>, now: DateTime<Utc>, offset: FixedOffset) -> bool {
    local_date(now, offset) > local_date(last_updated, offset)
}

/// Reset `today_visitors` if the row was last updated on an earlier local day.
///
/// Stamps `last_updated` with `now` when a reset happens so the reset is
/// applied at most once per day. Returns `true` if the row changed.
pub fn roll_over(counters: &mut VisitorCounters, now: DateTime<Utc>, offset: FixedOffset) -> bool {
    if !is_new_day(counters.last_updated, now, offset) {
        return false;
    }

    tracing::info!(
        counters_id = %counters.counters_id,
        previous_today = counters.today_visitors,
        last_updated = %counters.last_updated,
        "Resetting daily visitor count"
    );

    counters.today_visitors = 0;
    counters.last_updated = now;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, TimeZone};
    use sitepulse_core::CountersId;

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    #[test]
    fn same_day_is_not_new() {
        let morning = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 1).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 59).unwrap();
        assert!(!is_new_day(morning, night, utc()));
    }

    #[test]
    fn midnight_crossing_is_new() {
        let before = Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        assert!(is_new_day(before, after, utc()));
    }

    #[test]
    fn backwards_clock_is_not_new() {
        let later = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 5).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 0).unwrap();
        assert!(!is_new_day(later, earlier, utc()));
    }

    #[test]
    fn offset_moves_the_boundary() {
        // 16:59 UTC and 17:01 UTC straddle midnight in UTC+7
        let wib = FixedOffset::east_opt(7 * 3600).unwrap();
        let before = Utc.with_ymd_and_hms(2024, 6, 1, 16, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 6, 1, 17, 1, 0).unwrap();

        assert!(is_new_day(before, after, wib));
        assert!(!is_new_day(before, after, utc()));
    }

    #[test]
    fn roll_over_resets_once() {
        let day1 = Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 6, 2, 8, 0, 0).unwrap();

        let mut counters = VisitorCounters::zeroed(CountersId::generate(), day1);
        counters.total_visitors = 10;
        counters.today_visitors = 4;

        assert!(roll_over(&mut counters, day2, utc()));
        assert_eq!(counters.today_visitors, 0);
        assert_eq!(counters.total_visitors, 10);
        assert_eq!(counters.last_updated, day2);

        counters.today_visitors = 1;
        assert!(!roll_over(&mut counters, day2, utc()));
        assert_eq!(counters.today_visitors, 1);
    }
}
