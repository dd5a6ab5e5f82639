//! Time-windowed edit gate.
//!
//! Some kinds of record may only be changed for a short time after they were created. These
//! checks are pure: the caller passes `now`, so they are deterministic in tests and never read
//! the clock themselves.

use chrono::{DateTime, Duration, Utc};
use records::Record;

fn elapsed(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    // A creation time ahead of `now` (clock skew) counts as just created.
    (now - created_at).max(Duration::zero())
}

/// Returns true iff less than `window` has elapsed since `created_at`.
///
/// A missing creation timestamp is never editable.
pub fn is_editable(created_at: Option<DateTime<Utc>>, window: Duration, now: DateTime<Utc>) -> bool {
    match created_at {
        Some(created_at) => elapsed(created_at, now) < window,
        None => false,
    }
}

pub fn is_record_editable<R: Record>(record: &R, window: Duration, now: DateTime<Utc>) -> bool {
    is_editable(record.created_at(), window, now)
}

/// Time left before the window closes, `None` once it has closed or when the creation time is
/// unknown.
pub fn remaining(
    created_at: Option<DateTime<Utc>>,
    window: Duration,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let left = window.checked_sub(&elapsed(created_at?, now))?;
    (left > Duration::zero()).then_some(left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use records::PrescriptionRecord;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn inside_window_is_editable() {
        assert!(is_editable(Some(at(0)), Duration::minutes(10), at(9 * 60)));
    }

    #[test]
    fn window_boundary_is_closed() {
        assert!(!is_editable(Some(at(0)), Duration::minutes(10), at(10 * 60)));
        assert!(is_editable(Some(at(0)), Duration::minutes(10), at(10 * 60 - 1)));
    }

    #[test]
    fn missing_timestamp_fails_closed() {
        assert!(!is_editable(None, Duration::days(365), at(0)));
        assert_eq!(remaining(None, Duration::days(365), at(0)), None);
    }

    #[test]
    fn future_timestamp_counts_as_just_created() {
        assert!(is_editable(Some(at(60)), Duration::minutes(10), at(0)));
        assert_eq!(
            remaining(Some(at(60)), Duration::minutes(10), at(0)),
            Some(Duration::minutes(10))
        );
    }

    #[test]
    fn zero_window_is_never_editable() {
        assert!(!is_editable(Some(at(0)), Duration::zero(), at(0)));
    }

    #[test]
    fn remaining_counts_down_then_closes() {
        let window = Duration::hours(1);
        assert_eq!(remaining(Some(at(0)), window, at(15 * 60)), Some(Duration::minutes(45)));
        assert_eq!(remaining(Some(at(0)), window, at(60 * 60)), None);
    }

    #[test]
    fn extreme_negative_window_is_closed_without_overflow() {
        assert_eq!(remaining(Some(at(-5)), Duration::MIN, at(0)), None);
        assert!(!is_editable(Some(at(-5)), Duration::MIN, at(0)));
    }

    #[test]
    fn prescription_window_is_measured_from_date_issued() {
        let prescription = PrescriptionRecord {
            date_issued: Some(at(0)),
            ..Default::default()
        };
        assert!(is_record_editable(&prescription, Duration::hours(1), at(59 * 60)));
        assert!(!is_record_editable(&prescription, Duration::hours(1), at(61 * 60)));
        assert!(!is_record_editable(
            &PrescriptionRecord::default(),
            Duration::hours(1),
            at(0)
        ));
    }

    proptest! {
        #[test]
        fn editability_is_monotonic_in_now(
            created in -10_000i64..10_000,
            window in 0i64..5_000,
            t1 in -20_000i64..20_000,
            dt in 0i64..20_000,
        ) {
            let window = Duration::seconds(window);
            let earlier = is_editable(Some(at(created)), window, at(t1));
            let later = is_editable(Some(at(created)), window, at(t1 + dt));
            // Once closed, a window never reopens.
            prop_assert!(earlier || !later);
        }

        #[test]
        fn remaining_agrees_with_is_editable(
            created in -10_000i64..10_000,
            window in 0i64..5_000,
            now in -20_000i64..20_000,
        ) {
            let window = Duration::seconds(window);
            let open = is_editable(Some(at(created)), window, at(now));
            prop_assert_eq!(open, remaining(Some(at(created)), window, at(now)).is_some());
        }
    }
}
