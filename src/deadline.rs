//! Deadline parsing and countdown arithmetic.
//!
//! Timestamps may arrive with or without an offset. Anything without one is
//! read as UTC before two instants are compared, so mixing both kinds is
//! always well defined.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_HOUR: u64 = 3_600;

/// Conversion to an explicit UTC instant.
pub trait IntoUtc {
    fn into_utc(self) -> DateTime<Utc>;
}

impl IntoUtc for NaiveDateTime {
    fn into_utc(self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self)
    }
}

impl<Tz: TimeZone> IntoUtc for DateTime<Tz> {
    fn into_utc(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

/// True iff `deadline` is strictly before `reference`.
pub fn is_late(deadline: impl IntoUtc, reference: impl IntoUtc) -> bool {
    deadline.into_utc() < reference.into_utc()
}

/// Human readable time left before (or elapsed since) `deadline`.
pub fn countdown(deadline: impl IntoUtc, reference: impl IntoUtc) -> String {
    let deadline = deadline.into_utc();
    let reference = reference.into_utc();

    let seconds = (deadline - reference).num_seconds().unsigned_abs();
    let days = seconds / SECONDS_PER_DAY;
    let hours = (seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR;

    if is_late(deadline, reference) {
        format!("En retard de {days}j {hours}h")
    } else {
        format!("{days}j {hours}h restantes")
    }
}

/// Parses a `YYYY-MM-DD` form value into the last instant of that day (UTC).
///
/// Blank input means "no deadline"; anything else that is not a calendar
/// date is an error.
pub fn parse_deadline(input: &str) -> Result<Option<DateTime<Utc>>, chrono::ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")?;
    Ok(date
        .and_hms_micro_opt(23, 59, 59, 999_999)
        .map(|end_of_day| end_of_day.into_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};
    use proptest::prelude::*;

    fn naive(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn aware(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn one_hour_left_against_naive_reference() {
        let deadline = aware("2030-01-02T00:00:00Z");
        let reference = naive("2030-01-01T23:00:00");

        assert_eq!(countdown(deadline, reference), "0j 1h restantes");
        assert!(!is_late(deadline, reference));
    }

    #[test]
    fn reports_overdue_time() {
        let deadline = naive("2030-01-01T00:00:00");
        let reference = aware("2030-01-03T05:30:00+00:00");

        assert_eq!(countdown(deadline, reference), "En retard de 2j 5h");
        assert!(is_late(deadline, reference));
    }

    #[test]
    fn equal_instants_are_not_late() {
        let deadline = aware("2030-01-01T12:00:00+02:00");
        let reference = naive("2030-01-01T10:00:00");

        assert!(!is_late(deadline, reference));
        assert_eq!(countdown(deadline, reference), "0j 0h restantes");
    }

    #[test]
    fn offsets_are_honoured() {
        // 23:00 at UTC-02:00 is 01:00 UTC the next day.
        let deadline = aware("2030-01-01T23:00:00-02:00");
        let reference = naive("2030-01-02T00:00:00");

        assert!(!is_late(deadline, reference));
        assert_eq!(countdown(deadline, reference), "0j 1h restantes");
    }

    #[test]
    fn sub_second_lateness_is_still_late() {
        let reference = aware("2030-01-01T00:00:01Z").with_timezone(&Utc);
        let deadline = reference - chrono::Duration::milliseconds(500);

        assert!(is_late(deadline, reference));
        assert_eq!(countdown(deadline, reference), "En retard de 0j 0h");
    }

    #[test]
    fn parses_deadline_to_end_of_day() {
        let deadline = parse_deadline(" 2030-05-17 ").unwrap().unwrap();
        assert_eq!(deadline.date_naive(), NaiveDate::from_ymd_opt(2030, 5, 17).unwrap());
        assert_eq!((deadline.hour(), deadline.minute(), deadline.second()), (23, 59, 59));
        assert_eq!(deadline.nanosecond(), 999_999_000);
    }

    #[test]
    fn blank_deadline_is_absent() {
        assert_eq!(parse_deadline(""), Ok(None));
        assert_eq!(parse_deadline("   "), Ok(None));
    }

    #[test]
    fn malformed_deadline_is_an_error() {
        assert!(parse_deadline("17/05/2030").is_err());
        assert!(parse_deadline("2030-02-30").is_err());
        assert!(parse_deadline("tomorrow").is_err());
    }

    proptest! {
        #[test]
        fn lateness_agrees_with_countdown(
            deadline_secs in -4_000_000_000i64..4_000_000_000,
            deadline_nanos in 0u32..1_000_000_000,
            reference_secs in -4_000_000_000i64..4_000_000_000,
            offset in -86_399i32..86_399,
            naive_deadline in any::<bool>(),
        ) {
            let deadline_utc = DateTime::<Utc>::from_timestamp(deadline_secs, deadline_nanos).unwrap();
            let reference_utc = DateTime::<Utc>::from_timestamp(reference_secs, 0).unwrap();
            let zone = FixedOffset::east_opt(offset).unwrap();
            let expected = deadline_utc < reference_utc;

            let (late, text) = if naive_deadline {
                let deadline = deadline_utc.naive_utc();
                let reference = reference_utc.with_timezone(&zone);
                (is_late(deadline, reference), countdown(deadline, reference))
            } else {
                let deadline = deadline_utc.with_timezone(&zone);
                let reference = reference_utc.naive_utc();
                (is_late(deadline, reference), countdown(deadline, reference))
            };

            prop_assert_eq!(late, expected);
            prop_assert_eq!(text.starts_with("En retard"), late);
            prop_assert_eq!(text.ends_with("restantes"), !late);
        }
    }
}
