use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};

const HKT_OFFSET_SECS: i32 = 8 * 3600;

/// Hong Kong Time. The territory observes no daylight saving.
pub fn hkt() -> FixedOffset {
    FixedOffset::east_opt(HKT_OFFSET_SECS).expect("+08:00 is a valid offset")
}

pub fn hkt_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&hkt())
}

/// The HKT calendar day before `now`.
pub fn previous_day(now: DateTime<FixedOffset>) -> NaiveDate {
    let today = now.with_timezone(&hkt()).date_naive();
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}
