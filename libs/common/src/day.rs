use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Returns the calendar day (`YYYY-MM-DD`) that `now` falls on at the given
/// UTC offset.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
///
/// let offset = kiosk_common::day::offset_from_minutes(9 * 60);
/// let now = Utc.with_ymd_and_hms(2025, 3, 1, 16, 0, 0).unwrap();
/// assert_eq!(kiosk_common::local_day(now, offset), "2025-03-02");
/// ```
pub fn local_day(now: DateTime<Utc>, offset: FixedOffset) -> String {
    now.with_timezone(&offset).format("%Y-%m-%d").to_string()
}

/// Builds a fixed offset `minutes` east of UTC. Out-of-range values fall
/// back to UTC.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}
