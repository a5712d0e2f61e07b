use chrono::{DateTime, FixedOffset, Offset, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Local wall-clock time for the given UTC offset. Offsets outside ±23h fall
/// back to UTC.
pub fn to_local(dt: DateTime<Utc>, utc_offset_hours: i32) -> DateTime<FixedOffset> {
    let offset = utc_offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    dt.with_timezone(&offset)
}

/// `YYYYMMDD` stamp of the local date, used in download file names.
pub fn local_date_stamp(dt: DateTime<Utc>, utc_offset_hours: i32) -> String {
    to_local(dt, utc_offset_hours).format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_stamp_uses_local_calendar_day() {
        let late_utc = Utc.with_ymd_and_hms(2025, 11, 22, 20, 30, 0).unwrap();
        assert_eq!(local_date_stamp(late_utc, 9), "20251123");
        assert_eq!(local_date_stamp(late_utc, 0), "20251122");
    }

    #[test]
    fn absurd_offset_falls_back_to_utc() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_local(dt, 99).offset().local_minus_utc(), 0);
    }
}
