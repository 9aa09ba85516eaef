use chrono::{DateTime, NaiveDate, Utc};

/// Accepts full RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates
/// (interpreted as midnight UTC), matching what the UI sends.
pub fn parse_iso_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let naive = date.and_hms_opt(0, 0, 0)?;
    Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_iso_datetime("2024-03-01T10:30:00+07:00").unwrap();
        assert_eq!(dt.hour(), 3);
    }

    #[test]
    fn parses_bare_dates_as_midnight_utc() {
        let dt = parse_iso_datetime("2024-03-01").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_iso_datetime("next tuesday").is_none());
        assert!(parse_iso_datetime("2024-13-77").is_none());
    }
}
