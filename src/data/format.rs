use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};

/// Offset used when a configured one is out of range: America/Sao_Paulo.
pub const DEFAULT_UTC_OFFSET_MINUTES: i64 = -180;

/// Accepted layouts for timestamps that carry no offset.
const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// pt-BR date and 24-hour time.
const DISPLAY_LAYOUT: &str = "%d/%m/%Y %H:%M";

/// Build a fixed display offset from minutes east of UTC.
pub fn display_offset(minutes: i64) -> FixedOffset {
    i32::try_from(minutes.saturating_mul(60))
        .ok()
        .and_then(FixedOffset::east_opt)
        .or_else(|| FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES as i32 * 60))
        .unwrap_or_else(|| Utc.fix())
}

/// Localize a backend timestamp as `dd/mm/yyyy HH:MM`.
///
/// Timestamps with an offset are converted to `offset`; naive timestamps are
/// taken as already local. Unparsable input is returned verbatim and an
/// absent timestamp renders as `-`.
pub fn format_timestamp(raw: Option<&str>, offset: FixedOffset) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return "-".to_string();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&offset).format(DISPLAY_LAYOUT).to_string();
    }

    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .map(|dt| dt.format(DISPLAY_LAYOUT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// One decimal place.
pub fn format_decimal(value: f64) -> String {
    format!("{:.1}", value)
}

pub fn format_celsius(value: f64) -> String {
    format!("{:.1}°C", value)
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Optional reading, `-` when absent.
pub fn format_optional(value: Option<f64>, format: fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| "-".to_string())
}

/// Format large counts with K/M suffixes.
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        display_offset(0)
    }

    #[test]
    fn test_format_utc_timestamp_in_sao_paulo() {
        let offset = display_offset(-180);
        assert_eq!(
            format_timestamp(Some("2024-01-01T00:00:00Z"), offset),
            "31/12/2023 21:00"
        );
    }

    #[test]
    fn test_format_offset_timestamp() {
        assert_eq!(
            format_timestamp(Some("2024-03-05T14:07:09.123456-03:00"), utc()),
            "05/03/2024 17:07"
        );
    }

    #[test]
    fn test_format_naive_timestamp_is_taken_as_local() {
        assert_eq!(
            format_timestamp(Some("2024-03-05T08:05:00"), display_offset(-180)),
            "05/03/2024 08:05"
        );
        assert_eq!(
            format_timestamp(Some("2024-03-05 08:05:00.5"), utc()),
            "05/03/2024 08:05"
        );
    }

    #[test]
    fn test_format_bad_and_missing_timestamps() {
        assert_eq!(format_timestamp(Some("yesterday"), utc()), "yesterday");
        assert_eq!(format_timestamp(None, utc()), "-");
        assert_eq!(format_timestamp(Some("  "), utc()), "-");
    }

    #[test]
    fn test_out_of_range_offset_falls_back() {
        let offset = display_offset(100_000);
        assert_eq!(offset.local_minus_utc(), -180 * 60);
    }

    #[test]
    fn test_decimal_formatting() {
        assert_eq!(format_decimal(20.0), "20.0");
        assert_eq!(format_decimal(18.26), "18.3");
        assert_eq!(format_celsius(17.04), "17.0°C");
        assert_eq!(format_percent(61.96), "62.0%");
        assert_eq!(format_optional(None, format_celsius), "-");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_500), "1.5K");
        assert_eq!(format_count(2_000_000), "2.0M");
    }
}
