//! Conversion of displayed video lengths into seconds

use tracing::warn;

/// Convert a displayed duration (`MM:SS` or `HH:MM:SS`) into whole seconds.
///
/// Any other shape yields 0. Non-numeric segments also yield 0 and are logged,
/// never raised: the value only feeds the short-clip filter.
pub fn parse_duration(duration_text: &str) -> u64 {
    let parts: Vec<&str> = duration_text.trim().split(':').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return 0;
    }

    let mut values = Vec::with_capacity(parts.len());
    for part in &parts {
        match part.trim().parse::<u64>() {
            Ok(value) => values.push(value),
            Err(e) => {
                warn!("Failed to parse duration '{}': {}", duration_text, e);
                return 0;
            }
        }
    }

    let total = match values.as_slice() {
        [minutes, seconds] => minutes.checked_mul(60).and_then(|m| m.checked_add(*seconds)),
        [hours, minutes, seconds] => hours
            .checked_mul(3600)
            .zip(minutes.checked_mul(60))
            .and_then(|(h, m)| h.checked_add(m))
            .and_then(|hm| hm.checked_add(*seconds)),
        _ => Some(0),
    };

    total.unwrap_or_else(|| {
        warn!("Duration '{}' is out of range", duration_text);
        0
    })
}

/// Format seconds back into the `H:MM:SS` / `M:SS` display form
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_and_seconds() {
        assert_eq!(parse_duration("1:05"), 65);
        assert_eq!(parse_duration("10:03"), 603);
        assert_eq!(parse_duration("0:45"), 45);
    }

    #[test]
    fn test_hours_minutes_seconds() {
        assert_eq!(parse_duration("1:02:03"), 3723);
    }

    #[test]
    fn test_unexpected_shapes_yield_zero() {
        assert_eq!(parse_duration("abc"), 0);
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("1:2:3:4"), 0);
        assert_eq!(parse_duration("42"), 0);
        assert_eq!(parse_duration("999999999999999999:00"), 0);
        assert_eq!(parse_duration("18446744073709551615:00:00"), 0);
    }

    #[test]
    fn test_non_numeric_segments_yield_zero() {
        assert_eq!(parse_duration("SHORTS:00"), 0);
        assert_eq!(parse_duration("1:xx"), 0);
        assert_eq!(parse_duration("-1:00"), 0);
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        assert_eq!(parse_duration("  2:10\n"), 130);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3723), "1:02:03");
        assert_eq!(format_duration(0), "0:00");
    }
}
