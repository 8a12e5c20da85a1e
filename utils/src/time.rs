//! Time formatting helpers.

/// Format a number of seconds as a short human-readable duration.
///
/// Only the two most significant units are shown: `"45s"`, `"3m 20s"`,
/// `"5h 12m"`, `"2d 4h"`.
pub fn format_duration(secs: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    match secs {
        s if s < MINUTE => format!("{s}s"),
        s if s < HOUR => format!("{}m {}s", s / MINUTE, s % MINUTE),
        s if s < DAY => format!("{}h {}m", s / HOUR, (s % HOUR) / MINUTE),
        s => format!("{}d {}h", s / DAY, (s % DAY) / HOUR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_two_largest_units() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(200), "3m 20s");
        assert_eq!(format_duration(5 * 3600 + 12 * 60 + 9), "5h 12m");
        assert_eq!(format_duration(2 * 86_400 + 4 * 3600 + 30), "2d 4h");
    }
}
