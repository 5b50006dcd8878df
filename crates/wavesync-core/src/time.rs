//! Display formatting for playback positions and durations

/// Format milliseconds as `minutes:seconds`, seconds zero-padded to 2 digits
///
/// Minutes are not wrapped into hours: `3661000` formats as `61:01`.
pub fn format_time(milliseconds: u64) -> String {
    let seconds = milliseconds / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(75_000), "1:15");
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(3_661_000), "61:01");
    }

    #[test]
    fn test_format_time_drops_sub_second_remainder() {
        assert_eq!(format_time(999), "0:00");
        assert_eq!(format_time(59_999), "0:59");
        assert_eq!(format_time(60_000), "1:00");
    }
}
