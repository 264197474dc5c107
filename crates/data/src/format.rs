//! Human formatting for durations and large counts.

/// Full duration: "2h 5m", "5m 20s", "42s".
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}h {m}m")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

/// Compact duration for axis ticks: "1h", "1h 30m", "30m".
pub fn format_duration_short(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    if h > 0 && m == 0 {
        format!("{h}h")
    } else if h > 0 {
        format!("{h}h {m}m")
    } else {
        format!("{m}m")
    }
}

/// Compact magnitude for non-duration ticks: "4.0M", "350k", "72".
pub fn format_magnitude(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1.0e6 {
        format!("{:.1}M", value / 1.0e6)
    } else if abs >= 1.0e3 {
        format!("{:.0}k", value / 1.0e3)
    } else {
        format!("{value:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(7500.0), "2h 5m");
        assert_eq!(format_duration(320.0), "5m 20s");
        assert_eq!(format_duration(42.4), "42s");
        assert_eq!(format_duration(-3.0), "0s");
    }

    #[test]
    fn test_format_duration_short() {
        assert_eq!(format_duration_short(3600.0), "1h");
        assert_eq!(format_duration_short(5400.0), "1h 30m");
        assert_eq!(format_duration_short(1800.0), "30m");
        assert_eq!(format_duration_short(0.0), "0m");
    }

    #[test]
    fn test_format_magnitude() {
        assert_eq!(format_magnitude(4_000_000.0), "4.0M");
        assert_eq!(format_magnitude(350_000.0), "350k");
        assert_eq!(format_magnitude(72.0), "72");
    }
}
