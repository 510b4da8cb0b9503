//! Numeric conversion and display helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Ceil a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn ceil_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    saturate_to_i64(value.ceil())
}

/// Round a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    saturate_to_i64(value.round())
}

// `i64::MAX as f64` rounds up to 2^63, which no longer fits, so both ends
// saturate before the checked cast.
fn saturate_to_i64(whole: f64) -> i64 {
    cast::<f64, i64>(whole).unwrap_or(if whole < 0.0 { i64::MIN } else { i64::MAX })
}

/// Rounded integer with thousands separators: `1234567.4` -> `1,234,567`.
#[must_use]
pub fn format_grouped(value: f64) -> String {
    let rounded = round_f64_to_i64(value);
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

const SUFFIXES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "k")];

/// Compact display with one decimal and a magnitude suffix: `12345` -> `12.3k`.
#[must_use]
pub fn format_short(value: f64) -> String {
    let magnitude = value.abs();
    for (scale, suffix) in SUFFIXES {
        if magnitude >= scale {
            return format!("{:.1}{suffix}", value / scale);
        }
    }
    if magnitude >= 100.0 || value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// `h:mm:ss` below a day, `Nd hh:mm:ss` above. Seconds are rounded up.
#[must_use]
pub fn format_duration(secs: f64) -> String {
    let total = ceil_f64_to_i64(secs);
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    let (days, rest) = (total / 86_400, total % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    if days > 0 {
        format!("{sign}{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{hours}:{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_clamps_and_handles_nan() {
        assert_eq!(ceil_f64_to_i64(1.2), 2);
        assert_eq!(ceil_f64_to_i64(f64::NAN), 0);
        assert_eq!(ceil_f64_to_i64(f64::MAX), i64::MAX);
        assert_eq!(ceil_f64_to_i64(9.3e18), i64::MAX);
        assert_eq!(ceil_f64_to_i64(-f64::MAX), i64::MIN);
    }

    #[test]
    fn round_saturates_at_both_ends() {
        assert_eq!(round_f64_to_i64(2.5), 3);
        assert_eq!(round_f64_to_i64(1.0e300), i64::MAX);
        assert_eq!(round_f64_to_i64(-1.0e300), i64::MIN);
        assert_eq!(round_f64_to_i64(f64::INFINITY), 0);
    }

    #[test]
    fn grouped_formatting() {
        assert_eq!(format_grouped(0.0), "0");
        assert_eq!(format_grouped(999.4), "999");
        assert_eq!(format_grouped(1_234_567.0), "1,234,567");
        assert_eq!(format_grouped(-12_345.0), "-12,345");
    }

    #[test]
    fn short_formatting() {
        assert_eq!(format_short(12_345.0), "12.3k");
        assert_eq!(format_short(4_500_000.0), "4.5M");
        assert_eq!(format_short(2.0e9), "2.0B");
        assert_eq!(format_short(7.0e12), "7.0T");
        assert_eq!(format_short(12.0), "12");
        assert_eq!(format_short(0.25), "0.25");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(59.2), "0:01:00");
        assert_eq!(format_duration(3_725.0), "1:02:05");
        assert_eq!(format_duration(90_061.0), "1d 01:01:01");
        assert_eq!(format_duration(-60.0), "-0:01:00");
    }
}
