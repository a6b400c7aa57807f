use std::fmt;
use std::time::Duration;

/// Displays a duration the way Go's `time.Duration` prints:
/// `0s`, `850ns`, `1.5µs`, `12.345ms`, `1.2s`, `1m30s`, `2h0m0s`.
#[derive(Debug, Clone, Copy)]
pub struct HumanDuration(pub Duration);

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.0.as_nanos();
        if nanos == 0 {
            return f.write_str("0s");
        }
        if nanos < NANOS_PER_MICRO {
            return write!(f, "{nanos}ns");
        }
        if nanos < NANOS_PER_MILLI {
            return write_fraction(f, nanos, NANOS_PER_MICRO, 3, "µs");
        }
        if nanos < NANOS_PER_SEC {
            return write_fraction(f, nanos, NANOS_PER_MILLI, 6, "ms");
        }

        let secs = nanos / NANOS_PER_SEC;
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        if hours > 0 {
            write!(f, "{hours}h")?;
        }
        if hours > 0 || minutes > 0 {
            write!(f, "{minutes}m")?;
        }
        let rem = (secs % 60) * NANOS_PER_SEC + nanos % NANOS_PER_SEC;
        write_fraction(f, rem, NANOS_PER_SEC, 9, "s")
    }
}

/// `value / unit` with the remainder printed as a decimal fraction,
/// trailing zeros trimmed.
fn write_fraction(
    f: &mut fmt::Formatter<'_>,
    value: u128,
    unit: u128,
    digits: usize,
    suffix: &str,
) -> fmt::Result {
    let whole = value / unit;
    let frac = value % unit;
    write!(f, "{whole}")?;
    if frac > 0 {
        let padded = format!("{frac:0digits$}");
        write!(f, ".{}", padded.trim_end_matches('0'))?;
    }
    f.write_str(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn human(d: Duration) -> String {
        HumanDuration(d).to_string()
    }

    #[test]
    fn zero_is_zero_seconds() {
        assert_eq!(human(Duration::ZERO), "0s");
    }

    #[test]
    fn sub_microsecond_in_nanos() {
        assert_eq!(human(Duration::from_nanos(850)), "850ns");
    }

    #[test]
    fn microseconds_keep_fraction() {
        assert_eq!(human(Duration::from_nanos(1_500)), "1.5µs");
        assert_eq!(human(Duration::from_micros(15)), "15µs");
        assert_eq!(human(Duration::from_nanos(1_001)), "1.001µs");
    }

    #[test]
    fn milliseconds_keep_fraction() {
        assert_eq!(human(Duration::from_nanos(12_345_678)), "12.345678ms");
        assert_eq!(human(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn seconds_and_above() {
        assert_eq!(human(Duration::from_millis(1_200)), "1.2s");
        assert_eq!(human(Duration::from_secs(90)), "1m30s");
        assert_eq!(human(Duration::from_secs(7_200)), "2h0m0s");
        assert_eq!(human(Duration::from_millis(3_723_500)), "1h2m3.5s");
    }
}
