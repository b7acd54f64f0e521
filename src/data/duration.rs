//! Human-readable durations for configuration values.

use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Suffix to milliseconds multiplier. Longer suffixes first so `ms` wins over `s`.
const UNITS: &[(&str, f64)] = &[("ms", 1.0), ("min", 60_000.0), ("s", 1_000.0)];

/// Parse strings like `"2s"`, `"500ms"`, `"1.5s"` or `"1min"`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(value) = s.strip_suffix(suffix) {
            let value: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("invalid duration {:?}", s))?;
            if !value.is_finite() || value < 0.0 {
                bail!("duration must be a non-negative number: {:?}", s);
            }
            return Duration::try_from_secs_f64(value * multiplier / 1_000.0)
                .with_context(|| format!("duration out of range: {:?}", s));
        }
    }

    bail!("unknown duration format {:?} (expected ms, s or min)", s)
}

/// Short form for the status bar, e.g. `"350ms"` or `"2.5s"`.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1_000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m{:02}s", d.as_secs() / 60, d.as_secs() % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration(" 500ms ").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("1min").unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("1e30s").is_err());
        assert!(parse_duration("1e30min").is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format_duration(Duration::from_millis(350)), "350ms");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m05s");
    }
}
