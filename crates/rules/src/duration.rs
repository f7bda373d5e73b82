//! Human-readable interval parsing for relative-time rule values.
//!
//! Two grammars are accepted:
//!
//! - clock form, as produced by databases and by [`humanize`] for negative
//!   intervals: `"-1 day, -1:01:01"`, `"50 days 00:00:00"`, `"2:30"`. A
//!   leading `-` on the clock part applies to hours, minutes and seconds.
//! - free form: optional `<number><unit>` tokens for weeks, days, hours,
//!   minutes and seconds in that order (`"1 hour, 5 mins"`, `"1.5 days"`,
//!   `"2wks"`). Separator runs are any non-word characters, which means a
//!   `-` following a separator is consumed as separator, not as a sign:
//!   only the first token can carry a sign.

use std::sync::LazyLock;

use chrono::Duration;
use regex::{Captures, Regex};

use crate::error::{Result, RuleError};

static CLOCK_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((?P<days>[-+]?\d+) days?,? )?(?P<sign>[-+]?)(?P<hours>\d+):(?P<minutes>\d+)(:(?P<seconds>\d+(\.\d+)?))?$",
    )
    .expect("clock duration regex")
});

static FREE_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^((?P<weeks>-?((\d*\.\d+)|\d+))\W*w((ee)?(k(s)?)?)(,)?\W*)?",
        r"((?P<days>-?((\d*\.\d+)|\d+))\W*d(ay(s)?)?(,)?\W*)?",
        r"((?P<hours>-?((\d*\.\d+)|\d+))\W*h(ou)?(r(s)?)?(,)?\W*)?",
        r"((?P<minutes>-?((\d*\.\d+)|\d+))\W*m(in(ute)?(s)?)?(,)?\W*)?",
        r"((?P<seconds>-?((\d*\.\d+)|\d+))\W*s(ec(ond)?(s)?)?)?\W*$",
    ))
    .expect("free-form duration regex")
});

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_WEEK: f64 = 604_800.0;

fn number(caps: &Captures<'_>, name: &str) -> f64 {
    caps.name(name)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn from_seconds(total: f64) -> Duration {
    Duration::microseconds((total * 1_000_000.0).round() as i64)
}

/// Parse an interval string into a signed duration.
///
/// # Errors
///
/// Returns [`RuleError::Duration`] when the trimmed input is empty or
/// matches neither grammar.
pub fn parse(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RuleError::Duration(trimmed.to_string()));
    }

    if let Some(caps) = CLOCK_FORMAT.captures(trimmed) {
        let sign = if caps.name("sign").map(|m| m.as_str()) == Some("-") {
            -1.0
        } else {
            1.0
        };
        let clock = number(&caps, "hours") * SECONDS_PER_HOUR
            + number(&caps, "minutes") * SECONDS_PER_MINUTE
            + number(&caps, "seconds");
        let total = number(&caps, "days") * SECONDS_PER_DAY + sign * clock;
        return Ok(from_seconds(total));
    }

    let caps = FREE_FORMAT
        .captures(trimmed)
        .ok_or_else(|| RuleError::Duration(trimmed.to_string()))?;
    let total = number(&caps, "weeks") * SECONDS_PER_WEEK
        + number(&caps, "days") * SECONDS_PER_DAY
        + number(&caps, "hours") * SECONDS_PER_HOUR
        + number(&caps, "minutes") * SECONDS_PER_MINUTE
        + number(&caps, "seconds");
    Ok(from_seconds(total))
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

fn seconds_text(secs: i64, micros: i64) -> String {
    if micros == 0 {
        return plural(secs, "second");
    }
    let frac = format!("{micros:06}");
    format!("{secs}.{} seconds", frac.trim_end_matches('0'))
}

/// Render a duration so that [`parse`] reads it back unchanged.
///
/// Non-negative values use the verbose form (`"1 day, 2 hours"`, zero is
/// `"0 seconds"`); negative values use the normalized clock form
/// (`"-2 days, 22:58:59"`) because the free form cannot carry more than one
/// sign.
pub fn humanize(d: Duration) -> String {
    let total_micros = d.num_microseconds().unwrap_or(i64::MAX);
    let micros_per_day = 86_400_000_000i64;

    if total_micros < 0 {
        let days = total_micros.div_euclid(micros_per_day);
        let rem = total_micros.rem_euclid(micros_per_day);
        let secs = rem / 1_000_000;
        let micros = rem % 1_000_000;
        let clock = format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60);
        let clock = if micros == 0 {
            clock
        } else {
            format!("{clock}.{micros:06}")
        };
        let day_word = if days == -1 { "day" } else { "days" };
        return format!("{days} {day_word}, {clock}");
    }

    let secs_total = total_micros / 1_000_000;
    let micros = total_micros % 1_000_000;
    let days = secs_total / 86_400;
    let hours = (secs_total % 86_400) / 3_600;
    let minutes = (secs_total % 3_600) / 60;
    let secs = secs_total % 60;

    let mut parts = Vec::new();
    if days != 0 {
        parts.push(plural(days, "day"));
    }
    if hours != 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes != 0 {
        parts.push(plural(minutes, "minute"));
    }
    if secs != 0 || micros != 0 || parts.is_empty() {
        parts.push(seconds_text(secs, micros));
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(d: Duration) -> i64 {
        d.num_seconds()
    }

    #[test]
    fn free_form_units() {
        let cases = [
            ("1 day", 86_400),
            ("2 days", 172_800),
            ("1 d", 86_400),
            ("1 hour", 3_600),
            ("1 hours", 3_600),
            ("1 hr", 3_600),
            ("1 hrs", 3_600),
            ("1h", 3_600),
            ("1wk", 604_800),
            ("1 week", 604_800),
            ("2 wks", 1_209_600),
            ("1 sec", 1),
            ("1 secs", 1),
            ("1 s", 1),
            ("1 second", 1),
            ("1 seconds", 1),
            ("1 minute", 60),
            ("1 min", 60),
            ("1 m", 60),
            ("1 mins", 60),
            ("3 weeks", 1_814_400),
            ("0 seconds", 0),
            ("0 weeks", 0),
            ("7days", 604_800),
        ];
        for (input, expected) in cases {
            assert_eq!(secs(parse(input).unwrap()), expected, "input {input:?}");
        }
    }

    #[test]
    fn fractional_values() {
        assert_eq!(secs(parse("1.5 days").unwrap()), 129_600);
        assert_eq!(secs(parse("4.2 hours").unwrap()), 15_120);
        assert_eq!(secs(parse(".5 hours").unwrap()), 1_800);
    }

    #[test]
    fn combined_tokens() {
        assert_eq!(secs(parse("1 hour, 5 mins").unwrap()), 3_900);
        assert_eq!(secs(parse("-2 days").unwrap()), -172_800);
    }

    #[test]
    fn separators_swallow_later_signs() {
        // Only the leading token keeps its sign.
        let d = parse("-1 weeks, 2 days, -3 hours, 4 minutes, -5 seconds").unwrap();
        assert_eq!(secs(d), -5 * 86_400 + 11_045);
    }

    #[test]
    fn clock_form() {
        assert_eq!(secs(parse("-1 day 0:00:01").unwrap()), -86_400 + 1);
        assert_eq!(secs(parse("-1 day, -1:01:01").unwrap()), -2 * 86_400 + 82_739);
        assert_eq!(secs(parse("  50 days 00:00:00   ").unwrap()), 50 * 86_400);
        assert_eq!(secs(parse("2:30").unwrap()), 9_000);
    }

    #[test]
    fn rejects_invalid_intervals() {
        for input in ["", "   ", "hours", " hours", "2 ws", "2 ds", "2 hs", "2 ms", "2 ss", "2 months"] {
            let err = parse(input).unwrap_err();
            assert!(
                matches!(err, RuleError::Duration(_)),
                "expected duration error for {input:?}"
            );
        }
    }

    #[test]
    fn error_message_names_input() {
        let err = parse(" 2 ws ").unwrap_err();
        assert_eq!(err.to_string(), "'2 ws' is not a valid time interval");
    }

    #[test]
    fn humanize_round_trips() {
        for d in [
            Duration::zero(),
            Duration::seconds(90_061),
            Duration::days(3),
            Duration::milliseconds(1_500),
            Duration::seconds(-90_061),
            Duration::seconds(-1),
            Duration::microseconds(-2_500_000),
        ] {
            let text = humanize(d);
            assert_eq!(parse(&text).unwrap(), d, "round trip via {text:?}");
        }
    }

    #[test]
    fn humanize_shapes() {
        assert_eq!(humanize(Duration::zero()), "0 seconds");
        assert_eq!(humanize(Duration::seconds(90_061)), "1 day, 1 hour, 1 minute, 1 second");
        assert_eq!(humanize(Duration::seconds(-90_061)), "-2 days, 22:58:59");
        assert_eq!(humanize(Duration::seconds(-1)), "-1 day, 23:59:59");
    }
}
