//! Human duration arguments ("1d2h", "30 minutes", "permanent")

use std::fmt::Write;

const SECOND: i64 = 1000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const YEAR: i64 = 365 * DAY + 6 * HOUR;

const PERMANENT_KEYWORDS: &[&str] = &["permanent", "perm", "p", "infinite", "inf", "never"];

/// A parsed duration argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationArg {
    Permanent,
    /// Milliseconds
    Finite(i64),
}

/// Parse a duration argument
///
/// A bare number is seconds. Otherwise the input is one or more
/// `<amount><unit>` groups, optionally separated by whitespace.
pub fn parse_duration(input: &str) -> Option<DurationArg> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }
    if PERMANENT_KEYWORDS.contains(&input.as_str()) {
        return Some(DurationArg::Permanent);
    }
    if let Ok(seconds) = input.parse::<f64>() {
        return to_millis(seconds, SECOND).map(DurationArg::Finite);
    }

    let mut total: i64 = 0;
    let mut rest = input.as_str();
    while !rest.is_empty() {
        rest = rest.trim_start();
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let amount: f64 = rest[..number_len].parse().ok()?;
        rest = rest[number_len..].trim_start();

        let unit_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let unit = unit_millis(&rest[..unit_len])?;
        rest = rest[unit_len..].trim_start_matches([',', ' ']);

        total = total.checked_add(to_millis(amount, unit)?)?;
    }

    Some(DurationArg::Finite(total))
}

fn unit_millis(unit: &str) -> Option<i64> {
    let millis = match unit {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "wk" | "wks" | "week" | "weeks" => WEEK,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        _ => return None,
    };
    Some(millis)
}

#[allow(clippy::cast_precision_loss)]
fn to_millis(amount: f64, unit: i64) -> Option<i64> {
    let millis = (amount * unit as f64).round();
    (millis.is_finite() && millis >= 0.0 && millis < i64::MAX as f64).then_some(millis as i64)
}

/// Render milliseconds as "1d 2h 3m 4s"
pub fn format_duration(millis: i64) -> String {
    if millis < SECOND {
        return format!("{}ms", millis.max(0));
    }

    let mut out = String::new();
    let mut rest = millis;
    for (unit, suffix) in [(DAY, "d"), (HOUR, "h"), (MINUTE, "m"), (SECOND, "s")] {
        let amount = rest / unit;
        if amount > 0 {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{amount}{suffix}");
        }
        rest %= unit;
    }
    out
}
