//! Cron expressions accepted by the configuration file

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macros understood by the scheduler in place of a field list
const MACROS: &[&str] = &[
    "@yearly",
    "@annually",
    "@monthly",
    "@weekly",
    "@daily",
    "@hourly",
];

/// A validated cron expression
///
/// Accepts the classic 5-field form (minute precision), the 6/7-field form
/// with seconds (and year), or one of the `@hourly` style macros. 5-field
/// expressions are stored with a leading `0` seconds field so every spec can
/// be handed to the scheduler as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CronSpec(String);

impl CronSpec {
    /// Run at the top of every hour
    pub fn hourly() -> Self {
        Self("@hourly".to_string())
    }

    /// Normalized expression, ready for the scheduler
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate and normalize a raw expression
    pub fn parse(raw: &str) -> Result<Self, CronSpecError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CronSpecError::Empty);
        }

        if raw.starts_with('@') {
            let lowered = raw.to_ascii_lowercase();
            return if MACROS.contains(&lowered.as_str()) {
                Ok(Self(lowered))
            } else {
                Err(CronSpecError::UnknownMacro(raw.to_string()))
            };
        }

        let fields: Vec<&str> = raw.split_whitespace().collect();
        let normalized = match fields.len() {
            5 => format!("0 {}", fields.join(" ")),
            6 | 7 => fields.join(" "),
            n => return Err(CronSpecError::FieldCount(n)),
        };

        cron::Schedule::from_str(&normalized).map_err(|e| CronSpecError::Invalid {
            expr: raw.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self(normalized))
    }

    /// Build the schedule for this expression
    pub fn schedule(&self) -> Result<cron::Schedule, CronSpecError> {
        cron::Schedule::from_str(&self.0).map_err(|e| CronSpecError::Invalid {
            expr: self.0.clone(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for CronSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CronSpec {
    type Err = CronSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CronSpec {
    type Error = CronSpecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CronSpec> for String {
    fn from(spec: CronSpec) -> Self {
        spec.0
    }
}

/// Cron validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CronSpecError {
    #[error("cron expression is empty")]
    Empty,

    #[error("unknown cron macro: {0}")]
    UnknownMacro(String),

    #[error("cron expression must have 5, 6 or 7 fields, got {0}")]
    FieldCount(usize),

    #[error("invalid cron expression '{expr}': {reason}")]
    Invalid { expr: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_fields_get_seconds() {
        let spec = CronSpec::parse("*/5 * * * *").unwrap();
        assert_eq!(spec.as_str(), "0 */5 * * * *");
        assert!(spec.schedule().is_ok());
    }

    #[test]
    fn test_six_fields_kept() {
        let spec = CronSpec::parse("30 0 * * * *").unwrap();
        assert_eq!(spec.as_str(), "30 0 * * * *");
    }

    #[test]
    fn test_macros() {
        assert_eq!(CronSpec::parse("@Hourly").unwrap(), CronSpec::hourly());
        assert!(CronSpec::hourly().schedule().is_ok());
        assert!(matches!(
            CronSpec::parse("@every 5m"),
            Err(CronSpecError::UnknownMacro(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(CronSpec::parse("  "), Err(CronSpecError::Empty));
        assert_eq!(CronSpec::parse("* *"), Err(CronSpecError::FieldCount(2)));
        assert!(matches!(
            CronSpec::parse("99 * * * *"),
            Err(CronSpecError::Invalid { .. })
        ));
    }

    #[test]
    fn test_deserialize() {
        let spec: CronSpec = serde_json::from_str("\"0 0 * * *\"").unwrap();
        assert_eq!(spec.as_str(), "0 0 0 * * *");
        assert!(serde_json::from_str::<CronSpec>("\"nope\"").is_err());
    }
}
