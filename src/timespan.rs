use crate::error::AppError;
use std::fmt;

const SECONDS_PER_HOUR: u64 = 3600;
const HOURS_PER_WEEK: u64 = 7 * 24;
const DEFAULT_HOURS: u64 = 24;

/// Reporting window selected on the submission form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timespan {
    /// No selection; the last 24 hours
    Default,
    /// "72 Hours" style selector values
    Hours(u64),
    /// "1 Week" / "2 Weeks" selector values
    Weeks(u64),
    /// Free-form number of hours typed into the custom interval field
    Custom(u64),
}

impl Timespan {
    /// Parse a period token.
    /// Empty means the default window; `Hours` and `Week` tokens use their leading number;
    /// anything else must be a whole number of hours.
    pub fn parse(token: &str) -> Result<Self, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(Timespan::Default);
        }

        let timespan = if token.contains("Hours") {
            Timespan::Hours(leading_number(token)?)
        } else if token.contains("Week") {
            Timespan::Weeks(leading_number(token)?)
        } else {
            Timespan::Custom(parse_number(token)?)
        };

        if timespan.as_secs() == 0 {
            return Err(AppError::Input(format!(
                "time period '{}' must be longer than zero",
                token
            )));
        }

        Ok(timespan)
    }

    /// Pick the custom interval when one was entered, otherwise the selector value.
    pub fn from_form(time_period: &str, custom_interval: Option<&str>) -> Result<Self, AppError> {
        match custom_interval.map(str::trim).filter(|custom| !custom.is_empty()) {
            Some(custom) => Self::parse(custom),
            None => Self::parse(time_period),
        }
    }

    pub fn as_secs(&self) -> u64 {
        match *self {
            Timespan::Default => DEFAULT_HOURS * SECONDS_PER_HOUR,
            Timespan::Hours(hours) | Timespan::Custom(hours) => hours.saturating_mul(SECONDS_PER_HOUR),
            Timespan::Weeks(weeks) => weeks
                .saturating_mul(HOURS_PER_WEEK)
                .saturating_mul(SECONDS_PER_HOUR),
        }
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Timespan::Default => write!(f, "{} Hours", DEFAULT_HOURS),
            Timespan::Hours(hours) | Timespan::Custom(hours) => write!(f, "{} Hours", hours),
            Timespan::Weeks(1) => write!(f, "1 Week"),
            Timespan::Weeks(weeks) => write!(f, "{} Weeks", weeks),
        }
    }
}

fn leading_number(token: &str) -> Result<u64, AppError> {
    let first = token.split_whitespace().next().unwrap_or_default();
    parse_number(first)
}

fn parse_number(value: &str) -> Result<u64, AppError> {
    value
        .parse::<u64>()
        .map_err(|_| AppError::Input(format!("'{}' is not a whole number of hours or weeks", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_period() {
        assert_eq!(Timespan::parse("").unwrap().as_secs(), 86_400);
        assert_eq!(Timespan::parse("   ").unwrap(), Timespan::Default);
    }

    #[test]
    fn test_hours_period() {
        assert_eq!(Timespan::parse("2 Hours").unwrap().as_secs(), 7_200);
        assert_eq!(Timespan::parse("72 Hours").unwrap(), Timespan::Hours(72));
    }

    #[test]
    fn test_week_period() {
        assert_eq!(Timespan::parse("1 Week").unwrap().as_secs(), 604_800);
        assert_eq!(Timespan::parse("2 Weeks").unwrap(), Timespan::Weeks(2));
    }

    #[test]
    fn test_custom_hours() {
        assert_eq!(Timespan::parse("5").unwrap().as_secs(), 18_000);
        assert_eq!(Timespan::parse(" 5 ").unwrap(), Timespan::Custom(5));
    }

    #[test]
    fn test_invalid_period() {
        assert!(matches!(Timespan::parse("abc"), Err(AppError::Input(_))));
        assert!(matches!(Timespan::parse("many Hours"), Err(AppError::Input(_))));
        assert!(matches!(Timespan::parse("-3"), Err(AppError::Input(_))));
        assert!(matches!(Timespan::parse("0"), Err(AppError::Input(_))));
    }

    #[test]
    fn test_custom_interval_overrides_selector() {
        assert_eq!(
            Timespan::from_form("1 Week", Some("12")).unwrap(),
            Timespan::Custom(12)
        );
        assert_eq!(
            Timespan::from_form("1 Week", Some("")).unwrap(),
            Timespan::Weeks(1)
        );
        assert_eq!(Timespan::from_form("", None).unwrap(), Timespan::Default);
    }

    #[test]
    fn test_display() {
        assert_eq!(Timespan::Default.to_string(), "24 Hours");
        assert_eq!(Timespan::Weeks(1).to_string(), "1 Week");
        assert_eq!(Timespan::Custom(5).to_string(), "5 Hours");
    }
}
