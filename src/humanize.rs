//! Human-readable duration formatting and parsing utilities

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid duration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Duration out of range: {0}")]
    OutOfRange(String),
}

/// Duration wrapper accepting `"30s"`, `"5m"`, `"1h"`, `"2d"` or plain seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_human_readable(&self) -> String {
        const UNITS: &[(&str, u64)] = &[("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)];

        let secs = self.0.as_secs();
        if secs == 0 {
            return format!("{}ms", self.0.as_millis());
        }

        for &(unit, divisor) in UNITS {
            if secs >= divisor && secs % divisor == 0 {
                return format!("{}{}", secs / divisor, unit);
            }
        }

        format!("{}s", secs)
    }
}

impl From<Duration> for HumanDuration {
    fn from(value: Duration) -> Self {
        Self(value)
    }
}

impl Serialize for HumanDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_human_readable())
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct HumanDurationVisitor;

        impl<'de> serde::de::Visitor<'de> for HumanDurationVisitor {
            type Value = HumanDuration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration as string (e.g., \"30s\", \"5m\") or integer seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(HumanDuration::from_secs(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(HumanDuration::from_secs)
                    .map_err(|_| E::custom("duration must not be negative"))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<HumanDuration>().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_any(HumanDurationVisitor)
    }
}

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        if let Ok(secs) = s.parse::<u64>() {
            return Ok(HumanDuration::from_secs(secs));
        }

        let (num_str, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
            Some(0) | None => return Err(ParseError::InvalidFormat(s.to_string())),
            Some(pos) => (&s[..pos], s[pos..].trim()),
        };

        let num: u64 = num_str.parse()?;

        let secs_per_unit = match unit {
            "ms" => return Ok(HumanDuration(Duration::from_millis(num))),
            "s" | "sec" | "secs" => 1,
            "m" | "min" | "mins" => 60,
            "h" | "hr" | "hrs" => 3_600,
            "d" | "day" | "days" => 86_400,
            _ => return Err(ParseError::InvalidUnit(unit.to_string())),
        };

        let secs = num
            .checked_mul(secs_per_unit)
            .ok_or_else(|| ParseError::OutOfRange(s.to_string()))?;
        Ok(HumanDuration::from_secs(secs))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human_readable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!("90".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(90));
        assert_eq!("30s".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(30));
        assert_eq!("30 secs".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_minutes_and_hours() {
        assert_eq!("5m".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(300));
        assert_eq!("1H".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(3_600));
        assert_eq!("2d".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(172_800));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!("250ms".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_millis(250));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<HumanDuration>().is_err());
        assert!("m5".parse::<HumanDuration>().is_err());
        assert!(matches!("5 fortnights".parse::<HumanDuration>(), Err(ParseError::InvalidUnit(_))));
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(matches!(
            "999999999999999999d".parse::<HumanDuration>(),
            Err(ParseError::OutOfRange(_))
        ));
        assert!(matches!(
            format!("{}h", u64::MAX / 60).parse::<HumanDuration>(),
            Err(ParseError::OutOfRange(_))
        ));
        assert_eq!(
            format!("{}s", u64::MAX).parse::<HumanDuration>().unwrap().as_duration(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_to_human_readable() {
        assert_eq!(HumanDuration::from_secs(3_600).to_human_readable(), "1h");
        assert_eq!(HumanDuration::from_secs(300).to_human_readable(), "5m");
        assert_eq!(HumanDuration::from_secs(90).to_human_readable(), "90s");
        assert_eq!(HumanDuration(Duration::from_millis(250)).to_human_readable(), "250ms");
    }

    #[test]
    fn test_deserialize_string_and_number() {
        #[derive(Deserialize)]
        struct TestStruct {
            interval: HumanDuration,
        }

        let parsed: TestStruct = serde_json::from_str(r#"{"interval": "10m"}"#).unwrap();
        assert_eq!(parsed.interval.as_duration(), Duration::from_secs(600));

        let parsed: TestStruct = serde_json::from_str(r#"{"interval": 45}"#).unwrap();
        assert_eq!(parsed.interval.as_duration(), Duration::from_secs(45));
    }
}
