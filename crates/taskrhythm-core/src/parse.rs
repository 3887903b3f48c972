//! Input parsing for days, times and dates.
//!
//! Shared by the CLI and anything else that takes user-typed values.

use chrono::{NaiveDate, NaiveTime, Weekday};

use crate::error::ValidationError;

/// Parse a day of week: `0`-`6` (Monday=0), short or full English name.
pub fn parse_day(input: &str) -> Result<Weekday, ValidationError> {
    let lower = input.trim().to_lowercase();
    match lower.as_str() {
        "0" | "mon" | "monday" => Ok(Weekday::Mon),
        "1" | "tue" | "tuesday" => Ok(Weekday::Tue),
        "2" | "wed" | "wednesday" => Ok(Weekday::Wed),
        "3" | "thu" | "thursday" => Ok(Weekday::Thu),
        "4" | "fri" | "friday" => Ok(Weekday::Fri),
        "5" | "sat" | "saturday" => Ok(Weekday::Sat),
        "6" | "sun" | "sunday" => Ok(Weekday::Sun),
        _ => Err(ValidationError::InvalidDay(input.to_string())),
    }
}

/// Full English day name.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse `HH:MM` (seconds are accepted and kept).
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, ValidationError> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTimeFormat(input.to_string()))
}

/// Parse `YYYY-MM-DD`.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_day_accepts_numbers_and_names() {
        assert_eq!(parse_day("0").unwrap(), Weekday::Mon);
        assert_eq!(parse_day("Sun").unwrap(), Weekday::Sun);
        assert_eq!(parse_day("wednesday").unwrap(), Weekday::Wed);
        assert!(matches!(parse_day("7"), Err(ValidationError::InvalidDay(_))));
    }

    #[test]
    fn day_name_is_full_english() {
        assert_eq!(day_name(Weekday::Thu), "Thursday");
    }

    #[test]
    fn parse_time_of_day_formats() {
        assert_eq!(
            parse_time_of_day("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day("22:00:15").unwrap(),
            NaiveTime::from_hms_opt(22, 0, 15).unwrap()
        );
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("nine").is_err());
    }

    #[test]
    fn parse_date_iso() {
        assert_eq!(
            parse_date("2026-10-20").unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
        );
        assert!(matches!(parse_date("20/10/2026"), Err(ValidationError::InvalidDate(_))));
    }
}
