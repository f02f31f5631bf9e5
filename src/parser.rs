//! Standard 5-field cron expression parsing and validation
//!
//! ```text
//! ┌───────────── minute (0-59)
//! │ ┌───────────── hour (0-23)
//! │ │ ┌───────────── day of month (1-31)
//! │ │ │ ┌───────────── month (1-12)
//! │ │ │ │ ┌───────────── day of week (0-7, 0 and 7 = Sunday)
//! │ │ │ │ │
//! * * * * *
//! ```
//!
//! Each field accepts `*`, a number, a range (`1-5`), a step (`*/15`,
//! `0-30/5`), or a comma list. The day-of-week field additionally accepts
//! `7` as an alias for Sunday, normalized to `0` on parse.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use std::collections::BTreeSet;

use crate::types::{Result, SchedError};

/// A validated cron expression, expanded to per-field value sets
#[derive(Debug, Clone)]
pub struct CronExpression {
    /// Original expression string
    pub expression: String,
    minutes: BTreeSet<u32>,
    hours: BTreeSet<u32>,
    days_of_month: BTreeSet<u32>,
    months: BTreeSet<u32>,
    days_of_week: BTreeSet<u32>,
}

impl CronExpression {
    /// Parse and validate a 5-field cron expression.
    ///
    /// Fails on wrong field counts, values outside the field's range,
    /// inverted ranges, and zero steps.
    pub fn parse(expression: &str) -> Result<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(SchedError::InvalidExpression(format!(
                "expected 5 cron fields, got {}",
                fields.len()
            )));
        }

        let minutes = expand_field(fields[0], 0, 59, "minute")?;
        let hours = expand_field(fields[1], 0, 23, "hour")?;
        let days_of_month = expand_field(fields[2], 1, 31, "day of month")?;
        let months = expand_field(fields[3], 1, 12, "month")?;
        // Day of week allows 7 as a Sunday alias
        let days_of_week: BTreeSet<u32> = expand_field(fields[4], 0, 7, "day of week")?
            .into_iter()
            .map(|d| if d == 7 { 0 } else { d })
            .collect();

        Ok(Self {
            expression: expression.to_string(),
            minutes,
            hours,
            days_of_month,
            months,
            days_of_week,
        })
    }

    /// Whether the given instant matches this expression
    pub fn matches(&self, dt: &DateTime<Utc>) -> bool {
        self.minutes.contains(&dt.minute())
            && self.hours.contains(&dt.hour())
            && self.days_of_month.contains(&dt.day())
            && self.months.contains(&dt.month())
            && self
                .days_of_week
                .contains(&dt.weekday().num_days_from_sunday())
    }

    /// First matching instant strictly after `after`, scanning forward
    /// minute by minute for up to four years.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = after + Duration::minutes(1);
        let mut current = Utc
            .with_ymd_and_hms(
                start.year(),
                start.month(),
                start.day(),
                start.hour(),
                start.minute(),
                0,
            )
            .single()?;

        let max_iterations = 4 * 366 * 24 * 60;
        for _ in 0..max_iterations {
            if self.matches(&current) {
                return Some(current);
            }
            current += Duration::minutes(1);
        }
        None
    }
}

/// Expand one cron field into its set of allowed values
fn expand_field(field: &str, min: u32, max: u32, name: &str) -> Result<BTreeSet<u32>> {
    let mut values = BTreeSet::new();

    for part in field.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (range_part, step) = match part.split_once('/') {
            Some((base, step_str)) => {
                let step: u32 = step_str.parse().map_err(|_| {
                    SchedError::InvalidExpression(format!(
                        "invalid step '{step_str}' in {name} field"
                    ))
                })?;
                if step == 0 {
                    return Err(SchedError::InvalidExpression(format!(
                        "step cannot be 0 in {name} field"
                    )));
                }
                (base, step)
            }
            None => (part, 1),
        };

        let (start, end) = if range_part == "*" {
            (min, max)
        } else if let Some((lo, hi)) = range_part.split_once('-') {
            let start: u32 = lo.parse().map_err(|_| {
                SchedError::InvalidExpression(format!(
                    "invalid range start '{lo}' in {name} field"
                ))
            })?;
            let end: u32 = hi.parse().map_err(|_| {
                SchedError::InvalidExpression(format!(
                    "invalid range end '{hi}' in {name} field"
                ))
            })?;
            (start, end)
        } else {
            let value: u32 = range_part.parse().map_err(|_| {
                SchedError::InvalidExpression(format!(
                    "invalid value '{range_part}' in {name} field"
                ))
            })?;
            (value, value)
        };

        for bound in [start, end] {
            if bound < min || bound > max {
                return Err(SchedError::InvalidExpression(format!(
                    "value {bound} out of range {min}-{max} in {name} field"
                )));
            }
        }
        if start > end {
            return Err(SchedError::InvalidExpression(format!(
                "inverted range {start}-{end} in {name} field"
            )));
        }

        let mut current = start;
        while current <= end {
            values.insert(current);
            current += step;
        }
    }

    if values.is_empty() {
        return Err(SchedError::InvalidExpression(format!(
            "no values in {name} field"
        )));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_wildcards() {
        let expr = CronExpression::parse("* * * * *").unwrap();
        assert_eq!(expr.minutes.len(), 60);
        assert_eq!(expr.hours.len(), 24);
        assert_eq!(expr.days_of_month.len(), 31);
        assert_eq!(expr.months.len(), 12);
        assert_eq!(expr.days_of_week.len(), 7);
    }

    #[test]
    fn test_specific_time() {
        let expr = CronExpression::parse("30 2 * * *").unwrap();
        assert_eq!(expr.minutes, BTreeSet::from([30]));
        assert_eq!(expr.hours, BTreeSet::from([2]));
    }

    #[test]
    fn test_minute_step() {
        let expr = CronExpression::parse("*/15 * * * *").unwrap();
        assert_eq!(expr.minutes, BTreeSet::from([0, 15, 30, 45]));
    }

    #[test]
    fn test_range_and_list() {
        let expr = CronExpression::parse("0 9-17 * * 1,3,5").unwrap();
        assert_eq!(
            expr.hours,
            BTreeSet::from([9, 10, 11, 12, 13, 14, 15, 16, 17])
        );
        assert_eq!(expr.days_of_week, BTreeSet::from([1, 3, 5]));
    }

    #[test]
    fn test_range_with_step() {
        let expr = CronExpression::parse("0-30/10 * * * *").unwrap();
        assert_eq!(expr.minutes, BTreeSet::from([0, 10, 20, 30]));
    }

    #[test]
    fn test_sunday_alias() {
        let expr = CronExpression::parse("0 0 * * 7").unwrap();
        assert_eq!(expr.days_of_week, BTreeSet::from([0]));
    }

    #[test]
    fn test_weekday_range() {
        let expr = CronExpression::parse("0 9 * * 1-5").unwrap();
        assert_eq!(expr.days_of_week, BTreeSet::from([1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(CronExpression::parse("* * *").is_err());
        assert!(CronExpression::parse("60 * * * *").is_err());
        assert!(CronExpression::parse("* 24 * * *").is_err());
        assert!(CronExpression::parse("30-10 * * * *").is_err());
        assert!(CronExpression::parse("*/0 * * * *").is_err());
        assert!(CronExpression::parse("a b c d e").is_err());
        assert!(CronExpression::parse("* * * * 8").is_err());
    }

    #[test]
    fn test_next_after_hourly() {
        let expr = CronExpression::parse("0 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 10, 30, 0).unwrap();
        let next = expr.next_after(now).unwrap();
        assert_eq!(next.hour(), 11);
        assert_eq!(next.minute(), 0);
    }

    #[test]
    fn test_next_after_rolls_to_next_day() {
        let expr = CronExpression::parse("0 2 * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap();
        let next = expr.next_after(now).unwrap();
        assert_eq!(next.day(), 6);
        assert_eq!(next.hour(), 2);
    }

    #[test]
    fn test_matches_weekday_constraint() {
        let expr = CronExpression::parse("30 14 * * 1").unwrap();
        // 2026-08-03 is a Monday
        let monday = Utc.with_ymd_and_hms(2026, 8, 3, 14, 30, 0).unwrap();
        assert!(expr.matches(&monday));
        let tuesday = Utc.with_ymd_and_hms(2026, 8, 4, 14, 30, 0).unwrap();
        assert!(!expr.matches(&tuesday));
    }
}
