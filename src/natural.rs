//! Natural language time expression parser
//!
//! Converts human-readable schedule descriptions to canonical 5-field cron
//! expressions plus a normalized human-readable phrase.
//!
//! ## Supported Formats
//!
//! - "every 15 minutes" / "every 2 hours"
//! - "every day at 9am" / "daily at midnight" / "at 14:30"
//! - "every weekday at 9am" / "every weekend at 10am"
//! - "every monday at 2pm" / "on tuesdays"
//! - "monday through friday at 8:30am" / "tuesday and thursday at 6pm"
//! - "first of every month at noon" / "15th of every month" / "every 3 days"
//! - a raw 5-field cron expression passes through after validation
//!
//! Extraction runs in three prioritized rule tables (time of day, interval,
//! date), each first-match-wins, each filling only cron fields that are
//! still wildcards. An expression matching no rule is an error; the
//! all-wildcard "every minute" schedule is only produced when the text
//! literally asks for it.

use regex::Regex;
use std::sync::OnceLock;

use crate::parser::CronExpression;
use crate::types::{Result, SchedError};

/// A successfully parsed time expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSchedule {
    /// Canonical 5-field cron expression
    pub cron: String,
    /// Normalized human-readable phrase
    pub human: String,
    /// The input as given (trimmed)
    pub original: String,
}

/// Day names in matching order: full names before abbreviations so the
/// longest form captures first.
const DAY_NAMES: [(&str, u32); 17] = [
    ("sunday", 0),
    ("sun", 0),
    ("monday", 1),
    ("mon", 1),
    ("tuesday", 2),
    ("tue", 2),
    ("tues", 2),
    ("wednesday", 3),
    ("wed", 3),
    ("thursday", 4),
    ("thu", 4),
    ("thur", 4),
    ("thurs", 4),
    ("friday", 5),
    ("fri", 5),
    ("saturday", 6),
    ("sat", 6),
];

const DOW_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const DAY_ALTERNATION: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday\
|mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun";

/// Resolve a day name (any accepted spelling) to 0=Sunday..6=Saturday
fn day_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect();
    DAY_NAMES
        .iter()
        .find(|(n, _)| *n == prefix)
        .map(|(_, d)| *d)
}

// ============================================================================
// Time-of-day rules
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeKind {
    /// "9am", "9:30 pm"
    TwelveHour,
    /// "14:30" not followed by am/pm
    TwentyFourHour,
    /// "noon" / "midday"
    Noon,
    /// "midnight"
    Midnight,
}

fn time_rules() -> &'static [(TimeKind, Regex)] {
    static RULES: OnceLock<Vec<(TimeKind, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        let raw = vec![
            (TimeKind::TwelveHour, r"(\d{1,2})(?::(\d{2}))?\s*(am|pm)"),
            (TimeKind::TwentyFourHour, r"(\d{1,2}):(\d{2})"),
            (TimeKind::Noon, r"\b(?:noon|midday)\b"),
            (TimeKind::Midnight, r"\bmidnight\b"),
        ];
        raw.into_iter()
            .filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|r| (kind, r)))
            .collect()
    })
}

/// Convert a 12-hour clock reading to 24-hour
fn twelve_to_24(hour: u32, period: &str) -> u32 {
    match period {
        "pm" if hour != 12 => hour + 12,
        "am" if hour == 12 => 0,
        _ => hour,
    }
}

/// Extract an explicit time of day; first matching rule wins
fn extract_time(text: &str) -> Option<(u32, u32)> {
    for (kind, re) in time_rules() {
        match kind {
            TimeKind::TwelveHour => {
                if let Some(caps) = re.captures(text) {
                    let hour: u32 = caps[1].parse().ok()?;
                    let minute: u32 = caps
                        .get(2)
                        .and_then(|m| m.as_str().parse().ok())
                        .unwrap_or(0);
                    return Some((twelve_to_24(hour, &caps[3]), minute));
                }
            }
            TimeKind::TwentyFourHour => {
                // Skip matches that are really 12-hour times ("9:30 am")
                for caps in re.captures_iter(text) {
                    let end = caps.get(0).map(|m| m.end())?;
                    let rest = text[end..].trim_start();
                    if rest.starts_with("am") || rest.starts_with("pm") {
                        continue;
                    }
                    let hour: u32 = caps[1].parse().ok()?;
                    let minute: u32 = caps[2].parse().ok()?;
                    return Some((hour, minute));
                }
            }
            TimeKind::Noon => {
                if re.is_match(text) {
                    return Some((12, 0));
                }
            }
            TimeKind::Midnight => {
                if re.is_match(text) {
                    return Some((0, 0));
                }
            }
        }
    }
    None
}

/// Normalized phrase for an explicit time of day
fn describe_time(hour: u32, minute: u32) -> String {
    if minute == 0 {
        match hour {
            0 => "at midnight".to_string(),
            12 => "at noon".to_string(),
            h if h < 12 => format!("at {h}am"),
            h => format!("at {}pm", h - 12),
        }
    } else if hour < 12 {
        format!("at {hour}:{minute:02}am")
    } else if hour == 12 {
        format!("at 12:{minute:02}pm")
    } else {
        format!("at {}:{minute:02}pm", hour - 12)
    }
}

// ============================================================================
// Interval rules
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntervalKind {
    MinuteStep,
    HourStep,
    EveryMinute,
    EveryHour,
    Daily,
    Weekdays,
    Weekends,
    Weekly,
    Monthly,
    NamedDay,
    DayRange,
}

/// Priority-ordered interval rules; earlier entries take precedence over
/// later ones regardless of where they match in the text.
fn interval_rules() -> &'static [(IntervalKind, Regex)] {
    static RULES: OnceLock<Vec<(IntervalKind, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        let day_range = format!(
            r"({DAY_ALTERNATION})\s*(?:through|to|-)\s*({DAY_ALTERNATION})"
        );
        let raw = vec![
            (IntervalKind::MinuteStep, r"every\s+(\d+)\s+minutes?".to_string()),
            (IntervalKind::HourStep, r"every\s+(\d+)\s+hours?".to_string()),
            (IntervalKind::EveryMinute, r"every\s+minute".to_string()),
            (IntervalKind::EveryHour, r"every\s+hour".to_string()),
            (IntervalKind::Daily, r"every\s+day|daily".to_string()),
            (IntervalKind::Weekdays, r"every\s+weekday".to_string()),
            (IntervalKind::Weekends, r"every\s+weekend".to_string()),
            (IntervalKind::Weekly, r"every\s+week|weekly".to_string()),
            (IntervalKind::Monthly, r"every\s+month|monthly".to_string()),
            (
                IntervalKind::NamedDay,
                format!(r"every\s+({DAY_ALTERNATION})"),
            ),
            (
                IntervalKind::NamedDay,
                r"on\s+(sundays?|mondays?|tuesdays?|wednesdays?|thursdays?|fridays?|saturdays?)"
                    .to_string(),
            ),
            (IntervalKind::DayRange, day_range),
        ];
        raw.into_iter()
            .filter_map(|(kind, pattern)| Regex::new(&pattern).ok().map(|r| (kind, r)))
            .collect()
    })
}

/// First interval rule matching the text, with its captured value
fn extract_interval(text: &str) -> Option<(IntervalKind, Option<String>)> {
    for (kind, re) in interval_rules() {
        if let Some(caps) = re.captures(text) {
            let value = caps.get(1).map(|m| m.as_str().to_string());
            return Some((*kind, value));
        }
    }
    None
}

// ============================================================================
// Day-of-week extraction
// ============================================================================

fn day_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"({DAY_ALTERNATION})\s*(?:through|to|-)\s*({DAY_ALTERNATION})"
        ))
        .unwrap()
    })
}

/// Whole-word matchers for each day name (optionally plural)
fn day_name_rules() -> &'static [(u32, Regex)] {
    static RULES: OnceLock<Vec<(u32, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        DAY_NAMES
            .iter()
            .filter_map(|(name, num)| {
                Regex::new(&format!(r"\b{name}s?\b"))
                    .ok()
                    .map(|r| (*num, r))
            })
            .collect()
    })
}

/// Extract a day-of-week field value: group shorthands, an explicit
/// range, or a sorted multi-day list.
fn extract_days(text: &str) -> Option<String> {
    if text.contains("weekday") {
        return Some("1-5".to_string());
    }
    if text.contains("weekend") {
        return Some("0,6".to_string());
    }

    if let Some(caps) = day_range_re().captures(text) {
        if let (Some(start), Some(end)) = (day_number(&caps[1]), day_number(&caps[2])) {
            return Some(format!("{start}-{end}"));
        }
    }

    let mut found: Vec<u32> = Vec::new();
    for (num, re) in day_name_rules() {
        if re.is_match(text) && !found.contains(num) {
            found.push(*num);
        }
    }
    if found.is_empty() {
        return None;
    }
    found.sort_unstable();
    Some(
        found
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(","),
    )
}

// ============================================================================
// Date rules
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateKind {
    FirstOfMonth,
    LastOfMonth,
    DayOfMonth,
    DayInterval,
}

fn date_rules() -> &'static [(DateKind, Regex)] {
    static RULES: OnceLock<Vec<(DateKind, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        let raw = vec![
            (
                DateKind::FirstOfMonth,
                r"first\s+(?:of\s+)?(?:the\s+)?(?:every\s+)?month",
            ),
            (
                DateKind::LastOfMonth,
                r"last\s+(?:of\s+)?(?:the\s+)?(?:every\s+)?month",
            ),
            (
                DateKind::DayOfMonth,
                r"(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?(?:the\s+)?(?:every\s+)?month",
            ),
            (DateKind::DayInterval, r"every\s+(\d+)\s+days?"),
        ];
        raw.into_iter()
            .filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|r| (kind, r)))
            .collect()
    })
}

fn extract_date(text: &str) -> Option<(DateKind, Option<String>)> {
    for (kind, re) in date_rules() {
        if let Some(caps) = re.captures(text) {
            let value = caps.get(1).map(|m| m.as_str().to_string());
            return Some((*kind, value));
        }
    }
    None
}

// ============================================================================
// Suppression checks
// ============================================================================

/// "tuesday and thursday" style lists: the single-day interval rule must
/// yield to multi-day extraction.
fn mentions_multiple_days(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"\b(?:and|,)\s*(?:{DAY_ALTERNATION})")).unwrap()
    })
    .is_match(text)
}

/// An explicit day-of-month phrase makes the generic monthly default
/// redundant.
fn mentions_day_of_month(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\d{1,2}(?:st|nd|rd|th)?|first|last)\s+(?:of\s+)?(?:the\s+)?(?:every\s+)?month")
            .unwrap()
    })
    .is_match(text)
}

/// Whether the input already looks like a raw 5-field cron expression
fn looks_like_cron(text: &str) -> bool {
    let fields: Vec<&str> = text.split_whitespace().collect();
    fields.len() == 5
        && fields.iter().all(|f| {
            f.chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '*' | ',' | '-' | '/'))
        })
}

// ============================================================================
// Parser
// ============================================================================

/// Parse a natural language time expression into a cron schedule.
///
/// # Examples
///
/// ```
/// use cronbridge::natural::parse_schedule;
///
/// let parsed = parse_schedule("Every weekday at 9am").unwrap();
/// assert_eq!(parsed.cron, "0 9 * * 1-5");
/// assert_eq!(parsed.human, "Every weekday at 9am");
///
/// let parsed = parse_schedule("Every 15 minutes").unwrap();
/// assert_eq!(parsed.cron, "*/15 * * * *");
/// ```
pub fn parse_schedule(expression: &str) -> Result<ParsedSchedule> {
    let original = expression.trim();
    if original.is_empty() {
        return Err(SchedError::InvalidExpression("empty expression".to_string()));
    }
    let text = original.to_lowercase();

    // Raw cron input passes through once validated
    if looks_like_cron(&text) {
        CronExpression::parse(&text)?;
        return Ok(ParsedSchedule {
            cron: text,
            human: original.to_string(),
            original: original.to_string(),
        });
    }

    let mut minute = "*".to_string();
    let mut hour = "*".to_string();
    let mut dom = "*".to_string();
    let month = "*".to_string();
    let mut dow = "*".to_string();
    let mut human_parts: Vec<String> = Vec::new();

    if let Some((h, m)) = extract_time(&text) {
        hour = h.to_string();
        minute = m.to_string();
        human_parts.push(describe_time(h, m));
    }

    let multiple_days = mentions_multiple_days(&text);
    let day_of_month_phrase = mentions_day_of_month(&text);

    let interval = extract_interval(&text);
    let skip_interval = matches!(
        interval,
        Some((IntervalKind::NamedDay, _)) if multiple_days
    ) || matches!(
        interval,
        Some((IntervalKind::Monthly, _)) if day_of_month_phrase
    );

    if let Some((kind, value)) = interval.filter(|_| !skip_interval) {
        match kind {
            IntervalKind::EveryMinute => {
                minute = "*".to_string();
                hour = "*".to_string();
                human_parts.insert(0, "Every minute".to_string());
            }
            IntervalKind::MinuteStep => {
                let n = value.unwrap_or_default();
                minute = format!("*/{n}");
                hour = "*".to_string();
                human_parts.insert(0, format!("Every {n} minutes"));
            }
            IntervalKind::EveryHour => {
                if minute == "*" {
                    minute = "0".to_string();
                }
                human_parts.insert(0, "Every hour".to_string());
            }
            IntervalKind::HourStep => {
                let n = value.unwrap_or_default();
                if minute == "*" {
                    minute = "0".to_string();
                }
                hour = format!("*/{n}");
                human_parts.insert(0, format!("Every {n} hours"));
            }
            IntervalKind::Daily => {
                if minute == "*" {
                    minute = "0".to_string();
                }
                if hour == "*" {
                    hour = "0".to_string();
                }
                human_parts.insert(0, "Daily".to_string());
            }
            IntervalKind::Weekdays => {
                dow = "1-5".to_string();
                if minute == "*" {
                    minute = "0".to_string();
                }
                if hour == "*" {
                    hour = "9".to_string();
                }
                human_parts.insert(0, "Every weekday".to_string());
            }
            IntervalKind::Weekends => {
                dow = "0,6".to_string();
                if minute == "*" {
                    minute = "0".to_string();
                }
                if hour == "*" {
                    hour = "9".to_string();
                }
                human_parts.insert(0, "Every weekend".to_string());
            }
            IntervalKind::Weekly => {
                // Defaults to Sunday
                dow = "0".to_string();
                if minute == "*" {
                    minute = "0".to_string();
                }
                if hour == "*" {
                    hour = "0".to_string();
                }
                human_parts.insert(0, "Weekly".to_string());
            }
            IntervalKind::Monthly => {
                dom = "1".to_string();
                if minute == "*" {
                    minute = "0".to_string();
                }
                if hour == "*" {
                    hour = "0".to_string();
                }
                human_parts.insert(0, "Monthly".to_string());
            }
            IntervalKind::NamedDay => {
                if let Some(day) = value.as_deref().and_then(day_number) {
                    dow = day.to_string();
                    if minute == "*" {
                        minute = "0".to_string();
                    }
                    if hour == "*" {
                        hour = "9".to_string();
                    }
                    human_parts.insert(0, format!("Every {}", DOW_SHORT[day as usize]));
                }
            }
            // Handled by day extraction below
            IntervalKind::DayRange => {}
        }
    }

    if dow == "*" {
        if let Some(days) = extract_days(&text) {
            dow = days.clone();
            if let Some((start, end)) = days.split_once('-') {
                if let (Ok(s), Ok(e)) = (start.parse::<usize>(), end.parse::<usize>()) {
                    if s < 7 && e < 7 {
                        human_parts.insert(0, format!("{}-{}", DOW_SHORT[s], DOW_SHORT[e]));
                    }
                }
            } else if days.contains(',') {
                let names: Vec<&str> = days
                    .split(',')
                    .filter_map(|d| d.parse::<usize>().ok())
                    .filter(|d| *d < 7)
                    .map(|d| DOW_SHORT[d])
                    .collect();
                human_parts.insert(0, names.join(", "));
            }
        }
    }

    if let Some((kind, value)) = extract_date(&text) {
        match kind {
            DateKind::FirstOfMonth => {
                dom = "1".to_string();
                if minute == "*" {
                    minute = "0".to_string();
                }
                if hour == "*" {
                    hour = "0".to_string();
                }
                human_parts.insert(0, "First of every month".to_string());
            }
            DateKind::LastOfMonth => {
                // Cron has no "last day" notion; 28-31 is the documented
                // approximation.
                dom = "28-31".to_string();
                if minute == "*" {
                    minute = "0".to_string();
                }
                if hour == "*" {
                    hour = "0".to_string();
                }
                human_parts.insert(0, "Last of every month".to_string());
            }
            DateKind::DayOfMonth => {
                let n = value.unwrap_or_default();
                dom = n.clone();
                if minute == "*" {
                    minute = "0".to_string();
                }
                if hour == "*" {
                    hour = "0".to_string();
                }
                human_parts.insert(0, format!("{n}th of every month"));
            }
            DateKind::DayInterval => {
                // Day-of-month step; inexact for months shorter than 31 days
                let n = value.unwrap_or_default();
                dom = format!("*/{n}");
                if minute == "*" {
                    minute = "0".to_string();
                }
                if hour == "*" {
                    hour = "0".to_string();
                }
                human_parts.insert(0, format!("Every {n} days"));
            }
        }
    }

    let cron = format!("{minute} {hour} {dom} {month} {dow}");

    // An all-wildcard schedule is only valid when literally requested
    if cron == "* * * * *"
        && !text.contains("every minute")
        && !text.contains("every 1 minute")
    {
        return Err(SchedError::InvalidExpression(format!(
            "could not parse time expression: '{original}'. \
             Try 'Every day at 9am' or 'Every weekday at 2pm'"
        )));
    }

    // Guarantee every produced schedule is well-formed
    CronExpression::parse(&cron)?;

    let human = if human_parts.is_empty() {
        original.to_string()
    } else {
        human_parts.join(" ")
    };

    Ok(ParsedSchedule {
        cron,
        human,
        original: original.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cron_of(expr: &str) -> String {
        parse_schedule(expr).unwrap().cron
    }

    #[test]
    fn test_twelve_hour_arithmetic() {
        assert_eq!(cron_of("every day at 9am"), "0 9 * * *");
        assert_eq!(cron_of("every day at 12am"), "0 0 * * *");
        assert_eq!(cron_of("every day at 12pm"), "0 12 * * *");
        assert_eq!(cron_of("every day at 9:30pm"), "30 21 * * *");
        assert_eq!(cron_of("every day at 2:15 am"), "15 2 * * *");
    }

    #[test]
    fn test_twenty_four_hour() {
        assert_eq!(cron_of("every day at 14:30"), "30 14 * * *");
        assert_eq!(cron_of("daily at 08:05"), "5 8 * * *");
    }

    #[test]
    fn test_noon_and_midnight() {
        assert_eq!(cron_of("every day at noon"), "0 12 * * *");
        assert_eq!(cron_of("daily at midnight"), "0 0 * * *");
    }

    #[test]
    fn test_weekday_at_nine() {
        let parsed = parse_schedule("Every weekday at 9am").unwrap();
        assert_eq!(parsed.cron, "0 9 * * 1-5");
        assert_eq!(parsed.human, "Every weekday at 9am");
    }

    #[test]
    fn test_weekday_default_time() {
        assert_eq!(cron_of("every weekday"), "0 9 * * 1-5");
    }

    #[test]
    fn test_minute_step() {
        let parsed = parse_schedule("Every 15 minutes").unwrap();
        assert_eq!(parsed.cron, "*/15 * * * *");
        assert_eq!(parsed.human, "Every 15 minutes");
    }

    #[test]
    fn test_hour_step() {
        assert_eq!(cron_of("every 2 hours"), "0 */2 * * *");
    }

    #[test]
    fn test_every_hour_and_minute() {
        assert_eq!(cron_of("every hour"), "0 * * * *");
        assert_eq!(cron_of("every minute"), "* * * * *");
    }

    #[test]
    fn test_weekly_and_monthly() {
        assert_eq!(cron_of("weekly"), "0 0 * * 0");
        assert_eq!(cron_of("monthly"), "0 0 1 * *");
        assert_eq!(cron_of("every month"), "0 0 1 * *");
    }

    #[test]
    fn test_first_of_month_at_noon() {
        let parsed = parse_schedule("First of every month at noon").unwrap();
        assert_eq!(parsed.cron, "0 12 1 * *");
        assert_eq!(parsed.human, "First of every month at noon");
    }

    #[test]
    fn test_last_of_month_approximation() {
        assert_eq!(cron_of("last of every month at noon"), "0 12 28-31 * *");
    }

    #[test]
    fn test_nth_of_month() {
        let parsed = parse_schedule("15th of every month").unwrap();
        assert_eq!(parsed.cron, "0 0 15 * *");
        assert_eq!(parsed.human, "15th of every month");
    }

    #[test]
    fn test_every_n_days_approximation() {
        assert_eq!(cron_of("every 3 days"), "0 0 */3 * *");
    }

    #[test]
    fn test_named_day() {
        let parsed = parse_schedule("Every Monday at 2pm").unwrap();
        assert_eq!(parsed.cron, "0 14 * * 1");
        assert_eq!(parsed.human, "Every Mon at 2pm");
        assert_eq!(cron_of("on tuesdays"), "0 9 * * 2");
    }

    #[test]
    fn test_day_range() {
        let parsed = parse_schedule("Monday through Friday at 8:30am").unwrap();
        assert_eq!(parsed.cron, "30 8 * * 1-5");
        assert_eq!(parsed.human, "Mon-Fri at 8:30am");
    }

    #[test]
    fn test_multi_day_list() {
        let parsed = parse_schedule("Tuesday and Thursday at 6pm").unwrap();
        assert_eq!(parsed.cron, "0 18 * * 2,4");
        assert_eq!(parsed.human, "Tue, Thu at 6pm");
    }

    #[test]
    fn test_multi_day_list_overrides_named_day_rule() {
        // "every tuesday" alone would claim day-of-week; the list wins
        let parsed = parse_schedule("every tuesday and thursday at 6pm").unwrap();
        assert_eq!(parsed.cron, "0 18 * * 2,4");
    }

    #[test]
    fn test_weekend() {
        assert_eq!(cron_of("every weekend at 10am"), "0 10 * * 0,6");
    }

    #[test]
    fn test_explicit_day_of_month_suppresses_monthly_default() {
        // "monthly" would set day 1; the explicit 15th must win alone
        assert_eq!(cron_of("15th of every month at noon"), "0 12 15 * *");
    }

    #[test]
    fn test_cron_passthrough() {
        assert_eq!(cron_of("*/5 * * * *"), "*/5 * * * *");
        assert_eq!(cron_of("0 2 * * 1-5"), "0 2 * * 1-5");
        assert!(parse_schedule("99 99 * * *").is_err());
    }

    #[test]
    fn test_rejects_unparseable() {
        assert!(parse_schedule("").is_err());
        assert!(parse_schedule("   ").is_err());
        assert!(parse_schedule("whenever you feel like it").is_err());
        assert!(parse_schedule("do something").is_err());
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(cron_of("EVERY 15 MINUTES"), "*/15 * * * *");
        assert_eq!(cron_of("Daily At 2AM"), "0 2 * * *");
    }

    #[test]
    fn test_all_outputs_validate_as_cron() {
        let examples = [
            "Every day at 9am",
            "Every weekday at 9am",
            "Every Monday at 2pm",
            "Every hour",
            "Every 15 minutes",
            "Daily at midnight",
            "Every Sunday at 6pm",
            "First of every month at noon",
            "Every 2 hours",
            "Monday through Friday at 8:30am",
            "Every weekend at 10am",
            "Weekly",
            "Monthly",
        ];
        for example in examples {
            let parsed = parse_schedule(example).unwrap();
            assert!(
                CronExpression::parse(&parsed.cron).is_ok(),
                "'{example}' produced invalid cron '{}'",
                parsed.cron
            );
        }
    }

    #[test]
    fn test_extract_days_helpers() {
        assert_eq!(extract_days("every weekday"), Some("1-5".to_string()));
        assert_eq!(extract_days("on weekends"), Some("0,6".to_string()));
        assert_eq!(extract_days("mon to wed"), Some("1-3".to_string()));
        assert_eq!(
            extract_days("saturday and sunday"),
            Some("0,6".to_string())
        );
        assert_eq!(extract_days("no days here"), None);
    }

    #[test]
    fn test_extract_time_ordering() {
        // 12-hour wins over bare 24-hour when am/pm is present
        assert_eq!(extract_time("at 9:30 pm"), Some((21, 30)));
        assert_eq!(extract_time("at 9:30"), Some((9, 30)));
        assert_eq!(extract_time("around noon"), Some((12, 0)));
        assert_eq!(extract_time("no time"), None);
    }
}
