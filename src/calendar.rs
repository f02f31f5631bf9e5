//! Cron to systemd OnCalendar conversion
//!
//! Maps a 5-field cron expression to the calendar event syntax systemd
//! timers expect. The four canonical full-wildcard forms become the
//! shorthand keywords; everything else becomes an explicit
//! `[dow ]*-month-day hh:mm:00` string. Step or list expressions on the
//! month and day-of-month fields pass through unmapped, so the conversion
//! is lossy for those; the approximation is accepted and documented.

/// Three-letter day names for systemd, indexed 0=Sunday..6=Saturday;
/// cron's `7` is also Sunday.
fn dow_name(code: &str) -> &str {
    match code {
        "0" | "7" => "Sun",
        "1" => "Mon",
        "2" => "Tue",
        "3" => "Wed",
        "4" => "Thu",
        "5" => "Fri",
        "6" => "Sat",
        other => other,
    }
}

/// Convert a cron expression to an OnCalendar event spec.
///
/// # Examples
///
/// ```
/// use cronbridge::cron_to_calendar;
///
/// assert_eq!(cron_to_calendar("0 0 * * *"), "daily");
/// assert_eq!(cron_to_calendar("0 9 * * 1-5"), "Mon-Fri *-*-* 09:00:00");
/// ```
pub fn cron_to_calendar(cron: &str) -> String {
    let fields: Vec<&str> = cron.split_whitespace().collect();
    if fields.len() != 5 {
        return "*-*-* *:*:00".to_string();
    }
    let (minute, hour, dom, month, dow) = (fields[0], fields[1], fields[2], fields[3], fields[4]);

    match cron {
        "0 * * * *" => return "hourly".to_string(),
        "0 0 * * *" => return "daily".to_string(),
        "0 0 * * 0" => return "weekly".to_string(),
        "0 0 1 * *" => return "monthly".to_string(),
        _ => {}
    }

    let dow_part = if dow == "*" {
        String::new()
    } else if let Some((start, end)) = dow.split_once('-') {
        format!("{}-{} ", dow_name(start), dow_name(end))
    } else {
        format!("{} ", dow_name(dow))
    };

    let date_part = format!("*-{month}-{dom}");

    let h = if hour.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>2}", hour)
    } else {
        hour.to_string()
    };
    let m = if minute.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>2}", minute)
    } else {
        minute.to_string()
    };

    format!("{dow_part}{date_part} {h}:{m}:00")
}
