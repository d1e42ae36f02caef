/// Timestamp parsing and humanization
///
/// The backend emits UTC timestamps, but not all code paths attach a zone
/// suffix. A naive timestamp is forced to UTC before parsing; interpreting
/// it in the local zone would shift every message by the UTC offset.
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Parse a backend timestamp as UTC, appending a zone marker when missing.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    DateTime::parse_from_rfc3339(&format!("{}Z", raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn month_day(dt: &DateTime<Utc>) -> String {
    format!("{} {}", MONTHS[dt.month0() as usize], dt.day())
}

/// Relative label for conversation and notification rows:
/// "Just now", "12m ago", "3h ago", "Yesterday", "Mar 5".
pub fn humanize_event_time(raw: &str, now: DateTime<Utc>) -> String {
    let Some(dt) = parse_utc(raw) else {
        return raw.to_string();
    };
    let elapsed = now.signed_duration_since(dt);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();

    if hours < 1 {
        if minutes <= 1 {
            "Just now".to_string()
        } else {
            format!("{}m ago", minutes)
        }
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if hours < 48 {
        "Yesterday".to_string()
    } else {
        month_day(&dt)
    }
}

/// Label for a message bubble: "14:03" within the last day, otherwise
/// "Mar 5, 14:03".
pub fn humanize_message_time(raw: &str, now: DateTime<Utc>) -> String {
    let Some(dt) = parse_utc(raw) else {
        return raw.to_string();
    };
    let clock = format!("{:02}:{:02}", dt.hour(), dt.minute());
    if now.signed_duration_since(dt).num_hours() < 24 {
        clock
    } else {
        format!("{}, {}", month_day(&dt), clock)
    }
}
