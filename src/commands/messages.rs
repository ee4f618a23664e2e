//! User facing text for every command outcome.

use chrono::NaiveDate;

use crate::calendar::{BackendError, CalendarEvent, EventTime};
use crate::core::UserId;

pub fn date_format_error() -> String {
    String::from("Invalid date format. Use yyyy/mm/dd, mm/dd, m/d or a month name like \"March 10\".")
}

pub fn list_date_format_error() -> String {
    String::from(
        "Invalid date format. Use yyyy/mm/dd, mm/dd, m/d, \"March 10\" or a word like \"today\" or \"tomorrow\".",
    )
}

pub fn invalid_arguments(err: &serde_json::Error) -> String {
    format!("Invalid command arguments: {}", err)
}

pub fn unexpected_error() -> String {
    String::from("An unexpected error occurred.")
}

// Add

pub fn added(date: NaiveDate, title: &str, link: Option<&str>) -> String {
    let mut msg = format!("✅ Added '{}' on {} to the calendar.", title, date);
    if let Some(link) = link {
        msg.push_str(&format!("\nLink: {}", link));
    }
    msg
}

pub fn add_failed(err: &BackendError) -> String {
    format!("❌ Failed to add the event to the calendar: {}", err)
}

pub fn add_refused() -> String {
    String::from("🚫 You do not have permission to add events to the calendar.")
}

pub fn added_notice(partner: UserId, actor: &str, date: NaiveDate, title: &str) -> String {
    format!(
        "{}: {} added **{}** to the schedule on {}.",
        partner.mention(),
        actor,
        title,
        date
    )
}

// Delete

pub fn delete_refused() -> String {
    String::from("🚫 You do not have permission to delete events.")
}

pub fn search_failed(err: &BackendError) -> String {
    format!("❌ Could not find the event: {}", err)
}

pub fn delete_failed(err: &BackendError) -> String {
    format!("❌ Failed to delete the event: {}", err)
}

pub fn deleted(date: NaiveDate, title: &str) -> String {
    format!("✅ Deleted '{}' on {} from the calendar.", title, date)
}

pub fn deleted_notice(partner: UserId, actor: &str, date: NaiveDate, title: &str) -> String {
    format!(
        "{}: {} deleted an event.\nDate: {}\nTitle: {}",
        partner.mention(),
        actor,
        date,
        title
    )
}

// Edit

pub fn edit_refused() -> String {
    String::from("🚫 You do not have permission to change events.")
}

pub fn update_failed(err: &BackendError) -> String {
    format!("❌ Failed to change the event: {}", err)
}

pub fn edited(
    old_date: NaiveDate,
    new_date: NaiveDate,
    old_title: &str,
    new_title: &str,
    link: Option<&str>,
) -> String {
    let mut msg = format!(
        "✅ Changed the event.\nDate: {} -> {}\nTitle: {} -> {}",
        old_date, new_date, old_title, new_title
    );
    if let Some(link) = link {
        msg.push_str(&format!("\nLink: {}", link));
    }
    msg
}

pub fn edited_notice(
    partner: UserId,
    actor: &str,
    old_date: NaiveDate,
    new_date: NaiveDate,
    old_title: &str,
    new_title: &str,
) -> String {
    format!(
        "{}: {} changed an event.\nDate: {} -> {}\nTitle: {} -> {}",
        partner.mention(),
        actor,
        old_date,
        new_date,
        old_title,
        new_title
    )
}

// List

pub fn list_failed(err: &BackendError) -> String {
    format!("❌ Failed to fetch events: {}", err)
}

pub fn no_events(date: NaiveDate) -> String {
    format!("No events on {}.", date)
}

pub fn day_listing(date: NaiveDate, events: &[CalendarEvent]) -> String {
    let mut msg = format!("🗓️ **Events on {}:**", date);
    for event in events {
        let when = match &event.time {
            EventTime::AllDay { .. } => String::from("all day"),
            // Clock times as the backend reported them, no conversion
            EventTime::Timed { start, end } => {
                format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
            }
        };
        msg.push_str(&format!("\n・ {} ({})", event.title, when));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn it_renders_all_day_and_timed_events() {
        let events = vec![
            CalendarEvent {
                id: "a".to_string(),
                title: "Holiday".to_string(),
                time: EventTime::AllDay {
                    date: ymd(2024, 3, 10),
                },
                link: None,
            },
            CalendarEvent {
                id: "b".to_string(),
                title: "Lunch".to_string(),
                time: EventTime::Timed {
                    start: DateTime::parse_from_rfc3339("2024-03-10T12:00:00+09:00").unwrap(),
                    end: DateTime::parse_from_rfc3339("2024-03-10T13:30:00+09:00").unwrap(),
                },
                link: None,
            },
        ];

        assert_eq!(
            day_listing(ymd(2024, 3, 10), &events),
            "🗓️ **Events on 2024-03-10:**\n・ Holiday (all day)\n・ Lunch (12:00 - 13:30)"
        );
    }

    #[test]
    fn it_omits_missing_links() {
        assert_eq!(
            added(ymd(2024, 3, 10), "Dentist", None),
            "✅ Added 'Dentist' on 2024-03-10 to the calendar."
        );
    }

    #[test]
    fn it_mentions_the_partner() {
        let msg = added_notice(UserId(7), "alice", ymd(2024, 3, 10), "Dentist");
        assert!(msg.starts_with("<@7>: alice"));
        assert!(msg.contains("**Dentist**"));
        assert!(msg.contains("2024-03-10"));
    }
}
