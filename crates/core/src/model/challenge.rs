use chrono::NaiveDate;

use crate::model::WordEntry;

/// Questions in one daily challenge.
pub const DAILY_CHALLENGE_QUESTIONS: usize = 5;

const CURATED: [(&str, &str); 10] = [
    ("ambiguous", "Open to more than one interpretation"),
    ("benevolent", "Well meaning and kindly"),
    ("candid", "Truthful and straightforward"),
    ("diligent", "Showing care and conscientiousness in one's work"),
    ("ephemeral", "Lasting for a very short time"),
    ("fortitude", "Courage in pain or adversity"),
    ("gregarious", "Fond of company; sociable"),
    ("ubiquitous", "Present, appearing, or found everywhere"),
    ("truncate", "To shorten by cutting off the top or the end"),
    (
        "resilient",
        "Able to withstand or recover quickly from difficult conditions",
    ),
];

/// Fixed word list the daily challenge draws from.
#[must_use]
pub fn curated_words() -> Vec<WordEntry> {
    CURATED
        .iter()
        .map(|(word, meaning)| WordEntry::new(*word, *meaning))
        .collect()
}

/// One attempt per calendar day: a stamp equal to `today` blocks another run.
#[must_use]
pub fn daily_challenge_available(last_completed: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_completed != Some(today)
}

/// Stamp format used for the completion date (`YYYY-MM-DD`).
#[must_use]
pub fn format_challenge_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a stored completion stamp; only the calendar day is compared.
///
/// Accepts plain dates and full RFC 3339 timestamps.
#[must_use]
pub fn parse_challenge_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim().trim_matches('"');
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.naive_utc().date())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn curated_list_is_playable() {
        let words = curated_words();
        assert_eq!(words.len(), 10);
        assert!(words.len() > DAILY_CHALLENGE_QUESTIONS);
    }

    #[test]
    fn one_attempt_per_calendar_day() {
        let today = day(2024, 5, 1);
        assert!(daily_challenge_available(None, today));
        assert!(!daily_challenge_available(Some(today), today));
        assert!(daily_challenge_available(Some(day(2024, 4, 30)), today));
    }

    #[test]
    fn stamps_round_trip_and_accept_timestamps() {
        let today = day(2024, 5, 1);
        assert_eq!(format_challenge_date(today), "2024-05-01");
        assert_eq!(parse_challenge_date("2024-05-01"), Some(today));
        assert_eq!(parse_challenge_date("\"2024-05-01\""), Some(today));
        assert_eq!(parse_challenge_date("2024-05-01T23:10:00Z"), Some(today));
        assert_eq!(parse_challenge_date("yesterday"), None);
    }
}
