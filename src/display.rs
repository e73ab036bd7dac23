use chrono::NaiveDate;
use itertools::Itertools;

const CAPITALIZED_MAX_CHARS: usize = 18;
const TITLE_MAX_CHARS: usize = 25;
const TITLE_TRUNCATED_CHARS: usize = 20;
const ELLIPSIS: &str = "...";

/// Norwegian short date, e.g. `10.06.2024`.
pub fn format_date(day: NaiveDate) -> String {
    day.format("%d.%m.%Y").to_string()
}

pub fn format_stay(date_from: NaiveDate, date_to: NaiveDate) -> String {
    format!("{} - {}", format_date(date_from), format_date(date_to))
}

/// Lowercases, capitalizes every word and keeps at most 18 characters.
pub fn capitalize_words(text: &str) -> String {
    text.to_lowercase()
        .split(' ')
        .map(capitalize_first)
        .join(" ")
        .chars()
        .take(CAPITALIZED_MAX_CHARS)
        .collect()
}

/// Capitalizes every word. Titles longer than 25 characters are cut to 20 and get an ellipsis.
pub fn format_title(text: &str) -> String {
    let capitalized = text.split(' ').map(capitalize_first).join(" ");

    if capitalized.chars().count() <= TITLE_MAX_CHARS {
        return capitalized;
    }

    let truncated: String = capitalized.chars().take(TITLE_TRUNCATED_CHARS).collect();

    format!("{}{}", truncated.trim(), ELLIPSIS)
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
