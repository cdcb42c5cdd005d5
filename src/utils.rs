// Utility functions
use chrono::{Local, NaiveDate};
use rand::Rng;
use std::time::Duration;

/// Run capture date in the `DD-MM-YYYY` form stamped on every record.
pub fn capture_date() -> String {
    format_capture_date(Local::now().date_naive())
}

pub fn format_capture_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Picks a random pause in `[min, max]` before moving to the next page.
pub fn politeness_delay(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let secs = rand::rng().random_range(min.as_secs_f64()..=max.as_secs_f64());
    Duration::from_secs_f64(secs)
}

/// Collapses whitespace runs to a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_date_is_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(format_capture_date(date), "07-03-2024");
    }

    #[test]
    fn delay_stays_in_bounds() {
        let min = Duration::from_millis(1500);
        let max = Duration::from_millis(3500);
        for _ in 0..100 {
            let d = politeness_delay(min, max);
            assert!(d >= min && d <= max, "{d:?} out of range");
        }
        assert_eq!(politeness_delay(max, max), max);
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(collapse_whitespace("  Steel \n\t pipes  "), "Steel pipes");
        assert_eq!(collapse_whitespace(" \n "), "");
    }
}
