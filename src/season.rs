use chrono::{Datelike, NaiveDate};

// Seasons are labelled by the year they kick off in August.
const SEASON_START_MONTH: u32 = 8;
const SEASON_END_MONTH: u32 = 5;
const SEASON_END_DAY: u32 = 31;

pub fn current_season(today: NaiveDate) -> i32 {
    let year = today.year();
    if today.month() < SEASON_START_MONTH {
        year - 1
    } else {
        year
    }
}

pub fn season_start(season: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(season, SEASON_START_MONTH, 1).unwrap_or(NaiveDate::MIN)
}

pub fn season_end(season: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(season + 1, SEASON_END_MONTH, SEASON_END_DAY)
        .unwrap_or(NaiveDate::MAX)
}

pub fn is_season_finished(season: i32, today: NaiveDate) -> bool {
    today > season_end(season)
}

/// Season to query for upcoming fixtures. During the June/July gap the
/// previous season is over, so fixtures belong to the next one.
pub fn season_for_fixtures(today: NaiveDate) -> i32 {
    let current = current_season(today);
    if is_season_finished(current, today) {
        current + 1
    } else {
        current
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn months_before_august_belong_to_previous_season() {
        for month in 1..=7 {
            assert_eq!(current_season(d(2025, month, 15)), 2024, "month {month}");
        }
        for month in 8..=12 {
            assert_eq!(current_season(d(2025, month, 15)), 2025, "month {month}");
        }
    }

    #[test]
    fn season_bounds() {
        assert_eq!(season_start(2024), d(2024, 8, 1));
        assert_eq!(season_end(2024), d(2025, 5, 31));
        assert!(!is_season_finished(2024, d(2025, 5, 31)));
        assert!(is_season_finished(2024, d(2025, 6, 1)));
    }

    #[test]
    fn summer_gap_rolls_forward() {
        assert_eq!(season_for_fixtures(d(2025, 3, 10)), 2024);
        assert_eq!(season_for_fixtures(d(2025, 6, 20)), 2025);
        assert_eq!(season_for_fixtures(d(2025, 7, 31)), 2025);
        assert_eq!(season_for_fixtures(d(2025, 9, 1)), 2025);
    }

    #[test]
    fn formats_iso_dates() {
        assert_eq!(format_date(d(2025, 1, 9)), "2025-01-09");
    }
}
