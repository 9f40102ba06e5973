use shelf_db::{Changes, SqlValue};
use shelf_http::FieldErrors;
use time::Date;

use crate::utils;

/// Reject an integer year column later than the current year.
pub fn year_not_in_future(
    changes: &Changes,
    column: &str,
    today: Date,
    message: &str,
    errors: &mut FieldErrors,
) {
    if let Some(year) = changes.get(column).and_then(SqlValue::as_integer) {
        if year > i64::from(today.year()) {
            errors.push(column, message);
        }
    }
}

/// Reject a date column whose year is later than the current year.
pub fn date_year_not_in_future(
    changes: &Changes,
    column: &str,
    today: Date,
    message: &str,
    errors: &mut FieldErrors,
) {
    let date = changes
        .get(column)
        .and_then(SqlValue::as_text)
        .and_then(utils::parse_date);
    if let Some(date) = date {
        if date.year() > today.year() {
            errors.push(column, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    const TODAY: Date = date!(2024 - 06 - 01);

    #[test]
    fn current_year_is_allowed_next_year_is_not() {
        let mut errors = FieldErrors::new();
        let ok = Changes::new().with("year", 2024_i64).with("on", "2024-12-31");
        year_not_in_future(&ok, "year", TODAY, "future", &mut errors);
        date_year_not_in_future(&ok, "on", TODAY, "future", &mut errors);
        assert!(errors.is_empty());

        let late = Changes::new().with("year", 2025_i64).with("on", "2025-01-01");
        year_not_in_future(&late, "year", TODAY, "future", &mut errors);
        date_year_not_in_future(&late, "on", TODAY, "future", &mut errors);
        assert_eq!(errors.len(), 2);
    }
}
