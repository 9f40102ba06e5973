pub mod models;

use shelf_authz::AccessPolicy;
use shelf_db::{Changes, Migration, SqlValue, TableSchema};
use shelf_http::FieldErrors;
use shelf_kernel::Module;
use time::Date;

use super::rules;
use crate::resource::{Resource, ResourceModule};

/// Books: open reads, authenticated writes, admin-only deletes.
pub struct Books;

impl Resource for Books {
    fn schema(&self) -> &'static TableSchema {
        &models::BOOKS
    }

    fn policy(&self) -> AccessPolicy {
        AccessPolicy::admin_deletes()
    }

    fn migrations(&self) -> Vec<Migration> {
        models::migrations()
    }

    fn check(&self, changes: &Changes, today: Date, errors: &mut FieldErrors) {
        rules::year_not_in_future(
            changes,
            "publication_year",
            today,
            "Publication year cannot be in the future.",
            errors,
        );
        rules::date_year_not_in_future(
            changes,
            "publication_date",
            today,
            "Publication date cannot be in the future.",
            errors,
        );
        if let Some(isbn) = changes.get("isbn").and_then(SqlValue::as_text) {
            if !is_isbn(isbn) {
                errors.push("isbn", "ISBN must be 10 or 13 digits.");
            }
        }
    }
}

/// 10 or 13 ASCII digits. An ISBN-10 may end in `X`.
fn is_isbn(value: &str) -> bool {
    let bytes = value.as_bytes();
    match bytes.len() {
        13 => bytes.iter().all(u8::is_ascii_digit),
        10 => {
            bytes[..9].iter().all(u8::is_ascii_digit)
                && (bytes[9].is_ascii_digit() || bytes[9] == b'X')
        }
        _ => false,
    }
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    ResourceModule::shared(Books)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn check(changes: Changes) -> Vec<String> {
        let mut errors = FieldErrors::new();
        Books.check(&changes, date!(2024 - 06 - 01), &mut errors);
        errors.iter().map(|e| e.field.clone()).collect()
    }

    #[test]
    fn isbn_shapes() {
        assert!(is_isbn("9780441013593"));
        assert!(is_isbn("043942089X"));
        assert!(!is_isbn("978-0441013593"));
        assert!(!is_isbn("12345"));
    }

    #[test]
    fn future_publication_is_rejected() {
        let changes = Changes::new()
            .with("publication_year", 2030_i64)
            .with("publication_date", "2031-01-01")
            .with("isbn", "not-an-isbn");
        assert_eq!(
            check(changes),
            ["publication_year", "publication_date", "isbn"]
        );
        assert!(check(Changes::new().with("publication_year", 2024_i64)).is_empty());
    }
}
