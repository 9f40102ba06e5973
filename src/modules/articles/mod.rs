pub mod models;

use shelf_authz::AccessPolicy;
use shelf_db::{Changes, Migration, TableSchema};
use shelf_http::FieldErrors;
use shelf_kernel::Module;
use time::Date;

use super::rules;
use crate::resource::{Resource, ResourceModule};

/// Editorial articles: editors write, admins delete.
pub struct Articles;

impl Resource for Articles {
    fn schema(&self) -> &'static TableSchema {
        &models::ARTICLES
    }

    fn policy(&self) -> AccessPolicy {
        AccessPolicy::editorial()
    }

    fn migrations(&self) -> Vec<Migration> {
        models::migrations()
    }

    fn check(&self, changes: &Changes, today: Date, errors: &mut FieldErrors) {
        rules::date_year_not_in_future(
            changes,
            "publication_date",
            today,
            "Publication date cannot be in the future.",
            errors,
        );
    }
}

/// Create a new instance of the articles module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    ResourceModule::shared(Articles)
}
