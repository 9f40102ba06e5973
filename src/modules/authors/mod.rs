pub mod models;

use shelf_authz::AccessPolicy;
use shelf_db::{Migration, TableSchema};
use shelf_kernel::Module;

use crate::resource::{Resource, ResourceModule};

/// Authors, each rendered with the books that reference it.
pub struct Authors;

impl Resource for Authors {
    fn schema(&self) -> &'static TableSchema {
        &models::AUTHORS
    }

    fn policy(&self) -> AccessPolicy {
        AccessPolicy::authenticated_or_read_only()
    }

    fn migrations(&self) -> Vec<Migration> {
        models::migrations()
    }
}

/// Create a new instance of the authors module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    ResourceModule::shared(Authors)
}
