pub mod models;

use shelf_authz::AccessPolicy;
use shelf_db::{Migration, TableSchema};
use shelf_kernel::Module;

use crate::resource::{Resource, ResourceModule};

/// Comments on posts, owned by the authenticated actor who wrote them.
pub struct Comments;

impl Resource for Comments {
    fn schema(&self) -> &'static TableSchema {
        &models::COMMENTS
    }

    fn policy(&self) -> AccessPolicy {
        AccessPolicy::authenticated_or_read_only()
    }

    fn migrations(&self) -> Vec<Migration> {
        models::migrations()
    }
}

/// Create a new instance of the comments module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    ResourceModule::shared(Comments)
}
