pub mod models;

use shelf_authz::AccessPolicy;
use shelf_db::{Migration, TableSchema};
use shelf_kernel::Module;

use crate::resource::{Resource, ResourceModule};

/// Blog posts, newest first, with their comments nested.
pub struct Posts;

impl Resource for Posts {
    fn schema(&self) -> &'static TableSchema {
        &models::POSTS
    }

    fn policy(&self) -> AccessPolicy {
        AccessPolicy::editorial()
    }

    fn migrations(&self) -> Vec<Migration> {
        models::migrations()
    }
}

/// Create a new instance of the posts module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    ResourceModule::shared(Posts)
}
