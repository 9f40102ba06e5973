pub mod articles;
pub mod authors;
pub mod books;
pub mod comments;
pub mod posts;
mod rules;

use shelf_kernel::ModuleRegistry;

/// Register all resource modules with the registry.
///
/// Referenced tables come first so their migrations run first.
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register(authors::create_module());
    registry.register(books::create_module());
    registry.register(articles::create_module());
    registry.register(posts::create_module());
    registry.register(comments::create_module());
}
