//! One generic controller serving every schema-declared resource.

pub mod controller;
pub mod module;
pub mod openapi;
pub mod params;
pub mod validate;

use shelf_authz::AccessPolicy;
use shelf_db::{Changes, Migration, TableSchema};
use shelf_http::FieldErrors;
use time::Date;

pub use module::ResourceModule;

/// A resource exposed through list, detail, create, update and delete
/// endpoints under `/api/{schema.name}`.
pub trait Resource: Send + Sync + 'static {
    fn schema(&self) -> &'static TableSchema;

    fn policy(&self) -> AccessPolicy;

    fn migrations(&self) -> Vec<Migration>;

    /// Entity rules that go beyond single-column constraints.
    ///
    /// Receives only the values that passed their column checks; on a
    /// partial update that is just the supplied fields.
    fn check(&self, _changes: &Changes, _today: Date, _errors: &mut FieldErrors) {}
}
