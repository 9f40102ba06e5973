use std::sync::Arc;

use shelf_authz::{Principal, TokenDirectory};
use shelf_db::Db;

use crate::settings::Settings;

/// Shared, cheaply clonable state handed to every module router.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub db: Db,
    pub tokens: Arc<TokenDirectory>,
}

impl AppContext {
    pub fn new(settings: Settings, db: Db) -> Self {
        let tokens = TokenDirectory::new(settings.auth.tokens.iter().map(|t| {
            (
                t.token.clone(),
                Principal::new(t.username.clone(), t.role),
            )
        }));
        Self {
            settings: Arc::new(settings),
            db,
            tokens: Arc::new(tokens),
        }
    }
}
