use shelf_authz::{AccessPolicy, Action, Decision};

use crate::auth::Actor;
use crate::error::AppError;

/// Apply `policy` to `action` by `actor`, turning a denial into the matching error.
pub fn authorize(
    resource: &str,
    policy: &AccessPolicy,
    action: Action,
    actor: &Actor,
) -> Result<(), AppError> {
    match policy.decide(action, actor.principal()) {
        Decision::Allow => Ok(()),
        Decision::Unauthenticated => {
            tracing::info!(resource, action = action.as_str(), "denied anonymous request");
            Err(AppError::unauthorized(
                "Authentication credentials were not provided.",
            ))
        }
        Decision::Forbidden => {
            tracing::warn!(
                resource,
                action = action.as_str(),
                user = actor.username().unwrap_or_default(),
                "denied insufficient role"
            );
            Err(AppError::forbidden(
                "You do not have permission to perform this action.",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use shelf_authz::{Principal, Role};

    #[test]
    fn decisions_map_to_status_codes() {
        let policy = AccessPolicy::admin_deletes();
        let editor = Actor(Some(Principal::new("ed", Role::Editor)));
        let admin = Actor(Some(Principal::new("root", Role::Admin)));

        assert!(authorize("books", &policy, Action::List, &Actor::anonymous()).is_ok());
        assert_eq!(
            authorize("books", &policy, Action::Create, &Actor::anonymous())
                .unwrap_err()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert!(authorize("books", &policy, Action::Update, &editor).is_ok());
        assert_eq!(
            authorize("books", &policy, Action::Delete, &editor)
                .unwrap_err()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert!(authorize("books", &policy, Action::Delete, &admin).is_ok());
    }
}
