//! Authorization rules for user management
//!
//! Every mutating user operation asks this module first. The functions are
//! pure: they look only at the acting identity and the stored target, so the
//! whole role matrix is covered by unit tests without a database.
//!
//! | Action            | SuperAdmin actor                   | Admin actor                      |
//! |-------------------|------------------------------------|----------------------------------|
//! | register (no role)| creates Admin                      | creates Admin                    |
//! | register Admin    | allowed                            | rejected                         |
//! | register SuperAdmin | rejected                         | rejected                         |
//! | update self       | allowed, may not change own role   | allowed, role field dropped      |
//! | update other      | allowed, cannot grant SuperAdmin   | rejected                         |
//! | remove SuperAdmin | rejected                           | rejected                         |
//! | remove Admin      | allowed unless self                | rejected                         |

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::models::{User, UserRole};

/// Role a newly registered account receives
pub fn register_role(actor: &AuthenticatedUser, requested: Option<UserRole>) -> Result<UserRole> {
    match requested {
        Some(UserRole::SuperAdmin) => Err(AppError::Unauthorized(
            "The SuperAdmin role cannot be assigned".to_string(),
        )),
        Some(UserRole::Admin) if !actor.is_super_admin() => Err(AppError::Unauthorized(
            "Only the SuperAdmin can explicitly create an Admin".to_string(),
        )),
        _ => Ok(UserRole::Admin),
    }
}

/// Role change to apply when `actor` patches `target`.
///
/// Any user may patch their own record; only the SuperAdmin may patch others.
/// `Ok(None)` leaves the stored role untouched. A role sent by anyone other
/// than the SuperAdmin is ignored rather than rejected.
pub fn update_role(
    actor: &AuthenticatedUser,
    target: &User,
    requested: Option<UserRole>,
) -> Result<Option<UserRole>> {
    if actor.id != target.id && !actor.is_super_admin() {
        return Err(AppError::Unauthorized(
            "Modifying another user requires SuperAdmin".to_string(),
        ));
    }

    let Some(role) = requested else {
        return Ok(None);
    };

    if !actor.is_super_admin() {
        tracing::debug!(
            "Dropping role change requested by non-SuperAdmin user {}",
            actor.id
        );
        return Ok(None);
    }

    if role == target.role {
        return Ok(None);
    }

    if role == UserRole::SuperAdmin {
        return Err(AppError::Unauthorized(
            "The SuperAdmin role cannot be assigned".to_string(),
        ));
    }

    if target.role == UserRole::SuperAdmin {
        return Err(AppError::Unauthorized(
            "The SuperAdmin cannot change their own role".to_string(),
        ));
    }

    Ok(Some(role))
}

/// Whether `actor` may delete `target`
pub fn can_remove(actor: &AuthenticatedUser, target: &User) -> Result<()> {
    if target.role == UserRole::SuperAdmin {
        return Err(AppError::Unauthorized(
            "The SuperAdmin cannot be deleted".to_string(),
        ));
    }

    if target.role == UserRole::Admin && !actor.is_super_admin() {
        return Err(AppError::Unauthorized(
            "Deleting an Admin requires SuperAdmin".to_string(),
        ));
    }

    if actor.id == target.id {
        return Err(AppError::Unauthorized(
            "Users cannot delete themselves".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn actor(id: i32, role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            id,
            login: format!("user{}", id),
            role,
        }
    }

    fn stored(id: i32, role: UserRole) -> User {
        User {
            id,
            login: format!("user{}", id),
            password: String::new(),
            name: None,
            email: None,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    const SUPER: UserRole = UserRole::SuperAdmin;
    const ADMIN: UserRole = UserRole::Admin;

    #[test]
    fn test_register_defaults_to_admin() {
        assert_eq!(register_role(&actor(2, ADMIN), None).unwrap(), ADMIN);
        assert_eq!(register_role(&actor(1, SUPER), None).unwrap(), ADMIN);
    }

    #[test]
    fn test_register_explicit_admin_requires_super_admin() {
        assert_eq!(register_role(&actor(1, SUPER), Some(ADMIN)).unwrap(), ADMIN);
        assert!(matches!(
            register_role(&actor(2, ADMIN), Some(ADMIN)),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_register_super_admin_always_rejected() {
        for role in [SUPER, ADMIN] {
            assert!(register_role(&actor(1, role), Some(SUPER)).is_err());
        }
    }

    #[test]
    fn test_admin_role_change_is_silently_dropped() {
        let me = actor(2, ADMIN);
        assert_eq!(update_role(&me, &stored(2, ADMIN), Some(SUPER)).unwrap(), None);
        assert_eq!(update_role(&me, &stored(2, ADMIN), None).unwrap(), None);
    }

    #[test]
    fn test_admin_cannot_update_others() {
        let me = actor(2, ADMIN);
        assert!(update_role(&me, &stored(3, ADMIN), None).is_err());
        assert!(update_role(&me, &stored(1, SUPER), None).is_err());
    }

    #[test]
    fn test_super_admin_updates_admins_but_never_grants_super() {
        let root = actor(1, SUPER);
        assert_eq!(update_role(&root, &stored(3, ADMIN), None).unwrap(), None);
        assert_eq!(update_role(&root, &stored(3, ADMIN), Some(ADMIN)).unwrap(), None);
        assert!(update_role(&root, &stored(3, ADMIN), Some(SUPER)).is_err());
    }

    #[test]
    fn test_super_admin_keeps_own_role() {
        let root = actor(1, SUPER);
        assert!(update_role(&root, &stored(1, SUPER), Some(ADMIN)).is_err());
        assert_eq!(update_role(&root, &stored(1, SUPER), Some(SUPER)).unwrap(), None);
    }

    #[test]
    fn test_super_admin_is_never_removable() {
        assert!(can_remove(&actor(1, SUPER), &stored(1, SUPER)).is_err());
        assert!(can_remove(&actor(2, ADMIN), &stored(1, SUPER)).is_err());
    }

    #[test]
    fn test_remove_admin_rules() {
        assert!(can_remove(&actor(1, SUPER), &stored(3, ADMIN)).is_ok());
        assert!(can_remove(&actor(2, ADMIN), &stored(3, ADMIN)).is_err());
        assert!(can_remove(&actor(2, ADMIN), &stored(2, ADMIN)).is_err());
    }
}
