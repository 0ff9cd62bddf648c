use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppError, middleware::auth::AuthUser};

/// Navigation items the client can render. Fixed set, no hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum NavItem {
    Dashboard,
    Roles,
    Users,
    Products,
    #[serde(rename = "POS")]
    Pos,
    Feedbacks,
}

/// Static role -> navigation table. Unknown role names resolve to nothing;
/// a caller with no resolvable role at all gets DEFAULT_NAV instead.
const ROLE_NAV: &[(&str, &[NavItem])] = &[
    (
        "Admin",
        &[
            NavItem::Dashboard,
            NavItem::Roles,
            NavItem::Users,
            NavItem::Products,
            NavItem::Pos,
            NavItem::Feedbacks,
        ],
    ),
    ("Cashier", &[NavItem::Dashboard, NavItem::Pos]),
    (
        "Manager",
        &[
            NavItem::Dashboard,
            NavItem::Products,
            NavItem::Pos,
            NavItem::Feedbacks,
        ],
    ),
];

pub const DEFAULT_NAV: &[NavItem] = &[NavItem::Dashboard, NavItem::Pos];

pub fn nav_items(role_name: Option<&str>) -> &'static [NavItem] {
    match role_name {
        None => DEFAULT_NAV,
        Some(name) => ROLE_NAV
            .iter()
            .find(|(role, _)| *role == name)
            .map(|(_, items)| *items)
            .unwrap_or(&[]),
    }
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, "Admin")
}

/// Per-route allow-list check. Explicit role names only, no wildcards.
pub fn ensure_any(user: &AuthUser, allowed: &[&str]) -> Result<(), AppError> {
    if !allowed.contains(&user.role.as_str()) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_sees_everything() {
        assert_eq!(
            nav_items(Some("Admin")),
            &[
                NavItem::Dashboard,
                NavItem::Roles,
                NavItem::Users,
                NavItem::Products,
                NavItem::Pos,
                NavItem::Feedbacks,
            ]
        );
    }

    #[test]
    fn cashier_sees_dashboard_and_pos() {
        assert_eq!(nav_items(Some("Cashier")), &[NavItem::Dashboard, NavItem::Pos]);
    }

    #[test]
    fn manager_has_no_user_administration() {
        let items = nav_items(Some("Manager"));
        assert!(items.contains(&NavItem::Products));
        assert!(items.contains(&NavItem::Feedbacks));
        assert!(!items.contains(&NavItem::Users));
        assert!(!items.contains(&NavItem::Roles));
    }

    #[test]
    fn unresolved_role_falls_back_to_safe_default() {
        assert_eq!(nav_items(None), &[NavItem::Dashboard, NavItem::Pos]);
    }

    #[test]
    fn unknown_role_name_sees_nothing() {
        assert!(nav_items(Some("Intern")).is_empty());
    }

    #[test]
    fn allow_list_is_exact() {
        let manager = AuthUser {
            user_id: uuid::Uuid::new_v4(),
            role: "Manager".into(),
        };
        assert!(ensure_any(&manager, &["Admin", "Manager"]).is_ok());
        assert!(ensure_any(&manager, &["Admin"]).is_err());
        assert!(ensure_admin(&manager).is_err());
    }
}
