//! Route authorization: which roles may open which dashboard page.
//!
//! One static table drives the edge middleware, the record API guards and the
//! sidebar navigation, so the three can never disagree.

use serde::Serialize;

use dashboard_core::Role;

/// Route -> allowed roles.
const ROUTE_PERMISSIONS: &[(&str, &[Role])] = &[
    ("/dashboard", &[Role::Admin, Role::User]),
    ("/dashboard/users", &[Role::Admin]),
    ("/dashboard/products", &[Role::Admin]),
    ("/dashboard/reports", &[Role::Admin, Role::User]),
    ("/dashboard/settings", &[Role::Admin, Role::User]),
];

/// Sidebar entries in display order.
const NAVIGATION: &[(&str, &str)] = &[
    ("Dashboard", "/dashboard"),
    ("Users", "/dashboard/users"),
    ("Products", "/dashboard/products"),
    ("Reports", "/dashboard/reports"),
    ("Settings", "/dashboard/settings"),
];

/// Roles allowed on `route`, or `None` if the route is not in the table.
#[must_use]
pub fn allowed_roles(route: &str) -> Option<&'static [Role]> {
    let route = normalize(route);
    ROUTE_PERMISSIONS
        .iter()
        .find(|(path, _)| *path == route)
        .map(|(_, roles)| *roles)
}

/// Whether `role` may open `route`. Routes missing from the table are
/// admin-only.
#[must_use]
pub fn check_access(route: &str, role: Role) -> bool {
    allowed_roles(route).map_or(role.is_admin(), |roles| roles.contains(&role))
}

/// A sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub name: &'static str,
    pub href: &'static str,
    /// Whether this entry is the page being viewed.
    pub active: bool,
}

/// Sidebar entries visible to `role`, marking `current` as active.
#[must_use]
pub fn navigation(role: Role, current: &str) -> Vec<NavItem> {
    let current = normalize(current);
    NAVIGATION
        .iter()
        .filter(|(_, href)| check_access(href, role))
        .map(|&(name, href)| NavItem {
            name,
            href,
            active: href == current,
        })
        .collect()
}

fn normalize(route: &str) -> &str {
    match route.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_table() {
        for role in Role::ALL {
            assert!(check_access("/dashboard", role));
            assert!(check_access("/dashboard/reports", role));
            assert!(check_access("/dashboard/settings", role));
        }
        assert!(check_access("/dashboard/users", Role::Admin));
        assert!(!check_access("/dashboard/users", Role::User));
        assert!(check_access("/dashboard/products", Role::Admin));
        assert!(!check_access("/dashboard/products", Role::User));
    }

    #[test]
    fn test_unknown_route_is_admin_only() {
        assert!(check_access("/dashboard/billing", Role::Admin));
        assert!(!check_access("/dashboard/billing", Role::User));
        assert!(allowed_roles("/dashboard/billing").is_none());
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        assert!(check_access("/dashboard/settings/", Role::User));
    }

    #[test]
    fn test_navigation_filters_by_role() {
        let user_nav: Vec<_> = navigation(Role::User, "/dashboard")
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(user_nav, vec!["Dashboard", "Reports", "Settings"]);

        let admin_nav = navigation(Role::Admin, "/dashboard/users");
        assert_eq!(admin_nav.len(), 5);
        assert!(admin_nav.iter().any(|item| item.name == "Users" && item.active));
        assert_eq!(admin_nav.iter().filter(|item| item.active).count(), 1);
    }
}
