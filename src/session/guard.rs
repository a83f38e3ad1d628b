use serde::Serialize;
use std::fmt;

use super::{SessionContext, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Login,
    /// Home
    Orders,
    Products,
    Users,
}

impl Route {
    pub const NAVIGATION: [Route; 3] = [Route::Orders, Route::Users, Route::Products];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Orders => "/",
            Route::Products => "/products",
            Route::Users => "/users",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Admin Login",
            Route::Orders => "Orders",
            Route::Products => "Products",
            Route::Users => "Users",
        }
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Route::Users)
    }

    /// Navigation entries for a user; Users only for admin
    pub fn visible_for(user: Option<&User>) -> Vec<Route> {
        let Some(user) = user else {
            return Vec::new();
        };
        Self::NAVIGATION
            .into_iter()
            .filter(|route| !route.requires_admin() || user.role.is_admin())
            .collect()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow(User),
    /// Public route with nobody signed in
    Anonymous,
    Redirect(Route),
}

pub fn check(session: &SessionContext, route: Route) -> Access {
    match (route, session.user()) {
        (Route::Login, None) => Access::Anonymous,
        (Route::Login, Some(_)) => Access::Redirect(Route::Orders),
        (_, None) => Access::Redirect(Route::Login),
        (route, Some(user)) if route.requires_admin() && !user.role.is_admin() => Access::Redirect(Route::Orders),
        (_, Some(user)) => Access::Allow(user.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn session(role: Role) -> SessionContext {
        SessionContext::with_user(User { username: "u".into(), role })
    }

    #[test]
    fn anonymous_users_go_to_login() {
        let anon = SessionContext::anonymous();
        assert_eq!(check(&anon, Route::Orders), Access::Redirect(Route::Login));
        assert_eq!(check(&anon, Route::Users), Access::Redirect(Route::Login));
        assert_eq!(check(&anon, Route::Login), Access::Anonymous);
    }

    #[test]
    fn users_page_is_admin_only() {
        assert_eq!(check(&session(Role::Superuser), Route::Users), Access::Redirect(Route::Orders));
        assert!(matches!(check(&session(Role::Admin), Route::Users), Access::Allow(_)));
        assert!(matches!(check(&session(Role::User), Route::Products), Access::Allow(_)));
    }

    #[test]
    fn navigation_hides_users_for_non_admins() {
        let admin = User { username: "a".into(), role: Role::Admin };
        let clerk = User { username: "c".into(), role: Role::Superuser };
        assert_eq!(Route::visible_for(Some(&admin)), vec![Route::Orders, Route::Users, Route::Products]);
        assert_eq!(Route::visible_for(Some(&clerk)), vec![Route::Orders, Route::Products]);
        assert!(Route::visible_for(None).is_empty());
    }
}
