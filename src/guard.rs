//! Page routes and the navigation guard.

use tracing::debug;

use crate::auth::{AuthSession, AuthUser};

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login1";
pub const HOME_PATH: &str = "/main";

/// Paths reachable without a logged-in user.
pub const PUBLIC_PATHS: &[&str] = &[
    "/",
    "/login1",
    "/register1",
    "/forgot-pwd1",
    "/check-mail1",
    "/reset-pwd1",
    "/code-verify1",
    "/comingsoon1",
    "/comingsoon2",
    "/construction1",
    "/construction2",
    "/error",
];

/// Every page the dashboard knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    ForgotPassword,
    CheckMail,
    ResetPassword,
    CodeVerification,
    ComingSoon,
    UnderConstruction,
    Error,
    Dashboard,
    Subjects,
    NewSubject,
    Plans,
    NewPlan,
    Tasks,
    Cycles,
    StudySession,
    Starter,
    NotFound,
}

impl Route {
    /// Resolves a path, ignoring any query string or fragment.
    pub fn parse(full_path: &str) -> Route {
        match path_only(full_path) {
            "/" | "/login1" => Route::Login,
            "/register1" => Route::Register,
            "/forgot-pwd1" => Route::ForgotPassword,
            "/check-mail1" => Route::CheckMail,
            "/reset-pwd1" => Route::ResetPassword,
            "/code-verify1" => Route::CodeVerification,
            "/comingsoon1" | "/comingsoon2" => Route::ComingSoon,
            "/construction1" | "/construction2" => Route::UnderConstruction,
            "/error" => Route::Error,
            "/main" => Route::Dashboard,
            "/main/subjects" => Route::Subjects,
            "/main/subjects/new" => Route::NewSubject,
            "/main/plans" => Route::Plans,
            "/main/plans/new" => Route::NewPlan,
            "/main/tasks" => Route::Tasks,
            "/main/cycles" => Route::Cycles,
            "/main/study-session" => Route::StudySession,
            "/main/starter" => Route::Starter,
            _ => Route::NotFound,
        }
    }

    /// Canonical path of the page.
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login1",
            Route::Register => "/register1",
            Route::ForgotPassword => "/forgot-pwd1",
            Route::CheckMail => "/check-mail1",
            Route::ResetPassword => "/reset-pwd1",
            Route::CodeVerification => "/code-verify1",
            Route::ComingSoon => "/comingsoon1",
            Route::UnderConstruction => "/construction1",
            Route::Error | Route::NotFound => "/error",
            Route::Dashboard => "/main",
            Route::Subjects => "/main/subjects",
            Route::NewSubject => "/main/subjects/new",
            Route::Plans => "/main/plans",
            Route::NewPlan => "/main/plans/new",
            Route::Tasks => "/main/tasks",
            Route::Cycles => "/main/cycles",
            Route::StudySession => "/main/study-session",
            Route::Starter => "/main/starter",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Register => "Register",
            Route::ForgotPassword => "Forgot Password",
            Route::CheckMail => "Check Mail",
            Route::ResetPassword => "Reset Password",
            Route::CodeVerification => "Code Verification",
            Route::ComingSoon => "Coming Soon",
            Route::UnderConstruction => "Under Construction",
            Route::Error => "Error",
            Route::NotFound => "Not Found",
            Route::Dashboard => "Dashboard",
            Route::Subjects => "Subjects",
            Route::NewSubject => "New Subject",
            Route::Plans => "Plans",
            Route::NewPlan => "New Plan",
            Route::Tasks => "Tasks",
            Route::Cycles => "Cycles",
            Route::StudySession => "Study Session",
            Route::Starter => "Starter",
        }
    }
}

fn path_only(full_path: &str) -> &str {
    full_path.split(['?', '#']).next().unwrap_or(full_path)
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect {
        to: String,
        /// Path to return to after logging in.
        return_url: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    public_paths: Vec<String>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        RouteGuard::new(PUBLIC_PATHS.iter().map(|p| p.to_string()))
    }
}

impl RouteGuard {
    pub fn new(public_paths: impl IntoIterator<Item = String>) -> Self {
        RouteGuard { public_paths: public_paths.into_iter().collect() }
    }

    pub fn is_public(&self, path: &str) -> bool {
        let path = path_only(path);
        self.public_paths.iter().any(|p| p == path)
    }

    /// - anonymous user on a non-public path: back to `/`, remembering where they were going;
    /// - logged-in user on a login path: to the dashboard;
    /// - anything else passes.
    pub fn check(&self, full_path: &str, principal: Option<&AuthUser>) -> Navigation {
        let path = path_only(full_path);
        match principal {
            None if !self.is_public(path) => Navigation::Redirect {
                to: ROOT_PATH.to_string(),
                return_url: Some(full_path.to_string()),
            },
            Some(_) if path == ROOT_PATH || path == LOGIN_PATH => {
                Navigation::Redirect { to: HOME_PATH.to_string(), return_url: None }
            }
            _ => Navigation::Allow,
        }
    }
}

/// Tracks the current page and applies the guard to every page change.
#[derive(Debug)]
pub struct Navigator {
    guard: RouteGuard,
    current: String,
    loading: bool,
}

impl Navigator {
    pub fn new(guard: RouteGuard) -> Self {
        Navigator { guard, current: ROOT_PATH.to_string(), loading: false }
    }

    pub fn current_path(&self) -> &str {
        &self.current
    }

    pub fn current_route(&self) -> Route {
        Route::parse(&self.current)
    }

    /// True only while a navigation is being resolved. `navigate` resolves
    /// synchronously, so callers always observe `false`.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Navigates to `path`, following guard redirects, and returns the page
    /// actually reached. Redirects to login store the requested path as the
    /// session's return URL.
    pub fn navigate(&mut self, path: &str, session: &mut AuthSession) -> Route {
        self.loading = true;
        let mut target = path.to_string();
        // a redirect target is always allowed by the next check, so two hops suffice
        for _ in 0..2 {
            match self.guard.check(&target, session.user()) {
                Navigation::Allow => break,
                Navigation::Redirect { to, return_url } => {
                    debug!(from = %target, to = %to, "navigation redirected");
                    if let Some(url) = return_url {
                        session.set_return_url(Some(url));
                    }
                    target = to;
                }
            }
        }
        self.current = target;
        self.loading = false;
        debug!(path = %self.current, "navigated");
        self.current_route()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthUser {
        AuthUser {
            id: 1,
            email: "info@phoenixcoded.co".into(),
            first_name: "Phoenixcoded".into(),
            last_name: ".com".into(),
            token: "fake-jwt-token".into(),
        }
    }

    #[test]
    fn anonymous_user_is_sent_to_root() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.check("/main/tasks", None),
            Navigation::Redirect { to: "/".into(), return_url: Some("/main/tasks".into()) }
        );
    }

    #[test]
    fn logged_in_user_skips_login() {
        let guard = RouteGuard::default();
        let u = user();
        assert_eq!(
            guard.check("/login1", Some(&u)),
            Navigation::Redirect { to: "/main".into(), return_url: None }
        );
        assert_eq!(
            guard.check("/", Some(&u)),
            Navigation::Redirect { to: "/main".into(), return_url: None }
        );
    }

    #[test]
    fn public_and_authorized_paths_pass() {
        let guard = RouteGuard::default();
        let u = user();
        assert_eq!(guard.check("/register1", None), Navigation::Allow);
        assert_eq!(guard.check("/error", Some(&u)), Navigation::Allow);
        assert_eq!(guard.check("/main/cycles", Some(&u)), Navigation::Allow);
    }

    #[test]
    fn query_string_is_kept_in_return_url() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.check("/main/plans?tab=active", None),
            Navigation::Redirect {
                to: "/".into(),
                return_url: Some("/main/plans?tab=active".into())
            }
        );
        assert!(guard.is_public("/login1?next=1"));
    }

    #[test]
    fn routes_parse_and_fall_back_to_not_found() {
        assert_eq!(Route::parse("/main/study-session"), Route::StudySession);
        assert_eq!(Route::parse("/"), Route::Login);
        assert_eq!(Route::parse("/nope"), Route::NotFound);
        assert_eq!(Route::parse(Route::Cycles.path()), Route::Cycles);
    }

    #[test]
    fn loading_flag_is_clear_once_navigation_resolves() {
        let mut session = AuthSession::restore(Box::new(crate::storage::MemoryStore::new()));
        let mut nav = Navigator::new(RouteGuard::default());
        assert!(!nav.is_loading());
        assert_eq!(nav.navigate("/main/plans", &mut session), Route::Login);
        assert!(!nav.is_loading());
        assert_eq!(nav.navigate("/login1", &mut session), Route::Login);
        assert!(!nav.is_loading());
    }
}
