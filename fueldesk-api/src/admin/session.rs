/// Cookie-backed admin sessions
///
/// The session cookie carries the same JWT the GraphQL API issues, so a
/// session is resolved exactly like a bearer token. Staff may sign in and
/// view the dashboard; only superusers may read or change records.

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use fueldesk_shared::auth::{
    authorization::{self, AuthzError},
    middleware::{resolve_context, AuthContext},
};
use fueldesk_shared::models::user::User;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::app::AppState;
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "fueldesk_session";
pub const LOGIN_URL: &str = "/admin/login/";

/// Escapes everything but unreserved characters
pub const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Like `QUERY_VALUE`, but keeps path separators readable
const NEXT_VALUE: &AsciiSet = &QUERY_VALUE.remove(b'/');

/// What a page requires of the signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Staff,
    Superuser,
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Login URL that returns to `uri` afterwards
pub fn login_redirect(uri: &Uri) -> Redirect {
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/admin/");

    Redirect::to(&format!("{}?next={}", LOGIN_URL, utf8_percent_encode(next, NEXT_VALUE)))
}

/// Only local paths are accepted as redirect targets
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if is_local_path(n) => n,
        _ => "/admin/",
    }
}

// Browsers read `/\host` as `//host`
fn is_local_path(next: &str) -> bool {
    let mut chars = next.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/') | Some('\\'))
        && !next.chars().any(char::is_control)
}

/// Resolves the session cookie, if any
pub async fn current_context(state: &AppState, jar: &CookieJar) -> Result<AuthContext, ApiError> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let ctx = resolve_context(&state.db, &state.config.jwt.secret, token.as_deref()).await?;
    Ok(ctx)
}

/// Loads the session user and checks `access`
///
/// Missing or unusable sessions redirect to the login page; a staff user
/// reaching a superuser page gets a 403.
pub async fn require(
    state: &AppState,
    jar: &CookieJar,
    uri: &Uri,
    access: Access,
) -> Result<User, Response> {
    let ctx = current_context(state, jar)
        .await
        .map_err(IntoResponse::into_response)?;

    let checked = match access {
        Access::Staff => authorization::require_staff(&ctx),
        Access::Superuser => authorization::require_superuser(&ctx),
    };

    match checked {
        Ok(user) => Ok(user.clone()),
        Err(AuthzError::NotSuperuser) => Err((
            StatusCode::FORBIDDEN,
            "You do not have permission to view this page",
        )
            .into_response()),
        Err(e) => {
            tracing::debug!(error = %e, path = %uri.path(), "Admin session rejected");
            Err(login_redirect(uri).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_keeps_target() {
        let uri: Uri = "/admin/app/fuel/?q=diesel&p=2".parse().unwrap();
        let response = login_redirect(&uri).into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/admin/login/?next=/admin/app/fuel/%3Fq%3Ddiesel%26p%3D2"
        );
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/admin/app/user/")), "/admin/app/user/");
        assert_eq!(safe_next(Some("https://evil.example")), "/admin/");
        assert_eq!(safe_next(Some("//evil.example")), "/admin/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/admin/");
        assert_eq!(safe_next(Some("/admin/\nSet-Cookie: x")), "/admin/");
        assert_eq!(safe_next(Some("/admin/app/fuel/?q=a%5Cb")), "/admin/app/fuel/?q=a%5Cb");
        assert_eq!(safe_next(None), "/admin/");
    }

    #[test]
    fn test_session_cookie_flags() {
        let cookie = session_cookie("token".to_string(), true);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }
}
