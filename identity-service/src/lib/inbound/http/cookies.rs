use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::cookie::SameSite;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Add both session cookies to the jar: HttpOnly and Secure, so scripts
/// cannot read them and they only travel over HTTPS.
pub fn with_session_cookies(jar: CookieJar, access_token: &str, refresh_token: &str) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, access_token.to_string()))
        .add(session_cookie(REFRESH_COOKIE, refresh_token.to_string()))
}

/// Instruct the client to drop both session cookies.
pub fn without_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(removal_cookie(ACCESS_COOKIE))
        .remove(removal_cookie(REFRESH_COOKIE))
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    // Path must match the original cookie for removal to take effect
    Cookie::build((name, "")).path("/").build()
}
