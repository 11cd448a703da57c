use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};

pub const CONSENT_COOKIE: &str = "consent_given";

const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// `; Expires=...` for `delta` from now, or nothing when the date would
/// overflow. A cookie without `Expires` lasts for the browser session.
fn expires_attr(delta: Option<Duration>) -> String {
    delta
        .and_then(|d| Utc::now().checked_add_signed(d))
        .map(|at| format!("; Expires={}", http_date(at)))
        .unwrap_or_default()
}

fn hours(n: u64) -> Option<Duration> {
    i64::try_from(n).ok().and_then(Duration::try_hours)
}

fn days(n: u64) -> Option<Duration> {
    i64::try_from(n).ok().and_then(Duration::try_days)
}

/// Session cookie for a login or a guest visit. Expiry is client-side only.
///
/// `SameSite=Lax`: top-level navigations from other sites must still carry it.
pub fn session_cookie(name: &str, token: &str, session_hours: u64) -> String {
    format!(
        "{}={}; Path=/{}; HttpOnly; SameSite=Lax",
        name,
        token,
        expires_attr(hours(session_hours))
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!(
        "{}=; Path=/; Expires={}; HttpOnly; SameSite=Lax",
        name, EPOCH_HTTP_DATE
    )
}

pub fn consent_cookie(consent_days: u64) -> String {
    format!(
        "{}=true; Path=/{}; SameSite=Lax",
        CONSENT_COOKIE,
        expires_attr(days(consent_days))
    )
}

pub fn get_cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}
