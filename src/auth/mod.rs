mod extract;
mod logout;
mod session;
mod token;

use axum::http::{header::AUTHORIZATION, HeaderMap};

pub use extract::CurrentUser;
pub use logout::logout;
pub use session::bind_session;
pub use token::{Claims, TokenVerifier};

/// Cookie-session key holding the signed-in user id.
pub const USER_ID: &str = "user_id";

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
