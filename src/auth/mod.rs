//! User authentication: cookie handling, the auth middleware, and the
//! log-in, log-out and registration pages.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod register;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use redirect::normalize_redirect_url;
pub use register::{get_register_page, register_user};

#[cfg(test)]
pub use cookie::{COOKIE_EXPIRY, COOKIE_USER_ID};

#[cfg(test)]
pub use middleware::AuthState;
