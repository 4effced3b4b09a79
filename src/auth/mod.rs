use crate::state::AppState;
use axum::Router;
use lazy_static::lazy_static;
use regex::Regex;

pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
