//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::http::header::{AUTHORIZATION, HeaderName};
use actix_web::web;

use crate::domain::{LoginCredentials, Registration, Role};
use crate::inbound::http::state::HttpState;
use crate::test_support::{MutableClock, memory_http_state};

pub const TEST_PASSWORD: &str = "password123";

/// In-memory state plus the clock driving it.
pub fn memory_state() -> (web::Data<HttpState>, Arc<MutableClock>) {
    let clock = Arc::new(MutableClock::default());
    (web::Data::new(memory_http_state(clock.clone())), clock)
}

/// Register an account with `role` and return a bearer token for it.
pub async fn signed_in(state: &HttpState, email: &str, role: Role) -> String {
    let registration = Registration::try_from_parts("Test User", email, TEST_PASSWORD)
        .expect("valid registration")
        .with_role(role);
    state.auth.register(registration).await.expect("register");
    let credentials = LoginCredentials::try_from_parts(email, TEST_PASSWORD).expect("creds");
    let outcome = state.auth.login(&credentials).await.expect("login");
    outcome.token.as_str().to_owned()
}

/// `Authorization` header carrying `token`.
pub fn bearer(token: &str) -> (HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}
