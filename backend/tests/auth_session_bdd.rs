//! Behaviour tests for sign-in and the per-request session context.
#![allow(non_snake_case)]

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use backend::domain::{
    AccessToken, Error, ErrorCode, LoginCredentials, Registration, Role,
};
use backend::inbound::http::session::{SessionContext, SessionState};
use backend::inbound::http::state::HttpState;
use backend::test_support::{MutableClock, memory_http_state};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;

struct SessionWorld {
    runtime: Runtime,
    clock: Arc<MutableClock>,
    state: HttpState,
    token: Option<AccessToken>,
    role: Option<Role>,
    login_error: Option<Error>,
}

impl std::fmt::Debug for SessionWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWorld")
            .field("token", &self.token)
            .field("role", &self.role)
            .field("login_error", &self.login_error)
            .finish_non_exhaustive()
    }
}

impl SessionWorld {
    fn new() -> Self {
        let clock = Arc::new(MutableClock::default());
        Self {
            runtime: Runtime::new().expect("create runtime"),
            state: memory_http_state(clock.clone()),
            clock,
            token: None,
            role: None,
            login_error: None,
        }
    }

    fn session(&self) -> SessionContext {
        let header = self
            .token
            .as_ref()
            .map(|token| format!("Bearer {}", token.as_str()));
        SessionContext::from_authorization(header.as_deref(), self.state.auth.as_ref())
    }
}

#[fixture]
fn world() -> Mutex<SessionWorld> {
    Mutex::new(SessionWorld::new())
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"')
}

#[given("an editor account {email} with password {password}")]
fn an_editor_account(world: &Mutex<SessionWorld>, email: String, password: String) {
    let world = world.lock().expect("world lock");
    let registration =
        Registration::try_from_parts("Ada", unquote(&email), unquote(&password))
            .expect("registration");
    world
        .runtime
        .block_on(world.state.auth.register(registration))
        .expect("register");
}

#[when("signing in as {email} with password {password}")]
fn signing_in(world: &Mutex<SessionWorld>, email: String, password: String) {
    let mut world = world.lock().expect("world lock");
    let credentials = LoginCredentials::try_from_parts(unquote(&email), unquote(&password))
        .expect("credentials");
    let result = world.runtime.block_on(world.state.auth.login(&credentials));
    match result {
        Ok(outcome) => {
            world.role = Some(outcome.user.role());
            world.token = Some(outcome.token);
        }
        Err(error) => world.login_error = Some(error),
    }
}

#[when("{hours} hours pass")]
fn hours_pass(world: &Mutex<SessionWorld>, hours: String) {
    let world = world.lock().expect("world lock");
    world.clock.advance_hours(hours.parse().expect("numeric hours"));
}

#[then("a token is issued for role {role}")]
fn a_token_is_issued_for(world: &Mutex<SessionWorld>, role: String) {
    let world = world.lock().expect("world lock");
    let expected = Role::from_str(unquote(&role)).expect("known role");
    let token = world.token.as_ref().expect("token issued");
    let claims = world.state.auth.verify(token.as_str()).expect("token verifies");
    assert_eq!(claims.role, expected);
    assert_eq!(world.role, Some(expected));
}

#[then("the session is valid")]
fn the_session_is_valid(world: &Mutex<SessionWorld>) {
    let world = world.lock().expect("world lock");
    assert!(matches!(world.session().state(), SessionState::Valid(_)));
}

#[then("sign-in fails with {message}")]
fn sign_in_fails_with(world: &Mutex<SessionWorld>, message: String) {
    let world = world.lock().expect("world lock");
    let error = world.login_error.as_ref().expect("sign-in should fail");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.message(), unquote(&message));
    assert!(world.token.is_none());
}

#[then("the session is rejected with {message}")]
fn the_session_is_rejected_with(world: &Mutex<SessionWorld>, message: String) {
    let world = world.lock().expect("world lock");
    let error = world
        .session()
        .require_claims()
        .map(|_| ())
        .expect_err("session should be rejected");
    assert_eq!(error.code(), ErrorCode::Forbidden);
    assert_eq!(error.message(), unquote(&message));
}

#[then("requiring role {role} is forbidden")]
fn requiring_role_is_forbidden(world: &Mutex<SessionWorld>, role: String) {
    let world = world.lock().expect("world lock");
    let role = Role::from_str(unquote(&role)).expect("known role");
    let error = world
        .session()
        .require_role(role)
        .map(|_| ())
        .expect_err("role should be refused");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[then("a request without a token is rejected with {message}")]
fn a_request_without_token_is_rejected(world: &Mutex<SessionWorld>, message: String) {
    let world = world.lock().expect("world lock");
    assert!(world.token.is_none());
    let error = world
        .session()
        .require_claims()
        .map(|_| ())
        .expect_err("missing token");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), unquote(&message));
}

#[scenario(
    path = "tests/features/auth_session.feature",
    name = "A registered editor signs in"
)]
fn a_registered_editor_signs_in(world: Mutex<SessionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/auth_session.feature",
    name = "A wrong password issues no token"
)]
fn a_wrong_password_issues_no_token(world: Mutex<SessionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/auth_session.feature",
    name = "Tokens expire after their window"
)]
fn tokens_expire_after_their_window(world: Mutex<SessionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/auth_session.feature",
    name = "Editors cannot act as administrators"
)]
fn editors_cannot_act_as_administrators(world: Mutex<SessionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/auth_session.feature",
    name = "Requests without a token are unauthenticated"
)]
fn requests_without_a_token_are_unauthenticated(world: Mutex<SessionWorld>) {
    let _ = world;
}
