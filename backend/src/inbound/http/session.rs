//! Per-request session context built from the bearer token.
//!
//! Handlers take a [`SessionContext`] extractor and call
//! [`SessionContext::require_claims`], or take [`Authenticated`], which
//! rejects the request during extraction. Nothing reads ambient auth state.
//!
//! | Header                          | State      | Rejection                  |
//! |---------------------------------|------------|----------------------------|
//! | absent, empty or blank token    | `Absent`   | 401 Unauthorized           |
//! | valid signature, inside window  | `Valid`    | none                       |
//! | valid signature, window closed  | `Expired`  | 403 Forbidden              |
//! | anything else                   | `Invalid`  | 403 Forbidden              |

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};
use serde_json::json;
use tracing::debug;

use crate::domain::ports::AuthService;
use crate::domain::{AuthClaims, Error, Role, TokenStatus};
use crate::inbound::http::state::HttpState;

/// Lifecycle of the caller's credentials for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Absent,
    Valid(AuthClaims),
    Expired,
    Invalid,
}

/// Explicit session for the current request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    state: SessionState,
}

fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next()?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| parts.next().unwrap_or_default().trim())
}

impl SessionContext {
    pub fn new(state: SessionState) -> Self {
        Self { state }
    }

    /// Classify an `Authorization` header value.
    pub fn from_authorization(header: Option<&str>, auth: &dyn AuthService) -> Self {
        let Some(raw) = header.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::new(SessionState::Absent);
        };
        let state = match bearer_token(raw) {
            Some("") => SessionState::Absent,
            Some(token) => match auth.inspect(token) {
                TokenStatus::Valid(claims) => SessionState::Valid(claims),
                TokenStatus::Expired => SessionState::Expired,
                TokenStatus::Invalid => SessionState::Invalid,
            },
            None => {
                debug!("authorization header without bearer scheme");
                SessionState::Invalid
            }
        };
        Self::new(state)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Claims of an authenticated caller, or the matching rejection.
    pub fn require_claims(&self) -> Result<&AuthClaims, Error> {
        match &self.state {
            SessionState::Valid(claims) => Ok(claims),
            SessionState::Absent => Err(Error::unauthorized("Access denied. No token provided.")
                .with_details(json!({ "code": "missing_token" }))),
            SessionState::Expired => Err(Error::forbidden("Token expired")
                .with_details(json!({ "code": "token_expired" }))),
            SessionState::Invalid => Err(Error::forbidden("Invalid token")
                .with_details(json!({ "code": "invalid_token" }))),
        }
    }

    /// Claims of an authenticated caller holding `role`.
    pub fn require_role(&self, role: Role) -> Result<&AuthClaims, Error> {
        let claims = self.require_claims()?;
        claims.require_role(role)?;
        Ok(claims)
    }
}

fn session_for(req: &HttpRequest) -> Result<SessionContext, Error> {
    let Some(state) = req.app_data::<web::Data<HttpState>>() else {
        return Err(Error::internal("HTTP state is not configured"));
    };
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default());
    Ok(SessionContext::from_authorization(header, state.auth.as_ref()))
}

impl FromRequest for SessionContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(session_for(req))
    }
}

/// Claims of a caller presenting a valid bearer token.
///
/// Extraction fails with 401 or 403. Listed before a body extractor, it keeps
/// anonymous writes from ever reaching body parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated(pub AuthClaims);

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = session_for(req).and_then(|session| session.require_claims().cloned());
        ready(claims.map(Self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockAuthService;
    use crate::domain::{ErrorCode, UserId};
    use crate::inbound::http::test_utils::{bearer, memory_state, signed_in};
    use actix_web::test::TestRequest;
    use crate::test_support::fixture_timestamp;
    use chrono::Duration;
    use rstest::rstest;

    fn claims(role: Role) -> AuthClaims {
        AuthClaims {
            user_id: UserId::random(),
            role,
            issued_at: fixture_timestamp(),
            expires_at: fixture_timestamp() + Duration::hours(24),
        }
    }

    fn auth_returning(status: TokenStatus) -> MockAuthService {
        let mut auth = MockAuthService::new();
        auth.expect_inspect().times(1).return_const(status);
        auth
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("Bearer "))]
    fn missing_tokens_are_absent(#[case] header: Option<&str>) {
        let mut auth = MockAuthService::new();
        auth.expect_inspect().never();

        let session = SessionContext::from_authorization(header, &auth);

        assert_eq!(session.state(), &SessionState::Absent);
        let err = session.require_claims().expect_err("absent");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), "Access denied. No token provided.");
    }

    #[rstest]
    #[case(TokenStatus::Expired, "Token expired")]
    #[case(TokenStatus::Invalid, "Invalid token")]
    fn rejected_tokens_are_forbidden(#[case] status: TokenStatus, #[case] message: &str) {
        let auth = auth_returning(status);

        let session = SessionContext::from_authorization(Some("Bearer tok"), &auth);
        let err = session.require_claims().expect_err("rejected");

        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(err.message(), message);
    }

    #[rstest]
    fn scheme_is_case_insensitive() {
        let expected = claims(Role::Editor);
        let auth = auth_returning(TokenStatus::Valid(expected.clone()));

        let session = SessionContext::from_authorization(Some("bearer tok"), &auth);

        assert_eq!(session.require_claims().expect("valid"), &expected);
    }

    #[rstest]
    fn other_schemes_are_invalid() {
        let mut auth = MockAuthService::new();
        auth.expect_inspect().never();

        let session = SessionContext::from_authorization(Some("Basic dXNlcjpwdw=="), &auth);

        assert_eq!(session.state(), &SessionState::Invalid);
    }

    #[rstest]
    #[actix_web::test]
    async fn anonymous_requests_fail_authenticated_extraction() {
        let (state, _clock) = memory_state();
        let req = TestRequest::default().app_data(state).to_http_request();

        let session = SessionContext::extract(&req).await.expect("session");
        assert_eq!(session.state(), &SessionState::Absent);
        let err = Authenticated::extract(&req).await.expect_err("anonymous");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[actix_web::test]
    async fn signed_in_requests_yield_their_claims() {
        let (state, _clock) = memory_state();
        let token = signed_in(&state, "editor@example.com", Role::Editor).await;
        let req = TestRequest::default()
            .app_data(state)
            .insert_header(bearer(&token))
            .to_http_request();

        let Authenticated(claims) = Authenticated::extract(&req).await.expect("claims");
        assert_eq!(claims.role, Role::Editor);
    }

    #[rstest]
    fn role_checks_run_after_authentication() {
        let session = SessionContext::new(SessionState::Valid(claims(Role::Editor)));

        assert!(session.require_role(Role::Editor).is_ok());
        let err = session.require_role(Role::Admin).expect_err("editor");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
