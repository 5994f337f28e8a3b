//! Test utilities shared by unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for tests and behind the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::FixturePasswordHasher;
use crate::domain::{CredentialAuthService, SectionService};
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::{InMemoryCredentialRepository, InMemorySectionRepository};
use crate::outbound::security::HmacTokenCodec;

/// Fixed instant used as "now" across fixtures.
pub fn fixture_timestamp() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single() {
        Some(timestamp) => timestamp,
        None => panic!("fixture timestamp must be unambiguous"),
    }
}

/// Clock whose reading only moves when a test advances it.
///
/// # Examples
/// ```
/// use backend::test_support::{MutableClock, fixture_timestamp};
/// use mockable::Clock;
///
/// let clock = MutableClock::new(fixture_timestamp());
/// clock.advance_hours(25);
/// assert_eq!((clock.utc() - fixture_timestamp()).num_hours(), 25);
/// ```
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_hours(&self, hours: i64) {
        *self.lock_clock() += TimeDelta::hours(hours);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MutableClock {
    fn default() -> Self {
        Self::new(fixture_timestamp())
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// HTTP state over in-memory stores, a fresh signing key and `clock`.
///
/// Passwords go through [`FixturePasswordHasher`] so tests skip Argon2 cost.
/// Share the clock with the caller to age issued tokens.
pub fn memory_http_state(clock: Arc<MutableClock>) -> HttpState {
    let auth = CredentialAuthService::new(
        Arc::new(InMemoryCredentialRepository::new()),
        Arc::new(FixturePasswordHasher),
        Arc::new(HmacTokenCodec::with_random_key()),
        clock.clone(),
    );
    let sections = Arc::new(SectionService::new(
        Arc::new(InMemorySectionRepository::new()),
        clock,
    ));
    HttpState::new(Arc::new(auth), sections.clone(), sections)
}
