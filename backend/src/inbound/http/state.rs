//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AuthService, SectionCommand, SectionQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<dyn AuthService>,
    pub sections: Arc<dyn SectionQuery>,
    pub section_commands: Arc<dyn SectionCommand>,
}

impl HttpState {
    /// Construct state from the driving ports.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use backend::domain::ports::{AuthService, SectionCommand, SectionQuery};
    /// use backend::inbound::http::state::HttpState;
    ///
    /// fn wire(
    ///     auth: Arc<dyn AuthService>,
    ///     query: Arc<dyn SectionQuery>,
    ///     command: Arc<dyn SectionCommand>,
    /// ) -> HttpState {
    ///     HttpState::new(auth, query, command)
    /// }
    /// ```
    pub fn new(
        auth: Arc<dyn AuthService>,
        sections: Arc<dyn SectionQuery>,
        section_commands: Arc<dyn SectionCommand>,
    ) -> Self {
        Self {
            auth,
            sections,
            section_commands,
        }
    }
}
