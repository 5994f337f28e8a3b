//! Port for section persistence.
//!
//! Writes go through [`SectionRepository::apply`], which commits a whole
//! [`SectionChangeSet`] or nothing. Updates and deletes carry the revision the
//! caller read; a record that moved on in the meantime rejects the batch.

use async_trait::async_trait;

use crate::domain::{Section, SectionChangeSet, SectionId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by section repository adapters.
    pub enum SectionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => ServiceUnavailable,
            "section repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => InternalError,
            "section repository query failed: {message}",
        /// Optimistic concurrency check failed for one record.
        RevisionMismatch { id: SectionId, expected: u32, actual: u32 } => Conflict,
            "section {id} is at revision {actual}, expected {expected}",
        /// A record named in the batch no longer exists.
        Missing { id: SectionId } => NotFound, "section {id} not found",
        /// A concurrent writer claimed a display position first.
        Contended { message: String } => Conflict,
            "concurrent section write rejected: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SectionRepository: Send + Sync {
    /// All sections in display sequence.
    async fn list(&self) -> Result<Vec<Section>, SectionRepositoryError>;

    async fn find_by_id(&self, id: &SectionId) -> Result<Option<Section>, SectionRepositoryError>;

    /// Commit `changes` atomically.
    ///
    /// Returns the written sections: inserts first, then updates, each in
    /// the order given.
    async fn apply(&self, changes: &SectionChangeSet)
    -> Result<Vec<Section>, SectionRepositoryError>;
}
