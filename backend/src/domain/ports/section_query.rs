//! Driving port for reading sections.

use async_trait::async_trait;

use crate::domain::{Error, Section, SectionId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SectionQuery: Send + Sync {
    /// All sections, ascending by order.
    async fn list(&self) -> Result<Vec<Section>, Error>;

    /// One section, or `NotFound`.
    async fn get(&self, id: &SectionId) -> Result<Section, Error>;
}
