//! Driving port for editing sections.

use async_trait::async_trait;

use crate::domain::{Error, NewSection, Section, SectionId, SectionPatch, SectionReplacement};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SectionCommand: Send + Sync {
    /// Create a section, renumbering others when its order is taken.
    async fn create(&self, section: NewSection) -> Result<Section, Error>;

    /// Apply a partial update; a new order moves the section.
    async fn update(&self, id: &SectionId, patch: SectionPatch) -> Result<Section, Error>;

    /// Bulk save from the editor, committed as one batch.
    ///
    /// Returns the written sections in request order.
    async fn reorder_all(&self, entries: Vec<SectionReplacement>) -> Result<Vec<Section>, Error>;

    /// Delete a section and compact the remaining orders.
    async fn delete(&self, id: &SectionId) -> Result<(), Error>;
}
