//! Section domain service.
//!
//! Implements the [`SectionQuery`] and [`SectionCommand`] driving ports. Each
//! write reads a snapshot, plans the order changes with
//! [`section_order`](crate::domain::section_order), and commits everything as
//! one revision-checked [`SectionChangeSet`].

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    SectionCommand, SectionQuery, SectionRepository, SectionRepositoryError,
};
use crate::domain::section_order::{self, Reposition, ReorderViolation};
use crate::domain::{
    Error, NewSection, Section, SectionChangeSet, SectionId, SectionPatch, SectionRemoval,
    SectionReplacement, SectionWrite,
};

const SECTION_NOT_FOUND: &str = "Section not found";

/// Section service implementing the driving ports.
#[derive(Clone)]
pub struct SectionService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> SectionService<R> {
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

impl<R> SectionService<R>
where
    R: SectionRepository,
{
    fn map_repository_error(error: SectionRepositoryError) -> Error {
        match error {
            SectionRepositoryError::RevisionMismatch {
                id,
                expected,
                actual,
            } => Self::revision_conflict(&id, expected, actual),
            SectionRepositoryError::Missing { id } => {
                Error::not_found(SECTION_NOT_FOUND).with_details(json!({ "id": id.to_string() }))
            }
            other => other.into(),
        }
    }

    fn revision_conflict(id: &SectionId, expected: u32, actual: u32) -> Error {
        Error::conflict("revision mismatch").with_details(json!({
            "id": id.to_string(),
            "expectedRevision": expected,
            "actualRevision": actual,
            "code": "revision_mismatch",
        }))
    }

    fn map_violation(violation: ReorderViolation) -> Error {
        let message = violation.to_string();
        match violation {
            ReorderViolation::UnknownSection { id } => {
                Error::not_found(SECTION_NOT_FOUND).with_details(json!({ "id": id.to_string() }))
            }
            ReorderViolation::DuplicateId { id } => Error::invalid_request(message)
                .with_details(json!({ "id": id.to_string(), "code": "duplicate_id" })),
            ReorderViolation::DuplicateOrder { order } => Error::invalid_request(message)
                .with_details(json!({ "order": order, "code": "duplicate_order" })),
            ReorderViolation::OrderOutOfRange { order, len } => Error::invalid_request(message)
                .with_details(json!({ "order": order, "len": len, "code": "order_out_of_range" })),
        }
    }

    async fn snapshot(&self) -> Result<Vec<Section>, Error> {
        self.repository
            .list()
            .await
            .map_err(Self::map_repository_error)
    }

    async fn commit(&self, changes: &SectionChangeSet) -> Result<Vec<Section>, Error> {
        self.repository
            .apply(changes)
            .await
            .map_err(Self::map_repository_error)
    }

    /// Revision-bumped writes for sections that only change position.
    fn repositioned(
        sections: &[Section],
        changes: &[Reposition],
        skip: Option<&SectionId>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Vec<SectionWrite> {
        changes
            .iter()
            .filter(|change| Some(&change.id) != skip)
            .filter_map(|change| {
                let current = sections.iter().find(|section| section.id == change.id)?;
                let mut section = current.next_revision(now);
                section.order = change.order;
                Some(SectionWrite {
                    section,
                    expected_revision: current.revision,
                })
            })
            .collect()
    }

    fn first_written(written: Vec<Section>) -> Result<Section, Error> {
        written
            .into_iter()
            .next()
            .ok_or_else(|| Error::internal("section repository returned no written rows"))
    }
}

#[async_trait]
impl<R> SectionQuery for SectionService<R>
where
    R: SectionRepository,
{
    async fn list(&self) -> Result<Vec<Section>, Error> {
        self.snapshot().await
    }

    async fn get(&self, id: &SectionId) -> Result<Section, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Error::not_found(SECTION_NOT_FOUND))
    }
}

#[async_trait]
impl<R> SectionCommand for SectionService<R>
where
    R: SectionRepository,
{
    async fn create(&self, new_section: NewSection) -> Result<Section, Error> {
        let sections = self.snapshot().await?;
        let now = self.clock.utc();

        let (order, updates) = match new_section.order {
            None => (section_order::next_order(&sections), Vec::new()),
            Some(position) => {
                let plan = section_order::plan_insert(&sections, position);
                let updates = Self::repositioned(&sections, &plan.shifted, None, now);
                (plan.order, updates)
            }
        };

        let section = Section {
            id: SectionId::random(),
            name: new_section.name,
            title: new_section.title,
            content: new_section.content,
            order,
            is_visible: new_section.is_visible.unwrap_or(true),
            revision: 1,
            updated_at: now,
        };
        let shifted = updates.len();
        let changes = SectionChangeSet {
            inserts: vec![section],
            updates,
            deletes: Vec::new(),
        };

        let created = Self::first_written(self.commit(&changes).await?)?;
        info!(section_id = %created.id, order = created.order, shifted, "created section");
        Ok(created)
    }

    async fn update(&self, id: &SectionId, patch: SectionPatch) -> Result<Section, Error> {
        let sections = self.snapshot().await?;
        let Some(current) = sections.iter().find(|section| section.id == *id) else {
            return Err(Error::not_found(SECTION_NOT_FOUND));
        };
        if let Some(expected) = patch.expected_revision
            && expected != current.revision
        {
            return Err(Self::revision_conflict(id, expected, current.revision));
        }

        let now = self.clock.utc();
        let mut target = current.next_revision(now);
        let SectionPatch {
            name,
            title,
            content,
            order,
            is_visible,
            expected_revision: _,
        } = patch;
        if let Some(name) = name {
            target.name = name;
        }
        if let Some(title) = title {
            target.title = title;
        }
        if let Some(content) = content {
            target.content = content;
        }
        if let Some(is_visible) = is_visible {
            target.is_visible = is_visible;
        }

        let mut updates = Vec::new();
        if let Some(position) = order {
            let moves = section_order::plan_move(&sections, id, position)
                .ok_or_else(|| Error::not_found(SECTION_NOT_FOUND))?;
            if let Some(own) = moves.iter().find(|change| change.id == *id) {
                target.order = own.order;
            }
            updates = Self::repositioned(&sections, &moves, Some(id), now);
        }
        updates.insert(
            0,
            SectionWrite {
                section: target,
                expected_revision: current.revision,
            },
        );

        let changes = SectionChangeSet {
            updates,
            ..SectionChangeSet::default()
        };
        let updated = Self::first_written(self.commit(&changes).await?)?;
        info!(section_id = %updated.id, revision = updated.revision, "updated section");
        Ok(updated)
    }

    async fn reorder_all(&self, entries: Vec<SectionReplacement>) -> Result<Vec<Section>, Error> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let sections = self.snapshot().await?;
        let batch: Vec<(SectionId, Option<u32>)> =
            entries.iter().map(|entry| (entry.id, entry.order)).collect();
        let finals = section_order::validate_reorder(&sections, &batch)
            .map_err(Self::map_violation)?;

        let now = self.clock.utc();
        let mut updates = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(current) = sections.iter().find(|section| section.id == entry.id) else {
                return Err(Error::not_found(SECTION_NOT_FOUND));
            };
            if let Some(expected) = entry.revision
                && expected != current.revision
            {
                return Err(Self::revision_conflict(&entry.id, expected, current.revision));
            }

            let mut section = current.next_revision(now);
            if let Some(title) = entry.title {
                section.title = title;
            }
            if let Some(content) = entry.content {
                section.content = content;
            }
            if let Some(is_visible) = entry.is_visible {
                section.is_visible = is_visible;
            }
            if let Some(order) = finals.get(&entry.id) {
                section.order = *order;
            }
            updates.push(SectionWrite {
                section,
                expected_revision: current.revision,
            });
        }

        let changes = SectionChangeSet {
            updates,
            ..SectionChangeSet::default()
        };
        let written = self.commit(&changes).await?;
        info!(count = written.len(), "saved section batch");
        Ok(written)
    }

    async fn delete(&self, id: &SectionId) -> Result<(), Error> {
        let sections = self.snapshot().await?;
        let Some(target) = sections.iter().find(|section| section.id == *id) else {
            return Err(Error::not_found(SECTION_NOT_FOUND));
        };

        let remaining: Vec<Section> = sections
            .iter()
            .filter(|section| section.id != *id)
            .cloned()
            .collect();
        let compaction = section_order::plan_compaction(&remaining);
        let now = self.clock.utc();
        let changes = SectionChangeSet {
            inserts: Vec::new(),
            updates: Self::repositioned(&remaining, &compaction, None, now),
            deletes: vec![SectionRemoval {
                id: *id,
                expected_revision: target.revision,
            }],
        };
        let compacted = changes.updates.len();

        self.commit(&changes).await?;
        info!(section_id = %id, compacted, "deleted section");
        Ok(())
    }
}

#[cfg(test)]
#[path = "section_service_tests.rs"]
mod tests;
