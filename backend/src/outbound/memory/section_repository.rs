//! In-memory `SectionRepository`.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{SectionRepository, SectionRepositoryError};
use crate::domain::section_order::display_sequence;
use crate::domain::{Section, SectionChangeSet, SectionId};

/// Sections keyed by id.
#[derive(Debug, Default)]
pub struct InMemorySectionRepository {
    sections: Mutex<BTreeMap<SectionId, Section>>,
}

impl InMemorySectionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> SectionRepositoryError {
    SectionRepositoryError::query("section store lock poisoned")
}

fn check_revision(
    staged: &BTreeMap<SectionId, Section>,
    id: SectionId,
    expected: u32,
) -> Result<(), SectionRepositoryError> {
    match staged.get(&id) {
        None => Err(SectionRepositoryError::missing(id)),
        Some(current) if current.revision != expected => Err(
            SectionRepositoryError::revision_mismatch(id, expected, current.revision),
        ),
        Some(_) => Ok(()),
    }
}

/// Apply `changes` to a copy of `current`; the caller swaps it in on success.
fn stage(
    current: &BTreeMap<SectionId, Section>,
    changes: &SectionChangeSet,
) -> Result<(BTreeMap<SectionId, Section>, Vec<Section>), SectionRepositoryError> {
    let mut staged = current.clone();
    let mut written = Vec::with_capacity(changes.inserts.len() + changes.updates.len());

    for removal in &changes.deletes {
        check_revision(&staged, removal.id, removal.expected_revision)?;
        staged.remove(&removal.id);
    }
    for section in &changes.inserts {
        if staged.contains_key(&section.id) {
            return Err(SectionRepositoryError::query(format!(
                "section {} already exists",
                section.id
            )));
        }
        staged.insert(section.id, section.clone());
        written.push(section.clone());
    }
    for write in &changes.updates {
        check_revision(&staged, write.section.id, write.expected_revision)?;
        staged.insert(write.section.id, write.section.clone());
        written.push(write.section.clone());
    }

    let mut positions = HashSet::with_capacity(staged.len());
    if let Some(clash) = staged.values().find(|section| !positions.insert(section.order)) {
        return Err(SectionRepositoryError::contended(format!(
            "position {} already taken",
            clash.order
        )));
    }
    // Distinct orders all below `len` are exactly `0..len`.
    let len = staged.len();
    if let Some(stray) = staged
        .values()
        .find(|section| usize::try_from(section.order).map_or(true, |order| order >= len))
    {
        return Err(SectionRepositoryError::contended(format!(
            "position {} leaves a gap in 0..{len}",
            stray.order
        )));
    }
    Ok((staged, written))
}

#[async_trait]
impl SectionRepository for InMemorySectionRepository {
    async fn list(&self) -> Result<Vec<Section>, SectionRepositoryError> {
        let sections = self.sections.lock().map_err(|_| poisoned())?;
        let all: Vec<Section> = sections.values().cloned().collect();
        Ok(display_sequence(&all).into_iter().cloned().collect())
    }

    async fn find_by_id(&self, id: &SectionId) -> Result<Option<Section>, SectionRepositoryError> {
        let sections = self.sections.lock().map_err(|_| poisoned())?;
        Ok(sections.get(id).cloned())
    }

    async fn apply(
        &self,
        changes: &SectionChangeSet,
    ) -> Result<Vec<Section>, SectionRepositoryError> {
        let mut sections = self.sections.lock().map_err(|_| poisoned())?;
        let (staged, written) = stage(&sections, changes)?;
        *sections = staged;
        Ok(written)
    }
}
