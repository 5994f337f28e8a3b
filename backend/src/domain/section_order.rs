//! Ordering rules for sections.
//!
//! Every function here is pure: it reads a snapshot of the store and returns
//! the order changes a write must carry so that the committed orders stay
//! `0..N-1`. Callers fold the result into a
//! [`SectionChangeSet`](crate::domain::SectionChangeSet).
//!
//! Snapshots are always read in display sequence: ascending `order`, ties
//! broken by id so that a store left with duplicate orders (for example by an
//! older writer) still compacts deterministically.

use std::collections::{BTreeMap, HashSet};

use crate::domain::{Section, SectionId};

/// New position for a section whose order changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reposition {
    pub id: SectionId,
    pub order: u32,
}

/// Result of planning an insert at a requested position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    /// Order the new section receives.
    pub order: u32,
    /// Existing sections that shift to make room.
    pub shifted: Vec<Reposition>,
}

/// Why a bulk reorder cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReorderViolation {
    #[error("section {id} appears more than once")]
    DuplicateId { id: SectionId },
    #[error("section {id} does not exist")]
    UnknownSection { id: SectionId },
    #[error("order {order} is assigned to more than one section")]
    DuplicateOrder { order: u32 },
    #[error("order {order} is outside 0..{len}")]
    OrderOutOfRange { order: u32, len: usize },
}

/// Sections in display sequence.
pub fn display_sequence(sections: &[Section]) -> Vec<&Section> {
    let mut ordered: Vec<&Section> = sections.iter().collect();
    ordered.sort_by_key(|section| (section.order, section.id));
    ordered
}

/// Order for a section appended without an explicit position.
///
/// # Examples
/// ```
/// use backend::domain::section_order::next_order;
///
/// assert_eq!(next_order(&[]), 0);
/// ```
pub fn next_order(sections: &[Section]) -> u32 {
    sections
        .iter()
        .map(|section| section.order)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

fn to_u32(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

fn renumber<'a>(sequence: impl IntoIterator<Item = &'a Section>) -> Vec<Reposition> {
    sequence
        .into_iter()
        .enumerate()
        .filter_map(|(index, section)| {
            let order = to_u32(index);
            (section.order != order).then_some(Reposition {
                id: section.id,
                order,
            })
        })
        .collect()
}

/// Make room for a new section at `position`.
///
/// Sections at or after the position shift down by one. Positions past the
/// end clamp to the end.
pub fn plan_insert(sections: &[Section], position: u32) -> InsertPlan {
    let ordered = display_sequence(sections);
    let slot = usize::try_from(position)
        .unwrap_or(usize::MAX)
        .min(ordered.len());

    let shifted = ordered
        .iter()
        .enumerate()
        .filter_map(|(index, section)| {
            let target = if index < slot { index } else { index + 1 };
            let order = to_u32(target);
            (section.order != order).then_some(Reposition {
                id: section.id,
                order,
            })
        })
        .collect();

    InsertPlan {
        order: to_u32(slot),
        shifted,
    }
}

/// Move `id` to `position` and close the gap it leaves.
///
/// Returns `None` when `id` is not in the snapshot. The moved section is
/// included in the result whenever its order changes.
pub fn plan_move(sections: &[Section], id: &SectionId, position: u32) -> Option<Vec<Reposition>> {
    let mut ordered = display_sequence(sections);
    let from = ordered.iter().position(|section| section.id == *id)?;
    let moved = ordered.remove(from);
    let slot = usize::try_from(position)
        .unwrap_or(usize::MAX)
        .min(ordered.len());
    ordered.insert(slot, moved);
    Some(renumber(ordered))
}

/// Renumber to `0..N-1`, keeping relative order.
pub fn plan_compaction(sections: &[Section]) -> Vec<Reposition> {
    renumber(display_sequence(sections))
}

/// Check a bulk reorder and compute the final order of every section.
///
/// `batch` pairs each listed id with its requested order (`None` keeps the
/// stored order). Sections not listed keep their stored order too. The
/// result must be a permutation of `0..N-1`.
pub fn validate_reorder(
    current: &[Section],
    batch: &[(SectionId, Option<u32>)],
) -> Result<BTreeMap<SectionId, u32>, ReorderViolation> {
    let mut finals: BTreeMap<SectionId, u32> = current
        .iter()
        .map(|section| (section.id, section.order))
        .collect();

    let mut seen = HashSet::with_capacity(batch.len());
    for (id, order) in batch {
        if !seen.insert(*id) {
            return Err(ReorderViolation::DuplicateId { id: *id });
        }
        let Some(slot) = finals.get_mut(id) else {
            return Err(ReorderViolation::UnknownSection { id: *id });
        };
        if let Some(order) = order {
            *slot = *order;
        }
    }

    let len = finals.len();
    let mut used = vec![false; len];
    for order in finals.values() {
        let index = usize::try_from(*order).unwrap_or(usize::MAX);
        let Some(taken) = used.get_mut(index) else {
            return Err(ReorderViolation::OrderOutOfRange { order: *order, len });
        };
        if *taken {
            return Err(ReorderViolation::DuplicateOrder { order: *order });
        }
        *taken = true;
    }

    Ok(finals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SectionName;
    use chrono::Utc;
    use rstest::{fixture, rstest};

    fn section(order: u32) -> Section {
        Section {
            id: SectionId::random(),
            name: SectionName::new(format!("Section {order}")).expect("valid name"),
            title: String::new(),
            content: String::new(),
            order,
            is_visible: true,
            revision: 1,
            updated_at: Utc::now(),
        }
    }

    #[fixture]
    fn four() -> Vec<Section> {
        (0..4).map(section).collect()
    }

    fn orders_after(sections: &[Section], changes: &[Reposition]) -> Vec<(SectionId, u32)> {
        let mut result: Vec<(SectionId, u32)> = sections
            .iter()
            .map(|section| {
                let order = changes
                    .iter()
                    .find(|change| change.id == section.id)
                    .map_or(section.order, |change| change.order);
                (section.id, order)
            })
            .collect();
        result.sort_by_key(|(_, order)| *order);
        result
    }

    #[rstest]
    #[case(vec![], 0)]
    #[case(vec![0, 1, 2], 3)]
    #[case(vec![5, 2], 6)]
    fn next_order_is_max_plus_one(#[case] orders: Vec<u32>, #[case] expected: u32) {
        let sections: Vec<Section> = orders.into_iter().map(section).collect();
        assert_eq!(next_order(&sections), expected);
    }

    #[rstest]
    fn insert_at_front_shifts_everything(four: Vec<Section>) {
        let plan = plan_insert(&four, 0);
        assert_eq!(plan.order, 0);
        let shifted: Vec<u32> = plan.shifted.iter().map(|change| change.order).collect();
        assert_eq!(shifted, vec![1, 2, 3, 4]);
    }

    #[rstest]
    fn insert_in_middle_shifts_tail_only(four: Vec<Section>) {
        let plan = plan_insert(&four, 2);
        assert_eq!(plan.order, 2);
        let ids: Vec<SectionId> = plan.shifted.iter().map(|change| change.id).collect();
        assert_eq!(ids, vec![four[2].id, four[3].id]);
    }

    #[rstest]
    fn insert_past_end_clamps(four: Vec<Section>) {
        let plan = plan_insert(&four, 40);
        assert_eq!(plan.order, 4);
        assert!(plan.shifted.is_empty());
    }

    #[rstest]
    fn insert_into_gappy_store_compacts(#[values(0, 1)] position: u32) {
        let sections = vec![section(3), section(9)];
        let plan = plan_insert(&sections, position);
        let mut orders: Vec<u32> = orders_after(&sections, &plan.shifted)
            .into_iter()
            .map(|(_, order)| order)
            .collect();
        orders.push(plan.order);
        orders.sort_unstable();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[rstest]
    fn move_to_front_renumbers(four: Vec<Section>) {
        let changes = plan_move(&four, &four[3].id, 0).expect("section present");
        let sequence: Vec<SectionId> = orders_after(&four, &changes)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(sequence, vec![four[3].id, four[0].id, four[1].id, four[2].id]);
    }

    #[rstest]
    fn move_to_same_position_changes_nothing(four: Vec<Section>) {
        let changes = plan_move(&four, &four[1].id, 1).expect("section present");
        assert!(changes.is_empty());
    }

    #[rstest]
    fn move_past_end_clamps_to_last(four: Vec<Section>) {
        let changes = plan_move(&four, &four[0].id, 99).expect("section present");
        let moved = changes
            .iter()
            .find(|change| change.id == four[0].id)
            .expect("moved section repositioned");
        assert_eq!(moved.order, 3);
    }

    #[rstest]
    fn move_unknown_section_yields_none(four: Vec<Section>) {
        assert!(plan_move(&four, &SectionId::random(), 0).is_none());
    }

    #[rstest]
    fn compaction_closes_gaps_in_relative_order() {
        let sections = vec![section(0), section(2), section(3)];
        let changes = plan_compaction(&sections);
        let orders = orders_after(&sections, &changes);
        assert_eq!(
            orders,
            vec![
                (sections[0].id, 0),
                (sections[1].id, 1),
                (sections[2].id, 2),
            ]
        );
    }

    #[rstest]
    fn compaction_of_dense_store_is_empty(four: Vec<Section>) {
        assert!(plan_compaction(&four).is_empty());
    }

    #[rstest]
    fn reorder_swap_is_accepted() {
        let sections = vec![section(0), section(1)];
        let (a, b) = (sections[0].id, sections[1].id);
        let finals = validate_reorder(&sections, &[(a, Some(1)), (b, Some(0))])
            .expect("swap is a permutation");
        assert_eq!(finals.get(&a), Some(&1));
        assert_eq!(finals.get(&b), Some(&0));
    }

    #[rstest]
    fn reorder_rejects_duplicate_ids(four: Vec<Section>) {
        let id = four[0].id;
        let err = validate_reorder(&four, &[(id, Some(0)), (id, Some(0))]).expect_err("duplicate");
        assert_eq!(err, ReorderViolation::DuplicateId { id });
    }

    #[rstest]
    fn reorder_rejects_unknown_ids(four: Vec<Section>) {
        let id = SectionId::random();
        let err = validate_reorder(&four, &[(id, Some(0))]).expect_err("unknown");
        assert_eq!(err, ReorderViolation::UnknownSection { id });
    }

    #[rstest]
    fn reorder_rejects_collisions_with_unlisted_sections(four: Vec<Section>) {
        let err =
            validate_reorder(&four, &[(four[0].id, Some(2))]).expect_err("collides with [2]");
        assert_eq!(err, ReorderViolation::DuplicateOrder { order: 2 });
    }

    #[rstest]
    fn reorder_rejects_out_of_range(four: Vec<Section>) {
        let err = validate_reorder(&four, &[(four[3].id, Some(4))]).expect_err("gap");
        assert_eq!(err, ReorderViolation::OrderOutOfRange { order: 4, len: 4 });
    }

    #[rstest]
    fn reorder_without_orders_keeps_store_order(four: Vec<Section>) {
        let batch: Vec<(SectionId, Option<u32>)> =
            four.iter().map(|section| (section.id, None)).collect();
        let finals = validate_reorder(&four, &batch).expect("unchanged orders are valid");
        assert!(four.iter().all(|s| finals.get(&s.id) == Some(&s.order)));
    }
}
