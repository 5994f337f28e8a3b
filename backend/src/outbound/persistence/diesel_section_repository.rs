//! PostgreSQL-backed `SectionRepository` implementation using Diesel ORM.
//!
//! A change set runs in one transaction that first takes a write lock on the
//! table: deletes, then inserts, then updates. Every update and delete is
//! filtered on the revision the caller read, so a stale record rolls the whole
//! batch back. The unique index on `position` is deferred to commit; batches
//! may pass through duplicate positions on the way to a contiguous sequence,
//! which is checked before the transaction commits.

use async_trait::async_trait;
use diesel::dsl::{count_distinct, count_star, max, min};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{debug, warn};

use crate::domain::ports::{SectionRepository, SectionRepositoryError};
use crate::domain::{
    Section, SectionChangeSet, SectionId, SectionName, SectionRemoval, SectionWrite,
};

use super::diesel_error_mapping::{is_unique_violation, map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewSectionRow, SectionRow, SectionUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::sections;

/// Diesel-backed implementation of the `SectionRepository` port.
#[derive(Clone)]
pub struct DieselSectionRepository {
    pool: DbPool,
}

impl DieselSectionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SectionRepositoryError {
    map_basic_pool_error(error, SectionRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> SectionRepositoryError {
    if is_unique_violation(&error) {
        debug!("section write lost a position race");
        return SectionRepositoryError::contended("display position already taken");
    }
    map_basic_diesel_error(
        error,
        SectionRepositoryError::query,
        SectionRepositoryError::connection,
    )
}

/// Failure inside the apply transaction.
///
/// Diesel failures stay raw until the transaction has rolled back; checks the
/// adapter makes itself are already classified.
#[derive(Debug)]
enum ApplyError {
    Diesel(diesel::result::Error),
    Rejected(SectionRepositoryError),
}

impl From<diesel::result::Error> for ApplyError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

impl From<SectionRepositoryError> for ApplyError {
    fn from(value: SectionRepositoryError) -> Self {
        Self::Rejected(value)
    }
}

impl From<ApplyError> for SectionRepositoryError {
    fn from(value: ApplyError) -> Self {
        match value {
            ApplyError::Diesel(error) => map_diesel_error(error),
            ApplyError::Rejected(error) => error,
        }
    }
}

fn to_db_int(value: u32, what: &str) -> Result<i32, SectionRepositoryError> {
    i32::try_from(value).map_err(|_| SectionRepositoryError::query(format!("{what} overflow")))
}

fn from_db_int(value: i32, id: uuid::Uuid, what: &str) -> Result<u32, SectionRepositoryError> {
    u32::try_from(value).map_err(|_| {
        warn!(section_id = %id, value, field = what, "negative value in sections table");
        SectionRepositoryError::query(format!("stored section {id} has negative {what}"))
    })
}

fn row_to_section(row: SectionRow) -> Result<Section, SectionRepositoryError> {
    let name = SectionName::new(&row.name).map_err(|err| {
        SectionRepositoryError::query(format!("stored section {} has invalid name: {err}", row.id))
    })?;
    Ok(Section {
        id: SectionId::from_uuid(row.id),
        name,
        order: from_db_int(row.position, row.id, "position")?,
        revision: from_db_int(row.revision, row.id, "revision")?,
        title: row.title,
        content: row.content,
        is_visible: row.is_visible,
        updated_at: row.updated_at,
    })
}

/// Work out why a revision-filtered write matched no row.
async fn classify_missed_write(
    conn: &mut AsyncPgConnection,
    id: SectionId,
    expected: u32,
) -> Result<SectionRepositoryError, ApplyError> {
    let current: Option<i32> = sections::table
        .filter(sections::id.eq(id.as_uuid()))
        .select(sections::revision)
        .first(conn)
        .await
        .optional()?;

    Ok(match current {
        Some(actual) => SectionRepositoryError::revision_mismatch(
            id,
            expected,
            from_db_int(actual, *id.as_uuid(), "revision")?,
        ),
        None => SectionRepositoryError::missing(id),
    })
}

async fn delete_one(
    conn: &mut AsyncPgConnection,
    removal: &SectionRemoval,
) -> Result<(), ApplyError> {
    let expected = to_db_int(removal.expected_revision, "revision")?;
    let deleted = diesel::delete(
        sections::table.filter(
            sections::id
                .eq(removal.id.as_uuid())
                .and(sections::revision.eq(expected)),
        ),
    )
    .execute(conn)
    .await?;

    if deleted == 0 {
        let error = classify_missed_write(conn, removal.id, removal.expected_revision).await?;
        return Err(error.into());
    }
    Ok(())
}

async fn insert_one(conn: &mut AsyncPgConnection, section: &Section) -> Result<Section, ApplyError> {
    let row = NewSectionRow {
        id: *section.id.as_uuid(),
        name: section.name.as_ref(),
        title: &section.title,
        content: &section.content,
        position: to_db_int(section.order, "position")?,
        is_visible: section.is_visible,
        revision: to_db_int(section.revision, "revision")?,
        updated_at: section.updated_at,
    };

    let stored = diesel::insert_into(sections::table)
        .values(&row)
        .returning(SectionRow::as_returning())
        .get_result(conn)
        .await?;
    Ok(row_to_section(stored)?)
}

async fn update_one(conn: &mut AsyncPgConnection, write: &SectionWrite) -> Result<Section, ApplyError> {
    let section = &write.section;
    let expected = to_db_int(write.expected_revision, "revision")?;
    let changes = SectionUpdate {
        name: section.name.as_ref(),
        title: &section.title,
        content: &section.content,
        position: to_db_int(section.order, "position")?,
        is_visible: section.is_visible,
        revision: to_db_int(section.revision, "revision")?,
        updated_at: section.updated_at,
    };

    let stored: Option<SectionRow> = diesel::update(
        sections::table.filter(
            sections::id
                .eq(section.id.as_uuid())
                .and(sections::revision.eq(expected)),
        ),
    )
    .set(&changes)
    .returning(SectionRow::as_returning())
    .get_result(conn)
    .await
    .optional()?;

    match stored {
        Some(row) => Ok(row_to_section(row)?),
        None => {
            let error = classify_missed_write(conn, section.id, write.expected_revision).await?;
            Err(error.into())
        }
    }
}

/// Whether `count` rows with `distinct` positions spanning `lowest..=highest`
/// are numbered exactly `0..count`.
fn is_contiguous(count: i64, distinct: i64, lowest: Option<i32>, highest: Option<i32>) -> bool {
    match (lowest, highest) {
        (None, None) => count == 0,
        (Some(lowest), Some(highest)) => {
            distinct == count && lowest == 0 && i64::from(highest) == count - 1
        }
        _ => false,
    }
}

async fn ensure_contiguous(conn: &mut AsyncPgConnection) -> Result<(), ApplyError> {
    let (count, distinct, lowest, highest): (i64, i64, Option<i32>, Option<i32>) = sections::table
        .select((
            count_star(),
            count_distinct(sections::position),
            min(sections::position),
            max(sections::position),
        ))
        .get_result(conn)
        .await?;

    if is_contiguous(count, distinct, lowest, highest) {
        return Ok(());
    }
    debug!(count, distinct, ?lowest, ?highest, "section batch would break ordering");
    Err(SectionRepositoryError::contended(format!(
        "positions would not be 0..{count} after this write"
    ))
    .into())
}

#[async_trait]
impl SectionRepository for DieselSectionRepository {
    async fn list(&self) -> Result<Vec<Section>, SectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<SectionRow> = sections::table
            .order((sections::position.asc(), sections::id.asc()))
            .select(SectionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_section).collect()
    }

    async fn find_by_id(&self, id: &SectionId) -> Result<Option<Section>, SectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<SectionRow> = sections::table
            .filter(sections::id.eq(id.as_uuid()))
            .select(SectionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_section).transpose()
    }

    async fn apply(
        &self,
        changes: &SectionChangeSet,
    ) -> Result<Vec<Section>, SectionRepositoryError> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let written = conn
            .transaction::<_, ApplyError, _>(|conn| {
                async move {
                    diesel::sql_query("LOCK TABLE sections IN SHARE ROW EXCLUSIVE MODE")
                        .execute(conn)
                        .await?;
                    for removal in &changes.deletes {
                        delete_one(conn, removal).await?;
                    }
                    let mut written =
                        Vec::with_capacity(changes.inserts.len() + changes.updates.len());
                    for section in &changes.inserts {
                        written.push(insert_one(conn, section).await?);
                    }
                    for write in &changes.updates {
                        written.push(update_one(conn, write).await?);
                    }
                    ensure_contiguous(conn).await?;
                    Ok(written)
                }
                .scope_boxed()
            })
            .await?;

        debug!(
            inserted = changes.inserts.len(),
            updated = changes.updates.len(),
            deleted = changes.deletes.len(),
            "applied section change set"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_timestamp;
    use rstest::{fixture, rstest};
    use uuid::Uuid;

    #[fixture]
    fn row() -> SectionRow {
        SectionRow {
            id: Uuid::new_v4(),
            name: "Hero Section".to_owned(),
            title: "Welcome".to_owned(),
            content: "Hello".to_owned(),
            position: 2,
            is_visible: false,
            revision: 5,
            updated_at: fixture_timestamp(),
        }
    }

    #[rstest]
    fn rows_convert_to_sections(row: SectionRow) {
        let id = row.id;
        let section = row_to_section(row).expect("valid row");

        assert_eq!(section.id.as_uuid(), &id);
        assert_eq!(section.order, 2);
        assert_eq!(section.revision, 5);
        assert!(!section.is_visible);
    }

    #[rstest]
    fn negative_positions_are_rejected(mut row: SectionRow) {
        row.position = -1;
        let err = row_to_section(row).expect_err("negative position");
        assert!(err.to_string().contains("negative position"));
    }

    #[rstest]
    fn blank_names_are_rejected(mut row: SectionRow) {
        row.name = "  ".to_owned();
        let err = row_to_section(row).expect_err("blank name");
        assert!(matches!(err, SectionRepositoryError::Query { .. }));
    }

    #[rstest]
    #[case(0, 0, None, None, true)]
    #[case(3, 3, Some(0), Some(2), true)]
    #[case(3, 3, Some(0), Some(3), false)]
    #[case(3, 2, Some(0), Some(2), false)]
    #[case(2, 2, Some(1), Some(2), false)]
    fn contiguity_needs_dense_positions_from_zero(
        #[case] count: i64,
        #[case] distinct: i64,
        #[case] lowest: Option<i32>,
        #[case] highest: Option<i32>,
        #[case] expected: bool,
    ) {
        assert_eq!(is_contiguous(count, distinct, lowest, highest), expected);
    }

    #[rstest]
    fn oversized_values_do_not_wrap() {
        let err = to_db_int(u32::MAX, "position").expect_err("overflow");
        assert!(err.to_string().contains("position overflow"));
    }

    #[rstest]
    fn rejected_checks_survive_the_rollback() {
        let id = SectionId::random();
        let error: SectionRepositoryError =
            ApplyError::from(SectionRepositoryError::revision_mismatch(id, 1_u32, 2_u32)).into();
        assert_eq!(error, SectionRepositoryError::revision_mismatch(id, 1_u32, 2_u32));
    }

    #[rstest]
    fn raw_diesel_failures_map_to_query_errors() {
        let error: SectionRepositoryError =
            ApplyError::from(diesel::result::Error::NotFound).into();
        assert!(matches!(error, SectionRepositoryError::Query { .. }));
    }
}
