//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{sections, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Section models
// ---------------------------------------------------------------------------

/// Row struct for reading from the sections table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SectionRow {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub content: String,
    pub position: i32,
    pub is_visible: bool,
    pub revision: i32,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new section records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sections)]
pub(crate) struct NewSectionRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub position: i32,
    pub is_visible: bool,
    pub revision: i32,
    pub updated_at: DateTime<Utc>,
}

/// Changeset struct for rewriting an existing section.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = sections)]
pub(crate) struct SectionUpdate<'a> {
    pub name: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub position: i32,
    pub is_visible: bool,
    pub revision: i32,
    pub updated_at: DateTime<Utc>,
}
